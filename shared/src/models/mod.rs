//! Data models
//!
//! Shared between board-server, board-client and frontend (via API).
//! All IDs are snowflake `i64` (see [`crate::util::snowflake_id`]); wire format is camelCase.

pub mod board;
pub mod card;

// Re-exports
pub use board::*;
pub use card::*;

pub type BoardId = i64;
pub type ColumnId = i64;
pub type CardId = i64;

/// Max length of board/column titles
pub const MAX_TITLE_LEN: usize = 200;
/// Max length of card text
pub const MAX_CARD_TEXT_LEN: usize = 2000;
