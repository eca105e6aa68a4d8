//! Shared types for the board workspace
//!
//! Types used by both `board-server` and `board-client`: entity models,
//! the ordering rules (dense order index + reorder planner), the broadcast
//! message vocabulary and the unified error system.

pub mod error;
pub mod message;
pub mod models;
pub mod ordering;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use message::{BoardEvent, Envelope, ServerFrame, SubscriptionCommand, Topic};
pub use models::{Board, BoardId, Card, CardId, CardPlacement, Column, ColumnId};
pub use ordering::{MoveRequest, PlanError, ReorderPlan, Slot};
