//! Unified error system for the board workspace
//!
//! - [`ErrorCode`]: numeric codes shared by server and client
//! - [`ErrorCategory`]: classification by code range
//! - [`AppError`]: code + message + optional details
//! - [`ApiResponse`]: unified response body
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 4xxx: Board domain errors (boards, columns, cards, ordering)
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode, ApiResponse};
//!
//! let err = AppError::new(ErrorCode::BoardNotFound);
//!
//! let err = AppError::validation("Title is required")
//!     .with_detail("field", "title");
//!
//! let response = ApiResponse::<()>::error(&err);
//! assert_eq!(response.code, Some(2));
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError, AppResult};
