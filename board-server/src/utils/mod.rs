//! 工具模块
//!
//! - [`json`] - JSON 请求体提取
//! - [`logger`] - 日志初始化
//! - [`validation`] - 输入校验

pub mod json;
pub mod logger;
pub mod validation;

pub use json::ValidJson;
pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
