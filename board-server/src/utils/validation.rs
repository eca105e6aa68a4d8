//! Input validation helpers

use shared::error::AppError;
use shared::models::{MAX_CARD_TEXT_LEN, MAX_TITLE_LEN};
use shared::util::parse_id;

/// Validate that a required string is non-blank and within the length limit.
///
/// Returns the trimmed value.
pub fn validate_required_text<'a>(
    value: &'a str,
    field: &str,
    max_len: usize,
) -> Result<&'a str, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")).with_detail("field", field));
    }
    let len = trimmed.chars().count();
    if len > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({len} chars, max {max_len})"
        ))
        .with_detail("field", field));
    }
    Ok(trimmed)
}

pub fn validate_title(value: &str) -> Result<&str, AppError> {
    validate_required_text(value, "title", MAX_TITLE_LEN)
}

pub fn validate_card_text(value: &str) -> Result<&str, AppError> {
    validate_required_text(value, "text", MAX_CARD_TEXT_LEN)
}

/// Parse an id from a path segment, `kind` names it in the error ("board", "card", ...)
pub fn parse_path_id(kind: &str, raw: &str) -> Result<i64, AppError> {
    parse_id(raw).ok_or_else(|| AppError::invalid_id(kind, raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::ErrorCode;

    #[test]
    fn test_required_text() {
        assert_eq!(validate_title("  Sprint 1 ").unwrap(), "Sprint 1");
        assert_eq!(validate_title("   ").unwrap_err().code, ErrorCode::ValidationFailed);
        assert!(validate_title(&"x".repeat(MAX_TITLE_LEN)).is_ok());
        assert!(validate_title(&"x".repeat(MAX_TITLE_LEN + 1)).is_err());
        assert!(validate_card_text(&"é".repeat(MAX_CARD_TEXT_LEN)).is_ok());
    }

    #[test]
    fn test_parse_path_id() {
        assert_eq!(parse_path_id("board", "12").unwrap(), 12);
        let err = parse_path_id("board", "not-an-id").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFormat);
        assert_eq!(err.message, "Invalid board ID format");
    }
}
