//! Input validation helpers
//!
//! Centralized text length constants and validation functions.
//! SQLite TEXT has no built-in length enforcement, so limits live here.

use crate::utils::AppError;

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: client, service
pub const MAX_NAME_LEN: usize = 200;

/// Notes, details, concepts
pub const MAX_NOTE_LEN: usize = 500;

/// Short identifiers: phone numbers
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Passwords (before hashing)
pub const MAX_PASSWORD_LEN: usize = 128;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        )));
    }
    Ok(())
}

/// Validate that a monetary amount is finite and strictly positive.
pub fn validate_positive_amount(amount: f64, field: &str) -> Result<(), AppError> {
    if !amount.is_finite() {
        return Err(AppError::validation(format!(
            "{field} must be a finite number, got {amount}"
        )));
    }
    if amount <= 0.0 {
        return Err(AppError::validation(format!(
            "{field} must be positive, got {amount}"
        )));
    }
    Ok(())
}

/// Validate that a monetary amount is finite and non-negative.
pub fn validate_non_negative_amount(amount: f64, field: &str) -> Result<(), AppError> {
    if !amount.is_finite() {
        return Err(AppError::validation(format!(
            "{field} must be a finite number, got {amount}"
        )));
    }
    if amount < 0.0 {
        return Err(AppError::validation(format!(
            "{field} cannot be negative, got {amount}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert!(validate_required_text("Juan", "name", MAX_NAME_LEN).is_ok());
        assert!(validate_required_text("   ", "name", MAX_NAME_LEN).is_err());
        assert!(validate_required_text(&"x".repeat(201), "name", MAX_NAME_LEN).is_err());
    }

    #[test]
    fn test_amounts() {
        assert!(validate_positive_amount(10.5, "amount").is_ok());
        assert!(validate_positive_amount(0.0, "amount").is_err());
        assert!(validate_positive_amount(-1.0, "amount").is_err());
        assert!(validate_positive_amount(f64::NAN, "amount").is_err());
        assert!(validate_non_negative_amount(0.0, "total").is_ok());
        assert!(validate_non_negative_amount(-0.01, "total").is_err());
    }
}
