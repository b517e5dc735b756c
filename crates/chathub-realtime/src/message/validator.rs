//! Inbound frame validation.

use chathub_core::error::AppError;

/// Validates an inbound data frame against the size limit.
pub fn validate_inbound(len: usize, max_size: usize) -> Result<(), AppError> {
    if len > max_size {
        return Err(AppError::validation(format!(
            "Message exceeds maximum size of {max_size} bytes"
        )));
    }
    Ok(())
}

/// Validates that a frame has content worth decoding.
pub fn validate_not_blank(raw: &str) -> Result<(), AppError> {
    if raw.trim().is_empty() {
        return Err(AppError::validation("Empty message"));
    }
    Ok(())
}
