//! Request validation utilities
//!
//! Validation helpers for ensuring request data meets requirements.

use crate::api::error::{ApiError, ApiResult};

/// Validate that a required string field is not empty
pub fn validate_not_empty(value: &str, field_name: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::ValidationError(format!(
            "{} cannot be empty",
            field_name
        )));
    }
    Ok(())
}

/// Validate a progress percentage
pub fn validate_progress(progress: u32) -> ApiResult<()> {
    if progress > 100 {
        return Err(ApiError::ValidationError(format!(
            "progress must be between 0 and 100, got {}",
            progress
        )));
    }
    Ok(())
}
