//! Common error types shared across crates.

use thiserror::Error;

/// Configuration-related errors.
///
/// Use this for settings loading and backend origin resolution.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ConfigurationError {
    /// Field has invalid value
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ConfigurationError {
    /// Create an InvalidValue error
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigurationError::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
