//! Error classification traits for retry decisions.
//!
//! Errors describe their own retry characteristics so the fetch layer can
//! drive its backoff state machine without matching on concrete types.

use std::time::Duration;

use super::common::ConfigurationError;

/// Classification of error types for handling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// May resolve on retry (connection refused, timeout, non-2xx status)
    Transient,
    /// Will not resolve on retry (bad URL, cancelled, budget exhausted)
    Permanent,
    /// Upstream asked us to slow down
    ResourceExhausted,
    /// Missing or invalid settings
    Configuration,
    /// Unexpected state
    Internal,
}

/// Trait for errors that can classify themselves for retry logic.
pub trait ErrorClassification {
    /// Returns the category of this error
    fn category(&self) -> ErrorCategory;

    /// Returns true if this error is transient and may succeed on retry
    fn is_transient(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Transient | ErrorCategory::ResourceExhausted
        )
    }

    /// Returns true if this error is permanent and won't succeed on retry
    fn is_permanent(&self) -> bool {
        matches!(self.category(), ErrorCategory::Permanent)
    }

    /// Minimum delay before retrying, if the error itself imposes one.
    ///
    /// The retry policy's exponential schedule applies when this is `None`
    /// or shorter.
    fn suggested_retry_delay(&self) -> Option<Duration> {
        match self.category() {
            ErrorCategory::ResourceExhausted => Some(Duration::from_secs(1)),
            _ => None,
        }
    }
}

impl ErrorClassification for ConfigurationError {
    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}
