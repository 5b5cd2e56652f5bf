use std::time::Duration;

use coastal_common::error::{ErrorCategory, ErrorClassification};
use thiserror::Error;

use super::transport::UpstreamResponse;

/// Fetch error types
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum FetchError {
    #[error("Connection error: {0}")]
    Connect(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP {status}")]
    Status { status: u16 },

    #[error("Invalid JSON body: {0}")]
    Decode(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Request cancelled")]
    Cancelled,

    /// Every attempt failed; carries the last cause and, when the last
    /// attempt produced one, the last HTTP response.
    #[error("Upstream exhausted after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        last: Box<FetchError>,
        last_response: Option<UpstreamResponse>,
    },
}

impl FetchError {
    /// HTTP status of the failure, looking through exhaustion
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status } => Some(*status),
            FetchError::Exhausted { last, .. } => last.status(),
            _ => None,
        }
    }
}

impl ErrorClassification for FetchError {
    fn category(&self) -> ErrorCategory {
        match self {
            FetchError::Connect(_) => ErrorCategory::Transient,
            FetchError::Timeout(_) => ErrorCategory::Transient,
            FetchError::Status { status: 429 } => ErrorCategory::ResourceExhausted,
            FetchError::Status { .. } => ErrorCategory::Transient,
            FetchError::Decode(_) => ErrorCategory::Transient,
            FetchError::InvalidUrl(_) => ErrorCategory::Permanent,
            FetchError::Cancelled => ErrorCategory::Permanent,
            FetchError::Exhausted { .. } => ErrorCategory::Permanent,
        }
    }
}

pub type FetchResult<T> = Result<T, FetchError>;
