use coastal_common::error::{ErrorCategory, ErrorClassification};
use thiserror::Error;

use crate::fetcher::FetchError;

/// Proxy error types
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Malformed percent-encoding in path: {0}")]
    Decode(String),

    #[error("Invalid upstream path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl ErrorClassification for ProxyError {
    fn category(&self) -> ErrorCategory {
        match self {
            ProxyError::Decode(_) => ErrorCategory::Permanent,
            ProxyError::InvalidPath { .. } => ErrorCategory::Permanent,
            ProxyError::Fetch(e) => e.category(),
        }
    }
}
