//! Error classification shared by the coastal crates.
//!
//! This module provides:
//! - The `ErrorCategory` / `ErrorClassification` pair the fetch layer uses to
//!   decide whether a failure is worth another attempt
//! - Common error types reused across crates
//!
//! Data-shape problems (unknown fields, unparseable timestamps) have no error
//! type at all: they surface as `None` and never abort a batch.
//!
//! # Usage
//!
//! ```rust,ignore
//! use coastal_common::error::ErrorClassification;
//!
//! fn should_retry(err: &impl ErrorClassification) -> bool {
//!     err.is_transient()
//! }
//! ```

mod common;
mod traits;

pub use common::*;
pub use traits::*;
