//! Logging setup for the coastal gateway and its tools.
//!
//! Provides consistent output across binaries with support for:
//! - Human-readable console output (default)
//! - JSON lines for log shipping
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: standard tracing filter, wins over everything else
//! - `LOG_LEVEL`: fallback directives when `RUST_LOG` is unset
//! - `LOG_FORMAT`: `pretty` (default), `compact`, or `json`
//! - `LOG_TIMESTAMPS`: `local` (default), `utc`, or `none`
//! - `LOG_APP_NAME`: value of the `app` field in JSON output
//!
//! # Usage
//!
//! ```rust,ignore
//! use coastal_common::logging::{init_logging, LogConfig};
//!
//! init_logging(LogConfig::from_env().with_app_name("coastal"))?;
//! ```

mod config;
mod json_layer;

pub use config::{init_logging, LogConfig, LogFormat, TimestampFormat, DEFAULT_DIRECTIVES};
pub use json_layer::JsonLogEvent;
