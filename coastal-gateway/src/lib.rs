//! # Coastal Gateway
//!
//! Data acquisition for the coastal wave and tide dashboard.
//!
//! ## Features
//!
//! - **Resilient fetching**: bounded retries with exponential backoff, per-attempt
//!   timeouts and cancellation
//! - **Same-origin proxy**: relays backend responses verbatim and rides out
//!   backend cold starts
//! - **Feeds**: waves, tides and daily summary, normalized and deduplicated via
//!   `coastal-common`
//!
//! ## Architecture
//!
//! Configuration is resolved once at startup into an immutable
//! [`BackendConfig`] shared by the proxy and the feed client. Both go through
//! [`ResilientFetcher`], which drives an explicit retry state machine over a
//! pluggable [`HttpTransport`].

pub mod cli;
pub mod config;
pub mod feed;
pub mod fetcher;
pub mod proxy;

// Re-export commonly used types
pub use config::{BackendConfig, Settings};
pub use feed::{api_path, CoastalFeed, DayRange, FeedRoute};
pub use fetcher::{
    FetchError, FetchResult, HttpTransport, ReqwestTransport, ResilientFetcher, RetryPolicy,
    UpstreamResponse,
};
pub use proxy::{ProxyError, ProxyForwarder, ProxyServer};
