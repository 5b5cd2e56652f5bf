//! Resilient HTTP fetching with bounded exponential backoff.
//!
//! [`ResilientFetcher`] drives a [`RetryMachine`] over an [`HttpTransport`].
//! Attempts are strictly sequential; each one is bounded by the policy
//! timeout and can be cancelled through a broadcast shutdown channel.

mod client;
mod error;
pub mod mock;
mod policy;
mod retry;
mod transport;

pub use client::ResilientFetcher;
pub use error::{FetchError, FetchResult};
pub use policy::{RetryPolicy, StatusRetry};
pub use retry::{RetryMachine, RetryState, Transition};
pub use transport::{HttpTransport, ReqwestTransport, UpstreamResponse, ACCEPT_JSON};
