//! Typed access to the backend feeds: waves, tides and the daily summary.

mod client;
mod paths;

pub use client::{CoastalFeed, FeedRoute};
pub use paths::{api_path, encode_component, proxied_path, DayRange, DEFAULT_PROXY_ROUTE};
