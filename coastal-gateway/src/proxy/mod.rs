//! Same-origin proxy in front of the backend.
//!
//! `GET <route>?path=<logical path>` is resolved against the configured
//! backend origin, forwarded with the cold-start retry policy, and the
//! upstream status, body and content type are relayed untouched.

mod error;
mod forwarder;
mod server;
mod target;

pub use error::ProxyError;
pub use forwarder::{ProxyErrorBody, ProxyForwarder, ProxyReply, DEFAULT_CONTENT_TYPE};
pub use server::{handle_request, ProxyServer, ProxyState};
pub use target::{is_over_encoded, normalize_logical_path, resolve_target, DEFAULT_PATH};
