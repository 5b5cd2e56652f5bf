use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{info, warn};
use url::Url;

use super::error::ProxyError;
use super::target::{resolve_target, DEFAULT_PATH};
use crate::config::BackendConfig;
use crate::fetcher::{FetchError, ResilientFetcher, UpstreamResponse};

/// Content type relayed when the upstream sends none
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Error body returned with 502 when forwarding fails
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProxyErrorBody {
    pub ok: bool,
    pub error: &'static str,
    pub detail: String,
    /// Backend origin as configured
    pub base: String,
    /// `path` value as received
    pub got: String,
    /// Resolved upstream URL, `null` when resolution itself failed
    pub target: Option<String>,
}

/// Response handed back to the proxy client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyReply {
    pub status: u16,
    pub content_type: String,
    pub body: String,
}

impl ProxyReply {
    fn relay(response: UpstreamResponse) -> Self {
        Self {
            status: response.status,
            content_type: response
                .content_type
                .filter(|ct| !ct.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            body: response.body,
        }
    }

    fn bad_gateway(body: &ProxyErrorBody) -> Self {
        // serializing a struct of strings and bools cannot fail
        let body = serde_json::to_string(body).unwrap_or_else(|_| {
            r#"{"ok":false,"error":"proxy_error"}"#.to_string()
        });
        Self {
            status: 502,
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            body,
        }
    }
}

/// Resolves logical paths against the backend and relays responses.
#[derive(Debug, Clone)]
pub struct ProxyForwarder {
    backend: Arc<BackendConfig>,
    fetcher: ResilientFetcher,
}

impl ProxyForwarder {
    pub fn new(backend: Arc<BackendConfig>, fetcher: ResilientFetcher) -> Self {
        Self { backend, fetcher }
    }

    pub fn backend(&self) -> &BackendConfig {
        &self.backend
    }

    pub fn resolve_target(&self, raw: &str) -> Result<Url, ProxyError> {
        resolve_target(&self.backend, raw)
    }

    /// Forward one request. Always yields a reply; failures become a 502
    /// with a [`ProxyErrorBody`].
    ///
    /// An upstream status outside the retry policy is relayed unchanged.
    /// When retries run out on a status, the last upstream response is
    /// relayed; when they run out on transport errors, the reply is a 502.
    pub async fn forward(
        &self,
        path: Option<&str>,
        shutdown: Option<broadcast::Receiver<()>>,
    ) -> ProxyReply {
        let raw = path.filter(|p| !p.trim().is_empty()).unwrap_or(DEFAULT_PATH);
        let started = Instant::now();

        let target = match self.resolve_target(raw) {
            Ok(target) => target,
            Err(e) => {
                warn!(path = %raw, error = %e, "proxy target resolution failed");
                return self.failure(raw, None, &e);
            }
        };

        let reply = match self.fetcher.fetch_response(&target, shutdown).await {
            Ok(response) => ProxyReply::relay(response),
            Err(FetchError::Exhausted {
                last_response: Some(response),
                ..
            }) => ProxyReply::relay(response),
            Err(e) => self.failure(raw, Some(&target), &ProxyError::from(e)),
        };

        info!(
            path = %raw,
            target = %target,
            status = reply.status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "proxied request"
        );
        reply
    }

    fn failure(&self, raw: &str, target: Option<&Url>, err: &ProxyError) -> ProxyReply {
        ProxyReply::bad_gateway(&ProxyErrorBody {
            ok: false,
            error: "proxy_error",
            detail: err.to_string(),
            base: self.backend.as_str().to_string(),
            got: raw.to_string(),
            target: target.map(Url::to_string),
        })
    }
}
