use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE, PRAGMA};
use serde::Serialize;
use url::Url;

use super::error::{FetchError, FetchResult};

/// Accept header sent upstream
pub const ACCEPT_JSON: &str = "application/json, text/plain;q=0.9, */*;q=0.8";

/// A completed upstream exchange, body kept as raw text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpstreamResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl UpstreamResponse {
    pub fn new(status: u16, content_type: Option<&str>, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: content_type.map(str::to_string),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One GET against an absolute URL.
///
/// Implementations must not cache and must not retry; both belong to the
/// caller.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &Url, timeout: Duration) -> FetchResult<UpstreamResponse>;
}

/// `reqwest`-backed transport
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> FetchResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("coastal-gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Connect(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &Url, timeout: Duration) -> FetchResult<UpstreamResponse> {
        let map_err = |e: reqwest::Error| {
            if e.is_timeout() {
                FetchError::Timeout(timeout)
            } else {
                FetchError::Connect(e.to_string())
            }
        };

        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, ACCEPT_JSON)
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .timeout(timeout)
            .send()
            .await
            .map_err(map_err)?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.map_err(map_err)?;

        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }
}
