//! Scripted transport for tests and offline development.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use url::Url;

use super::error::{FetchError, FetchResult};
use super::transport::{HttpTransport, UpstreamResponse};

/// One scripted outcome
#[derive(Debug, Clone)]
pub enum MockStep {
    Respond(UpstreamResponse),
    Fail(FetchError),
    /// Never completes; exercises timeouts and cancellation
    Hang,
}

/// Transport that replays a fixed script and records every request.
///
/// Once the script is spent every call fails with a connection error.
#[derive(Debug, Default)]
pub struct MockTransport {
    steps: Mutex<VecDeque<MockStep>>,
    requests: Mutex<Vec<Url>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(self, step: MockStep) -> Self {
        self.steps.lock().push_back(step);
        self
    }

    /// Queue a JSON response
    pub fn then_json(self, status: u16, body: &str) -> Self {
        self.then(MockStep::Respond(UpstreamResponse::new(
            status,
            Some("application/json"),
            body,
        )))
    }

    /// Queue `n` connection failures
    pub fn then_refused(mut self, n: usize) -> Self {
        for _ in 0..n {
            self = self.then(MockStep::Fail(FetchError::Connect("connection refused".into())));
        }
        self
    }

    /// URLs requested so far, in order
    pub fn requests(&self) -> Vec<Url> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn get(&self, url: &Url, _timeout: Duration) -> FetchResult<UpstreamResponse> {
        self.requests.lock().push(url.clone());
        let step = self.steps.lock().pop_front();
        match step {
            Some(MockStep::Respond(response)) => Ok(response),
            Some(MockStep::Fail(err)) => Err(err),
            Some(MockStep::Hang) => std::future::pending().await,
            None => Err(FetchError::Connect("mock script exhausted".into())),
        }
    }
}
