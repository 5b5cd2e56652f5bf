use std::sync::Arc;

use coastal_common::error::ErrorClassification;
use serde_json::Value;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error, warn};
use url::Url;

use super::error::{FetchError, FetchResult};
use super::policy::RetryPolicy;
use super::retry::{RetryMachine, Transition};
use super::transport::{HttpTransport, ReqwestTransport, UpstreamResponse};

/// How one completed exchange is judged
enum Outcome<T> {
    Done(T),
    /// Failed attempt; the response, if any, is remembered for exhaustion
    Retry(FetchError, Option<UpstreamResponse>),
    Fail(FetchError),
}

/// GET with bounded retries, exponential backoff and cancellation.
#[derive(Clone)]
pub struct ResilientFetcher {
    transport: Arc<dyn HttpTransport>,
    policy: RetryPolicy,
}

impl std::fmt::Debug for ResilientFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientFetcher")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl ResilientFetcher {
    pub fn new(transport: Arc<dyn HttpTransport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// Fetcher over a fresh `reqwest` client
    pub fn with_reqwest(policy: RetryPolicy) -> FetchResult<Self> {
        Ok(Self::new(Arc::new(ReqwestTransport::new()?), policy))
    }

    /// Same transport, different policy
    pub fn with_policy(&self, policy: RetryPolicy) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetch and decode a JSON document.
    ///
    /// Non-2xx statuses the policy retries, transport failures and bodies
    /// that are not valid JSON all count as failed attempts. A non-2xx status
    /// the policy does not retry fails immediately.
    pub async fn fetch_json(
        &self,
        url: &Url,
        shutdown: Option<broadcast::Receiver<()>>,
    ) -> FetchResult<Value> {
        self.run(url, shutdown, |response| {
            if !response.is_success() {
                let err = FetchError::Status {
                    status: response.status,
                };
                return if self.policy.retries_status(response.status) {
                    Outcome::Retry(err, Some(response))
                } else {
                    Outcome::Fail(err)
                };
            }
            match serde_json::from_str(&response.body) {
                Ok(value) => Outcome::Done(value),
                Err(e) => Outcome::Retry(FetchError::Decode(e.to_string()), None),
            }
        })
        .await
    }

    /// Fetch the raw response.
    ///
    /// Statuses the policy does not retry are returned as-is, including
    /// non-2xx ones.
    pub async fn fetch_response(
        &self,
        url: &Url,
        shutdown: Option<broadcast::Receiver<()>>,
    ) -> FetchResult<UpstreamResponse> {
        self.run(url, shutdown, |response| {
            if !response.is_success() && self.policy.retries_status(response.status) {
                Outcome::Retry(
                    FetchError::Status {
                        status: response.status,
                    },
                    Some(response),
                )
            } else {
                Outcome::Done(response)
            }
        })
        .await
    }

    async fn run<T, F>(
        &self,
        url: &Url,
        mut shutdown: Option<broadcast::Receiver<()>>,
        judge: F,
    ) -> FetchResult<T>
    where
        F: Fn(UpstreamResponse) -> Outcome<T>,
    {
        let mut machine = RetryMachine::new(&self.policy);
        let mut last_response = None;

        loop {
            debug!(
                url = %url,
                attempt = machine.attempt_number(),
                max_attempts = machine.max_attempts(),
                "fetch attempt"
            );

            let result = tokio::select! {
                biased;
                _ = wait_for_shutdown(&mut shutdown) => return Err(FetchError::Cancelled),
                r = tokio::time::timeout(self.policy.timeout, self.transport.get(url, self.policy.timeout)) => {
                    r.unwrap_or_else(|_| Err(FetchError::Timeout(self.policy.timeout)))
                }
            };

            let failure = match result {
                Ok(response) => match judge(response) {
                    Outcome::Done(value) => {
                        machine.succeed();
                        return Ok(value);
                    }
                    Outcome::Retry(err, response) => {
                        last_response = response;
                        err
                    }
                    Outcome::Fail(err) => return Err(err),
                },
                Err(err) if err.is_transient() => {
                    last_response = None;
                    err
                }
                Err(err) => return Err(err),
            };

            match machine.fail(failure.suggested_retry_delay()) {
                Transition::Retry(delay) => {
                    warn!(
                        url = %url,
                        attempt = machine.attempt_number(),
                        delay_ms = delay.as_millis() as u64,
                        error = %failure,
                        "fetch attempt failed, backing off"
                    );
                    tokio::select! {
                        biased;
                        _ = wait_for_shutdown(&mut shutdown) => return Err(FetchError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                    machine.resume();
                }
                Transition::GiveUp { attempts } => {
                    error!(url = %url, attempts, error = %failure, "upstream exhausted");
                    return Err(FetchError::Exhausted {
                        attempts,
                        last: Box::new(failure),
                        last_response,
                    });
                }
            }
        }
    }
}

/// Resolves when a shutdown is signalled; never resolves without a receiver
/// or after every sender is gone.
async fn wait_for_shutdown(shutdown: &mut Option<broadcast::Receiver<()>>) {
    match shutdown {
        Some(rx) => match rx.recv().await {
            Ok(()) | Err(RecvError::Lagged(_)) => {}
            Err(RecvError::Closed) => std::future::pending().await,
        },
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::mock::{MockStep, MockTransport};
    use std::time::Duration;
    use tokio::time::Instant;

    fn url() -> Url {
        Url::parse("http://backend.test/waves/").unwrap()
    }

    fn fetcher(transport: Arc<MockTransport>) -> ResilientFetcher {
        ResilientFetcher::new(transport, RetryPolicy::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_fifth_attempt() {
        let transport = Arc::new(MockTransport::new().then_refused(4).then_json(200, r#"[{"hs":1.2}]"#));
        let started = Instant::now();

        let value = fetcher(transport.clone()).fetch_json(&url(), None).await.unwrap();

        assert_eq!(value, serde_json::json!([{"hs": 1.2}]));
        assert_eq!(transport.request_count(), 5);
        // 600 + 1200 + 2400 + 4800 ms of backoff
        assert_eq!(started.elapsed(), Duration::from_millis(9000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_after_budget() {
        let transport = Arc::new(
            MockTransport::new()
                .then_refused(4)
                .then_json(503, r#"{"detail":"waking up"}"#),
        );
        let started = Instant::now();

        let err = fetcher(transport.clone()).fetch_json(&url(), None).await.unwrap_err();

        match err {
            FetchError::Exhausted {
                attempts,
                last,
                last_response,
            } => {
                assert_eq!(attempts, 5);
                assert!(matches!(*last, FetchError::Status { status: 503 }));
                assert_eq!(last_response.map(|r| r.status), Some(503));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(transport.request_count(), 5);
        // no sleep after the final attempt
        assert_eq!(started.elapsed(), Duration::from_millis(9000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_json_is_retried() {
        let transport = Arc::new(MockTransport::new().then_json(200, "<html>").then_json(200, "{}"));
        let value = fetcher(transport.clone()).fetch_json(&url(), None).await.unwrap();
        assert_eq!(value, serde_json::json!({}));
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_as_failure() {
        let transport = Arc::new(MockTransport::new().then(MockStep::Hang).then_json(200, "[]"));
        let started = Instant::now();

        let value = fetcher(transport.clone()).fetch_json(&url(), None).await.unwrap();

        assert_eq!(value, serde_json::json!([]));
        // 8 s timeout plus the first 600 ms backoff
        assert_eq!(started.elapsed(), Duration::from_millis(8600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_error_not_retried() {
        let transport = Arc::new(
            MockTransport::new()
                .then(MockStep::Fail(FetchError::InvalidUrl("bad".into())))
                .then_json(200, "[]"),
        );
        let err = fetcher(transport.clone()).fetch_json(&url(), None).await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)));
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unlisted_status_relayed_without_retry() {
        let transport = Arc::new(MockTransport::new().then_json(404, r#"{"detail":"nope"}"#));
        let fetcher = ResilientFetcher::new(
            transport.clone(),
            RetryPolicy::default().retry_statuses(vec![502, 503, 504]),
        );

        let response = fetcher.fetch_response(&url(), None).await.unwrap();

        assert_eq!(response.status, 404);
        assert_eq!(response.body, r#"{"detail":"nope"}"#);
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_backoff() {
        let transport = Arc::new(MockTransport::new().then_refused(5));
        let (tx, rx) = broadcast::channel(1);
        let fetcher = fetcher(transport.clone());

        let task = tokio::spawn(async move { fetcher.fetch_json(&url(), Some(rx)).await });
        // first attempt fails at t=0, backoff runs until t=600ms
        tokio::time::sleep(Duration::from_millis(300)).await;
        tx.send(()).unwrap();

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, FetchError::Cancelled));
        assert_eq!(transport.request_count(), 1);

        // no delayed retry fires after cancellation
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_attempt() {
        let transport = Arc::new(MockTransport::new().then(MockStep::Hang));
        let (tx, rx) = broadcast::channel(1);
        let fetcher = fetcher(transport.clone());

        let task = tokio::spawn(async move { fetcher.fetch_json(&url(), Some(rx)).await });
        tokio::time::sleep(Duration::from_millis(100)).await;
        tx.send(()).unwrap();

        assert!(matches!(task.await.unwrap(), Err(FetchError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_sender_does_not_cancel() {
        let transport = Arc::new(MockTransport::new().then_refused(1).then_json(200, "[]"));
        let (tx, rx) = broadcast::channel::<()>(1);
        drop(tx);

        let value = fetcher(transport).fetch_json(&url(), Some(rx)).await.unwrap();
        assert_eq!(value, serde_json::json!([]));
    }
}
