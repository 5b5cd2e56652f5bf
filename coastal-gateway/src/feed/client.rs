use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, TimeZone};
use coastal_common::display::Summary;
use coastal_common::record::{extract_rows, RecordMapper};
use coastal_common::schema::{CanonicalObservation, CanonicalTideEvent};
use coastal_common::series::merge_with_stats;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;
use url::Url;

use super::paths::{proxied_path, DayRange};
use crate::config::BackendConfig;
use crate::fetcher::{FetchError, FetchResult, ResilientFetcher, RetryPolicy};

/// How feed requests reach the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedRoute {
    /// Straight to the backend origin
    Direct,
    /// Through a proxy server at `origin`, on `route`
    Proxy { origin: Url, route: String },
}

/// Fetch, normalize and merge backend feeds.
#[derive(Debug, Clone)]
pub struct CoastalFeed<Tz: TimeZone = Local> {
    backend: Arc<BackendConfig>,
    route: FeedRoute,
    fetcher: ResilientFetcher,
    warmup_timeout: Duration,
    mapper: RecordMapper<Tz>,
}

impl CoastalFeed<Local> {
    /// Feed reading naive backend timestamps in the local timezone
    pub fn local(backend: Arc<BackendConfig>, fetcher: ResilientFetcher) -> Self {
        Self::new(backend, fetcher, RecordMapper::local())
    }
}

impl<Tz: TimeZone> CoastalFeed<Tz>
where
    Tz::Offset: Display,
{
    pub fn new(backend: Arc<BackendConfig>, fetcher: ResilientFetcher, mapper: RecordMapper<Tz>) -> Self {
        Self {
            backend,
            route: FeedRoute::Direct,
            fetcher,
            warmup_timeout: Duration::from_millis(4000),
            mapper,
        }
    }

    pub fn with_route(mut self, route: FeedRoute) -> Self {
        self.route = route;
        self
    }

    pub fn with_warmup_timeout(mut self, timeout: Duration) -> Self {
        self.warmup_timeout = timeout;
        self
    }

    pub fn route(&self) -> &FeedRoute {
        &self.route
    }

    /// Absolute URL for a logical backend path under the current route.
    pub fn url_for(&self, logical: &str) -> FetchResult<Url> {
        let joined = match &self.route {
            FeedRoute::Direct => self.backend.join(logical),
            FeedRoute::Proxy { origin, route } => origin.join(&proxied_path(route, logical)),
        };
        joined.map_err(|e| FetchError::InvalidUrl(format!("{}: {}", logical, e)))
    }

    /// Raw JSON document at `logical`
    pub async fn fetch_value(
        &self,
        logical: &str,
        shutdown: Option<broadcast::Receiver<()>>,
    ) -> FetchResult<Value> {
        let url = self.url_for(logical)?;
        self.fetcher.fetch_json(&url, shutdown).await
    }

    /// Wave observations over `range`, sorted and deduplicated.
    pub async fn waves(
        &self,
        range: &DayRange,
        shutdown: Option<broadcast::Receiver<()>>,
    ) -> FetchResult<Vec<CanonicalObservation>> {
        let payload = self.fetch_value(&range.waves_path(), shutdown).await?;
        Ok(self.observations_from(&payload))
    }

    /// Tide readings and events over `range`, sorted and deduplicated.
    pub async fn tides(
        &self,
        range: &DayRange,
        shutdown: Option<broadcast::Receiver<()>>,
    ) -> FetchResult<Vec<CanonicalTideEvent>> {
        let payload = self.fetch_value(&range.tides_path(), shutdown).await?;
        Ok(self.tide_events_from(&payload))
    }

    /// Wave observations over `range`, bounds sent with the feed's UTC offset.
    pub async fn waves_zoned(
        &self,
        range: &DayRange,
        shutdown: Option<broadcast::Receiver<()>>,
    ) -> FetchResult<Vec<CanonicalObservation>> {
        let path = range.zoned_waves_path(self.mapper.parser().timezone());
        let payload = self.fetch_value(&path, shutdown).await?;
        Ok(self.observations_from(&payload))
    }

    /// Tide readings and events over `range`, bounds sent with the feed's UTC offset.
    pub async fn tides_zoned(
        &self,
        range: &DayRange,
        shutdown: Option<broadcast::Receiver<()>>,
    ) -> FetchResult<Vec<CanonicalTideEvent>> {
        let path = range.zoned_tides_path(self.mapper.parser().timezone());
        let payload = self.fetch_value(&path, shutdown).await?;
        Ok(self.tide_events_from(&payload))
    }

    pub async fn summary(&self, shutdown: Option<broadcast::Receiver<()>>) -> FetchResult<Summary> {
        let payload = self.fetch_value("/waves/summary", shutdown).await?;
        Ok(Summary::from_value(&payload))
    }

    /// Normalize an observation payload.
    pub fn observations_from(&self, payload: &Value) -> Vec<CanonicalObservation> {
        let rows = extract_rows(payload);
        let (series, stats) = merge_with_stats(self.mapper.map_observations(&rows));
        debug!(
            rows = rows.len(),
            untimed = stats.untimed,
            merged = stats.merged,
            output = stats.output,
            "normalized wave observations"
        );
        series
    }

    /// Normalize a tide payload.
    pub fn tide_events_from(&self, payload: &Value) -> Vec<CanonicalTideEvent> {
        let rows = extract_rows(payload);
        let (series, stats) = merge_with_stats(self.mapper.map_tide_events(&rows));
        debug!(
            rows = rows.len(),
            untimed = stats.untimed,
            merged = stats.merged,
            output = stats.output,
            "normalized tide events"
        );
        series
    }

    /// Ping `/health` once to wake a sleeping backend.
    ///
    /// The outcome only matters for logging; returns whether a response
    /// (of any status) arrived.
    pub async fn warm_up(&self) -> bool {
        let url = match self.url_for("/health") {
            Ok(url) => url,
            Err(e) => {
                debug!(error = %e, "warm-up skipped");
                return false;
            }
        };
        let fetcher = self
            .fetcher
            .with_policy(RetryPolicy::single_attempt(self.warmup_timeout));

        match fetcher.fetch_response(&url, None).await {
            Ok(response) => {
                debug!(url = %url, status = response.status, "warm-up ping answered");
                true
            }
            Err(FetchError::Exhausted {
                last_response: Some(response),
                ..
            }) => {
                debug!(url = %url, status = response.status, "warm-up ping answered");
                true
            }
            Err(e) => {
                debug!(url = %url, error = %e, "warm-up ping failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::mock::{MockStep, MockTransport};
    use chrono::Utc;
    use coastal_common::time::TimeParser;
    use serde_json::json;

    fn feed(transport: Arc<MockTransport>) -> CoastalFeed<Utc> {
        let backend = Arc::new(BackendConfig::from_url("http://backend.test").unwrap());
        let fetcher = ResilientFetcher::new(transport, RetryPolicy::default());
        CoastalFeed::new(backend, fetcher, RecordMapper::new(TimeParser::new(Utc)))
    }

    #[test]
    fn test_url_for_routes() {
        let transport = Arc::new(MockTransport::new());
        let direct = feed(transport.clone());
        assert_eq!(
            direct.url_for("/waves/summary").unwrap().as_str(),
            "http://backend.test/waves/summary"
        );

        let proxied = feed(transport).with_route(FeedRoute::Proxy {
            origin: Url::parse("http://localhost:3000").unwrap(),
            route: "/api/proxy".into(),
        });
        assert_eq!(
            proxied.url_for("/waves/summary").unwrap().as_str(),
            "http://localhost:3000/api/proxy?path=%2Fwaves%2Fsummary"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_tides_zoned_sends_offset() {
        let transport = Arc::new(MockTransport::new().then_json(200, "[]"));
        let backend = Arc::new(BackendConfig::from_url("http://backend.test").unwrap());
        let lisbon = chrono::FixedOffset::east_opt(3600).unwrap();
        let feed = CoastalFeed::new(
            backend,
            ResilientFetcher::new(transport.clone(), RetryPolicy::default()),
            RecordMapper::new(TimeParser::new(lisbon)),
        );
        let day = DayRange::parse("2024-01-01", "2024-01-01").unwrap();

        let events = feed.tides_zoned(&day, None).await.unwrap();

        assert!(events.is_empty());
        let requested = transport.requests();
        assert_eq!(requested[0].path(), "/tides/");
        assert_eq!(
            requested[0].query(),
            Some("start=2024-01-01T00%3A00%3A00%2B01%3A00&end=2024-01-01T23%3A59%3A59%2B01%3A00")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_waves_pipeline() {
        let body = json!({"items": [
            {"ts": "2024-01-01 10:00:05", "hs": 1.0},
            {"ts": "2024-01-01 10:00:00", "hs": 2.0},
            {"timestamp": "2024-01-01T10:00:00Z", "waveHeight": 9.0, "wavePeriod": 8.0}
        ]});
        let transport = Arc::new(MockTransport::new().then_json(200, &body.to_string()));
        let feed = feed(transport.clone());

        let range = DayRange::parse("2024-01-01", "2024-01-01").unwrap();
        let series = feed.waves(&range, None).await.unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].hs, Some(2.0));
        assert_eq!(series[0].tp, Some(8.0));
        assert_eq!(series[1].hs, Some(1.0));
        assert_eq!(transport.requests()[0].path(), "/waves/");
    }

    #[tokio::test(start_paused = true)]
    async fn test_summary() {
        let transport = Arc::new(MockTransport::new().then_json(200, r#"{"date":"2024-01-01","hs_avg":1.5,"tp_avg":9}"#));
        let summary = feed(transport).summary(None).await.unwrap();
        assert_eq!(summary.get("hs_avg").unwrap().display, "1.50 m");
    }

    #[tokio::test(start_paused = true)]
    async fn test_warm_up_is_single_attempt() {
        let transport = Arc::new(MockTransport::new().then_refused(1).then_json(200, "{}"));
        let feed = feed(transport.clone());

        assert!(!feed.warm_up().await);
        assert_eq!(transport.request_count(), 1);
        assert_eq!(transport.requests()[0].path(), "/health");
    }

    #[tokio::test(start_paused = true)]
    async fn test_warm_up_accepts_any_status() {
        let transport = Arc::new(MockTransport::new().then_json(503, "{}"));
        assert!(feed(transport).warm_up().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_warm_up_times_out() {
        let transport = Arc::new(MockTransport::new().then(MockStep::Hang));
        let feed = feed(transport).with_warmup_timeout(Duration::from_millis(4000));
        let started = tokio::time::Instant::now();

        assert!(!feed.warm_up().await);
        assert_eq!(started.elapsed(), Duration::from_millis(4000));
    }
}
