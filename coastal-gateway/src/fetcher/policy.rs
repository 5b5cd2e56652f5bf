use std::time::Duration;

/// Which HTTP statuses count as a failed attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusRetry {
    /// Anything outside 2xx is retried
    AnyFailure,
    /// Only these statuses are retried; the rest are returned to the caller
    Only(Vec<u16>),
}

/// Attempt budget, backoff schedule and per-attempt timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, at least 1
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub timeout: Duration,
    pub retry_on: StatusRetry,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
    pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(600);
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(8000);

    pub fn new(max_attempts: u32, base_delay: Duration, timeout: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            timeout,
            retry_on: StatusRetry::AnyFailure,
        }
    }

    /// One attempt, no backoff
    pub fn single_attempt(timeout: Duration) -> Self {
        Self::new(1, Duration::ZERO, timeout)
    }

    /// Restrict status retries to `statuses`
    pub fn retry_statuses(mut self, statuses: Vec<u16>) -> Self {
        self.retry_on = StatusRetry::Only(statuses);
        self
    }

    /// Delay after the failed attempt with 0-based index `attempt`: `base * 2^attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }
        match 2u32.checked_pow(attempt) {
            Some(factor) => self.base_delay.saturating_mul(factor),
            None => Duration::MAX,
        }
    }

    /// Whether a response with `status` is a failed attempt.
    pub fn retries_status(&self, status: u16) -> bool {
        match &self.retry_on {
            StatusRetry::AnyFailure => !(200..300).contains(&status),
            StatusRetry::Only(statuses) => statuses.contains(&status),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_MAX_ATTEMPTS,
            Self::DEFAULT_BASE_DELAY,
            Self::DEFAULT_TIMEOUT,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_schedule() {
        let policy = RetryPolicy::default();
        let delays: Vec<_> = (0..4).map(|i| policy.delay_for(i).as_millis()).collect();
        assert_eq!(delays, [600, 1200, 2400, 4800]);
    }

    #[test]
    fn test_schedule_saturates() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(200), Duration::MAX);
    }

    #[test]
    fn test_at_least_one_attempt() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO, Duration::ZERO).max_attempts, 1);
    }

    #[test]
    fn test_status_retry() {
        let any = RetryPolicy::default();
        assert!(any.retries_status(404));
        assert!(any.retries_status(503));
        assert!(!any.retries_status(204));

        let cold = RetryPolicy::default().retry_statuses(vec![502, 503, 504]);
        assert!(cold.retries_status(503));
        assert!(!cold.retries_status(404));
        assert!(!cold.retries_status(500));
    }
}
