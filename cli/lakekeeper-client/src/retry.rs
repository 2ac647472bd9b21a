//! Retry policy for transient failures.

use std::time::Duration;

use rand::Rng;
use reqwest::StatusCode;

/// Retry settings applied to every request of a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Disables retries entirely when `false`.
    pub enabled: bool,
    /// Retries after the initial attempt.
    pub max_retries: u32,
    pub min_wait: Duration,
    pub max_wait: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_retries: 4,
            min_wait: Duration::from_secs(1),
            max_wait: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    /// Total attempts a request may take, including the first.
    pub fn max_attempts(&self) -> u32 {
        if self.enabled {
            self.max_retries.saturating_add(1)
        } else {
            1
        }
    }

    /// Linear backoff with jitter before retry number `retry` (starting at 1).
    ///
    /// The wait is a random duration in `[min_wait, max_wait)` multiplied by
    /// `retry`; with `max_wait <= min_wait` it is `min_wait * retry`.
    pub fn backoff(&self, retry: u32) -> Duration {
        let retry = retry.max(1);
        if self.max_wait <= self.min_wait {
            return self.min_wait.saturating_mul(retry);
        }
        let span = (self.max_wait - self.min_wait).as_nanos() as u64;
        let jitter = Duration::from_nanos(rand::rng().random_range(0..span));
        (self.min_wait + jitter).saturating_mul(retry)
    }
}

/// 429 and every status from 500 up.
pub fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() >= 500
}

/// Connection failures are retried; the request never reached the server.
pub(crate) fn is_retryable_transport_error(err: &reqwest::Error) -> bool {
    err.is_connect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_statuses() {
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_retryable_status(StatusCode::from_u16(599).unwrap()));
        assert!(!is_retryable_status(StatusCode::BAD_REQUEST));
        assert!(!is_retryable_status(StatusCode::UNAUTHORIZED));
        assert!(!is_retryable_status(StatusCode::NOT_FOUND));
        assert!(!is_retryable_status(StatusCode::CONFLICT));
    }

    #[test]
    fn backoff_grows_linearly_within_bounds() {
        let config = RetryConfig {
            min_wait: Duration::from_millis(10),
            max_wait: Duration::from_millis(20),
            ..Default::default()
        };
        for retry in 1..=5 {
            for _ in 0..20 {
                let wait = config.backoff(retry);
                assert!(wait >= Duration::from_millis(10) * retry, "{wait:?}");
                assert!(wait < Duration::from_millis(20) * retry, "{wait:?}");
            }
        }
    }

    #[test]
    fn backoff_without_jitter_range_is_linear() {
        let config = RetryConfig {
            min_wait: Duration::from_millis(50),
            max_wait: Duration::from_millis(50),
            ..Default::default()
        };
        assert_eq!(config.backoff(1), Duration::from_millis(50));
        assert_eq!(config.backoff(3), Duration::from_millis(150));
    }

    #[test]
    fn disabled_retries_allow_one_attempt() {
        let config = RetryConfig {
            enabled: false,
            max_retries: 5,
            ..Default::default()
        };
        assert_eq!(config.max_attempts(), 1);
        assert_eq!(
            RetryConfig {
                max_retries: 5,
                ..Default::default()
            }
            .max_attempts(),
            6
        );
    }
}
