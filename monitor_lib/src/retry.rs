//! Retry and backoff policy for one logical call.

use crate::error::Error;
use rand::Rng;
use reqwest::StatusCode;
use std::time::Duration;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Exponential backoff `base * multiplier^attempt`, clamped to `max_delay`.
///
/// With `jitter` on, each delay is drawn uniformly from the upper half of that value
/// (equal jitter), so independent clients hitting the same 429 or 503 spread out.
///
/// The attempt counter lives in the caller's stack frame, so nothing is shared
/// between calls.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; a call makes at most `max_retries + 1` attempts.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    /// Randomize each delay within `[computed / 2, computed]`.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Never retry.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before the retry that follows zero-based `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let capped = self.backoff_secs(attempt);
        let secs = if self.jitter && capped > 0.0 {
            let half = capped / 2.0;
            half + rand::thread_rng().gen_range(0.0..=half)
        } else {
            capped
        };
        Duration::try_from_secs_f64(secs).unwrap_or(self.max_delay)
    }

    /// Upper bound of the delay after `attempt`, in seconds, before jitter.
    fn backoff_secs(&self, attempt: u32) -> f64 {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let raw = self.base_delay.as_secs_f64() * self.multiplier.powi(exponent);
        let capped = raw.min(self.max_delay.as_secs_f64());
        if capped.is_nan() {
            0.0
        } else {
            capped.max(0.0)
        }
    }

    /// Delay after a failed attempt; a 429 `Retry-After` hint stretches the wait.
    pub fn delay_after(&self, attempt: u32, err: &Error) -> Duration {
        let backoff = self.delay_for(attempt);
        match err {
            Error::RateLimit(rl) => match rl.retry_after {
                Some(hint) => backoff.max(hint).min(self.max_delay),
                None => backoff,
            },
            _ => backoff,
        }
    }

    /// Whether to try again after zero-based `attempt` failed with `err`.
    pub fn should_retry(&self, attempt: u32, err: &Error) -> bool {
        attempt < self.max_retries && err.is_retryable()
    }
}

/// 429 and 5xx are worth another attempt; other non-success statuses are final.
pub fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{classify, NetworkError, NetworkErrorKind};
    use reqwest::header::{HeaderMap, HeaderValue};

    fn no_jitter() -> RetryPolicy {
        RetryPolicy {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(60),
            jitter: false,
            ..RetryPolicy::default()
        }
    }

    #[test]
    fn exponential_no_jitter() {
        let p = no_jitter();
        assert_eq!(p.delay_for(0), Duration::from_millis(100));
        assert_eq!(p.delay_for(1), Duration::from_millis(200));
        assert_eq!(p.delay_for(2), Duration::from_millis(400));
        assert_eq!(p.delay_for(3), Duration::from_millis(800));
    }

    #[test]
    fn clamped_to_max_delay() {
        let p = RetryPolicy {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
            multiplier: 3.0,
            jitter: false,
            ..RetryPolicy::default()
        };
        assert_eq!(p.delay_for(1), Duration::from_secs(3));
        assert_eq!(p.delay_for(2), Duration::from_secs(5));
        assert_eq!(p.delay_for(30), Duration::from_secs(5));
    }

    #[test]
    fn jitter_stays_within_upper_half() {
        let p = RetryPolicy {
            jitter: true,
            ..no_jitter()
        };
        for attempt in 0..6 {
            let ceiling = no_jitter().delay_for(attempt);
            for _ in 0..50 {
                let d = p.delay_for(attempt);
                assert!(d <= ceiling, "attempt {attempt}: {d:?} > {ceiling:?}");
                assert!(d >= ceiling / 2, "attempt {attempt}: {d:?} < half of {ceiling:?}");
            }
        }
    }

    #[test]
    fn jitter_varies_between_draws() {
        let p = RetryPolicy::default();
        let draws: Vec<Duration> = (0..32).map(|_| p.delay_for(3)).collect();
        assert!(draws.iter().any(|d| *d != draws[0]));
    }

    #[test]
    fn huge_max_delay_does_not_overflow() {
        let p = RetryPolicy {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::MAX,
            multiplier: 10.0,
            jitter: false,
            ..RetryPolicy::default()
        };
        assert_eq!(p.delay_for(400), Duration::MAX);
        let jittered = RetryPolicy { jitter: true, ..p };
        assert!(jittered.delay_for(400) > Duration::from_secs(1 << 40));
    }

    #[test]
    fn retryable_statuses() {
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_retryable_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!is_retryable_status(StatusCode::BAD_REQUEST));
        assert!(!is_retryable_status(StatusCode::UNAUTHORIZED));
        assert!(!is_retryable_status(StatusCode::NOT_FOUND));
        assert!(!is_retryable_status(StatusCode::OK));
    }

    #[test]
    fn should_retry_respects_budget_and_kind() {
        let p = RetryPolicy {
            max_retries: 2,
            ..no_jitter()
        };
        let server = classify(StatusCode::BAD_GATEWAY, &HeaderMap::new(), b"");
        let not_found = classify(StatusCode::NOT_FOUND, &HeaderMap::new(), b"");
        let network = Error::Network(NetworkError::new(NetworkErrorKind::Timeout, "timed out"));
        assert!(p.should_retry(0, &server));
        assert!(p.should_retry(1, &network));
        assert!(!p.should_retry(2, &server));
        assert!(!p.should_retry(0, &not_found));
        assert!(!RetryPolicy::none().should_retry(0, &server));
    }

    #[test]
    fn retry_after_stretches_delay() {
        let p = RetryPolicy {
            max_delay: Duration::from_secs(10),
            ..no_jitter()
        };
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("3"));
        let limited = classify(StatusCode::TOO_MANY_REQUESTS, &headers, b"");
        assert_eq!(p.delay_after(0, &limited), Duration::from_secs(3));

        headers.insert("retry-after", HeaderValue::from_static("3600"));
        let limited = classify(StatusCode::TOO_MANY_REQUESTS, &headers, b"");
        assert_eq!(p.delay_after(0, &limited), Duration::from_secs(10));
    }
}
