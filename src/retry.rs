//! Fixed-delay retry policy shared by the registration and upload clients.
//!
//! Every failure is retried the same way: transport errors, non-success
//! statuses (including 4xx), and local I/O failures inside an attempt. Only
//! the error from the final attempt is returned to the caller.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::Result;

/// Default number of total attempts
pub const DEFAULT_ATTEMPTS: u32 = 3;

/// Default delay between attempts in milliseconds
pub const DEFAULT_DELAY_MS: u64 = 1000;

/// Fixed-count, fixed-delay retry policy (no backoff, no jitter)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one
    pub attempts: u32,
    /// Delay between consecutive attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            delay: Duration::from_millis(DEFAULT_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    /// Run `operation` until it succeeds or the attempts are exhausted.
    ///
    /// The closure receives the 1-based attempt number. Errors from earlier
    /// attempts are logged and dropped.
    pub async fn retry<T, F, Fut>(&self, operation: &str, mut attempt_fn: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;

        loop {
            debug!(operation, attempt, attempts, "starting attempt");
            match attempt_fn(attempt).await {
                Ok(value) => return Ok(value),
                Err(error) if attempt < attempts => {
                    warn!(
                        operation,
                        attempt,
                        error = %error,
                        "could not {operation}, retrying..."
                    );
                    sleep(self.delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TestNodError;
    use reqwest::StatusCode;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Instant;

    fn status_error(status: StatusCode) -> TestNodError {
        TestNodError::UnexpectedStatus {
            status,
            message: None,
        }
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts, 3);
        assert_eq!(policy.delay, Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_succeeds_first_attempt() {
        let calls = &AtomicU32::new(0);
        let policy = RetryPolicy::new(3, Duration::from_millis(10));

        let result = policy
            .retry("do work", move |_| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(42)
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_returns_last_error_only() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10));

        let result: Result<()> = policy
            .retry("do work", |attempt| async move {
                let status = match attempt {
                    1 => StatusCode::BAD_REQUEST,
                    2 => StatusCode::INTERNAL_SERVER_ERROR,
                    _ => StatusCode::SERVICE_UNAVAILABLE,
                };
                Err(status_error(status))
            })
            .await;

        match result {
            Err(TestNodError::UnexpectedStatus { status, .. }) => {
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE)
            }
            other => panic!("Expected last status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_client_errors_are_retried() {
        let calls = &AtomicU32::new(0);
        let policy = RetryPolicy::new(3, Duration::from_millis(10));

        let result: Result<()> = policy
            .retry("do work", move |_| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(status_error(StatusCode::BAD_REQUEST))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_fixed_delay_between_attempts() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));

        let start = Instant::now();
        let result = policy
            .retry("do work", |attempt| async move {
                if attempt < 3 {
                    Err(status_error(StatusCode::INTERNAL_SERVER_ERROR))
                } else {
                    Ok(attempt)
                }
            })
            .await;
        let elapsed = start.elapsed();

        assert_eq!(result.unwrap(), 3);
        // Two delays, no exponential growth
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed < Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_zero_attempts_still_runs_once() {
        let calls = &AtomicU32::new(0);
        let policy = RetryPolicy::new(0, Duration::from_millis(10));

        let _ = policy
            .retry("do work", move |_| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(status_error(StatusCode::BAD_GATEWAY))
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
