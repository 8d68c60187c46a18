//! Bounded retry for provider transport failures.
//!
//! Only transient failures (connection refused, timeouts) are worth a
//! second attempt; everything else already carries the provider's answer
//! or cannot improve by resending, and is returned immediately.

use std::future::Future;
use std::time::Duration;

/// Retry schedule applied to transient transport failures.
///
/// `max_retries` counts attempts *after* the initial one; the delay before
/// retry `n` is `base_delay * 2^n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first.
    pub max_retries: u32,
    /// Delay before the first retry; doubles each retry after that.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    /// Run `f` until it succeeds, fails permanently, or the budget is spent.
    ///
    /// `is_transient` decides which errors earn another attempt; a
    /// non-transient error is returned from the attempt that produced it.
    /// When the budget runs out, the last attempt's error is returned.
    pub async fn run<T, E, C, F, Fut>(&self, is_transient: C, f: F) -> Result<T, E>
    where
        E: std::fmt::Display,
        C: Fn(&E) -> bool,
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        for attempt in 0..self.max_retries {
            match f().await {
                Ok(value) => return Ok(value),
                Err(e) if is_transient(&e) => {
                    let delay = self.base_delay * 2u32.pow(attempt);
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        "transient provider failure, retrying in {delay:?}: {e}"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
        // Final attempt, no budget left to wait on.
        f().await
    }
}

/// Whether a request failure is transient at the transport level.
///
/// Connection failures and timeouts may succeed on resend. Body, decode,
/// and redirect-policy errors will not, and a response with any status at
/// all is the provider's answer, not a failure.
pub(crate) fn transport_is_transient(error: &reqwest::Error) -> bool {
    error.is_connect() || error.is_timeout()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, PartialEq)]
    enum FakeError {
        Transient,
        Permanent,
    }

    impl std::fmt::Display for FakeError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Self::Transient => f.write_str("transient"),
                Self::Permanent => f.write_str("permanent"),
            }
        }
    }

    fn transient(e: &FakeError) -> bool {
        *e == FakeError::Transient
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_exhaust_the_budget() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::default();

        let result: Result<(), FakeError> = policy
            .run(transient, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(FakeError::Transient) }
            })
            .await;

        assert_eq!(result, Err(FakeError::Transient));
        assert_eq!(calls.load(Ordering::SeqCst), policy.max_retries + 1);
    }

    #[tokio::test]
    async fn permanent_failure_returns_after_one_attempt() {
        let calls = AtomicU32::new(0);

        let result: Result<(), FakeError> = RetryPolicy::default()
            .run(transient, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(FakeError::Permanent) }
            })
            .await;

        assert_eq!(result, Err(FakeError::Permanent));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn success_after_transient_failures_stops_retrying() {
        let calls = AtomicU32::new(0);

        let result: Result<u32, FakeError> = RetryPolicy::default()
            .run(transient, || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(FakeError::Transient)
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn zero_retries_means_exactly_one_attempt() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            max_retries: 0,
            base_delay: Duration::from_millis(1),
        };

        let result: Result<(), FakeError> = policy
            .run(transient, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(FakeError::Transient) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
