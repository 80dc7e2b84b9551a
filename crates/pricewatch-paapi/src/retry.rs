//! Bounded retry with exponential backoff for partner-API throttling.
//!
//! Only [`PaapiError::RateLimited`] is retried: a 429 is the server asking us
//! to slow down, and every other failure either won't improve on retry
//! (not-found, deserialization) or is already surfaced to the caller for a
//! fallback decision. Exceeding the budget returns the last `RateLimited`
//! error as a terminal value.

use std::future::Future;
use std::time::Duration;

use crate::error::PaapiError;

/// Delay cap so a misconfigured base cannot stall a worker for hours.
const MAX_DELAY_SECS: u64 = 300;

/// Computes the backoff delay before retry number `attempt` (zero-based):
/// `base_secs * 2^attempt`, capped at [`MAX_DELAY_SECS`].
///
/// Pure so the schedule is testable without sleeping.
#[must_use]
pub fn backoff_delay_secs(attempt: u32, base_secs: u64) -> u64 {
    base_secs
        .saturating_mul(1u64 << attempt.min(10))
        .min(MAX_DELAY_SECS)
}

/// Runs `operation` with up to `max_retries` additional attempts on
/// [`PaapiError::RateLimited`].
///
/// Before each retry the worker sleeps for [`backoff_delay_secs`]; a
/// `Retry-After` value reported by the server acts as a floor under the
/// computed delay. The sleep blocks only the calling task.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    base_secs: u64,
    mut operation: F,
) -> Result<T, PaapiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, PaapiError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(PaapiError::RateLimited { retry_after_secs }) => {
                if attempt >= max_retries {
                    return Err(PaapiError::RateLimited { retry_after_secs });
                }
                let computed = backoff_delay_secs(attempt, base_secs);
                let delay_secs = retry_after_secs.map_or(computed, |floor| computed.max(floor));
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_secs,
                    "partner api rate limited; retrying after backoff"
                );
                tokio::time::sleep(Duration::from_secs(delay_secs)).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    fn rate_limited() -> PaapiError {
        PaapiError::RateLimited {
            retry_after_secs: None,
        }
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        assert_eq!(backoff_delay_secs(0, 5), 5);
        assert_eq!(backoff_delay_secs(1, 5), 10);
        assert_eq!(backoff_delay_secs(2, 5), 20);
        assert_eq!(backoff_delay_secs(3, 5), 40);
    }

    #[test]
    fn backoff_is_capped() {
        assert_eq!(backoff_delay_secs(10, 5), MAX_DELAY_SECS);
        assert_eq!(backoff_delay_secs(u32::MAX, u64::MAX), MAX_DELAY_SECS);
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, PaapiError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_rate_limited_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                let n = c.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(rate_limited())
                } else {
                    Ok::<u32, PaapiError>(99)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausted_budget_returns_terminal_rate_limited() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(2, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, PaapiError>(rate_limited())
            }
        })
        .await;
        // max_retries=2 → 3 total attempts
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(result, Err(PaapiError::RateLimited { .. })));
    }

    #[tokio::test]
    async fn does_not_retry_not_found() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, PaapiError>(PaapiError::NotFound {
                    asin: "B0MISSING".to_owned(),
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(PaapiError::NotFound { .. })));
    }

    #[tokio::test]
    async fn does_not_retry_unexpected_status() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, PaapiError>(PaapiError::UnexpectedStatus {
                    status: 500,
                    url: "https://api.example/getitems".to_owned(),
                    body: "oops".to_owned(),
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(PaapiError::UnexpectedStatus { .. })));
    }
}
