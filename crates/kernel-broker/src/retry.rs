//! The bounded retry-with-backoff policy a live [`BrokerAdapter`] implementation
//! applies to its own transient failures. The kernel doesn't ship a
//! live adapter, those are external collaborators, but every adapter needs
//! the same retry shape, so it lives here rather than being reinvented per venue.
//!
//! [`BrokerAdapter`]: crate::adapter::BrokerAdapter

use std::time::Duration;

use rand::Rng;
use tracing::warn;

use crate::error::{BrokerErrorKind, Error};

/// How many times `Auth`/`Network` errors are retried before surfacing,
/// with re-authentication attempted between tries.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Whether a given error kind is worth retrying at all. `Rejected` and
/// `Unsupported` surface immediately; `RateLimit` is retried but with
/// jittered backoff instead of the fixed re-auth delay.
fn is_retryable(kind: BrokerErrorKind) -> bool {
    matches!(kind, BrokerErrorKind::Auth | BrokerErrorKind::Network | BrokerErrorKind::RateLimit)
}

/// Runs `attempt` up to `max_attempts` times. Between attempts, calls
/// `reauth` for `Auth`/`Network` failures (token refresh) or sleeps a
/// jittered backoff for `RateLimit`. Returns the first success, or the last
/// error once attempts are exhausted or the error isn't retryable.
pub async fn with_retry<F, Fut, T, R, RFut>(max_attempts: u32, mut attempt: F, mut reauth: R) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, Error>>,
    R: FnMut() -> RFut,
    RFut: std::future::Future<Output = ()>,
{
    let mut last_err = None;
    for attempt_no in 1..=max_attempts.max(1) {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(Error::Broker { kind, message }) if is_retryable(kind) => {
                warn!(attempt = attempt_no, ?kind, %message, "broker call failed, retrying");
                if attempt_no == max_attempts {
                    last_err = Some(Error::Broker { kind, message });
                    break;
                }
                match kind {
                    BrokerErrorKind::RateLimit => tokio::time::sleep(jittered_backoff(attempt_no)).await,
                    _ => reauth().await,
                }
                last_err = Some(Error::Broker { kind, message });
            }
            Err(other) => return Err(other),
        }
    }
    Err(last_err.expect("loop runs at least once"))
}

/// Exponential backoff (base 200ms) with up to 50% random jitter, so a fleet
/// of retrying adapters doesn't resynchronize into a thundering herd.
fn jittered_backoff(attempt_no: u32) -> Duration {
    let base_ms = 200u64.saturating_mul(1u64 << attempt_no.min(8));
    let jitter_frac: f64 = rand::thread_rng().gen_range(0.0..0.5);
    let jittered_ms = base_ms as f64 * (1.0 + jitter_frac);
    Duration::from_millis(jittered_ms as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_succeeds_without_retry() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, Error> = with_retry(
            DEFAULT_MAX_ATTEMPTS,
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(42)
            },
            || async {},
        )
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_network_error_then_succeeds() {
        let calls = AtomicU32::new(0);
        let reauth_calls = AtomicU32::new(0);
        let result: Result<u32, Error> = with_retry(
            DEFAULT_MAX_ATTEMPTS,
            || async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 1 {
                    Err(Error::broker(BrokerErrorKind::Network, "timeout"))
                } else {
                    Ok(7)
                }
            },
            || {
                reauth_calls.fetch_add(1, Ordering::SeqCst);
                async {}
            },
        )
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(reauth_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rejected_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, Error> = with_retry(
            DEFAULT_MAX_ATTEMPTS,
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::broker(BrokerErrorKind::Rejected, "bad order"))
            },
            || async {},
        )
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhausts_attempts_then_surfaces_error() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, Error> = with_retry(
            2,
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::broker(BrokerErrorKind::Auth, "expired"))
            },
            || async {},
        )
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
