//! Bounded retry with exponential backoff.
//!
//! Waits observe until a condition holds; retries re-run an operation that
//! failed. The two never nest the other way around.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::sleep;
use tracing::warn;

#[derive(Clone, Copy, Debug)]
pub struct RetryOptions {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub backoff_multiplier: f64,
    pub max_delay: Duration,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryOptions {
    /// Delay before the attempt after `failed_attempts` failures, capped.
    /// Computed in float seconds so a runaway exponent saturates at
    /// `max_delay` instead of overflowing the Duration.
    fn delay_after(&self, failed_attempts: u32) -> Duration {
        let exponent = failed_attempts.saturating_sub(1) as f64;
        let raw = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powf(exponent);
        if !raw.is_finite() || raw >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        Duration::from_secs_f64(raw)
    }
}

/// All attempts failed; carries the count and the final failure.
#[derive(Debug, Error)]
#[error("operation failed after {attempts} attempts: {last}")]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    #[source]
    pub last: E,
}

/// Run `op` up to `opts.max_attempts` times, sleeping with exponential
/// backoff between failures.
pub async fn with_retry<T, E, F, Fut>(mut op: F, opts: RetryOptions) -> Result<T, RetryExhausted<E>>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = opts.max_attempts.max(1);
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt >= max_attempts => {
                return Err(RetryExhausted {
                    attempts: attempt,
                    last: err,
                });
            }
            Err(err) => {
                let delay = opts.delay_after(attempt);
                warn!(
                    target: "dom_kit::retry",
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "attempt failed, backing off"
                );
                sleep(delay).await;
            }
        }
    }
}

/// Like [`with_retry`], but a failure the predicate rejects is returned
/// immediately without sleeping or consuming further attempts.
pub async fn with_retry_on_condition<T, E, F, Fut, P>(
    mut op: F,
    mut should_retry: P,
    opts: RetryOptions,
) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: FnMut(&E) -> bool,
{
    let max_attempts = opts.max_attempts.max(1);
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if !should_retry(&err) || attempt >= max_attempts => return Err(err),
            Err(err) => {
                let delay = opts.delay_after(attempt);
                warn!(
                    target: "dom_kit::retry",
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "retryable failure, backing off"
                );
                sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    #[derive(Debug, Error)]
    #[error("boom")]
    struct Boom;

    #[tokio::test(start_paused = true)]
    async fn exhaustion_reports_attempt_count() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let err = with_retry(
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(Boom) }
            },
            RetryOptions::default(),
        )
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(err.attempts, 3);
        assert!(err.to_string().contains("3"));
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let value = with_retry(
            move || {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(Boom)
                    } else {
                        Ok(42u32)
                    }
                }
            },
            RetryOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(value, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_errors_short_circuit_without_sleeping() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let started = Instant::now();

        let err = with_retry_on_condition(
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(Boom) }
            },
            |_| false,
            RetryOptions::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Boom));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_doubles_and_caps() {
        let opts = RetryOptions {
            max_attempts: 6,
            initial_delay: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(10),
        };
        assert_eq!(opts.delay_after(1), Duration::from_secs(1));
        assert_eq!(opts.delay_after(2), Duration::from_secs(2));
        assert_eq!(opts.delay_after(3), Duration::from_secs(4));
        assert_eq!(opts.delay_after(4), Duration::from_secs(8));
        assert_eq!(opts.delay_after(5), Duration::from_secs(10));
    }

    #[test]
    fn backoff_saturates_for_extreme_attempt_counts() {
        let opts = RetryOptions {
            max_attempts: u32::MAX,
            ..RetryOptions::default()
        };
        // 2^5000 overflows f64 to infinity; the delay must stay capped.
        assert_eq!(opts.delay_after(5_000), opts.max_delay);
        assert_eq!(opts.delay_after(u32::MAX), opts.max_delay);
    }
}
