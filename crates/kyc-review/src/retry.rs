//! Bounded exponential backoff with jitter.
//!
//! Wraps store calls made by the orchestrator. Audit and event publication
//! are intentionally not wrapped: those are best-effort, single-attempt
//! paths where retrying buys nothing but latency.

use std::time::{Duration, Instant};

use kyc_store::StoreError;

use crate::classify::classify;

/// Default maximum attempts (first try included).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default base delay before the first retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(100);

/// Default cap on a single retry delay.
///
/// Kept well under the request timeout so exhaustion is reached before the
/// platform kills the invocation.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(2);

/// A retried operation that ultimately failed.
#[derive(Debug, thiserror::Error)]
pub enum RetryError {
    /// The error was classified as non-retryable; no further attempts were
    /// consumed.
    #[error("{label}: {source}")]
    Aborted {
        /// Operation label for logs.
        label: String,
        /// The raw failure.
        source: StoreError,
    },

    /// All attempts were consumed.
    #[error("{label} failed after {attempts} attempts ({total_delay_ms} ms of backoff): {source}")]
    Exhausted {
        /// Operation label for logs.
        label: String,
        /// Attempts made, first try included.
        attempts: u32,
        /// Total time slept between attempts.
        total_delay_ms: u64,
        /// The last observed failure.
        source: StoreError,
    },
}

impl RetryError {
    /// The underlying store error.
    #[must_use]
    pub fn source_error(&self) -> &StoreError {
        match self {
            Self::Aborted { source, .. } | Self::Exhausted { source, .. } => source,
        }
    }
}

/// Retry configuration: multiplicative backoff with randomized jitter.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
    jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_ATTEMPTS,
            DEFAULT_BASE_DELAY,
            DEFAULT_MAX_DELAY,
            2.0,
            0.2,
        )
    }
}

impl RetryPolicy {
    /// Create a policy. `jitter` is a fraction of the delay (0.0 - 1.0) by
    /// which each sleep is randomly shifted in either direction.
    #[must_use]
    pub fn new(
        max_attempts: u32,
        base_delay: Duration,
        max_delay: Duration,
        multiplier: f64,
        jitter: f64,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
            multiplier,
            jitter: jitter.clamp(0.0, 1.0),
        }
    }

    /// Run `op`, retrying retryable failures with backoff.
    ///
    /// Before each retry the error is classified; a non-retryable
    /// classification re-raises immediately without consuming further
    /// attempts. On exhaustion the last error is returned annotated with the
    /// attempt count and total backoff slept.
    ///
    /// # Errors
    ///
    /// Returns [`RetryError::Aborted`] or [`RetryError::Exhausted`].
    pub async fn execute<T, F>(&self, label: &str, mut op: F) -> Result<T, RetryError>
    where
        F: FnMut() -> Result<T, StoreError>,
    {
        let started = Instant::now();
        let mut delay = self.base_delay;
        let mut total_delay = Duration::ZERO;
        let mut attempt = 1u32;

        loop {
            match op() {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::debug!(
                            operation = label,
                            attempt,
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "operation recovered after retry"
                        );
                    }
                    return Ok(value);
                }
                Err(error) => {
                    let classified = classify(&error);
                    if !classified.retryable {
                        return Err(RetryError::Aborted {
                            label: label.to_string(),
                            source: error,
                        });
                    }
                    if attempt >= self.max_attempts {
                        tracing::warn!(
                            operation = label,
                            attempts = attempt,
                            total_delay_ms = total_delay.as_millis() as u64,
                            category = %classified.category,
                            error = %error,
                            "retries exhausted"
                        );
                        return Err(RetryError::Exhausted {
                            label: label.to_string(),
                            attempts: attempt,
                            total_delay_ms: total_delay.as_millis() as u64,
                            source: error,
                        });
                    }

                    let sleep_for = self.jittered(delay);
                    tracing::debug!(
                        operation = label,
                        attempt,
                        delay_ms = sleep_for.as_millis() as u64,
                        category = %classified.category,
                        error = %error,
                        "retrying after transient failure"
                    );
                    tokio::time::sleep(sleep_for).await;

                    total_delay += sleep_for;
                    delay = delay.mul_f64(self.multiplier).min(self.max_delay);
                    attempt += 1;
                }
            }
        }
    }

    fn jittered(&self, delay: Duration) -> Duration {
        if self.jitter == 0.0 {
            return delay;
        }
        let shift = self.jitter * (rand::random::<f64>() * 2.0 - 1.0);
        delay.mul_f64((1.0 + shift).max(0.0))
    }
}
