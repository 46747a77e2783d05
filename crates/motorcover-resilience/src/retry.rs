//! Retry with exponential backoff.

use crate::error::Transient;
use motorcover_core::ResilienceConfig;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Default retries beyond the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default backoff base in seconds.
pub const DEFAULT_BACKOFF_BASE: f64 = 2.0;

/// Retries transient failures, waiting `base^attempt` seconds before attempt `attempt`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff_base: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, DEFAULT_BACKOFF_BASE)
    }
}

impl RetryPolicy {
    /// Create a retry policy.
    #[must_use]
    pub fn new(max_retries: u32, backoff_base: f64) -> Self {
        Self {
            max_retries,
            backoff_base,
        }
    }

    /// Build from the `[resilience]` config section.
    #[must_use]
    pub fn from_config(config: &ResilienceConfig) -> Self {
        Self::new(config.retry_count, config.retry_backoff_base)
    }

    /// Retries beyond the first attempt.
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before retry number `attempt` (1-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        Duration::try_from_secs_f64(self.backoff_base.powi(exponent)).unwrap_or(Duration::MAX)
    }

    /// Run `op`, retrying transient errors up to `max_retries` times.
    ///
    /// Non-transient errors and the error from the final attempt are returned as-is.
    pub async fn execute<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Transient + Display,
    {
        let mut attempt = 0;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.delay_for(attempt);

                    tracing::warn!(
                        "Transient failure (attempt {}/{}), retrying in {:?}: {}",
                        attempt,
                        self.max_retries + 1,
                        delay,
                        e
                    );

                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
