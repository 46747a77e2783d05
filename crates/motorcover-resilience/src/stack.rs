//! The composed policy stack: Fallback → Circuit Breaker → Retry → call.

use crate::circuit_breaker::CircuitBreaker;
use crate::error::Transient;
use crate::fallback::{FallbackPolicy, PolicyOutcome};
use crate::retry::RetryPolicy;
use motorcover_core::ResilienceConfig;
use std::collections::BTreeSet;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

/// HTTP statuses retried by default.
pub const DEFAULT_RETRYABLE_STATUSES: [u16; 5] = [408, 500, 502, 503, 504];

/// Wraps outbound calls in the full resilience stack.
///
/// The breaker is held by `Arc` so every stack built for the same dependency
/// shares one failure count.
#[derive(Debug, Clone)]
pub struct PolicyStack {
    retry: RetryPolicy,
    breaker: Arc<CircuitBreaker>,
    fallback: FallbackPolicy,
    retryable_statuses: BTreeSet<u16>,
}

impl PolicyStack {
    /// Compose a stack around a shared breaker.
    #[must_use]
    pub fn new(retry: RetryPolicy, breaker: Arc<CircuitBreaker>) -> Self {
        let fallback = FallbackPolicy::new(breaker.name());
        Self {
            retry,
            breaker,
            fallback,
            retryable_statuses: DEFAULT_RETRYABLE_STATUSES.into_iter().collect(),
        }
    }

    /// Build the retry layer and status set from config around a shared breaker.
    #[must_use]
    pub fn from_config(config: &ResilienceConfig, breaker: Arc<CircuitBreaker>) -> Self {
        Self::new(RetryPolicy::from_config(config), breaker)
            .with_retryable_statuses(config.retryable_statuses.iter().copied())
    }

    /// Replace the set of HTTP statuses treated as transient.
    #[must_use]
    pub fn with_retryable_statuses(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.retryable_statuses = statuses.into_iter().collect();
        self
    }

    /// Whether an HTTP status should be retried and counted by the breaker.
    #[must_use]
    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
    }

    /// The shared breaker.
    #[must_use]
    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Run `op` through the stack; `fallback` supplies the value on any failure.
    ///
    /// The breaker sees one outcome per invocation, after retries are spent.
    pub async fn execute<T, E, F, Fut, D>(&self, op: F, fallback: D) -> PolicyOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Transient + Display,
        D: FnOnce() -> T,
    {
        let result = self.breaker.call(self.retry.execute(op)).await;
        self.fallback.recover(result, fallback)
    }
}
