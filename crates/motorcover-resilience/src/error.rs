//! Error types for the policy stack.

use std::time::Duration;
use thiserror::Error;

/// Classifies an error as worth retrying.
///
/// Transient errors are retried and counted by the circuit breaker;
/// everything else passes straight through.
pub trait Transient {
    /// Whether a later attempt could plausibly succeed.
    fn is_transient(&self) -> bool;
}

/// Errors produced by the circuit-breaker and retry layers.
#[derive(Debug, Error)]
pub enum PolicyError<E> {
    /// The circuit is open; the call was not attempted.
    #[error("circuit is open, next trial in {retry_after:?}")]
    CircuitOpen {
        /// Time until the breaker admits a trial call
        retry_after: Duration,
    },

    /// The wrapped call failed.
    #[error("{0}")]
    Inner(E),
}

impl<E> PolicyError<E> {
    /// Whether the circuit breaker short-circuited the call.
    #[must_use]
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, Self::CircuitOpen { .. })
    }
}
