//! MotorCover Resilience - Policy stack for outbound dependency calls.
//!
//! Every outbound call to the Vehicle service runs through a fixed stack of
//! three policies, outermost first:
//!
//! ```text
//! Fallback → Circuit Breaker → Retry → raw call
//! ```
//!
//! - [`RetryPolicy`] retries transient failures with `base^attempt` second backoff.
//! - [`CircuitBreaker`] is shared process-wide per dependency and fails fast
//!   once it has seen too many consecutive transient failures.
//! - [`FallbackPolicy`] turns whatever is left into a synthetic empty success,
//!   so callers above this layer never see an error.
//!
//! # Example
//!
//! ```rust
//! use motorcover_resilience::{CircuitBreaker, PolicyStack, RetryPolicy, Transient};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[derive(Debug)]
//! struct Unavailable;
//!
//! impl std::fmt::Display for Unavailable {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "service unavailable")
//!     }
//! }
//!
//! impl Transient for Unavailable {
//!     fn is_transient(&self) -> bool {
//!         false
//!     }
//! }
//!
//! # async fn example() {
//! let breaker = Arc::new(CircuitBreaker::new("vehicle-service", 5, Duration::from_secs(30)));
//! let stack = PolicyStack::new(RetryPolicy::new(3, 2.0), breaker);
//!
//! let outcome = stack
//!     .execute(|| async { Err::<Vec<u8>, _>(Unavailable) }, Vec::new)
//!     .await;
//! assert!(outcome.is_fallback());
//! assert!(outcome.into_inner().is_empty());
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod circuit_breaker;
pub mod error;
pub mod fallback;
pub mod retry;
pub mod stack;

// Re-export commonly used types
pub use circuit_breaker::{CallPermit, CircuitBreaker, CircuitState};
pub use error::{PolicyError, Transient};
pub use fallback::{FallbackCause, FallbackPolicy, PolicyOutcome};
pub use retry::RetryPolicy;
pub use stack::PolicyStack;
