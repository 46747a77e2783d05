//! Error types for Vehicle service calls.

use motorcover_resilience::Transient;
use thiserror::Error;

/// Errors from a single outbound call to the Vehicle service.
///
/// These never escape [`VehicleLookupClient`](crate::VehicleLookupClient);
/// the policy stack retries or absorbs them.
#[derive(Error, Debug)]
pub enum LookupError {
    /// Network error (connection refused, timeout, reset)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The service answered with a status the stack treats as transient
    #[error("vehicle service returned status {status}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Whether the status is in the retryable set
        transient: bool,
    },

    /// Invalid client setup (bad base URL, TLS init failure)
    #[error("internal error: {0}")]
    Internal(String),
}

impl Transient for LookupError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Status { transient, .. } => *transient,
            Self::Internal(_) => false,
        }
    }
}

/// Result type alias for Vehicle service calls.
pub type Result<T> = std::result::Result<T, LookupError>;
