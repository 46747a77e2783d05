//! Error types for the insurance service.

use motorcover_db::DatabaseError;
use thiserror::Error;

/// Errors surfaced by [`InsuranceService`](crate::InsuranceService).
///
/// Vehicle lookup failures are not among them; they only leave records
/// without details.
#[derive(Error, Debug)]
pub enum InsuranceError {
    /// Loading insurances failed
    #[error("failed to load insurances: {0}")]
    Repository(#[from] DatabaseError),
}

/// Result type alias for insurance operations.
pub type Result<T> = std::result::Result<T, InsuranceError>;
