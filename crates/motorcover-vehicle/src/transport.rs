//! Transport seam between the lookup client and the wire.

use crate::error::Result;
use async_trait::async_trait;
use motorcover_core::RegistrationNumber;

/// Raw answer from the Vehicle service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Undecoded response body
    pub body: String,
}

impl TransportResponse {
    /// Create a response.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Synthetic `200 []`, substituted when a batch call fails.
    #[must_use]
    pub fn empty_batch() -> Self {
        Self::new(200, "[]")
    }

    /// Synthetic `200 null`, substituted when a single-key call fails.
    #[must_use]
    pub fn empty_single() -> Self {
        Self::new(200, "null")
    }

    /// Whether the status is 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether the service reported the key(s) as unknown.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }
}

/// Sends requests to the Vehicle service.
///
/// Implementations report every HTTP answer as `Ok`, whatever its status;
/// `Err` is reserved for calls that produced no answer.
#[async_trait]
pub trait VehicleTransport: Send + Sync {
    /// `POST /api/v1/vehicles/batch` with the given keys.
    async fn fetch_batch(&self, keys: &[RegistrationNumber]) -> Result<TransportResponse>;

    /// `GET /api/v1/vehicles/{key}`.
    async fn fetch_single(&self, key: &RegistrationNumber) -> Result<TransportResponse>;
}
