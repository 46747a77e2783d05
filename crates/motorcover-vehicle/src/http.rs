//! `reqwest` transport for the Vehicle service REST API.

use crate::error::{LookupError, Result};
use crate::transport::{TransportResponse, VehicleTransport};
use async_trait::async_trait;
use motorcover_core::{RegistrationNumber, VehicleClientConfig};
use reqwest::{Client, Url};
use std::time::Duration;

/// Header carrying the Vehicle service API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Build an HTTP client with the per-request timeout.
pub fn build_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| LookupError::Internal(format!("failed to create HTTP client: {e}")))
}

/// HTTP transport talking to `{base_url}/api/v1/vehicles`.
pub struct HttpVehicleTransport {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl HttpVehicleTransport {
    /// Create a transport from the `[vehicle_client]` config section.
    ///
    /// # Errors
    /// Returns error if the base URL is not a usable base or the HTTP client
    /// cannot be created.
    pub fn new(config: &VehicleClientConfig) -> Result<Self> {
        let base_url = Url::parse(config.base_url.trim()).map_err(|e| {
            LookupError::Internal(format!("invalid base URL '{}': {e}", config.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(LookupError::Internal(format!(
                "base URL '{}' cannot carry a path",
                config.base_url
            )));
        }

        Ok(Self {
            client: build_http_client(config.request_timeout())?,
            base_url,
            api_key: config.api_key.clone(),
        })
    }

    fn batch_url(&self) -> Result<Url> {
        self.endpoint(&["batch"])
    }

    /// The key is pushed as one percent-encoded path segment.
    fn single_url(&self, key: &RegistrationNumber) -> Result<Url> {
        self.endpoint(&[key.as_str()])
    }

    fn endpoint(&self, tail: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| LookupError::Internal("base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(["api", "v1", "vehicles"])
            .extend(tail);
        Ok(url)
    }

    async fn read_response(response: reqwest::Response) -> Result<TransportResponse> {
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(TransportResponse { status, body })
    }
}

impl std::fmt::Debug for HttpVehicleTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpVehicleTransport")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl VehicleTransport for HttpVehicleTransport {
    async fn fetch_batch(&self, keys: &[RegistrationNumber]) -> Result<TransportResponse> {
        let response = self
            .client
            .post(self.batch_url()?)
            .header(API_KEY_HEADER, &self.api_key)
            .json(keys)
            .send()
            .await?;

        Self::read_response(response).await
    }

    async fn fetch_single(&self, key: &RegistrationNumber) -> Result<TransportResponse> {
        let response = self
            .client
            .get(self.single_url(key)?)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        Self::read_response(response).await
    }
}
