//! Vehicle lookup client.
//!
//! Keys are resolved through one of two strategies:
//! - **Batch**: keys are split into chunks of `max_batch_size`, one request
//!   per chunk, at most `max_parallelism_batch` chunks in flight.
//! - **Concurrent**: one request per key, at most `max_parallelism_single`
//!   in flight.
//!
//! Each request runs through the [`PolicyStack`]. Whatever still fails is
//! logged and contributes nothing; the caller always gets a `Vec`.

use crate::error::{LookupError, Result};
use crate::http::HttpVehicleTransport;
use crate::transport::{TransportResponse, VehicleTransport};
use futures::stream::{FuturesUnordered, StreamExt};
use motorcover_core::{AppConfig, RegistrationNumber, VehicleClientConfig, VehicleDetails};
use motorcover_resilience::{CircuitBreaker, PolicyStack};
use std::collections::HashSet;
use std::sync::Arc;

/// How a set of keys is sent to the Vehicle service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupStrategy {
    /// Chunked calls to the batch endpoint.
    Batch,
    /// One call per key.
    Concurrent,
}

/// Resolves registration numbers to vehicle details.
pub struct VehicleLookupClient {
    transport: Arc<dyn VehicleTransport>,
    stack: PolicyStack,
    max_batch_size: usize,
    max_parallelism_batch: usize,
    max_parallelism_single: usize,
}

impl VehicleLookupClient {
    /// Create a client over any transport.
    #[must_use]
    pub fn new(
        transport: Arc<dyn VehicleTransport>,
        stack: PolicyStack,
        config: &VehicleClientConfig,
    ) -> Self {
        Self {
            transport,
            stack,
            max_batch_size: config.max_batch_size.max(1),
            max_parallelism_batch: config.max_parallelism_batch.max(1),
            max_parallelism_single: config.max_parallelism_single.max(1),
        }
    }

    /// Create an HTTP client from config around a shared breaker.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn from_config(config: &AppConfig, breaker: Arc<CircuitBreaker>) -> Result<Self> {
        let transport = HttpVehicleTransport::new(&config.vehicle_client)?;
        let stack = PolicyStack::from_config(&config.resilience, breaker);
        Ok(Self::new(Arc::new(transport), stack, &config.vehicle_client))
    }

    /// The policy stack wrapping every call.
    #[must_use]
    pub fn stack(&self) -> &PolicyStack {
        &self.stack
    }

    /// Resolve `keys` with the given strategy.
    pub async fn lookup(
        &self,
        keys: &[RegistrationNumber],
        strategy: LookupStrategy,
    ) -> Vec<VehicleDetails> {
        match strategy {
            LookupStrategy::Batch => self.get_vehicles_batch(keys).await,
            LookupStrategy::Concurrent => self.get_vehicles_concurrently(keys).await,
        }
    }

    /// Resolve `keys` through the batch endpoint.
    pub async fn get_vehicles_batch(&self, keys: &[RegistrationNumber]) -> Vec<VehicleDetails> {
        let keys = distinct(keys);
        if keys.is_empty() {
            return Vec::new();
        }

        let chunks: Vec<&[RegistrationNumber]> = keys.chunks(self.max_batch_size).collect();
        tracing::debug!(
            "Looking up {} vehicles in {} batches",
            keys.len(),
            chunks.len()
        );

        let mut futures = FuturesUnordered::new();
        let mut vehicles = Vec::new();

        for chunk in chunks {
            futures.push(self.fetch_chunk(chunk));

            while futures.len() >= self.max_parallelism_batch {
                if let Some(found) = futures.next().await {
                    vehicles.extend(found);
                }
            }
        }

        while let Some(found) = futures.next().await {
            vehicles.extend(found);
        }

        vehicles
    }

    /// Resolve `keys` with one request per key.
    pub async fn get_vehicles_concurrently(
        &self,
        keys: &[RegistrationNumber],
    ) -> Vec<VehicleDetails> {
        let keys = distinct(keys);
        if keys.is_empty() {
            return Vec::new();
        }

        tracing::debug!("Looking up {} vehicles one by one", keys.len());

        let mut futures = FuturesUnordered::new();
        let mut vehicles = Vec::new();

        for key in &keys {
            futures.push(self.fetch_one(key));

            while futures.len() >= self.max_parallelism_single {
                if let Some(found) = futures.next().await {
                    vehicles.extend(found);
                }
            }
        }

        while let Some(found) = futures.next().await {
            vehicles.extend(found);
        }

        vehicles
    }

    async fn fetch_chunk(&self, chunk: &[RegistrationNumber]) -> Vec<VehicleDetails> {
        let outcome = self
            .stack
            .execute(|| self.send_batch(chunk), TransportResponse::empty_batch)
            .await;

        if let Some(cause) = outcome.cause() {
            tracing::warn!(
                "Vehicle batch lookup failed for [{}]: {}",
                join_keys(chunk),
                cause
            );
        }

        let response = outcome.into_inner();
        if response.is_not_found() {
            tracing::debug!("No vehicles found for [{}]", join_keys(chunk));
            return Vec::new();
        }
        if !response.is_success() {
            tracing::warn!(
                "Vehicle batch lookup for [{}] returned status {}",
                join_keys(chunk),
                response.status
            );
            return Vec::new();
        }

        match serde_json::from_str::<Vec<VehicleDetails>>(&response.body) {
            Ok(vehicles) => vehicles,
            Err(e) => {
                tracing::warn!(
                    "Failed to parse vehicle batch response for [{}]: {}",
                    join_keys(chunk),
                    e
                );
                Vec::new()
            }
        }
    }

    async fn fetch_one(&self, key: &RegistrationNumber) -> Option<VehicleDetails> {
        let outcome = self
            .stack
            .execute(|| self.send_single(key), TransportResponse::empty_single)
            .await;

        if let Some(cause) = outcome.cause() {
            tracing::warn!("Vehicle lookup failed for {}: {}", key, cause);
        }

        let response = outcome.into_inner();
        if response.is_not_found() {
            tracing::debug!("Vehicle {} not found", key);
            return None;
        }
        if !response.is_success() {
            tracing::warn!(
                "Vehicle lookup for {} returned status {}",
                key,
                response.status
            );
            return None;
        }

        match serde_json::from_str::<Option<VehicleDetails>>(&response.body) {
            Ok(vehicle) => vehicle,
            Err(e) => {
                tracing::warn!("Failed to parse vehicle response for {}: {}", key, e);
                None
            }
        }
    }

    async fn send_batch(&self, chunk: &[RegistrationNumber]) -> Result<TransportResponse> {
        let response = self.transport.fetch_batch(chunk).await?;
        self.classify(response)
    }

    async fn send_single(&self, key: &RegistrationNumber) -> Result<TransportResponse> {
        let response = self.transport.fetch_single(key).await?;
        self.classify(response)
    }

    /// Turn retryable statuses into errors so the stack sees them.
    fn classify(&self, response: TransportResponse) -> Result<TransportResponse> {
        if !response.is_success() && self.stack.is_retryable_status(response.status) {
            return Err(LookupError::Status {
                status: response.status,
                transient: true,
            });
        }
        Ok(response)
    }
}

fn distinct(keys: &[RegistrationNumber]) -> Vec<RegistrationNumber> {
    let mut seen = HashSet::new();
    keys.iter()
        .filter(|key| seen.insert(*key))
        .cloned()
        .collect()
}

fn join_keys(keys: &[RegistrationNumber]) -> String {
    keys.iter()
        .map(RegistrationNumber::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
