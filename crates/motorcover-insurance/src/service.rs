//! Insurance lookup and vehicle enrichment.

use crate::error::Result;
use crate::repository::InsuranceRepository;
use motorcover_core::{
    FeatureToggleProvider, InsuranceRecord, PersonalIdentityNumber, RegistrationNumber,
    VehicleDetails,
};
use motorcover_vehicle::{LookupStrategy, VehicleLookupClient};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Loads insurances and enriches car insurances with vehicle details.
pub struct InsuranceService {
    repository: Arc<dyn InsuranceRepository>,
    vehicles: Arc<VehicleLookupClient>,
    toggles: Arc<dyn FeatureToggleProvider>,
}

impl InsuranceService {
    /// Wire the service to its collaborators.
    #[must_use]
    pub fn new(
        repository: Arc<dyn InsuranceRepository>,
        vehicles: Arc<VehicleLookupClient>,
        toggles: Arc<dyn FeatureToggleProvider>,
    ) -> Self {
        Self {
            repository,
            vehicles,
            toggles,
        }
    }

    /// All insurances for `pin`, enriched when the toggles allow it.
    ///
    /// # Errors
    /// Returns `InsuranceError::Repository` if the insurances cannot be loaded.
    pub async fn get_insurances_for_pin(
        &self,
        pin: &PersonalIdentityNumber,
    ) -> Result<Vec<InsuranceRecord>> {
        let records = self.repository.get_insurances_by_pin(pin).await?;
        if records.is_empty() {
            tracing::debug!("No insurances found");
            return Ok(records);
        }

        Ok(self.enrich(records).await)
    }

    /// Attach vehicle details to every car insurance that can be resolved.
    ///
    /// Records that are not car insurances, or whose vehicle could not be
    /// found, come back unchanged.
    pub async fn enrich(&self, mut records: Vec<InsuranceRecord>) -> Vec<InsuranceRecord> {
        let toggles = self.toggles.current();
        if !toggles.enable_vehicle_enrichment {
            tracing::debug!("Vehicle enrichment disabled");
            return records;
        }

        let keys = distinct_vehicle_keys(&records);
        if keys.is_empty() {
            return records;
        }

        let strategy = if toggles.enable_batch_vehicle_call {
            LookupStrategy::Batch
        } else {
            LookupStrategy::Concurrent
        };
        tracing::debug!(
            "Enriching insurances with {} distinct vehicles ({:?})",
            keys.len(),
            strategy
        );

        let vehicles: HashMap<RegistrationNumber, VehicleDetails> = self
            .vehicles
            .lookup(&keys, strategy)
            .await
            .into_iter()
            .map(|vehicle| (vehicle.registration_number.clone(), vehicle))
            .collect();

        for record in &mut records {
            let Some(key) = record.vehicle_key() else {
                continue;
            };
            if let Some(details) = vehicles.get(key) {
                record.vehicle_details = Some(details.clone());
            }
        }

        records
    }
}

fn distinct_vehicle_keys(records: &[InsuranceRecord]) -> Vec<RegistrationNumber> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter_map(InsuranceRecord::vehicle_key)
        .filter(|key| seen.insert(*key))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InsuranceError;
    use async_trait::async_trait;
    use motorcover_core::{FeatureToggles, ProductType, StaticToggles, VehicleClientConfig};
    use motorcover_db::DatabaseError;
    use motorcover_resilience::{CircuitBreaker, PolicyStack, RetryPolicy};
    use motorcover_vehicle::{TransportResponse, VehicleTransport};
    use std::sync::Mutex;
    use std::time::Duration;

    const PIN: &str = "199001011234";

    // Vehicle service that knows only CAR1 and records every key it is asked for
    #[derive(Default)]
    struct RecordingTransport {
        batch_calls: Mutex<Vec<Vec<String>>>,
        single_calls: Mutex<Vec<String>>,
    }

    impl RecordingTransport {
        fn total_calls(&self) -> usize {
            self.batch_calls.lock().expect("lock").len()
                + self.single_calls.lock().expect("lock").len()
        }
    }

    #[async_trait]
    impl VehicleTransport for RecordingTransport {
        async fn fetch_batch(
            &self,
            keys: &[RegistrationNumber],
        ) -> motorcover_vehicle::Result<TransportResponse> {
            self.batch_calls
                .lock()
                .expect("lock")
                .push(keys.iter().map(ToString::to_string).collect());

            if keys.iter().any(|key| key.as_str() == "CAR1") {
                Ok(TransportResponse::new(
                    200,
                    r#"[{"key":"CAR1","make":"Volvo"}]"#,
                ))
            } else {
                Ok(TransportResponse::new(404, ""))
            }
        }

        async fn fetch_single(
            &self,
            key: &RegistrationNumber,
        ) -> motorcover_vehicle::Result<TransportResponse> {
            self.single_calls.lock().expect("lock").push(key.to_string());

            if key.as_str() == "CAR1" {
                Ok(TransportResponse::new(
                    200,
                    r#"{"registrationNumber":"CAR1","make":"Volvo"}"#,
                ))
            } else {
                Ok(TransportResponse::new(404, ""))
            }
        }
    }

    struct FixedRepository(Vec<InsuranceRecord>);

    #[async_trait]
    impl InsuranceRepository for FixedRepository {
        async fn get_insurances_by_pin(
            &self,
            _pin: &PersonalIdentityNumber,
        ) -> Result<Vec<InsuranceRecord>> {
            Ok(self.0.clone())
        }
    }

    struct BrokenRepository;

    #[async_trait]
    impl InsuranceRepository for BrokenRepository {
        async fn get_insurances_by_pin(
            &self,
            _pin: &PersonalIdentityNumber,
        ) -> Result<Vec<InsuranceRecord>> {
            Err(DatabaseError::Decode("bad row".to_string()).into())
        }
    }

    fn car(id: i64, reg: &str) -> InsuranceRecord {
        InsuranceRecord {
            insurance_id: id,
            personal_identity_number: PIN.to_string(),
            product: ProductType::Car,
            monthly_cost: 30.0,
            car_registration_number: Some(RegistrationNumber::new(reg)),
            vehicle_details: None,
        }
    }

    fn pet(id: i64) -> InsuranceRecord {
        InsuranceRecord {
            insurance_id: id,
            personal_identity_number: PIN.to_string(),
            product: ProductType::Pet,
            monthly_cost: 10.0,
            car_registration_number: None,
            vehicle_details: None,
        }
    }

    fn service(
        repository: Arc<dyn InsuranceRepository>,
        transport: &Arc<RecordingTransport>,
        toggles: FeatureToggles,
    ) -> InsuranceService {
        let config = VehicleClientConfig {
            base_url: "http://vehicle.local".to_string(),
            api_key: "key".to_string(),
            max_batch_size: 2,
            ..VehicleClientConfig::default()
        };
        let breaker = Arc::new(CircuitBreaker::new(
            "vehicle-service",
            5,
            Duration::from_secs(30),
        ));
        let client = VehicleLookupClient::new(
            Arc::clone(transport) as Arc<dyn VehicleTransport>,
            PolicyStack::new(RetryPolicy::default(), breaker),
            &config,
        );
        InsuranceService::new(
            repository,
            Arc::new(client),
            Arc::new(StaticToggles::new(toggles)),
        )
    }

    fn toggles(enrichment: bool, batch: bool) -> FeatureToggles {
        FeatureToggles {
            enable_vehicle_enrichment: enrichment,
            enable_batch_vehicle_call: batch,
        }
    }

    fn make_of(record: &InsuranceRecord) -> Option<&str> {
        record.vehicle_details.as_ref()?.make.as_deref()
    }

    #[tokio::test]
    async fn test_enrichment_off_makes_no_calls() {
        for batch in [true, false] {
            let transport = Arc::new(RecordingTransport::default());
            let service = service(
                Arc::new(FixedRepository(vec![])),
                &transport,
                toggles(false, batch),
            );

            let records = service.enrich(vec![car(1, "CAR1"), pet(2)]).await;

            assert_eq!(transport.total_calls(), 0);
            assert!(records.iter().all(|r| r.vehicle_details.is_none()));
        }
    }

    #[tokio::test]
    async fn test_batch_end_to_end() {
        let transport = Arc::new(RecordingTransport::default());
        let service = service(
            Arc::new(FixedRepository(vec![])),
            &transport,
            toggles(true, true),
        );

        let records = service
            .enrich(vec![car(1, "CAR1"), car(2, "CAR2"), car(3, "CAR1"), pet(4)])
            .await;

        let batches = transport.batch_calls.lock().expect("lock").clone();
        assert_eq!(batches.len(), 1);
        let mut sent = batches[0].clone();
        sent.sort();
        assert_eq!(sent, vec!["CAR1", "CAR2"]);

        assert_eq!(make_of(&records[0]), Some("Volvo"));
        assert_eq!(make_of(&records[1]), None);
        assert_eq!(make_of(&records[2]), Some("Volvo"));
        assert!(records[3].vehicle_details.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_sends_distinct_keys() {
        let transport = Arc::new(RecordingTransport::default());
        let service = service(
            Arc::new(FixedRepository(vec![])),
            &transport,
            toggles(true, false),
        );

        let records = service
            .enrich(vec![car(1, "CAR1"), car(2, "CAR1"), car(3, "CAR2")])
            .await;

        let mut sent = transport.single_calls.lock().expect("lock").clone();
        sent.sort();
        assert_eq!(sent, vec!["CAR1", "CAR2"]);
        assert!(transport.batch_calls.lock().expect("lock").is_empty());
        assert_eq!(make_of(&records[1]), Some("Volvo"));
        assert_eq!(make_of(&records[2]), None);
    }

    #[tokio::test]
    async fn test_no_car_keys_skips_lookup() {
        let transport = Arc::new(RecordingTransport::default());
        let service = service(
            Arc::new(FixedRepository(vec![])),
            &transport,
            toggles(true, true),
        );

        let records = service.enrich(vec![pet(1), car(2, "  ")]).await;

        assert_eq!(records.len(), 2);
        assert_eq!(transport.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_get_insurances_for_pin() {
        let transport = Arc::new(RecordingTransport::default());
        let service = service(
            Arc::new(FixedRepository(vec![car(1, "CAR1"), pet(2)])),
            &transport,
            toggles(true, true),
        );
        let pin = PersonalIdentityNumber::new(PIN).expect("valid pin");

        let records = service.get_insurances_for_pin(&pin).await.expect("load");

        assert_eq!(records.len(), 2);
        assert_eq!(make_of(&records[0]), Some("Volvo"));
    }

    #[tokio::test]
    async fn test_no_insurances_skips_lookup() {
        let transport = Arc::new(RecordingTransport::default());
        let service = service(
            Arc::new(FixedRepository(vec![])),
            &transport,
            toggles(true, true),
        );
        let pin = PersonalIdentityNumber::new(PIN).expect("valid pin");

        let records = service.get_insurances_for_pin(&pin).await.expect("load");

        assert!(records.is_empty());
        assert_eq!(transport.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_repository_error_propagates() {
        let transport = Arc::new(RecordingTransport::default());
        let service = service(Arc::new(BrokenRepository), &transport, toggles(true, true));
        let pin = PersonalIdentityNumber::new(PIN).expect("valid pin");

        let result = service.get_insurances_for_pin(&pin).await;

        assert!(matches!(result, Err(InsuranceError::Repository(_))));
    }
}
