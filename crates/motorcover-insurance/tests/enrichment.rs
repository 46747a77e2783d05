//! End-to-end enrichment against an in-memory database.
//!
//! The Vehicle service is simulated by a transport that answers from the
//! `vehicles` table, the same way the real service does.

use async_trait::async_trait;
use motorcover_core::{
    FeatureToggles, InsuranceRecord, PersonalIdentityNumber, ProductType, RegistrationNumber,
    ReloadableToggles, VehicleClientConfig, VehicleDetails,
};
use motorcover_db::{insurances, vehicles, Database};
use motorcover_insurance::{InsuranceService, SqliteInsuranceRepository};
use motorcover_resilience::{CircuitBreaker, PolicyStack, RetryPolicy};
use motorcover_vehicle::{TransportResponse, VehicleLookupClient, VehicleTransport};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;

const PIN: &str = "198502023456";

struct DatabaseVehicleService {
    pool: SqlitePool,
}

#[async_trait]
impl VehicleTransport for DatabaseVehicleService {
    async fn fetch_batch(
        &self,
        keys: &[RegistrationNumber],
    ) -> motorcover_vehicle::Result<TransportResponse> {
        let found = vehicles::get_vehicles(&self.pool, keys)
            .await
            .expect("query vehicles");
        if found.is_empty() {
            return Ok(TransportResponse::new(404, ""));
        }
        let body = serde_json::to_string(&found).expect("serialize vehicles");
        Ok(TransportResponse::new(200, body))
    }

    async fn fetch_single(
        &self,
        key: &RegistrationNumber,
    ) -> motorcover_vehicle::Result<TransportResponse> {
        match vehicles::get_vehicle(&self.pool, key)
            .await
            .expect("query vehicle")
        {
            Some(vehicle) => {
                let body = serde_json::to_string(&vehicle).expect("serialize vehicle");
                Ok(TransportResponse::new(200, body))
            }
            None => Ok(TransportResponse::new(404, "")),
        }
    }
}

fn insurance(id: i64, product: ProductType, reg: Option<&str>) -> InsuranceRecord {
    InsuranceRecord {
        insurance_id: id,
        personal_identity_number: PIN.to_string(),
        product,
        monthly_cost: 25.0,
        car_registration_number: reg.map(RegistrationNumber::new),
        vehicle_details: None,
    }
}

async fn seeded_db() -> Database {
    let db = Database::connect("sqlite::memory:", 1)
        .await
        .expect("create database");
    db.run_migrations().await.expect("run migrations");

    for record in [
        insurance(1, ProductType::Car, Some("ABC123")),
        insurance(2, ProductType::Pet, None),
        insurance(3, ProductType::Car, Some("GHOST1")),
        insurance(4, ProductType::PersonalHealth, None),
    ] {
        insurances::upsert_insurance(db.pool(), &record)
            .await
            .expect("insert insurance");
    }

    vehicles::upsert_vehicle(
        db.pool(),
        &VehicleDetails::new("ABC123")
            .with_make("Volvo")
            .with_model("XC60")
            .with_model_year(2019),
    )
    .await
    .expect("insert vehicle");

    db
}

fn build_service(db: &Database, toggles: Arc<ReloadableToggles>) -> InsuranceService {
    let config = VehicleClientConfig {
        base_url: "http://vehicle.local".to_string(),
        api_key: "key".to_string(),
        ..VehicleClientConfig::default()
    };
    let transport = DatabaseVehicleService {
        pool: db.pool().clone(),
    };
    let breaker = Arc::new(CircuitBreaker::new(
        "vehicle-service",
        5,
        Duration::from_secs(30),
    ));
    let client = VehicleLookupClient::new(
        Arc::new(transport),
        PolicyStack::new(RetryPolicy::default(), breaker),
        &config,
    );

    InsuranceService::new(
        Arc::new(SqliteInsuranceRepository::new(db.pool().clone())),
        Arc::new(client),
        toggles,
    )
}

#[tokio::test]
async fn enriches_from_database_in_both_modes() {
    let db = seeded_db().await;
    let toggles = Arc::new(ReloadableToggles::new(FeatureToggles {
        enable_vehicle_enrichment: true,
        enable_batch_vehicle_call: true,
    }));
    let service = build_service(&db, Arc::clone(&toggles));
    let pin = PersonalIdentityNumber::new(PIN).expect("valid pin");

    for batch in [true, false] {
        toggles.replace(FeatureToggles {
            enable_vehicle_enrichment: true,
            enable_batch_vehicle_call: batch,
        });

        let records = service.get_insurances_for_pin(&pin).await.expect("load");
        assert_eq!(records.len(), 4);

        let details = records[0]
            .vehicle_details
            .as_ref()
            .expect("ABC123 should be enriched");
        assert_eq!(details.make.as_deref(), Some("Volvo"));
        assert_eq!(details.model_year, Some(2019));

        assert!(records[1].vehicle_details.is_none());
        assert!(records[2].vehicle_details.is_none(), "GHOST1 is unknown");
        assert!(records[3].vehicle_details.is_none());
    }
}

#[tokio::test]
async fn toggle_change_applies_to_next_call() {
    let db = seeded_db().await;
    let toggles = Arc::new(ReloadableToggles::default());
    let service = build_service(&db, Arc::clone(&toggles));
    let pin = PersonalIdentityNumber::new(PIN).expect("valid pin");

    let records = service.get_insurances_for_pin(&pin).await.expect("load");
    assert!(records.iter().all(|r| r.vehicle_details.is_none()));

    toggles
        .reload_from_str("[feature_toggles]\nenable_vehicle_enrichment = true\n")
        .expect("reload toggles");

    let records = service.get_insurances_for_pin(&pin).await.expect("load");
    assert!(records[0].vehicle_details.is_some());
}

#[tokio::test]
async fn unknown_customer_has_no_insurances() {
    let db = seeded_db().await;
    let toggles = Arc::new(ReloadableToggles::default());
    let service = build_service(&db, toggles);
    let pin = PersonalIdentityNumber::new("200012310000").expect("valid pin");

    let records = service.get_insurances_for_pin(&pin).await.expect("load");
    assert!(records.is_empty());
}
