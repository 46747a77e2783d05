//! Wiring of the services behind each command.

use anyhow::{Context, Result};
use motorcover_core::validation::sanitize_registration_numbers;
use motorcover_core::{
    AppConfig, FeatureToggleProvider, InsuranceRecord, PersonalIdentityNumber, ReloadableToggles,
    VehicleDetails,
};
use motorcover_db::Database;
use motorcover_insurance::{InsuranceService, SqliteInsuranceRepository};
use motorcover_resilience::CircuitBreaker;
use motorcover_vehicle::{LookupStrategy, VehicleLookupClient};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Breaker and log name of the Vehicle service dependency.
pub const VEHICLE_SERVICE: &str = "vehicle-service";

pub struct App {
    db: Database,
    toggles: Arc<ReloadableToggles>,
    vehicles: Arc<VehicleLookupClient>,
    insurances: InsuranceService,
}

impl App {
    /// Open the database and build the clients from a validated config.
    pub async fn build(config: &AppConfig) -> Result<Self> {
        let db = Database::from_config(&config.database)
            .await
            .context("failed to open database")?;
        db.run_migrations()
            .await
            .context("failed to run database migrations")?;

        let toggles = Arc::new(ReloadableToggles::new(config.feature_toggles));
        let breaker = Arc::new(CircuitBreaker::from_config(
            VEHICLE_SERVICE,
            &config.resilience,
        ));
        let vehicles = Arc::new(
            VehicleLookupClient::from_config(config, breaker)
                .context("failed to create vehicle client")?,
        );

        let insurances = InsuranceService::new(
            Arc::new(SqliteInsuranceRepository::new(db.pool().clone())),
            Arc::clone(&vehicles),
            Arc::clone(&toggles) as Arc<dyn FeatureToggleProvider>,
        );

        Ok(Self {
            db,
            toggles,
            vehicles,
            insurances,
        })
    }

    pub fn toggles(&self) -> &Arc<ReloadableToggles> {
        &self.toggles
    }

    /// A customer's insurances, enriched per the current toggles.
    pub async fn insurances(&self, pin: &str) -> Result<Vec<InsuranceRecord>> {
        let pin = PersonalIdentityNumber::new(pin).context("invalid personal identity number")?;
        Ok(self.insurances.get_insurances_for_pin(&pin).await?)
    }

    /// Vehicles for the valid, distinct keys among `keys`.
    pub async fn vehicles(&self, keys: Vec<String>, concurrent: bool) -> Vec<VehicleDetails> {
        let keys = sanitize_registration_numbers(keys);
        let strategy = if concurrent {
            LookupStrategy::Concurrent
        } else {
            LookupStrategy::Batch
        };
        self.vehicles.lookup(&keys, strategy).await
    }

    /// Repeat the insurance lookup every `every` until `shutdown` completes.
    ///
    /// `shutdown` is raced against each lookup as well as the wait between
    /// them. Failed lookups are logged and the loop carries on.
    pub async fn watch<S, E>(
        &self,
        pin: &str,
        every: Duration,
        shutdown: S,
        mut emit: E,
    ) -> Result<()>
    where
        S: Future,
        E: FnMut(&[InsuranceRecord]) -> Result<()>,
    {
        let mut ticker = tokio::time::interval(every);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tokio::select! {
                        result = self.insurances(pin) => match result {
                            Ok(records) => emit(&records)?,
                            Err(e) => tracing::error!("Insurance lookup failed: {:#}", e),
                        },
                        _ = &mut shutdown => break,
                    }
                }
                _ = &mut shutdown => break,
            }
        }

        tracing::info!("Shutting down");
        Ok(())
    }

    pub async fn close(self) {
        self.db.close().await;
    }
}

/// The effective config as TOML, with the API key masked.
pub fn render_config(config: &AppConfig) -> Result<String> {
    let mut shown = config.clone();
    if !shown.vehicle_client.api_key.is_empty() {
        shown.vehicle_client.api_key = "<redacted>".to_string();
    }
    toml::to_string_pretty(&shown).context("failed to render config")
}
