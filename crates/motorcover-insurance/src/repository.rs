//! Source of insurance records.

use crate::error::Result;
use async_trait::async_trait;
use motorcover_core::{InsuranceRecord, PersonalIdentityNumber};
use motorcover_db::insurances;
use sqlx::SqlitePool;

/// Loads the insurances held by one customer.
#[async_trait]
pub trait InsuranceRepository: Send + Sync {
    /// All insurances for `pin`, without vehicle details.
    async fn get_insurances_by_pin(
        &self,
        pin: &PersonalIdentityNumber,
    ) -> Result<Vec<InsuranceRecord>>;
}

/// Repository backed by the `insurances` table.
#[derive(Debug, Clone)]
pub struct SqliteInsuranceRepository {
    pool: SqlitePool,
}

impl SqliteInsuranceRepository {
    /// Create a repository over an open pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InsuranceRepository for SqliteInsuranceRepository {
    async fn get_insurances_by_pin(
        &self,
        pin: &PersonalIdentityNumber,
    ) -> Result<Vec<InsuranceRecord>> {
        Ok(insurances::get_insurances_by_pin(&self.pool, pin.as_str()).await?)
    }
}
