//! Insurance policy storage.

use crate::error::{DatabaseError, Result};
use motorcover_core::{InsuranceRecord, ProductType, RegistrationNumber};
use sqlx::SqlitePool;

type InsuranceRow = (i64, String, i64, f64, Option<String>);

fn from_row(row: InsuranceRow) -> Result<InsuranceRecord> {
    let (insurance_id, personal_identity_number, product, monthly_cost, car_registration_number) =
        row;
    let product = ProductType::from_code(product).map_err(|e| {
        DatabaseError::Decode(format!("insurance {insurance_id} has invalid product: {e}"))
    })?;

    Ok(InsuranceRecord {
        insurance_id,
        personal_identity_number,
        product,
        monthly_cost,
        car_registration_number: car_registration_number.map(RegistrationNumber::new),
        vehicle_details: None,
    })
}

/// All insurances held by the customer with the given personal identity number.
///
/// Vehicle details are never stored; every record comes back unenriched.
pub async fn get_insurances_by_pin(
    pool: &SqlitePool,
    personal_identity_number: &str,
) -> Result<Vec<InsuranceRecord>> {
    let rows: Vec<InsuranceRow> = sqlx::query_as(
        r"
        SELECT insurance_id, personal_identity_number, product, monthly_cost, car_registration_number
        FROM insurances
        WHERE personal_identity_number = ?
        ORDER BY insurance_id
        ",
    )
    .bind(personal_identity_number)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(from_row).collect()
}

/// Insert or replace an insurance record.
pub async fn upsert_insurance(pool: &SqlitePool, record: &InsuranceRecord) -> Result<()> {
    sqlx::query(
        r"
        INSERT INTO insurances
            (insurance_id, personal_identity_number, product, monthly_cost, car_registration_number)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(insurance_id) DO UPDATE SET
            personal_identity_number = excluded.personal_identity_number,
            product = excluded.product,
            monthly_cost = excluded.monthly_cost,
            car_registration_number = excluded.car_registration_number
        ",
    )
    .bind(record.insurance_id)
    .bind(&record.personal_identity_number)
    .bind(record.product.code())
    .bind(record.monthly_cost)
    .bind(record.car_registration_number.as_ref().map(RegistrationNumber::as_str))
    .execute(pool)
    .await?;

    Ok(())
}
