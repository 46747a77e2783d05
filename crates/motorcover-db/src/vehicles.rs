//! Vehicle register storage.

use crate::error::Result;
use motorcover_core::{RegistrationNumber, VehicleDetails};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

type VehicleRow = (String, Option<String>, Option<String>, Option<i32>);

fn from_row((registration_number, make, model, model_year): VehicleRow) -> VehicleDetails {
    VehicleDetails {
        registration_number: RegistrationNumber::new(registration_number),
        make,
        model,
        model_year,
    }
}

/// Look up one vehicle.
pub async fn get_vehicle(
    pool: &SqlitePool,
    registration_number: &RegistrationNumber,
) -> Result<Option<VehicleDetails>> {
    let row: Option<VehicleRow> = sqlx::query_as(
        r"
        SELECT registration_number, make, model, model_year
        FROM vehicles
        WHERE registration_number = ?
        ",
    )
    .bind(registration_number.as_str())
    .fetch_optional(pool)
    .await?;

    Ok(row.map(from_row))
}

/// Look up every vehicle whose registration number is in `registration_numbers`.
///
/// Unknown keys are skipped; an empty input returns an empty list without
/// touching the database.
pub async fn get_vehicles(
    pool: &SqlitePool,
    registration_numbers: &[RegistrationNumber],
) -> Result<Vec<VehicleDetails>> {
    if registration_numbers.is_empty() {
        return Ok(Vec::new());
    }

    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT registration_number, make, model, model_year FROM vehicles WHERE registration_number IN (",
    );
    let mut separated = query.separated(", ");
    for registration_number in registration_numbers {
        separated.push_bind(registration_number.as_str());
    }
    separated.push_unseparated(") ORDER BY registration_number");

    let rows: Vec<VehicleRow> = query.build_query_as().fetch_all(pool).await?;
    Ok(rows.into_iter().map(from_row).collect())
}

/// Insert or replace a vehicle.
pub async fn upsert_vehicle(pool: &SqlitePool, vehicle: &VehicleDetails) -> Result<()> {
    sqlx::query(
        r"
        INSERT INTO vehicles (registration_number, make, model, model_year)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(registration_number) DO UPDATE SET
            make = excluded.make,
            model = excluded.model,
            model_year = excluded.model_year
        ",
    )
    .bind(vehicle.registration_number.as_str())
    .bind(vehicle.make.as_deref())
    .bind(vehicle.model.as_deref())
    .bind(vehicle.model_year)
    .execute(pool)
    .await?;

    Ok(())
}
