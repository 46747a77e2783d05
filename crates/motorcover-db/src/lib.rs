//! MotorCover Database Layer
//!
//! `SQLite` storage behind the Insurance service (policies per customer) and
//! the Vehicle service (the vehicle register). Uses `SQLx` with embedded
//! migrations.
//!
//! # Example
//!
//! ```ignore
//! use motorcover_db::{insurances, Database};
//!
//! let db = Database::connect("sqlite://motorcover.db?mode=rwc", 5).await?;
//! db.run_migrations().await?;
//! let records = insurances::get_insurances_by_pin(db.pool(), "199001011234").await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
pub mod insurances;
pub mod migrations;
pub mod vehicles;

// Re-export commonly used types
pub use error::{DatabaseError, Result};

use motorcover_core::DatabaseConfig;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;

/// Connection pool plus migrations.
#[derive(Debug, Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open a pool for `url`, creating the database file if missing.
    ///
    /// In-memory databases are per connection, so use `max_connections = 1`
    /// with `sqlite::memory:`.
    ///
    /// # Errors
    /// Returns `DatabaseError::Open` if the URL is invalid or the database cannot be opened.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let connect_options = SqliteConnectOptions::from_str(url)
            .map_err(|e| DatabaseError::Open(format!("invalid connection string: {e}")))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(connect_options)
            .await
            .map_err(|e| DatabaseError::Open(format!("failed to open {url}: {e}")))?;

        tracing::info!("Database pool created at {}", url);

        Ok(Self { pool })
    }

    /// Open the pool described by the `[database]` config section.
    pub async fn from_config(config: &DatabaseConfig) -> Result<Self> {
        Self::connect(&config.url, config.max_connections).await
    }

    /// Wrap an existing pool.
    #[must_use]
    pub fn from_pool(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Run all pending database migrations.
    ///
    /// # Errors
    /// Returns `DatabaseError::Migration` if any migration fails.
    pub async fn run_migrations(&self) -> Result<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// Get the current schema version.
    pub async fn get_schema_version(&self) -> Result<i64> {
        migrations::get_schema_version(&self.pool).await
    }

    /// Get a reference to the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Close the pool gracefully.
    pub async fn close(self) {
        self.pool.close().await;
    }
}
