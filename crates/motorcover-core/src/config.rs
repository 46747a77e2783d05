//! Configuration management for MotorCover.
//!
//! Provides TOML-based configuration with XDG-compliant paths, environment
//! variable overrides and fail-fast validation. A process must call
//! [`AppConfig::validate`] (or use [`AppConfig::load_validated`]) before
//! wiring any outbound client.

use crate::error::{ConfigError, ConfigResult};
use crate::toggles::FeatureToggles;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration.
///
/// This is loaded from `~/.config/motorcover/config.toml` (or platform
/// equivalent) unless an explicit path is given.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Outbound Vehicle service client settings
    pub vehicle_client: VehicleClientConfig,
    /// Retry and circuit-breaker policy settings
    pub resilience: ResilienceConfig,
    /// Database settings
    pub database: DatabaseConfig,
    /// Feature toggles (hot-reloadable at runtime)
    pub feature_toggles: FeatureToggles,
}

impl AppConfig {
    /// Parse configuration from a TOML string.
    pub fn from_toml_str(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load configuration from the default path, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit path.
    ///
    /// Unlike [`AppConfig::load`], a missing file is an error.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            });
        }

        tracing::debug!("Loading config from {}", path.display());
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Load, apply environment overrides, and validate.
    ///
    /// This is the startup entry point: a misconfigured process must not start.
    pub fn load_validated(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => Self::load()?,
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment.
    ///
    /// Supports the following environment variables:
    /// - `MOTORCOVER_VEHICLE_BASE_URL`
    /// - `MOTORCOVER_VEHICLE_API_KEY`
    /// - `MOTORCOVER_DATABASE_URL`
    /// - `MOTORCOVER_ENABLE_VEHICLE_ENRICHMENT` (true/false)
    /// - `MOTORCOVER_ENABLE_BATCH_VEHICLE_CALL` (true/false)
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_with(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup function.
    pub fn apply_overrides_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("MOTORCOVER_VEHICLE_BASE_URL") {
            tracing::debug!("Override vehicle_client.base_url from env: {}", url);
            self.vehicle_client.base_url = url;
        }

        if let Some(key) = lookup("MOTORCOVER_VEHICLE_API_KEY") {
            tracing::debug!("Override vehicle_client.api_key from env");
            self.vehicle_client.api_key = key;
        }

        if let Some(url) = lookup("MOTORCOVER_DATABASE_URL") {
            tracing::debug!("Override database.url from env: {}", url);
            self.database.url = url;
        }

        if let Some(val) = lookup("MOTORCOVER_ENABLE_VEHICLE_ENRICHMENT") {
            if let Ok(enabled) = val.parse() {
                self.feature_toggles.enable_vehicle_enrichment = enabled;
                tracing::debug!("Override enable_vehicle_enrichment from env: {}", enabled);
            }
        }

        if let Some(val) = lookup("MOTORCOVER_ENABLE_BATCH_VEHICLE_CALL") {
            if let Ok(enabled) = val.parse() {
                self.feature_toggles.enable_batch_vehicle_call = enabled;
                tracing::debug!("Override enable_batch_vehicle_call from env: {}", enabled);
            }
        }
    }

    /// Validate that every required setting is present and sane.
    ///
    /// # Errors
    /// Returns the first problem found.
    pub fn validate(&self) -> ConfigResult<()> {
        self.vehicle_client.validate()?;
        self.resilience.validate()?;

        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "database.url".to_string(),
            });
        }

        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/motorcover/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "motorcover", "motorcover")
            .ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Outbound Vehicle service client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleClientConfig {
    /// Base URL of the Vehicle service, e.g. `http://vehicle:8080`
    pub base_url: String,
    /// API key sent as `x-api-key`
    pub api_key: String,
    /// Maximum number of keys per batch call
    pub max_batch_size: usize,
    /// Maximum batch calls in flight per lookup
    pub max_parallelism_batch: usize,
    /// Maximum single-key calls in flight per lookup
    pub max_parallelism_single: usize,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl VehicleClientConfig {
    /// Per-request timeout as a `Duration`.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn validate(&self) -> ConfigResult<()> {
        let base_url = self.base_url.trim();
        if base_url.is_empty() {
            return Err(ConfigError::Missing {
                field: "vehicle_client.base_url".to_string(),
            });
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "vehicle_client.base_url".to_string(),
                reason: format!("expected an http(s) URL, got '{base_url}'"),
            });
        }
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "vehicle_client.api_key".to_string(),
            });
        }

        require_positive("vehicle_client.max_batch_size", self.max_batch_size)?;
        require_positive(
            "vehicle_client.max_parallelism_batch",
            self.max_parallelism_batch,
        )?;
        require_positive(
            "vehicle_client.max_parallelism_single",
            self.max_parallelism_single,
        )?;
        require_positive(
            "vehicle_client.request_timeout_secs",
            usize::try_from(self.request_timeout_secs).unwrap_or(usize::MAX),
        )
    }
}

impl Default for VehicleClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            max_batch_size: 100,
            max_parallelism_batch: 2,
            max_parallelism_single: 5,
            request_timeout_secs: 10,
        }
    }
}

/// Retry and circuit-breaker policy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResilienceConfig {
    /// Retries beyond the first attempt
    pub retry_count: u32,
    /// Backoff base: the n-th retry waits `base^n` seconds
    pub retry_backoff_base: f64,
    /// HTTP statuses treated as transient
    pub retryable_statuses: Vec<u16>,
    /// Consecutive handled failures before the circuit opens
    pub circuit_breaker_threshold: u32,
    /// How long the circuit stays open, in seconds
    pub circuit_breaker_break_secs: u64,
}

impl ResilienceConfig {
    /// Circuit-breaker cool-down as a `Duration`.
    #[must_use]
    pub fn break_duration(&self) -> Duration {
        Duration::from_secs(self.circuit_breaker_break_secs)
    }

    fn validate(&self) -> ConfigResult<()> {
        if !self.retry_backoff_base.is_finite() || self.retry_backoff_base < 1.0 {
            return Err(ConfigError::InvalidValue {
                field: "resilience.retry_backoff_base".to_string(),
                reason: format!("must be >= 1.0, got {}", self.retry_backoff_base),
            });
        }
        require_positive(
            "resilience.circuit_breaker_threshold",
            self.circuit_breaker_threshold as usize,
        )?;
        require_positive(
            "resilience.circuit_breaker_break_secs",
            usize::try_from(self.circuit_breaker_break_secs).unwrap_or(usize::MAX),
        )
    }
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            retry_count: 3,
            retry_backoff_base: 2.0,
            retryable_statuses: vec![408, 500, 502, 503, 504],
            circuit_breaker_threshold: 5,
            circuit_breaker_break_secs: 30,
        }
    }
}

/// Database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL
    pub url: String,
    /// Maximum pooled connections
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://motorcover.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

fn require_positive(field: &str, value: usize) -> ConfigResult<()> {
    if value == 0 {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(())
}
