//! MotorCover Core - Foundation crate for the MotorCover services.
//!
//! This crate provides shared types, error handling, configuration management,
//! feature toggles and boundary validators that all other MotorCover crates
//! depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with environment overrides and startup validation
//! - [`types`] - Shared newtypes and records (`RegistrationNumber`, `VehicleDetails`, `InsuranceRecord`)
//! - [`toggles`] - Hot-reloadable feature toggles
//! - [`validation`] - Boundary validators for owner keys and registration numbers
//!
//! # Example
//!
//! ```rust
//! use motorcover_core::{FeatureToggleProvider, FeatureToggles, ReloadableToggles};
//!
//! let toggles = ReloadableToggles::new(FeatureToggles::default());
//! assert!(!toggles.current().enable_vehicle_enrichment);
//!
//! toggles.replace(FeatureToggles {
//!     enable_vehicle_enrichment: true,
//!     enable_batch_vehicle_call: true,
//! });
//! assert!(toggles.current().enable_batch_vehicle_call);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod toggles;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use config::{AppConfig, DatabaseConfig, ResilienceConfig, VehicleClientConfig};
pub use error::{ConfigError, ConfigResult, CoreError, Result};
pub use toggles::{
    FeatureToggleProvider, FeatureToggles, ReloadableToggles, StaticToggles, ToggleWatcher,
};
pub use types::{
    InsuranceRecord, PersonalIdentityNumber, ProductType, RegistrationNumber, VehicleDetails,
};
