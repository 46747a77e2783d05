//! MotorCover Insurance - Insurance lookup with vehicle enrichment.
//!
//! [`InsuranceService`] loads a customer's insurances and, when the
//! `enable_vehicle_enrichment` toggle is on, attaches vehicle details to
//! every car insurance it can resolve through the Vehicle service.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use error::{InsuranceError, Result};
pub use repository::{InsuranceRepository, SqliteInsuranceRepository};
pub use service::InsuranceService;
