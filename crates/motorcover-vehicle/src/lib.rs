//! MotorCover Vehicle - Lookup client for the Vehicle service.
//!
//! [`VehicleLookupClient`] resolves registration numbers to
//! [`VehicleDetails`](motorcover_core::VehicleDetails) using either the
//! batch endpoint or one request per key, every call wrapped in the shared
//! policy stack from `motorcover-resilience`. Lookups never fail as a whole:
//! keys that cannot be resolved are simply missing from the result.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod client;
pub mod error;
pub mod http;
pub mod transport;

// Re-export commonly used types
pub use client::{LookupStrategy, VehicleLookupClient};
pub use error::{LookupError, Result};
pub use http::HttpVehicleTransport;
pub use transport::{TransportResponse, VehicleTransport};
