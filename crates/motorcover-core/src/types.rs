//! Shared types used across the MotorCover services.
//!
//! This module defines the newtypes and records that flow between the
//! repositories, the Vehicle lookup client and the enrichment orchestrator.

use crate::error::CoreError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Vehicle registration number, the key used for vehicle lookups.
///
/// The core neither normalises case nor re-validates the format; use
/// [`crate::validation::validate_registration_number`] at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrationNumber(String);

impl RegistrationNumber {
    /// Wrap a registration number as-is.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the value is empty or whitespace only.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for RegistrationNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RegistrationNumber {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Newtype for personal identity numbers (the insurance owner key).
///
/// Must be exactly 12 ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PersonalIdentityNumber(String);

impl PersonalIdentityNumber {
    /// Create a new `PersonalIdentityNumber` from a string.
    ///
    /// # Errors
    /// Returns error if the value is not exactly 12 digits.
    pub fn new(value: impl Into<String>) -> Result<Self, CoreError> {
        let value = value.into();
        Self::validate(&value)?;
        Ok(Self(value))
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(value: &str) -> Result<(), CoreError> {
        static PIN_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = PIN_REGEX.get_or_init(|| Regex::new(r"^[0-9]{12}$").expect("valid regex"));

        if value.is_empty() {
            return Err(CoreError::Validation(
                "personal identity number is required".to_string(),
            ));
        }

        if value.chars().count() != 12 {
            return Err(CoreError::Validation(
                "personal identity number must be exactly 12 characters".to_string(),
            ));
        }

        if regex.is_match(value) {
            Ok(())
        } else {
            Err(CoreError::Validation(
                "personal identity number must contain only digits".to_string(),
            ))
        }
    }
}

impl TryFrom<String> for PersonalIdentityNumber {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PersonalIdentityNumber> for String {
    fn from(value: PersonalIdentityNumber) -> Self {
        value.0
    }
}

impl fmt::Display for PersonalIdentityNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Insurance product categories.
///
/// Stored as a small integer in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductType {
    /// Pet insurance
    Pet,
    /// Personal health insurance
    PersonalHealth,
    /// Car insurance (the only vehicle-backed product)
    Car,
}

impl ProductType {
    /// Database code for this product.
    #[must_use]
    pub fn code(self) -> i64 {
        match self {
            Self::Pet => 1,
            Self::PersonalHealth => 2,
            Self::Car => 3,
        }
    }

    /// Parse a database code.
    ///
    /// # Errors
    /// Returns error for unknown codes.
    pub fn from_code(code: i64) -> Result<Self, CoreError> {
        match code {
            1 => Ok(Self::Pet),
            2 => Ok(Self::PersonalHealth),
            3 => Ok(Self::Car),
            other => Err(CoreError::Validation(format!(
                "unknown product code: {other}"
            ))),
        }
    }
}

/// Vehicle data attached to an insurance record after a successful lookup.
///
/// Wire form is camelCase; `key` is accepted as an alias for the registration number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleDetails {
    /// Registration number the details belong to
    #[serde(alias = "key")]
    pub registration_number: RegistrationNumber,
    /// Manufacturer
    #[serde(default)]
    pub make: Option<String>,
    /// Model name
    #[serde(default)]
    pub model: Option<String>,
    /// Model year
    #[serde(default)]
    pub model_year: Option<i32>,
}

impl VehicleDetails {
    /// Create details carrying only a registration number.
    #[must_use]
    pub fn new(registration_number: impl Into<RegistrationNumber>) -> Self {
        Self {
            registration_number: registration_number.into(),
            make: None,
            model: None,
            model_year: None,
        }
    }

    /// Set the make.
    #[must_use]
    pub fn with_make(mut self, make: impl Into<String>) -> Self {
        self.make = Some(make.into());
        self
    }

    /// Set the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the model year.
    #[must_use]
    pub fn with_model_year(mut self, year: i32) -> Self {
        self.model_year = Some(year);
        self
    }
}

/// An insurance held by a person, optionally enriched with vehicle details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsuranceRecord {
    /// Database identifier
    pub insurance_id: i64,
    /// Owner key
    pub personal_identity_number: String,
    /// Product category
    pub product: ProductType,
    /// Monthly premium
    pub monthly_cost: f64,
    /// Registration number, present for car insurances
    #[serde(skip_serializing_if = "Option::is_none")]
    pub car_registration_number: Option<RegistrationNumber>,
    /// Attached once a lookup succeeds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_details: Option<VehicleDetails>,
}

impl InsuranceRecord {
    /// The registration number to look up, if this record is vehicle-backed.
    ///
    /// Only car insurances with a non-blank registration number qualify.
    #[must_use]
    pub fn vehicle_key(&self) -> Option<&RegistrationNumber> {
        if self.product != ProductType::Car {
            return None;
        }
        self.car_registration_number
            .as_ref()
            .filter(|key| !key.is_blank())
    }
}
