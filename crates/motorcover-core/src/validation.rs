//! Boundary validators.
//!
//! Keys are validated here, before they reach the orchestrator or the
//! lookup client. The core itself assumes keys are syntactically valid.

use crate::error::{CoreError, Result};
use crate::types::RegistrationNumber;
use std::collections::HashSet;

/// Shortest accepted registration number.
pub const MIN_REGISTRATION_NUMBER_LENGTH: usize = 2;

/// Longest accepted registration number.
pub const MAX_REGISTRATION_NUMBER_LENGTH: usize = 7;

/// Upper bound on registration numbers accepted in one request.
pub const MAX_REGISTRATION_NUMBERS: usize = 500;

/// Validate a single registration number.
///
/// # Errors
/// Returns `CoreError::Validation` when the value is blank or its length is
/// outside 2-7 characters.
pub fn validate_registration_number(value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(
            "registration number is required".to_string(),
        ));
    }

    let len = value.chars().count();
    if !(MIN_REGISTRATION_NUMBER_LENGTH..=MAX_REGISTRATION_NUMBER_LENGTH).contains(&len) {
        return Err(CoreError::Validation(format!(
            "registration number must be between {MIN_REGISTRATION_NUMBER_LENGTH} and {MAX_REGISTRATION_NUMBER_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Reduce a key list to the distinct, valid keys, capped at [`MAX_REGISTRATION_NUMBERS`].
///
/// Invalid keys are dropped and duplicates removed (first occurrence wins,
/// order otherwise preserved). Anything dropped or truncated is logged at
/// warn.
#[must_use]
pub fn sanitize_registration_numbers<I, S>(values: I) -> Vec<RegistrationNumber>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    let mut sanitized = Vec::new();
    let mut invalid = 0usize;
    let mut duplicates = 0usize;

    for value in values {
        let value = value.into();
        if validate_registration_number(&value).is_err() {
            invalid += 1;
            continue;
        }
        if seen.insert(value.clone()) {
            sanitized.push(RegistrationNumber::new(value));
        } else {
            duplicates += 1;
        }
    }

    if invalid > 0 {
        tracing::warn!("Dropped {} invalid registration numbers", invalid);
    }
    if duplicates > 0 {
        tracing::warn!("Dropped {} duplicate registration numbers", duplicates);
    }
    if sanitized.len() > MAX_REGISTRATION_NUMBERS {
        tracing::warn!(
            "The number of registration numbers ({}) exceeds the limit of {}. The list will be truncated.",
            sanitized.len(),
            MAX_REGISTRATION_NUMBERS
        );
        sanitized.truncate(MAX_REGISTRATION_NUMBERS);
    }

    sanitized
}
