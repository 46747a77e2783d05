//! Outermost policy: replace any remaining failure with a synthetic value.

use crate::error::PolicyError;
use std::fmt::{self, Display};

/// Why a fallback value was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackCause {
    /// The circuit breaker rejected the call.
    CircuitOpen,
    /// The call failed after retries; carries the rendered error.
    Failed(String),
}

impl Display for FallbackCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CircuitOpen => write!(f, "circuit open"),
            Self::Failed(message) => write!(f, "{message}"),
        }
    }
}

/// Result of a call through the full policy stack. Never an error.
#[derive(Debug, Clone, PartialEq)]
pub enum PolicyOutcome<T> {
    /// The call produced a real value.
    Completed(T),
    /// The call failed and the fallback value was substituted.
    FellBack {
        /// Synthetic value
        value: T,
        /// What went wrong
        cause: FallbackCause,
    },
}

impl<T> PolicyOutcome<T> {
    /// The value, real or synthetic.
    pub fn into_inner(self) -> T {
        match self {
            Self::Completed(value) | Self::FellBack { value, .. } => value,
        }
    }

    /// Whether the value is synthetic.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::FellBack { .. })
    }

    /// The failure that triggered the fallback, if any.
    #[must_use]
    pub fn cause(&self) -> Option<&FallbackCause> {
        match self {
            Self::Completed(_) => None,
            Self::FellBack { cause, .. } => Some(cause),
        }
    }
}

/// Converts policy errors into fallback values.
#[derive(Debug, Clone)]
pub struct FallbackPolicy {
    name: String,
}

impl FallbackPolicy {
    /// Create a fallback for the named dependency.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Pass a success through or substitute `fallback()` for any error.
    pub fn recover<T, E, F>(&self, result: Result<T, PolicyError<E>>, fallback: F) -> PolicyOutcome<T>
    where
        E: Display,
        F: FnOnce() -> T,
    {
        match result {
            Ok(value) => PolicyOutcome::Completed(value),
            Err(PolicyError::CircuitOpen { retry_after }) => {
                tracing::error!(
                    "Call to '{}' rejected by open circuit (retry in {:?}), using fallback",
                    self.name,
                    retry_after
                );
                PolicyOutcome::FellBack {
                    value: fallback(),
                    cause: FallbackCause::CircuitOpen,
                }
            }
            Err(PolicyError::Inner(e)) => {
                tracing::debug!("Call to '{}' failed, using fallback: {}", self.name, e);
                PolicyOutcome::FellBack {
                    value: fallback(),
                    cause: FallbackCause::Failed(e.to_string()),
                }
            }
        }
    }
}
