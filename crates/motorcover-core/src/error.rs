//! Core error types for the MotorCover services.
//!
//! Startup configuration problems are reported through [`ConfigError`];
//! malformed keys and records are reported through [`CoreError`].

use thiserror::Error;

/// Central error type for core operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Validation errors (malformed owner key or registration number)
    #[error("validation error: {0}")]
    Validation(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory path
    #[error("could not determine config directory (XDG base directories not available)")]
    NoConfigDir,

    /// Config file not found
    #[error("config file not found at {path}")]
    NotFound {
        /// Path where config was expected
        path: String,
    },

    /// Failed to parse TOML
    #[error("failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// I/O error reading config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required setting is absent or empty
    #[error("missing required config value: {field}")]
    Missing {
        /// Dotted path of the missing setting
        field: String,
    },

    /// Invalid configuration value
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

/// Result type alias using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::Validation("registration number is required".to_string());
        assert_eq!(
            err.to_string(),
            "validation error: registration number is required"
        );

        let err = ConfigError::Missing {
            field: "vehicle_client.api_key".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "missing required config value: vehicle_client.api_key"
        );
    }
}
