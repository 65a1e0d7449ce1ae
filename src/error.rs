//! Error types and handling for the switcher
//!
//! This module defines the error types used throughout the application.
//! Most of these never reach the main loop: each collaborator boundary
//! converts them into a safe default (0 W, weather admitted, dry-run relay).

use thiserror::Error;

/// Result type alias for switcher operations
pub type Result<T> = std::result::Result<T, SwitcherError>;

/// Main error type for the switcher
#[derive(Debug, Error)]
pub enum SwitcherError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Modbus communication errors
    #[error("Modbus error: {message}")]
    Modbus { message: String },

    /// Relay / GPIO errors
    #[error("Relay error: {message}")]
    Relay { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Network-related errors
    #[error("Network error: {message}")]
    Network { message: String },

    /// Forecast API errors
    #[error("API error: {message}")]
    Api { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Timeout errors
    #[error("Timeout error: {message}")]
    Timeout { message: String },
}

impl SwitcherError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        SwitcherError::Config {
            message: message.into(),
        }
    }

    /// Create a new Modbus error
    pub fn modbus<S: Into<String>>(message: S) -> Self {
        SwitcherError::Modbus {
            message: message.into(),
        }
    }

    /// Create a new relay error
    pub fn relay<S: Into<String>>(message: S) -> Self {
        SwitcherError::Relay {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        SwitcherError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        SwitcherError::Io {
            message: message.into(),
        }
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        SwitcherError::Network {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        SwitcherError::Api {
            message: message.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        SwitcherError::Timeout {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for SwitcherError {
    fn from(err: std::io::Error) -> Self {
        SwitcherError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for SwitcherError {
    fn from(err: serde_yaml::Error) -> Self {
        SwitcherError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for SwitcherError {
    fn from(err: serde_json::Error) -> Self {
        SwitcherError::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(feature = "weather")]
impl From<reqwest::Error> for SwitcherError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SwitcherError::timeout(err.to_string())
        } else {
            SwitcherError::network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = SwitcherError::config("test config error");
        assert!(matches!(err, SwitcherError::Config { .. }));

        let err = SwitcherError::relay("gpio busy");
        assert!(matches!(err, SwitcherError::Relay { .. }));

        let err = SwitcherError::validation("field", "test validation error");
        assert!(matches!(err, SwitcherError::Validation { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = SwitcherError::config("test error");
        assert_eq!(format!("{}", err), "Configuration error: test error");

        let err = SwitcherError::validation("meters", "at least one meter is required");
        assert_eq!(
            format!("{}", err),
            "Validation error: meters - at least one meter is required"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: SwitcherError = io.into();
        assert!(matches!(err, SwitcherError::Io { .. }));
        assert!(err.to_string().contains("gone"));
    }
}
