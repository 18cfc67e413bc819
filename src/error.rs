//! Error types and handling for upsbridge
//!
//! This module defines the error type surfaced to callers of the engine
//! and the host runtime. Per-entry outcomes that are not failures (a raw
//! path the device does not expose, a converter declining to publish)
//! are modelled by `crate::engine::EntryOutcome` instead.

use thiserror::Error;

/// Result type alias for upsbridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Main error type for upsbridge
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Backward conversion rejected the value of a write request
    #[error("Invalid value for {name}: {message}")]
    InvalidWriteValue { name: String, message: String },

    /// I/O failure reported by the transport collaborator
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// A composite command step found the device in the wrong state
    #[error("Precondition not met: {message}")]
    PreconditionNotMet { message: String },

    /// A required published value was not available
    #[error("Missing data: {message}")]
    MissingData { message: String },

    /// Write request for a canonical name the registry does not know
    #[error("Unknown variable: {name}")]
    UnknownVariable { name: String },

    /// Write request for a variable without a writable entry on this device
    #[error("Variable is not writable: {name}")]
    NotWritable { name: String },

    /// Instant command not present in the registry
    #[error("Unknown command: {name}")]
    UnknownCommand { name: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Generic errors with context
    #[error("Error: {message}")]
    Generic { message: String },
}

impl BridgeError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        BridgeError::Config {
            message: message.into(),
        }
    }

    /// Create a new invalid write value error
    pub fn invalid_write<S: Into<String>, M: Into<String>>(name: S, message: M) -> Self {
        BridgeError::InvalidWriteValue {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        BridgeError::Transport {
            message: message.into(),
        }
    }

    /// Create a new precondition error
    pub fn precondition<S: Into<String>>(message: S) -> Self {
        BridgeError::PreconditionNotMet {
            message: message.into(),
        }
    }

    /// Create a new missing data error
    pub fn missing_data<S: Into<String>>(message: S) -> Self {
        BridgeError::MissingData {
            message: message.into(),
        }
    }

    /// Create a new unknown variable error
    pub fn unknown_variable<S: Into<String>>(name: S) -> Self {
        BridgeError::UnknownVariable { name: name.into() }
    }

    /// Create a new not writable error
    pub fn not_writable<S: Into<String>>(name: S) -> Self {
        BridgeError::NotWritable { name: name.into() }
    }

    /// Create a new unknown command error
    pub fn unknown_command<S: Into<String>>(name: S) -> Self {
        BridgeError::UnknownCommand { name: name.into() }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>, M: Into<String>>(field: S, message: M) -> Self {
        BridgeError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        BridgeError::Io {
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn generic<S: Into<String>>(message: S) -> Self {
        BridgeError::Generic {
            message: message.into(),
        }
    }

    /// Whether the driver can keep running after this error. Only
    /// configuration errors are fatal.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, BridgeError::Config { .. })
    }
}

impl From<std::io::Error> for BridgeError {
    fn from(err: std::io::Error) -> Self {
        BridgeError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for BridgeError {
    fn from(err: serde_yaml::Error) -> Self {
        BridgeError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<crate::transport::WriteError> for BridgeError {
    fn from(err: crate::transport::WriteError) -> Self {
        BridgeError::transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = BridgeError::config("test config error");
        assert!(matches!(err, BridgeError::Config { .. }));

        let err = BridgeError::transport("usb stalled");
        assert!(matches!(err, BridgeError::Transport { .. }));

        let err = BridgeError::validation("field", "test validation error");
        assert!(matches!(err, BridgeError::Validation { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = BridgeError::invalid_write("ups.beeper.status", "unknown label 'loud'");
        assert_eq!(
            err.to_string(),
            "Invalid value for ups.beeper.status: unknown label 'loud'"
        );

        let err = BridgeError::precondition("bypass switch is on");
        assert_eq!(err.to_string(), "Precondition not met: bypass switch is on");
    }

    #[test]
    fn config_errors_are_not_recoverable() {
        assert!(!BridgeError::config("x").is_recoverable());
        assert!(BridgeError::missing_data("x").is_recoverable());
    }
}
