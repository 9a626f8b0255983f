//! Domain error types
//!
//! This module defines the error hierarchy for Conduit. Errors are split by
//! how the caller must react to them:
//!
//! - [`ConduitError::InvariantViolation`] is a programming bug signal and is
//!   fatal to the current action. Nothing is persisted.
//! - [`TransportError`] is recoverable. Transport adapters convert it into a
//!   retry outcome and it never escapes a send.
//! - [`ConduitError::Persistence`] is a hard failure of an atomic commit. The
//!   transaction guarantees nothing from the failed commit is visible.

use thiserror::Error;

/// Main Conduit error type
#[derive(Debug, Error)]
pub enum ConduitError {
    /// A lineage tracking contract was breached (e.g. a report tracked twice)
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Storage or transaction failure during commit or query
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Transport failure surfaced outside of a send (e.g. adapter construction)
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl ConduitError {
    /// Returns true for errors that signal a bug rather than an environment failure
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, ConduitError::InvariantViolation(_))
    }
}

/// Transport-specific errors
///
/// Raised inside transport adapters while talking to a destination. These
/// don't expose third-party client types.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Failed to connect to the destination
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Destination answered but refused the submission
    #[error("Rejected by destination: {status} - {message}")]
    Rejected { status: u16, message: String },

    /// Call did not complete within the configured timeout
    #[error("Timed out after {0} seconds")]
    Timeout(u64),

    /// Recipient or sender address could not be parsed
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Message template could not be rendered
    #[error("Template error: {0}")]
    Template(String),

    /// Report has no content to deliver
    #[error("Missing report content: {0}")]
    MissingContent(String),

    /// Local I/O failure (file-drop target)
    #[error("I/O failure: {0}")]
    Io(String),

    /// Provider-specific failure
    #[error("Provider error: {0}")]
    Provider(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for ConduitError {
    fn from(err: std::io::Error) -> Self {
        ConduitError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for ConduitError {
    fn from(err: serde_json::Error) -> Self {
        ConduitError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for ConduitError {
    fn from(err: toml::de::Error) -> Self {
        ConduitError::Configuration(format!("TOML parse error: {err}"))
    }
}

impl From<tokio_postgres::Error> for ConduitError {
    fn from(err: tokio_postgres::Error) -> Self {
        ConduitError::Persistence(err.to_string())
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conduit_error_display() {
        let err = ConduitError::InvariantViolation("report tracked twice".to_string());
        assert_eq!(err.to_string(), "Invariant violation: report tracked twice");
        assert!(err.is_invariant_violation());
    }

    #[test]
    fn test_transport_error_conversion() {
        let transport_err = TransportError::Timeout(30);
        let err: ConduitError = transport_err.into();
        assert!(matches!(err, ConduitError::Transport(_)));
        assert!(!err.is_invariant_violation());
    }

    #[test]
    fn test_rejected_display() {
        let err = TransportError::Rejected {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "Rejected by destination: 503 - unavailable");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: ConduitError = io_err.into();
        assert!(matches!(err, ConduitError::Io(_)));

        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: TransportError = io_err.into();
        assert!(matches!(err, TransportError::Io(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: ConduitError = toml_err.into();
        assert!(matches!(err, ConduitError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_errors_implement_std_error() {
        let err = ConduitError::Persistence("Test error".to_string());
        let _: &dyn std::error::Error = &err;
        let err = TransportError::ConnectionFailed("Test error".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
