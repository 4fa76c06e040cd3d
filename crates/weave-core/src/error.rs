//! Error types for the Weave application.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::artifact::ExtractError;
use crate::backend::BackendError;

/// A shared error type for the entire Weave application.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait. Every variant carries a
/// human-readable message so that no unclassified fault ever reaches the
/// presentation surface.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum WeaveError {
    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Model backend call failed; the pipeline state did not advance and
    /// the same step may be re-driven
    #[error("Model backend error: {message}")]
    Backend { message: String, retryable: bool },

    /// The engineer output contained no recoverable code artifact
    #[error("Artifact extraction failed: {0}")]
    Extraction(String),

    /// An operation was attempted in a pipeline state that does not admit it
    #[error("Invalid pipeline state: expected {expected}, but session is {actual}")]
    InvalidState {
        expected: &'static str,
        actual: String,
    },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WeaveError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an InvalidState error
    pub fn invalid_state(expected: &'static str, actual: impl Into<String>) -> Self {
        Self::InvalidState {
            expected,
            actual: actual.into(),
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error represents a failure the caller may retry
    /// without restarting the session (backend hiccups for a single turn).
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Backend { retryable: true, .. })
    }
}

impl From<std::io::Error> for WeaveError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for WeaveError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for WeaveError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for WeaveError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<BackendError> for WeaveError {
    fn from(err: BackendError) -> Self {
        Self::Backend {
            retryable: err.is_retryable(),
            message: err.to_string(),
        }
    }
}

impl From<ExtractError> for WeaveError {
    fn from(err: ExtractError) -> Self {
        Self::Extraction(err.to_string())
    }
}

/// A type alias for `Result<T, WeaveError>`.
pub type Result<T> = std::result::Result<T, WeaveError>;
