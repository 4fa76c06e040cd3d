//! Model backend seam.
//!
//! The conversation driver talks to language models through the
//! [`ModelBackend`] trait. The trait lives in the core crate so that the
//! interaction crate can provide implementations (REST agents, the
//! deterministic simulation agent) without a circular dependency.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::persona::RoleProfile;
use crate::transcript::Turn;

/// Errors surfaced by a model backend call.
///
/// Backend failures never advance the pipeline: the driver keeps the
/// session at the failed transition so the same step can be re-driven.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// The request to the model endpoint failed.
    #[error("model request failed: {message}")]
    RequestFailed {
        message: String,
        /// Set for transient conditions (connect/timeout, 429, 5xx).
        is_retryable: bool,
        /// Server-suggested delay before retrying, when provided.
        retry_after: Option<Duration>,
    },

    /// The endpoint answered but the completion carried no usable text.
    #[error("model returned an empty completion")]
    EmptyCompletion,

    /// The backend is missing required configuration.
    #[error("model backend is not configured: {0}")]
    NotConfigured(String),
}

impl BackendError {
    /// Creates a RequestFailed error without retry-after metadata.
    pub fn request_failed(message: impl Into<String>, is_retryable: bool) -> Self {
        Self::RequestFailed {
            message: message.into(),
            is_retryable,
            retry_after: None,
        }
    }

    /// Whether the caller may usefully retry the same call.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RequestFailed { is_retryable, .. } => *is_retryable,
            Self::EmptyCompletion => true,
            Self::NotConfigured(_) => false,
        }
    }
}

/// A single prompt-completion round-trip against a language model.
///
/// Implementations receive the role profile for the agent whose turn it
/// is plus the full transcript so far, and return the agent's raw text
/// contribution. Calls are synchronous from the driver's point of view:
/// the pipeline suspends until a response or failure comes back.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    async fn complete(
        &self,
        profile: &RoleProfile,
        history: &[Turn],
    ) -> Result<String, BackendError>;
}
