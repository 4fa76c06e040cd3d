//! Publish gateway.
//!
//! Invoked only after the human operator confirms publishing. The
//! gateway wraps the [`PublishCollaborator`] and translates every
//! failure into a user-visible [`PublishResult`] instead of letting a
//! fault escape into the pipeline state machine.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::PublishSettings;
use crate::session::model::Artifact;

/// Outcome of a successful collaborator run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// A commit was created and pushed.
    Pushed,
    /// The working tree already matched the artifact; nothing was
    /// committed. Per the error taxonomy this is a non-error.
    NothingToCommit,
}

/// Errors surfaced by the publish collaborator.
#[derive(Debug, Clone, Error)]
pub enum PublishError {
    /// The remote rejected the credentials.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The remote could not be reached.
    #[error("network failure: {0}")]
    NetworkUnreachable(String),

    /// A git step failed for another reason.
    #[error("publish command failed: {0}")]
    CommandFailed(String),

    /// Local filesystem failure while staging the artifact.
    #[error("IO error while staging artifact: {0}")]
    Io(String),

    /// Another publish attempt currently holds the working tree.
    #[error("publish already in progress; try again shortly")]
    PublishInProgress,
}

/// Stages, commits, and pushes an artifact to the configured remote.
///
/// Implementations live in the infrastructure crate; the gateway only
/// depends on this seam.
#[async_trait]
pub trait PublishCollaborator: Send + Sync {
    async fn stage_commit_push(
        &self,
        file_name: &str,
        content: &str,
        commit_message: &str,
    ) -> Result<PushOutcome, PublishError>;
}

/// Status of a publish attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStatus {
    /// The artifact reached the remote (or was already there).
    Published,
    /// Simulation mode: no external effect was performed.
    Skipped,
    /// The attempt failed; the session stays approved and publishing may
    /// be retried.
    Failed,
}

/// User-visible result of a publish attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishResult {
    pub status: PublishStatus,
    /// Human-readable description of what happened.
    pub detail: String,
}

impl PublishResult {
    fn failed(detail: impl Into<String>) -> Self {
        Self {
            status: PublishStatus::Failed,
            detail: detail.into(),
        }
    }
}

/// Wraps the publish collaborator behind a critical section.
///
/// The collaborator's stage/commit/push sequence runs against a single
/// working tree, so attempts are never overlapped: a second request while
/// one is in flight is rejected immediately rather than queued.
pub struct PublishGateway {
    collaborator: Arc<dyn PublishCollaborator>,
    in_flight: tokio::sync::Mutex<()>,
}

impl PublishGateway {
    pub fn new(collaborator: Arc<dyn PublishCollaborator>) -> Self {
        Self {
            collaborator,
            in_flight: tokio::sync::Mutex::new(()),
        }
    }

    /// Publishes an approved artifact.
    ///
    /// With `simulation_mode` set this returns [`PublishStatus::Skipped`]
    /// without any external effect; that is documented, observable
    /// behavior rather than a silent no-op. All collaborator failures are
    /// classified into a [`PublishStatus::Failed`] result; this method
    /// never returns an error.
    pub async fn publish(
        &self,
        artifact: &Artifact,
        settings: &PublishSettings,
        simulation_mode: bool,
    ) -> PublishResult {
        if simulation_mode {
            info!("simulation mode: skipping publish, no external effect");
            return PublishResult {
                status: PublishStatus::Skipped,
                detail: "simulation mode: publish skipped, no external effect performed"
                    .to_string(),
            };
        }

        let Ok(_guard) = self.in_flight.try_lock() else {
            warn!("rejecting publish attempt: another publish is in progress");
            return PublishResult::failed(PublishError::PublishInProgress.to_string());
        };

        let commit_message = format!(
            "Deploy web app - {}",
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        );

        match self
            .collaborator
            .stage_commit_push(&settings.file_name, &artifact.content, &commit_message)
            .await
        {
            Ok(PushOutcome::Pushed) => PublishResult {
                status: PublishStatus::Published,
                detail: format!(
                    "pushed {} to {} ({})",
                    settings.file_name, settings.repo_url, settings.branch
                ),
            },
            Ok(PushOutcome::NothingToCommit) => PublishResult {
                status: PublishStatus::Published,
                detail: "nothing to publish: the remote already has this artifact".to_string(),
            },
            Err(err) => {
                warn!(error = %err, "publish attempt failed");
                PublishResult::failed(err.to_string())
            }
        }
    }
}
