//! Session hub: the surface the presentation layer talks to.
//!
//! The hub owns every live session, keyed by identifier. Sessions are
//! independent values sharing no mutable state; each driver sits behind
//! its own lock so agent turns for one session are strictly sequential
//! while separate sessions may run concurrently.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::driver::ConversationDriver;
use super::model::PipelineState;
use crate::backend::ModelBackend;
use crate::config::{PipelineConfig, PublishSettings};
use crate::error::{Result, WeaveError};
use crate::persona::RoleProfiles;
use crate::publish::{PublishCollaborator, PublishGateway, PublishResult, PublishStatus};
use crate::transcript::Turn;

/// The human operator's decision at the approval gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HumanDecision {
    Approve,
    Reject,
}

struct SessionEntry {
    driver: Arc<Mutex<ConversationDriver>>,
    /// Kept outside the driver lock so cancellation stays observable
    /// while a run holds the driver.
    cancel: CancellationToken,
}

/// Owns the live sessions and routes presentation-surface calls to them.
pub struct SessionHub {
    sessions: RwLock<HashMap<String, SessionEntry>>,
    backend: Arc<dyn ModelBackend>,
    gateway: PublishGateway,
    profiles: RoleProfiles,
    pipeline: PipelineConfig,
    publish_settings: PublishSettings,
}

impl SessionHub {
    pub fn new(
        backend: Arc<dyn ModelBackend>,
        collaborator: Arc<dyn PublishCollaborator>,
        profiles: RoleProfiles,
        pipeline: PipelineConfig,
        publish_settings: PublishSettings,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            backend,
            gateway: PublishGateway::new(collaborator),
            profiles,
            pipeline,
            publish_settings,
        }
    }

    /// Creates a session for a user request and returns its identifier.
    ///
    /// The pipeline does not start until [`SessionHub::drive`] is called.
    pub async fn submit_request(&self, request: impl Into<String>) -> String {
        let driver = ConversationDriver::new(
            request,
            self.profiles.clone(),
            self.backend.clone(),
            self.pipeline.max_revisions,
            self.pipeline.simulation_mode,
        );
        let id = driver.session().id.clone();
        let cancel = driver.cancel_token();
        info!(session_id = %id, "session created");

        let mut sessions = self.sessions.write().await;
        sessions.insert(
            id.clone(),
            SessionEntry {
                driver: Arc::new(Mutex::new(driver)),
                cancel,
            },
        );
        id
    }

    /// Runs the session's conversation until it reaches `Approved` or
    /// `Failed`, returning the reached state.
    pub async fn drive(&self, session_id: &str) -> Result<PipelineState> {
        let driver = self.driver(session_id).await?;
        let mut driver = driver.lock().await;
        driver.run_to_review().await
    }

    /// Returns a copy of the session's transcript, in insertion order.
    pub async fn get_transcript(&self, session_id: &str) -> Result<Vec<Turn>> {
        let driver = self.driver(session_id).await?;
        let driver = driver.lock().await;
        Ok(driver.session().transcript.as_slice().to_vec())
    }

    /// Returns the session's current pipeline state.
    pub async fn state(&self, session_id: &str) -> Result<PipelineState> {
        let driver = self.driver(session_id).await?;
        let driver = driver.lock().await;
        Ok(driver.session().state)
    }

    /// Records the human operator's decision on the approved result.
    ///
    /// Approval of the code is not implicit approval to publish; a
    /// separate [`SessionHub::confirm_publish`] call performs the
    /// side-effecting step.
    pub async fn confirm_approval(
        &self,
        session_id: &str,
        decision: HumanDecision,
    ) -> Result<PipelineState> {
        let driver = self.driver(session_id).await?;
        let mut driver = driver.lock().await;
        match decision {
            HumanDecision::Approve => {
                if driver.session().state != PipelineState::Approved {
                    return Err(WeaveError::invalid_state(
                        "approved",
                        driver.session().state.to_string(),
                    ));
                }
            }
            HumanDecision::Reject => driver.reject(),
        }
        Ok(driver.session().state)
    }

    /// Publishes the approved artifact through the gateway.
    ///
    /// On failure the session returns to `Approved` and the call may be
    /// retried without re-running the agent conversation.
    pub async fn confirm_publish(&self, session_id: &str) -> Result<PublishResult> {
        let driver = self.driver(session_id).await?;
        let mut driver = driver.lock().await;

        let artifact = driver.begin_publish()?;
        let simulation = driver.session().simulation_mode;
        let result = self
            .gateway
            .publish(&artifact, &self.publish_settings, simulation)
            .await;
        // Skipped (simulation) leaves the session approved: nothing was
        // actually published.
        driver.finish_publish(result.status == PublishStatus::Published);
        Ok(result)
    }

    /// Cancels a session.
    ///
    /// The cancellation token is signalled immediately so an in-flight
    /// run fails at its next checkpoint; if the driver is idle the
    /// session is finalized right away.
    pub async fn cancel(&self, session_id: &str) -> Result<()> {
        let (driver, cancel) = {
            let sessions = self.sessions.read().await;
            let entry = sessions
                .get(session_id)
                .ok_or_else(|| WeaveError::not_found("session", session_id))?;
            (entry.driver.clone(), entry.cancel.clone())
        };

        cancel.cancel();
        if let Ok(mut driver) = driver.try_lock() {
            driver.cancel();
        }
        Ok(())
    }

    /// Removes a session from the hub, releasing its resources.
    pub async fn clear(&self, session_id: &str) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions
            .remove(session_id)
            .map(|_| ())
            .ok_or_else(|| WeaveError::not_found("session", session_id))
    }

    async fn driver(&self, session_id: &str) -> Result<Arc<Mutex<ConversationDriver>>> {
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .map(|entry| entry.driver.clone())
            .ok_or_else(|| WeaveError::not_found("session", session_id))
    }
}
