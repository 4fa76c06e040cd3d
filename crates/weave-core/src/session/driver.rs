//! The conversation driver: the state machine that sequences agent turns.
//!
//! The driver owns its [`Session`] exclusively. Each step performs at
//! most one model backend call; calls are strictly sequential because
//! every turn depends on the transcript produced by the previous one.
//! Cancellation is cooperative: the token is checked before each backend
//! call, never mid-flight.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::model::{Artifact, FailureReason, PipelineState, Session};
use crate::artifact::extract_artifact;
use crate::backend::ModelBackend;
use crate::error::{Result, WeaveError};
use crate::persona::{RoleProfile, RoleProfiles};
use crate::review::{ReviewDecision, classify_review, has_review_marker};
use crate::transcript::{AgentRole, Turn};

/// Drives one session through the analyze/develop/review cycle.
pub struct ConversationDriver {
    session: Session,
    profiles: RoleProfiles,
    backend: Arc<dyn ModelBackend>,
    cancel: CancellationToken,
}

impl ConversationDriver {
    /// Creates a driver for a fresh session seeded with the user request.
    pub fn new(
        request: impl Into<String>,
        profiles: RoleProfiles,
        backend: Arc<dyn ModelBackend>,
        max_revisions: u32,
        simulation_mode: bool,
    ) -> Self {
        let mut session = Session::new(request, max_revisions, simulation_mode);
        let request_turn = Turn::new(AgentRole::User, session.request.clone(), 0);
        session.transcript.push(request_turn);
        Self {
            session,
            profiles,
            backend,
            cancel: CancellationToken::new(),
        }
    }

    /// Read-only view of the owned session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// A clone of the cancellation token, observable from outside while a
    /// run is in progress.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// INIT → ANALYZING → DEVELOPING: the analyst produces the
    /// requirements document.
    ///
    /// Also accepts a session already sitting in `Analyzing` so a failed
    /// backend call can be re-driven without restarting the session.
    pub async fn submit(&mut self) -> Result<()> {
        match self.session.state {
            PipelineState::Init | PipelineState::Analyzing => {}
            other => return Err(WeaveError::invalid_state("init", other.to_string())),
        }
        if self.observe_cancellation() {
            return Ok(());
        }

        self.session.state = PipelineState::Analyzing;
        let profile = self.profiles.analyst.clone();
        let content = self.complete_turn(&profile).await?;
        self.append_turn(AgentRole::Analyst, content);
        self.session.state = PipelineState::Developing;
        Ok(())
    }

    /// DEVELOPING → REVIEWING: the engineer produces (or revises) the code.
    pub async fn develop(&mut self) -> Result<()> {
        if self.session.state != PipelineState::Developing {
            return Err(WeaveError::invalid_state(
                "developing",
                self.session.state.to_string(),
            ));
        }
        if self.observe_cancellation() {
            return Ok(());
        }

        let profile = self.profiles.engineer.clone();
        let content = self.complete_turn(&profile).await?;
        self.append_turn(AgentRole::Engineer, content);
        self.session.state = PipelineState::Reviewing;
        Ok(())
    }

    /// REVIEWING → APPROVED | REVISING → DEVELOPING | FAILED.
    ///
    /// The owner verdict is classified by the deterministic, fail-closed
    /// classifier; on approval the artifact is extracted from the most
    /// recent engineer turn.
    pub async fn review(&mut self) -> Result<()> {
        if self.session.state != PipelineState::Reviewing {
            return Err(WeaveError::invalid_state(
                "reviewing",
                self.session.state.to_string(),
            ));
        }
        if self.observe_cancellation() {
            return Ok(());
        }

        let profile = self.profiles.owner.clone();
        let verdict = self.complete_turn(&profile).await?;
        if !has_review_marker(&verdict) {
            warn!(
                session_id = %self.session.id,
                "owner verdict carried no recognized marker; failing closed to CHANGES_REQUESTED"
            );
        }
        let decision = classify_review(&verdict);
        self.append_turn(AgentRole::Owner, verdict);

        match decision {
            ReviewDecision::Approve => self.approve(),
            ReviewDecision::RequestChanges => {
                self.request_changes();
                Ok(())
            }
        }
    }

    /// Runs the pipeline from its current state until the review cycle
    /// reaches `Approved` or `Failed`, then returns the reached state.
    pub async fn run_to_review(&mut self) -> Result<PipelineState> {
        loop {
            match self.session.state {
                PipelineState::Init | PipelineState::Analyzing => self.submit().await?,
                PipelineState::Developing => self.develop().await?,
                PipelineState::Reviewing => self.review().await?,
                _ => break,
            }
        }
        Ok(self.session.state)
    }

    /// Cancels the run: signals the token and, when the session has not
    /// yet been approved, marks it failed with `UserCancelled`.
    pub fn cancel(&mut self) {
        self.cancel.cancel();
        if !self.session.state.is_terminal() && !self.session.state.is_approved_or_later() {
            info!(session_id = %self.session.id, "session cancelled by user");
            self.session.state = PipelineState::Failed(FailureReason::UserCancelled);
            self.session.touch();
        }
    }

    /// Records the human operator's rejection at the approval gate.
    ///
    /// The run is over; a new request starts a new session. The extracted
    /// artifact is dropped along with the approval: an artifact exists
    /// only on sessions that are approved or later.
    pub fn reject(&mut self) {
        if !self.session.state.is_terminal() {
            info!(session_id = %self.session.id, "result rejected by user");
            self.session.artifact = None;
            self.session.state = PipelineState::Failed(FailureReason::UserCancelled);
            self.session.touch();
        }
    }

    /// APPROVED → PUBLISHING: claims the artifact for a publish attempt.
    pub fn begin_publish(&mut self) -> Result<Artifact> {
        if self.session.state != PipelineState::Approved {
            return Err(WeaveError::invalid_state(
                "approved",
                self.session.state.to_string(),
            ));
        }
        let artifact = self
            .session
            .artifact
            .clone()
            .ok_or_else(|| WeaveError::internal("approved session has no artifact"))?;
        self.session.state = PipelineState::Publishing;
        self.session.touch();
        Ok(artifact)
    }

    /// PUBLISHING → PUBLISHED on success; back to APPROVED on failure so
    /// the user may retry publishing without re-running the conversation.
    pub fn finish_publish(&mut self, published: bool) {
        if self.session.state != PipelineState::Publishing {
            return;
        }
        self.session.state = if published {
            PipelineState::Published
        } else {
            PipelineState::Approved
        };
        self.session.touch();
    }

    fn approve(&mut self) -> Result<()> {
        let engineer_turn = self
            .session
            .transcript
            .last_from(AgentRole::Engineer)
            .ok_or_else(|| WeaveError::internal("review approved but no engineer turn exists"))?;
        let revision_index = engineer_turn.revision_index;

        // Extraction failure is reported as such, distinct from a review
        // rejection; the session stays in Reviewing.
        let content = extract_artifact(&engineer_turn.content)?;

        info!(
            session_id = %self.session.id,
            revision = revision_index,
            "owner approved; artifact extracted"
        );
        self.session.artifact = Some(Artifact {
            content,
            revision_index,
        });
        self.session.state = PipelineState::Approved;
        self.session.touch();
        Ok(())
    }

    fn request_changes(&mut self) {
        if self.session.revision_count + 1 > self.session.max_revisions {
            warn!(
                session_id = %self.session.id,
                max_revisions = self.session.max_revisions,
                "revision limit exceeded; failing the session"
            );
            self.session.state = PipelineState::Failed(FailureReason::RevisionLimitExceeded);
            self.session.touch();
            return;
        }

        self.session.revision_count += 1;
        self.session.state = PipelineState::Revising;
        info!(
            session_id = %self.session.id,
            revision = self.session.revision_count,
            "owner requested changes; starting revision cycle"
        );
        // The owner's change request is already the latest transcript
        // turn, so the next engineer call sees it in its prompt context.
        self.session.state = PipelineState::Developing;
        self.session.touch();
    }

    /// Checks the cancellation token before a backend call. Returns
    /// `true` (after marking the session failed) when cancelled.
    fn observe_cancellation(&mut self) -> bool {
        if self.cancel.is_cancelled() {
            info!(session_id = %self.session.id, "cancellation observed at checkpoint");
            self.session.state = PipelineState::Failed(FailureReason::UserCancelled);
            self.session.touch();
            return true;
        }
        false
    }

    async fn complete_turn(&mut self, profile: &RoleProfile) -> Result<String> {
        debug!(
            session_id = %self.session.id,
            agent = %profile.name,
            turns = self.session.transcript.len(),
            "invoking model backend"
        );
        let content = self
            .backend
            .complete(profile, self.session.transcript.as_slice())
            .await?;
        Ok(content)
    }

    fn append_turn(&mut self, role: AgentRole, content: String) {
        let turn = Turn::new(role, content, self.session.revision_count);
        self.session.transcript.push(turn);
        self.session.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendError;
    use crate::persona::default_profiles;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const ENGINEER_OUTPUT: &str = "Implementation complete.\n\n```html\n<!DOCTYPE html>\n<html><body><script>function calculateResult() {}</script></body></html>\n```\n\nReady for review.";

    /// Replays a fixed sequence of completions, counting calls.
    struct ScriptedBackend {
        responses: Mutex<VecDeque<std::result::Result<String, BackendError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedBackend {
        fn new(responses: Vec<std::result::Result<String, BackendError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().collect()),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ModelBackend for ScriptedBackend {
        async fn complete(
            &self,
            _profile: &RoleProfile,
            _history: &[Turn],
        ) -> std::result::Result<String, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(BackendError::request_failed("script exhausted", false)))
        }
    }

    fn driver_with(
        responses: Vec<std::result::Result<String, BackendError>>,
        max_revisions: u32,
    ) -> (ConversationDriver, Arc<ScriptedBackend>) {
        let backend = Arc::new(ScriptedBackend::new(responses));
        let driver = ConversationDriver::new(
            "Build a calculator",
            default_profiles(),
            backend.clone(),
            max_revisions,
            true,
        );
        (driver, backend)
    }

    #[tokio::test]
    async fn test_happy_path_reaches_approved_with_artifact() {
        let (mut driver, _backend) = driver_with(
            vec![
                Ok("Requirements are clear. Ready for development.".to_string()),
                Ok(ENGINEER_OUTPUT.to_string()),
                Ok("All requirements met.\n\nAPPROVED".to_string()),
            ],
            3,
        );

        let state = driver.run_to_review().await.unwrap();
        assert_eq!(state, PipelineState::Approved);

        let artifact = driver.session().artifact.as_ref().unwrap();
        assert!(artifact.content.contains("calculateResult"));
        assert_eq!(artifact.revision_index, 0);
        assert_eq!(driver.session().revision_count, 0);
        // user + analyst + engineer + owner
        assert_eq!(driver.session().transcript.len(), 4);
    }

    #[tokio::test]
    async fn test_revision_limit_exceeded_is_deterministic() {
        let reject = || Ok("CHANGES_REQUESTED: add keyboard support".to_string());
        let (mut driver, backend) = driver_with(
            vec![
                Ok("Requirements are clear.".to_string()),
                Ok(ENGINEER_OUTPUT.to_string()),
                reject(),
                Ok(ENGINEER_OUTPUT.to_string()),
                reject(),
                Ok(ENGINEER_OUTPUT.to_string()),
                reject(),
            ],
            2,
        );

        let state = driver.run_to_review().await.unwrap();
        assert_eq!(
            state,
            PipelineState::Failed(FailureReason::RevisionLimitExceeded)
        );
        assert_eq!(driver.session().revision_count, 2);
        assert!(driver.session().revision_count <= driver.session().max_revisions);
        assert!(driver.session().artifact.is_none());
        // No further backend calls happen after the terminal state.
        assert_eq!(backend.call_count(), 7);
    }

    #[tokio::test]
    async fn test_transcript_length_is_monotonic() {
        let (mut driver, _backend) = driver_with(
            vec![
                Ok("Requirements are clear.".to_string()),
                Ok(ENGINEER_OUTPUT.to_string()),
                Ok("CHANGES_REQUESTED: larger buttons".to_string()),
                Ok(ENGINEER_OUTPUT.to_string()),
                Ok("APPROVED".to_string()),
            ],
            3,
        );

        let mut last_len = driver.session().transcript.len();
        loop {
            match driver.session().state {
                PipelineState::Init | PipelineState::Analyzing => driver.submit().await.unwrap(),
                PipelineState::Developing => driver.develop().await.unwrap(),
                PipelineState::Reviewing => driver.review().await.unwrap(),
                _ => break,
            }
            let len = driver.session().transcript.len();
            assert!(len >= last_len);
            last_len = len;
        }
        assert_eq!(driver.session().state, PipelineState::Approved);
    }

    #[tokio::test]
    async fn test_cancel_between_turns_skips_next_backend_call() {
        let (mut driver, backend) = driver_with(
            vec![
                Ok("Requirements are clear.".to_string()),
                Ok(ENGINEER_OUTPUT.to_string()),
            ],
            3,
        );

        driver.submit().await.unwrap();
        driver.develop().await.unwrap();
        assert_eq!(driver.session().state, PipelineState::Reviewing);

        driver.cancel_token().cancel();
        driver.review().await.unwrap();

        assert_eq!(
            driver.session().state,
            PipelineState::Failed(FailureReason::UserCancelled)
        );
        // The owner call was never started.
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn test_backend_error_does_not_advance_state() {
        let (mut driver, _backend) = driver_with(
            vec![
                Err(BackendError::request_failed("rate limited", true)),
                Ok("Requirements are clear.".to_string()),
            ],
            3,
        );

        let err = driver.submit().await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(driver.session().state, PipelineState::Analyzing);
        assert_eq!(driver.session().transcript.len(), 1);

        // The same step can be re-driven.
        driver.submit().await.unwrap();
        assert_eq!(driver.session().state, PipelineState::Developing);
    }

    #[tokio::test]
    async fn test_missing_artifact_on_approval_is_an_extraction_error() {
        let (mut driver, _backend) = driver_with(
            vec![
                Ok("Requirements are clear.".to_string()),
                Ok("I wrote the code but forgot to paste it.".to_string()),
                Ok("APPROVED".to_string()),
            ],
            3,
        );

        driver.submit().await.unwrap();
        driver.develop().await.unwrap();
        let err = driver.review().await.unwrap_err();
        assert!(matches!(err, WeaveError::Extraction(_)));
        assert_eq!(driver.session().state, PipelineState::Reviewing);
        assert!(driver.session().artifact.is_none());
    }

    #[tokio::test]
    async fn test_ambiguous_verdict_fails_closed_into_revision() {
        let (mut driver, _backend) = driver_with(
            vec![
                Ok("Requirements are clear.".to_string()),
                Ok(ENGINEER_OUTPUT.to_string()),
                Ok("Hmm, looks nice I guess?".to_string()),
            ],
            3,
        );

        driver.run_to_review().await.ok();
        // Fail-closed: the unmarked verdict consumed one revision.
        assert_eq!(driver.session().state, PipelineState::Developing);
        assert_eq!(driver.session().revision_count, 1);
    }

    #[tokio::test]
    async fn test_reject_drops_the_artifact() {
        let (mut driver, _backend) = driver_with(
            vec![
                Ok("Requirements are clear.".to_string()),
                Ok(ENGINEER_OUTPUT.to_string()),
                Ok("APPROVED".to_string()),
            ],
            3,
        );
        driver.run_to_review().await.unwrap();
        assert!(driver.session().artifact.is_some());

        driver.reject();
        assert_eq!(
            driver.session().state,
            PipelineState::Failed(FailureReason::UserCancelled)
        );
        // An artifact exists only on approved-or-later sessions.
        assert!(driver.session().artifact.is_none());
    }

    #[tokio::test]
    async fn test_publish_transitions() {
        let (mut driver, _backend) = driver_with(
            vec![
                Ok("Requirements are clear.".to_string()),
                Ok(ENGINEER_OUTPUT.to_string()),
                Ok("APPROVED".to_string()),
            ],
            3,
        );
        driver.run_to_review().await.unwrap();

        let artifact = driver.begin_publish().unwrap();
        assert_eq!(driver.session().state, PipelineState::Publishing);

        // Failure returns to Approved; the artifact is untouched.
        driver.finish_publish(false);
        assert_eq!(driver.session().state, PipelineState::Approved);
        assert_eq!(driver.session().artifact.as_ref().unwrap(), &artifact);

        driver.begin_publish().unwrap();
        driver.finish_publish(true);
        assert_eq!(driver.session().state, PipelineState::Published);
    }
}
