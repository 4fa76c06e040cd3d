//! Session domain model.
//!
//! A session is one run of the pipeline for one user request. It is
//! owned and mutated exclusively by the conversation driver; everything
//! else observes it read-only.

use serde::{Deserialize, Serialize};

use crate::transcript::Transcript;

/// Why a session reached the terminal `Failed` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The revision cycle exceeded the configured limit.
    RevisionLimitExceeded,
    /// The user cancelled the run (or rejected the result at the human
    /// approval gate).
    UserCancelled,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::RevisionLimitExceeded => {
                write!(f, "revision limit exceeded")
            }
            FailureReason::UserCancelled => write!(f, "cancelled by user"),
        }
    }
}

/// The pipeline state machine.
///
/// `Init → Analyzing → Developing → Reviewing → {Revising → Developing,
/// Approved, Failed}`; `Approved` admits the publish sub-flow
/// `Publishing → Published`. A failed publish returns the session to
/// `Approved` so publishing stays retryable without re-running the
/// conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Init,
    Analyzing,
    Developing,
    Reviewing,
    Revising,
    Approved,
    Publishing,
    Published,
    Failed(FailureReason),
}

impl PipelineState {
    /// States from which no further driver operation is admitted.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Published | PipelineState::Failed(_))
    }

    /// Whether the session reached (or passed) approval.
    pub fn is_approved_or_later(&self) -> bool {
        matches!(
            self,
            PipelineState::Approved | PipelineState::Publishing | PipelineState::Published
        )
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineState::Init => write!(f, "init"),
            PipelineState::Analyzing => write!(f, "analyzing"),
            PipelineState::Developing => write!(f, "developing"),
            PipelineState::Reviewing => write!(f, "reviewing"),
            PipelineState::Revising => write!(f, "revising"),
            PipelineState::Approved => write!(f, "approved"),
            PipelineState::Publishing => write!(f, "publishing"),
            PipelineState::Published => write!(f, "published"),
            PipelineState::Failed(reason) => write!(f, "failed ({reason})"),
        }
    }
}

/// The extracted, final deployable code payload.
///
/// Produced exactly once, at the transition into `Approved`; immutable
/// thereafter; consumed by the publish gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// The code payload.
    pub content: String,
    /// The revision cycle the payload was produced in.
    pub revision_index: u32,
}

/// One pipeline run for one user request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier (UUID format).
    pub id: String,
    /// The original user request.
    pub request: String,
    /// Append-only conversation history.
    pub transcript: Transcript,
    /// Current pipeline state.
    pub state: PipelineState,
    /// Number of revision cycles consumed so far.
    pub revision_count: u32,
    /// Maximum revision cycles before the run fails.
    pub max_revisions: u32,
    /// Extracted artifact; set if and only if the state is approved or
    /// later.
    pub artifact: Option<Artifact>,
    /// When true, no external side effects are performed anywhere in the
    /// pipeline.
    pub simulation_mode: bool,
    /// Timestamp when the session was created (ISO 8601 format).
    pub created_at: String,
    /// Timestamp when the session was last updated (ISO 8601 format).
    pub updated_at: String,
}

impl Session {
    /// Creates a fresh session in the `Init` state.
    pub fn new(request: impl Into<String>, max_revisions: u32, simulation_mode: bool) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            request: request.into(),
            transcript: Transcript::new(),
            state: PipelineState::Init,
            revision_count: 0,
            max_revisions,
            artifact: None,
            simulation_mode,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Refreshes the `updated_at` timestamp.
    pub(crate) fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}
