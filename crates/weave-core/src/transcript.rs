//! Conversation transcript types.
//!
//! A transcript is the append-only ordered history of turns for one
//! session. It is the shared memory all agents read: the driver passes it
//! verbatim to the model backend on every call.

use serde::{Deserialize, Serialize};

/// The author of a single turn in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    /// The Business Analyst agent.
    Analyst,
    /// The Software Engineer agent.
    Engineer,
    /// The Product Owner agent.
    Owner,
    /// The human operator.
    User,
}

impl AgentRole {
    /// Display name used when rendering the transcript into prompt text.
    pub fn display_name(&self) -> &'static str {
        match self {
            AgentRole::Analyst => "BusinessAnalyst",
            AgentRole::Engineer => "SoftwareEngineer",
            AgentRole::Owner => "ProductOwner",
            AgentRole::User => "User",
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One role's single contribution to the transcript.
///
/// Turns are immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// The author of this turn.
    pub role: AgentRole,
    /// The content of the turn.
    pub content: String,
    /// Timestamp when the turn was created (ISO 8601 format).
    pub timestamp: String,
    /// The revision cycle this turn belongs to (0 for the first pass).
    pub revision_index: u32,
}

impl Turn {
    /// Creates a new turn stamped with the current time.
    pub fn new(role: AgentRole, content: impl Into<String>, revision_index: u32) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            revision_index,
        }
    }
}

/// Append-only ordered sequence of turns.
///
/// Insertion order is authoritative; no turn is ever removed or edited.
/// The only mutator is [`Transcript::push`], which keeps the length
/// strictly increasing across any sequence of driver operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript(Vec<Turn>);

impl Transcript {
    /// Creates an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a turn to the end of the transcript.
    pub fn push(&mut self, turn: Turn) {
        self.0.push(turn);
    }

    /// Number of turns recorded so far.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no turn has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the most recent turn, if any.
    pub fn last(&self) -> Option<&Turn> {
        self.0.last()
    }

    /// Returns the most recent turn authored by `role`, if any.
    pub fn last_from(&self, role: AgentRole) -> Option<&Turn> {
        self.0.iter().rev().find(|turn| turn.role == role)
    }

    /// Borrows the turns as a slice, in insertion order.
    pub fn as_slice(&self) -> &[Turn] {
        &self.0
    }

    /// Iterates over the turns in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Turn> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Turn;
    type IntoIter = std::slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
