//! Role profile domain model.

use serde::{Deserialize, Serialize};

use crate::transcript::AgentRole;

/// A role profile defining one agent's persona and working instructions.
///
/// Profiles are pure configuration data consumed by the conversation
/// driver; the instruction text establishes the marker protocol the
/// review classifier and artifact extractor rely on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleProfile {
    /// Display name of the agent (e.g. "BusinessAnalyst").
    pub name: String,
    /// The transcript role this profile speaks as.
    pub role: AgentRole,
    /// Role or title describing the agent's expertise.
    pub title: String,
    /// Background description of the agent's responsibilities.
    pub background: String,
    /// Communication style characteristics.
    pub communication_style: String,
    /// Working instructions, including the output protocol the pipeline
    /// depends on (fenced code blocks, review markers).
    pub instructions: String,
}

/// The three role profiles that make up one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleProfiles {
    pub analyst: RoleProfile,
    pub engineer: RoleProfile,
    pub owner: RoleProfile,
}

impl RoleProfiles {
    /// Returns the profile that speaks as `role`, if it is an agent role.
    pub fn for_role(&self, role: AgentRole) -> Option<&RoleProfile> {
        match role {
            AgentRole::Analyst => Some(&self.analyst),
            AgentRole::Engineer => Some(&self.engineer),
            AgentRole::Owner => Some(&self.owner),
            AgentRole::User => None,
        }
    }
}
