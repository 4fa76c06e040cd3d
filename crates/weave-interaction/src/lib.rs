//! Interaction layer for Weave.
//!
//! Implements the model backend seam: prompt rendering for role
//! personas, the Azure OpenAI REST agent, and a deterministic
//! simulation agent for offline runs and tests.

pub mod azure_openai_agent;
pub mod prompt;
pub mod simulation_agent;

pub use azure_openai_agent::AzureOpenAiAgent;
pub use simulation_agent::SimulationAgent;
