//! Session domain: pipeline state, the conversation driver, and the hub
//! that owns the live sessions.

pub mod driver;
pub mod hub;
pub mod model;

pub use driver::ConversationDriver;
pub use hub::{HumanDecision, SessionHub};
pub use model::{Artifact, FailureReason, PipelineState, Session};
