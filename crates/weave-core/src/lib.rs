//! Core domain layer for the Weave multi-agent web development pipeline.
//!
//! This crate contains the conversation state machine, the review
//! classifier, the artifact extractor, the publish gateway, and the
//! session hub. It defines the collaborator seams (`ModelBackend`,
//! `PublishCollaborator`) as traits so that concrete implementations
//! can live in the interaction and infrastructure crates without
//! circular dependencies.

pub mod artifact;
pub mod backend;
pub mod config;
pub mod error;
pub mod persona;
pub mod publish;
pub mod review;
pub mod session;
pub mod transcript;

// Re-export common error type
pub use error::{Result, WeaveError};
