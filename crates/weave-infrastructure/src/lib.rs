//! Infrastructure layer for Weave.
//!
//! Hosts everything that touches the outside world on behalf of the
//! core: configuration and secret files under `~/.config/weave/`, and
//! the git-based publish collaborator.

pub mod config_service;
pub mod git_publisher;
pub mod paths;
pub mod secret_storage;

pub use config_service::ConfigService;
pub use git_publisher::GitPublisher;
pub use paths::WeavePaths;
pub use secret_storage::SecretStorage;
