//! Role profiles for the pipeline agents.
//!
//! A role profile is static configuration: it defines an agent's persona
//! and working instructions and carries no behavior of its own. The
//! conversation driver feeds profiles to the model backend.

pub mod model;
pub mod presets;

pub use model::{RoleProfile, RoleProfiles};
pub use presets::default_profiles;
