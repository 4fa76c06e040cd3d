//! Unified path management for Weave configuration files.
//!
//! All Weave configuration and secrets live in one place so every
//! storage component resolves files consistently across platforms.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/weave/             # Config directory
//! ├── config.toml              # Application configuration
//! └── secret.json              # API keys and tokens
//! ```

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Unified path management for Weave.
pub struct WeavePaths;

impl WeavePaths {
    /// Returns the Weave configuration directory.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: Path to config directory (e.g., `~/.config/weave/`)
    /// - `Err(PathError::HomeDirNotFound)`: Could not determine directory
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join("weave"))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to the main configuration file (config.toml).
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the path to the secrets file (secret.json).
    ///
    /// # Security Note
    ///
    /// The secret file is plaintext JSON; it should carry restrictive
    /// file permissions (e.g. 600).
    pub fn secret_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("secret.json"))
    }
}
