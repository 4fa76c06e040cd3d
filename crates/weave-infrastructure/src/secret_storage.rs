//! Secret configuration file storage.
//!
//! Provides read-only loading of secret configuration from
//! `~/.config/weave/secret.json`.

use std::fs;
use std::path::PathBuf;

use weave_core::config::SecretConfig;

use crate::paths::WeavePaths;

/// Errors that can occur during secret storage operations.
#[derive(Debug)]
pub enum SecretStorageError {
    /// Configuration file not found.
    NotFound(PathBuf),
    /// File I/O error.
    IoError(std::io::Error),
    /// JSON parsing error.
    ParseError(serde_json::Error),
    /// Config directory not found.
    ConfigDirNotFound,
}

impl std::fmt::Display for SecretStorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretStorageError::NotFound(path) => {
                write!(f, "Configuration file not found at: {}", path.display())
            }
            SecretStorageError::IoError(e) => write!(f, "I/O error: {}", e),
            SecretStorageError::ParseError(e) => write!(f, "JSON parse error: {}", e),
            SecretStorageError::ConfigDirNotFound => {
                write!(f, "Could not determine home directory")
            }
        }
    }
}

impl std::error::Error for SecretStorageError {}

impl From<std::io::Error> for SecretStorageError {
    fn from(e: std::io::Error) -> Self {
        SecretStorageError::IoError(e)
    }
}

impl From<serde_json::Error> for SecretStorageError {
    fn from(e: serde_json::Error) -> Self {
        SecretStorageError::ParseError(e)
    }
}

/// Storage for the secret configuration file (secret.json).
///
/// Responsibilities:
/// - Load secret.json from ~/.config/weave/
/// - Parse JSON into the SecretConfig domain model
///
/// Does NOT:
/// - Write or modify secret files (read-only)
/// - Validate API keys or credentials
/// - Handle encryption (plaintext JSON storage)
pub struct SecretStorage {
    path: PathBuf,
}

impl SecretStorage {
    /// Creates a new SecretStorage with the default path
    /// (~/.config/weave/secret.json).
    pub fn new() -> Result<Self, SecretStorageError> {
        let path = WeavePaths::secret_file().map_err(|_| SecretStorageError::ConfigDirNotFound)?;
        Ok(Self { path })
    }

    /// Creates a new SecretStorage with a custom path (for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Loads the secret configuration from the JSON file.
    pub fn load(&self) -> Result<SecretConfig, SecretStorageError> {
        if !self.path.exists() {
            return Err(SecretStorageError::NotFound(self.path.clone()));
        }

        let content = fs::read_to_string(&self.path)?;
        let config = serde_json::from_str(&content)?;

        Ok(config)
    }

    /// Returns the path to the secret file.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_secrets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret.json");
        fs::write(
            &path,
            r#"{
                "azure": { "api_key": "test-key" },
                "github": { "username": "octocat", "token": "ghp_test" }
            }"#,
        )
        .unwrap();

        let storage = SecretStorage::with_path(path);
        let secrets = storage.load().unwrap();
        assert_eq!(secrets.azure.unwrap().api_key, "test-key");
        assert_eq!(secrets.github.unwrap().username, "octocat");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SecretStorage::with_path(dir.path().join("secret.json"));
        assert!(matches!(
            storage.load(),
            Err(SecretStorageError::NotFound(_))
        ));
    }

    #[test]
    fn test_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret.json");
        fs::write(&path, "{ nope").unwrap();

        let storage = SecretStorage::with_path(path);
        assert!(matches!(
            storage.load(),
            Err(SecretStorageError::ParseError(_))
        ));
    }

    #[test]
    fn test_partial_secrets_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret.json");
        fs::write(&path, r#"{ "azure": { "api_key": "only-azure" } }"#).unwrap();

        let storage = SecretStorage::with_path(path);
        let secrets = storage.load().unwrap();
        assert!(secrets.azure.is_some());
        assert!(secrets.github.is_none());
    }
}
