//! Configuration service implementation.
//!
//! Loads the root configuration from `~/.config/weave/config.toml`,
//! writing a default file when none exists, and applies environment
//! overrides on top. The loaded value is cached to avoid repeated file
//! I/O.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use tracing::debug;
use weave_core::config::RootConfig;
use weave_core::error::{Result, WeaveError};

use crate::paths::WeavePaths;

/// Configuration service that loads and caches the root configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    /// Cached configuration loaded from file.
    /// Uses RwLock for thread-safe lazy loading.
    config: Arc<RwLock<Option<RootConfig>>>,
    /// Explicit file path; defaults to the platform config location.
    path: Option<PathBuf>,
}

impl ConfigService {
    /// Creates a new ConfigService reading the default config location.
    ///
    /// The configuration is loaded lazily on first access.
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(None)),
            path: None,
        }
    }

    /// Creates a ConfigService reading a custom path (for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            config: Arc::new(RwLock::new(None)),
            path: Some(path),
        }
    }

    /// Gets the root configuration, loading from file if not cached.
    ///
    /// A missing file is created with defaults; a malformed file is an
    /// error rather than a silent fallback.
    pub fn get_config(&self) -> Result<RootConfig> {
        {
            let read_lock = self.config.read().unwrap();
            if let Some(ref cached) = *read_lock {
                return Ok(cached.clone());
            }
        }

        let mut loaded = self.load_config()?;
        apply_env_overrides(&mut loaded, |key| std::env::var(key).ok());

        {
            let mut write_lock = self.config.write().unwrap();
            *write_lock = Some(loaded.clone());
        }

        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self.config.write().unwrap();
        *write_lock = None;
    }

    fn load_config(&self) -> Result<RootConfig> {
        let path = self.config_path()?;

        if !path.exists() {
            debug!(path = %path.display(), "config file missing; writing defaults");
            let default_config = RootConfig::default();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let rendered = toml::to_string_pretty(&default_config)?;
            std::fs::write(&path, rendered)?;
            return Ok(default_config);
        }

        let content = std::fs::read_to_string(&path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    fn config_path(&self) -> Result<PathBuf> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => WeavePaths::config_file().map_err(|e| WeaveError::config(e.to_string())),
        }
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies environment overrides to a loaded configuration.
///
/// The lookup is injected so the override logic stays testable without
/// mutating process environment in parallel test runs.
pub fn apply_env_overrides(
    config: &mut RootConfig,
    lookup: impl Fn(&str) -> Option<String>,
) {
    if let Some(endpoint) = lookup("AZURE_OPENAI_ENDPOINT") {
        config.model.endpoint = endpoint;
    }
    if let Some(deployment) = lookup("AZURE_OPENAI_CHAT_DEPLOYMENT_NAME") {
        config.model.deployment = deployment;
    }
    if let Some(api_version) = lookup("AZURE_OPENAI_API_VERSION") {
        config.model.api_version = api_version;
    }
    if let Some(repo_url) = lookup("GITHUB_REPO_URL") {
        config.publish.repo_url = repo_url;
    }
    if let Some(flag) = lookup("WEAVE_SIMULATION") {
        config.pipeline.simulation_mode =
            matches!(flag.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
    }
    if let Some(max) = lookup("WEAVE_MAX_REVISIONS") {
        if let Ok(value) = max.trim().parse() {
            config.pipeline.max_revisions = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let service = ConfigService::with_path(path.clone());

        let config = service.get_config().unwrap();
        assert_eq!(config, RootConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn test_existing_file_is_loaded_and_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
            [publish]
            repo_url = "https://github.com/user/site.git"
            branch = "deploy"
            "#,
        )
        .unwrap();

        let service = ConfigService::with_path(path.clone());
        let config = service.get_config().unwrap();
        assert_eq!(config.publish.branch, "deploy");

        // A second read comes from the cache even if the file changes.
        std::fs::write(&path, "").unwrap();
        let cached = service.get_config().unwrap();
        assert_eq!(cached.publish.branch, "deploy");

        service.invalidate_cache();
        let reloaded = service.get_config().unwrap();
        assert_eq!(reloaded.publish.branch, "main");
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "not = [valid").unwrap();

        let service = ConfigService::with_path(path);
        let err = service.get_config().unwrap_err();
        assert!(matches!(err, WeaveError::Serialization { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = RootConfig::default();
        apply_env_overrides(&mut config, |key| match key {
            "AZURE_OPENAI_ENDPOINT" => Some("https://example.openai.azure.com".to_string()),
            "WEAVE_SIMULATION" => Some("true".to_string()),
            "WEAVE_MAX_REVISIONS" => Some("5".to_string()),
            _ => None,
        });

        assert_eq!(config.model.endpoint, "https://example.openai.azure.com");
        assert!(config.pipeline.simulation_mode);
        assert_eq!(config.pipeline.max_revisions, 5);
    }

    #[test]
    fn test_invalid_env_values_are_ignored() {
        let mut config = RootConfig::default();
        apply_env_overrides(&mut config, |key| match key {
            "WEAVE_SIMULATION" => Some("nope".to_string()),
            "WEAVE_MAX_REVISIONS" => Some("many".to_string()),
            _ => None,
        });

        assert!(!config.pipeline.simulation_mode);
        assert_eq!(config.pipeline.max_revisions, 3);
    }
}
