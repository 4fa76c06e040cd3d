//! Configuration domain models.
//!
//! The core treats configuration values as pre-validated, opaque inputs;
//! loading and defaulting live in the infrastructure crate.

use serde::{Deserialize, Serialize};

/// Root configuration for the application (config.toml).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RootConfig {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub publish: PublishSettings,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Model endpoint configuration (Azure OpenAI deployment).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Resource endpoint, e.g. `https://myresource.openai.azure.com`.
    #[serde(default)]
    pub endpoint: String,
    /// Chat deployment name.
    #[serde(default)]
    pub deployment: String,
    /// API version query parameter.
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Maximum tokens per completion.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Sampling temperature; endpoint default when unset.
    #[serde(default)]
    pub temperature: Option<f32>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            deployment: String::new(),
            api_version: default_api_version(),
            max_tokens: default_max_tokens(),
            temperature: None,
        }
    }
}

/// Settings for publishing the approved artifact to a git remote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishSettings {
    /// Target repository URL, e.g. `https://github.com/user/repo.git`.
    #[serde(default)]
    pub repo_url: String,
    /// Branch to push to.
    #[serde(default = "default_branch")]
    pub branch: String,
    /// File name the artifact is staged as.
    #[serde(default = "default_file_name")]
    pub file_name: String,
    /// Commit author name.
    #[serde(default = "default_author_name")]
    pub author_name: String,
    /// Commit author email.
    #[serde(default = "default_author_email")]
    pub author_email: String,
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            repo_url: String::new(),
            branch: default_branch(),
            file_name: default_file_name(),
            author_name: default_author_name(),
            author_email: default_author_email(),
        }
    }
}

/// Pipeline tuning knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum number of revision cycles before the run fails.
    #[serde(default = "default_max_revisions")]
    pub max_revisions: u32,
    /// When true, no model endpoint is called and the publish gateway
    /// performs no external mutation.
    #[serde(default)]
    pub simulation_mode: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_revisions: default_max_revisions(),
            simulation_mode: false,
        }
    }
}

/// Secret configuration (secret.json); read-only, plaintext.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecretConfig {
    #[serde(default)]
    pub azure: Option<AzureSecret>,
    #[serde(default)]
    pub github: Option<GithubSecret>,
}

/// Azure OpenAI credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureSecret {
    pub api_key: String,
}

/// GitHub credentials for the publish collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubSecret {
    pub username: String,
    /// Personal access token.
    pub token: String,
}

fn default_api_version() -> String {
    "2024-02-15-preview".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_max_revisions() -> u32 {
    3
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_file_name() -> String {
    "index.html".to_string()
}

fn default_author_name() -> String {
    "Weave Pipeline".to_string()
}

fn default_author_email() -> String {
    "weave@localhost".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config: RootConfig = toml::from_str("").unwrap();
        assert_eq!(config.publish.branch, "main");
        assert_eq!(config.publish.file_name, "index.html");
        assert_eq!(config.pipeline.max_revisions, 3);
        assert!(!config.pipeline.simulation_mode);
    }

    #[test]
    fn test_partial_config_keeps_section_defaults() {
        let config: RootConfig = toml::from_str(
            r#"
            [publish]
            repo_url = "https://github.com/user/site.git"
            "#,
        )
        .unwrap();
        assert_eq!(config.publish.repo_url, "https://github.com/user/site.git");
        assert_eq!(config.publish.branch, "main");
        assert_eq!(config.model.api_version, "2024-02-15-preview");
    }
}
