//! AzureOpenAiAgent - Direct REST implementation for Azure OpenAI.
//!
//! This agent calls the Azure OpenAI Chat Completions API directly.
//! Configuration priority: ~/.config/weave/secret.json > environment variables

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header::HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;
use weave_core::backend::{BackendError, ModelBackend};
use weave_core::config::ModelConfig;
use weave_core::persona::RoleProfile;
use weave_core::transcript::Turn;
use weave_infrastructure::SecretStorage;

use crate::prompt::{render_history, render_role_prompt};

const DEFAULT_API_VERSION: &str = "2024-02-15-preview";

/// Backend implementation that talks to an Azure OpenAI deployment.
#[derive(Clone)]
pub struct AzureOpenAiAgent {
    client: Client,
    endpoint: String,
    deployment: String,
    api_version: String,
    api_key: String,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

impl AzureOpenAiAgent {
    /// Creates a new agent for the given deployment.
    pub fn new(
        endpoint: impl Into<String>,
        deployment: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            deployment: deployment.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            api_key: api_key.into(),
            max_tokens: None,
            temperature: None,
        }
    }

    /// Creates an agent from a loaded model configuration plus the API key.
    pub fn from_config(config: &ModelConfig, api_key: impl Into<String>) -> Self {
        Self::new(&config.endpoint, &config.deployment, api_key)
            .with_api_version(&config.api_version)
            .with_max_tokens(config.max_tokens)
            .with_temperature(config.temperature)
    }

    /// Loads credentials from ~/.config/weave/secret.json or environment variables.
    ///
    /// Priority:
    /// 1. ~/.config/weave/secret.json (api key only; endpoint still from env)
    /// 2. Environment variables (AZURE_OPENAI_API_KEY)
    ///
    /// Endpoint and deployment always come from AZURE_OPENAI_ENDPOINT and
    /// AZURE_OPENAI_CHAT_DEPLOYMENT_NAME.
    pub fn try_from_env() -> Result<Self, BackendError> {
        let endpoint = env::var("AZURE_OPENAI_ENDPOINT").map_err(|_| {
            BackendError::NotConfigured("AZURE_OPENAI_ENDPOINT not set".into())
        })?;
        let deployment = env::var("AZURE_OPENAI_CHAT_DEPLOYMENT_NAME").map_err(|_| {
            BackendError::NotConfigured("AZURE_OPENAI_CHAT_DEPLOYMENT_NAME not set".into())
        })?;

        // Try loading the key from SecretStorage first
        let api_key = SecretStorage::new()
            .ok()
            .and_then(|storage| storage.load().ok())
            .and_then(|secrets| secrets.azure)
            .map(|azure| azure.api_key)
            .or_else(|| env::var("AZURE_OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                BackendError::NotConfigured(
                    "AZURE_OPENAI_API_KEY not found in ~/.config/weave/secret.json or environment variables"
                        .into(),
                )
            })?;

        let mut agent = Self::new(endpoint, deployment, api_key);
        if let Ok(api_version) = env::var("AZURE_OPENAI_API_VERSION") {
            agent = agent.with_api_version(api_version);
        }
        Ok(agent)
    }

    /// Overrides the API version after construction.
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Sets the maximum number of tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Sets the sampling temperature; `None` keeps the endpoint default.
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    fn request_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.deployment,
            self.api_version
        )
    }

    async fn send_request(&self, body: &ChatCompletionRequest) -> Result<String, BackendError> {
        let response = self
            .client
            .post(self.request_url())
            .header("api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|err| BackendError::RequestFailed {
                message: format!("Azure OpenAI request failed: {err}"),
                is_retryable: err.is_connect() || err.is_timeout(),
                retry_after: None,
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let retry_after = parse_retry_after(response.headers().get("retry-after"));
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Azure OpenAI error body".to_string());
            return Err(map_http_error(status, body_text, retry_after));
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|err| {
            BackendError::request_failed(format!("Failed to parse Azure OpenAI response: {err}"), false)
        })?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl ModelBackend for AzureOpenAiAgent {
    async fn complete(
        &self,
        profile: &RoleProfile,
        history: &[Turn],
    ) -> Result<String, BackendError> {
        debug!(agent = profile.name, deployment = %self.deployment, "requesting completion");

        let request = ChatCompletionRequest {
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: render_role_prompt(profile)?,
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: render_history(history)?,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        self.send_request(&request).await
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
    #[allow(dead_code)]
    code: Option<String>,
}

fn extract_text_response(response: ChatCompletionResponse) -> Result<String, BackendError> {
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .unwrap_or_default();

    if content.trim().is_empty() {
        return Err(BackendError::EmptyCompletion);
    }
    Ok(content)
}

fn map_http_error(status: StatusCode, body: String, retry_after: Option<Duration>) -> BackendError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or_else(|_| body.clone());

    let is_retryable = matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    );

    BackendError::RequestFailed {
        message: format!("Azure OpenAI returned {status}: {message}"),
        is_retryable,
        retry_after,
    }
}

fn parse_retry_after(header: Option<&HeaderValue>) -> Option<Duration> {
    let value = header?.to_str().ok()?;
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    // Retry-After HTTP-date parsing is omitted for simplicity
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_url() {
        let agent = AzureOpenAiAgent::new(
            "https://myresource.openai.azure.com/",
            "gpt-4o",
            "key",
        )
        .with_api_version("2024-02-15-preview");

        assert_eq!(
            agent.request_url(),
            "https://myresource.openai.azure.com/openai/deployments/gpt-4o/chat/completions?api-version=2024-02-15-preview"
        );
    }

    #[test]
    fn test_request_serialization_skips_unset_options() {
        let request = ChatCompletionRequest {
            messages: vec![ChatMessage {
                role: "system".to_string(),
                content: "prompt".to_string(),
            }],
            max_tokens: None,
            temperature: None,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("max_tokens").is_none());
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn test_map_http_error_rate_limit_is_retryable() {
        let err = map_http_error(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"message":"Rate limit exceeded","code":"429"}}"#.to_string(),
            Some(Duration::from_secs(7)),
        );

        assert!(err.is_retryable());
        match err {
            BackendError::RequestFailed {
                message,
                retry_after,
                ..
            } => {
                assert!(message.contains("Rate limit exceeded"));
                assert_eq!(retry_after, Some(Duration::from_secs(7)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_map_http_error_client_error_is_not_retryable() {
        let err = map_http_error(StatusCode::UNAUTHORIZED, "bad key".to_string(), None);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_empty_completion_is_an_error() {
        let response = ChatCompletionResponse {
            choices: vec![Choice {
                message: ResponseMessage {
                    content: Some("   ".to_string()),
                },
            }],
        };
        assert!(matches!(
            extract_text_response(response),
            Err(BackendError::EmptyCompletion)
        ));

        let no_choices = ChatCompletionResponse { choices: vec![] };
        assert!(matches!(
            extract_text_response(no_choices),
            Err(BackendError::EmptyCompletion)
        ));
    }

    #[test]
    fn test_parse_retry_after_seconds() {
        let header = HeaderValue::from_static("12");
        assert_eq!(
            parse_retry_after(Some(&header)),
            Some(Duration::from_secs(12))
        );
        let date = HeaderValue::from_static("Wed, 21 Oct 2026 07:28:00 GMT");
        assert_eq!(parse_retry_after(Some(&date)), None);
    }
}
