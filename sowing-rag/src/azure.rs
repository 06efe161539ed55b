//! Azure OpenAI chat-completions answer generator.
//!
//! This module is only available when the `azure` feature is enabled.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{RagError, Result};
use crate::generation::AnswerGenerator;

/// Default Azure OpenAI REST API version.
pub const DEFAULT_API_VERSION: &str = "2024-05-01-preview";

/// Default location of the mounted API key secret.
pub const DEFAULT_API_KEY_FILE: &str = "/run/secrets/azure_api_key";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const SYSTEM_PROMPT: &str =
    "You are a highly knowledgeable assistant specializing in agriculture.";
const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 800;
const PROVIDER: &str = "AzureOpenAI";

/// Connection settings for an Azure OpenAI deployment.
#[derive(Clone)]
pub struct AzureOpenAIConfig {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`.
    pub endpoint: String,
    /// Chat model deployment name.
    pub deployment: String,
    /// API key sent in the `api-key` header.
    pub api_key: String,
    /// REST API version.
    pub api_version: String,
}

impl std::fmt::Debug for AzureOpenAIConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureOpenAIConfig")
            .field("endpoint", &self.endpoint)
            .field("deployment", &self.deployment)
            .field("api_key", &"<redacted>")
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl AzureOpenAIConfig {
    /// Read settings from the process environment.
    ///
    /// - `AZURE_OPENAI_ENDPOINT`
    /// - `AZURE_OPENAI_DEPLOYMENT`, falling back to `AZURE_OPENAI_DEPLOYMENT_NAME`
    /// - `AZURE_OPENAI_API_VERSION` (default [`DEFAULT_API_VERSION`])
    /// - the key from the file named by `AZURE_OPENAI_API_KEY_FILE`
    ///   (default [`DEFAULT_API_KEY_FILE`]) if it exists, else `AZURE_OPENAI_API_KEY`
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] naming every missing variable.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env) but reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let endpoint = get("AZURE_OPENAI_ENDPOINT");
        let deployment =
            get("AZURE_OPENAI_DEPLOYMENT").or_else(|| get("AZURE_OPENAI_DEPLOYMENT_NAME"));
        let api_version =
            get("AZURE_OPENAI_API_VERSION").unwrap_or_else(|| DEFAULT_API_VERSION.to_string());

        let key_file =
            get("AZURE_OPENAI_API_KEY_FILE").unwrap_or_else(|| DEFAULT_API_KEY_FILE.to_string());
        let api_key = read_key_file(Path::new(&key_file))?.or_else(|| get("AZURE_OPENAI_API_KEY"));

        let mut missing = Vec::new();
        if endpoint.is_none() {
            missing.push("AZURE_OPENAI_ENDPOINT");
        }
        if deployment.is_none() {
            missing.push("AZURE_OPENAI_DEPLOYMENT");
        }
        if api_key.is_none() {
            missing.push("AZURE_OPENAI_API_KEY");
        }

        match (endpoint, deployment, api_key) {
            (Some(endpoint), Some(deployment), Some(api_key)) => {
                Ok(Self { endpoint, deployment, api_key, api_version })
            }
            _ => Err(RagError::ConfigError(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            ))),
        }
    }

    fn chat_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.deployment,
            self.api_version
        )
    }
}

fn read_key_file(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let key = std::fs::read_to_string(path).map_err(|e| {
        RagError::ConfigError(format!("cannot read API key file {}: {e}", path.display()))
    })?;
    let key = key.trim().to_string();
    Ok((!key.is_empty()).then_some(key))
}

/// An [`AnswerGenerator`] backed by an Azure OpenAI chat deployment.
///
/// The prompt is sent as the user message under a fixed agricultural system
/// message. Failures are not retried.
///
/// # Example
///
/// ```rust,ignore
/// use sowing_rag::azure::{AzureOpenAIConfig, AzureOpenAIGenerator};
///
/// let generator = AzureOpenAIGenerator::new(AzureOpenAIConfig::from_env()?)?;
/// let answer = generator.answer(&prompt).await?;
/// ```
pub struct AzureOpenAIGenerator {
    client: reqwest::Client,
    config: AzureOpenAIConfig,
}

impl AzureOpenAIGenerator {
    /// Create a generator with the default request timeout.
    pub fn new(config: AzureOpenAIConfig) -> Result<Self> {
        Ok(Self { client: build_client(DEFAULT_TIMEOUT)?, config })
    }

    /// Create a generator from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(AzureOpenAIConfig::from_env()?)
    }

    /// Replace the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = build_client(timeout)?;
        Ok(self)
    }
}

fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| RagError::ConfigError(format!("failed to build HTTP client: {e}")))
}

// ── Chat completions request/response types ────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

fn generation_error(message: String) -> RagError {
    RagError::GenerationError { provider: PROVIDER.into(), message }
}

// ── AnswerGenerator implementation ─────────────────────────────────

#[async_trait]
impl AnswerGenerator for AzureOpenAIGenerator {
    async fn answer(&self, prompt: &str) -> Result<String> {
        debug!(
            provider = PROVIDER,
            deployment = %self.config.deployment,
            prompt_len = prompt.len(),
            "requesting chat completion"
        );

        let request_body = ChatRequest {
            messages: [
                ChatMessage { role: "system", content: SYSTEM_PROMPT },
                ChatMessage { role: "user", content: prompt },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .client
            .post(self.config.chat_url())
            .header("api-key", &self.config.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                generation_error(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            error!(provider = PROVIDER, %status, "API error");
            return Err(generation_error(format!("API returned {status}: {detail}")));
        }

        let chat: ChatResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            generation_error(format!("failed to parse response: {e}"))
        })?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| generation_error("API returned no completion".into()))
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn missing_variables_are_all_listed() {
        let err = AzureOpenAIConfig::from_lookup(lookup(&[(
            "AZURE_OPENAI_API_KEY_FILE",
            "/nonexistent/azure_api_key",
        )]))
        .unwrap_err();
        let RagError::ConfigError(message) = err else { panic!("expected ConfigError") };
        assert!(message.contains("AZURE_OPENAI_ENDPOINT"));
        assert!(message.contains("AZURE_OPENAI_DEPLOYMENT"));
        assert!(message.contains("AZURE_OPENAI_API_KEY"));
    }

    #[test]
    fn deployment_name_fallback_and_default_version() {
        let config = AzureOpenAIConfig::from_lookup(lookup(&[
            ("AZURE_OPENAI_ENDPOINT", "https://farm.openai.azure.com/"),
            ("AZURE_OPENAI_DEPLOYMENT_NAME", "gpt-4o"),
            ("AZURE_OPENAI_API_KEY", "env-key"),
            ("AZURE_OPENAI_API_KEY_FILE", "/nonexistent/azure_api_key"),
        ]))
        .unwrap();
        assert_eq!(config.deployment, "gpt-4o");
        assert_eq!(config.api_version, DEFAULT_API_VERSION);
        assert_eq!(config.api_key, "env-key");
        assert_eq!(
            config.chat_url(),
            "https://farm.openai.azure.com/openai/deployments/gpt-4o/chat/completions?api-version=2024-05-01-preview"
        );
    }

    #[test]
    fn key_file_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("azure_api_key");
        std::fs::write(&key_path, "file-key\n").unwrap();
        let key_path = key_path.to_string_lossy().to_string();

        let config = AzureOpenAIConfig::from_lookup(lookup(&[
            ("AZURE_OPENAI_ENDPOINT", "https://farm.openai.azure.com"),
            ("AZURE_OPENAI_DEPLOYMENT", "gpt-4o"),
            ("AZURE_OPENAI_API_KEY", "env-key"),
            ("AZURE_OPENAI_API_KEY_FILE", key_path.as_str()),
        ]))
        .unwrap();
        assert_eq!(config.api_key, "file-key");
    }

    #[test]
    fn debug_output_redacts_key() {
        let config = AzureOpenAIConfig {
            endpoint: "https://farm.openai.azure.com".into(),
            deployment: "gpt-4o".into(),
            api_key: "very-secret".into(),
            api_version: DEFAULT_API_VERSION.into(),
        };
        assert!(!format!("{config:?}").contains("very-secret"));
    }
}
