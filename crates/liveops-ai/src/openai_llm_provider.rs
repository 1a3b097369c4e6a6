use crate::llm_provider::*;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use liveops_core::LLMConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-5";

/// Content used when the model returns no text at all.
const EMPTY_CONTENT: &str = "{}";

/// Configuration for OpenAI provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    /// API key for OpenAI
    pub api_key: String,
    /// Base URL for API (default: https://api.openai.com/v1)
    pub base_url: String,
    /// Model to use (e.g., "gpt-5", "gpt-4o-mini")
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Optional organization ID
    pub organization: Option<String>,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            base_url: OPENAI_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: 120,
            organization: std::env::var("OPENAI_ORG_ID").ok(),
        }
    }
}

impl From<&LLMConfig> for OpenAIConfig {
    fn from(config: &LLMConfig) -> Self {
        Self {
            api_key: config.openai_api_key.clone().unwrap_or_default(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            timeout_secs: config.timeout_secs,
            organization: config.organization.clone(),
        }
    }
}

impl OpenAIConfig {
    /// Same endpoint and credentials, different model
    pub fn with_model(&self, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..self.clone()
        }
    }
}

/// OpenAI LLM provider using the Chat Completions API
pub struct OpenAIProvider {
    config: OpenAIConfig,
    client: Client,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Self::with_client(config, client)
    }

    /// Create a provider that shares an existing HTTP client
    pub fn with_client(config: OpenAIConfig, client: Client) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(anyhow!("OPENAI_API_KEY is not set"));
        }

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(OpenAIConfig::default())
    }

    /// Send a single request to the Chat Completions API
    async fn try_request(
        &self,
        messages: &[Message],
        config: &GenerationConfig,
    ) -> Result<ChatCompletionsResponse> {
        let request = ChatCompletionsRequest {
            model: self.config.model.clone(),
            messages: messages
                .iter()
                .map(|m| ChatMessage {
                    role: m.role.to_string(),
                    content: Some(m.content.clone()),
                })
                .collect(),
            temperature: Some(config.temperature),
            max_tokens: config.max_tokens,
        };

        let mut request_builder = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request);

        if let Some(org) = &self.config.organization {
            request_builder = request_builder.header("OpenAI-Organization", org);
        }

        let response = request_builder
            .send()
            .await
            .context("Failed to send request to OpenAI Chat Completions API")?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            return Err(anyhow!("OpenAI API error ({}): {}", status, error_text));
        }

        let response_text = response
            .text()
            .await
            .context("Failed to read OpenAI Chat Completions API response body")?;

        tracing::debug!(
            model = %self.config.model,
            response = %response_text,
            "Raw OpenAI Chat Completions API response"
        );

        serde_json::from_str::<ChatCompletionsResponse>(&response_text).context(format!(
            "Failed to parse OpenAI Chat Completions API response. Raw response: {}",
            response_text
        ))
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    async fn generate_chat(
        &self,
        messages: &[Message],
        config: &GenerationConfig,
    ) -> LLMResult<LLMResponse> {
        let start = Instant::now();
        let response = self.try_request(messages, config).await?;

        tracing::debug!(
            model = %self.config.model,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "OpenAI completion finished"
        );

        Ok(LLMResponse {
            content: first_choice_content(&response),
            total_tokens: response.usage.as_ref().map(|u| u.total_tokens),
            prompt_tokens: response.usage.as_ref().map(|u| u.prompt_tokens),
            completion_tokens: response.usage.as_ref().map(|u| u.completion_tokens),
            finish_reason: response.choices.first().and_then(|c| c.finish_reason.clone()),
            model: self.config.model.clone(),
        })
    }

    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

/// Text of the first choice; an absent or empty message becomes `{}`.
fn first_choice_content(response: &ChatCompletionsResponse) -> String {
    response
        .choices
        .first()
        .and_then(|c| c.message.content.as_deref())
        .filter(|c| !c.is_empty())
        .unwrap_or(EMPTY_CONTENT)
        .to_string()
}

// Chat Completions API request/response types

#[derive(Debug, Serialize)]
struct ChatCompletionsRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
    total_tokens: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_creation_requires_api_key() {
        let config = OpenAIConfig {
            api_key: String::new(),
            ..Default::default()
        };
        let err = OpenAIProvider::new(config).err().unwrap();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_with_model_keeps_endpoint() {
        let config = OpenAIConfig {
            api_key: "k".to_string(),
            base_url: "http://localhost:9999/v1".to_string(),
            ..Default::default()
        };
        let fallback = config.with_model("gpt-4o-mini");
        assert_eq!(fallback.model, "gpt-4o-mini");
        assert_eq!(fallback.base_url, config.base_url);
        assert_eq!(fallback.api_key, "k");
    }

    #[test]
    fn test_config_from_llm_config_trims_trailing_slash() {
        let llm = LLMConfig {
            base_url: "http://localhost:9999/v1/".to_string(),
            openai_api_key: Some("k".to_string()),
            ..Default::default()
        };
        let config = OpenAIConfig::from(&llm);
        assert_eq!(config.base_url, "http://localhost:9999/v1");
        assert_eq!(config.model, "gpt-5");
    }

    #[test]
    fn request_serializes_sampling_parameters() {
        let request = ChatCompletionsRequest {
            model: "gpt-test".to_string(),
            messages: vec![ChatMessage {
                role: MessageRole::User.to_string(),
                content: Some("hello".to_string()),
            }],
            temperature: Some(SUMMARY_TEMPERATURE),
            max_tokens: Some(SUMMARY_MAX_TOKENS),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["max_tokens"], 700);
        assert_eq!(json["messages"][0]["role"], "user");
        assert!((json["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn null_or_missing_content_becomes_empty_object() {
        let response: ChatCompletionsResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":null},"finish_reason":"stop"}]}"#,
        )
        .unwrap();
        assert_eq!(first_choice_content(&response), "{}");

        let response: ChatCompletionsResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(first_choice_content(&response), "{}");
    }
}
