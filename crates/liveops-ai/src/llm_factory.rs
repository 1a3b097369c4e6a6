use crate::fallback::{FallbackInvoker, FALLBACK_MODEL};
use crate::llm_provider::*;
use crate::openai_llm_provider::{OpenAIConfig, OpenAIProvider};
use anyhow::{Context, Result};
use liveops_core::LLMConfig;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Factory for creating LLM providers based on configuration
pub struct LLMProviderFactory;

impl LLMProviderFactory {
    /// Create the primary provider from configuration
    pub fn create_from_config(config: &LLMConfig) -> Result<Arc<dyn LLMProvider>> {
        Ok(Arc::new(OpenAIProvider::new(OpenAIConfig::from(config))?))
    }

    /// Create the primary/fallback pair used by the summarization pipeline.
    ///
    /// Both providers share one HTTP client and differ only in model identifier.
    pub fn create_invoker(config: &LLMConfig) -> Result<FallbackInvoker> {
        let openai_config = OpenAIConfig::from(config);
        let client = Client::builder()
            .timeout(Duration::from_secs(openai_config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        let fallback_config = openai_config.with_model(FALLBACK_MODEL);
        let primary = OpenAIProvider::with_client(openai_config, client.clone())?;
        let fallback = OpenAIProvider::with_client(fallback_config, client)?;

        Ok(FallbackInvoker::new(Arc::new(primary), Arc::new(fallback)))
    }
}
