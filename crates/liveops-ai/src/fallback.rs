use crate::llm_provider::{GenerationConfig, LLMProvider, LLMResponse};
use liveops_core::{LiveOpsError, Result};
use std::sync::Arc;
use tracing::{error, info};

/// Model tried when the primary model fails.
pub const FALLBACK_MODEL: &str = "gpt-4o-mini";

/// A successful model call.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub response: LLMResponse,
    /// True when the primary failed and the fallback answered.
    pub used_fallback: bool,
}

/// Two-attempt model call: the primary provider, then exactly one retry against
/// the fallback provider with identical parameters. No backoff, no further retries.
pub struct FallbackInvoker {
    primary: Arc<dyn LLMProvider>,
    fallback: Arc<dyn LLMProvider>,
    generation: GenerationConfig,
}

impl FallbackInvoker {
    pub fn new(primary: Arc<dyn LLMProvider>, fallback: Arc<dyn LLMProvider>) -> Self {
        Self {
            primary,
            fallback,
            generation: GenerationConfig::default(),
        }
    }

    pub fn primary_model(&self) -> &str {
        self.primary.model_name()
    }

    pub fn fallback_model(&self) -> &str {
        self.fallback.model_name()
    }

    pub async fn invoke(&self, prompt: &str) -> Result<Invocation> {
        let primary_err = match self
            .primary
            .generate_with_config(prompt, &self.generation)
            .await
        {
            Ok(response) => {
                return Ok(Invocation {
                    response,
                    used_fallback: false,
                })
            }
            Err(e) => e,
        };

        error!(
            provider = self.primary.provider_name(),
            model = self.primary.model_name(),
            error = %primary_err,
            "Primary model failed"
        );

        match self
            .fallback
            .generate_with_config(prompt, &self.generation)
            .await
        {
            Ok(response) => {
                info!(model = self.fallback.model_name(), "Fallback model answered");
                Ok(Invocation {
                    response,
                    used_fallback: true,
                })
            }
            Err(fallback_err) => Err(LiveOpsError::ModelProvider {
                primary: format!("{:#}", primary_err),
                fallback: format!("{:#}", fallback_err),
            }),
        }
    }
}
