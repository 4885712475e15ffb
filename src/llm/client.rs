//! Completion service abstraction and provider selection
//!
//! Two providers are supported:
//! - **OpenRouter**: OpenAI-compatible chat completions, used as the primary service
//! - **Gemini**: `generateContent`, used as the fallback service

use crate::llm::gemini::GeminiClient;
use crate::llm::openrouter::OpenRouterClient;
use crate::types::{Message, Result};
use crate::utils::config::Config;
use async_trait::async_trait;
use std::sync::Arc;

/// Text completion over a role-tagged message history.
///
/// Transport and HTTP failures are errors, never empty strings, so callers can
/// fall back. A successful response with an unexpected shape yields `""`.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, system_prompt: &str, history: &[Message]) -> Result<String>;

    /// Short provider name used in logs
    fn provider_name(&self) -> &'static str;

    fn model_name(&self) -> &str;
}

/// Provider enum for runtime selection
#[derive(Debug, Clone)]
pub enum Provider {
    OpenRouter {
        api_key: String,
        base_url: String,
        model: String,
    },
    Gemini {
        api_key: String,
        base_url: String,
        model: String,
    },
}

impl Provider {
    /// The primary service described by `config`.
    pub fn primary(config: &Config) -> Result<Self> {
        Ok(Provider::OpenRouter {
            api_key: config.completion_key()?.to_string(),
            base_url: config.completion.base_url.clone(),
            model: config.completion_model().to_string(),
        })
    }

    /// The fallback service described by `config`.
    pub fn fallback(config: &Config) -> Result<Self> {
        Ok(Provider::Gemini {
            api_key: config.fallback_key()?.to_string(),
            base_url: config.fallback.base_url.clone(),
            model: config.fallback.model.clone(),
        })
    }

    pub fn create_client(&self, http: Arc<reqwest::Client>) -> Arc<dyn CompletionService> {
        match self {
            Provider::OpenRouter {
                api_key,
                base_url,
                model,
            } => Arc::new(OpenRouterClient::new(
                http,
                base_url.clone(),
                api_key.clone(),
                model.clone(),
            )),
            Provider::Gemini {
                api_key,
                base_url,
                model,
            } => Arc::new(GeminiClient::new(
                http,
                base_url.clone(),
                api_key.clone(),
                model.clone(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_providers_from_config() {
        let mut config = Config::default();
        config.resolve_secrets_with(|name| match name {
            "OPENROUTER_API_KEY" => Some("or".to_string()),
            "GOOGLE_API_KEY" => Some("g".to_string()),
            _ => None,
        });

        let primary = Provider::primary(&config).unwrap();
        assert!(matches!(primary, Provider::OpenRouter { ref api_key, .. } if api_key == "or"));

        let client = Provider::fallback(&config)
            .unwrap()
            .create_client(Arc::new(reqwest::Client::new()));
        assert_eq!(client.provider_name(), "gemini");
        assert_eq!(client.model_name(), "gemini-2.5-flash");
    }

    #[test]
    fn test_missing_key_is_invalid_configuration() {
        let mut config = Config::default();
        config.resolve_secrets_with(|_| None);
        let err = Provider::primary(&config).unwrap_err();
        assert!(matches!(err, crate::types::AppError::InvalidConfiguration(ref m) if m.contains("OPENROUTER_API_KEY")));
    }
}
