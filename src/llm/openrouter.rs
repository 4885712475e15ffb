use crate::llm::client::CompletionService;
use crate::types::{AppError, Message, MessageRole, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// OpenAI-compatible chat completions client (OpenRouter by default).
pub struct OpenRouterClient {
    http: Arc<reqwest::Client>,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenRouterClient {
    pub fn new(http: Arc<reqwest::Client>, base_url: String, api_key: String, model: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }

    fn build_messages(system_prompt: &str, history: &[Message]) -> Vec<Value> {
        std::iter::once(json!({ "role": "system", "content": system_prompt }))
            .chain(history.iter().map(|m| match m.role {
                // Chat completions only accept `tool` as a reply to a tool call
                MessageRole::Tool => json!({
                    "role": "system",
                    "content": format!("Tool:\n{}", m.content),
                }),
                role => json!({ "role": role.as_str(), "content": m.content }),
            }))
            .collect()
    }
}

#[async_trait]
impl CompletionService for OpenRouterClient {
    async fn complete(&self, system_prompt: &str, history: &[Message]) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": Self::build_messages(system_prompt, history),
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::UpstreamUnavailable(format!("OpenRouter request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::UpstreamUnavailable(format!(
                "OpenRouter returned {}: {}",
                status, text
            )));
        }

        let value: Value = match response.json().await {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "OpenRouter response was not JSON");
                return Ok(String::new());
            }
        };

        let content = value
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string());

        match content {
            Some(content) => {
                debug!(model = %self.model, chars = content.len(), "OpenRouter completion");
                Ok(content)
            }
            None => {
                warn!(model = %self.model, "OpenRouter response had no message content");
                Ok(String::new())
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        "openrouter"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
