use crate::llm::client::CompletionService;
use crate::types::{AppError, Message, MessageRole, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// Gemini `generateContent` client.
///
/// The conversation is flattened into a single content block whose parts are
/// role-prefixed lines (`System:`, `User:`, `Assistant:`, `Tool:`).
pub struct GeminiClient {
    http: Arc<reqwest::Client>,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(http: Arc<reqwest::Client>, base_url: String, api_key: String, model: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }

    fn label(role: MessageRole) -> &'static str {
        match role {
            MessageRole::System => "System",
            MessageRole::User => "User",
            MessageRole::Assistant => "Assistant",
            MessageRole::Tool => "Tool",
        }
    }

    fn build_body(system_prompt: &str, history: &[Message]) -> Value {
        let parts: Vec<Value> = std::iter::once(json!({ "text": format!("System: {}", system_prompt) }))
            .chain(history.iter().map(|m| {
                json!({ "text": format!("{}: {}", Self::label(m.role), m.content) })
            }))
            .collect();
        json!({ "contents": [{ "parts": parts }] })
    }
}

#[async_trait]
impl CompletionService for GeminiClient {
    async fn complete(&self, system_prompt: &str, history: &[Message]) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::build_body(system_prompt, history))
            .send()
            .await
            .map_err(|e| AppError::UpstreamUnavailable(format!("Gemini request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::UpstreamUnavailable(format!(
                "Gemini returned {}: {}",
                status, text
            )));
        }

        let value: Value = match response.json().await {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Gemini response was not JSON");
                return Ok(String::new());
            }
        };

        match value
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
        {
            Some(text) => {
                debug!(model = %self.model, chars = text.len(), "Gemini completion");
                Ok(text.trim().to_string())
            }
            None => {
                warn!(model = %self.model, "Gemini response had no candidate text");
                Ok(String::new())
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GeminiClient {
        GeminiClient::new(
            Arc::new(reqwest::Client::new()),
            server.uri(),
            "g-key".to_string(),
            "gemini-test".to_string(),
        )
    }

    #[tokio::test]
    async fn test_history_flattened_into_parts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-test:generateContent"))
            .and(header("x-goog-api-key", "g-key"))
            .and(body_json(json!({
                "contents": [{"parts": [
                    {"text": "System: guide"},
                    {"text": "User: question"},
                    {"text": "Tool: passage"}
                ]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "answer\n"}]}}]
            })))
            .mount(&server)
            .await;

        let answer = client(&server)
            .complete("guide", &[Message::user("question"), Message::tool("passage")])
            .await
            .unwrap();
        assert_eq!(answer, "answer");
    }

    #[tokio::test]
    async fn test_missing_candidates_is_empty_answer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"promptFeedback": {}})))
            .mount(&server)
            .await;

        assert_eq!(client(&server).complete("s", &[]).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_server_error_is_upstream_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        assert!(matches!(
            client(&server).complete("s", &[]).await,
            Err(AppError::UpstreamUnavailable(_))
        ));
    }
}
