//! Embedding service seam and the Gemini `embedding-001` client.

use crate::types::{AppError, Result};
use crate::utils::config::Config;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Converts text to fixed-dimension vectors.
///
/// Unavailability is an error, never a zero vector or an empty result.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Embed document chunks, one vector per input, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a search query.
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>>;

    fn dimensions(&self) -> usize;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest<'a> {
    model: &'a str,
    content: Content<'a>,
    task_type: &'static str,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedRequest<'a>>,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<EmbeddingValues>,
}

/// Gemini embeddings over the REST API.
pub struct GeminiEmbeddings {
    http: Arc<reqwest::Client>,
    base_url: String,
    model: String,
    api_key: String,
    dimensions: usize,
    batch_size: usize,
}

impl GeminiEmbeddings {
    pub fn new(
        http: Arc<reqwest::Client>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        dimensions: usize,
        batch_size: usize,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
            dimensions,
            batch_size: batch_size.max(1),
        }
    }

    pub fn from_config(config: &Config, http: Arc<reqwest::Client>) -> Result<Self> {
        let key = config.embedding_key()?;
        Ok(Self::new(
            http,
            &config.embedding.base_url,
            &config.embedding.model,
            key,
            config.embedding.dimensions,
            config.embedding.batch_size,
        ))
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/{}:{}", self.base_url, self.model, method)
    }

    async fn post<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<R> {
        let response = self
            .http
            .post(self.endpoint(method))
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::EmbeddingUnavailable(format!("Gemini request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::EmbeddingUnavailable(format!(
                "Gemini returned {}: {}",
                status, body
            )));
        }

        response.json::<R>().await.map_err(|e| {
            AppError::EmbeddingUnavailable(format!("Unexpected Gemini embedding response: {}", e))
        })
    }

    fn check_dimensions(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimensions {
            return Err(AppError::EmbeddingUnavailable(format!(
                "expected {}-dimensional embedding, got {}",
                self.dimensions,
                vector.len()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl EmbeddingService for GeminiEmbeddings {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            let request = BatchEmbedRequest {
                requests: batch
                    .iter()
                    .map(|text| EmbedRequest {
                        model: &self.model,
                        content: Content {
                            parts: [Part { text }],
                        },
                        task_type: "RETRIEVAL_DOCUMENT",
                    })
                    .collect(),
            };

            let response: BatchEmbedResponse = self.post("batchEmbedContents", &request).await?;
            if response.embeddings.len() != batch.len() {
                return Err(AppError::EmbeddingUnavailable(format!(
                    "requested {} embeddings, received {}",
                    batch.len(),
                    response.embeddings.len()
                )));
            }
            for embedding in response.embeddings {
                self.check_dimensions(&embedding.values)?;
                vectors.push(embedding.values);
            }
        }

        debug!(count = vectors.len(), "Embedded document batch");
        Ok(vectors)
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbedRequest {
            model: &self.model,
            content: Content {
                parts: [Part { text }],
            },
            task_type: "RETRIEVAL_QUERY",
        };
        let response: EmbedResponse = self.post("embedContent", &request).await?;
        self.check_dimensions(&response.embedding.values)?;
        Ok(response.embedding.values)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
