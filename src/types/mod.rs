use serde::{Deserialize, Serialize};

// ============= Conversation Types =============

/// A single message of a persisted conversation.
///
/// Serialized as `{ "role": ..., "content": ... }`, the on-disk session format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }

    pub fn tool(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Tool,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::Tool => "tool",
        }
    }
}

// ============= RAG Types =============

/// A passage returned by the retrieval store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    pub doc_id: String,
    pub content: String,
}

/// Result of the stateless question-answering flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerWithSources {
    pub answer: String,
    /// Source document ids, deduplicated, in order of first appearance.
    pub sources: Vec<String>,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Missing or invalid caller input. Raised before any external call.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The embedding service failed or returned an unusable result.
    #[error("Embedding service unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// A completion service or the remote repository host failed.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// A disk write failed. The in-memory effect of the operation stands.
    #[error("Persistence failure: {0}")]
    Persistence(String),

    /// A single item of a batch failed; the batch went on.
    #[error("Ingestion failed for '{path}': {reason}")]
    PartialIngestion { path: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// True for errors after which the operation still counts as done.
    pub fn is_non_fatal(&self) -> bool {
        matches!(
            self,
            AppError::Persistence(_) | AppError::PartialIngestion { .. }
        )
    }
}

impl From<docent_vector::Error> for AppError {
    fn from(err: docent_vector::Error) -> Self {
        match err {
            docent_vector::Error::Io(e) => AppError::Persistence(e.to_string()),
            docent_vector::Error::Persistence(msg) => AppError::Persistence(msg),
            docent_vector::Error::Configuration(msg) => AppError::InvalidConfiguration(msg),
            other => AppError::Internal(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
