//! TOML + environment configuration for docent
//!
//! The configuration file (`docent.toml` by default) holds paths, endpoints and
//! tuning knobs. Secrets never live in the file: each section names the
//! environment variable that holds its key, and [`Config::load`] resolves them
//! once at start-up (after reading `.env` with dotenvy). The resolved
//! [`Config`] is then passed by reference to every client constructor.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::types::AppError;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' is not set")]
    MissingEnvVar(String),
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::InvalidConfiguration(err.to_string())
    }
}

/// Root configuration structure loaded from docent.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Primary completion service
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Fallback completion service
    #[serde(default)]
    pub fallback: FallbackConfig,

    #[serde(default)]
    pub repository: RepositoryConfig,

    #[serde(default)]
    pub rag: RagConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Secrets resolved from the environment, never serialized
    #[serde(skip)]
    pub secrets: Secrets,
}

// ============= Storage Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding index.bin, metadata.json and doc_id_map.json
    #[serde(default = "default_index_dir")]
    pub index_dir: PathBuf,

    #[serde(default = "default_watermark_path")]
    pub watermark_path: PathBuf,

    /// Root directory of per-session conversation files
    #[serde(default = "default_conversations_dir")]
    pub conversations_dir: PathBuf,
}

fn default_index_dir() -> PathBuf {
    PathBuf::from("./data/index")
}

fn default_watermark_path() -> PathBuf {
    PathBuf::from("./data/last_commit.json")
}

fn default_conversations_dir() -> PathBuf {
    PathBuf::from("./data/conversations")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            index_dir: default_index_dir(),
            watermark_path: default_watermark_path(),
            conversations_dir: default_conversations_dir(),
        }
    }
}

// ============= Embedding Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_gemini_base")]
    pub base_url: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    /// Maximum texts per batchEmbedContents request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_google_key_env")]
    pub api_key_env: String,
}

fn default_gemini_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_embedding_model() -> String {
    "models/embedding-001".to_string()
}

fn default_dimensions() -> usize {
    docent_vector::DEFAULT_DIMENSIONS
}

fn default_batch_size() -> usize {
    100
}

fn default_google_key_env() -> String {
    "GOOGLE_API_KEY".to_string()
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: default_gemini_base(),
            model: default_embedding_model(),
            dimensions: default_dimensions(),
            batch_size: default_batch_size(),
            api_key_env: default_google_key_env(),
        }
    }
}

// ============= Completion Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    #[serde(default = "default_openrouter_base")]
    pub base_url: String,

    #[serde(default = "default_completion_model")]
    pub model: String,

    /// Environment variable that overrides `model` when set
    #[serde(default = "default_model_env")]
    pub model_env: String,

    #[serde(default = "default_openrouter_key_env")]
    pub api_key_env: String,
}

fn default_openrouter_base() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_completion_model() -> String {
    "openai/gpt-4o-mini".to_string()
}

fn default_model_env() -> String {
    "MODEL_NAME".to_string()
}

fn default_openrouter_key_env() -> String {
    "OPENROUTER_API_KEY".to_string()
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: default_openrouter_base(),
            model: default_completion_model(),
            model_env: default_model_env(),
            api_key_env: default_openrouter_key_env(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    #[serde(default = "default_gemini_base")]
    pub base_url: String,

    #[serde(default = "default_fallback_model")]
    pub model: String,

    #[serde(default = "default_google_key_env")]
    pub api_key_env: String,
}

fn default_fallback_model() -> String {
    "gemini-2.5-flash".to_string()
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            base_url: default_gemini_base(),
            model: default_fallback_model(),
            api_key_env: default_google_key_env(),
        }
    }
}

// ============= Repository Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    #[serde(default = "default_github_api")]
    pub api_base: String,

    #[serde(default = "default_github_raw")]
    pub raw_base: String,

    /// Optional token for private repositories and higher rate limits
    #[serde(default)]
    pub token_env: Option<String>,

    /// Extensions (with leading dot) ingested from repositories
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

fn default_github_api() -> String {
    "https://api.github.com".to_string()
}

fn default_github_raw() -> String {
    "https://raw.githubusercontent.com".to_string()
}

fn default_allowed_extensions() -> Vec<String> {
    [".md", ".txt", ".pdf", ".mdx"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            api_base: default_github_api(),
            raw_base: default_github_raw(),
            token_env: None,
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

// ============= RAG Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Words per chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Words shared by consecutive chunks
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_chunk_size() -> usize {
    500
}

fn default_chunk_overlap() -> usize {
    100
}

fn default_top_k() -> usize {
    5
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            top_k: default_top_k(),
        }
    }
}

// ============= HTTP / Logging Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Timeout applied to every outbound request
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    60
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// "pretty" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// ============= Secrets =============

/// Keys and model name resolved from the environment.
#[derive(Clone, Default)]
pub struct Secrets {
    pub embedding_key: Option<String>,
    pub completion_key: Option<String>,
    pub completion_model: Option<String>,
    pub fallback_key: Option<String>,
    pub repository_token: Option<String>,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("Secrets")
            .field("embedding_key", &redact(&self.embedding_key))
            .field("completion_key", &redact(&self.completion_key))
            .field("completion_model", &self.completion_model)
            .field("fallback_key", &redact(&self.fallback_key))
            .field("repository_token", &redact(&self.repository_token))
            .finish()
    }
}

impl Config {
    /// Load configuration from a TOML file and resolve secrets from the
    /// process environment.
    ///
    /// A missing file is not an error: every setting has a default.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let path = path.as_ref();
        let mut config = if path.exists() {
            let content = fs::read_to_string(path)?;
            Self::from_toml(&content)?
        } else {
            debug!(path = %path.display(), "No configuration file, using defaults");
            Self::default()
        };

        config.resolve_secrets_with(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Fill [`Secrets`] using `lookup` to read environment variables.
    pub fn resolve_secrets_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        self.secrets = Secrets {
            embedding_key: non_empty(&self.embedding.api_key_env),
            completion_key: non_empty(&self.completion.api_key_env),
            completion_model: non_empty(&self.completion.model_env),
            fallback_key: non_empty(&self.fallback.api_key_env),
            repository_token: self.repository.token_env.as_deref().and_then(non_empty),
        };
    }

    /// Check internal consistency. Secrets are checked lazily by
    /// the `*_key` accessors, when a client needing them is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rag.chunk_overlap >= self.rag.chunk_size {
            return Err(ConfigError::ValidationError(format!(
                "rag.chunk_overlap ({}) must be smaller than rag.chunk_size ({})",
                self.rag.chunk_overlap, self.rag.chunk_size
            )));
        }
        if self.embedding.dimensions == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.dimensions must be > 0".to_string(),
            ));
        }
        if self.embedding.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.batch_size must be > 0".to_string(),
            ));
        }
        if self.rag.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "rag.top_k must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn embedding_key(&self) -> Result<&str, ConfigError> {
        self.secrets
            .embedding_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar(self.embedding.api_key_env.clone()))
    }

    pub fn completion_key(&self) -> Result<&str, ConfigError> {
        self.secrets
            .completion_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar(self.completion.api_key_env.clone()))
    }

    pub fn fallback_key(&self) -> Result<&str, ConfigError> {
        self.secrets
            .fallback_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar(self.fallback.api_key_env.clone()))
    }

    /// Completion model: the environment override if present, else the file value.
    pub fn completion_model(&self) -> &str {
        self.secrets
            .completion_model
            .as_deref()
            .unwrap_or(&self.completion.model)
    }

    pub fn index_path(&self) -> PathBuf {
        self.storage.index_dir.join("index.bin")
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.storage.index_dir.join("metadata.json")
    }

    pub fn doc_id_map_path(&self) -> PathBuf {
        self.storage.index_dir.join("doc_id_map.json")
    }
}
