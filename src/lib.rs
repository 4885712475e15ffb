//! # docent - retrieval-augmented answers over a document library
//!
//! docent ingests documents from a hosted repository or from uploaded files,
//! keeps them in a persistent vector index, and answers questions grounded in
//! the passages it retrieves.
//!
//! ## Overview
//!
//! docent can be used in two ways:
//!
//! 1. **As a command-line tool** - Run the `docent` binary
//! 2. **As a library** - Wire the components into your own service
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use docent::{
//!     llm::{FallbackChain, Provider},
//!     orchestrator::DirectAnswerer,
//!     rag::{GeminiEmbeddings, RetrievalStore, TextChunker},
//!     utils::{config::Config, http_client},
//! };
//! use std::sync::Arc;
//!
//! let config = Config::load("docent.toml")?;
//! let http = http_client(&config)?;
//!
//! let embedder = Arc::new(GeminiEmbeddings::from_config(&config, http.clone())?);
//! let chunker = TextChunker::new(config.rag.chunk_size, config.rag.chunk_overlap)?;
//! let store = Arc::new(RetrievalStore::open(&config.storage.index_dir, chunker, embedder).await?);
//!
//! let chain = FallbackChain::new(
//!     Provider::primary(&config)?.create_client(http.clone()),
//!     Provider::fallback(&config)?.create_client(http),
//! );
//! let answer = DirectAnswerer::new(store, chain, config.rag.top_k)
//!     .answer("What motivates a Type 5?")
//!     .await?;
//! println!("{} ({:?})", answer.answer, answer.sources);
//! ```
//!
//! ## Modules
//!
//! - [`rag`] - Chunking, embeddings and the persisted retrieval store
//! - [`ingest`] - Repository and upload ingestion
//! - [`llm`] - Completion service clients and the fallback chain
//! - [`memory`] - Persisted conversation sessions
//! - [`orchestrator`] - Direct Q&A and guided conversations
//! - [`types`] - Common types and error handling
//!
//! ## Storage layout
//!
//! Everything lives under the directories named in `docent.toml`:
//!
//! - `index.bin`, `metadata.json`, `doc_id_map.json` - the retrieval store
//! - `last_commit.json` - the repository ingestion watermark
//! - `<conversations>/<profile>/<session>.json` - conversation histories

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// Command-line parsing and terminal output.
pub mod cli;
/// Document ingestion from repositories and uploads.
pub mod ingest;
/// Completion service clients and fallback.
pub mod llm;
/// Conversation session persistence.
pub mod memory;
/// Retrieval-augmented answering flows.
pub mod orchestrator;
/// Retrieval Augmented Generation (RAG) components.
pub mod rag;
/// Core types (messages, passages, errors).
pub mod types;
/// Configuration and filesystem utilities.
pub mod utils;

// Re-export commonly used types
pub use ingest::{IngestionCoordinator, IngestionReport, UploadOutcome};
pub use llm::{CompletionService, FallbackChain, Provider};
pub use memory::{ConversationSession, SessionStore};
pub use orchestrator::{DirectAnswerer, PromptProfile, SessionOrchestrator, TurnResult};
pub use rag::{EmbeddingService, RetrievalStore, TextChunker};
pub use types::{AnswerWithSources, AppError, Message, Result, RetrievedPassage};
pub use utils::config::Config;
