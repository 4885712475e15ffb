//! Retrieval: chunking, embeddings and the persisted retrieval store.
//!
//! # Module Structure
//!
//! - [`rag::chunker`](crate::rag::chunker) - Overlapping word-window chunking
//! - [`rag::embeddings`](crate::rag::embeddings) - Embedding service trait and Gemini client
//! - [`rag::document_store`](crate::rag::document_store) - Document id to full content
//! - [`rag::store`](crate::rag::store) - The [`RetrievalStore`] façade over index and documents
//!
//! # Example
//!
//! ```ignore
//! use docent::rag::{RetrievalStore, TextChunker};
//!
//! let store = RetrievalStore::open("./data/index", TextChunker::new(500, 100)?, embedder).await?;
//! store.replace_document("docs/intro.md", &text).await?;
//! let passages = store.search("how do I start", 5).await?;
//! ```

pub mod chunker;
pub mod document_store;
pub mod embeddings;
pub mod store;

pub use chunker::TextChunker;
pub use embeddings::{EmbeddingService, GeminiEmbeddings};
pub use store::{RetrievalStore, StoreStats};
