//! Shared fixtures for integration tests.

#![allow(dead_code)]

pub mod mocks;

use docent::ingest::watermark::WatermarkStore;
use docent::ingest::{DocumentExtractor, IngestionCoordinator};
use docent::rag::{RetrievalStore, TextChunker};
use mocks::{HashEmbedder, InMemoryRepositoryHost};
use std::path::Path;
use std::sync::Arc;

pub const DIMENSIONS: usize = 256;

pub fn embedder() -> Arc<HashEmbedder> {
    Arc::new(HashEmbedder::new(DIMENSIONS))
}

/// Store in `dir` with 50-word chunks overlapping by 10.
pub async fn open_store(dir: &Path, embedder: Arc<HashEmbedder>) -> Arc<RetrievalStore> {
    let chunker = TextChunker::new(50, 10).unwrap();
    Arc::new(RetrievalStore::open(dir, chunker, embedder).await.unwrap())
}

pub fn coordinator(
    store: Arc<RetrievalStore>,
    host: Arc<InMemoryRepositoryHost>,
    watermark_path: &Path,
) -> IngestionCoordinator {
    IngestionCoordinator::new(
        store,
        host,
        Arc::new(DocumentExtractor),
        WatermarkStore::new(watermark_path),
        [".md", ".txt", ".pdf", ".mdx"].iter().map(|e| e.to_string()),
    )
}

/// `n` distinct words, `prefix0 prefix1 ...`.
pub fn words(prefix: &str, n: usize) -> String {
    (0..n)
        .map(|i| format!("{}{}", prefix, i))
        .collect::<Vec<_>>()
        .join(" ")
}
