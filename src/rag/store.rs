//! RetrievalStore: the single owner of the vector index and the document store.
//!
//! Three artifacts live in the store directory:
//!
//! - `index.bin`: the [`FlatIndex`] blob
//! - `metadata.json`: `{ "<doc id>": { "content": ... } }`
//! - `doc_id_map.json`: `["<doc id>", ...]`, array index = vector position
//!
//! Mutations are serialized by one async writer lock. Readers take a short
//! read lock on the in-memory state, so a search sees the state before or
//! after a write, never a half-applied one. Embedding happens before the
//! state is touched: a failed embedding call leaves everything unchanged.

use crate::rag::chunker::TextChunker;
use crate::rag::document_store::DocumentStore;
use crate::rag::embeddings::EmbeddingService;
use crate::types::{AppError, Result, RetrievedPassage};
use crate::utils::fs::{read_json_opt, write_atomic};
use docent_vector::{FlatIndex, Position};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

const INDEX_FILE: &str = "index.bin";
const METADATA_FILE: &str = "metadata.json";
const DOC_ID_MAP_FILE: &str = "doc_id_map.json";

/// Document and vector counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub documents: usize,
    pub vectors: usize,
}

struct StoreState {
    index: FlatIndex,
    documents: DocumentStore,
    /// Owning document id per vector position
    doc_ids: Vec<String>,
}

impl StoreState {
    fn positions_of(&self, doc_id: &str) -> Vec<Position> {
        self.doc_ids
            .iter()
            .enumerate()
            .filter(|(_, id)| id.as_str() == doc_id)
            .map(|(position, _)| position)
            .collect()
    }

    /// Drop a document and its vectors. Returns the number of vectors
    /// removed, or `None` when the id is unknown.
    fn remove(&mut self, doc_id: &str) -> Option<usize> {
        let positions = self.positions_of(doc_id);
        let existed = self.documents.remove(doc_id).is_some();
        if !existed && positions.is_empty() {
            return None;
        }

        let removed = self.index.remove_positions(&positions);
        let doomed: HashSet<Position> = positions.into_iter().collect();
        let mut position = 0;
        self.doc_ids.retain(|_| {
            let keep = !doomed.contains(&position);
            position += 1;
            keep
        });
        Some(removed)
    }

    fn add(&mut self, doc_id: &str, content: &str, vectors: &[Vec<f32>]) -> Result<()> {
        self.index.add(vectors)?;
        self.doc_ids
            .extend(std::iter::repeat_n(doc_id.to_string(), vectors.len()));
        self.documents.insert(doc_id, content);
        Ok(())
    }

    /// Ids of every document, or vector owner, accepted by `matches`. Sorted.
    fn ids_matching(&self, matches: impl Fn(&str) -> bool) -> Vec<String> {
        let mut ids: Vec<String> = self
            .documents
            .ids()
            .chain(self.doc_ids.iter().map(String::as_str))
            .filter(|id| matches(*id))
            .map(str::to_string)
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }
}

/// A document with its chunk embeddings, ready to be added.
struct Embedded<'a> {
    doc_id: &'a str,
    content: &'a str,
    vectors: Vec<Vec<f32>>,
}

/// Encoded artifacts, ready to be written outside the state lock.
struct Snapshot {
    index: Vec<u8>,
    metadata: Vec<u8>,
    doc_ids: Vec<u8>,
}

pub struct RetrievalStore {
    dir: PathBuf,
    chunker: TextChunker,
    embedder: Arc<dyn EmbeddingService>,
    state: RwLock<StoreState>,
    writer: Mutex<()>,
}

impl RetrievalStore {
    /// Open the store in `dir`, loading whatever artifacts exist.
    ///
    /// Missing files start empty; a corrupt file is a `Persistence` error.
    pub async fn open(
        dir: impl Into<PathBuf>,
        chunker: TextChunker,
        embedder: Arc<dyn EmbeddingService>,
    ) -> Result<Self> {
        let dir = dir.into();
        let index = FlatIndex::load_or_new(&dir.join(INDEX_FILE), embedder.dimensions()).await?;
        let documents: DocumentStore = read_json_opt(&dir.join(METADATA_FILE))
            .await?
            .unwrap_or_default();
        let doc_ids: Vec<String> = read_json_opt(&dir.join(DOC_ID_MAP_FILE))
            .await?
            .unwrap_or_default();

        if doc_ids.len() != index.len() {
            warn!(
                vectors = index.len(),
                doc_ids = doc_ids.len(),
                "Index and id map lengths differ; unmatched positions will be skipped"
            );
        }

        info!(
            dir = %dir.display(),
            documents = documents.len(),
            vectors = index.len(),
            "Opened retrieval store"
        );

        Ok(Self {
            dir,
            chunker,
            embedder,
            state: RwLock::new(StoreState {
                index,
                documents,
                doc_ids,
            }),
            writer: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Chunk, embed and add a document.
    ///
    /// Does not remove a previous version of `doc_id`; use
    /// [`RetrievalStore::replace_document`] or remove first.
    #[instrument(skip(self, content), fields(doc_id = %doc_id))]
    pub async fn upsert(&self, doc_id: &str, content: &str) -> Result<usize> {
        validate_doc_id(doc_id)?;
        let vectors = self.embed_chunks(content).await?;

        let _guard = self.writer.lock().await;
        {
            let mut state = self.state.write();
            state.index.validate_all(&vectors)?;
            state.add(doc_id, content, &vectors)?;
        }
        info!(chunks = vectors.len(), "Upserted document");
        self.persist().await?;
        Ok(vectors.len())
    }

    /// Remove any previous version of `doc_id` and add `content`, as one
    /// step for other writers.
    #[instrument(skip(self, content), fields(doc_id = %doc_id))]
    pub async fn replace_document(&self, doc_id: &str, content: &str) -> Result<usize> {
        validate_doc_id(doc_id)?;
        let vectors = self.embed_chunks(content).await?;

        let _guard = self.writer.lock().await;
        {
            let mut state = self.state.write();
            state.index.validate_all(&vectors)?;
            if let Some(removed) = state.remove(doc_id) {
                debug!(removed, "Removed previous version");
            }
            state.add(doc_id, content, &vectors)?;
        }
        info!(chunks = vectors.len(), "Replaced document");
        self.persist().await?;
        Ok(vectors.len())
    }

    /// Nearest passages for `query`, nearest first.
    ///
    /// Positions without a resolvable document are skipped. Results are not
    /// deduplicated.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievedPassage>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let vector = self.embedder.embed_one(query).await?;

        let state = self.state.read();
        let hits = state.index.search(&vector, k)?;
        let passages: Vec<RetrievedPassage> = hits
            .into_iter()
            .filter_map(|hit| {
                let doc_id = state.doc_ids.get(hit.position)?;
                let entry = state.documents.get(doc_id)?;
                Some(RetrievedPassage {
                    doc_id: doc_id.clone(),
                    content: entry.content.clone(),
                })
            })
            .collect();
        debug!(results = passages.len(), "Search complete");
        Ok(passages)
    }

    /// Remove a document and all of its vectors. Unknown ids are a no-op.
    ///
    /// Returns whether the document existed.
    #[instrument(skip(self))]
    pub async fn remove_document(&self, doc_id: &str) -> Result<bool> {
        let _guard = self.writer.lock().await;
        let removed = self.state.write().remove(doc_id);
        match removed {
            Some(vectors) => {
                info!(vectors, "Removed document");
                self.persist().await?;
                Ok(true)
            }
            None => {
                debug!("Document not present, nothing to remove");
                Ok(false)
            }
        }
    }

    /// Remove every document accepted by `matches` and add `documents`, as
    /// one step for other writers.
    ///
    /// Every document is embedded before the state is touched, so a failed
    /// embedding call or a rejected vector leaves the store unchanged.
    /// Returns the removed ids.
    #[instrument(skip_all, fields(documents = documents.len()))]
    pub async fn replace_documents_matching(
        &self,
        matches: impl Fn(&str) -> bool,
        documents: &[(String, String)],
    ) -> Result<Vec<String>> {
        let mut embedded = Vec::with_capacity(documents.len());
        for (doc_id, content) in documents {
            validate_doc_id(doc_id)?;
            embedded.push(Embedded {
                doc_id,
                content,
                vectors: self.embed_chunks(content).await?,
            });
        }

        let _guard = self.writer.lock().await;
        let removed = {
            let mut state = self.state.write();
            for document in &embedded {
                state.index.validate_all(&document.vectors)?;
            }
            let removed = state.ids_matching(&matches);
            for id in &removed {
                state.remove(id);
            }
            for document in &embedded {
                state.add(document.doc_id, document.content, &document.vectors)?;
            }
            removed
        };

        info!(
            removed = removed.len(),
            added = embedded.len(),
            "Replaced matching documents"
        );
        self.persist().await?;
        Ok(removed)
    }

    pub fn contains(&self, doc_id: &str) -> bool {
        self.state.read().documents.contains(doc_id)
    }

    pub fn document_ids(&self) -> Vec<String> {
        self.state.read().documents.ids().map(str::to_string).collect()
    }

    pub fn stats(&self) -> StoreStats {
        let state = self.state.read();
        StoreStats {
            documents: state.documents.len(),
            vectors: state.index.len(),
        }
    }

    /// Write all three artifacts.
    pub async fn flush(&self) -> Result<()> {
        let _guard = self.writer.lock().await;
        self.persist().await
    }

    /// Flush and release the store.
    pub async fn close(self) -> Result<()> {
        self.flush().await?;
        info!(dir = %self.dir.display(), "Closed retrieval store");
        Ok(())
    }

    async fn embed_chunks(&self, content: &str) -> Result<Vec<Vec<f32>>> {
        let chunks = self.chunker.chunk(content);
        if chunks.is_empty() {
            return Ok(Vec::new());
        }
        let vectors = self.embedder.embed_batch(&chunks).await?;
        if vectors.len() != chunks.len() {
            return Err(AppError::EmbeddingUnavailable(format!(
                "embedded {} of {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }
        Ok(vectors)
    }

    fn snapshot(&self) -> Result<Snapshot> {
        let state = self.state.read();
        let encode = |what: &str, e: serde_json::Error| {
            AppError::Internal(format!("Failed to serialize {}: {}", what, e))
        };
        Ok(Snapshot {
            index: state.index.to_bytes()?,
            metadata: serde_json::to_vec(&state.documents).map_err(|e| encode("metadata", e))?,
            doc_ids: serde_json::to_vec(&state.doc_ids).map_err(|e| encode("id map", e))?,
        })
    }

    /// Caller must hold the writer lock.
    async fn persist(&self) -> Result<()> {
        let snapshot = self.snapshot()?;
        let files = [
            (INDEX_FILE, snapshot.index),
            (METADATA_FILE, snapshot.metadata),
            (DOC_ID_MAP_FILE, snapshot.doc_ids),
        ];

        let mut failures = Vec::new();
        for (name, bytes) in files {
            let path = self.dir.join(name);
            if let Err(e) = write_atomic(&path, &bytes).await {
                warn!(path = %path.display(), error = %e, "Failed to persist store artifact");
                failures.push(format!("{}: {}", name, e));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(AppError::Persistence(failures.join("; ")))
        }
    }
}

fn validate_doc_id(doc_id: &str) -> Result<()> {
    if doc_id.trim().is_empty() {
        return Err(AppError::BadRequest("document id must not be empty".to_string()));
    }
    Ok(())
}
