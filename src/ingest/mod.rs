//! Document ingestion from hosted repositories and direct uploads.
//!
//! Repository passes are incremental: the last ingested commit is kept as a
//! watermark and only the files changed since then are re-indexed. A pass
//! that cannot enumerate its changes (commit lookup, diff or tree listing
//! failed) aborts without touching the watermark; a single bad file is
//! logged and skipped.

pub mod extract;
pub mod github;
pub mod watermark;

use crate::rag::RetrievalStore;
use crate::types::{AppError, Result};
use base64::Engine;
use extract::{extension_of, ExtractError, TextExtractor};
use github::{RepositoryHost, RepositoryRef};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use watermark::{Watermark, WatermarkStore};

pub use extract::DocumentExtractor;
pub use github::GitHubClient;

/// Extensions accepted by [`IngestionCoordinator::ingest_upload`].
pub const UPLOAD_EXTENSIONS: &[&str] = &[".pdf", ".docx", ".txt", ".md", ".html"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestionMode {
    /// The watermark already matched the latest commit
    UpToDate,
    Full,
    Incremental,
}

/// What a repository pass did.
#[derive(Debug, Serialize)]
pub struct IngestionReport {
    pub repository: String,
    pub commit: String,
    pub mode: IngestionMode,
    pub ingested: Vec<String>,
    pub removed: Vec<String>,
    /// Changed paths ignored for their extension or empty content
    pub skipped: Vec<String>,
    /// Per-file failures; the pass continued past each one
    #[serde(serialize_with = "serialize_errors")]
    pub failures: Vec<AppError>,
    /// Non-fatal persistence problems
    pub warnings: Vec<String>,
}

fn serialize_errors<S: serde::Serializer>(errors: &[AppError], s: S) -> std::result::Result<S::Ok, S::Error> {
    s.collect_seq(errors.iter().map(|e| e.to_string()))
}

impl IngestionReport {
    fn new(repository: String, commit: String, mode: IngestionMode) -> Self {
        Self {
            repository,
            commit,
            mode,
            ingested: Vec::new(),
            removed: Vec::new(),
            skipped: Vec::new(),
            failures: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// Result of a direct upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UploadOutcome {
    Ingested {
        /// Pages are stored as `<doc_id>_page_<n>`
        doc_id: String,
        pages: usize,
    },
    Unsupported {
        extension: String,
    },
    /// No text could be found in the file
    Empty,
}

pub struct IngestionCoordinator {
    store: Arc<RetrievalStore>,
    host: Arc<dyn RepositoryHost>,
    extractor: Arc<dyn TextExtractor>,
    watermark: WatermarkStore,
    allowed_extensions: HashSet<String>,
}

impl IngestionCoordinator {
    pub fn new(
        store: Arc<RetrievalStore>,
        host: Arc<dyn RepositoryHost>,
        extractor: Arc<dyn TextExtractor>,
        watermark: WatermarkStore,
        allowed_extensions: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            store,
            host,
            extractor,
            watermark,
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|e| e.to_ascii_lowercase())
                .collect(),
        }
    }

    /// Bring the store up to date with `branch` of the repository at `repo_url`.
    #[instrument(skip(self))]
    pub async fn ingest_from_repository(&self, repo_url: &str, branch: &str) -> Result<IngestionReport> {
        if branch.trim().is_empty() {
            return Err(AppError::BadRequest("branch must not be empty".to_string()));
        }
        let repo = RepositoryRef::parse(repo_url)?;
        let full_name = repo.full_name();

        let latest = self.host.latest_commit(&repo, branch).await?;
        let previous = self
            .watermark
            .load()
            .await
            .filter(|w| w.repo == full_name);

        if previous.as_ref().is_some_and(|w| w.commit == latest) {
            info!(repository = %full_name, commit = %latest, "No new commit, skipping ingestion");
            return Ok(IngestionReport::new(full_name, latest, IngestionMode::UpToDate));
        }

        let (mode, changed, removed) = match &previous {
            Some(watermark) => {
                info!(
                    repository = %full_name,
                    from = %watermark.commit,
                    to = %latest,
                    "Incremental ingestion"
                );
                let changes = self.host.diff(&repo, &watermark.commit, &latest).await?;
                (IngestionMode::Incremental, changes.changed, changes.removed)
            }
            None => {
                info!(repository = %full_name, commit = %latest, "Full ingestion");
                let paths = self.host.fetch_full_tree(&repo, &latest).await?;
                (IngestionMode::Full, paths, Vec::new())
            }
        };

        let mut report = IngestionReport::new(full_name.clone(), latest.clone(), mode);

        for path in removed {
            match self.store.remove_document(&path).await {
                Ok(_) => report.removed.push(path),
                Err(e) if e.is_non_fatal() => {
                    report.warnings.push(e.to_string());
                    report.removed.push(path);
                }
                Err(e) => {
                    error!(path = %path, error = %e, "Failed to remove document");
                    report.failures.push(partial(&path, &e));
                }
            }
        }

        for path in changed {
            let extension = extension_of(&path);
            if !self.allowed_extensions.contains(&extension) {
                debug!(path = %path, "Skipping file with unsupported extension");
                report.skipped.push(path);
                continue;
            }

            match self.ingest_repository_file(&repo, &latest, &path, &extension).await {
                Ok(true) => report.ingested.push(path),
                Ok(false) => report.skipped.push(path),
                Err(e) if e.is_non_fatal() => {
                    report.warnings.push(e.to_string());
                    report.ingested.push(path);
                }
                Err(e) => {
                    warn!(path = %path, error = %e, "Failed to ingest file, continuing");
                    report.failures.push(partial(&path, &e));
                }
            }
        }

        let watermark = Watermark {
            repo: full_name,
            commit: latest,
        };
        if let Err(e) = self.watermark.save(&watermark).await {
            error!(error = %e, "Failed to persist ingestion watermark");
            report.warnings.push(e.to_string());
        }

        info!(
            ingested = report.ingested.len(),
            removed = report.removed.len(),
            skipped = report.skipped.len(),
            failures = report.failures.len(),
            "Ingestion complete"
        );
        Ok(report)
    }

    /// Returns `false` when the file yielded no text.
    async fn ingest_repository_file(
        &self,
        repo: &RepositoryRef,
        commit: &str,
        path: &str,
        extension: &str,
    ) -> Result<bool> {
        let bytes = self.host.fetch_file_content(repo, commit, path).await?;
        let text = self.extract(bytes, extension).await.map_err(|e| match e {
            ExtractError::Unsupported(ext) => {
                AppError::BadRequest(format!("unsupported file type: {}", ext))
            }
            other => AppError::BadRequest(other.to_string()),
        })?;

        if text.trim().is_empty() {
            debug!(path, "No text extracted, skipping");
            return Ok(false);
        }
        self.store.replace_document(path, &text).await?;
        Ok(true)
    }

    /// Ingest an uploaded file as one document per logical page.
    ///
    /// Previously ingested pages of the same file are replaced.
    #[instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    pub async fn ingest_upload(&self, bytes: &[u8], filename: &str) -> Result<UploadOutcome> {
        let doc_id = Path::new(filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AppError::BadRequest(format!("invalid filename '{}'", filename)))?
            .to_string();

        let extension = extension_of(filename);
        if !UPLOAD_EXTENSIONS.contains(&extension.as_str()) {
            info!(extension = %extension, "Unsupported upload type");
            return Ok(UploadOutcome::Unsupported { extension });
        }

        let text = match self.extract(bytes.to_vec(), &extension).await {
            Ok(text) => text,
            Err(ExtractError::Unsupported(extension)) => {
                return Ok(UploadOutcome::Unsupported { extension })
            }
            Err(e) => return Err(AppError::BadRequest(format!("{}: {}", filename, e))),
        };

        let pages = split_pages(&text);
        if pages.is_empty() {
            info!(doc_id = %doc_id, "Upload contained no text");
            return Ok(UploadOutcome::Empty);
        }
        info!(doc_id = %doc_id, pages = pages.len(), "Ingesting upload");

        let pages: Vec<(String, String)> = pages
            .into_iter()
            .enumerate()
            .map(|(i, page)| (page_id(&doc_id, i + 1), page))
            .collect();
        let previous = match self
            .store
            .replace_documents_matching(|id| is_page_of(id, &doc_id), &pages)
            .await
        {
            Ok(previous) => previous,
            Err(e) if e.is_non_fatal() => {
                warn!(doc_id = %doc_id, error = %e, "Pages stored in memory only");
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        if !previous.is_empty() {
            debug!(count = previous.len(), "Replaced previously uploaded pages");
        }

        Ok(UploadOutcome::Ingested {
            doc_id,
            pages: pages.len(),
        })
    }

    /// [`IngestionCoordinator::ingest_upload`] for a base64 payload.
    pub async fn ingest_upload_base64(&self, payload: &str, filename: &str) -> Result<UploadOutcome> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| AppError::BadRequest(format!("invalid base64 payload: {}", e)))?;
        self.ingest_upload(&bytes, filename).await
    }

    async fn extract(&self, bytes: Vec<u8>, extension: &str) -> std::result::Result<String, ExtractError> {
        let extractor = Arc::clone(&self.extractor);
        let extension = extension.to_string();
        tokio::task::spawn_blocking(move || extractor.extract(&bytes, &extension))
            .await
            .unwrap_or_else(|e| Err(ExtractError::Task(e.to_string())))
    }
}

fn partial(path: &str, err: &AppError) -> AppError {
    AppError::PartialIngestion {
        path: path.to_string(),
        reason: err.to_string(),
    }
}

fn page_id(doc_id: &str, number: usize) -> String {
    format!("{}_page_{}", doc_id, number)
}

/// Whether `id` is `<doc_id>_page_<n>`.
fn is_page_of(id: &str, doc_id: &str) -> bool {
    id.strip_prefix(doc_id)
        .and_then(|rest| rest.strip_prefix("_page_"))
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

/// Split text into pages at runs of two or more newlines, dropping blank pages.
pub fn split_pages(text: &str) -> Vec<String> {
    text.replace("\r\n", "\n")
        .split("\n\n")
        .map(str::trim)
        .filter(|page| !page.is_empty())
        .map(str::to_string)
        .collect()
}
