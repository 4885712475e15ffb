use crate::types::Result;
use crate::utils::fs::{read_json_opt, write_json_atomic};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

/// Last ingested commit of a repository: `{ "repo": ..., "commit": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watermark {
    /// `owner/repo`
    pub repo: String,
    pub commit: String,
}

/// The single persisted watermark record.
#[derive(Debug, Clone)]
pub struct WatermarkStore {
    path: PathBuf,
}

impl WatermarkStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The stored watermark. An unreadable record counts as absent, which
    /// leads to a full ingestion.
    pub async fn load(&self) -> Option<Watermark> {
        match read_json_opt(&self.path).await {
            Ok(watermark) => watermark,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring unreadable watermark");
                None
            }
        }
    }

    pub async fn save(&self, watermark: &Watermark) -> Result<()> {
        write_json_atomic(&self.path, watermark).await
    }
}
