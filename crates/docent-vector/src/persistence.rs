//! Persistence layer for docent-vector.
//!
//! The index is written as a single binary blob (postcard) and every write
//! goes through a temporary sibling file that is renamed over the target, so
//! a crash leaves either the previous file or the new one, never a torn one.

use crate::error::{Error, Result};
use crate::index::FlatIndex;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

const SNAPSHOT_VERSION: u32 = 1;

/// On-disk representation of a [`FlatIndex`].
#[derive(Debug, Serialize, Deserialize)]
struct IndexSnapshot {
    version: u32,
    dimensions: u32,
    data: Vec<f32>,
}

impl FlatIndex {
    /// Serialize the full index into a blob.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let snapshot = IndexSnapshot {
            version: SNAPSHOT_VERSION,
            dimensions: self.dimensions() as u32,
            data: self.raw().to_vec(),
        };
        postcard::to_allocvec(&snapshot)
            .map_err(|e| Error::Persistence(format!("Failed to encode index: {}", e)))
    }

    /// Rebuild an index from a blob produced by [`FlatIndex::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let snapshot: IndexSnapshot = postcard::from_bytes(bytes)
            .map_err(|e| Error::Persistence(format!("Failed to decode index: {}", e)))?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(Error::Persistence(format!(
                "Unsupported index snapshot version {}",
                snapshot.version
            )));
        }
        FlatIndex::from_raw(snapshot.dimensions as usize, snapshot.data)
    }

    /// Write the index to `path`, replacing any previous file.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        write_atomic(path, &bytes).await?;
        info!(path = %path.display(), vectors = self.len(), "Saved index");
        Ok(())
    }

    /// Read an index previously written with [`FlatIndex::save`].
    pub async fn load(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let index = Self::from_bytes(&bytes)?;
        debug!(path = %path.display(), vectors = index.len(), "Loaded index");
        Ok(index)
    }

    /// Load the index at `path`, or start empty when no file exists.
    ///
    /// A stored index with different dimensions is rejected.
    pub async fn load_or_new(path: &Path, dimensions: usize) -> Result<Self> {
        if !tokio::fs::try_exists(path).await? {
            info!(path = %path.display(), dimensions, "No index on disk, starting empty");
            return Self::new(dimensions);
        }
        let index = Self::load(path).await?;
        if index.dimensions() != dimensions {
            return Err(Error::DimensionMismatch {
                expected: dimensions,
                actual: index.dimensions(),
            });
        }
        Ok(index)
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut tmp: OsString = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

/// Write `bytes` to `path` via a temporary file and rename.
///
/// Parent directories are created as needed.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let tmp_path = temp_sibling(path);
    let mut file = tokio::fs::File::create(&tmp_path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);

    tokio::fs::rename(&tmp_path, path).await
}
