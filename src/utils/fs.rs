//! JSON file persistence helpers.
//!
//! Every artifact is rewritten as a whole file through a temporary sibling and
//! a rename (see [`docent_vector::write_atomic`]), so readers see either the
//! previous contents or the new ones.

use crate::types::{AppError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

pub use docent_vector::write_atomic;

/// Serialize `value` as pretty JSON and replace the file at `path`.
pub async fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value)
        .map_err(|e| AppError::Internal(format!("Failed to serialize {}: {}", path.display(), e)))?;
    write_atomic(path, &json)
        .await
        .map_err(|e| AppError::Persistence(format!("Failed to write {}: {}", path.display(), e)))
}

/// Read and parse a JSON file, returning `None` when it does not exist.
pub async fn read_json_opt<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let data = match tokio::fs::read(path).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(AppError::Persistence(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            )))
        }
    };

    serde_json::from_slice(&data)
        .map(Some)
        .map_err(|e| AppError::Persistence(format!("Failed to parse {}: {}", path.display(), e)))
}
