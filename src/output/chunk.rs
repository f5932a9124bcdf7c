//! Chunk writer: one JSON array file per work unit
//!
//! Chunks are named `page_{index}.json` inside the dataset directory. The name
//! depends only on the unit index, so re-running a unit replaces its chunk
//! wholesale. Writes go to `page_{index}.json.tmp` first and are renamed into
//! place, so a concurrent reader never sees a partial file.

use crate::projection::Record;
use crate::HarvestError;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

const CHUNK_PREFIX: &str = "page_";
const CHUNK_SUFFIX: &str = ".json";
const TMP_SUFFIX: &str = ".tmp";

/// File name of the chunk for a unit index
pub fn chunk_file_name(index: u64) -> String {
    format!("{CHUNK_PREFIX}{index}{CHUNK_SUFFIX}")
}

/// Parses the unit index back out of a chunk file name
///
/// Returns `None` for anything that is not a finished chunk, including
/// temporary files.
pub fn chunk_index(file_name: &str) -> Option<u64> {
    file_name
        .strip_prefix(CHUNK_PREFIX)?
        .strip_suffix(CHUNK_SUFFIX)?
        .parse()
        .ok()
}

/// Writes chunks for one dataset directory
#[derive(Debug, Clone)]
pub struct ChunkWriter {
    dir: PathBuf,
}

impl ChunkWriter {
    /// Opens a dataset directory, creating it if missing
    ///
    /// Leftover temporary files from an interrupted run are removed.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, HarvestError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        let writer = Self { dir };
        writer.cleanup_tmp_files().await?;
        Ok(writer)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn chunk_path(&self, index: u64) -> PathBuf {
        self.dir.join(chunk_file_name(index))
    }

    /// Serializes `records` as a compact JSON array and atomically replaces the chunk
    ///
    /// # Returns
    ///
    /// * `Ok(PathBuf)` - Path of the written chunk
    /// * `Err(HarvestError::ChunkWriteFailed)` - The write or rename failed
    pub async fn write_chunk(
        &self,
        index: u64,
        records: &[Record],
    ) -> Result<PathBuf, HarvestError> {
        let final_path = self.chunk_path(index);
        let tmp_path = self
            .dir
            .join(format!("{}{TMP_SUFFIX}", chunk_file_name(index)));

        let body = serde_json::to_vec(records)?;

        let result = async {
            let mut file = tokio::fs::File::create(&tmp_path).await?;
            file.write_all(&body).await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&tmp_path, &final_path).await
        }
        .await;

        if let Err(source) = result {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(HarvestError::ChunkWriteFailed {
                path: final_path,
                source,
            });
        }

        tracing::trace!("Wrote {} records to {}", records.len(), final_path.display());
        Ok(final_path)
    }

    /// Lists the indices of finished chunks, ascending
    pub async fn existing_indices(&self) -> Result<Vec<u64>, HarvestError> {
        let mut indices = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if let Some(index) = entry.file_name().to_str().and_then(chunk_index) {
                indices.push(index);
            }
        }
        indices.sort_unstable();
        Ok(indices)
    }

    /// Removes stale `.tmp` files in the dataset directory
    async fn cleanup_tmp_files(&self) -> Result<(), HarvestError> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "tmp") {
                tracing::warn!("Removing stale tmp file: {}", path.display());
                tokio::fs::remove_file(&path).await?;
            }
        }
        Ok(())
    }
}
