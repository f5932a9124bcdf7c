//! Materialized ID list side file
//!
//! The comment aggregation needs every user ID. The list is derived once from
//! the `user` dataset's chunks and cached as a JSON array of integers; later
//! runs read the cached file and never rewrite it.

use crate::output::chunk::chunk_index;
use crate::HarvestError;
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;

/// Reads a cached ID list
pub async fn load_id_list(path: &Path) -> Result<Vec<u64>, HarvestError> {
    let content = tokio::fs::read(path).await?;
    serde_json::from_slice(&content).map_err(|e| {
        HarvestError::IdList(format!(
            "{} is not a JSON array of integers: {}",
            path.display(),
            e
        ))
    })
}

/// Loads the cached ID list, materializing it from user chunks if it is absent
///
/// # Arguments
///
/// * `path` - Side file location
/// * `user_chunk_dir` - Directory holding the `user` dataset's chunks
pub async fn load_or_materialize(
    path: &Path,
    user_chunk_dir: &Path,
) -> Result<Vec<u64>, HarvestError> {
    if tokio::fs::try_exists(path).await? {
        let ids = load_id_list(path).await?;
        tracing::info!("Loaded {} IDs from {}", ids.len(), path.display());
        return Ok(ids);
    }

    tracing::info!(
        "ID list {} not found, deriving it from {}",
        path.display(),
        user_chunk_dir.display()
    );
    let ids = collect_ids_from_chunks(user_chunk_dir).await?;
    write_id_list(path, &ids).await?;
    tracing::info!("Materialized {} IDs to {}", ids.len(), path.display());
    Ok(ids)
}

/// Collects unique `id` values from every chunk in a directory
///
/// Chunks are read in index order; the first occurrence of an ID fixes its
/// position. IDs may be JSON integers or numeric strings.
pub async fn collect_ids_from_chunks(dir: &Path) -> Result<Vec<u64>, HarvestError> {
    let mut chunks = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| {
        HarvestError::IdList(format!(
            "cannot read user chunks in {}: {} (harvest the user dataset first)",
            dir.display(),
            e
        ))
    })?;
    while let Some(entry) = entries.next_entry().await? {
        if let Some(index) = entry.file_name().to_str().and_then(chunk_index) {
            chunks.push((index, entry.path()));
        }
    }
    chunks.sort_unstable_by_key(|(index, _)| *index);

    if chunks.is_empty() {
        return Err(HarvestError::IdList(format!(
            "no user chunks in {} (harvest the user dataset first)",
            dir.display()
        )));
    }

    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    for (_, path) in chunks {
        let content = tokio::fs::read(&path).await?;
        let records: Vec<Value> = serde_json::from_slice(&content).map_err(|e| {
            HarvestError::IdList(format!("malformed chunk {}: {}", path.display(), e))
        })?;

        for id in records.iter().filter_map(|r| r.get("id").and_then(parse_id)) {
            if seen.insert(id) {
                ids.push(id);
            }
        }
    }

    Ok(ids)
}

fn parse_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Writes the ID list atomically
async fn write_id_list(path: &Path, ids: &[u64]) -> Result<(), HarvestError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, serde_json::to_vec(ids)?).await?;
    tokio::fs::rename(&tmp_path, path).await?;
    Ok(())
}
