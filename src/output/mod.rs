//! Output module: durable chunks, the ID list side file, and run reports
//!
//! This module handles:
//! - Writing one JSON array chunk per work unit, atomically
//! - Materializing and reading the cached user ID list
//! - Summarizing a run for the operator

mod chunk;
pub mod id_list;
pub mod report;

pub use chunk::{chunk_file_name, chunk_index, ChunkWriter};
pub use id_list::{collect_ids_from_chunks, load_id_list, load_or_materialize};
pub use report::{print_report, RunReport, UnitFailure};

use std::path::{Path, PathBuf};

/// Directory holding a dataset's chunks: `{data_dir}/{dataset}`
pub fn dataset_dir(data_dir: &Path, dataset: &str) -> PathBuf {
    data_dir.join(dataset)
}
