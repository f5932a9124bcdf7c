/// Work unit definitions
///
/// A work unit is the atomic, idempotent item the scheduler dispatches. Its
/// index alone determines the chunk it writes.
use std::fmt;

/// One page of a paginated resource, or one batch of input IDs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkUnit {
    /// Zero-based page index
    Page(u64),

    /// Zero-based batch index and the IDs it covers
    IdBatch { index: u64, ids: Vec<u64> },
}

impl WorkUnit {
    /// Index used for chunk naming and resume offsets
    pub fn index(&self) -> u64 {
        match self {
            Self::Page(page) => *page,
            Self::IdBatch { index, .. } => *index,
        }
    }

    /// Builds the dense page range `[0, total_pages)`
    pub fn pages(total_pages: u64) -> Vec<WorkUnit> {
        (0..total_pages).map(WorkUnit::Page).collect()
    }

    /// Splits an ID list into consecutive batches of `batch_size`
    ///
    /// The last batch may be shorter. A zero batch size is treated as one.
    pub fn id_batches(ids: &[u64], batch_size: usize) -> Vec<WorkUnit> {
        ids.chunks(batch_size.max(1))
            .enumerate()
            .map(|(index, chunk)| WorkUnit::IdBatch {
                index: index as u64,
                ids: chunk.to_vec(),
            })
            .collect()
    }
}

impl fmt::Display for WorkUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page(page) => write!(f, "page {}", page),
            Self::IdBatch { index, ids } => write!(f, "batch {} ({} ids)", index, ids.len()),
        }
    }
}
