/// Unit state definitions for tracking run progress
///
/// There is no persisted manifest: the only durable state is the set of chunk
/// files. These states exist for the in-memory run report.
use crate::HarvestError;
use std::fmt;

/// Final state of one work unit within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitState {
    // ===== Success =====
    /// Fetched, projected and written
    Written,

    // ===== Skip States =====
    /// Below the resume offset, or chunk already present with skip-existing
    Skipped,

    /// Never dispatched because a stop was requested
    NotStarted,

    // ===== Error States =====
    /// Network, status or JSON failure
    FetchFailed,

    /// Chunk could not be written durably
    WriteFailed,
}

impl UnitState {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Written)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::FetchFailed | Self::WriteFailed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Written => "written",
            Self::Skipped => "skipped",
            Self::NotStarted => "not_started",
            Self::FetchFailed => "fetch_failed",
            Self::WriteFailed => "write_failed",
        }
    }
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What running one unit produced
#[derive(Debug)]
pub enum UnitOutcome {
    /// Chunk written
    Written {
        /// Records in the chunk
        records: usize,
        /// Records (or batch items) that fell back to defaults
        degraded: usize,
    },

    /// Unit failed; its chunk was not written
    Failed(HarvestError),
}

impl UnitOutcome {
    pub fn state(&self) -> UnitState {
        match self {
            Self::Written { .. } => UnitState::Written,
            Self::Failed(HarvestError::ChunkWriteFailed { .. }) => UnitState::WriteFailed,
            Self::Failed(_) => UnitState::FetchFailed,
        }
    }
}
