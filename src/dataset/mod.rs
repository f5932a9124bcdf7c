//! Static registry of harvestable datasets
//!
//! Each dataset resolves to a [`ResourceDescriptor`] and, for page-indexed
//! datasets, a field mapping from [`crate::projection::mappings`].

mod resource;

pub use resource::{ResourceDescriptor, SortDirection};

use crate::projection::{mappings, Mapping};
use crate::HarvestError;
use std::fmt;
use std::str::FromStr;

/// How a dataset's work set is enumerated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    /// Dense page range `[0, total_pages)`
    Pages,
    /// Fixed-size batches drawn from the materialized ID list
    IdBatches,
}

/// A named dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    User,
    Organization,
    Module,
    Event,
    ModuleTerms,
    Theme,
    /// Per-user comment totals, aggregated from `comment.json`
    Comments,
}

impl Dataset {
    pub const ALL: [Dataset; 7] = [
        Dataset::User,
        Dataset::Organization,
        Dataset::Module,
        Dataset::Event,
        Dataset::ModuleTerms,
        Dataset::Theme,
        Dataset::Comments,
    ];

    /// Name used on the command line and as the chunk directory name
    pub fn name(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Organization => "organization",
            Self::Module => "module",
            Self::Event => "event",
            Self::ModuleTerms => "module_terms",
            Self::Theme => "theme",
            Self::Comments => "comments",
        }
    }

    pub fn unit_kind(&self) -> UnitKind {
        match self {
            Self::Comments => UnitKind::IdBatches,
            _ => UnitKind::Pages,
        }
    }

    /// The endpoint, filters and sort order for this dataset
    ///
    /// For [`Dataset::Comments`] the descriptor carries no author filter;
    /// the fetcher adds `author=<id>` per request.
    pub fn resource(&self) -> ResourceDescriptor {
        use SortDirection::Asc;

        match self {
            Self::User => ResourceDescriptor::new("user.json", "uid", Asc),
            Self::Organization => {
                ResourceDescriptor::new("node.json", "nid", Asc).filter("type", "organization")
            }
            Self::Module => {
                ResourceDescriptor::new("node.json", "nid", Asc).filter("type", "project_module")
            }
            Self::Event => ResourceDescriptor::new("node.json", "nid", Asc).filter("type", "event"),
            Self::ModuleTerms => ResourceDescriptor::new("taxonomy_term.json", "tid", Asc)
                .filter("vocabulary[]", "3")
                .filter("vocabulary[]", "44")
                .filter("vocabulary[]", "46"),
            Self::Theme => {
                ResourceDescriptor::new("node.json", "nid", Asc).filter("type", "project_theme")
            }
            Self::Comments => ResourceDescriptor::new("comment.json", "cid", Asc),
        }
    }

    /// Field mapping applied to each raw record
    ///
    /// Returns `None` for the comment aggregation, whose output records are
    /// built from per-ID probes rather than projected from raw records.
    pub fn mapping(&self) -> Option<&'static Mapping> {
        match self {
            Self::User => Some(mappings::USER),
            Self::Organization => Some(mappings::ORGANIZATION),
            Self::Module => Some(mappings::MODULE),
            Self::Event => Some(mappings::EVENT),
            Self::ModuleTerms => Some(mappings::TAXONOMY_TERM),
            Self::Theme => Some(mappings::THEME),
            Self::Comments => None,
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dataset {
    type Err = HarvestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|d| d.name() == s)
            .ok_or_else(|| HarvestError::UnknownDataset(s.to_string()))
    }
}
