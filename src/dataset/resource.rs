//! Resource descriptors: which endpoint to query and with which filters

use std::fmt;

/// Sort direction understood by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An endpoint plus the query that selects one resource
///
/// Filters are kept as ordered pairs because multi-valued filters repeat
/// their key (`vocabulary[]=3&vocabulary[]=44`). A descriptor is built once
/// per run and never mutated; per-request parameters are appended to a copy
/// of [`base_query`](ResourceDescriptor::base_query).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    /// Endpoint path relative to the API base, e.g. `node.json`
    pub endpoint: String,

    /// Ordered filter parameters
    pub filters: Vec<(String, String)>,

    /// Field the API sorts by
    pub sort: String,

    /// Sort direction
    pub direction: SortDirection,
}

impl ResourceDescriptor {
    pub fn new(endpoint: &str, sort: &str, direction: SortDirection) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            filters: Vec::new(),
            sort: sort.to_string(),
            direction,
        }
    }

    /// Adds a filter parameter (builder style)
    pub fn filter(mut self, key: &str, value: &str) -> Self {
        self.filters.push((key.to_string(), value.to_string()));
        self
    }

    /// Filters, sort key and direction, in that order
    pub fn base_query(&self) -> Vec<(String, String)> {
        let mut query = self.filters.clone();
        query.push(("sort".to_string(), self.sort.clone()));
        query.push(("direction".to_string(), self.direction.to_string()));
        query
    }

    /// Cheapest request that still reports a last-page link
    pub fn probe_query(&self) -> Vec<(String, String)> {
        let mut query = self.base_query();
        query.push(("full".to_string(), "0".to_string()));
        query.push(("limit".to_string(), "1".to_string()));
        query
    }

    /// Request with the server's default page size, used to learn the true page count
    pub fn count_query(&self) -> Vec<(String, String)> {
        let mut query = self.base_query();
        query.push(("full".to_string(), "0".to_string()));
        query
    }

    /// Request for one full page of records
    pub fn page_query(&self, page: u64) -> Vec<(String, String)> {
        let mut query = self.base_query();
        query.push(("page".to_string(), page.to_string()));
        query
    }
}
