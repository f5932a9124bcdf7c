//! Unit fetcher: turns one work unit into the records of one chunk
//!
//! Page units issue a single GET and project every record. ID-batch units fan
//! out one probe per ID under an inner concurrency limit, independent of the
//! scheduler's gate.

use crate::dataset::{Dataset, ResourceDescriptor};
use crate::link::last_page_index;
use crate::pipeline::client::ApiClient;
use crate::projection::{project_record, Record};
use crate::state::WorkUnit;
use crate::{HarvestError, Result};
use futures_util::stream::{self, StreamExt};
use serde_json::{Map, Value};

/// Records produced for one unit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fetched {
    pub records: Vec<Record>,

    /// Records with at least one defaulted field, or batch items whose lookup failed
    pub degraded: usize,
}

/// Fetches work units for one dataset
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: ApiClient,
    dataset: Dataset,
    resource: ResourceDescriptor,
    id_concurrency: usize,
}

impl Fetcher {
    pub fn new(client: ApiClient, dataset: Dataset, id_concurrency: usize) -> Self {
        Self {
            client,
            dataset,
            resource: dataset.resource(),
            id_concurrency: id_concurrency.max(1),
        }
    }

    /// Fetches a unit, mapping any failure to [`HarvestError::UnitFetchFailed`]
    pub async fn fetch_unit(&self, unit: &WorkUnit) -> Result<Fetched> {
        let result = match unit {
            WorkUnit::Page(page) => self.fetch_page(*page).await,
            WorkUnit::IdBatch { ids, .. } => Ok(self.fetch_id_batch(ids).await),
        };

        result.map_err(|e| match e {
            HarvestError::UnitFetchFailed { .. } => e,
            other => HarvestError::UnitFetchFailed {
                unit: unit.to_string(),
                reason: other.to_string(),
            },
        })
    }

    /// Fetches one page and projects its records in response order
    pub async fn fetch_page(&self, page: u64) -> Result<Fetched> {
        let mapping = self.dataset.mapping().ok_or_else(|| HarvestError::UnitFetchFailed {
            unit: format!("page {}", page),
            reason: format!("dataset '{}' is not page-indexed", self.dataset),
        })?;

        let response = self
            .client
            .get_page(&self.resource.endpoint, &self.resource.page_query(page))
            .await?;

        let mut fetched = Fetched {
            records: Vec::with_capacity(response.list.len()),
            degraded: 0,
        };
        for raw in &response.list {
            let projection = project_record(raw, mapping);
            if projection.is_degraded() {
                fetched.degraded += 1;
            }
            fetched.records.push(projection.record);
        }

        tracing::trace!(
            "{} page {}: {} records, {} degraded",
            self.dataset,
            page,
            fetched.records.len(),
            fetched.degraded
        );
        Ok(fetched)
    }

    /// Aggregates comments for every ID in a batch
    ///
    /// Never fails: an ID whose lookup fails yields a record with null
    /// aggregates and counts as degraded. Output order follows `ids`.
    pub async fn fetch_id_batch(&self, ids: &[u64]) -> Fetched {
        let results: Vec<(u64, Result<Aggregate>)> = stream::iter(ids.iter().copied())
            .map(|id| async move { (id, self.aggregate_author(id).await) })
            .buffered(self.id_concurrency)
            .collect()
            .await;

        let mut fetched = Fetched {
            records: Vec::with_capacity(results.len()),
            degraded: 0,
        };
        for (id, result) in results {
            let aggregate = match result {
                Ok(aggregate) => aggregate,
                Err(e) => {
                    tracing::warn!("{} lookup for {} failed: {}", self.dataset, id, e);
                    fetched.degraded += 1;
                    Aggregate::default()
                }
            };
            fetched.records.push(aggregate.into_record(id));
        }
        fetched
    }

    /// Probes the first item by an author, then the last one if there are several
    async fn aggregate_author(&self, id: u64) -> Result<Aggregate> {
        let mut query = vec![("author".to_string(), id.to_string())];
        query.extend(self.resource.base_query());
        query.push(("limit".to_string(), "1".to_string()));

        let probe = self.client.get_page(&self.resource.endpoint, &query).await?;
        let Some(first_item) = probe.list.first() else {
            return Ok(Aggregate::empty());
        };

        let total = match &probe.last {
            Some(link) => last_page_index(link).ok_or_else(|| HarvestError::Json {
                url: link.clone(),
                message: "no page number in last link".to_string(),
            })? + 1,
            None => 1,
        };
        let first = created_of(first_item);

        let last = if total > 1 {
            query.push(("page".to_string(), (total - 1).to_string()));
            let tail = self.client.get_page(&self.resource.endpoint, &query).await?;
            tail.list.first().map(created_of).unwrap_or(Value::Null)
        } else {
            first.clone()
        };

        Ok(Aggregate {
            total: Value::from(total),
            first,
            last,
        })
    }
}

fn created_of(item: &Value) -> Value {
    item.get("created").cloned().unwrap_or(Value::Null)
}

/// Per-ID aggregate; all null when the lookup failed
#[derive(Debug, Clone, Default)]
struct Aggregate {
    total: Value,
    first: Value,
    last: Value,
}

impl Aggregate {
    fn empty() -> Self {
        Self {
            total: Value::from(0),
            first: Value::Null,
            last: Value::Null,
        }
    }

    fn into_record(self, id: u64) -> Record {
        let mut record = Map::with_capacity(4);
        record.insert("uid".to_string(), Value::from(id));
        record.insert("total".to_string(), self.total);
        record.insert("first".to_string(), self.first);
        record.insert("last".to_string(), self.last);
        record
    }
}
