//! Dataset orchestration - wires counting, fetching and writing together
//!
//! For one dataset the orchestrator:
//! - Builds the work set (page count, or batches of the ID list)
//! - Opens the dataset's chunk directory
//! - Drops units that are below the resume offset or already on disk
//! - Hands the rest to the [`Scheduler`] with a fetch-then-write closure

use crate::config::{validate_fan_out, Config};
use crate::dataset::{Dataset, UnitKind};
use crate::output::{dataset_dir, load_or_materialize, ChunkWriter, RunReport};
use crate::pipeline::client::ApiClient;
use crate::pipeline::counter::count_pages;
use crate::pipeline::fetcher::Fetcher;
use crate::pipeline::scheduler::Scheduler;
use crate::shutdown::{SharedStop, StopSignal};
use crate::state::{UnitOutcome, WorkUnit};
use crate::{HarvestError, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Per-run options from the command line
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Resume offset: units with a lower index are not dispatched
    pub start_from: u64,

    /// Also skip units whose chunk already exists
    pub skip_existing: bool,

    /// Overrides the dataset's configured gate width
    pub concurrency: Option<usize>,
}

/// Runs datasets against one configuration
pub struct Orchestrator {
    config: Arc<Config>,
    client: ApiClient,
    stop: SharedStop,
}

impl Orchestrator {
    /// Creates an orchestrator with its own stop signal
    pub fn new(config: Config) -> Result<Self> {
        Self::with_stop(config, StopSignal::shared())
    }

    /// Creates an orchestrator that observes an external stop signal
    pub fn with_stop(config: Config, stop: SharedStop) -> Result<Self> {
        let client = ApiClient::new(&config)?;
        Ok(Self {
            config: Arc::new(config),
            client,
            stop,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Chunk directory for a dataset
    pub fn dataset_dir(&self, dataset: Dataset) -> PathBuf {
        dataset_dir(Path::new(&self.config.output.data_dir), dataset.name())
    }

    /// Gate width used for a dataset when no override is given
    pub fn default_concurrency(&self, dataset: Dataset) -> usize {
        match dataset.unit_kind() {
            UnitKind::Pages => self.config.fetch.page_concurrency,
            UnitKind::IdBatches => self.config.fetch.batch_concurrency,
        }
    }

    /// Builds the full work set for a dataset
    ///
    /// # Returns
    ///
    /// * `Err(HarvestError::CountUnavailable)` - The page count could not be learned
    /// * `Err(HarvestError::IdList)` - No ID list and no user chunks to derive it from
    pub async fn plan(&self, dataset: Dataset) -> Result<Vec<WorkUnit>> {
        match dataset.unit_kind() {
            UnitKind::Pages => {
                let pages = count_pages(&self.client, dataset.name(), &dataset.resource()).await?;
                Ok(WorkUnit::pages(pages))
            }
            UnitKind::IdBatches => {
                let ids = load_or_materialize(
                    Path::new(&self.config.output.id_list_path),
                    &self.dataset_dir(Dataset::User),
                )
                .await?;
                Ok(WorkUnit::id_batches(&ids, self.config.fetch.id_batch_size))
            }
        }
    }

    /// Gate width for a run, checked against max-connections when overridden
    fn resolve_concurrency(&self, dataset: Dataset, requested: Option<usize>) -> Result<usize> {
        let Some(n) = requested else {
            return Ok(self.default_concurrency(dataset));
        };

        let per_unit = match dataset.unit_kind() {
            UnitKind::Pages => 1,
            UnitKind::IdBatches => self.config.fetch.id_concurrency,
        };
        validate_fan_out("--concurrency", n, per_unit, self.config.fetch.max_connections)?;
        Ok(n)
    }

    /// Harvests one dataset
    ///
    /// Per-unit failures are recorded in the report and never abort the run;
    /// only planning failures (page count, ID list, chunk directory) do.
    pub async fn run_dataset(&self, dataset: Dataset, options: &RunOptions) -> Result<RunReport> {
        let limit = self.resolve_concurrency(dataset, options.concurrency)?;

        tracing::info!(
            "Harvesting {} (concurrency {}, start from {})",
            dataset,
            limit,
            options.start_from
        );

        let units = self.plan(dataset).await?;
        let writer = ChunkWriter::open(self.dataset_dir(dataset)).await?;

        let (units, existing) = if options.skip_existing {
            let on_disk: HashSet<u64> = writer.existing_indices().await?.into_iter().collect();
            let (existing, pending): (Vec<WorkUnit>, Vec<WorkUnit>) =
                units.into_iter().partition(|u| {
                    u.index() >= options.start_from && on_disk.contains(&u.index())
                });
            if !existing.is_empty() {
                tracing::info!(
                    "{}: {} units already on disk, skipping",
                    dataset,
                    existing.len()
                );
            }
            (pending, existing.len() as u64)
        } else {
            (units, 0)
        };

        let fetcher = Fetcher::new(
            self.client.clone(),
            dataset,
            self.config.fetch.id_concurrency,
        );
        let scheduler = Scheduler::new(limit, Arc::clone(&self.stop));

        let mut report = scheduler
            .run(dataset.name(), units, options.start_from, move |unit| {
                let fetcher = fetcher.clone();
                let writer = writer.clone();
                async move { run_unit(&fetcher, &writer, unit).await }
            })
            .await;

        report.total_units += existing;
        report.skipped += existing;
        Ok(report)
    }
}

/// Fetches one unit and writes its chunk; no chunk is written on fetch failure
async fn run_unit(fetcher: &Fetcher, writer: &ChunkWriter, unit: WorkUnit) -> UnitOutcome {
    let fetched = match fetcher.fetch_unit(&unit).await {
        Ok(fetched) => fetched,
        Err(e) => return UnitOutcome::Failed(e),
    };

    match writer.write_chunk(unit.index(), &fetched.records).await {
        Ok(_) => UnitOutcome::Written {
            records: fetched.records.len(),
            degraded: fetched.degraded,
        },
        Err(e @ HarvestError::ChunkWriteFailed { .. }) => UnitOutcome::Failed(e),
        Err(e) => UnitOutcome::Failed(HarvestError::ChunkWriteFailed {
            path: writer.chunk_path(unit.index()),
            source: std::io::Error::other(e.to_string()),
        }),
    }
}
