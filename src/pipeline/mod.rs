//! Harvest pipeline
//!
//! This module contains the core harvesting logic, including:
//! - HTTP requests with retry for transient failures
//! - Page counting from the API's last-page link
//! - Per-unit fetching and projection
//! - Bounded-concurrency scheduling and dataset orchestration

mod client;
mod counter;
mod fetcher;
mod orchestrator;
mod scheduler;

pub use client::{backoff_duration, build_http_client, ApiClient, ApiPage};
pub use counter::count_pages;
pub use fetcher::{Fetched, Fetcher};
pub use orchestrator::{Orchestrator, RunOptions};
pub use scheduler::Scheduler;

use crate::config::Config;
use crate::dataset::Dataset;
use crate::output::RunReport;
use crate::Result;

/// Harvests one dataset with default options
///
/// This is the shortest entry point: it builds the HTTP client, plans the
/// work set, and runs every unit from index 0.
///
/// # Example
///
/// ```no_run
/// use dorg_harvest::config::Config;
/// use dorg_harvest::pipeline::harvest;
/// use dorg_harvest::Dataset;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let report = harvest(Config::default(), Dataset::Event).await?;
/// println!("{}", report);
/// # Ok(())
/// # }
/// ```
pub async fn harvest(config: Config, dataset: Dataset) -> Result<RunReport> {
    Orchestrator::new(config)?
        .run_dataset(dataset, &RunOptions::default())
        .await
}
