//! Dorg-Harvest main entry point
//!
//! This is the command-line interface for the Dorg-Harvest API harvester.

use anyhow::Context;
use clap::Parser;
use dorg_harvest::config::{load_config_with_hash, Config};
use dorg_harvest::dataset::{Dataset, UnitKind};
use dorg_harvest::output::print_report;
use dorg_harvest::pipeline::{Orchestrator, RunOptions};
use dorg_harvest::shutdown::{SharedStop, StopSignal};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Dorg-Harvest: a resumable harvester for the Drupal.org REST API
///
/// Dorg-Harvest counts the pages of a dataset, fetches them under a
/// concurrency cap, and writes one JSON chunk per page so an interrupted
/// run can pick up where it stopped.
#[derive(Parser, Debug)]
#[command(name = "dorg-harvest")]
#[command(version)]
#[command(about = "A resumable Drupal.org API harvester", long_about = None)]
struct Cli {
    /// Dataset to harvest: user, organization, module, event, module_terms, theme, comments
    #[arg(value_name = "DATASET")]
    dataset: Dataset,

    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Resume offset: skip units with a lower index
    #[arg(long, value_name = "N", default_value_t = 0)]
    start_from: u64,

    /// Also skip units whose chunk already exists on disk
    #[arg(long)]
    skip_existing: bool,

    /// Override the dataset's configured concurrency gate width
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,

    /// Print the resolved configuration and resource, fetch nothing
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    let options = RunOptions {
        start_from: cli.start_from,
        skip_existing: cli.skip_existing,
        concurrency: cli.concurrency,
    };

    if cli.dry_run {
        handle_dry_run(&config, cli.dataset, &options);
        return Ok(());
    }

    let stop = StopSignal::shared();
    spawn_interrupt_handler(Arc::clone(&stop));

    let orchestrator = Orchestrator::with_stop(config, stop)?;
    let report = orchestrator
        .run_dataset(cli.dataset, &options)
        .await
        .with_context(|| format!("harvest of '{}' aborted", cli.dataset))?;

    if !cli.quiet {
        print_report(&report);
    }

    if !report.is_clean() {
        tracing::error!(
            "{}: {} units failed, {} not started",
            report.dataset,
            report.failed,
            report.not_started
        );
        std::process::exit(1);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("dorg_harvest=info,warn"),
            1 => EnvFilter::new("dorg_harvest=debug,info"),
            _ => EnvFilter::new("dorg_harvest=trace,debug"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Requests a cooperative stop on the first Ctrl+C
fn spawn_interrupt_handler(stop: SharedStop) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight units");
            stop.request_stop();
        }
    });
}

/// Handles the --dry-run mode: shows what would be harvested
fn handle_dry_run(config: &Config, dataset: Dataset, options: &RunOptions) {
    println!("=== Dorg-Harvest Dry Run ===\n");

    println!("API:");
    println!("  Base URL: {}", config.api.base_url);
    println!("  Request timeout: {}s", config.api.request_timeout);
    println!("  Connect timeout: {}s", config.api.connect_timeout);
    println!(
        "  Retries: {} (first delay {}ms)",
        config.api.max_retries, config.api.retry_delay
    );
    println!("  User agent: {}", config.user_agent.header_value());

    let resource = dataset.resource();
    println!("\nDataset: {}", dataset);
    println!("  Endpoint: {}", resource.endpoint);
    for (key, value) in &resource.filters {
        println!("  Filter: {}={}", key, value);
    }
    println!("  Sort: {} {}", resource.sort, resource.direction);

    let gate = match dataset.unit_kind() {
        UnitKind::Pages => config.fetch.page_concurrency,
        UnitKind::IdBatches => {
            println!("  ID list: {}", config.output.id_list_path);
            println!("  Batch size: {}", config.fetch.id_batch_size);
            println!("  Per-batch concurrency: {}", config.fetch.id_concurrency);
            config.fetch.batch_concurrency
        }
    };

    println!("\nRun:");
    println!("  Concurrency: {}", options.concurrency.unwrap_or(gate));
    println!("  Start from: {}", options.start_from);
    println!("  Skip existing: {}", options.skip_existing);
    println!("  Output: {}/{}", config.output.data_dir, dataset.name());

    println!("\n✓ Configuration is valid");
}
