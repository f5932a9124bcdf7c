//! Run report: aggregate outcome of one dataset run

use crate::state::{UnitOutcome, UnitState};
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;

/// A unit that failed, with the reason logged for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitFailure {
    pub unit: u64,
    pub state: UnitState,
    pub reason: String,
}

/// Summary of a dataset run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Dataset name
    pub dataset: String,

    /// Wall-clock start of the run
    pub started_at: DateTime<Utc>,

    /// Units in the work set, including skipped ones
    pub total_units: u64,

    /// Units whose chunk was written
    pub succeeded: u64,

    /// Units that failed to fetch or to write
    pub failed: u64,

    /// Units below the resume offset or already on disk
    pub skipped: u64,

    /// Units never dispatched because a stop was requested
    pub not_started: u64,

    /// Records written across all chunks
    pub records: u64,

    /// Records or batch items that fell back to defaults
    pub degraded_records: u64,

    /// Time from the first dispatch to the last completion
    pub elapsed: Duration,

    /// Failed units, ascending by unit index
    pub failures: Vec<UnitFailure>,
}

impl RunReport {
    pub fn new(dataset: &str, total_units: u64) -> Self {
        Self {
            dataset: dataset.to_string(),
            started_at: Utc::now(),
            total_units,
            succeeded: 0,
            failed: 0,
            skipped: 0,
            not_started: 0,
            records: 0,
            degraded_records: 0,
            elapsed: Duration::ZERO,
            failures: Vec::new(),
        }
    }

    /// Folds one unit's outcome into the totals
    pub fn record(&mut self, unit: u64, outcome: &UnitOutcome) {
        match outcome {
            UnitOutcome::Written { records, degraded } => {
                self.succeeded += 1;
                self.records += *records as u64;
                self.degraded_records += *degraded as u64;
            }
            UnitOutcome::Failed(err) => {
                self.record_failure(unit, outcome.state(), err.to_string());
            }
        }
    }

    /// Counts a failure that produced no [`UnitOutcome`] (e.g. a panicked task)
    pub fn record_failure(&mut self, unit: u64, state: UnitState, reason: String) {
        self.failed += 1;
        self.failures.push(UnitFailure {
            unit,
            state,
            reason,
        });
    }

    /// Sorts failures and stamps the elapsed time
    pub fn finish(&mut self, elapsed: Duration) {
        self.elapsed = elapsed;
        self.failures.sort_by_key(|f| f.unit);
    }

    /// True when every unit was started and none failed
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.not_started == 0
    }

    /// Lowest failed unit index, the natural offset for a targeted rerun
    pub fn first_failed_unit(&self) -> Option<u64> {
        self.failures.iter().map(|f| f.unit).min()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} succeeded, {} failed, {} skipped",
            self.dataset, self.succeeded, self.failed, self.skipped
        )?;
        if self.not_started > 0 {
            write!(f, ", {} not started", self.not_started)?;
        }
        write!(
            f,
            " of {} units; {} records ({} degraded) in {:.2}s",
            self.total_units,
            self.records,
            self.degraded_records,
            self.elapsed.as_secs_f64()
        )
    }
}

/// Prints a run report to stdout in a formatted manner
pub fn print_report(report: &RunReport) {
    println!("=== Harvest Report: {} ===\n", report.dataset);

    println!("Overview:");
    println!("  Started: {}", report.started_at.to_rfc3339());
    println!("  Elapsed: {:.2}s", report.elapsed.as_secs_f64());
    println!("  Units: {}", report.total_units);
    println!("  Succeeded: {}", report.succeeded);
    println!("  Failed: {}", report.failed);
    println!("  Skipped: {}", report.skipped);
    if report.not_started > 0 {
        println!("  Not started (stopped): {}", report.not_started);
    }
    println!(
        "  Records: {} ({} degraded)",
        report.records, report.degraded_records
    );

    if !report.failures.is_empty() {
        println!("\nFailed Units:");
        for failure in &report.failures {
            println!("  {} [{}]: {}", failure.unit, failure.state, failure.reason);
        }
        if let Some(first) = report.first_failed_unit() {
            println!("\nRerun from the first failure with --start-from {}", first);
        }
    }
}
