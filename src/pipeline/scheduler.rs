//! Bounded-concurrency unit scheduler
//!
//! The scheduler keeps at most `limit` units in flight. A slot is released as
//! soon as its unit completes, so the pool refills continuously instead of
//! waiting for the slowest unit of a fixed-size group.

use crate::output::RunReport;
use crate::shutdown::SharedStop;
use crate::state::{UnitOutcome, UnitState, WorkUnit};
use crate::HarvestError;
use futures_util::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

/// What a finished task reports back
struct Completion {
    index: u64,
    label: String,
    outcome: UnitOutcome,
    elapsed: Duration,
}

/// Dispatches work units through a concurrency gate
#[derive(Debug, Clone)]
pub struct Scheduler {
    limit: usize,
    stop: SharedStop,
}

impl Scheduler {
    /// Creates a scheduler with a gate of `limit` slots (at least one)
    pub fn new(limit: usize, stop: SharedStop) -> Self {
        Self {
            limit: limit.max(1),
            stop,
        }
    }

    /// Runs every unit whose index is `>= start_from`
    ///
    /// Units below the offset are counted as skipped without checking that
    /// their chunks exist. A unit's failure is recorded and never aborts the
    /// run. Once a stop is requested no further unit is dispatched; units in
    /// flight finish normally and the rest are reported as not started.
    ///
    /// # Arguments
    ///
    /// * `dataset` - Name used in the report and log lines
    /// * `units` - The work set, in dispatch order
    /// * `start_from` - Resume offset
    /// * `work` - Runs one unit; must not panic, but a panic is contained
    pub async fn run<F, Fut>(
        &self,
        dataset: &str,
        units: Vec<WorkUnit>,
        start_from: u64,
        work: F,
    ) -> RunReport
    where
        F: Fn(WorkUnit) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = UnitOutcome> + Send + 'static,
    {
        let started = Instant::now();
        let total = units.len();
        let mut report = RunReport::new(dataset, total as u64);

        let (skipped, dispatch): (Vec<WorkUnit>, Vec<WorkUnit>) =
            units.into_iter().partition(|u| u.index() < start_from);
        report.skipped = skipped.len() as u64;
        if report.skipped > 0 {
            tracing::info!(
                "{}: skipping {} units below offset {}",
                dataset,
                report.skipped,
                start_from
            );
        }

        let work = Arc::new(work);
        let semaphore = Arc::new(Semaphore::new(self.limit));
        let mut tasks: JoinSet<Completion> = JoinSet::new();

        let mut queue = dispatch.into_iter();
        while let Some(unit) = queue.next() {
            let permit = tokio::select! {
                biased;
                _ = self.stop.stopped() => None,
                permit = Arc::clone(&semaphore).acquire_owned() => permit.ok(),
            };
            let Some(permit) = permit else {
                report.not_started = 1 + queue.len() as u64;
                tracing::warn!(
                    "{}: stop requested, {} units not started",
                    dataset,
                    report.not_started
                );
                break;
            };

            // Reap whatever finished while we waited for the slot.
            while let Some(joined) = tasks.try_join_next() {
                collect(&mut report, joined, total);
            }

            let work = Arc::clone(&work);
            tasks.spawn(async move {
                let _permit = permit;
                let index = unit.index();
                let label = unit.to_string();
                let unit_start = Instant::now();

                let outcome = match AssertUnwindSafe((*work)(unit)).catch_unwind().await {
                    Ok(outcome) => outcome,
                    Err(_) => UnitOutcome::Failed(HarvestError::UnitFetchFailed {
                        unit: label.clone(),
                        reason: "unit task panicked".to_string(),
                    }),
                };

                Completion {
                    index,
                    label,
                    outcome,
                    elapsed: unit_start.elapsed(),
                }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            collect(&mut report, joined, total);
        }

        report.finish(started.elapsed());
        tracing::info!("{}", report);
        report
    }
}

fn collect(report: &mut RunReport, joined: Result<Completion, JoinError>, total: usize) {
    let completion = match joined {
        Ok(completion) => completion,
        Err(e) => {
            tracing::error!("{}: unit task aborted: {}", report.dataset, e);
            report.record_failure(u64::MAX, UnitState::FetchFailed, e.to_string());
            return;
        }
    };

    match &completion.outcome {
        UnitOutcome::Written { .. } => tracing::info!(
            "{} / {} processed in {:.2}s",
            completion.label,
            total,
            completion.elapsed.as_secs_f64()
        ),
        UnitOutcome::Failed(e) => tracing::warn!(
            "{} / {} failed after {:.2}s: {}",
            completion.label,
            total,
            completion.elapsed.as_secs_f64(),
            e
        ),
    }

    report.record(completion.index, &completion.outcome);
}
