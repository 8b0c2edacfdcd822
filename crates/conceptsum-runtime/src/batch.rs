//! Concurrent batch execution with per-problem failure isolation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use conceptsum_core::Problem;

use crate::pipeline::SummaryPipeline;
use crate::types::*;

/// Shared flag that stops a batch from starting new problems.
///
/// Problems already running finish and write their output.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

enum Outcome {
    Done(ProblemReport),
    Failed(ProblemFailure),
    Skipped(String),
}

/// Runs problems on blocking workers, at most `workers` at a time.
pub struct BatchRunner {
    pipeline: Arc<SummaryPipeline>,
    workers: usize,
    abort: AbortHandle,
}

impl BatchRunner {
    pub fn new(pipeline: SummaryPipeline, workers: usize) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            workers: workers.max(1),
            abort: AbortHandle::new(),
        }
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Run every problem and report outcomes in input order.
    ///
    /// A failing problem is logged and recorded; it never stops the others.
    pub async fn run(&self, problems: Vec<Problem>) -> BatchReport {
        let start = Instant::now();
        let total = problems.len();
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let outcomes: Arc<Mutex<Vec<Option<Outcome>>>> =
            Arc::new(Mutex::new((0..total).map(|_| None).collect()));

        info!("Running {} problems on {} workers", total, self.workers);

        let mut handles = Vec::with_capacity(total);
        for (slot, problem) in problems.into_iter().enumerate() {
            if self.abort.is_aborted() {
                outcomes.lock()[slot] = Some(Outcome::Skipped(problem.id));
                continue;
            }
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            // The abort may have come while waiting for a worker.
            if self.abort.is_aborted() {
                outcomes.lock()[slot] = Some(Outcome::Skipped(problem.id));
                continue;
            }

            let pipeline = self.pipeline.clone();
            let outcomes = outcomes.clone();
            let problem_id = problem.id.clone();
            let failed_id = problem.id.clone();
            let handle = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                let outcome = match pipeline.run(problem) {
                    Ok(report) => Outcome::Done(report),
                    Err(e) => {
                        error!("{}: {}", problem_id, e);
                        Outcome::Failed(ProblemFailure {
                            problem_id,
                            error: e.to_string(),
                        })
                    }
                };
                outcomes.lock()[slot] = Some(outcome);
            });
            handles.push((slot, failed_id, handle));
        }

        for (slot, problem_id, handle) in handles {
            if let Err(e) = handle.await {
                error!("{}: worker panicked: {}", problem_id, e);
                let mut outcomes = outcomes.lock();
                if outcomes[slot].is_none() {
                    outcomes[slot] = Some(Outcome::Failed(ProblemFailure {
                        problem_id,
                        error: format!("worker panicked: {}", e),
                    }));
                }
            }
        }

        let mut report = BatchReport::default();
        for outcome in std::mem::take(&mut *outcomes.lock()).into_iter().flatten() {
            match outcome {
                Outcome::Done(r) => report.completed.push(r),
                Outcome::Failed(f) => report.failed.push(f),
                Outcome::Skipped(id) => report.skipped.push(id),
            }
        }
        report.duration_ms = start.elapsed().as_millis() as u64;

        if !report.skipped.is_empty() {
            warn!("Aborted: {} problems not started", report.skipped.len());
        }
        info!(
            "Batch complete: {} completed, {} failed, {} skipped, duration={}ms",
            report.completed.len(),
            report.failed.len(),
            report.skipped.len(),
            report.duration_ms
        );
        report
    }
}
