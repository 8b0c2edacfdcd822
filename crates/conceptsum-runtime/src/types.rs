//! Runtime types.

use serde::Serialize;
use std::path::PathBuf;

/// Result of summarizing one problem.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemReport {
    pub problem_id: String,
    /// Sentences in the problem's new documents.
    pub sentences: usize,
    pub candidates: usize,
    pub selected: usize,
    /// Summary length in the task's unit.
    pub length: usize,
    pub objective: f64,
    pub output: PathBuf,
    pub duration_ms: u64,
}

/// A problem that did not produce output.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemFailure {
    pub problem_id: String,
    pub error: String,
}

/// Outcome of a batch, in input order.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub completed: Vec<ProblemReport>,
    pub failed: Vec<ProblemFailure>,
    /// Problems never started because the run was aborted.
    pub skipped: Vec<String>,
    pub duration_ms: u64,
}

impl BatchReport {
    /// True when every problem produced output.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }

    pub fn total(&self) -> usize {
        self.completed.len() + self.failed.len() + self.skipped.len()
    }
}
