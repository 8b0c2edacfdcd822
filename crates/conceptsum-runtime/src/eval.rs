//! External ROUGE scoring.
//!
//! Scoring runs after a batch and never feeds back into selection.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

use conceptsum_core::{Error, Result};

static SCORE: Lazy<Regex> = Lazy::new(|| Regex::new(r": (\d\.\d+)").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RougeScores {
    pub rouge_1: f64,
    pub rouge_2: f64,
    pub rouge_su4: f64,
}

impl RougeScores {
    /// Read the first three `: <d.ddd>` fields of a scorer report as
    /// ROUGE-1, ROUGE-2 and ROUGE-SU4.
    pub fn parse(report: &str) -> Option<Self> {
        let mut scores = SCORE
            .captures_iter(report)
            .filter_map(|c| c.get(1)?.as_str().parse::<f64>().ok());
        Some(Self {
            rouge_1: scores.next()?,
            rouge_2: scores.next()?,
            rouge_su4: scores.next()?,
        })
    }
}

impl std::fmt::Display for RougeScores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ROUGE-1 {:.5} ROUGE-2 {:.5} ROUGE-SU4 {:.5}",
            self.rouge_1, self.rouge_2, self.rouge_su4
        )
    }
}

/// Run `command reference_dir output_dir` and parse its report.
///
/// `command` may carry its own arguments, separated by whitespace.
pub fn run_scorer(command: &str, reference_dir: &Path, output_dir: &Path) -> Result<RougeScores> {
    let mut parts = command.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| Error::Config("empty scorer command".into()))?;

    info!("Scoring {} against {}", output_dir.display(), reference_dir.display());
    let output = Command::new(program)
        .args(parts)
        .arg(reference_dir)
        .arg(output_dir)
        .output()
        .map_err(|e| Error::Evaluation(format!("cannot start {}: {}", program, e)))?;

    let report = String::from_utf8_lossy(&output.stdout);
    debug!("Scorer output:\n{}", report);
    if !output.status.success() {
        return Err(Error::Evaluation(format!(
            "{} exited with {}: {}",
            program,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    RougeScores::parse(&report)
        .ok_or_else(|| Error::Evaluation("scorer report has no ROUGE scores".into()))
}
