//! Task definitions and run configuration.
//!
//! A `RunConfig` is built once (defaults, then an optional JSON file, then
//! environment overrides), validated, and shared read-only by every worker.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Unit of the summary length budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    #[default]
    Words,
    Bytes,
}

impl LengthUnit {
    /// Length of `text` in this unit.
    pub fn measure(self, text: &str) -> usize {
        match self {
            Self::Words => text.split_whitespace().count(),
            Self::Bytes => text.len(),
        }
    }
}

impl std::fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Words => write!(f, "words"),
            Self::Bytes => write!(f, "bytes"),
        }
    }
}

/// A summarization task: evaluation campaign name and its length budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskConfig {
    pub name: String,
    pub length_limit: i64,
    #[serde(default)]
    pub length_unit: LengthUnit,
    /// Directory holding the reference summaries used by the scorer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_dir: Option<PathBuf>,
}

/// Built-in task names accepted by [`TaskConfig::builtin`].
pub const BUILTIN_TASKS: &[&str] = &["u08", "u07", "m07", "m06", "m05"];

impl TaskConfig {
    /// Look up one of the built-in shared tasks.
    pub fn builtin(name: &str) -> Result<Self> {
        let (full_name, limit) = match name {
            "u08" => ("tac08_update", 100),
            "u07" => ("duc07_update", 100),
            "m07" => ("duc07_main", 250),
            "m06" => ("duc06_main", 250),
            "m05" => ("duc05_main", 250),
            other => {
                return Err(Error::Config(format!(
                    "unrecognized task [{}], expected one of {}",
                    other,
                    BUILTIN_TASKS.join(", ")
                )))
            }
        };
        Ok(Self {
            name: full_name.to_string(),
            length_limit: limit,
            length_unit: LengthUnit::Words,
            reference_dir: None,
        })
    }

    /// An ad-hoc task, e.g. for summarizing a single text file.
    pub fn custom(name: impl Into<String>, length_limit: i64, length_unit: LengthUnit) -> Self {
        Self {
            name: name.into(),
            length_limit,
            length_unit,
            reference_dir: None,
        }
    }

    /// Update tasks carry background documents that discount old concepts.
    pub fn is_update(&self) -> bool {
        self.name.ends_with("_update")
    }
}

/// How concept indicators relate to the sentences covering them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageMode {
    /// `c ≤ Σ s`: a concept counts when any covering sentence is selected.
    #[default]
    Disjunctive,
    /// Additionally `s ≤ c` for every covering sentence.
    AllOrNothing,
}

/// Sentence ordering policy for the final summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingPolicy {
    Chronological,
    Dendrogram,
}

/// Optimizer backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SolverBackend {
    /// In-process exact 0/1 branch and bound.
    #[default]
    BranchAndBound,
    /// External `glpsol` process.
    Glpk,
}

impl std::str::FromStr for SolverBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "branch-and-bound" | "bnb" => Ok(Self::BranchAndBound),
            "glpk" | "glpsol" => Ok(Self::Glpk),
            other => Err(Error::Config(format!("unknown solver backend: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    #[serde(default)]
    pub backend: SolverBackend,
    #[serde(default = "default_glpk_command")]
    pub glpk_command: String,
    #[serde(default = "default_time_limit_secs")]
    pub time_limit_secs: u64,
    /// Upper bound on explored branch-and-bound nodes.
    #[serde(default = "default_node_limit")]
    pub node_limit: u64,
    /// Surface solver output at debug level instead of trace.
    #[serde(default)]
    pub debug: bool,
}

fn default_glpk_command() -> String {
    "glpsol".into()
}
fn default_time_limit_secs() -> u64 {
    60
}
fn default_node_limit() -> u64 {
    5_000_000
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            backend: SolverBackend::default(),
            glpk_command: default_glpk_command(),
            time_limit_secs: default_time_limit_secs(),
            node_limit: default_node_limit(),
            debug: false,
        }
    }
}

impl SolverConfig {
    pub fn time_limit(&self) -> Duration {
        Duration::from_secs(self.time_limit_secs)
    }
}

/// Parameters of the heuristic concept weighter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeighterConfig {
    /// n-gram order of concepts.
    pub ngram: usize,
    /// Minimum number of new documents a concept must occur in.
    pub min_doc_freq: usize,
    /// Lower `min_doc_freq` until at least this many concepts survive.
    pub min_concepts: usize,
    /// Extra weight factor for concepts fully contained in the query.
    pub query_boost: f64,
    /// Weight factor for concepts already present in old documents.
    pub old_discount: f64,
    pub min_sentence_words: usize,
    pub max_candidates: usize,
}

impl Default for WeighterConfig {
    fn default() -> Self {
        Self {
            ngram: 2,
            min_doc_freq: 3,
            min_concepts: 10,
            query_boost: 1.0,
            old_discount: 0.5,
            min_sentence_words: 6,
            max_candidates: 200,
        }
    }
}

/// Immutable configuration for one summarization run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub task: TaskConfig,
    pub output_dir: PathBuf,
    /// Strip and re-insert acronym definitions, emit an assembled summary.
    #[serde(default)]
    pub compress: bool,
    /// Explicit ordering; defaults depend on `compress`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordering: Option<OrderingPolicy>,
    #[serde(default)]
    pub coverage: CoverageMode,
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub weighter: WeighterConfig,
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Command line of the external scorer, run after the batch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scorer_command: Option<String>,
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl RunConfig {
    pub fn new(task: TaskConfig, output_dir: impl AsRef<Path>) -> Self {
        Self {
            task,
            output_dir: output_dir.as_ref().to_path_buf(),
            compress: false,
            ordering: None,
            coverage: CoverageMode::default(),
            solver: SolverConfig::default(),
            weighter: WeighterConfig::default(),
            workers: default_workers(),
            scorer_command: None,
        }
    }

    /// Load a run configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("invalid config {}: {}", path.display(), e)))
    }

    /// Apply `CONCEPTSUM_*` environment overrides.
    pub fn apply_env(self) -> Result<Self> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(backend) = lookup("CONCEPTSUM_SOLVER") {
            self.solver.backend = backend.parse()?;
        }
        if let Some(secs) = lookup("CONCEPTSUM_SOLVER_TIMEOUT") {
            self.solver.time_limit_secs = parse_env("CONCEPTSUM_SOLVER_TIMEOUT", &secs)?;
        }
        if let Some(workers) = lookup("CONCEPTSUM_WORKERS") {
            self.workers = parse_env("CONCEPTSUM_WORKERS", &workers)?;
        }
        if let Some(cmd) = lookup("CONCEPTSUM_ROUGE") {
            self.scorer_command = Some(cmd);
        }
        Ok(self)
    }

    /// Reject configurations that would make every problem fail.
    pub fn validate(&self) -> Result<()> {
        if self.task.length_limit <= 0 {
            return Err(Error::Config(format!(
                "length limit must be positive, got {}",
                self.task.length_limit
            )));
        }
        if self.workers == 0 {
            return Err(Error::Config("worker count must be at least 1".into()));
        }
        if self.solver.time_limit_secs == 0 {
            return Err(Error::Config("solver time limit must be positive".into()));
        }
        if self.weighter.ngram == 0 {
            return Err(Error::Config("concept n-gram order must be positive".into()));
        }
        Ok(())
    }

    /// Effective ordering policy.
    pub fn ordering(&self) -> OrderingPolicy {
        self.ordering.unwrap_or(if self.compress {
            OrderingPolicy::Dendrogram
        } else {
            OrderingPolicy::Chronological
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("invalid value for {}: {}", key, value)))
}
