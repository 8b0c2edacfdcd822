//! conceptsum — concept-coverage extractive summarizer.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use conceptsum_core::{
    CoverageMode, LengthUnit, OrderingPolicy, RunConfig, SolverBackend, TaskConfig,
};
use conceptsum_runtime::{run_scorer, BatchRunner, SummaryPipeline};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OrderingArg {
    Chronological,
    Dendrogram,
}

impl From<OrderingArg> for OrderingPolicy {
    fn from(arg: OrderingArg) -> Self {
        match arg {
            OrderingArg::Chronological => OrderingPolicy::Chronological,
            OrderingArg::Dendrogram => OrderingPolicy::Dendrogram,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "conceptsum",
    about = "Select sentences that cover the most important concepts within a length budget"
)]
struct Cli {
    /// Problem set (.json) or a plain text file to summarize
    input: PathBuf,

    /// Directory receiving one summary file per problem
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// JSON run configuration; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Built-in task: u08 (default), u07, m07, m06 or m05
    #[arg(short, long)]
    task: Option<String>,

    /// Custom length limit, replacing the task's
    #[arg(long)]
    length: Option<i64>,

    /// Measure length in bytes instead of words
    #[arg(long)]
    bytes: bool,

    /// Strip acronym definitions before selection and restore them after
    #[arg(long)]
    compress: bool,

    #[arg(long, value_enum)]
    ordering: Option<OrderingArg>,

    /// Require every sentence covering a selected concept to be selected too
    #[arg(long)]
    all_or_nothing: bool,

    /// Optimizer backend: branch-and-bound or glpk
    #[arg(long)]
    solver: Option<SolverBackend>,

    /// Per-problem solver time limit in seconds
    #[arg(long)]
    timeout: Option<u64>,

    #[arg(long)]
    workers: Option<usize>,

    /// Reference summaries; enables scoring after the batch
    #[arg(long)]
    reference_dir: Option<PathBuf>,

    /// Scorer command, run as `<cmd> <reference-dir> <output-dir>`
    #[arg(long)]
    scorer: Option<String>,

    /// Write the batch report as JSON
    #[arg(long)]
    report: Option<PathBuf>,

    /// Log solver output at debug level
    #[arg(long)]
    debug_solver: bool,
}

const DEFAULT_TASK: &str = "u08";

fn build_config(cli: &Cli) -> anyhow::Result<RunConfig> {
    let mut config = match &cli.config {
        Some(path) => RunConfig::load(path)?,
        None => {
            let output_dir = cli
                .output_dir
                .clone()
                .context("either --output-dir or --config is required")?;
            RunConfig::new(TaskConfig::builtin(DEFAULT_TASK)?, output_dir)
        }
    };
    config = config.apply_env()?;

    if let Some(name) = &cli.task {
        let reference_dir = config.task.reference_dir.take();
        config.task = TaskConfig {
            reference_dir,
            ..TaskConfig::builtin(name)?
        };
    }

    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(length) = cli.length {
        config.task.length_limit = length;
    }
    if cli.bytes {
        config.task.length_unit = LengthUnit::Bytes;
    }
    if cli.compress {
        config.compress = true;
    }
    if let Some(ordering) = cli.ordering {
        config.ordering = Some(ordering.into());
    }
    if cli.all_or_nothing {
        config.coverage = CoverageMode::AllOrNothing;
    }
    if let Some(backend) = cli.solver {
        config.solver.backend = backend;
    }
    if let Some(secs) = cli.timeout {
        config.solver.time_limit_secs = secs;
    }
    if cli.debug_solver {
        config.solver.debug = true;
    }
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }
    if let Some(dir) = &cli.reference_dir {
        config.task.reference_dir = Some(dir.clone());
    }
    if let Some(cmd) = &cli.scorer {
        config.scorer_command = Some(cmd.clone());
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Arc::new(build_config(&cli)?);
    info!(
        "Task {}: limit {} {}, compress={}, ordering={:?}, solver={:?}",
        config.task.name,
        config.task.length_limit,
        config.task.length_unit,
        config.compress,
        config.ordering(),
        config.solver.backend
    );

    let problems = conceptsum_ingest::load_problems(&cli.input, &config.task)?;
    let pipeline = SummaryPipeline::from_config(config.clone())?;
    let runner = BatchRunner::new(pipeline, config.workers);

    let abort = runner.abort_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing running problems");
            abort.abort();
        }
    });

    let report = runner.run(problems).await;
    for failure in &report.failed {
        error!("{} failed: {}", failure.problem_id, failure.error);
    }
    if let Some(path) = &cli.report {
        std::fs::write(path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("cannot write report to {}", path.display()))?;
    }

    if let (Some(cmd), Some(reference_dir)) =
        (&config.scorer_command, &config.task.reference_dir)
    {
        match run_scorer(cmd, reference_dir, &config.output_dir) {
            Ok(scores) => println!("{}", scores),
            Err(e) => error!("Scoring failed: {}", e),
        }
    }

    if !report.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
