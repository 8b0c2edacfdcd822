//! conceptsum runtime — runs problems through the selection pipeline.
//!
//! `SummaryPipeline` takes one problem from prepared text to a written
//! summary; `BatchRunner` fans problems out over blocking workers with
//! per-problem failure isolation. `eval` wraps the external ROUGE scorer.

pub mod batch;
pub mod eval;
pub mod output;
pub mod pipeline;
pub mod types;

pub use batch::{AbortHandle, BatchRunner};
pub use eval::{run_scorer, RougeScores};
pub use output::OutputWriter;
pub use pipeline::{Summary, SummaryPipeline};
pub use types::*;
