//! conceptsum core — data model, error taxonomy, task and run configuration.

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    CoverageMode, LengthUnit, OrderingPolicy, RunConfig, SolverBackend, SolverConfig, TaskConfig,
    WeighterConfig,
};
pub use error::{Error, Result};
pub use types::{Document, Problem, Query, Sentence, Token};
