//! Optimizer backends.
//!
//! An `Optimizer` turns a [`Program`] into an assignment of every declared
//! binary variable. `BranchAndBound` runs in process, `GlpkSolver` drives an
//! external `glpsol`, and `FixedAssignment` returns canned values for tests.

pub mod branch_bound;
pub mod fixed;
pub mod glpk;

pub use branch_bound::BranchAndBound;
pub use fixed::FixedAssignment;
pub use glpk::GlpkSolver;

use std::sync::Arc;

use conceptsum_core::{Result, SolverBackend, SolverConfig};

use crate::linear::{Assignment, Program};

pub trait Optimizer: Send + Sync {
    /// Solve the program to optimality within the backend's limits.
    ///
    /// Infeasibility, timeouts and unusable solver output are
    /// `Error::Solver` for the program's problem.
    fn solve(&self, program: &Program) -> Result<Assignment>;

    /// Short backend name for logs and reports.
    fn name(&self) -> &str;
}

/// Create the optimizer selected by the solver configuration.
pub fn create_optimizer(config: &SolverConfig) -> Arc<dyn Optimizer> {
    match config.backend {
        SolverBackend::BranchAndBound => {
            tracing::info!(
                "Using branch-and-bound optimizer (time limit {}s)",
                config.time_limit_secs
            );
            Arc::new(BranchAndBound::new(config.time_limit(), config.node_limit))
        }
        SolverBackend::Glpk => {
            tracing::info!(
                "Using {} (time limit {}s)",
                config.glpk_command,
                config.time_limit_secs
            );
            Arc::new(GlpkSolver::new(
                config.glpk_command.clone(),
                config.time_limit(),
                config.debug,
            ))
        }
    }
}
