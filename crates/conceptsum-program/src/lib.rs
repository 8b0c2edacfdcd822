//! conceptsum program — sentence selection as a 0/1 integer program.
//!
//! `ProgramBuilder` formulates the program, an `Optimizer` backend solves it,
//! and `decode` maps the solved assignment back to the selected sentences.
//!
//! Sentence-selection variables are named `s<index>` (decimal, no leading
//! zeros); external solver wrappers rely on this naming.

pub mod builder;
pub mod decode;
pub mod linear;
pub mod solver;

pub use builder::ProgramBuilder;
pub use decode::decode;
pub use linear::{Assignment, Constraint, LinearExpr, Program, Sense};
pub use solver::{create_optimizer, BranchAndBound, FixedAssignment, GlpkSolver, Optimizer};
