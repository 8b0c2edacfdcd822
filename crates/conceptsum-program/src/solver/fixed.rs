//! Canned assignments for exercising the pipeline without a real solver.

use std::collections::BTreeMap;

use conceptsum_core::Result;

use crate::linear::{Assignment, Program};
use crate::solver::Optimizer;

/// Assigns preset values, and `default` to every other declared variable.
#[derive(Debug, Clone, Default)]
pub struct FixedAssignment {
    values: BTreeMap<String, u8>,
    default: u8,
}

impl FixedAssignment {
    /// Every variable set to `value`.
    pub fn uniform(value: u8) -> Self {
        Self {
            values: BTreeMap::new(),
            default: value,
        }
    }

    /// Named variables set to 1, everything else 0.
    pub fn selecting<I, S>(vars: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: vars.into_iter().map(|v| (v.into(), 1)).collect(),
            default: 0,
        }
    }
}

impl Optimizer for FixedAssignment {
    fn solve(&self, program: &Program) -> Result<Assignment> {
        Ok(program
            .binaries
            .iter()
            .map(|var| {
                let value = self.values.get(var).copied().unwrap_or(self.default);
                (var.clone(), value)
            })
            .collect())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}
