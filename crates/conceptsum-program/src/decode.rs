//! Mapping a solved assignment back to sentences.

use tracing::debug;

use conceptsum_core::{Error, Result, Sentence};

use crate::linear::{parse_sentence_var, Assignment, Program};

/// Selected sentences of a solved program, in index order.
///
/// Only variables named `s<index>` with value 1 are selections; concept and
/// acronym variables are ignored. An empty selection, a selection naming an
/// undeclared sentence, or one exceeding the length limit is a solver
/// failure for the program's problem.
pub fn decode(program: &Program, assignment: &Assignment) -> Result<Vec<Sentence>> {
    let mut selected = Vec::new();
    for (var, value) in assignment.iter() {
        if value != 1 || parse_sentence_var(var).is_none() {
            continue;
        }
        let sentence = program.binary.get(var).ok_or_else(|| {
            Error::solver(
                &program.problem_id,
                format!("assignment selects undeclared variable {}", var),
            )
        })?;
        selected.push(sentence.clone());
    }

    if selected.is_empty() {
        return Err(Error::solver(
            &program.problem_id,
            "empty selection, check the solver output",
        ));
    }

    let length: usize = selected.iter().map(|s| s.length(program.unit)).sum();
    if length as i64 > program.length_limit {
        return Err(Error::solver(
            &program.problem_id,
            format!(
                "selection of {} {} exceeds the limit of {}",
                length, program.unit, program.length_limit
            ),
        ));
    }

    selected.sort_by_key(|s| s.index);
    debug!(
        "{}: decoded {} sentences ({} {})",
        program.problem_id,
        selected.len(),
        length,
        program.unit
    );
    Ok(selected)
}
