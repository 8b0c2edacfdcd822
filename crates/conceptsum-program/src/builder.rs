//! Formulation of sentence selection as a budgeted concept-coverage program.
//!
//! Variables: `s<i>` per candidate sentence, `c<j>` per weighted concept the
//! pool covers and `a<k>` per acronym whose definition a selection would
//! need. The objective maximizes the total weight of covered concepts.

use std::collections::BTreeMap;

use tracing::debug;

use conceptsum_concepts::{Concept, ConceptMapping, ConceptWeightSet};
use conceptsum_core::{CoverageMode, Error, LengthUnit, Result, Sentence};
use conceptsum_ingest::{find_word, AcronymTable};

use crate::linear::*;

/// Builds a [`Program`] from weighted concepts and a candidate pool.
#[derive(Debug, Clone)]
pub struct ProgramBuilder {
    length_limit: i64,
    unit: LengthUnit,
    coverage: CoverageMode,
    acronyms: AcronymTable,
}

impl ProgramBuilder {
    pub fn new(length_limit: i64, unit: LengthUnit) -> Self {
        Self {
            length_limit,
            unit,
            coverage: CoverageMode::default(),
            acronyms: AcronymTable::new(),
        }
    }

    pub fn coverage(mut self, mode: CoverageMode) -> Self {
        self.coverage = mode;
        self
    }

    /// Charge the definition cost of each acronym a selection uses.
    pub fn acronyms(mut self, table: AcronymTable) -> Self {
        self.acronyms = table;
        self
    }

    pub fn build(
        &self,
        problem_id: &str,
        weights: &ConceptWeightSet,
        mapping: &ConceptMapping,
        pool: &[&Sentence],
    ) -> Result<Program> {
        if self.length_limit <= 0 {
            return Err(Error::construction(
                problem_id,
                format!("length limit must be positive, got {}", self.length_limit),
            ));
        }
        if pool.is_empty() {
            return Err(Error::construction(problem_id, "no candidate sentences"));
        }

        let mut coverage = Coverage {
            all_or_nothing: self.coverage == CoverageMode::AllOrNothing,
            ..Coverage::default()
        };
        let mut binaries = std::collections::BTreeSet::new();
        let mut registry = BTreeMap::new();

        // Concept → covering sentence variables, for concepts with weight.
        let mut covering: BTreeMap<&Concept, Vec<String>> = BTreeMap::new();
        let mut length_row = LinearExpr::new();
        for sentence in pool {
            let var = sentence_var(sentence.index);
            length_row.add_term(var.clone(), sentence.length(self.unit) as f64);
            coverage
                .lengths
                .insert(var.clone(), sentence.length(self.unit) as f64);
            for concept in mapping.concepts_of(sentence) {
                if weights.weight(concept) > 0.0 {
                    covering.entry(concept).or_default().push(var.clone());
                }
            }
            binaries.insert(var.clone());
            registry.insert(var, (*sentence).clone());
        }

        let mut objective = LinearExpr::new();
        let mut constraints = Vec::new();
        let mut concepts = BTreeMap::new();
        for (j, (concept, sentences)) in covering.iter().enumerate() {
            let c = concept_var(j);
            let weight = weights.weight(concept);
            objective.add_term(c.clone(), weight);

            let mut row = LinearExpr::new().with_term(c.clone(), 1.0);
            for s in sentences {
                row.add_term(s.clone(), -1.0);
                coverage.covers.entry(s.clone()).or_default().push(c.clone());
                if coverage.all_or_nothing {
                    constraints.push(Constraint::new(
                        format!("inc_{}_{}", j, s),
                        LinearExpr::new().with_term(s.clone(), 1.0).with_term(c.clone(), -1.0),
                        Sense::Le,
                        0.0,
                    ));
                }
            }
            constraints.push(Constraint::new(format!("cov_{}", j), row, Sense::Le, 0.0));

            coverage.concept_weights.insert(c.clone(), weight);
            binaries.insert(c.clone());
            concepts.insert(c, (*concept).clone());
        }

        for (k, (short, _)) in self.acronyms.iter().enumerate() {
            let users: Vec<&Sentence> = pool
                .iter()
                .copied()
                .filter(|s| find_word(&s.text, short).is_some())
                .collect();
            if users.is_empty() {
                continue;
            }
            let a = acronym_var(k);
            let cost = self.acronyms.definition_cost(short, self.unit) as f64;
            length_row.add_term(a.clone(), cost);
            for s in users {
                let var = sentence_var(s.index);
                constraints.push(Constraint::new(
                    format!("acr_{}_{}", k, var),
                    LinearExpr::new().with_term(var.clone(), 1.0).with_term(a.clone(), -1.0),
                    Sense::Le,
                    0.0,
                ));
                coverage.acronym_links.entry(var).or_default().push(a.clone());
            }
            coverage.acronym_costs.insert(a.clone(), cost);
            binaries.insert(a);
        }

        constraints.insert(
            0,
            Constraint::new("length", length_row, Sense::Le, self.length_limit as f64),
        );

        debug!(
            "{}: program with {} sentences, {} concepts, {} acronyms, {} constraints",
            problem_id,
            registry.len(),
            concepts.len(),
            coverage.acronym_costs.len(),
            constraints.len()
        );

        Ok(Program {
            problem_id: problem_id.to_string(),
            objective,
            constraints,
            binaries,
            binary: registry,
            concepts,
            acronyms: self.acronyms.clone(),
            length_limit: self.length_limit,
            unit: self.unit,
            coverage,
        })
    }
}
