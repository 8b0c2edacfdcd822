//! Per-problem summarization pipeline.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use conceptsum_compress::assemble;
use conceptsum_concepts::{ConceptWeighter, HeuristicWeighter};
use conceptsum_core::{Error, Problem, Result, RunConfig, Sentence};
use conceptsum_ingest::{prepare_problem, strip_definitions, AcronymTable};
use conceptsum_order::order_sentences;
use conceptsum_program::{create_optimizer, decode, Optimizer, ProgramBuilder};

use crate::output::OutputWriter;
use crate::types::*;

/// A finished summary, before it is written.
#[derive(Debug, Clone)]
pub struct Summary {
    pub problem_id: String,
    /// Selected sentences in reading order.
    pub sentences: Vec<Sentence>,
    pub text: String,
    pub objective: f64,
    pub candidates: usize,
}

/// Runs problems through weighting, selection, ordering and assembly.
///
/// Holds only shared read-only state, so one pipeline serves every worker.
pub struct SummaryPipeline {
    config: Arc<RunConfig>,
    weighter: Arc<dyn ConceptWeighter>,
    optimizer: Arc<dyn Optimizer>,
    writer: OutputWriter,
}

impl SummaryPipeline {
    pub fn new(
        config: Arc<RunConfig>,
        weighter: Arc<dyn ConceptWeighter>,
        optimizer: Arc<dyn Optimizer>,
    ) -> Result<Self> {
        let writer = OutputWriter::new(&config.output_dir)?;
        Ok(Self {
            config,
            weighter,
            optimizer,
            writer,
        })
    }

    /// Pipeline with the heuristic weighter and the configured optimizer.
    pub fn from_config(config: Arc<RunConfig>) -> Result<Self> {
        let weighter = Arc::new(HeuristicWeighter::new(config.weighter.clone()));
        let optimizer = create_optimizer(&config.solver);
        Self::new(config, weighter, optimizer)
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Select, order and assemble the summary of one problem.
    pub fn summarize(&self, problem: &mut Problem) -> Result<Summary> {
        let unit = self.config.task.length_unit;

        // Stage 1: Reset working text; strip acronym definitions when compressing
        prepare_problem(problem);
        let acronyms = if self.config.compress {
            strip_definitions(problem)
        } else {
            AcronymTable::new()
        };

        // Stage 2: Concept weights and candidate pool
        let mapping = self.weighter.map_concepts(problem, unit);
        let weights = mapping
            .weights
            .primary()
            .ok_or_else(|| Error::construction(&problem.id, "weighter produced no weight set"))?;
        let pool = mapping.candidate_pool(problem);

        // Stage 3: Program
        let program = ProgramBuilder::new(problem.length_limit, unit)
            .coverage(self.config.coverage)
            .acronyms(acronyms)
            .build(&problem.id, weights, &mapping, &pool)?;

        // Stage 4: Solve and decode
        let solve_start = Instant::now();
        let assignment = self.optimizer.solve(&program)?;
        debug!(
            "{}: {} solved in {:?}",
            problem.id,
            self.optimizer.name(),
            solve_start.elapsed()
        );
        let selection = decode(&program, &assignment)?;

        // Stage 5: Order and assemble
        let ordered = order_sentences(self.config.ordering(), selection, weights, &mapping);
        let text = if self.config.compress {
            assemble(&ordered, &program.acronyms)
        } else {
            ordered.iter().map(|s| format!("{}\n", s.text)).collect()
        };

        Ok(Summary {
            problem_id: problem.id.clone(),
            sentences: ordered,
            text,
            objective: program.objective_value(&assignment),
            candidates: pool.len(),
        })
    }

    /// Summarize, write the output file and release the problem's documents.
    ///
    /// On error no output file is written for the problem.
    pub fn run(&self, mut problem: Problem) -> Result<ProblemReport> {
        let start = Instant::now();
        let sentences = problem.new_sentences().count();
        let summary = self.summarize(&mut problem)?;
        let output = self.writer.write(&summary.problem_id, &summary.text)?;
        problem.release_documents();

        let unit = self.config.task.length_unit;
        let length: usize = summary.sentences.iter().map(|s| s.length(unit)).sum();
        info!(
            "{}: {} sentences, {} candidates, selected {} ({} {})",
            summary.problem_id,
            sentences,
            summary.candidates,
            summary.sentences.len(),
            length,
            unit
        );

        Ok(ProblemReport {
            problem_id: summary.problem_id,
            sentences,
            candidates: summary.candidates,
            selected: summary.sentences.len(),
            length,
            objective: summary.objective,
            output,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conceptsum_core::{Document, LengthUnit, Query, TaskConfig};
    use conceptsum_program::FixedAssignment;

    fn problem() -> Problem {
        let docs = vec![
            Document::from_sentences(
                "APW1",
                None,
                0,
                vec![
                    "Floodwaters forced thousands of residents from their homes on Sunday."
                        .to_string(),
                    "Rescue crews used boats to reach stranded families.".to_string(),
                ],
            ),
            Document::from_sentences(
                "NYT1",
                None,
                1,
                vec![
                    "Thousands of residents fled rising floodwaters along the river.".to_string(),
                    "Officials said rescue crews reached stranded families by boat.".to_string(),
                ],
            ),
        ];
        Problem::new("D0901", Query::new("Floods", "Describe the evacuation."), docs, vec![], 12)
    }

    fn config(dir: &std::path::Path, compress: bool) -> Arc<RunConfig> {
        let mut config = RunConfig::new(TaskConfig::custom("test", 12, LengthUnit::Words), dir);
        config.compress = compress;
        config.weighter.min_doc_freq = 1;
        config.weighter.min_sentence_words = 3;
        Arc::new(config)
    }

    #[test]
    fn test_run_writes_plain_summary() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = SummaryPipeline::from_config(config(dir.path(), false)).unwrap();
        let report = pipeline.run(problem()).unwrap();

        assert_eq!(report.problem_id, "D0901");
        assert_eq!(report.sentences, 4);
        assert!(report.selected >= 1);
        assert!(report.length <= 12);
        let text = std::fs::read_to_string(&report.output).unwrap();
        assert_eq!(text.lines().count(), report.selected);
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_solver_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), false);
        let pipeline = SummaryPipeline::new(
            config.clone(),
            Arc::new(HeuristicWeighter::new(config.weighter.clone())),
            Arc::new(FixedAssignment::uniform(0)),
        )
        .unwrap();
        let err = pipeline.run(problem()).unwrap_err();
        assert_eq!(err.problem_id(), Some("D0901"));
        assert!(!dir.path().join("D0901").exists());
    }

    #[test]
    fn test_summarize_is_repeatable() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = SummaryPipeline::from_config(config(dir.path(), true)).unwrap();
        let mut p = problem();
        let first = pipeline.summarize(&mut p).unwrap();
        let second = pipeline.summarize(&mut p).unwrap();
        assert_eq!(first.text, second.text);
        assert!((first.objective - second.objective).abs() < 1e-9);
    }
}
