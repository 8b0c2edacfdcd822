//! End-to-end runs of the summarization pipeline.

use std::path::Path;
use std::sync::Arc;

use conceptsum_concepts::{
    Concept, ConceptMapping, ConceptWeightSet, ConceptWeighter, ConceptWeights, HeuristicWeighter,
};
use conceptsum_core::{Document, Error, LengthUnit, Problem, Query, RunConfig, TaskConfig};
use conceptsum_program::{BranchAndBound, FixedAssignment, Optimizer};
use conceptsum_runtime::{BatchRunner, SummaryPipeline};

/// Gives every sentence its own concept of weight 1.
struct EqualWeights {
    /// Problems with this id get an empty candidate pool.
    empty_pool_for: Option<&'static str>,
}

impl ConceptWeighter for EqualWeights {
    fn map_concepts(&self, problem: &Problem, _unit: LengthUnit) -> ConceptMapping {
        let mut weights = ConceptWeightSet::new();
        let mut mapping = ConceptMapping::default();
        let keep = self.empty_pool_for != Some(problem.id.as_str());
        for s in problem.new_sentences() {
            let concept = Concept(format!("topic {}", s.index));
            weights.insert(concept.clone(), 1.0);
            mapping.sentence_concepts.insert(s.index, vec![concept]);
            if keep {
                mapping.candidates.push(s.index);
            }
        }
        mapping.weights = ConceptWeights(vec![weights]);
        mapping
    }
}

/// Panics while weighting one problem, weighs the others like `EqualWeights`.
struct PanicsOn(&'static str);

impl ConceptWeighter for PanicsOn {
    fn map_concepts(&self, problem: &Problem, unit: LengthUnit) -> ConceptMapping {
        if problem.id == self.0 {
            panic!("weighting {} failed", problem.id);
        }
        EqualWeights { empty_pool_for: None }.map_concepts(problem, unit)
    }
}

fn three_equal_sentences(id: &str) -> Problem {
    let doc = Document::from_sentences(
        "APW20080301",
        None,
        0,
        vec![
            "Alpha one two three four five six seven eight nine.".to_string(),
            "Beta one two three four five six seven eight nine.".to_string(),
            "Gamma one two three four five six seven eight nine.".to_string(),
        ],
    );
    Problem::new(id, Query::default(), vec![doc], vec![], 20)
}

fn config(dir: &Path, compress: bool) -> Arc<RunConfig> {
    let mut config = RunConfig::new(TaskConfig::custom("test", 20, LengthUnit::Words), dir);
    config.compress = compress;
    Arc::new(config)
}

fn pipeline(
    dir: &Path,
    compress: bool,
    weighter: EqualWeights,
    optimizer: impl Optimizer + 'static,
) -> SummaryPipeline {
    SummaryPipeline::new(config(dir, compress), Arc::new(weighter), Arc::new(optimizer)).unwrap()
}

#[test]
fn test_equal_sentences_fill_the_budget() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(
        dir.path(),
        false,
        EqualWeights { empty_pool_for: None },
        BranchAndBound::default(),
    );
    let report = pipeline.run(three_equal_sentences("D0801")).unwrap();

    assert_eq!(report.selected, 2);
    assert_eq!(report.length, 20);
    assert_eq!(report.objective, 2.0);
    let text = std::fs::read_to_string(dir.path().join("D0801")).unwrap();
    assert_eq!(text.lines().count(), 2);
    assert!(text.lines().all(|l| l.split_whitespace().count() == 10));
}

#[test]
fn test_empty_pool_is_construction_error_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(
        dir.path(),
        false,
        EqualWeights { empty_pool_for: Some("D0802") },
        BranchAndBound::default(),
    );
    let err = pipeline.run(three_equal_sentences("D0802")).unwrap_err();

    assert!(matches!(err, Error::Construction { .. }));
    assert!(!dir.path().join("D0802").exists());
}

#[test]
fn test_empty_assignment_is_solver_failure_naming_problem() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(
        dir.path(),
        false,
        EqualWeights { empty_pool_for: None },
        FixedAssignment::uniform(0),
    );
    let err = pipeline.run(three_equal_sentences("D0803")).unwrap_err();

    assert!(matches!(err, Error::Solver { .. }));
    assert!(err.to_string().contains("D0803"));
    assert!(!dir.path().join("D0803").exists());
}

fn acronym_problem(id: &str) -> Problem {
    let doc = Document::from_sentences(
        "XIE20080302",
        None,
        0,
        vec![
            "The World Health Organization (WHO) warned of a new outbreak.".to_string(),
            "Doctors at the World Health Organization said the WHO lacked funds.".to_string(),
        ],
    );
    Problem::new(id, Query::default(), vec![doc], vec![], 30)
}

#[test]
fn test_present_long_form_is_not_defined_again() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(
        dir.path(),
        true,
        EqualWeights { empty_pool_for: None },
        FixedAssignment::selecting(["s0", "s1", "a0"]),
    );
    let report = pipeline.run(acronym_problem("D0804")).unwrap();
    let text = std::fs::read_to_string(&report.output).unwrap();

    assert_eq!(text.matches("World Health Organization").count(), 1);
    assert!(!text.contains("(WHO)"));
    assert!(text.starts_with("The WHO warned"));
}

#[test]
fn test_stripped_definition_is_restored_once() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(
        dir.path(),
        true,
        EqualWeights { empty_pool_for: None },
        FixedAssignment::selecting(["s0", "a0"]),
    );
    let report = pipeline.run(acronym_problem("D0805")).unwrap();
    let text = std::fs::read_to_string(&report.output).unwrap();

    assert_eq!(
        text,
        "The World Health Organization (WHO) warned of a new outbreak."
    );
}

fn compressed_problem(id: &str, sentences: &[&str]) -> Problem {
    let doc = Document::from_sentences(
        "AFP20080303",
        None,
        0,
        sentences.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
    );
    Problem::new(id, Query::default(), vec![doc], vec![], 30)
}

#[test]
fn test_definition_glued_to_long_form() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(
        dir.path(),
        true,
        EqualWeights { empty_pool_for: None },
        FixedAssignment::selecting(["s0", "s1", "a0"]),
    );
    let problem = compressed_problem(
        "D0806",
        &[
            "Troops of the United States(US) Army (USA) deployed overseas.",
            "The US Army returned home on Friday.",
        ],
    );
    let report = pipeline.run(problem).unwrap();
    let text = std::fs::read_to_string(&report.output).unwrap();

    assert_eq!(
        text,
        "Troops of the United States (US) Army (USA) deployed overseas.\n\
         The US Army returned home on Friday."
    );
}

#[test]
fn test_long_form_holding_another_acronym_is_not_expanded() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(
        dir.path(),
        true,
        EqualWeights { empty_pool_for: None },
        FixedAssignment::selecting(["s0", "s2", "a0", "a1"]),
    );
    let problem = compressed_problem(
        "D0807",
        &[
            "The North Atlantic Treaty Organization (NATO) held talks in Brussels.",
            "Ministers said the NATO Response Force (NRF) was ready.",
            "The NRF deployed on Monday to the border.",
        ],
    );
    let report = pipeline.run(problem).unwrap();
    let text = std::fs::read_to_string(&report.output).unwrap();

    assert_eq!(
        text,
        "The North Atlantic Treaty Organization (NATO) held talks in Brussels.\n\
         The NATO Response Force (NRF) deployed on Monday to the border."
    );
    assert_eq!(text.matches("North Atlantic Treaty Organization").count(), 1);
}

#[tokio::test]
async fn test_panicking_worker_is_reported_by_problem_id() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = SummaryPipeline::new(
        config(dir.path(), false),
        Arc::new(PanicsOn("D0905")),
        Arc::new(BranchAndBound::default()),
    )
    .unwrap();
    let report = BatchRunner::new(pipeline, 1)
        .run(vec![
            three_equal_sentences("D0904"),
            three_equal_sentences("D0905"),
            three_equal_sentences("D0906"),
        ])
        .await;

    assert_eq!(report.completed.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].problem_id, "D0905");
    assert!(report.failed[0].error.contains("panicked"));
    assert!(!dir.path().join("D0905").exists());
}

#[tokio::test]
async fn test_batch_isolates_failures() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(
        dir.path(),
        false,
        EqualWeights { empty_pool_for: Some("D0902") },
        BranchAndBound::default(),
    );
    let runner = BatchRunner::new(pipeline, 2);
    let problems = vec![
        three_equal_sentences("D0901"),
        three_equal_sentences("D0902"),
        three_equal_sentences("D0903"),
    ];
    let report = runner.run(problems).await;

    let completed: Vec<&str> = report.completed.iter().map(|r| r.problem_id.as_str()).collect();
    assert_eq!(completed, vec!["D0901", "D0903"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].problem_id, "D0902");
    assert!(!report.is_success());
    assert!(dir.path().join("D0901").exists());
    assert!(!dir.path().join("D0902").exists());
    assert!(dir.path().join("D0903").exists());
}

#[tokio::test]
async fn test_aborted_batch_starts_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(
        dir.path(),
        false,
        EqualWeights { empty_pool_for: None },
        BranchAndBound::default(),
    );
    let runner = BatchRunner::new(pipeline, 1);
    runner.abort_handle().abort();
    let report = runner
        .run(vec![three_equal_sentences("D1001"), three_equal_sentences("D1002")])
        .await;

    assert_eq!(report.skipped, vec!["D1001".to_string(), "D1002".to_string()]);
    assert!(report.completed.is_empty());
    assert!(!dir.path().join("D1001").exists());
}

#[tokio::test]
async fn test_json_problem_set_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("problems.json");
    std::fs::write(
        &input,
        r#"{
            "problems": [{
                "id": "D0848-A",
                "query": {"title": "Bird flu", "narrative": "Track the spread of bird flu."},
                "new_docs": [
                    {"id": "AFP1", "date": "2006-02-10", "text": "Bird flu spread to poultry farms in Nigeria. Officials culled thousands of chickens near Kano."},
                    {"id": "AFP2", "date": "2006-02-11", "text": "The bird flu outbreak reached farms outside Lagos. Health officials urged farmers to report sick chickens."},
                    {"id": "AFP3", "date": "2006-02-12", "text": "Nigeria asked for help as bird flu spread to more farms. Thousands of chickens were culled."}
                ],
                "old_docs": []
            }]
        }"#,
    )
    .unwrap();

    let mut config = RunConfig::new(
        TaskConfig::custom("test", 25, LengthUnit::Words),
        dir.path().join("out"),
    );
    config.weighter.min_doc_freq = 2;
    config.weighter.min_sentence_words = 4;
    let config = Arc::new(config);

    let problems = conceptsum_ingest::load_problems(&input, &config.task).unwrap();
    let pipeline = SummaryPipeline::new(
        config.clone(),
        Arc::new(HeuristicWeighter::new(config.weighter.clone())),
        Arc::new(BranchAndBound::default()),
    )
    .unwrap();
    let report = BatchRunner::new(pipeline, 2).run(problems).await;

    assert!(report.is_success());
    let summary = &report.completed[0];
    assert!(summary.selected >= 1);
    assert!(summary.length <= 25);
    let text = std::fs::read_to_string(&summary.output).unwrap();
    assert!(text.to_lowercase().contains("bird flu") || text.contains("chickens"));
}
