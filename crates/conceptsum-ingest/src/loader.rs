//! Problem loading from JSON problem sets or plain-text files.

use chrono::NaiveDate;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

use conceptsum_core::{Document, Error, Problem, Query, Result, TaskConfig};

use crate::text::{prepare_problem, split_sentences};

#[derive(Debug, Deserialize)]
struct ProblemSetRecord {
    problems: Vec<ProblemRecord>,
}

#[derive(Debug, Deserialize)]
struct ProblemRecord {
    id: String,
    #[serde(default)]
    query: QueryRecord,
    new_docs: Vec<DocumentRecord>,
    #[serde(default)]
    old_docs: Vec<DocumentRecord>,
}

#[derive(Debug, Default, Deserialize)]
struct QueryRecord {
    #[serde(default)]
    title: String,
    #[serde(default)]
    narrative: String,
}

#[derive(Debug, Deserialize)]
struct DocumentRecord {
    id: String,
    #[serde(default)]
    date: Option<NaiveDate>,
    /// Raw text, split with the ingest sentence splitter.
    #[serde(default)]
    text: Option<String>,
    /// Pre-split sentences; takes precedence over `text`.
    #[serde(default)]
    sentences: Option<Vec<String>>,
}

impl DocumentRecord {
    fn into_document(self, doc_index: usize) -> Result<Document> {
        let sentences = match (self.sentences, self.text) {
            (Some(sentences), _) => sentences,
            (None, Some(text)) => split_sentences(&text),
            (None, None) => {
                return Err(Error::Input(format!(
                    "document {} has neither text nor sentences",
                    self.id
                )))
            }
        };
        Ok(Document::from_sentences(self.id, self.date, doc_index, sentences))
    }
}

fn into_documents(records: Vec<DocumentRecord>) -> Result<Vec<Document>> {
    records
        .into_iter()
        .enumerate()
        .map(|(i, r)| r.into_document(i))
        .collect()
}

/// Load every problem in `path` and prepare it for a run.
///
/// `.json` files hold a problem set; any other file is read as plain text
/// forming a single problem whose documents are separated by blank lines
/// and whose id is the file stem.
pub fn load_problems(path: &Path, task: &TaskConfig) -> Result<Vec<Problem>> {
    let content = std::fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let mut problems = if is_json {
        parse_problem_set(&content, task)?
    } else {
        let id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("summary");
        vec![parse_text_problem(id, &content, task)?]
    };

    for problem in &mut problems {
        prepare_problem(problem);
    }
    info!(
        "Loaded {} problems from {} ({})",
        problems.len(),
        path.display(),
        task.name
    );
    Ok(problems)
}

/// Parse a JSON problem set.
pub fn parse_problem_set(content: &str, task: &TaskConfig) -> Result<Vec<Problem>> {
    let set: ProblemSetRecord = serde_json::from_str(content)?;
    if set.problems.is_empty() {
        return Err(Error::Input("problem set is empty".into()));
    }
    set.problems
        .into_iter()
        .map(|record| {
            Ok(Problem::new(
                record.id,
                Query::new(record.query.title, record.query.narrative),
                into_documents(record.new_docs)?,
                into_documents(record.old_docs)?,
                task.length_limit,
            ))
        })
        .collect()
}

/// Build a single query-less problem from plain text.
pub fn parse_text_problem(id: &str, content: &str, task: &TaskConfig) -> Result<Problem> {
    let docs: Vec<Document> = content
        .split("\n\n")
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .enumerate()
        .map(|(i, block)| {
            Document::from_sentences(format!("{}.{}", id, i), None, i, split_sentences(block))
        })
        .collect();
    if docs.is_empty() {
        return Err(Error::Input(format!("{} contains no text", id)));
    }
    Ok(Problem::new(id, Query::default(), docs, Vec::new(), task.length_limit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use conceptsum_core::LengthUnit;

    fn task() -> TaskConfig {
        TaskConfig::custom("test", 100, LengthUnit::Words)
    }

    #[test]
    fn test_parse_problem_set() {
        let json = r#"{
            "problems": [{
                "id": "D0801-A",
                "query": {"title": "Hurricane", "narrative": "Describe the damage."},
                "new_docs": [
                    {"id": "APW1", "date": "2008-03-02", "text": "Winds reached 120 mph. Roofs were torn off."},
                    {"id": "APW2", "sentences": ["Power was cut.", "Schools closed."]}
                ],
                "old_docs": [{"id": "OLD1", "text": "A storm formed."}]
            }]
        }"#;
        let problems = parse_problem_set(json, &task()).unwrap();
        assert_eq!(problems.len(), 1);
        let p = &problems[0];
        assert_eq!(p.id, "D0801-A");
        assert_eq!(p.sentence_count(), 4);
        assert_eq!(p.length_limit, 100);
        assert_eq!(p.new_docs[0].date, NaiveDate::from_ymd_opt(2008, 3, 2));
        let indices: Vec<usize> = p.new_sentences().map(|s| s.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert_eq!(p.new_docs[1].sentences[0].doc_index, 1);
        assert_eq!(p.old_docs.len(), 1);
    }

    #[test]
    fn test_document_without_text_is_rejected() {
        let json = r#"{"problems": [{"id": "X", "new_docs": [{"id": "d"}]}]}"#;
        assert!(matches!(parse_problem_set(json, &task()), Err(Error::Input(_))));
    }

    #[test]
    fn test_load_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("floods.txt");
        std::fs::write(&path, "Rivers rose. Towns flooded.\n\nThe army helped.").unwrap();
        let problems = load_problems(&path, &task()).unwrap();
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].id, "floods");
        assert_eq!(problems[0].new_docs.len(), 2);
        let first = problems[0].new_sentences().next().unwrap();
        assert!(!first.tokens.is_empty());
    }
}
