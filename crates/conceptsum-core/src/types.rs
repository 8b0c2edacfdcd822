//! Summarization problems, documents and sentences.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::LengthUnit;

/// A normalized token: lowercased surface form plus its stem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub word: String,
    pub stem: String,
}

/// A source sentence with provenance.
///
/// `original` never changes after loading. `text` is the working text that
/// acronym stripping may rewrite; `tokens` are always derived from `text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    /// Index unique within the problem's new sentences.
    pub index: usize,
    pub original: String,
    pub text: String,
    #[serde(default)]
    pub tokens: Vec<Token>,
    pub doc_id: String,
    /// Position of the owning document within the problem.
    pub doc_index: usize,
    /// Position within the owning document.
    pub order: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl Sentence {
    pub fn new(
        original: impl Into<String>,
        doc_id: impl Into<String>,
        doc_index: usize,
        order: usize,
        date: Option<NaiveDate>,
    ) -> Self {
        let original = original.into();
        Self {
            index: 0,
            text: original.clone(),
            original,
            tokens: Vec::new(),
            doc_id: doc_id.into(),
            doc_index,
            order,
            date,
        }
    }

    /// Length of the working text in the given unit.
    pub fn length(&self, unit: LengthUnit) -> usize {
        unit.measure(&self.text)
    }

    /// Replace the working text and its derived tokens.
    pub fn set_text(&mut self, text: impl Into<String>, tokens: Vec<Token>) {
        self.text = text.into();
        self.tokens = tokens;
    }

    /// Stems in sentence order.
    pub fn stems(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(|t| t.stem.as_str())
    }

    /// Key used for document-order comparisons.
    pub fn position(&self) -> (usize, usize) {
        (self.doc_index, self.order)
    }
}

/// A source document: ordered sentences plus an optional publication date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub sentences: Vec<Sentence>,
}

impl Document {
    /// Build a document from already-split sentence strings.
    pub fn from_sentences(
        id: impl Into<String>,
        date: Option<NaiveDate>,
        doc_index: usize,
        sentences: impl IntoIterator<Item = String>,
    ) -> Self {
        let id = id.into();
        let sentences = sentences
            .into_iter()
            .enumerate()
            .map(|(order, text)| Sentence::new(text, id.clone(), doc_index, order, date))
            .collect();
        Self {
            id,
            date,
            sentences,
        }
    }
}

/// The topic statement that steers concept weighting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Query {
    pub title: String,
    pub narrative: String,
    #[serde(default)]
    pub tokens: Vec<Token>,
}

impl Query {
    pub fn new(title: impl Into<String>, narrative: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            narrative: narrative.into(),
            tokens: Vec::new(),
        }
    }

    /// Title and narrative as one text.
    pub fn original(&self) -> String {
        match (self.title.is_empty(), self.narrative.is_empty()) {
            (true, _) => self.narrative.clone(),
            (false, true) => self.title.clone(),
            (false, false) => format!("{}. {}", self.title, self.narrative),
        }
    }
}

/// One summarization problem: a document cluster, background, query and budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    pub id: String,
    pub query: Query,
    pub new_docs: Vec<Document>,
    #[serde(default)]
    pub old_docs: Vec<Document>,
    pub length_limit: i64,
}

impl Problem {
    /// Create a problem and number its new sentences consecutively.
    pub fn new(
        id: impl Into<String>,
        query: Query,
        new_docs: Vec<Document>,
        old_docs: Vec<Document>,
        length_limit: i64,
    ) -> Self {
        let mut problem = Self {
            id: id.into(),
            query,
            new_docs,
            old_docs,
            length_limit,
        };
        problem.reindex();
        problem
    }

    /// Renumber new sentences in document order.
    pub fn reindex(&mut self) {
        let mut next = 0;
        for (doc_index, doc) in self.new_docs.iter_mut().enumerate() {
            for (order, sentence) in doc.sentences.iter_mut().enumerate() {
                sentence.index = next;
                sentence.doc_index = doc_index;
                sentence.order = order;
                next += 1;
            }
        }
    }

    pub fn new_sentences(&self) -> impl Iterator<Item = &Sentence> {
        self.new_docs.iter().flat_map(|d| d.sentences.iter())
    }

    pub fn new_sentences_mut(&mut self) -> impl Iterator<Item = &mut Sentence> {
        self.new_docs.iter_mut().flat_map(|d| d.sentences.iter_mut())
    }

    pub fn old_sentences(&self) -> impl Iterator<Item = &Sentence> {
        self.old_docs.iter().flat_map(|d| d.sentences.iter())
    }

    pub fn old_sentences_mut(&mut self) -> impl Iterator<Item = &mut Sentence> {
        self.old_docs.iter_mut().flat_map(|d| d.sentences.iter_mut())
    }

    pub fn sentence_count(&self) -> usize {
        self.new_docs.iter().map(|d| d.sentences.len()).sum()
    }

    /// Drop document contents once the problem's output has been written.
    pub fn release_documents(&mut self) {
        tracing::debug!("{}: releasing {} sentences", self.id, self.sentence_count());
        self.new_docs = Vec::new();
        self.old_docs = Vec::new();
    }
}
