//! Concept and weight-set types.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use conceptsum_core::{Problem, Sentence};

/// A concept key: space-joined stems of an n-gram.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Concept(pub String);

impl Concept {
    pub fn from_stems<'a>(stems: impl IntoIterator<Item = &'a str>) -> Self {
        Self(stems.into_iter().collect::<Vec<_>>().join(" "))
    }

    pub fn stems(&self) -> impl Iterator<Item = &str> {
        self.0.split(' ')
    }
}

impl std::fmt::Display for Concept {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Non-negative salience weight per concept.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConceptWeightSet {
    weights: BTreeMap<Concept, f64>,
}

impl ConceptWeightSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a weight; negative or non-finite weights are clamped to zero.
    pub fn insert(&mut self, concept: Concept, weight: f64) {
        let weight = if weight.is_finite() { weight.max(0.0) } else { 0.0 };
        self.weights.insert(concept, weight);
    }

    pub fn get(&self, concept: &Concept) -> Option<f64> {
        self.weights.get(concept).copied()
    }

    /// Weight of a concept, zero when absent.
    pub fn weight(&self, concept: &Concept) -> f64 {
        self.get(concept).unwrap_or(0.0)
    }

    pub fn contains(&self, concept: &Concept) -> bool {
        self.weights.contains_key(concept)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Concepts in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&Concept, f64)> {
        self.weights.iter().map(|(c, w)| (c, *w))
    }

    /// SHA-256 over the canonical `concept<TAB>weight` listing.
    ///
    /// Equal for equal concept sets, so repeated runs can be compared.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for (concept, weight) in &self.weights {
            hasher.update(concept.0.as_bytes());
            hasher.update(format!("\t{:.6}\n", weight).as_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

impl FromIterator<(Concept, f64)> for ConceptWeightSet {
    fn from_iter<I: IntoIterator<Item = (Concept, f64)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (concept, weight) in iter {
            set.insert(concept, weight);
        }
        set
    }
}

/// Alternative weight sets produced for one problem, in preference order.
///
/// Downstream stages consume only [`ConceptWeights::primary`]; the rest are
/// kept for inspection and for weighting schemes that combine several sets.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConceptWeights(pub Vec<ConceptWeightSet>);

impl ConceptWeights {
    /// The weight set the pipeline optimizes against.
    pub fn primary(&self) -> Option<&ConceptWeightSet> {
        self.0.first()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Output of a concept weighter for one problem.
#[derive(Debug, Clone, Default)]
pub struct ConceptMapping {
    pub weights: ConceptWeights,
    /// Sentence index → concepts it expresses (sorted, unique).
    pub sentence_concepts: BTreeMap<usize, Vec<Concept>>,
    /// Indices of sentences eligible for selection, in document order.
    pub candidates: Vec<usize>,
}

impl ConceptMapping {
    pub fn concepts_of(&self, sentence: &Sentence) -> &[Concept] {
        self.sentence_concepts
            .get(&sentence.index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Resolve the candidate pool against the problem's sentences.
    pub fn candidate_pool<'a>(&self, problem: &'a Problem) -> Vec<&'a Sentence> {
        let wanted: std::collections::BTreeSet<usize> = self.candidates.iter().copied().collect();
        problem
            .new_sentences()
            .filter(|s| wanted.contains(&s.index))
            .collect()
    }
}
