//! Heuristic n-gram concept weighting.
//!
//! Concepts are stemmed n-grams; a concept's weight is the number of new
//! documents it occurs in, boosted when the query mentions it and discounted
//! when the background (old) documents already covered it.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use tracing::debug;

use conceptsum_core::{LengthUnit, Problem, Sentence, WeighterConfig};
use conceptsum_ingest::extract::stopwords::is_stopword;

use crate::types::*;

/// Extracts and weights concepts for a problem.
pub trait ConceptWeighter: Send + Sync {
    /// Map a prepared problem to concepts, weight sets and a candidate pool.
    ///
    /// Must be deterministic: identical sentence text yields an identical
    /// mapping.
    fn map_concepts(&self, problem: &Problem, unit: LengthUnit) -> ConceptMapping;
}

/// Document-frequency weighting of stemmed n-grams.
#[derive(Debug, Clone, Default)]
pub struct HeuristicWeighter {
    config: WeighterConfig,
}

impl HeuristicWeighter {
    pub fn new(config: WeighterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WeighterConfig {
        &self.config
    }

    /// Concepts expressed by a sentence, sorted and unique.
    pub fn sentence_concepts(&self, sentence: &Sentence) -> Vec<Concept> {
        let n = self.config.ngram.max(1);
        let tokens = &sentence.tokens;
        if tokens.len() < n {
            return Vec::new();
        }
        let concepts: BTreeSet<Concept> = tokens
            .windows(n)
            .filter(|gram| !gram.iter().all(|t| is_stopword(&t.word)))
            .filter(|gram| !gram.iter().any(|t| t.word.chars().all(|c| c.is_ascii_digit())))
            .map(|gram| Concept::from_stems(gram.iter().map(|t| t.stem.as_str())))
            .collect();
        concepts.into_iter().collect()
    }

    /// Lower the document-frequency threshold until enough concepts survive.
    fn threshold(&self, doc_freq: &BTreeMap<Concept, usize>) -> usize {
        let mut threshold = self.config.min_doc_freq.max(1);
        while threshold > 1
            && doc_freq.values().filter(|&&df| df >= threshold).count() < self.config.min_concepts
        {
            threshold -= 1;
        }
        threshold
    }

    fn candidates(
        &self,
        problem: &Problem,
        unit: LengthUnit,
        sentence_concepts: &BTreeMap<usize, Vec<Concept>>,
        weights: &ConceptWeightSet,
    ) -> Vec<usize> {
        let limit = usize::try_from(problem.length_limit).unwrap_or(0);
        let mut scored: Vec<(f64, &Sentence)> = problem
            .new_sentences()
            .filter(|s| LengthUnit::Words.measure(&s.text) >= self.config.min_sentence_words)
            .filter(|s| s.length(unit) <= limit)
            .filter_map(|s| {
                let score: f64 = sentence_concepts
                    .get(&s.index)?
                    .iter()
                    .map(|c| weights.weight(c))
                    .sum();
                (score > 0.0).then_some((score, s))
            })
            .collect();

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.position().cmp(&b.1.position()))
        });
        scored.truncate(self.config.max_candidates);

        let mut pool: Vec<usize> = scored.into_iter().map(|(_, s)| s.index).collect();
        pool.sort_unstable();
        pool
    }
}

impl ConceptWeighter for HeuristicWeighter {
    fn map_concepts(&self, problem: &Problem, unit: LengthUnit) -> ConceptMapping {
        let mut sentence_concepts: BTreeMap<usize, Vec<Concept>> = BTreeMap::new();
        let mut doc_freq: BTreeMap<Concept, usize> = BTreeMap::new();

        for doc in &problem.new_docs {
            let mut in_doc: BTreeSet<Concept> = BTreeSet::new();
            for sentence in &doc.sentences {
                let concepts = self.sentence_concepts(sentence);
                in_doc.extend(concepts.iter().cloned());
                sentence_concepts.insert(sentence.index, concepts);
            }
            for concept in in_doc {
                *doc_freq.entry(concept).or_insert(0) += 1;
            }
        }

        let old_concepts: HashSet<Concept> = problem
            .old_sentences()
            .flat_map(|s| self.sentence_concepts(s))
            .collect();
        let query_stems: HashSet<&str> =
            problem.query.tokens.iter().map(|t| t.stem.as_str()).collect();

        let threshold = self.threshold(&doc_freq);
        let mut primary = ConceptWeightSet::new();
        let mut raw = ConceptWeightSet::new();
        for (concept, &df) in doc_freq.iter().filter(|(_, df)| **df >= threshold) {
            let mut weight = df as f64;
            raw.insert(concept.clone(), weight);
            if !query_stems.is_empty() && concept.stems().all(|s| query_stems.contains(s)) {
                weight *= 1.0 + self.config.query_boost;
            }
            if old_concepts.contains(concept) {
                weight *= self.config.old_discount;
            }
            if weight > 0.0 {
                primary.insert(concept.clone(), weight);
            }
        }

        let candidates = self.candidates(problem, unit, &sentence_concepts, &primary);
        debug!(
            "{}: {} concepts (df >= {}), {} candidates, fingerprint {}",
            problem.id,
            primary.len(),
            threshold,
            candidates.len(),
            &primary.fingerprint()[..12]
        );

        ConceptMapping {
            weights: ConceptWeights(vec![primary, raw]),
            sentence_concepts,
            candidates,
        }
    }
}
