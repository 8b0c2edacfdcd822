//! Similarity-dendrogram ordering.
//!
//! Sentences become weighted concept vectors and are merged bottom-up by
//! average-linkage cosine similarity. The leaves of the resulting tree,
//! read left to right, give the order: similar sentences end up adjacent,
//! and within a merge the cluster that starts earlier in the source
//! documents goes first.

use std::collections::BTreeMap;

use tracing::debug;

use conceptsum_concepts::{Concept, ConceptMapping, ConceptWeightSet};
use conceptsum_core::Sentence;

const EPS: f64 = 1e-12;

/// Sparse unit vector over concepts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConceptVector {
    dimensions: BTreeMap<Concept, f64>,
}

impl ConceptVector {
    /// Normalize `dimensions` to unit length; non-positive entries are dropped.
    pub fn from_dimensions(dimensions: impl IntoIterator<Item = (Concept, f64)>) -> Self {
        let mut dimensions: BTreeMap<Concept, f64> =
            dimensions.into_iter().filter(|(_, w)| *w > 0.0).collect();
        let norm = dimensions.values().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for value in dimensions.values_mut() {
                *value /= norm;
            }
        }
        Self { dimensions }
    }

    /// Vector of a sentence's concepts weighted by `weights`.
    pub fn for_sentence(
        sentence: &Sentence,
        weights: &ConceptWeightSet,
        mapping: &ConceptMapping,
    ) -> Self {
        Self::from_dimensions(
            mapping
                .concepts_of(sentence)
                .iter()
                .map(|c| (c.clone(), weights.weight(c))),
        )
    }

    /// Cosine similarity; zero when either vector is empty.
    pub fn cosine_similarity(&self, other: &ConceptVector) -> f64 {
        self.dimensions
            .iter()
            .filter_map(|(k, v)| other.dimensions.get(k).map(|o| v * o))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }
}

#[derive(Debug)]
enum Node {
    Leaf(usize),
    Merge(Box<Node>, Box<Node>),
}

impl Node {
    fn leaves(&self, out: &mut Vec<usize>) {
        match self {
            Node::Leaf(i) => out.push(*i),
            Node::Merge(left, right) => {
                left.leaves(out);
                right.leaves(out);
            }
        }
    }
}

#[derive(Debug)]
struct Cluster {
    members: Vec<usize>,
    /// Document position of the earliest member.
    first: (usize, usize, usize),
    tree: Node,
}

/// Order sentences by depth-first traversal of their similarity dendrogram.
pub fn order_by_dendrogram(
    sentences: Vec<Sentence>,
    weights: &ConceptWeightSet,
    mapping: &ConceptMapping,
) -> Vec<Sentence> {
    if sentences.len() < 2 {
        return sentences;
    }

    let vectors: Vec<ConceptVector> = sentences
        .iter()
        .map(|s| ConceptVector::for_sentence(s, weights, mapping))
        .collect();
    let n = sentences.len();
    let mut similarity = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let sim = vectors[i].cosine_similarity(&vectors[j]);
            similarity[i][j] = sim;
            similarity[j][i] = sim;
        }
    }

    let position = |i: usize| {
        let (doc, order) = sentences[i].position();
        (doc, order, sentences[i].index)
    };
    let mut clusters: Vec<Cluster> = (0..n)
        .map(|i| Cluster {
            members: vec![i],
            first: position(i),
            tree: Node::Leaf(i),
        })
        .collect();

    let linkage = |a: &Cluster, b: &Cluster| {
        let total: f64 = a
            .members
            .iter()
            .flat_map(|&i| b.members.iter().map(move |&j| (i, j)))
            .map(|(i, j)| similarity[i][j])
            .sum();
        total / (a.members.len() * b.members.len()) as f64
    };

    while clusters.len() > 1 {
        let mut best: Option<(f64, (usize, usize, usize), (usize, usize, usize), usize, usize)> =
            None;
        for a in 0..clusters.len() {
            for b in (a + 1)..clusters.len() {
                let sim = linkage(&clusters[a], &clusters[b]);
                let (lo, hi) = if clusters[a].first <= clusters[b].first {
                    (clusters[a].first, clusters[b].first)
                } else {
                    (clusters[b].first, clusters[a].first)
                };
                let better = match &best {
                    None => true,
                    Some((best_sim, best_lo, best_hi, _, _)) => {
                        sim > best_sim + EPS
                            || ((sim - best_sim).abs() <= EPS && (lo, hi) < (*best_lo, *best_hi))
                    }
                };
                if better {
                    best = Some((sim, lo, hi, a, b));
                }
            }
        }
        let Some((_, _, _, a, b)) = best else {
            break;
        };

        // Remove the higher index first so `a` stays valid.
        let second = clusters.remove(b);
        let first = clusters.remove(a);
        let (left, right) = if first.first <= second.first {
            (first, second)
        } else {
            (second, first)
        };
        let mut members = left.members;
        members.extend(right.members);
        clusters.push(Cluster {
            members,
            first: left.first,
            tree: Node::Merge(Box::new(left.tree), Box::new(right.tree)),
        });
    }

    let mut leaves = Vec::with_capacity(n);
    if let Some(root) = clusters.pop() {
        root.tree.leaves(&mut leaves);
    }
    debug!("Dendrogram order: {:?}", leaves);

    let mut slots: Vec<Option<Sentence>> = sentences.into_iter().map(Some).collect();
    leaves
        .into_iter()
        .filter_map(|i| slots.get_mut(i).and_then(Option::take))
        .collect()
}
