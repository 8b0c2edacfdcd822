//! conceptsum order — arranging a selection into reading order.
//!
//! Both policies return a permutation of their input and are deterministic.

pub mod chronological;
pub mod dendrogram;

pub use chronological::order_chronologically;
pub use dendrogram::{order_by_dendrogram, ConceptVector};

use conceptsum_concepts::{ConceptMapping, ConceptWeightSet};
use conceptsum_core::{OrderingPolicy, Sentence};

/// Order selected sentences under `policy`.
///
/// `weights` and `mapping` feed the dendrogram's concept vectors and are
/// ignored by chronological ordering.
pub fn order_sentences(
    policy: OrderingPolicy,
    sentences: Vec<Sentence>,
    weights: &ConceptWeightSet,
    mapping: &ConceptMapping,
) -> Vec<Sentence> {
    match policy {
        OrderingPolicy::Chronological => order_chronologically(sentences),
        OrderingPolicy::Dendrogram => order_by_dendrogram(sentences, weights, mapping),
    }
}
