//! Date, then document, then in-document order.

use conceptsum_core::Sentence;

/// Stable sort by (date, document position, sentence position).
///
/// Undated sentences sort before dated ones.
pub fn order_chronologically(mut sentences: Vec<Sentence>) -> Vec<Sentence> {
    sentences.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then(a.doc_index.cmp(&b.doc_index))
            .then(a.order.cmp(&b.order))
    });
    sentences
}
