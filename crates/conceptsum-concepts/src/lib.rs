//! conceptsum concepts — concept extraction and salience weighting.
//!
//! A `ConceptWeighter` turns a prepared `Problem` into a `ConceptMapping`:
//! the concepts each sentence expresses, one or more weight sets, and the
//! candidate sentence pool handed to the program builder.

pub mod types;
pub mod weighter;

pub use types::{Concept, ConceptMapping, ConceptWeightSet, ConceptWeights};
pub use weighter::{ConceptWeighter, HeuristicWeighter};
