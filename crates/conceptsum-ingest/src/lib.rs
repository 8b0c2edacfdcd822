//! conceptsum ingest — sentence splitting, token normalization, acronym
//! detection and problem loading.

pub mod extract;
pub mod loader;
pub mod text;

pub use extract::acronyms::{strip_definitions, AcronymTable};
pub use loader::load_problems;
pub use text::{find_word, prepare_problem, split_sentences, tokenize, word_positions};
