//! Lexical extraction helpers used by concept weighting and compression.

pub mod acronyms;
pub mod stemmer;
pub mod stopwords;
