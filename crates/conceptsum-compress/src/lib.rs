//! conceptsum compress — final text assembly for compressed summaries.

pub mod acronyms;

pub use acronyms::{add_definitions, assemble};
