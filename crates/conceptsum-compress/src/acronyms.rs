//! Restoring acronym definitions in assembled summaries.
//!
//! Ingest strips inline definitions so a sentence costs only its short form.
//! Once the summary text is final, each acronym it uses is spelled out once,
//! as `Long Form (LF)`, at its first whole-word occurrence.

use std::ops::Range;

use tracing::trace;

use conceptsum_core::Sentence;
use conceptsum_ingest::{word_positions, AcronymTable};

/// Insert a definition for every acronym of `table` used in `text`.
///
/// Every decision is taken on the input text: an acronym is defined when its
/// long form is absent and its short form occurs outside any long form of
/// the table. Inserted text is never searched again, so applying this twice
/// gives the same result as applying it once.
pub fn add_definitions(text: &str, table: &AcronymTable) -> String {
    let long_forms: Vec<Range<usize>> = table
        .iter()
        .filter(|(_, long)| !long.is_empty())
        .flat_map(|(_, long)| text.match_indices(long).map(|(i, m)| i..i + m.len()))
        .collect();
    let inside_long_form = |at: usize| long_forms.iter().any(|r| r.contains(&at));

    let mut insertions: Vec<(usize, &str, &str)> = table
        .iter()
        .filter(|(_, long)| !text.contains(long))
        .filter_map(|(short, long)| {
            let at = word_positions(text, short).find(|&at| !inside_long_form(at))?;
            Some((at, short, long))
        })
        .collect();
    insertions.sort_by(|a, b| b.0.cmp(&a.0));

    let mut out = text.to_string();
    for (at, short, long) in insertions {
        trace!("Defining {} as {}", short, long);
        out.replace_range(at..at + short.len(), &format!("{} ({})", long, short));
    }
    out
}

/// Join sentences one per line and define the acronyms they use.
pub fn assemble(sentences: &[Sentence], table: &AcronymTable) -> String {
    let joined = sentences
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    add_definitions(&joined, table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> AcronymTable {
        let mut table = AcronymTable::new();
        table.record("WHO", "World Health Organization").unwrap();
        table.record("UN", "United Nations").unwrap();
        table
    }

    #[test]
    fn test_defines_first_occurrence_only() {
        let text = "The WHO warned on Monday.\nLater the WHO met again.";
        let out = add_definitions(text, &table());
        assert_eq!(
            out,
            "The World Health Organization (WHO) warned on Monday.\nLater the WHO met again."
        );
    }

    #[test]
    fn test_long_form_present_is_not_duplicated() {
        let text = "The World Health Organization said the WHO budget grew.";
        assert_eq!(add_definitions(text, &table()), text);
    }

    #[test]
    fn test_idempotent() {
        let text = "UN envoys and the WHO arrived. The UN stayed.";
        let once = add_definitions(text, &table());
        assert_eq!(add_definitions(&once, &table()), once);
        assert_eq!(once.matches("United Nations").count(), 1);
        assert_eq!(once.matches("World Health Organization").count(), 1);
    }

    fn nested_table() -> AcronymTable {
        let mut table = AcronymTable::new();
        table.record("NATO", "North Atlantic Treaty Organization").unwrap();
        table.record("NRF", "NATO Response Force").unwrap();
        table
    }

    #[test]
    fn test_idempotent_when_long_form_holds_another_acronym() {
        let table = nested_table();
        let once = add_definitions("The NRF deployed on Monday.", &table);
        assert_eq!(once, "The NATO Response Force (NRF) deployed on Monday.");
        assert_eq!(add_definitions(&once, &table), once);

        let once = add_definitions("NATO and the NRF met.", &table);
        assert_eq!(
            once,
            "North Atlantic Treaty Organization (NATO) and the NATO Response Force (NRF) met."
        );
        assert_eq!(add_definitions(&once, &table), once);
    }

    #[test]
    fn test_present_long_form_is_not_broken() {
        let table = nested_table();
        let once = add_definitions("The NATO Response Force and NATO met.", &table);
        assert_eq!(
            once,
            "The NATO Response Force and North Atlantic Treaty Organization (NATO) met."
        );
        assert_eq!(add_definitions(&once, &table), once);
    }

    #[test]
    fn test_partial_words_are_not_acronyms() {
        let text = "Whom did UNICEF help?";
        assert_eq!(add_definitions(text, &table()), text);
    }

    #[test]
    fn test_assemble_joins_lines() {
        let mut a = Sentence::new("The WHO acted.", "d", 0, 0, None);
        a.index = 0;
        let b = Sentence::new("Aid arrived.", "d", 0, 1, None);
        let out = assemble(&[a, b], &table());
        assert_eq!(out, "The World Health Organization (WHO) acted.\nAid arrived.");
    }
}
