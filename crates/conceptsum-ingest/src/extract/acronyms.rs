//! Inline acronym definitions: detection, stripping and the acronym table.
//!
//! A definition looks like `Federal Emergency Management Agency (FEMA)`:
//! the parenthesized short form's capitals are the initials of the words
//! right before it, with lowercase connectives (`of`, `and`, ...) allowed in
//! between. Stripping rewrites such a definition to the bare short form so
//! that the compressor can re-insert it once, at its first use in a summary.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use conceptsum_core::{Error, LengthUnit, Problem, Result};

use crate::text::rewrite_sentence;

static DEFINITION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\(([A-Z][A-Za-z0-9]{1,9})\)").unwrap());

const CONNECTIVES: &[&str] = &["of", "and", "for", "the", "on", "in", "de", "to", "&"];

/// Short form → long form, first definition wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AcronymTable {
    entries: BTreeMap<String, String>,
}

impl AcronymTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a definition.
    ///
    /// Returns `Ok(true)` when the acronym is new and `Ok(false)` when the
    /// same definition was already known. A different long form for a known
    /// short form is a `Compression` error; the first definition is kept.
    pub fn record(&mut self, short: &str, long: &str) -> Result<bool> {
        match self.entries.get(short) {
            Some(existing) if existing == long => Ok(false),
            Some(existing) => Err(Error::Compression(format!(
                "conflicting definitions for {}: kept \"{}\", ignored \"{}\"",
                short, existing, long
            ))),
            None => {
                self.entries.insert(short.to_string(), long.to_string());
                Ok(true)
            }
        }
    }

    pub fn get(&self, short: &str) -> Option<&str> {
        self.entries.get(short).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by short form.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(s, l)| (s.as_str(), l.as_str()))
    }

    /// Extra summary length added by expanding `short` to `long (short)`.
    pub fn definition_cost(&self, short: &str, unit: LengthUnit) -> usize {
        match self.get(short) {
            Some(long) => match unit {
                LengthUnit::Words => unit.measure(long),
                LengthUnit::Bytes => long.len() + 3,
            },
            None => 0,
        }
    }
}

/// A definition found in a text.
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    pub short: String,
    pub long: String,
    /// Byte range of `long (short)` in the text.
    pub span: std::ops::Range<usize>,
}

/// Find acronym definitions in a text.
pub fn find_definitions(text: &str) -> Vec<Definition> {
    let mut found: Vec<Definition> = Vec::new();
    for caps in DEFINITION.captures_iter(text) {
        let (Some(whole), Some(short)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if let Some(start) = match_long_form(&text[..whole.start()], short.as_str()) {
            // Spans never overlap: a long form may not reach into an earlier definition.
            if found.last().is_some_and(|prev| start < prev.span.end) {
                continue;
            }
            found.push(Definition {
                short: short.as_str().to_string(),
                long: text[start..whole.start()].to_string(),
                span: start..whole.end(),
            });
        }
    }
    found
}

/// Byte offset where the long form for `short` starts, if the words before
/// `end` spell its capitals.
fn match_long_form(before: &str, short: &str) -> Option<usize> {
    let initials: Vec<char> = short.chars().filter(|c| c.is_uppercase()).collect();
    if initials.len() < 2 {
        return None;
    }

    // Words with their byte offsets, nearest first.
    let mut words: Vec<(usize, &str)> = Vec::new();
    let mut offset = 0;
    for piece in before.split(' ') {
        if !piece.is_empty() {
            words.push((offset, piece));
        }
        offset += piece.len() + 1;
    }
    words.reverse();

    let mut remaining = initials.iter().rev().peekable();
    let mut start = None;
    for (i, &(pos, word)) in words.iter().enumerate() {
        if i > initials.len() * 2 + 2 {
            return None;
        }
        let Some(&&letter) = remaining.peek() else {
            break;
        };
        if word.contains(|c: char| c == '(' || c == ')') {
            return None;
        }
        let first = word.chars().next()?;
        if first.to_uppercase().eq(letter.to_uppercase()) && first.is_uppercase() {
            remaining.next();
            start = Some(pos);
        } else if start.is_some() && CONNECTIVES.contains(&word) {
            continue;
        } else {
            return None;
        }
    }
    if remaining.peek().is_some() {
        return None;
    }
    start
}

/// Strip inline acronym definitions from the problem's new sentences.
///
/// Each definition is rewritten to its short form and recorded in the
/// returned table. Conflicts keep the first definition.
pub fn strip_definitions(problem: &mut Problem) -> AcronymTable {
    let mut table = AcronymTable::new();
    for sentence in problem.new_sentences_mut() {
        let definitions = find_definitions(&sentence.text);
        if definitions.is_empty() {
            continue;
        }
        let mut rewritten = String::with_capacity(sentence.text.len());
        let mut cursor = 0;
        for def in &definitions {
            if let Err(e) = table.record(&def.short, &def.long) {
                warn!("{}", e);
            }
            rewritten.push_str(&sentence.text[cursor..def.span.start]);
            rewritten.push_str(&def.short);
            cursor = def.span.end;
        }
        rewritten.push_str(&sentence.text[cursor..]);
        debug!("Stripped {} acronym definitions from sentence {}", definitions.len(), sentence.index);
        rewrite_sentence(sentence, rewritten);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use conceptsum_core::{Document, Query};

    #[test]
    fn test_find_definition() {
        let defs = find_definitions("Aid came from the Federal Emergency Management Agency (FEMA) today.");
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].short, "FEMA");
        assert_eq!(defs[0].long, "Federal Emergency Management Agency");
    }

    #[test]
    fn test_find_definition_with_connectives() {
        let defs = find_definitions("He joined the National Association of Realtors (NAR) in May.");
        assert_eq!(defs[0].long, "National Association of Realtors");
    }

    #[test]
    fn test_parenthetical_that_is_not_a_definition() {
        assert!(find_definitions("Prices rose in the city (NYC) last year.").is_empty());
        assert!(find_definitions("Shares of the company (Nasdaq) fell.").is_empty());
    }

    #[test]
    fn test_glued_definition_does_not_overlap_the_next() {
        let text = "The United States(US) Army (USA) deployed troops.";
        let defs = find_definitions(text);
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].short, "US");
        assert_eq!(defs[0].long, "United States");
        assert_eq!(defs[0].span, 4..21);
        for pair in defs.windows(2) {
            assert!(pair[0].span.end <= pair[1].span.start);
        }
    }

    #[test]
    fn test_strip_glued_definition() {
        let doc = Document::from_sentences(
            "d1",
            None,
            0,
            vec!["Troops of the United States(US) Army (USA) deployed.".to_string()],
        );
        let mut problem = Problem::new("P", Query::default(), vec![doc], vec![], 100);
        crate::text::prepare_problem(&mut problem);
        let table = strip_definitions(&mut problem);
        assert_eq!(table.get("US"), Some("United States"));
        assert_eq!(table.get("USA"), None);
        assert_eq!(
            problem.new_docs[0].sentences[0].text,
            "Troops of the US Army (USA) deployed."
        );
    }

    #[test]
    fn test_table_keeps_first_definition() {
        let mut table = AcronymTable::new();
        assert!(table.record("WHO", "World Health Organization").unwrap());
        assert!(!table.record("WHO", "World Health Organization").unwrap());
        assert!(matches!(
            table.record("WHO", "Western Hockey Outfit"),
            Err(Error::Compression(_))
        ));
        assert_eq!(table.get("WHO"), Some("World Health Organization"));
        assert_eq!(table.definition_cost("WHO", LengthUnit::Words), 3);
        assert_eq!(table.definition_cost("WHO", LengthUnit::Bytes), 28);
    }

    #[test]
    fn test_strip_definitions() {
        let doc = Document::from_sentences(
            "d1",
            None,
            0,
            vec![
                "The World Health Organization (WHO) issued a warning.".to_string(),
                "The WHO met again.".to_string(),
            ],
        );
        let mut problem = Problem::new("P", Query::default(), vec![doc], vec![], 100);
        crate::text::prepare_problem(&mut problem);
        let table = strip_definitions(&mut problem);
        assert_eq!(table.get("WHO"), Some("World Health Organization"));
        let first = &problem.new_docs[0].sentences[0];
        assert_eq!(first.text, "The WHO issued a warning.");
        assert!(first.original.contains("World Health Organization"));
        assert_eq!(problem.new_docs[0].sentences[1].text, "The WHO met again.");
    }
}
