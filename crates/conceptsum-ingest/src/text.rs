//! Sentence splitting and token normalization.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use conceptsum_core::{Problem, Sentence, Token};

use crate::extract::stemmer::stem;

static PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());

static ABBREVIATIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "mr", "mrs", "ms", "dr", "prof", "st", "jr", "sr", "inc", "corp", "co", "ltd", "gen",
        "gov", "sen", "rep", "lt", "col", "sgt", "capt", "no", "vs", "jan", "feb", "mar", "apr",
        "aug", "sept", "sep", "oct", "nov", "dec", "mt", "ft", "e.g", "i.e",
    ]
    .into_iter()
    .collect()
});

/// Split raw document text into sentences.
///
/// Blank lines always end a sentence. Inside a paragraph a terminator
/// (`.`, `!`, `?`, optionally followed by closing quotes) ends a sentence
/// when the next word starts with an uppercase letter, a digit or an opening
/// quote, and the period does not close a known abbreviation or an initial.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    for paragraph in PARAGRAPH_BREAK.split(text) {
        let flat = paragraph.split_whitespace().collect::<Vec<_>>().join(" ");
        let chars: Vec<(usize, char)> = flat.char_indices().collect();
        let mut start = 0;

        for (pos, &(i, c)) in chars.iter().enumerate() {
            if !matches!(c, '.' | '!' | '?') {
                continue;
            }
            let mut end = pos;
            while end + 1 < chars.len() && is_closer(chars[end + 1].1) {
                end += 1;
            }
            if end + 2 >= chars.len() || chars[end + 1].1 != ' ' {
                continue;
            }
            let next = chars[end + 2].1;
            if !(next.is_uppercase() || next.is_ascii_digit() || is_opener(next)) {
                continue;
            }
            if c == '.' && ends_with_abbreviation(&flat[start..i]) {
                continue;
            }
            let boundary = chars[end].0 + chars[end].1.len_utf8();
            push_trimmed(&mut sentences, &flat[start..boundary]);
            start = boundary;
        }
        push_trimmed(&mut sentences, &flat[start..]);
    }
    sentences
}

fn push_trimmed(sentences: &mut Vec<String>, s: &str) {
    let s = s.trim();
    if !s.is_empty() {
        sentences.push(s.to_string());
    }
}

fn is_closer(c: char) -> bool {
    matches!(c, '"' | '\'' | ')' | '\u{201d}' | '\u{2019}')
}

fn is_opener(c: char) -> bool {
    matches!(c, '"' | '\'' | '(' | '\u{201c}' | '\u{2018}')
}

fn ends_with_abbreviation(prefix: &str) -> bool {
    let word = prefix
        .rsplit(' ')
        .next()
        .unwrap_or("")
        .trim_start_matches(|c: char| !c.is_alphanumeric());
    let mut chars = word.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_uppercase() => true,
        _ => word.contains('.') || ABBREVIATIONS.contains(word.to_lowercase().as_str()),
    }
}

/// Lowercase, split on non-word characters and stem.
pub fn tokenize(text: &str) -> Vec<Token> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter_map(|raw| {
            let raw = raw.trim_matches('\'');
            let raw = raw.strip_suffix("'s").unwrap_or(raw);
            if raw.is_empty() {
                return None;
            }
            let word = raw.to_lowercase();
            let stem = stem(&word);
            Some(Token { word, stem })
        })
        .collect()
}

/// Byte offset of the first whole-word occurrence of `word` in `text`.
///
/// A match must not touch an alphanumeric character on either side.
pub fn find_word(text: &str, word: &str) -> Option<usize> {
    word_positions(text, word).next()
}

/// Byte offsets of every whole-word occurrence of `word`, in text order.
pub fn word_positions<'a>(text: &'a str, word: &'a str) -> impl Iterator<Item = usize> + 'a {
    text.match_indices(word)
        .map(|(i, _)| i)
        .filter(move |&i| {
            let before = text[..i].chars().next_back();
            let after = text[i + word.len()..].chars().next();
            !word.is_empty()
                && !before.is_some_and(char::is_alphanumeric)
                && !after.is_some_and(char::is_alphanumeric)
        })
}

/// Restore the working text to the original and re-derive its tokens.
pub fn reset_sentence(sentence: &mut Sentence) {
    let tokens = tokenize(&sentence.original);
    let original = sentence.original.clone();
    sentence.set_text(original, tokens);
}

/// Replace the working text and re-derive its tokens.
pub fn rewrite_sentence(sentence: &mut Sentence, text: impl Into<String>) {
    let text = text.into();
    let tokens = tokenize(&text);
    sentence.set_text(text, tokens);
}

/// Reset every sentence and the query of a problem before a run.
///
/// Running it twice gives the same state as running it once.
pub fn prepare_problem(problem: &mut Problem) {
    for sentence in problem.new_sentences_mut() {
        reset_sentence(sentence);
    }
    for sentence in problem.old_sentences_mut() {
        reset_sentence(sentence);
    }
    problem.query.tokens = tokenize(&problem.query.original());
}

#[cfg(test)]
mod tests {
    use super::*;
    use conceptsum_core::{Document, Query};

    #[test]
    fn test_split_sentences() {
        let text = "The storm hit Florida on Monday. Officials said 12 people died! \
                    Was the warning late? Mr. Smith disagreed.";
        let sentences = split_sentences(text);
        assert_eq!(
            sentences,
            vec![
                "The storm hit Florida on Monday.",
                "Officials said 12 people died!",
                "Was the warning late?",
                "Mr. Smith disagreed.",
            ]
        );
    }

    #[test]
    fn test_split_keeps_initials_and_lowercase_continuations() {
        let sentences = split_sentences("George W. Bush spoke. It rained e.g. in the north.");
        assert_eq!(
            sentences,
            vec!["George W. Bush spoke.", "It rained e.g. in the north."]
        );
    }

    #[test]
    fn test_split_paragraphs_and_quotes() {
        let text = "He said \"stop.\" Then he left\n\nA new paragraph\nwraps here.";
        let sentences = split_sentences(text);
        assert_eq!(
            sentences,
            vec!["He said \"stop.\"", "Then he left", "A new paragraph wraps here."]
        );
    }

    #[test]
    fn test_tokenize() {
        let tokens = tokenize("The company's workers were striking, again!");
        let words: Vec<&str> = tokens.iter().map(|t| t.word.as_str()).collect();
        assert_eq!(words, vec!["the", "company", "workers", "were", "striking", "again"]);
        assert_eq!(tokens[2].stem, "worker");
        assert_eq!(tokens[4].stem, "strik");
    }

    #[test]
    fn test_find_word() {
        assert_eq!(find_word("The WHO said", "WHO"), Some(4));
        assert_eq!(find_word("WHOM and WHO.", "WHO"), Some(9));
        assert_eq!(find_word("(WHO)", "WHO"), Some(1));
        assert_eq!(find_word("NWHO", "WHO"), None);
        assert_eq!(find_word("anything", ""), None);
        let all: Vec<usize> = word_positions("WHO, WHOM and WHO", "WHO").collect();
        assert_eq!(all, vec![0, 14]);
    }

    #[test]
    fn test_prepare_problem_is_idempotent() {
        let doc = Document::from_sentences("d1", None, 0, vec!["Floods hit the city.".into()]);
        let mut problem = Problem::new("P1", Query::new("Floods", ""), vec![doc], vec![], 100);
        rewrite_sentence(problem.new_docs[0].sentences.first_mut().unwrap(), "changed");
        prepare_problem(&mut problem);
        let once = problem.new_docs[0].sentences[0].clone();
        prepare_problem(&mut problem);
        assert_eq!(problem.new_docs[0].sentences[0], once);
        assert_eq!(once.text, "Floods hit the city.");
        assert_eq!(problem.query.tokens[0].stem, "flood");
    }
}
