//! Light suffix-stripping stemmer.
//!
//! Three passes: plural endings, inflectional `-ed`/`-ing`, then a few
//! derivational suffixes. Only ASCII words longer than three bytes are
//! touched, so the same surface word always yields the same stem.

/// Derivational rewrites, longest first. The remaining stem must keep at
/// least three bytes.
const DERIVATIONAL: &[(&str, &str)] = &[
    ("ational", "ate"),
    ("ization", "ize"),
    ("iveness", "ive"),
    ("fulness", "ful"),
    ("ousness", "ous"),
    ("tional", "tion"),
    ("ation", "ate"),
    ("ness", ""),
    ("ment", ""),
];

/// Stem a lowercased word.
pub fn stem(word: &str) -> String {
    if word.len() <= 3 || !word.is_ascii() {
        return word.to_string();
    }
    let word = strip_plural(word);
    let word = strip_inflection(&word);
    strip_derivation(&word)
}

fn strip_plural(word: &str) -> String {
    if let Some(base) = word.strip_suffix("sses") {
        return format!("{}ss", base);
    }
    if let Some(base) = word.strip_suffix("ies") {
        return if word.len() > 4 {
            format!("{}y", base)
        } else {
            format!("{}ie", base)
        };
    }
    if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
        return word.to_string();
    }
    match word.strip_suffix('s') {
        Some(base) if base.len() >= 3 => base.to_string(),
        _ => word.to_string(),
    }
}

fn strip_inflection(word: &str) -> String {
    if let Some(base) = word.strip_suffix("eed") {
        return if base.len() >= 2 {
            format!("{}ee", base)
        } else {
            word.to_string()
        };
    }
    if let Some(base) = word.strip_suffix("ied") {
        if base.len() >= 2 {
            return format!("{}y", base);
        }
    }
    let base = word
        .strip_suffix("ing")
        .or_else(|| word.strip_suffix("ed"))
        .filter(|base| base.len() >= 2 && base.chars().any(is_vowel));
    match base {
        Some(base) => repair(base),
        None => word.to_string(),
    }
}

/// Undo doubled consonants and restore a dropped `e` after `-ed`/`-ing`.
fn repair(base: &str) -> String {
    if base.ends_with("at") || base.ends_with("bl") || base.ends_with("iz") {
        return format!("{}e", base);
    }
    let bytes = base.as_bytes();
    let n = bytes.len();
    if n >= 3 {
        let last = bytes[n - 1] as char;
        if last == bytes[n - 2] as char && !is_vowel(last) && !"lsz".contains(last) {
            return base[..n - 1].to_string();
        }
    }
    base.to_string()
}

fn strip_derivation(word: &str) -> String {
    for &(suffix, replacement) in DERIVATIONAL {
        if let Some(base) = word.strip_suffix(suffix) {
            if base.len() >= 3 {
                return format!("{}{}", base, replacement);
            }
            break;
        }
    }
    word.to_string()
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y')
}
