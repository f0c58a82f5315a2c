//! Text canonicalization for catalog queries and for name comparison.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Credit annotations that end the usable part of a scraped name.
const CREDIT_SUFFIXES: &[&str] = &["(feat. ", "(with ", "(Bonus)"];

const QUOTE_CHARS: &[char] = &['"', '\'', '‘', '’', '“', '”', '„'];

static NONSPACING_MARK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\p{Mn}").expect("valid mark regex"));

static BRACKETED_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]").expect("valid bracket regex"));

static SEARCH_PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[:\-&!?.,;]").expect("valid punctuation regex"));

static COMPARISON_PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[:\-&!?.,;'"()‘’“”„]"#).expect("valid punctuation regex"));

/// Decompose, drop nonspacing marks, recompose: "Münchën" -> "Munchen".
/// Spacing marks (e.g. Devanagari vowel signs) are kept.
pub fn remove_accents(s: &str) -> String {
    let decomposed: String = s.nfd().collect();
    NONSPACING_MARK.replace_all(&decomposed, "").nfc().collect()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Clean a free-text name so it can be used as a catalog search term.
///
/// Cuts everything from the first credit annotation (`(feat. `, `(with `,
/// `(Bonus)`), drops quotes and `[...]` segments, turns search-hostile
/// punctuation into spaces and strips accents. Repeated until nothing
/// changes, since dropping characters can expose a new annotation.
pub fn sanitize_for_search(name: &str) -> String {
    let mut current = sanitize_once(name);
    loop {
        let next = sanitize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn sanitize_once(name: &str) -> String {
    let mut sanitized = name;
    for suffix in CREDIT_SUFFIXES {
        if let Some(idx) = sanitized.find(suffix) {
            sanitized = &sanitized[..idx];
        }
    }

    let without_quotes: String = sanitized
        .chars()
        .filter(|c| !QUOTE_CHARS.contains(c))
        .collect();
    let without_brackets = BRACKETED_SEGMENT
        .replace_all(&without_quotes, "")
        .replace(['[', ']'], "");
    let without_punctuation = SEARCH_PUNCTUATION.replace_all(&without_brackets, " ");

    collapse_whitespace(&remove_accents(&without_punctuation))
}

/// Canonical form used when comparing names from different sources.
/// Case, accents, punctuation and whitespace differences all disappear.
pub fn normalize_for_comparison(name: &str) -> String {
    let lowered = remove_accents(&name.to_lowercase());
    let without_punctuation = COMPARISON_PUNCTUATION.replace_all(&lowered, " ");
    collapse_whitespace(&without_punctuation)
}
