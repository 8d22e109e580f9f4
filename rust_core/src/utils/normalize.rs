//! Name normalization.
//!
//! Maps a human-entered name to the key used for fuzzy comparison so that
//! casing, punctuation, whitespace, diacritics and generational suffixes do
//! not cause false negatives. The same function is applied to leads and to
//! every registry name.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Generational suffixes dropped from the end of a name.
const NAME_SUFFIXES: &[&str] = &["jr", "sr", "ii", "iii", "iv", "v"];

/// Characters kept verbatim; everything else becomes a space.
fn is_kept_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() || c == '\'' || c == '-'
}

fn is_suffix(token: &str) -> bool {
    let bare = token.trim_end_matches('.');
    NAME_SUFFIXES.iter().any(|s| s.eq_ignore_ascii_case(bare))
}

/// Normalize a name for comparison.
///
/// Total and deterministic: empty or junk input yields `""`, never an error.
/// Idempotent, since suffixes are stripped until the last token is not one.
///
/// ```
/// use pro_qualifier_core::utils::normalize::normalize_name;
///
/// assert_eq!(normalize_name("  Ken GRIFFEY Jr. "), "ken griffey");
/// assert_eq!(normalize_name("O'Brien-Smith!!"), "o'brien-smith");
/// ```
pub fn normalize_name(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let cleaned: String = trimmed
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| if is_kept_char(c) { c } else { ' ' })
        .collect();

    let mut tokens: Vec<&str> = cleaned.split_whitespace().collect();
    while tokens.last().is_some_and(|t| is_suffix(t)) {
        tokens.pop();
    }

    tokens.join(" ")
}
