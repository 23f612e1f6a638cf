//! Case- and accent-insensitive text folding.
//!
//! Layout names and slide text are compared after folding, so "Sem_Seção",
//! "SEM SECAO" and "sem-secao" all meet on the same key.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Regex to collapse whitespace runs into one space.
static WHITESPACE_COLLAPSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Regex matching the separators layout names use in place of spaces.
static NAME_SEPARATOR_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[_\-]+").unwrap());

/// Fold text for comparison: compatibility-decompose, drop combining marks,
/// lowercase and trim.
pub fn fold(text: &str) -> String {
    text.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
        .trim()
        .to_string()
}

/// Fold a layout name into its matching key.
///
/// On top of [`fold`], underscores and hyphens count as spaces and
/// whitespace runs collapse to one space.
pub fn name_key(name: &str) -> String {
    let folded = fold(name);
    let spaced = NAME_SEPARATOR_REGEX.replace_all(&folded, " ");
    WHITESPACE_COLLAPSE_REGEX
        .replace_all(&spaced, " ")
        .trim()
        .to_string()
}

/// Whether a layout name matches a requested name, exactly or as a substring
/// once both are folded.
pub fn name_matches(layout_name: &str, wanted: &str) -> bool {
    let candidate = name_key(layout_name);
    let target = name_key(wanted);
    if target.is_empty() {
        return false;
    }
    candidate == target || candidate.contains(&target)
}

/// Whether folded `text` contains any of the folded `keywords`.
pub fn contains_keyword<S: AsRef<str>>(text: &str, keywords: &[S]) -> bool {
    let haystack = fold(text);
    keywords.iter().any(|kw| {
        let needle = fold(kw.as_ref());
        !needle.is_empty() && haystack.contains(&needle)
    })
}
