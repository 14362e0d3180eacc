//! Name suggestions for the diagnosis and medicine inputs.

use strsim::levenshtein;

/// Default cap on the number of suggestions.
pub const SUGGESTION_LIMIT: usize = 10;

/// Shortest query that tolerates a mistyped character.
const TYPO_TOLERANT_LEN: usize = 3;

/// Reference names that start with `query`, case-insensitively, in list
/// order, at most [`SUGGESTION_LIMIT`] of them.
pub fn suggest<S: AsRef<str>>(query: &str, reference: &[S]) -> Vec<String> {
    suggest_with_limit(query, reference, SUGGESTION_LIMIT)
}

/// [`suggest`] with an explicit cap.
///
/// An empty query suggests nothing. From three characters on, a prefix
/// that differs from the query in one character still matches, so `"par"`
/// finds `"Panadol"` as well as `"Paracetamol"`.
pub fn suggest_with_limit<S: AsRef<str>>(query: &str, reference: &[S], limit: usize) -> Vec<String> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    reference
        .iter()
        .map(AsRef::<str>::as_ref)
        .filter(|name| prefix_matches(&query, name))
        .take(limit)
        .map(str::to_string)
        .collect()
}

fn prefix_matches(query: &str, name: &str) -> bool {
    let query_len = query.chars().count();
    let prefix: String = name.to_lowercase().chars().take(query_len).collect();

    if prefix == query {
        return true;
    }

    query_len >= TYPO_TOLERANT_LEN
        && prefix.chars().count() == query_len
        && levenshtein(&prefix, query) <= 1
}
