//! Name comparison primitives for booth matching.
//!
//! All comparisons run over normalized text (lowercased, punctuation
//! stripped, whitespace collapsed). Scores are Jaro-Winkler in `[0, 1]`;
//! empty inputs always score 0.

use strsim::jaro_winkler;

/// Lowercase, replace punctuation with spaces, collapse runs of
/// whitespace.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.to_lowercase().chars() {
        if c.is_alphanumeric() {
            out.push(c);
        } else {
            out.push(' ');
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalized tokens in sorted order, so word order never affects scores.
fn token_sort_key(text: &str) -> String {
    let normalized = normalize(text);
    let mut tokens: Vec<&str> = normalized.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Word-order-insensitive similarity between two names.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    let key_a = token_sort_key(a);
    let key_b = token_sort_key(b);
    if key_a.is_empty() || key_b.is_empty() {
        return 0.0;
    }
    jaro_winkler(&key_a, &key_b)
}

/// Whether `needle` appears inside `haystack` once both are normalized.
pub fn normalized_contains(haystack: &str, needle: &str) -> bool {
    let haystack = normalize(haystack);
    let needle = normalize(needle);
    if haystack.is_empty() || needle.is_empty() {
        return false;
    }
    haystack.contains(&needle)
}

/// Best alignment of the shorter input against the longer one: containment
/// scores 1.0, otherwise the best Jaro-Winkler over token windows the size
/// of the shorter input (and the whole string).
pub fn partial_similarity(a: &str, b: &str) -> f64 {
    let norm_a = normalize(a);
    let norm_b = normalize(b);
    if norm_a.is_empty() || norm_b.is_empty() {
        return 0.0;
    }
    let (needle, haystack) = if norm_a.len() <= norm_b.len() {
        (&norm_a, &norm_b)
    } else {
        (&norm_b, &norm_a)
    };
    if haystack.contains(needle.as_str()) {
        return 1.0;
    }

    let hay_tokens: Vec<&str> = haystack.split_whitespace().collect();
    let window = needle
        .split_whitespace()
        .count()
        .min(hay_tokens.len())
        .max(1);

    let mut best = jaro_winkler(needle, haystack);
    for chunk in hay_tokens.windows(window) {
        best = best.max(jaro_winkler(needle, &chunk.join(" ")));
    }
    best
}
