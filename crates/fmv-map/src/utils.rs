//! Utility functions for header matching.

use fmv_model::fold_accents;

/// Normalizes a header label for comparison.
///
/// Folds accents, lowercases, turns separators into `_`, drops anything outside
/// `[a-z0-9_]` and collapses repeated underscores.
pub fn normalize_label(raw: &str) -> String {
    let folded = fold_accents(raw.trim()).to_lowercase();
    let mut out = String::with_capacity(folded.len());
    for ch in folded.chars() {
        let mapped = match ch {
            'a'..='z' | '0'..='9' => Some(ch),
            '_' | '-' | '.' | '/' | '\\' => Some('_'),
            c if c.is_whitespace() => Some('_'),
            _ => None,
        };
        if let Some(mapped) = mapped {
            if mapped == '_' && (out.is_empty() || out.ends_with('_')) {
                continue;
            }
            out.push(mapped);
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}
