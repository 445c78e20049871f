//! Fuzzy suggestions for headers no synonym matched.

use rapidfuzz::distance::jaro_winkler::similarity as jaro_similarity;
use serde::Serialize;

use crate::patterns::FieldPatterns;

/// Minimum Jaro-Winkler similarity for a suggestion.
pub const SUGGESTION_MIN: f64 = 0.85;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub field: &'static str,
    /// The known label the header resembles.
    pub label: String,
    pub score: f64,
}

/// Closest canonical field for a normalized header label, if any is close enough.
pub fn suggest_field(label: &str, patterns: &FieldPatterns) -> Option<Suggestion> {
    if label.is_empty() {
        return None;
    }
    let mut best: Option<Suggestion> = None;
    for (field, candidate) in patterns.labels() {
        let score = jaro_similarity(label.chars(), candidate.chars());
        if score < SUGGESTION_MIN {
            continue;
        }
        if best.as_ref().is_none_or(|current| score > current.score) {
            best = Some(Suggestion {
                field,
                label: candidate.to_string(),
                score,
            });
        }
    }
    best
}
