//! Rule-based consistency check between a product's marketing description and
//! its composition text.
//!
//! The rules are fixed and additive, starting from a neutral score of 5. The
//! result is clamped to `1..=10`; `0` is only produced when an input is missing.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::report::ScoreReport;

/// Ingredient keywords treated as a positive signal, in reporting order.
pub const BENEFICIAL_INGREDIENTS: [&str; 5] = ["water", "glycerin", "oil", "extract", "vitamin"];

const BASE_SCORE: i32 = 5;
const MIN_SCORE: i32 = 1;
const MAX_SCORE: i32 = 10;

const MIN_DESCRIPTION_CHARS: usize = 50;

// More than this many distinct shared words counts as aligned.
const SHARED_TERMS_THRESHOLD: usize = 5;

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("word pattern is valid"));

pub fn score(description: &str, composition: &str) -> ScoreReport {
    if description.is_empty() || composition.is_empty() {
        return ScoreReport::unavailable();
    }

    let mut score = BASE_SCORE;
    let mut details: Vec<String> = Vec::new();

    // Length is measured in characters, not bytes.
    if description.chars().count() < MIN_DESCRIPTION_CHARS {
        score -= 2;
        details.push("description too short".to_string());
    }

    let found = beneficial_ingredients(composition);
    if found.is_empty() {
        score -= 1;
        details.push("no beneficial ingredients found".to_string());
    } else {
        score += 1;
        details.push(format!("beneficial ingredients found: {}", found.join(", ")));
    }

    let description_terms = terms(description);
    let composition_terms = terms(composition);
    let shared = description_terms.intersection(&composition_terms).count();

    if shared > SHARED_TERMS_THRESHOLD {
        score += 1;
        details.push("description and composition share key terms".to_string());
    } else {
        score -= 1;
        details.push("description does not match composition".to_string());
    }

    let score = score.clamp(MIN_SCORE, MAX_SCORE) as u8;

    ScoreReport {
        score,
        reasoning: format!("Score {}/10: {}", score, tier(score)),
        details,
    }
}

/// Keywords from [`BENEFICIAL_INGREDIENTS`] that occur anywhere in the text,
/// case-insensitively, in vocabulary order.
pub fn beneficial_ingredients(composition: &str) -> Vec<&'static str> {
    let haystack = composition.to_lowercase();
    BENEFICIAL_INGREDIENTS
        .iter()
        .copied()
        .filter(|k| haystack.contains(k))
        .collect()
}

/// Distinct lowercase word tokens.
pub fn terms(text: &str) -> HashSet<String> {
    let lower = text.to_lowercase();
    WORD_RE
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}

fn tier(score: u8) -> &'static str {
    match score {
        8..=u8::MAX => "excellent match",
        6..=7 => "good match with minor discrepancies",
        4..=5 => "average match, some discrepancies",
        _ => "poor match, description does not reflect actual composition",
    }
}
