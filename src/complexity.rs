//! Complexity Analyzer — a pure function mapping question text to a
//! complexity score and a hop target. Grounded on the keyword-counting
//! scoring pattern used for strategy analysis elsewhere in this workspace's
//! lineage: small, enumerated keyword sets, each contributing a fixed
//! weight, summed and clamped.

use serde::{Deserialize, Serialize};

/// Boolean/count indicators derived from the question text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComplexityIndicators {
    pub multi_aspect: bool,
    pub comparison: bool,
    pub causal: bool,
    pub process: bool,
    pub evaluation: bool,
    pub temporal: bool,
    /// Token count normalized into [0, 1].
    pub length_factor: f64,
}

const MULTI_ASPECT_MARKERS: &[&str] = &[" and ", " or ", " vs ", " vs. "];
const COMPARISON_MARKERS: &[&str] = &["compare", "difference", " vs ", " vs. ", "versus"];
const CAUSAL_MARKERS: &[&str] = &["why", "cause", "reason"];
const PROCESS_MARKERS: &[&str] = &["how", "steps", "mechanism"];
const EVALUATION_MARKERS: &[&str] = &[
    "best",
    "worst",
    "pros",
    "cons",
    "advantages",
    "disadvantages",
];
const TEMPORAL_MARKERS: &[&str] = &["when", "history", "future", "trend"];

/// Token count considered "maximally complex" for the length factor; longer
/// questions saturate at 1.0 rather than growing unbounded.
const LENGTH_SATURATION_TOKENS: f64 = 40.0;

const WEIGHT_MULTI_ASPECT: f64 = 0.2;
const WEIGHT_COMPARISON: f64 = 0.2;
const WEIGHT_CAUSAL: f64 = 0.15;
const WEIGHT_PROCESS: f64 = 0.15;
const WEIGHT_EVALUATION: f64 = 0.15;
const WEIGHT_TEMPORAL: f64 = 0.1;
const WEIGHT_LENGTH: f64 = 0.15;

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

fn contains_comma_joined_clauses(question: &str) -> bool {
    question.split(',').filter(|s| !s.trim().is_empty()).count() > 1
}

fn contains_multiple_question_marks(question: &str) -> bool {
    question.matches('?').count() > 1
}

/// Derives indicators from raw question text. Matching is done against a
/// lowercased, space-padded copy so word-boundary markers like `" vs "`
/// match at the start/end of the string too.
fn derive_indicators(question: &str) -> ComplexityIndicators {
    let padded = format!(" {} ", question.to_lowercase());

    let multi_aspect = contains_any(&padded, MULTI_ASPECT_MARKERS)
        || contains_comma_joined_clauses(question)
        || contains_multiple_question_marks(question);

    let token_count = question.split_whitespace().count() as f64;
    let length_factor = (token_count / LENGTH_SATURATION_TOKENS).clamp(0.0, 1.0);

    ComplexityIndicators {
        multi_aspect,
        comparison: contains_any(&padded, COMPARISON_MARKERS),
        causal: contains_any(&padded, CAUSAL_MARKERS),
        process: contains_any(&padded, PROCESS_MARKERS),
        evaluation: contains_any(&padded, EVALUATION_MARKERS),
        temporal: contains_any(&padded, TEMPORAL_MARKERS),
        length_factor,
    }
}

fn score_from_indicators(indicators: &ComplexityIndicators) -> f64 {
    let mut score = 0.0;
    if indicators.multi_aspect {
        score += WEIGHT_MULTI_ASPECT;
    }
    if indicators.comparison {
        score += WEIGHT_COMPARISON;
    }
    if indicators.causal {
        score += WEIGHT_CAUSAL;
    }
    if indicators.process {
        score += WEIGHT_PROCESS;
    }
    if indicators.evaluation {
        score += WEIGHT_EVALUATION;
    }
    if indicators.temporal {
        score += WEIGHT_TEMPORAL;
    }
    score += WEIGHT_LENGTH * indicators.length_factor;
    score.clamp(0.0, 1.0)
}

/// Maps a raw score to the dev-mode hop-target thresholds, then clamps to
/// `[min_hops, max_hops]`.
fn hop_target_from_score(score: f64, min_hops: u32, max_hops: u32) -> u32 {
    let raw = if score < 0.2 {
        3
    } else if score < 0.6 {
        7
    } else {
        10
    };
    raw.clamp(min_hops, max_hops)
}

/// `analyze(question) -> (score, hop_target, indicators)`.
pub fn analyze(
    question: &str,
    min_hops: u32,
    max_hops: u32,
) -> (f64, u32, ComplexityIndicators) {
    let indicators = derive_indicators(question);
    let score = score_from_indicators(&indicators);
    let hop_target = hop_target_from_score(score, min_hops, max_hops);
    (score, hop_target, indicators)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_definition_is_low_complexity() {
        let (score, hop_target, indicators) = analyze("What is Python?", 3, 10);
        assert!(score < 0.2, "expected low score, got {score}");
        assert_eq!(hop_target, 3);
        assert!(!indicators.comparison);
    }

    #[test]
    fn test_comparison_question_flags_comparison_and_multi_aspect() {
        let (_, _, indicators) =
            analyze("Compare self-attention vs multi-head attention", 3, 10);
        assert!(indicators.comparison);
        assert!(indicators.multi_aspect);
    }

    #[test]
    fn test_causal_and_process_markers() {
        let (_, _, indicators) = analyze("Why does this happen and how do the steps work?", 3, 10);
        assert!(indicators.causal);
        assert!(indicators.process);
    }

    #[test]
    fn test_high_complexity_question_hits_max_tier() {
        let question = "Compare the pros and cons, the history, and why this changed, \
             and how does the mechanism work, and what caused the trend, versus \
             the alternative approach in detail with many considerations?";
        let (score, hop_target, _) = analyze(question, 3, 10);
        assert!(score >= 0.6, "expected high score, got {score}");
        assert_eq!(hop_target, 10);
    }

    #[test]
    fn test_hop_target_clamped_to_custom_budgets() {
        let (_, hop_target, _) = analyze("What is Rust?", 1, 1);
        assert_eq!(hop_target, 1);
    }

    #[test]
    fn test_score_is_always_in_unit_range() {
        let question = "why why why compare compare vs vs history history trend trend \
            best worst pros cons advantages disadvantages how steps mechanism, a, b, c, d?";
        let (score, _, _) = analyze(question, 3, 10);
        assert!((0.0..=1.0).contains(&score));
    }
}
