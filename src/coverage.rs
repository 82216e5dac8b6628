//! Coverage Tracker — maps aspects to coverage scores and updates them
//! after each hop. Scoring is deliberately deterministic and keyword-based
//! (grounded on the Jaccard-like word-overlap heuristic used as the
//! no-LLM fallback for relevance scoring elsewhere in this lineage) so the
//! same inputs always reproduce the same coverage, with no embedding model
//! in the loop.

use deep_research_core::Passage;

use crate::model::{Aspect, Coverage, CoverageEntry};

/// `init(aspects) -> Coverage`: all scores 0, `covered_at_hop` null.
pub fn init(aspects: &[Aspect]) -> Coverage {
    aspects
        .iter()
        .map(|a| {
            (
                a.canonical_name(),
                CoverageEntry {
                    aspect: a.clone(),
                    score: 0.0,
                    covered_at_hop: None,
                },
            )
        })
        .collect()
}

/// `keyword_hits(A, P) = |{k in K : k appears as a substring in T or title}| / max(1, |K|)`.
fn keyword_hits(aspect: &Aspect, passage: &Passage) -> f64 {
    if aspect.keywords.is_empty() {
        return 0.0;
    }
    let text_lower = passage.text_lower();
    let title_lower = passage.title_lower();
    let hits = aspect
        .keywords
        .iter()
        .filter(|k| text_lower.contains(k.as_str()) || title_lower.contains(k.as_str()))
        .count();
    hits as f64 / (aspect.keywords.len().max(1) as f64)
}

/// `doc_score(A, P) = 0.5*keyword_hits + 0.5*P.score` when `keyword_hits > 0`, else 0.
/// Empty keywords always score 0 regardless of `P.score` — this prevents an
/// aspect with no keyword signal from appearing covered purely because the
/// retriever ranked a passage highly for an unrelated reason.
fn doc_score(aspect: &Aspect, passage: &Passage) -> f64 {
    let hits = keyword_hits(aspect, passage);
    if hits > 0.0 {
        0.5 * hits + 0.5 * passage.score as f64
    } else {
        0.0
    }
}

/// `aspect_score_from_hop(A, passages) = max over passages of doc_score(A, P)`.
fn aspect_score_from_hop(aspect: &Aspect, passages: &[Passage]) -> f64 {
    passages
        .iter()
        .map(|p| doc_score(aspect, p))
        .fold(0.0_f64, f64::max)
}

/// Applies one hop's passages to `coverage`, returning the per-aspect score
/// delta keyed by canonical aspect name. New score is the max of previous
/// and this hop's score (monotonic non-decreasing), clamped to [0, 1].
/// `covered_at_hop` is set on the first hop whose resulting score meets
/// `cover_threshold`, and never rewritten afterward. An empty passage list
/// leaves every entry unchanged.
pub fn update(
    coverage: &mut Coverage,
    passages: &[Passage],
    hop: u32,
    cover_threshold: f64,
) -> std::collections::BTreeMap<String, f64> {
    let mut deltas = std::collections::BTreeMap::new();
    if passages.is_empty() {
        return deltas;
    }

    for entry in coverage.values_mut() {
        let hop_score = aspect_score_from_hop(&entry.aspect, passages);
        let new_score = entry.score.max(hop_score).clamp(0.0, 1.0);
        let delta = new_score - entry.score;
        if delta != 0.0 {
            deltas.insert(entry.aspect.canonical_name(), delta);
        }
        entry.score = new_score;
        if entry.covered_at_hop.is_none() && entry.score >= cover_threshold {
            entry.covered_at_hop = Some(hop);
        }
    }
    deltas
}

/// Aspects below `threshold`, importance-descending.
pub fn uncovered(coverage: &Coverage, threshold: f64) -> Vec<Aspect> {
    let mut result: Vec<Aspect> = coverage
        .values()
        .filter(|e| e.score < threshold)
        .map(|e| e.aspect.clone())
        .collect();
    result.sort_by(|a, b| b.importance.partial_cmp(&a.importance).unwrap());
    result
}

/// Only aspects with importance >= `CORE_THRESHOLD` that are below the
/// cover threshold.
pub fn uncovered_core(coverage: &Coverage, cover_threshold: f64) -> Vec<Aspect> {
    uncovered(coverage, cover_threshold)
        .into_iter()
        .filter(|a| a.is_core())
        .collect()
}

/// Fraction of aspects whose score meets `cover_threshold`.
pub fn percentage(coverage: &Coverage, cover_threshold: f64) -> f64 {
    if coverage.is_empty() {
        return 1.0;
    }
    let covered = coverage
        .values()
        .filter(|e| e.score >= cover_threshold)
        .count();
    covered as f64 / coverage.len() as f64
}

/// `weighted(coverage) = sum(importance * score) / sum(importance)`.
/// An empty coverage map (degenerate run with no aspects) is treated as
/// fully covered — there is nothing left to cover.
pub fn weighted(coverage: &Coverage) -> f64 {
    let total_importance: f64 = coverage.values().map(|e| e.aspect.importance).sum();
    if total_importance <= 0.0 {
        return if coverage.is_empty() { 1.0 } else { 0.0 };
    }
    let sum: f64 = coverage
        .values()
        .map(|e| e.aspect.importance * e.score)
        .sum();
    (sum / total_importance).clamp(0.0, 1.0)
}
