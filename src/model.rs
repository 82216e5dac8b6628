//! Data model for a single research run: question, aspects, coverage,
//! hop log, and the final result. Everything here is owned by one run and
//! nothing is persisted — persistence is the conversation collaborator's job.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use deep_research_core::Passage;

/// Importance at or above this threshold makes an aspect **core**: it must
/// be covered (or the run must exhaust `max_hops`/be cancelled) before the
/// loop is allowed to stop on coverage grounds.
pub const CORE_THRESHOLD: f64 = 0.8;

/// Validated, trimmed question text. Immutable for the life of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question(String);

impl Question {
    pub const MIN_LEN: usize = 1;
    pub const MAX_LEN: usize = 4000;

    /// Trims the input and validates length. Does not touch casing or
    /// punctuation beyond trimming, since downstream components canonicalize
    /// what they need independently.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let trimmed = raw.trim();
        if trimmed.len() < Self::MIN_LEN {
            return Err("question is empty".to_string());
        }
        if trimmed.chars().count() > Self::MAX_LEN {
            return Err(format!(
                "question exceeds {} characters",
                Self::MAX_LEN
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Question {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The distinct facets a question decomposes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AspectType {
    Definition,
    Comparison,
    Process,
    Causal,
    Evaluation,
    Application,
    Temporal,
    Other,
}

impl AspectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectType::Definition => "definition",
            AspectType::Comparison => "comparison",
            AspectType::Process => "process",
            AspectType::Causal => "causal",
            AspectType::Evaluation => "evaluation",
            AspectType::Application => "application",
            AspectType::Temporal => "temporal",
            AspectType::Other => "other",
        }
    }

    /// Parses the type names the LLM path and heuristic path both use.
    /// Unknown strings map to `Other` rather than failing the whole aspect.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "definition" => AspectType::Definition,
            "comparison" => AspectType::Comparison,
            "process" => AspectType::Process,
            "causal" => AspectType::Causal,
            "evaluation" => AspectType::Evaluation,
            "application" => AspectType::Application,
            "temporal" => AspectType::Temporal,
            _ => AspectType::Other,
        }
    }
}

/// A distinct facet of the question that the loop must try to cover.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aspect {
    pub name: String,
    pub aspect_type: AspectType,
    /// Real in [0, 1]. >= `CORE_THRESHOLD` is core, otherwise optional.
    pub importance: f64,
    /// Lowercased, deduped terms used for keyword coverage matching.
    pub keywords: Vec<String>,
}

impl Aspect {
    pub fn new(
        name: impl Into<String>,
        aspect_type: AspectType,
        importance: f64,
        keywords: Vec<String>,
    ) -> Self {
        let mut kws: Vec<String> = keywords
            .into_iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        kws.sort();
        kws.dedup();
        Self {
            name: truncate_chars(name.into().trim(), 120),
            aspect_type,
            importance: importance.clamp(0.0, 1.0),
            keywords: kws,
        }
    }

    pub fn is_core(&self) -> bool {
        self.importance >= CORE_THRESHOLD
    }

    /// Trim + lowercase, used as the lookup key in `Coverage`. Display
    /// casing (`name`) is preserved separately.
    pub fn canonical_name(&self) -> String {
        self.name.trim().to_lowercase()
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

/// Per-aspect coverage state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageEntry {
    pub aspect: Aspect,
    /// In [0, 1]. Monotonic non-decreasing across a run.
    pub score: f64,
    /// 1-based hop index at which `score` first crossed `cover_threshold`.
    /// Set once and never rewritten.
    pub covered_at_hop: Option<u32>,
}

/// Mapping from canonicalized aspect name to its coverage entry. A
/// `BTreeMap` keeps snapshot output and iteration order deterministic.
pub type Coverage = BTreeMap<String, CoverageEntry>;

/// One hop's full record: what was asked, what came back, and how coverage
/// moved as a result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubQueryRecord {
    /// 1-based.
    pub hop: u32,
    pub sub_query: String,
    /// Null only for the initial hop when aspect extraction was empty.
    pub target_aspect: Option<String>,
    /// Ordered by score descending.
    pub passages: Vec<Passage>,
    /// Per-aspect score change this hop caused, keyed by canonical name.
    pub coverage_delta: BTreeMap<String, f64>,
    /// Whether this hop's sub-query was produced by the LLM path (as
    /// opposed to the template fallback). Lets "sub-query text contains a
    /// target-aspect keyword, or came from the LLM path" be checked
    /// mechanically instead of re-parsing prompt text.
    pub llm_used: bool,
}

/// A deduplicated citation drawn from a hop's passages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    pub id: String,
    pub title: String,
    pub filename: String,
    pub score: f32,
    pub snippet: String,
}

/// Degradation and run-shape flags surfaced to the caller: a
/// `ResearchResult` is always returned, even under degraded conditions,
/// with these flags indicating which degradations occurred.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchMetadata {
    /// "adaptive" or "batch".
    pub mode: String,
    pub estimated_hops: u32,
    pub actual_hops: u32,
    pub early_stop: bool,
    pub stop_reason: String,
    pub complexity_score: f64,
    pub weighted_coverage: f64,
    /// True if aspect extraction fell back to the heuristic path.
    pub extractor_fallback: bool,
    /// True if synthesis fell back to the deterministic path.
    pub synth_fallback: bool,
    /// Count of hops where the Retriever returned an error (absorbed as a
    /// zero-passage hop).
    pub retrieval_errors: u32,
    pub cancelled: bool,
    /// Read-only per-aspect snapshot: name, type, importance, score,
    /// covered_at_hop.
    pub coverage_snapshot: Vec<CoverageSnapshotEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageSnapshotEntry {
    pub name: String,
    pub aspect_type: AspectType,
    pub importance: f64,
    pub score: f64,
    pub covered_at_hop: Option<u32>,
}

/// Final output of a research run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchResult {
    pub question: String,
    pub answer: String,
    pub citations: Vec<Citation>,
    pub hop_log: Vec<SubQueryRecord>,
    pub metadata: ResearchMetadata,
}

/// Complete configuration surface for a run; no global/static config exists
/// anywhere in this crate.
#[derive(Clone)]
pub struct ResearchOptions {
    /// top_k passed to the Retriever on each hop.
    pub per_sub_k: usize,
    pub min_hops: u32,
    pub max_hops: u32,
    pub cover_threshold: f64,
    pub quality_threshold: f64,
    /// Selects aspect-guided mode (true) vs batch mode (false).
    pub adaptive: bool,
    /// Sub-queries generated per batch in aspect-guided mode. Default 1,
    /// raised for batch mode.
    pub sub_query_batch_size: usize,
    pub cancel_signal: Option<CancellationToken>,
    pub deadline: Option<Duration>,
}

impl Default for ResearchOptions {
    fn default() -> Self {
        Self {
            per_sub_k: 3,
            min_hops: 3,
            max_hops: 10,
            cover_threshold: 0.5,
            quality_threshold: 0.5,
            adaptive: true,
            sub_query_batch_size: 1,
            cancel_signal: None,
            deadline: None,
        }
    }
}

impl ResearchOptions {
    /// Budget sanity check: `min_hops > max_hops` or a zero `per_sub_k` are
    /// contradictory/invalid inputs, surfaced as `InvalidQuestion` by the
    /// loop's entry point (the taxonomy has no separate "invalid options"
    /// variant; budgets are part of the request the caller controls).
    pub fn validate(&self) -> Result<(), String> {
        if self.min_hops > self.max_hops {
            return Err(format!(
                "min_hops ({}) must not exceed max_hops ({})",
                self.min_hops, self.max_hops
            ));
        }
        if self.max_hops == 0 {
            return Err("max_hops must be at least 1".to_string());
        }
        if self.per_sub_k == 0 {
            return Err("per_sub_k must be at least 1".to_string());
        }
        if self.sub_query_batch_size == 0 {
            return Err("sub_query_batch_size must be at least 1".to_string());
        }
        Ok(())
    }
}
