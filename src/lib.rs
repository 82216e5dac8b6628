//! Deep Research
//!
//! An adaptive multi-hop research loop: decompose a natural-language
//! question into facets, generate targeted sub-queries against a
//! user-scoped corpus, track per-facet coverage, and synthesize a final
//! cited answer. The loop is single-flight and strictly sequential per run
//! — hops never execute concurrently because each depends on the previous
//! hop's coverage update.
//!
//! ## Module Organization
//!
//! - `model` — `Question`, `Aspect`, `Coverage`, hop records, the final
//!   result, and `ResearchOptions` (the crate's entire configuration
//!   surface; there is no global/static state).
//! - `error` — `ResearchError`, the only error type that escapes `run`.
//! - `complexity` — pure complexity scoring and hop-target estimation.
//! - `aspects` — facet extraction, LLM-preferred with heuristic fallback.
//! - `coverage` — deterministic keyword-based coverage scoring.
//! - `subquery` — sub-query generation, LLM-preferred with template fallback.
//! - `stopping` — the pure stop/continue decision ladder.
//! - `synthesis` — final answer and citation assembly.
//! - `research_loop` — the state machine tying the above together.
//! - `testing` — deterministic `Retriever`/`LlmClient` doubles for tests.
//!
//! Retriever and LLM calls are the only suspension points; the core itself
//! performs no I/O.

pub mod aspects;
pub mod complexity;
pub mod coverage;
pub mod error;
pub mod model;
pub mod research_loop;
pub mod stopping;
pub mod subquery;
pub mod synthesis;
pub mod testing;

pub use error::{ResearchError, RunResult};
pub use model::{
    Aspect, AspectType, Citation, Coverage, CoverageEntry, CoverageSnapshotEntry, Question,
    ResearchMetadata, ResearchOptions, ResearchResult, SubQueryRecord, CORE_THRESHOLD,
};
pub use research_loop::Research;

pub use deep_research_core::{CoreError, CoreResult, Passage, Retriever};
pub use deep_research_llm::{LlmClient, LlmError, LlmRequestOptions, LlmResult, ProviderConfig, ProviderKind};
