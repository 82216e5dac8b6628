//! Research Loop — the state machine that orchestrates the Complexity
//! Analyzer, Aspect Extractor, Coverage Tracker, Sub-query Generator, and
//! Stopping Oracle around a Retriever. Grounded on the cancellation-aware,
//! strictly-sequential iteration loop pattern used elsewhere in this
//! lineage: a `CancellationToken` checked at every suspension point, and
//! dependency failures absorbed so the loop always reaches a defined
//! termination rather than propagating a raw error.
//!
//! States: `INIT -> EXTRACTING -> PLANNING -> RETRIEVING -> UPDATING ->
//! DECIDING -> {PLANNING, SYNTHESIZING} -> DONE`.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use deep_research_core::{CoreError, Retriever};
use deep_research_llm::LlmClient;

use crate::coverage;
use crate::error::ResearchError;
use crate::model::{
    Coverage, CoverageSnapshotEntry, Question, ResearchMetadata, ResearchOptions, ResearchResult,
    SubQueryRecord,
};
use crate::stopping::{self, Decision, StoppingInput};
use crate::synthesis;
use crate::{aspects, complexity, subquery};

const REASON_CANCELLED: &str = "cancelled";

/// Entry point: orchestrates one research run against a fixed Retriever
/// and an optional LLM client. Holding these as the `Research` instance's
/// state (rather than global configuration) is the dependency-injection
/// seam the whole core relies on.
pub struct Research {
    retriever: Arc<dyn Retriever>,
    llm: Option<Arc<dyn LlmClient>>,
}

impl Research {
    pub fn new(retriever: Arc<dyn Retriever>, llm: Option<Arc<dyn LlmClient>>) -> Self {
        Self { retriever, llm }
    }

    /// Runs one research request to completion. Only `InvalidQuestion` and
    /// `InternalInvariant` ever escape as `Err`; dependency failures and
    /// cancellation are absorbed into the returned `ResearchResult`.
    pub async fn run(
        &self,
        question: &str,
        options: ResearchOptions,
    ) -> Result<ResearchResult, ResearchError> {
        options
            .validate()
            .map_err(ResearchError::invalid_question)?;
        let question = Question::parse(question).map_err(ResearchError::invalid_question)?;

        let deadline_at = options.deadline.map(|d| Instant::now() + d);
        let llm_ref = self.llm.as_deref();

        // EXTRACTING
        let (initial_aspects, used_llm_for_extraction) =
            aspects::extract(question.as_str(), llm_ref).await;
        let extractor_fallback = llm_ref.is_some() && !used_llm_for_extraction;

        let (complexity_score, estimated_hops, _indicators) =
            complexity::analyze(question.as_str(), options.min_hops, options.max_hops);

        let mut coverage: Coverage = coverage::init(&initial_aspects);
        let aspect_coverage_enabled = options.adaptive && !initial_aspects.is_empty();

        // Batch mode (adaptive=false) generates its sub-queries up front from
        // the complexity estimate rather than one at a time from the
        // shrinking uncovered-aspect set; aspect-guided mode keeps the
        // caller-supplied batch size (default 1). Either way, retrieval
        // below stays strictly sequential — batching only changes how many
        // sub-queries a single planning step produces, never how many hops
        // execute concurrently.
        let effective_batch_size = if options.adaptive {
            options.sub_query_batch_size
        } else {
            options.sub_query_batch_size.max(estimated_hops as usize)
        };

        info!(
            complexity_score,
            estimated_hops,
            mode = if options.adaptive { "adaptive" } else { "batch" },
            "research loop starting"
        );

        let mut hop_log: Vec<SubQueryRecord> = Vec::new();
        let mut retrieval_errors: u32 = 0;
        let mut cancelled = false;
        let mut stop_reason: &str = stopping::REASON_CONTINUE_DEFAULT;
        let mut hop: u32 = 0;

        // Sub-queries generated ahead in batch mode but still retrieved one
        // at a time, so every hop advances the counter by exactly 1 and
        // retrieval stays strictly sequential even when batching is used.
        let mut pending: Vec<subquery::GeneratedSubQuery> = Vec::new();

        loop {
            // Checked between hops, never before the first one: a run
            // always completes at least one hop even if cancellation fires
            // immediately, matching the `actual_hops >= 1` invariant.
            if hop > 0 && is_cancelled(&options, deadline_at) {
                cancelled = true;
                stop_reason = REASON_CANCELLED;
                break;
            }

            hop += 1;

            // PLANNING
            let next = if hop == 1 && initial_aspects.is_empty() {
                subquery::GeneratedSubQuery {
                    text: question.as_str().to_string(),
                    aspect_name: String::new(),
                    llm_used: false,
                }
            } else {
                if pending.is_empty() {
                    let mut candidates = coverage::uncovered(&coverage, options.cover_threshold);
                    if candidates.is_empty() && !coverage.is_empty() {
                        // Every aspect already meets the threshold but the
                        // budget still forces another hop (e.g. a fixed
                        // min_hops=max_hops run): keep refining the
                        // highest-importance aspect rather than leave this
                        // hop's target_aspect null, which is reserved for
                        // the degenerate no-aspects case only.
                        candidates = coverage.values().map(|e| e.aspect.clone()).collect();
                        candidates.sort_by(|a, b| b.importance.partial_cmp(&a.importance).unwrap());
                    }
                    pending = subquery::next_subqueries(
                        question.as_str(),
                        &candidates,
                        llm_ref,
                        effective_batch_size,
                    )
                    .await;
                }
                match pending_pop(&mut pending) {
                    Some(item) => item,
                    None => {
                        // No aspects at all (shouldn't happen outside the
                        // degenerate case handled above, but never stall).
                        subquery::GeneratedSubQuery {
                            text: question.as_str().to_string(),
                            aspect_name: String::new(),
                            llm_used: false,
                        }
                    }
                }
            };

            let target_aspect = if next.aspect_name.is_empty() {
                None
            } else {
                let canonical = next.aspect_name.trim().to_lowercase();
                if !coverage.contains_key(&canonical) {
                    return Err(ResearchError::internal_invariant(format!(
                        "sub-query targeted aspect '{canonical}' not present in coverage"
                    )));
                }
                Some(canonical)
            };

            // RETRIEVING
            let passages = match self.retriever.retrieve(&next.text, options.per_sub_k).await {
                Ok(passages) => passages,
                Err(err) => {
                    warn!(error = %retrieval_error_message(&err), hop, "retriever call failed, degrading to zero-passage hop");
                    retrieval_errors += 1;
                    Vec::new()
                }
            };

            // UPDATING
            let coverage_delta: BTreeMap<String, f64> =
                coverage::update(&mut coverage, &passages, hop, options.cover_threshold);

            hop_log.push(SubQueryRecord {
                hop,
                sub_query: next.text,
                target_aspect,
                passages: passages.clone(),
                coverage_delta,
                llm_used: next.llm_used,
            });

            // DECIDING
            let stopping_input = StoppingInput {
                hop,
                last_hop_passages: &passages,
                coverage: &coverage,
                aspect_coverage_enabled,
                min_hops: options.min_hops,
                max_hops: options.max_hops,
                cover_threshold: options.cover_threshold,
                quality_threshold: options.quality_threshold,
            };
            let (decision, reason) = stopping::decide(&stopping_input);
            stop_reason = reason;
            if decision == Decision::Stop {
                break;
            }
        }

        // SYNTHESIZING
        let (answer, used_llm_for_synthesis) =
            synthesis::synthesize(question.as_str(), &hop_log, &coverage, llm_ref).await;
        let synth_fallback = llm_ref.is_some() && !used_llm_for_synthesis;
        let citations = synthesis::build_citations(&hop_log, &coverage);

        let weighted_coverage = coverage::weighted(&coverage);
        let early_stop = stop_reason != stopping::REASON_MAX_HOPS;

        info!(
            actual_hops = hop,
            stop_reason,
            weighted_coverage,
            "research loop finished"
        );

        let coverage_snapshot = coverage
            .values()
            .map(|e| CoverageSnapshotEntry {
                name: e.aspect.name.clone(),
                aspect_type: e.aspect.aspect_type,
                importance: e.aspect.importance,
                score: e.score,
                covered_at_hop: e.covered_at_hop,
            })
            .collect();

        Ok(ResearchResult {
            question: question.as_str().to_string(),
            answer,
            citations,
            hop_log,
            metadata: ResearchMetadata {
                mode: if options.adaptive { "adaptive" } else { "batch" }.to_string(),
                estimated_hops,
                actual_hops: hop,
                early_stop,
                stop_reason: stop_reason.to_string(),
                complexity_score,
                weighted_coverage,
                extractor_fallback,
                synth_fallback,
                retrieval_errors,
                cancelled,
                coverage_snapshot,
            },
        })
    }
}

fn pending_pop(pending: &mut Vec<subquery::GeneratedSubQuery>) -> Option<subquery::GeneratedSubQuery> {
    if pending.is_empty() {
        None
    } else {
        Some(pending.remove(0))
    }
}

fn is_cancelled(options: &ResearchOptions, deadline_at: Option<Instant>) -> bool {
    if let Some(signal) = &options.cancel_signal {
        if signal.is_cancelled() {
            return true;
        }
    }
    if let Some(deadline) = deadline_at {
        if Instant::now() >= deadline {
            return true;
        }
    }
    false
}

fn retrieval_error_message(err: &CoreError) -> String {
    err.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StaticRetriever;

    #[tokio::test]
    async fn test_run_rejects_empty_question() {
        let research = Research::new(Arc::new(StaticRetriever::empty()), None);
        let result = research.run("   ", ResearchOptions::default()).await;
        assert!(matches!(result, Err(ResearchError::InvalidQuestion(_))));
    }

    #[tokio::test]
    async fn test_run_rejects_inverted_budgets() {
        let research = Research::new(Arc::new(StaticRetriever::empty()), None);
        let options = ResearchOptions {
            min_hops: 5,
            max_hops: 1,
            ..Default::default()
        };
        let result = research.run("What is Rust?", options).await;
        assert!(matches!(result, Err(ResearchError::InvalidQuestion(_))));
    }

    #[tokio::test]
    async fn test_actual_hops_within_max_hops() {
        let research = Research::new(Arc::new(StaticRetriever::empty()), None);
        let options = ResearchOptions {
            min_hops: 1,
            max_hops: 4,
            ..Default::default()
        };
        let result = research.run("What is Rust?", options).await.unwrap();
        assert!(result.metadata.actual_hops <= 4);
        assert!(result.metadata.actual_hops >= 1);
    }

    #[tokio::test]
    async fn test_min_hops_equals_max_hops_forces_exact_hop_count() {
        let research = Research::new(Arc::new(StaticRetriever::empty()), None);
        let options = ResearchOptions {
            min_hops: 1,
            max_hops: 1,
            ..Default::default()
        };
        let result = research.run("What is Rust?", options).await.unwrap();
        assert_eq!(result.metadata.actual_hops, 1);
        assert_eq!(result.metadata.stop_reason, "max_hops");
    }
}
