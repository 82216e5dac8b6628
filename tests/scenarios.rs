//! Integration tests exercising the full `Research::run` state machine
//! against the concrete scenarios and invariants.

mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use deep_research::testing::FailingLlmClient;
use deep_research::{Research, ResearchOptions};

#[tokio::test]
async fn s1_simple_definition_converges_in_one_hop() {
    let research = Research::new(common::python_definition_retriever(), None);
    let options = ResearchOptions {
        min_hops: 1,
        max_hops: 5,
        ..Default::default()
    };
    let result = research.run("What is Python?", options).await.unwrap();

    assert_eq!(result.metadata.actual_hops, 1);
    assert!(result.metadata.early_stop);
    assert_eq!(result.metadata.stop_reason, "core_aspects_covered");
    assert_eq!(result.citations.len(), 3);
    // Best achievable score is 0.5*keyword_hits + 0.5*top_passage.score =
    // 0.5*1.0 + 0.5*0.9 = 0.95 (see coverage.rs's doc_score formula), not 1.0.
    assert!((result.metadata.weighted_coverage - 0.95).abs() < 1e-9);
}

#[tokio::test]
async fn s2_comparison_question_covers_all_aspects_within_budget() {
    let research = Research::new(common::sorting_comparison_retriever(), None);
    let options = ResearchOptions::default();
    let result = research
        .run("Compare quicksort vs bogosort", options)
        .await
        .unwrap();

    assert!(result.metadata.actual_hops <= 10);
    if result.metadata.stop_reason == "core_aspects_covered" {
        assert!(result.metadata.weighted_coverage >= 0.7);
        assert!(result.metadata.early_stop);
    }
    assert!(result.metadata.weighted_coverage >= 0.0 && result.metadata.weighted_coverage <= 1.0);
}

#[tokio::test]
async fn s3_uncoverable_aspect_runs_to_max_hops() {
    let research = Research::new(common::uncoverable_bogosort_retriever(), None);
    let options = ResearchOptions {
        min_hops: 3,
        max_hops: 5,
        ..Default::default()
    };
    let result = research
        .run("Compare quicksort vs bogosort", options)
        .await
        .unwrap();

    assert_eq!(result.metadata.actual_hops, 5);
    assert_eq!(result.metadata.stop_reason, "max_hops");
    assert!(!result.metadata.early_stop);
    let uncovered: Vec<_> = result
        .metadata
        .coverage_snapshot
        .iter()
        .filter(|e| e.covered_at_hop.is_none())
        .collect();
    assert!(!uncovered.is_empty());
    assert!(result.answer.contains("not fully covered") || result.answer.to_lowercase().contains("not fully covered"));
}

#[tokio::test]
async fn s4_budget_override_forces_exact_hop_count() {
    let research = Research::new(common::python_definition_retriever(), None);
    let options = ResearchOptions {
        min_hops: 5,
        max_hops: 5,
        ..Default::default()
    };
    let result = research.run("What is Python?", options).await.unwrap();

    assert_eq!(result.metadata.actual_hops, 5);
    assert_eq!(result.metadata.stop_reason, "max_hops");
    // Best achievable score is 0.5*keyword_hits + 0.5*top_passage.score =
    // 0.5*1.0 + 0.5*0.9 = 0.95 (see coverage.rs's doc_score formula), not 1.0.
    assert!((result.metadata.weighted_coverage - 0.95).abs() < 1e-9);
}

#[tokio::test]
async fn s5_cancellation_yields_partial_result() {
    let token = CancellationToken::new();
    let research = Research::new(common::sorting_comparison_retriever(), None);
    let options = ResearchOptions {
        min_hops: 7,
        max_hops: 7,
        cancel_signal: Some(token.clone()),
        ..Default::default()
    };

    // Cancel shortly after the run starts. The loop checks the signal at
    // the top of every hop, so the exact hop at cancellation depends on
    // scheduling, but termination and the partial-result contract must
    // hold regardless.
    let handle = tokio::spawn(async move { research.run("Compare quicksort vs bogosort", options).await });
    tokio::time::sleep(Duration::from_millis(1)).await;
    token.cancel();

    let result = handle.await.unwrap().unwrap();
    assert!(result.metadata.actual_hops <= 7);
    if result.metadata.cancelled {
        assert!(result.metadata.early_stop);
        assert_eq!(result.metadata.stop_reason, "cancelled");
    }
    assert!(!result.answer.is_empty());
}

#[tokio::test]
async fn s6_llm_outage_falls_back_to_heuristics_and_templates() {
    let research = Research::new(
        common::python_definition_retriever(),
        Some(Arc::new(FailingLlmClient::new())),
    );
    let options = ResearchOptions {
        min_hops: 1,
        max_hops: 3,
        ..Default::default()
    };
    let result = research.run("What is Python?", options).await.unwrap();

    assert!(result.metadata.extractor_fallback);
    assert!(result.metadata.synth_fallback);
    assert!(!result.answer.is_empty());
}

#[tokio::test]
async fn test_actual_hops_always_within_budget() {
    let research = Research::new(common::always_empty_retriever(), None);
    let options = ResearchOptions {
        min_hops: 2,
        max_hops: 6,
        ..Default::default()
    };
    let result = research.run("What is Rust?", options).await.unwrap();
    assert!(result.metadata.actual_hops >= 1);
    assert!(result.metadata.actual_hops <= 6);
}

#[tokio::test]
async fn test_empty_retriever_runs_to_max_hops_with_no_evidence_answer() {
    let research = Research::new(common::always_empty_retriever(), None);
    let options = ResearchOptions {
        min_hops: 2,
        max_hops: 2,
        ..Default::default()
    };
    let result = research.run("What is Rust?", options).await.unwrap();

    assert_eq!(result.metadata.actual_hops, 2);
    assert!(result.citations.is_empty());
    assert!(!result.answer.is_empty());
}

#[tokio::test]
async fn test_citations_have_no_duplicate_ids() {
    let research = Research::new(common::sorting_comparison_retriever(), None);
    let options = ResearchOptions::default();
    let result = research
        .run("Compare quicksort vs bogosort", options)
        .await
        .unwrap();

    let mut ids: Vec<&str> = result.citations.iter().map(|c| c.id.as_str()).collect();
    let original_len = ids.len();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), original_len);
}

#[tokio::test]
async fn test_same_question_against_deterministic_stubs_is_reproducible() {
    let run_once = || async {
        let research = Research::new(common::python_definition_retriever(), None);
        let options = ResearchOptions {
            min_hops: 1,
            max_hops: 3,
            ..Default::default()
        };
        research.run("What is Python?", options).await.unwrap()
    };

    let first = run_once().await;
    let second = run_once().await;

    assert_eq!(first.metadata.actual_hops, second.metadata.actual_hops);
    assert_eq!(first.metadata.stop_reason, second.metadata.stop_reason);
    assert_eq!(first.hop_log.len(), second.hop_log.len());
    assert_eq!(first.answer, second.answer);
}

#[tokio::test]
async fn test_weighted_coverage_is_always_in_unit_range() {
    let research = Research::new(common::sorting_comparison_retriever(), None);
    let result = research
        .run("Compare quicksort vs bogosort", ResearchOptions::default())
        .await
        .unwrap();
    assert!(result.metadata.weighted_coverage >= 0.0);
    assert!(result.metadata.weighted_coverage <= 1.0);
}

#[tokio::test]
async fn test_batch_mode_disables_aspect_guided_stopping_but_still_terminates() {
    let research = Research::new(common::sorting_comparison_retriever(), None);
    let options = ResearchOptions {
        adaptive: false,
        min_hops: 2,
        max_hops: 4,
        ..Default::default()
    };
    let result = research
        .run("Compare quicksort vs bogosort", options)
        .await
        .unwrap();

    assert_eq!(result.metadata.mode, "batch");
    assert!(result.metadata.actual_hops >= 2 && result.metadata.actual_hops <= 4);
    // Aspect-guided stopping is off, so a "core_aspects_covered" stop never
    // fires in batch mode even though the same aspects would qualify under
    // aspect-guided mode.
    assert_ne!(result.metadata.stop_reason, "core_aspects_covered");
}
