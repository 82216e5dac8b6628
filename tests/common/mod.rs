//! Shared fixtures for the scenario integration tests.

use std::sync::Arc;

use deep_research::testing::{passage, ScriptedLlmClient, StaticRetriever};
use deep_research::{LlmClient, Retriever};

/// Builds the retriever used by S1: any query mentioning "python" returns
/// three passages with descending scores, all containing the keyword.
pub fn python_definition_retriever() -> Arc<dyn Retriever> {
    Arc::new(StaticRetriever::new(vec![(
        "python",
        vec![
            passage("p1", "Python is a high-level programming language.", 0.9),
            passage("p2", "Python emphasizes readability.", 0.6),
            passage("p3", "Python is widely used for scripting.", 0.4),
        ],
    )]))
}

/// Builds the retriever used by S2: every aspect (quicksort, bogosort, and
/// their comparison) has a reachable passage containing its own keyword, so
/// the run can reach full coverage.
pub fn sorting_comparison_retriever() -> Arc<dyn Retriever> {
    Arc::new(StaticRetriever::new(vec![
        (
            "quicksort",
            vec![passage("qs1", "Quicksort partitions the array around a pivot and recurses.", 0.9)],
        ),
        (
            "bogosort",
            vec![passage("bs1", "Bogosort randomly shuffles the array until it happens to be sorted.", 0.85)],
        ),
        (
            "differences",
            vec![passage(
                "cmp1",
                "The main difference is quicksort's efficiency compared to bogosort's randomness.",
                0.8,
            )],
        ),
    ]))
}

/// S3: the "bogosort" sub-query always comes back empty and no other
/// retrievable passage ever mentions the word "bogosort", so that aspect
/// can never be covered through direct or incidental keyword overlap.
pub fn uncoverable_bogosort_retriever() -> Arc<dyn Retriever> {
    Arc::new(StaticRetriever::new(vec![
        (
            "quicksort",
            vec![passage("qs1", "Quicksort partitions the array around a pivot and recurses.", 0.9)],
        ),
        (
            "differences",
            vec![passage(
                "cmp1",
                "The main difference lies in average-case time complexity, with quicksort being far more practical.",
                0.8,
            )],
        ),
    ]))
}

pub fn always_empty_retriever() -> Arc<dyn Retriever> {
    Arc::new(StaticRetriever::empty())
}

pub fn scripted_llm(responses: Vec<&str>) -> Arc<dyn LlmClient> {
    Arc::new(ScriptedLlmClient::new(
        responses.into_iter().map(String::from).collect(),
    ))
}
