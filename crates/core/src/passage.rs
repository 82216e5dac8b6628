//! Passage and Retriever Seam
//!
//! `Passage` and the `Retriever` trait are the one shared boundary between the
//! research loop and the host's vector corpus. The core crate only owns the
//! shape of that boundary, not any particular retrieval backend.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreResult;

/// A single retrieval result, scoped to the caller's corpus externally.
///
/// The core never knows which user or collection a passage came from — that
/// scoping is the retriever implementation's responsibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    /// Stable identifier within the retriever's own index.
    pub id: String,
    /// Body text used for matching and citation snippets.
    pub text: String,
    /// Source document title.
    #[serde(default)]
    pub title: String,
    /// Source file name.
    #[serde(default)]
    pub filename: String,
    /// Similarity score in `[0, 1]`, higher is more relevant.
    pub score: f32,
    /// Opaque provenance metadata carried through unchanged.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Passage {
    /// Lowercased text used for keyword and substring matching.
    pub fn text_lower(&self) -> String {
        self.text.to_lowercase()
    }

    /// Lowercased title used for keyword and substring matching.
    pub fn title_lower(&self) -> String {
        self.title.to_lowercase()
    }
}

/// Opaque passage source. Given a query and a `top_k`, returns ranked
/// passages. Implementations must not raise on "no results" — an empty
/// `Vec` is the correct response; genuine failures are surfaced as `Err`
/// and the research loop degrades that hop to zero passages.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Retrieve up to `top_k` passages relevant to `query`.
    async fn retrieve(&self, query: &str, top_k: usize) -> CoreResult<Vec<Passage>>;
}
