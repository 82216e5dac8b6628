//! Research Error Types
//!
//! Only `InvalidQuestion` and `InternalInvariant` from the taxonomy in the
//! design notes ever reach a caller of `Research::run`. Dependency failures
//! (retriever errors, LLM failures) and cancellation are absorbed internally
//! and recorded as `ResearchResult` metadata instead — see `ResearchMetadata`.

use thiserror::Error;

/// Errors that can escape `Research::run`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResearchError {
    /// The question was empty, oversize, or the budgets were contradictory.
    #[error("invalid question: {0}")]
    InvalidQuestion(String),

    /// A programming error: something the loop's invariants guarantee did
    /// not hold. Surfaced with enough context to debug rather than panicking.
    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
}

/// Result type alias for research loop operations.
pub type RunResult<T> = Result<T, ResearchError>;

impl ResearchError {
    pub fn invalid_question(msg: impl Into<String>) -> Self {
        Self::InvalidQuestion(msg.into())
    }

    pub fn internal_invariant(msg: impl Into<String>) -> Self {
        Self::InternalInvariant(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_question_display() {
        let err = ResearchError::invalid_question("question is empty");
        assert_eq!(err.to_string(), "invalid question: question is empty");
    }

    #[test]
    fn test_internal_invariant_display() {
        let err = ResearchError::internal_invariant("aspect not in coverage");
        assert_eq!(
            err.to_string(),
            "internal invariant violated: aspect not in coverage"
        );
    }
}
