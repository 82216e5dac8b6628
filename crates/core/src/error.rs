//! Core Error Types
//!
//! Defines the foundational error types shared across the research workspace.
//! Dependency-free (only thiserror + serde_json) so downstream crates can
//! depend on it without pulling in HTTP clients or async runtimes.
//!
//! The `deep-research` application crate wraps this with additional variants
//! (LLM failures, input validation, cancellation) that belong to the research
//! loop rather than to a shared seam.

use thiserror::Error;

/// Core error type for the research workspace.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A retriever or other external collaborator failed
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Parse errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for core errors
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a retrieval error
    pub fn retrieval(msg: impl Into<String>) -> Self {
        Self::Retrieval(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Convert CoreError to a string
impl From<CoreError> for String {
    fn from(err: CoreError) -> String {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::config("invalid setting");
        assert_eq!(err.to_string(), "Configuration error: invalid setting");
    }

    #[test]
    fn test_error_conversion() {
        let err = CoreError::config("invalid setting");
        let msg: String = err.into();
        assert!(msg.contains("Configuration error"));
    }

    #[test]
    fn test_validation_error() {
        let err = CoreError::validation("field is required");
        assert_eq!(err.to_string(), "Validation error: field is required");
    }

    #[test]
    fn test_retrieval_error() {
        let err = CoreError::retrieval("connection refused");
        assert_eq!(err.to_string(), "Retrieval error: connection refused");
    }

    #[test]
    fn test_not_found_error() {
        let err = CoreError::not_found("passage store unavailable");
        assert_eq!(
            err.to_string(),
            "Not found: passage store unavailable"
        );
    }

    #[test]
    fn test_internal_error() {
        let err = CoreError::internal("lock poisoned");
        assert_eq!(err.to_string(), "Internal error: lock poisoned");
    }
}
