//! LLM Types
//!
//! Core types for LLM client interactions. Deliberately narrow: the research
//! loop only ever needs a single system/user prompt turned into text, never
//! tool calls, streaming, or multi-turn history.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Supported LLM provider kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Anthropic,
    OpenAI,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Anthropic => write!(f, "anthropic"),
            ProviderKind::OpenAI => write!(f, "openai"),
        }
    }
}

/// Configuration for an LLM client instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// The provider kind.
    pub provider: ProviderKind,
    /// API key for the provider.
    pub api_key: String,
    /// Base URL override (mainly for testing against a local stub).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Model name to use.
    pub model: String,
    /// Default maximum tokens to generate.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Default temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f32 {
    0.3
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl ProviderConfig {
    pub fn anthropic(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: ProviderKind::Anthropic,
            api_key: api_key.into(),
            base_url: None,
            model: model.into(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_ms: default_timeout_ms(),
        }
    }

    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: ProviderKind::OpenAI,
            api_key: api_key.into(),
            base_url: None,
            model: model.into(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Per-request options for a `generate` call.
///
/// Mirrors section 6 of the contract: "a temperature hint and a soft token
/// cap". Both are hints — a provider may clamp them to its own limits.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LlmRequestOptions {
    /// Optional temperature override for this call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_hint: Option<f32>,
    /// Optional soft cap on generated tokens for this call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens_hint: Option<u32>,
}

/// Errors an `LlmClient` implementation can return.
///
/// The research loop never propagates these — every call site that reaches
/// into an `LlmClient` has a heuristic or deterministic fallback and absorbs
/// this error instead of surfacing it to the caller.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("rate limited: {message}")]
    RateLimited { message: String },

    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("server error (status {status:?}): {message}")]
    ServerError {
        message: String,
        status: Option<u16>,
    },

    #[error("request timed out after {0}ms")]
    Timeout(u64),

    #[error("empty response from model")]
    EmptyResponse,

    #[error("network error: {0}")]
    Network(String),

    #[error("{message}")]
    Other { message: String },
}

/// Result type alias for LLM client calls.
pub type LlmResult<T> = Result<T, LlmError>;
