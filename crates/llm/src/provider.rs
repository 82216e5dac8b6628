//! LLM Client Trait
//!
//! Defines the common interface every LLM backend implements. Narrower than
//! a general-purpose chat API on purpose: the research loop's only use of an
//! LLM is "take a system prompt and a user prompt, give me text back."

use async_trait::async_trait;

use super::types::{LlmError, LlmRequestOptions, LlmResult, ProviderConfig};

/// Trait that all LLM clients must implement.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Returns the provider name for identification (used in logs and
    /// `ResearchResult` metadata when a degradation is recorded).
    fn name(&self) -> &'static str;

    /// Returns the model currently configured.
    fn model(&self) -> &str;

    /// Generate text from a system/user prompt pair.
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: LlmRequestOptions,
    ) -> LlmResult<String>;

    /// Get the configuration for this client.
    fn config(&self) -> &ProviderConfig;
}

/// Helper to build an authentication error with provider context.
pub fn missing_api_key_error(provider: &str) -> LlmError {
    LlmError::AuthenticationFailed {
        message: format!("API key not configured for {}", provider),
    }
}

/// Helper to map an HTTP status + body into a typed `LlmError`.
pub fn parse_http_error(status: u16, body: &str, provider: &str) -> LlmError {
    match status {
        401 => LlmError::AuthenticationFailed {
            message: format!("{}: invalid API key", provider),
        },
        403 => LlmError::AuthenticationFailed {
            message: format!("{}: access denied", provider),
        },
        429 => LlmError::RateLimited {
            message: body.to_string(),
        },
        400 => LlmError::InvalidRequest {
            message: body.to_string(),
        },
        500..=599 => LlmError::ServerError {
            message: body.to_string(),
            status: Some(status),
        },
        _ => LlmError::Other {
            message: format!("HTTP {}: {}", status, body),
        },
    }
}
