//! Anthropic Provider
//!
//! Implementation of `LlmClient` against the Anthropic Messages API.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::provider::{missing_api_key_error, parse_http_error, LlmClient};
use super::types::{LlmError, LlmRequestOptions, LlmResult, ProviderConfig};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Claude client.
pub struct AnthropicClient {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl AnthropicClient {
    pub fn new(config: ProviderConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .expect("failed to build reqwest client");
        Self { config, client }
    }

    fn base_url(&self) -> &str {
        self.config.base_url.as_deref().unwrap_or(ANTHROPIC_API_URL)
    }

    fn build_request_body(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &LlmRequestOptions,
    ) -> serde_json::Value {
        serde_json::json!({
            "model": self.config.model,
            "max_tokens": options.max_tokens_hint.unwrap_or(self.config.max_tokens),
            "temperature": options.temperature_hint.unwrap_or(self.config.temperature),
            "system": system_prompt,
            "messages": [
                { "role": "user", "content": user_prompt }
            ],
        })
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicContentBlock>,
}

#[async_trait]
impl LlmClient for AnthropicClient {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: LlmRequestOptions,
    ) -> LlmResult<String> {
        if self.config.api_key.is_empty() {
            return Err(missing_api_key_error(self.name()));
        }

        let body = self.build_request_body(system_prompt, user_prompt, &options);

        let response = self
            .client
            .post(self.base_url())
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(self.config.timeout_ms)
                } else {
                    LlmError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(parse_http_error(status.as_u16(), &text, self.name()));
        }

        let parsed: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Other {
                message: format!("failed to parse Anthropic response: {}", e),
            })?;

        let text = parsed
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        Ok(text)
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ProviderConfig {
        ProviderConfig::anthropic("test-key", "claude-3-5-sonnet-20241022")
    }

    #[test]
    fn test_build_request_body_uses_defaults() {
        let client = AnthropicClient::new(test_config());
        let body = client.build_request_body("sys", "hello", &LlmRequestOptions::default());
        assert_eq!(body["model"], "claude-3-5-sonnet-20241022");
        assert_eq!(body["system"], "sys");
        assert_eq!(body["messages"][0]["content"], "hello");
    }

    #[test]
    fn test_build_request_body_honors_hints() {
        let client = AnthropicClient::new(test_config());
        let options = LlmRequestOptions {
            temperature_hint: Some(0.0),
            max_tokens_hint: Some(64),
        };
        let body = client.build_request_body("sys", "hello", &options);
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["max_tokens"], 64);
    }

    #[tokio::test]
    async fn test_generate_rejects_missing_api_key() {
        let mut config = test_config();
        config.api_key = String::new();
        let client = AnthropicClient::new(config);
        let result = client
            .generate("sys", "hello", LlmRequestOptions::default())
            .await;
        assert!(matches!(result, Err(LlmError::AuthenticationFailed { .. })));
    }
}
