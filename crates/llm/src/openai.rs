//! OpenAI Provider
//!
//! Implementation of `LlmClient` against the OpenAI Chat Completions API.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::provider::{missing_api_key_error, parse_http_error, LlmClient};
use super::types::{LlmError, LlmRequestOptions, LlmResult, ProviderConfig};

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// OpenAI chat completions client.
pub struct OpenAIClient {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl OpenAIClient {
    pub fn new(config: ProviderConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .expect("failed to build reqwest client");
        Self { config, client }
    }

    fn base_url(&self) -> &str {
        self.config.base_url.as_deref().unwrap_or(OPENAI_API_URL)
    }

    fn model_supports_reasoning(&self) -> bool {
        let model = self.config.model.to_lowercase();
        model.starts_with("o1") || model.starts_with("o3")
    }

    fn build_request_body(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &LlmRequestOptions,
    ) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": options.max_tokens_hint.unwrap_or(self.config.max_tokens),
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt },
            ],
        });

        if !self.model_supports_reasoning() {
            body["temperature"] = serde_json::json!(options
                .temperature_hint
                .unwrap_or(self.config.temperature));
        }

        body
    }
}

#[derive(Debug, Deserialize)]
struct OpenAIMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
}

#[async_trait]
impl LlmClient for OpenAIClient {
    fn name(&self) -> &'static str {
        "openai"
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
            .bearer_auth(&self.config.api_key)
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

        let parsed: OpenAIResponse = response.json().await.map_err(|e| LlmError::Other {
            message: format!("failed to parse OpenAI response: {}", e),
        })?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

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
        ProviderConfig::openai("test-key", "gpt-4o")
    }

    #[test]
    fn test_build_request_body_includes_temperature_for_regular_models() {
        let client = OpenAIClient::new(test_config());
        let body = client.build_request_body("sys", "hello", &LlmRequestOptions::default());
        assert!(body.get("temperature").is_some());
        assert_eq!(body["messages"][0]["role"], "system");
    }

    #[test]
    fn test_build_request_body_omits_temperature_for_reasoning_models() {
        let mut config = test_config();
        config.model = "o3-mini".to_string();
        let client = OpenAIClient::new(config);
        let body = client.build_request_body("sys", "hello", &LlmRequestOptions::default());
        assert!(body.get("temperature").is_none());
    }

    #[tokio::test]
    async fn test_generate_rejects_missing_api_key() {
        let mut config = test_config();
        config.api_key = String::new();
        let client = OpenAIClient::new(config);
        let result = client
            .generate("sys", "hello", LlmRequestOptions::default())
            .await;
        assert!(matches!(result, Err(LlmError::AuthenticationFailed { .. })));
    }
}
