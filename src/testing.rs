//! Deterministic test doubles for `Retriever` and `LlmClient`, used by this
//! crate's own tests and exported for integration tests and downstream
//! callers exercising the loop without live dependencies.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use deep_research_core::{CoreError, CoreResult, Passage, Retriever};
use deep_research_llm::{LlmClient, LlmError, LlmRequestOptions, LlmResult, ProviderConfig, ProviderKind};

/// Retriever mock keyed by substring match on the query. Rules are checked
/// in order; the first whose substring matches the (lowercased) query wins.
/// If nothing matches, returns an empty passage list — never an error,
/// matching the real contract's "no results is not an error" rule.
pub struct StaticRetriever {
    rules: Vec<(String, Vec<Passage>)>,
}

impl StaticRetriever {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn new(rules: Vec<(&str, Vec<Passage>)>) -> Self {
        Self {
            rules: rules.into_iter().map(|(k, v)| (k.to_lowercase(), v)).collect(),
        }
    }
}

#[async_trait]
impl Retriever for StaticRetriever {
    async fn retrieve(&self, query: &str, top_k: usize) -> CoreResult<Vec<Passage>> {
        let lowered = query.to_lowercase();
        for (key, passages) in &self.rules {
            if lowered.contains(key.as_str()) {
                return Ok(passages.iter().take(top_k).cloned().collect());
            }
        }
        Ok(Vec::new())
    }
}

/// Retriever mock that always fails, for exercising the zero-passage
/// degradation path deterministically.
pub struct FailingRetriever;

#[async_trait]
impl Retriever for FailingRetriever {
    async fn retrieve(&self, _query: &str, _top_k: usize) -> CoreResult<Vec<Passage>> {
        Err(CoreError::retrieval("mock retriever always fails"))
    }
}

/// LLM mock that returns pre-scripted responses in order, one per call.
/// Calling past the end of the script repeats the last entry so tests don't
/// need to predict the exact call count.
pub struct ScriptedLlmClient {
    script: Vec<String>,
    calls: AtomicUsize,
    config: ProviderConfig,
}

impl ScriptedLlmClient {
    pub fn new(script: Vec<String>) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
            config: ProviderConfig::anthropic("test-key", "test-model"),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn model(&self) -> &str {
        "test-model"
    }

    async fn generate(
        &self,
        _system_prompt: &str,
        _user_prompt: &str,
        _options: LlmRequestOptions,
    ) -> LlmResult<String> {
        let idx = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.script.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        let bounded = idx.min(self.script.len() - 1);
        Ok(self.script[bounded].clone())
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

/// LLM mock that always errors, for the LLM-outage scenario (S6).
pub struct FailingLlmClient {
    config: ProviderConfig,
    calls: Mutex<usize>,
}

impl FailingLlmClient {
    pub fn new() -> Self {
        Self {
            config: ProviderConfig::openai("test-key", "test-model"),
            calls: Mutex::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl Default for FailingLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmClient for FailingLlmClient {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn model(&self) -> &str {
        "test-model"
    }

    async fn generate(
        &self,
        _system_prompt: &str,
        _user_prompt: &str,
        _options: LlmRequestOptions,
    ) -> LlmResult<String> {
        *self.calls.lock().unwrap() += 1;
        Err(LlmError::Other {
            message: "mock LLM always fails".to_string(),
        })
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

pub fn passage(id: &str, text: &str, score: f32) -> Passage {
    Passage {
        id: id.to_string(),
        text: text.to_string(),
        title: String::new(),
        filename: String::new(),
        score,
        metadata: std::collections::BTreeMap::new(),
    }
}
