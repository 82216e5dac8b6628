//! Deep Research LLM
//!
//! Provides a narrow, unified interface for the one thing the research loop
//! needs from a language model: turn a system/user prompt pair into text.
//! Two backends are included — Anthropic and OpenAI — both optional; the
//! research loop works, in heuristic/template mode, with none at all.

pub mod anthropic;
pub mod openai;
pub mod provider;
pub mod types;

pub use anthropic::AnthropicClient;
pub use openai::OpenAIClient;
pub use provider::LlmClient;
pub use types::*;
