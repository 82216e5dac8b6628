//! Deep Research Core
//!
//! Foundational error types and the `Retriever` seam shared across the
//! research workspace. This crate has zero dependencies on application-level
//! code (LLM providers, the research loop, synthesis) so that any crate in
//! the workspace can depend on it without pulling in the rest.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `passage` - The `Passage` record and `Retriever` trait
//!
//! ## Design Principles
//!
//! 1. **Zero external dependencies beyond serde/async-trait/thiserror**
//! 2. **Trait-based abstractions** - enables mocking and testing
//! 3. **Unidirectional dependency** - this crate depends on nothing else in
//!    the workspace

pub mod error;
pub mod passage;

pub use error::{CoreError, CoreResult};
pub use passage::{Passage, Retriever};
