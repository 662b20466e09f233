//! # docqa-core
//!
//! The no-std capability traits that the rest of the `docqa` workspace is written against.
//!
//! Retrieval-augmented question answering needs exactly two outside services: something
//! that turns text into vectors, and something that turns a prompt into an answer. Both are
//! black boxes to the pipeline, so they are modelled as traits with a single required
//! async method each. Provider crates implement them; tests implement them with
//! deterministic stubs.
//!
//! ```text
//! ┌─────────────────┐    ┌──────────────────┐    ┌─────────────────┐
//! │   docqa-rag     │───▶│   docqa-core     │◀───│   Adapters      │
//! │                 │    │  (this crate)    │    │                 │
//! │ - ingestion     │    │                  │    │ - docqa-ort     │
//! │ - retrieval     │    │ - EmbeddingModel │    │ - docqa-gemini  │
//! │ - grounding     │    │ - LanguageModel  │    │ - test stubs    │
//! └─────────────────┘    └──────────────────┘    └─────────────────┘
//! ```
//!
//! | Capability | Trait | Required method |
//! |------------|-------|-----------------|
//! | **Embeddings** | [`EmbeddingModel`] | [`embed`](EmbeddingModel::embed) |
//! | **Answer generation** | [`LanguageModel`] | [`generate`](LanguageModel::generate) |
//!
//! ## Example
//!
//! ```rust
//! use docqa_core::{LanguageModel, llm::Request};
//!
//! struct Echo;
//!
//! impl LanguageModel for Echo {
//!     fn model_id(&self) -> &str {
//!         "echo"
//!     }
//!
//!     async fn generate(&self, request: Request) -> docqa_core::Result {
//!         Ok(request.prompt)
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let answer = Echo.generate(Request::new("ping")).await.unwrap();
//! assert_eq!(answer, "ping");
//! # });
//! ```

#![no_std]
extern crate alloc;

/// Text embeddings.
pub mod embedding;
/// Single-shot text generation.
pub mod llm;

use alloc::string::String;

#[doc(inline)]
pub use embedding::EmbeddingModel;
#[doc(inline)]
pub use llm::LanguageModel;

/// Result type used throughout the crate.
///
/// Type alias for [`anyhow::Result<T>`](anyhow::Result) with [`String`] as default success type.
pub type Result<T = String> = anyhow::Result<T>;

pub use anyhow::Error;
