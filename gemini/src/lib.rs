//! Google Gemini adapters for the `docqa` capability traits.
//!
//! [`GeminiBackend`] talks to the **Gemini Developer API** over REST and implements both
//! [`LanguageModel`](docqa_core::LanguageModel) (via `generateContent`) and
//! [`EmbeddingModel`](docqa_core::EmbeddingModel) (via `embedContent` and
//! `batchEmbedContents`).
//!
//! # Quick start
//!
//! ```no_run
//! use docqa_core::{LanguageModel, llm::{Parameters, Request}};
//! use docqa_gemini::GeminiBackend;
//!
//! # async fn run() -> docqa_core::Result<()> {
//! let gemini = GeminiBackend::from_env()?.with_text_model("gemini-2.5-flash");
//! let request = Request::new("Explain Tokio in two bullet points.")
//!     .with_parameters(Parameters::deterministic());
//! println!("{}", gemini.generate(request).await?);
//! # Ok(()) }
//! ```

mod client;
mod config;
mod embedding;
mod error;
mod llm;
mod types;

pub use config::{
    API_KEY_VARS, AuthMode, DEFAULT_EMBEDDING_DIMENSIONS, DEFAULT_EMBEDDING_MODEL, DEFAULT_MODEL,
    GEMINI_API_BASE_URL, GeminiBackend,
};
pub use error::GeminiError;
