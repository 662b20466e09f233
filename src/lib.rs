//! # docqa
//!
//! Façade crate for grounded question answering over a single document. It re-exports
//! the capability traits from [`docqa_core`] and, behind features, the pipeline and the
//! provider adapters.
//!
//! ## What's inside?
//!
//! - [`EmbeddingModel`] and [`LanguageModel`], the two black-box services the pipeline needs.
//! - `rag` (default): ingestion, the persisted vector index, MMR retrieval, grounded prompts.
//! - `ort`: local ONNX embeddings (`all-MiniLM-L6-v2` by default).
//! - `gemini`: Gemini generation and embeddings.
//! - `pdf`: a `lopdf` page loader.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use docqa::gemini::GeminiBackend;
//! use docqa::ort::OrtEmbedding;
//! use docqa::rag::{QaPipeline, RagConfig};
//!
//! async fn demo() -> anyhow::Result<()> {
//!     let config = RagConfig::builder()
//!         .document_path("annual_report.txt")
//!         .build()?;
//!     let embedder = OrtEmbedding::builder()
//!         .model_id(&config.embedding_model)
//!         .directory("./models/all-MiniLM-L6-v2")?
//!         .build()?;
//!     let generator = GeminiBackend::from_env()?;
//!
//!     let pipeline = QaPipeline::new(Arc::new(embedder), Arc::new(generator), config)?;
//!     pipeline.ingest().await?;
//!
//!     let answer = pipeline.answer_question("What were total B2C orders?").await?;
//!     println!("{}", answer.answer);
//!     for (page, excerpt) in answer.citations() {
//!         println!("  Page {page}: {excerpt}");
//!     }
//!     Ok(())
//! }
//! ```

pub use docqa_core::*;

/// Ingestion, retrieval and grounded answering.
#[cfg(feature = "rag")]
pub use docqa_rag as rag;

/// Local ONNX Runtime embeddings.
#[cfg(feature = "ort")]
pub use docqa_ort as ort;

/// Google Gemini adapters.
#[cfg(feature = "gemini")]
pub use docqa_gemini as gemini;

/// PDF page loading.
#[cfg(feature = "pdf")]
pub use docqa_pdf as pdf;
