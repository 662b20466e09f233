//! Grounded question answering over a single document.
//!
//! This crate turns one document into a searchable index and answers questions from it:
//!
//! - [`chunking`] splits pages into overlapping fixed-size passages, keeping the page each
//!   passage came from.
//! - [`Ingestor`] embeds the passages in batches and persists a [`FlatIndex`] as an rkyv
//!   bundle. A failed batch leaves nothing on disk.
//! - [`Retriever`] fetches the nearest passages and re-ranks them with Maximal Marginal
//!   Relevance.
//! - [`PromptAssembler`] wraps the passages in grounding rules with a fixed refusal sentence.
//! - [`QaPipeline`] ties it together and returns the answer with its sources.
//!
//! Embedding and generation are black boxes supplied through
//! [`EmbeddingModel`](docqa_core::EmbeddingModel) and
//! [`LanguageModel`](docqa_core::LanguageModel).
//!
//! # Example
//!
//! ```rust,ignore
//! use std::path::Path;
//! use std::sync::Arc;
//! use docqa_rag::{Ingestor, QaPipeline, RagConfig};
//!
//! let config = RagConfig::builder().document_name("the Annual Report").build()?;
//! let embedder = Arc::new(embedder);
//!
//! Ingestor::new(Arc::clone(&embedder), config.clone())?
//!     .ingest(Path::new("report.txt"), &config.index_path)
//!     .await?;
//!
//! let pipeline = QaPipeline::new(embedder, Arc::new(generator), config)?;
//! pipeline.load_index()?;
//! let package = pipeline.ask("What were total B2C orders?").await?;
//! for (page, excerpt) in package.citations() {
//!     println!("Page {page}: {excerpt}");
//! }
//! ```

pub mod chunking;
pub mod config;
pub mod error;
pub mod hash;
pub mod index;
pub mod ingest;
pub mod loader;
pub mod persistence;
pub mod pipeline;
pub mod progress;
pub mod prompt;
pub mod retrieval;
mod timeout;
pub mod types;

pub use chunking::{Chunker, FixedSizeChunker, StreamMode};
pub use config::{RagConfig, RagConfigBuilder};
pub use error::{RagError, Result, Stage};
pub use index::{FlatIndex, VectorIndex};
pub use ingest::{IngestReport, Ingestor};
pub use loader::{DocumentLoader, TextLoader};
pub use persistence::{BundlePersistence, IndexManifest, Persistence};
pub use pipeline::QaPipeline;
pub use progress::{IngestProgress, IngestStage};
pub use prompt::{GroundingPolicy, PromptAssembler};
pub use retrieval::{RetrievalParams, Retriever};
pub use types::{AnswerPackage, Chunk, Document, IndexEntry, Page, RetrievedChunk};
