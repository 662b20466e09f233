//! Configuration for the question answering pipeline.
//!
//! A [`RagConfig`] is an immutable value handed to every component constructor. Build one
//! with [`RagConfig::builder`]; [`RagConfigBuilder::build`] validates the combination of
//! values so that invalid parameters fail at startup rather than mid-ingestion.

use std::path::PathBuf;
use std::time::Duration;

use crate::chunking::StreamMode;
use crate::error::{RagError, Result};

/// Default number of characters per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
/// Default number of characters shared by adjacent chunks.
pub const DEFAULT_CHUNK_OVERLAP: usize = 150;
/// Default number of chunks embedded per ingestion batch.
pub const DEFAULT_BATCH_SIZE: usize = 10;
/// Default number of chunks handed to the generator.
pub const DEFAULT_TOP_K: usize = 8;
/// Default number of nearest neighbours considered by MMR.
pub const DEFAULT_FETCH_N: usize = 20;
/// Default relevance/diversity trade-off.
pub const DEFAULT_DIVERSITY_LAMBDA: f32 = 0.5;
/// Default embedding model identifier.
pub const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";
/// Default generation model identifier.
pub const DEFAULT_GENERATION_MODEL: &str = "gemini-2.5-flash";

/// Configuration for a question answering pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct RagConfig {
    /// Characters per chunk.
    pub chunk_size: usize,
    /// Characters shared by consecutive chunks.
    pub chunk_overlap: usize,
    /// Whether pages are chunked independently or as one stream.
    pub stream_mode: StreamMode,
    /// Embedding model identifier, recorded in the index manifest.
    pub embedding_model: String,
    /// Generation model identifier.
    pub generation_model: String,
    /// Number of chunks returned by retrieval.
    pub top_k: usize,
    /// Number of nearest neighbours fetched before MMR re-ranking.
    pub fetch_n: usize,
    /// MMR trade-off: 1.0 is pure relevance, 0.0 pure diversity.
    pub diversity_lambda: f32,
    /// Chunks per ingestion batch.
    pub batch_size: usize,
    /// Ingestion batches embedded concurrently.
    pub embed_concurrency: usize,
    /// Directory holding the persisted index.
    pub index_path: PathBuf,
    /// Source document to ingest.
    pub document_path: Option<PathBuf>,
    /// Human readable document name used in the refusal sentence.
    pub document_name: Option<String>,
    /// Time budget for a single embedding call.
    pub embed_timeout: Duration,
    /// Time budget for a single generation call.
    pub generate_timeout: Duration,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            stream_mode: StreamMode::PerPage,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            generation_model: DEFAULT_GENERATION_MODEL.to_string(),
            top_k: DEFAULT_TOP_K,
            fetch_n: DEFAULT_FETCH_N,
            diversity_lambda: DEFAULT_DIVERSITY_LAMBDA,
            batch_size: DEFAULT_BATCH_SIZE,
            embed_concurrency: 1,
            index_path: PathBuf::from("./docqa_index"),
            document_path: None,
            document_name: None,
            embed_timeout: Duration::from_secs(30),
            generate_timeout: Duration::from_secs(120),
        }
    }
}

impl RagConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder for custom configuration.
    #[must_use]
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::new()
    }

    /// Checks that the values can work together.
    ///
    /// # Errors
    /// Returns [`RagError::Config`] or [`RagError::Chunking`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::Chunking("chunk_size must be positive".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::Chunking(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(RagError::Config("top_k must be positive".into()));
        }
        if self.fetch_n == 0 {
            return Err(RagError::Config("fetch_n must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.diversity_lambda) {
            return Err(RagError::Config(format!(
                "diversity_lambda ({}) must be within [0, 1]",
                self.diversity_lambda
            )));
        }
        if self.batch_size == 0 {
            return Err(RagError::Config("batch_size must be positive".into()));
        }
        if self.embed_concurrency == 0 {
            return Err(RagError::Config("embed_concurrency must be positive".into()));
        }
        if self.embedding_model.trim().is_empty() {
            return Err(RagError::Config("embedding_model must not be empty".into()));
        }
        if self.embed_timeout.is_zero() || self.generate_timeout.is_zero() {
            return Err(RagError::Config("timeouts must be non-zero".into()));
        }
        Ok(())
    }
}

/// Builder for [`RagConfig`].
#[derive(Debug, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Creates a new configuration builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: RagConfig::default(),
        }
    }

    /// Sets the chunk size in characters.
    #[must_use]
    pub const fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Sets the overlap between consecutive chunks.
    #[must_use]
    pub const fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Sets how pages are streamed into the chunker.
    #[must_use]
    pub fn stream_mode(mut self, mode: StreamMode) -> Self {
        self.config.stream_mode = mode;
        self
    }

    /// Sets the embedding model identifier.
    #[must_use]
    pub fn embedding_model(mut self, model: impl Into<String>) -> Self {
        self.config.embedding_model = model.into();
        self
    }

    /// Sets the generation model identifier.
    #[must_use]
    pub fn generation_model(mut self, model: impl Into<String>) -> Self {
        self.config.generation_model = model.into();
        self
    }

    /// Sets the number of chunks returned by retrieval.
    #[must_use]
    pub const fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Sets the number of candidates fetched before MMR.
    #[must_use]
    pub const fn fetch_n(mut self, n: usize) -> Self {
        self.config.fetch_n = n;
        self
    }

    /// Sets the MMR relevance/diversity trade-off.
    #[must_use]
    pub const fn diversity_lambda(mut self, lambda: f32) -> Self {
        self.config.diversity_lambda = lambda;
        self
    }

    /// Sets the ingestion batch size.
    #[must_use]
    pub const fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    /// Sets how many ingestion batches are embedded concurrently.
    #[must_use]
    pub const fn embed_concurrency(mut self, workers: usize) -> Self {
        self.config.embed_concurrency = workers;
        self
    }

    /// Sets the index directory.
    #[must_use]
    pub fn index_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.index_path = path.into();
        self
    }

    /// Sets the source document path.
    #[must_use]
    pub fn document_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.document_path = Some(path.into());
        self
    }

    /// Sets the document name quoted in the refusal sentence.
    #[must_use]
    pub fn document_name(mut self, name: impl Into<String>) -> Self {
        self.config.document_name = Some(name.into());
        self
    }

    /// Sets the per-call embedding timeout.
    #[must_use]
    pub const fn embed_timeout(mut self, timeout: Duration) -> Self {
        self.config.embed_timeout = timeout;
        self
    }

    /// Sets the per-call generation timeout.
    #[must_use]
    pub const fn generate_timeout(mut self, timeout: Duration) -> Self {
        self.config.generate_timeout = timeout;
        self
    }

    /// Validates and builds the configuration.
    ///
    /// # Errors
    /// Returns an error if [`RagConfig::validate`] rejects the values.
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
