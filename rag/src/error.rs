//! Error types for the RAG crate.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Pipeline stage an error belongs to.
///
/// Lets callers tell configuration problems apart from ingestion and query failures
/// without matching on every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Startup: parameters, credentials, source document.
    Configuration,
    /// Building and persisting the index.
    Ingestion,
    /// Answering a question against a loaded index.
    Query,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Configuration => "configuration",
            Self::Ingestion => "ingestion",
            Self::Query => "query",
        })
    }
}

/// Errors that can occur in RAG operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Chunking parameters or input are unusable.
    #[error("chunking error: {0}")]
    Chunking(String),

    /// The source document does not exist.
    #[error("source document not found at {}", .0.display())]
    MissingDocument(PathBuf),

    /// The document loader could not produce pages.
    #[error("failed to load document {}: {message}", path.display())]
    Loader {
        /// Document path.
        path: PathBuf,
        /// Loader-specific cause.
        message: String,
    },

    /// The document produced no chunks.
    #[error("document {0} contains no text to index")]
    EmptyDocument(String),

    /// Embedding call failed.
    #[error("embedding failed: {0}")]
    Embedding(#[source] anyhow::Error),

    /// Answer generation call failed.
    #[error("generation failed: {0}")]
    Generation(#[source] anyhow::Error),

    /// An external call exceeded its time budget.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// Which call timed out (`embed` or `generate`).
        operation: &'static str,
        /// The configured limit.
        after: Duration,
    },

    /// A batch failed during ingestion; nothing was persisted.
    #[error("ingestion aborted at batch {batch} (chunk offset {offset}): {source}")]
    IngestBatch {
        /// One-based batch number.
        batch: usize,
        /// Index of the first chunk in the failing batch.
        offset: usize,
        /// Underlying failure.
        #[source]
        source: Box<RagError>,
    },

    /// Vector index operation failed.
    #[error("index error: {0}")]
    Index(String),

    /// No persisted index exists at the configured path.
    #[error("no index found at {}; run ingestion first", .0.display())]
    IndexNotFound(PathBuf),

    /// A question arrived before any index was built or loaded.
    #[error("no index loaded; run ingestion and load the index before asking questions")]
    IndexNotLoaded,

    /// The question was empty.
    #[error("question is empty")]
    EmptyQuestion,

    /// Persistence operation failed.
    #[error("persistence error at {path}: {source}")]
    Persistence {
        /// Path where the error occurred.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// IO operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Dimension mismatch between embedding and index.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension provided.
        actual: usize,
    },

    /// The index was built with a different embedding model.
    #[error("index was built with embedding model `{expected}` but `{actual}` is configured")]
    ModelMismatch {
        /// Model recorded in the index manifest.
        expected: String,
        /// Model used by the current embedder.
        actual: String,
    },
}

impl RagError {
    /// Returns the pipeline stage this error belongs to.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        match self {
            Self::Config(_)
            | Self::Chunking(_)
            | Self::MissingDocument(_)
            | Self::Loader { .. }
            | Self::ModelMismatch { .. } => Stage::Configuration,
            Self::EmptyDocument(_)
            | Self::IngestBatch { .. }
            | Self::Persistence { .. }
            | Self::Serialization(_)
            | Self::Index(_)
            | Self::Io(_) => Stage::Ingestion,
            Self::Embedding(_)
            | Self::Generation(_)
            | Self::Timeout { .. }
            | Self::IndexNotFound(_)
            | Self::IndexNotLoaded
            | Self::EmptyQuestion
            | Self::DimensionMismatch { .. } => Stage::Query,
        }
    }

    /// Whether retrying the same call may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Embedding(_) | Self::Generation(_) | Self::Timeout { .. } => true,
            Self::IngestBatch { source, .. } => source.is_transient(),
            _ => false,
        }
    }
}

/// Result type alias for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_not_found_tells_user_to_ingest() {
        let err = RagError::IndexNotFound(PathBuf::from("/tmp/idx"));
        let message = err.to_string();
        assert!(message.contains("/tmp/idx"));
        assert!(message.contains("run ingestion first"));
        assert_eq!(err.stage(), Stage::Query);
    }

    #[test]
    fn batch_error_reports_batch_and_cause() {
        let err = RagError::IngestBatch {
            batch: 3,
            offset: 20,
            source: Box::new(RagError::Embedding(anyhow::anyhow!("service unavailable"))),
        };
        let message = err.to_string();
        assert!(message.contains("batch 3"));
        assert!(message.contains("offset 20"));
        assert!(message.contains("service unavailable"));
        assert_eq!(err.stage(), Stage::Ingestion);
        assert!(err.is_transient());
    }

    #[test]
    fn config_errors_are_not_transient() {
        let err = RagError::Config("k must be positive".into());
        assert_eq!(err.stage(), Stage::Configuration);
        assert!(!err.is_transient());
    }
}
