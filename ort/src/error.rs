//! Error types for the local embedding adapter.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when loading or running a local embedding model.
#[derive(Debug, Error)]
pub enum OrtError {
    /// ONNX Runtime failed to load or run the model.
    #[error("onnx runtime error: {0}")]
    Ort(#[from] ort::Error),

    /// Failed to load or configure the tokenizer.
    #[error("failed to load tokenizer from {path}: {message}")]
    Tokenizer {
        /// Path to the tokenizer file.
        path: PathBuf,
        /// Error message from the tokenizers crate.
        message: String,
    },

    /// Model path was not specified in the builder.
    #[error("model path not specified")]
    MissingModelPath,

    /// Tokenizer file not found next to the model.
    #[error("tokenizer.json not found in {0}")]
    TokenizerNotFound(PathBuf),

    /// Model file not found.
    #[error("model file not found: {0}")]
    ModelNotFound(PathBuf),

    /// The model exposes no usable hidden-state output.
    #[error("unexpected output shape: expected 3 dimensions, got {0}")]
    InvalidOutputShape(usize),

    /// Tokenization failed.
    #[error("tokenization failed: {0}")]
    Tokenization(String),

    /// Tensor reshaping failed.
    #[error("shape error: {0}")]
    Shape(String),

    /// A previous inference panicked while holding the session.
    #[error("inference session poisoned by an earlier panic")]
    SessionPoisoned,
}

impl OrtError {
    /// Creates a tokenizer error from a path and error message.
    pub fn tokenizer(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Tokenizer {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
