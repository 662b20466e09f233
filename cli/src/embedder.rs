//! Embedding backend selection for the CLI.

use std::path::Path;

use anyhow::{Context, Result};
use docqa_core::EmbeddingModel;
use docqa_gemini::GeminiBackend;
use docqa_ort::OrtEmbedding;

/// Embedding backends selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum EmbedderKind {
    /// Local ONNX model (sentence-transformers MiniLM by default).
    #[default]
    Ort,
    /// Gemini `embedContent` API.
    Gemini,
}

impl std::fmt::Display for EmbedderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ort => write!(f, "ort"),
            Self::Gemini => write!(f, "gemini"),
        }
    }
}

/// Any of the supported embedding backends.
#[derive(Debug)]
pub enum Embedder {
    /// Local ONNX Runtime model.
    Ort(OrtEmbedding),
    /// Gemini embeddings.
    Gemini(GeminiBackend),
}

impl Embedder {
    /// Loads the local model from `model_dir`, identified as `model_id` in index manifests.
    ///
    /// # Errors
    /// Returns an error if the directory has no ONNX model or tokenizer.
    pub fn ort(model_dir: &Path, model_id: &str) -> Result<Self> {
        let model = OrtEmbedding::builder()
            .model_id(model_id)
            .directory(model_dir)
            .and_then(docqa_ort::OrtEmbeddingBuilder::build)
            .with_context(|| format!("failed to load ONNX model from {}", model_dir.display()))?;
        Ok(Self::Ort(model))
    }

    /// Uses the Gemini embedding endpoint of `backend`.
    #[must_use]
    pub const fn gemini(backend: GeminiBackend) -> Self {
        Self::Gemini(backend)
    }
}

impl EmbeddingModel for Embedder {
    fn dim(&self) -> usize {
        match self {
            Self::Ort(model) => model.dim(),
            Self::Gemini(model) => EmbeddingModel::dim(model),
        }
    }

    fn model_id(&self) -> &str {
        match self {
            Self::Ort(model) => EmbeddingModel::model_id(model),
            Self::Gemini(model) => EmbeddingModel::model_id(model),
        }
    }

    async fn embed(&self, text: &str) -> docqa_core::Result<Vec<f32>> {
        match self {
            Self::Ort(model) => model.embed(text).await,
            Self::Gemini(model) => model.embed(text).await,
        }
    }

    async fn embed_batch(&self, texts: &[String]) -> docqa_core::Result<Vec<Vec<f32>>> {
        match self {
            Self::Ort(model) => model.embed_batch(texts).await,
            Self::Gemini(model) => model.embed_batch(texts).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gemini_embedder_reports_backend_model() {
        let backend = GeminiBackend::new("key").with_embedding_model("gemini-embedding-001", 768);
        let embedder = Embedder::gemini(backend);
        assert_eq!(embedder.dim(), 768);
        assert_eq!(embedder.model_id(), "gemini-embedding-001");
    }

    #[test]
    fn missing_model_directory_is_reported() {
        let err = Embedder::ort(Path::new("/nonexistent/minilm"), "minilm").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/minilm"));
    }
}
