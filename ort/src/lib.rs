//! Local ONNX Runtime embedding models for docqa.
//!
//! This crate provides [`OrtEmbedding`], an implementation of [`docqa_core::EmbeddingModel`]
//! that runs sentence-transformer style ONNX exports locally.
//!
//! - **No auto-download**: you provide the model directory (`model.onnx` + `tokenizer.json`)
//! - **Auto-detect dimension** from the model's output metadata
//! - **Mean pooling with L2 normalisation** by default, matching `all-MiniLM-L6-v2`
//! - **Batched inference**: [`embed_batch`](docqa_core::EmbeddingModel::embed_batch) pads
//!   the batch once and runs a single session call
//!
//! # Example
//!
//! ```rust,no_run
//! use docqa_core::EmbeddingModel;
//! use docqa_ort::OrtEmbedding;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let embedder = OrtEmbedding::from_directory("./models/all-MiniLM-L6-v2")?;
//! assert_eq!(embedder.dim(), 384);
//! let embedding = embedder.embed("Total B2C orders").await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod pooling;

pub use error::OrtError;
pub use pooling::PoolingStrategy;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use docqa_core::EmbeddingModel;
use ndarray::{Axis, Ix3};
use ort::session::{Session, SessionInputValue, builder::GraphOptimizationLevel};
use tokenizers::{Encoding, Tokenizer, TruncationParams};

use crate::pooling::l2_normalize;

/// Token limit of BERT-family encoders.
const DEFAULT_MAX_LENGTH: usize = 512;

/// An embedding model backed by ONNX Runtime.
///
/// ```rust,no_run
/// use docqa_ort::{OrtEmbedding, PoolingStrategy};
///
/// let embedder = OrtEmbedding::builder()
///     .model_path("./model/model.onnx")
///     .tokenizer_path("./model/tokenizer.json")
///     .model_id("sentence-transformers/all-MiniLM-L6-v2")
///     .pooling(PoolingStrategy::Mean)
///     .build()?;
/// # Ok::<(), docqa_ort::OrtError>(())
/// ```
pub struct OrtEmbedding {
    engine: Arc<Engine>,
    model_id: String,
    dimension: usize,
}

impl std::fmt::Debug for OrtEmbedding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrtEmbedding")
            .field("model_id", &self.model_id)
            .field("dimension", &self.dimension)
            .field("pooling", &self.engine.pooling)
            .field("normalize", &self.engine.normalize)
            .finish_non_exhaustive()
    }
}

impl OrtEmbedding {
    /// Load an embedding model from a directory.
    ///
    /// Locates `model.onnx` (or a file under `onnx/`) and `tokenizer.json`. The directory
    /// name becomes the model identifier; use [`builder`](Self::builder) to override it.
    ///
    /// # Errors
    /// Returns an error if the model or tokenizer cannot be found or loaded.
    pub fn from_directory(path: impl AsRef<Path>) -> Result<Self, OrtError> {
        Self::builder().directory(path)?.build()
    }

    /// Create a builder for custom configuration.
    #[must_use]
    pub fn builder() -> OrtEmbeddingBuilder {
        OrtEmbeddingBuilder::default()
    }

    /// Returns the pooling strategy.
    #[must_use]
    pub fn pooling(&self) -> PoolingStrategy {
        self.engine.pooling
    }

    /// Returns whether L2 normalization is enabled.
    #[must_use]
    pub fn normalize(&self) -> bool {
        self.engine.normalize
    }

    /// Tokenizes and runs `texts` on the blocking thread pool, off the async executor.
    async fn run(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, OrtError> {
        let engine = Arc::clone(&self.engine);
        blocking::unblock(move || {
            let encodings = engine.encode(texts)?;
            engine.infer(&encodings)
        })
        .await
    }
}

/// Session and tokenizer shared with the blocking pool.
struct Engine {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    pooling: PoolingStrategy,
    normalize: bool,
    token_type_ids: bool,
}

impl Engine {
    fn encode(&self, texts: Vec<String>) -> Result<Vec<Encoding>, OrtError> {
        self.tokenizer
            .encode_batch(texts, true)
            .map_err(|e| OrtError::Tokenization(e.to_string()))
    }

    /// Pads the encodings into one `[batch, seq_len]` tensor set and runs the session once.
    fn infer(&self, encodings: &[Encoding]) -> Result<Vec<Vec<f32>>, OrtError> {
        let batch = encodings.len();
        if batch == 0 {
            return Ok(Vec::new());
        }
        let seq_len = encodings.iter().map(Encoding::len).max().unwrap_or(0).max(1);

        let mut input_ids = vec![0_i64; batch * seq_len];
        let mut attention_mask = vec![0_i64; batch * seq_len];
        let mut type_ids = vec![0_i64; batch * seq_len];
        for (row, encoding) in encodings.iter().enumerate() {
            let offset = row * seq_len;
            for (i, ((&id, &mask), &kind)) in encoding
                .get_ids()
                .iter()
                .zip(encoding.get_attention_mask())
                .zip(encoding.get_type_ids())
                .enumerate()
            {
                input_ids[offset + i] = i64::from(id);
                attention_mask[offset + i] = i64::from(mask);
                type_ids[offset + i] = i64::from(kind);
            }
        }

        let mut inputs: Vec<(std::borrow::Cow<'_, str>, SessionInputValue<'_>)> = vec![
            (
                "input_ids".into(),
                ort::value::Tensor::from_array(([batch, seq_len], input_ids.into_boxed_slice()))?
                    .into(),
            ),
            (
                "attention_mask".into(),
                ort::value::Tensor::from_array((
                    [batch, seq_len],
                    attention_mask.clone().into_boxed_slice(),
                ))?
                .into(),
            ),
        ];
        if self.token_type_ids {
            inputs.push((
                "token_type_ids".into(),
                ort::value::Tensor::from_array(([batch, seq_len], type_ids.into_boxed_slice()))?
                    .into(),
            ));
        }

        let hidden_states = {
            let mut session = self
                .session
                .lock()
                .map_err(|_| OrtError::SessionPoisoned)?;
            let outputs = session.run(inputs)?;
            let hidden_states = outputs
                .get("last_hidden_state")
                .or_else(|| outputs.get("token_embeddings"))
                .or_else(|| outputs.get("hidden_states"))
                .or_else(|| outputs.get("output"))
                .ok_or(OrtError::InvalidOutputShape(0))?;
            hidden_states.try_extract_array::<f32>()?.to_owned()
        };

        let rank = hidden_states.ndim();
        let hidden_states = hidden_states
            .into_dimensionality::<Ix3>()
            .map_err(|e| match rank {
                3 => OrtError::Shape(e.to_string()),
                other => OrtError::InvalidOutputShape(other),
            })?;

        Ok(hidden_states
            .axis_iter(Axis(0))
            .zip(attention_mask.chunks(seq_len))
            .map(|(sequence, mask)| {
                let mut embedding = self.pooling.apply(sequence, mask);
                if self.normalize {
                    l2_normalize(&mut embedding);
                }
                embedding
            })
            .collect())
    }
}

impl EmbeddingModel for OrtEmbedding {
    fn dim(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn embed(&self, text: &str) -> docqa_core::Result<Vec<f32>> {
        let mut vectors = self.run(vec![text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| OrtError::InvalidOutputShape(0).into())
    }

    async fn embed_batch(&self, texts: &[String]) -> docqa_core::Result<Vec<Vec<f32>>> {
        Ok(self.run(texts.to_vec()).await?)
    }
}

/// Builder for [`OrtEmbedding`].
#[derive(Debug)]
pub struct OrtEmbeddingBuilder {
    model_path: Option<PathBuf>,
    tokenizer_path: Option<PathBuf>,
    model_id: Option<String>,
    pooling: PoolingStrategy,
    normalize: bool,
    max_length: usize,
}

impl Default for OrtEmbeddingBuilder {
    fn default() -> Self {
        Self {
            model_path: None,
            tokenizer_path: None,
            model_id: None,
            pooling: PoolingStrategy::Mean,
            normalize: true,
            max_length: DEFAULT_MAX_LENGTH,
        }
    }
}

impl OrtEmbeddingBuilder {
    /// Set the path to the ONNX model file.
    #[must_use]
    pub fn model_path(mut self, path: impl AsRef<Path>) -> Self {
        self.model_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the path to the tokenizer.json file.
    #[must_use]
    pub fn tokenizer_path(mut self, path: impl AsRef<Path>) -> Self {
        self.tokenizer_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Locate `model.onnx` and `tokenizer.json` inside `dir`.
    ///
    /// Unless a [`model_id`](Self::model_id) was set already, the directory name becomes
    /// the model identifier.
    ///
    /// # Errors
    /// Returns [`OrtError::ModelNotFound`] or [`OrtError::TokenizerNotFound`].
    pub fn directory(self, dir: impl AsRef<Path>) -> Result<Self, OrtError> {
        let dir = dir.as_ref();
        let mut builder = self
            .model_path(find_model_file(dir)?)
            .tokenizer_path(find_tokenizer_file(dir)?);
        if builder.model_id.is_none() {
            builder.model_id = dir
                .file_name()
                .map(|name| name.to_string_lossy().into_owned());
        }
        Ok(builder)
    }

    /// Identifier recorded in index manifests. Defaults to the model file stem.
    #[must_use]
    pub fn model_id(mut self, id: impl Into<String>) -> Self {
        self.model_id = Some(id.into());
        self
    }

    /// Set the pooling strategy. Default: [`PoolingStrategy::Mean`].
    #[must_use]
    pub const fn pooling(mut self, strategy: PoolingStrategy) -> Self {
        self.pooling = strategy;
        self
    }

    /// Enable or disable L2 normalization. Default: `true`.
    #[must_use]
    pub const fn normalize(mut self, enabled: bool) -> Self {
        self.normalize = enabled;
        self
    }

    /// Truncate inputs to this many tokens. Default: 512.
    #[must_use]
    pub const fn max_length(mut self, tokens: usize) -> Self {
        self.max_length = tokens;
        self
    }

    /// Build the [`OrtEmbedding`] instance.
    ///
    /// # Errors
    /// Returns an error if the model path is missing, the model or tokenizer cannot be
    /// loaded, or the output dimension cannot be determined.
    pub fn build(self) -> Result<OrtEmbedding, OrtError> {
        let model_path = self.model_path.ok_or(OrtError::MissingModelPath)?;
        if !model_path.exists() {
            return Err(OrtError::ModelNotFound(model_path));
        }

        let tokenizer_path = self.tokenizer_path.ok_or_else(|| {
            OrtError::TokenizerNotFound(model_path.parent().unwrap_or(&model_path).to_path_buf())
        })?;
        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| OrtError::tokenizer(&tokenizer_path, e))?;
        tokenizer.with_padding(None);
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: self.max_length,
                ..TruncationParams::default()
            }))
            .map_err(|e| OrtError::tokenizer(&tokenizer_path, e))?;

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(num_cpus())?
            .commit_from_file(&model_path)?;

        let dimension = detect_embedding_dimension(&session)?;
        let token_type_ids = session
            .inputs()
            .iter()
            .any(|input| input.name() == "token_type_ids");
        let model_id = self.model_id.unwrap_or_else(|| {
            model_path
                .file_stem()
                .map_or_else(|| "onnx".to_string(), |s| s.to_string_lossy().into_owned())
        });

        Ok(OrtEmbedding {
            engine: Arc::new(Engine {
                session: Mutex::new(session),
                tokenizer,
                pooling: self.pooling,
                normalize: self.normalize,
                token_type_ids,
            }),
            model_id,
            dimension,
        })
    }
}

/// Find the ONNX model file in a directory.
fn find_model_file(dir: &Path) -> Result<PathBuf, OrtError> {
    let candidates = [
        dir.join("model.onnx"),
        dir.join("onnx/model.onnx"),
        dir.join("onnx/model_fp32.onnx"),
        dir.join("onnx/model_quantized.onnx"),
    ];
    if let Some(found) = candidates.into_iter().find(|c| c.exists()) {
        return Ok(found);
    }

    [dir.to_path_buf(), dir.join("onnx")]
        .iter()
        .filter_map(|d| std::fs::read_dir(d).ok())
        .flat_map(|entries| entries.flatten().map(|e| e.path()))
        .find(|path| path.extension().is_some_and(|ext| ext == "onnx"))
        .ok_or_else(|| OrtError::ModelNotFound(dir.to_path_buf()))
}

/// Find the tokenizer.json file in a directory.
fn find_tokenizer_file(dir: &Path) -> Result<PathBuf, OrtError> {
    [dir.join("tokenizer.json"), dir.join("onnx/tokenizer.json")]
        .into_iter()
        .find(|c| c.exists())
        .ok_or_else(|| OrtError::TokenizerNotFound(dir.to_path_buf()))
}

/// Detect the embedding dimension from model output metadata.
fn detect_embedding_dimension(session: &Session) -> Result<usize, OrtError> {
    session
        .outputs()
        .iter()
        .find_map(|output| match output.dtype() {
            ort::value::ValueType::Tensor { shape, .. } if shape.len() >= 2 => shape
                .last()
                .copied()
                .filter(|&dim| dim > 0)
                .and_then(|dim| usize::try_from(dim).ok()),
            _ => None,
        })
        .ok_or(OrtError::InvalidOutputShape(0))
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZero::get)
        .unwrap_or(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_requires_model_path() {
        let result = OrtEmbeddingBuilder::default().build();
        assert!(matches!(result, Err(OrtError::MissingModelPath)));
    }

    #[test]
    fn builder_validates_model_exists() {
        let result = OrtEmbedding::builder()
            .model_path("/nonexistent/model.onnx")
            .tokenizer_path("/nonexistent/tokenizer.json")
            .build();
        assert!(matches!(result, Err(OrtError::ModelNotFound(_))));
    }

    #[test]
    fn builder_defaults_to_normalized_mean_pooling() {
        let builder = OrtEmbeddingBuilder::default();
        assert_eq!(builder.pooling, PoolingStrategy::Mean);
        assert!(builder.normalize);
        assert_eq!(builder.max_length, DEFAULT_MAX_LENGTH);
    }

    #[test]
    fn missing_directory_reports_model_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = OrtEmbedding::from_directory(dir.path()).unwrap_err();
        assert!(matches!(err, OrtError::ModelNotFound(_)));
    }

    #[test]
    fn directory_keeps_explicit_model_id() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("model.onnx"), b"").unwrap();
        std::fs::write(dir.path().join("tokenizer.json"), b"{}").unwrap();

        let named = OrtEmbedding::builder()
            .model_id("sentence-transformers/all-MiniLM-L6-v2")
            .directory(dir.path())
            .unwrap();
        assert_eq!(
            named.model_id.as_deref(),
            Some("sentence-transformers/all-MiniLM-L6-v2")
        );

        let derived = OrtEmbedding::builder().directory(dir.path()).unwrap();
        assert_eq!(
            derived.model_id,
            dir.path().file_name().map(|n| n.to_string_lossy().into_owned())
        );
    }

    #[test]
    fn tokenizer_is_required_next_to_model() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("model.onnx"), b"").unwrap();
        let err = OrtEmbedding::from_directory(dir.path()).unwrap_err();
        assert!(matches!(err, OrtError::TokenizerNotFound(_)));
    }
}
