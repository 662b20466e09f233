//! Question answering over a loaded index.

use std::path::Path;
use std::sync::Arc;

use docqa_core::{EmbeddingModel, LanguageModel};
use parking_lot::RwLock;

use crate::config::RagConfig;
use crate::error::{RagError, Result};
use crate::index::{FlatIndex, VectorIndex};
use crate::ingest::{IngestReport, Ingestor};
use crate::persistence::{BundlePersistence, IndexManifest, Persistence};
use crate::prompt::{GroundingPolicy, PromptAssembler};
use crate::retrieval::Retriever;
use crate::timeout;
use crate::types::AnswerPackage;

/// An index ready for queries, with the prompt rules that go with it.
#[derive(Debug)]
struct LoadedState {
    index: FlatIndex,
    assembler: PromptAssembler,
}

/// Retrieval-augmented question answering over a single document.
///
/// The pipeline embeds the question, selects context chunks with MMR, asks the generator
/// for an answer under the grounding rules and returns the answer with the exact chunks
/// it was given. Grounding is best-effort: the refusal sentence is requested, never
/// enforced.
///
/// The loaded index is immutable and shared: each query clones an [`Arc`] to it, so
/// concurrent questions never contend on anything but that clone.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use docqa_rag::{QaPipeline, RagConfig};
///
/// let pipeline = QaPipeline::new(Arc::new(embedder), Arc::new(generator), RagConfig::default())?;
/// pipeline.load_index()?;
/// let package = pipeline.ask("What were total B2C orders?").await?;
/// println!("{}", package.answer);
/// ```
pub struct QaPipeline<M, L> {
    config: RagConfig,
    embedder: Arc<M>,
    generator: Arc<L>,
    retriever: Retriever<M>,
    state: RwLock<Option<Arc<LoadedState>>>,
}

impl<M, L> std::fmt::Debug for QaPipeline<M, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QaPipeline")
            .field("config", &self.config)
            .field("loaded", &self.state.read().is_some())
            .finish_non_exhaustive()
    }
}

impl<M, L> QaPipeline<M, L>
where
    M: EmbeddingModel,
    L: LanguageModel,
{
    /// Creates a pipeline with no index loaded.
    ///
    /// # Errors
    /// Returns an error if `config` fails validation.
    pub fn new(embedder: Arc<M>, generator: Arc<L>, config: RagConfig) -> Result<Self> {
        config.validate()?;
        let retriever = Retriever::new(Arc::clone(&embedder), &config);
        Ok(Self {
            config,
            embedder,
            generator,
            retriever,
            state: RwLock::new(None),
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Whether an index is loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.state.read().is_some()
    }

    /// Number of entries in the loaded index, if any.
    #[must_use]
    pub fn index_len(&self) -> Option<usize> {
        self.state.read().as_ref().map(|state| state.index.len())
    }

    /// An ingestor sharing this pipeline's embedder and configuration.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn ingestor(&self) -> Result<Ingestor<M>> {
        Ingestor::new(Arc::clone(&self.embedder), self.config.clone())
    }

    /// Ingests the configured document into the configured index path, then loads it.
    ///
    /// # Errors
    /// Returns [`RagError::Config`] if no document path is configured, or any ingestion
    /// error.
    pub async fn ingest(&self) -> Result<IngestReport> {
        let document_path = self
            .config
            .document_path
            .as_deref()
            .ok_or_else(|| RagError::Config("no document path configured".into()))?;
        let report = self
            .ingestor()?
            .ingest(document_path, &self.config.index_path)
            .await?;
        self.load_index_from(&report.index_path)?;
        Ok(report)
    }

    /// Loads the index bundle at the configured path, replacing any loaded index.
    ///
    /// # Errors
    /// Returns [`RagError::IndexNotFound`] if nothing was ingested yet and
    /// [`RagError::ModelMismatch`] or [`RagError::DimensionMismatch`] if the bundle was
    /// embedded by a different model.
    pub fn load_index(&self) -> Result<usize> {
        self.load_index_from(&self.config.index_path)
    }

    /// Loads the index bundle at `path`, replacing any loaded index.
    ///
    /// # Errors
    /// See [`load_index`](Self::load_index).
    pub fn load_index_from(&self, path: &Path) -> Result<usize> {
        let loaded = BundlePersistence::new(path).load()?;
        self.check_model(&loaded.manifest)?;
        let title = loaded.manifest.document_title.as_deref();
        let policy = GroundingPolicy::from_config(&self.config, title);
        let count = loaded.index.len();
        self.install(loaded.index, policy);
        tracing::info!(path = %path.display(), entries = count, "Index loaded");
        Ok(count)
    }

    /// Uses an in-memory index, replacing any loaded index.
    pub fn set_index(&self, index: FlatIndex, document_title: Option<&str>) {
        let policy = GroundingPolicy::from_config(&self.config, document_title);
        self.install(index, policy);
    }

    /// The refusal sentence the generator is told to use for the loaded index.
    #[must_use]
    pub fn refusal(&self) -> String {
        self.state.read().as_ref().map_or_else(
            || GroundingPolicy::from_config(&self.config, None).refusal(),
            |state| state.assembler.policy().refusal(),
        )
    }

    /// Answers `question` from the loaded index.
    ///
    /// # Errors
    /// Returns [`RagError::EmptyQuestion`] for a blank question,
    /// [`RagError::IndexNotLoaded`] if no index is loaded, and embedding, generation or
    /// timeout errors from the services.
    pub async fn answer_question(&self, question: &str) -> Result<AnswerPackage> {
        let question = question.trim();
        if question.is_empty() {
            return Err(RagError::EmptyQuestion);
        }
        let state = self.state.read().clone().ok_or(RagError::IndexNotLoaded)?;

        let retrieved = self.retriever.retrieve(&state.index, question).await?;
        for chunk in &retrieved {
            tracing::trace!(
                page = chunk.chunk.source_page,
                rank = chunk.rank,
                score = chunk.score,
                "Context chunk"
            );
        }
        let request = state.assembler.assemble(question, &retrieved);
        tracing::debug!(
            model = self.generator.model_id(),
            chunks = retrieved.len(),
            "Generating answer"
        );
        let answer = timeout::within(
            "generate",
            self.config.generate_timeout,
            self.generator.generate(request),
            RagError::Generation,
        )
        .await?;

        Ok(AnswerPackage {
            answer: answer.trim().to_string(),
            source_chunks: retrieved.into_iter().map(|r| r.chunk).collect(),
        })
    }

    /// Alias for [`answer_question`](Self::answer_question).
    ///
    /// # Errors
    /// See [`answer_question`](Self::answer_question).
    pub async fn ask(&self, question: &str) -> Result<AnswerPackage> {
        self.answer_question(question).await
    }

    fn check_model(&self, manifest: &IndexManifest) -> Result<()> {
        let configured = self.embedder.model_id();
        if manifest.embedding_model != configured {
            return Err(RagError::ModelMismatch {
                expected: manifest.embedding_model.clone(),
                actual: configured.to_string(),
            });
        }
        if manifest.dimension != self.embedder.dim() {
            return Err(RagError::DimensionMismatch {
                expected: manifest.dimension,
                actual: self.embedder.dim(),
            });
        }
        Ok(())
    }

    fn install(&self, index: FlatIndex, policy: GroundingPolicy) {
        let state = LoadedState {
            index,
            assembler: PromptAssembler::new(policy),
        };
        *self.state.write() = Some(Arc::new(state));
    }
}
