//! Building and persisting an index from a source document.
//!
//! Chunks are embedded in fixed-size batches. Batch results are folded into a local
//! [`FlatIndex`] in batch order, and the index is written to disk only after every batch
//! succeeded: a failing batch aborts the run with no bundle written.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use docqa_core::EmbeddingModel;
use futures::{StreamExt, TryStreamExt, future, stream};

use crate::chunking::{Chunker, FixedSizeChunker};
use crate::config::RagConfig;
use crate::error::{RagError, Result};
use crate::index::{FlatIndex, VectorIndex};
use crate::loader::{DocumentLoader, TextLoader};
use crate::persistence::{BundlePersistence, IndexManifest, Persistence};
use crate::progress::{IngestProgress, IngestStage};
use crate::timeout;
use crate::types::{Chunk, Document, IndexEntry};

/// Summary of a successful ingestion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// Pages read from the document.
    pub pages: usize,
    /// Chunks embedded and indexed.
    pub chunks: usize,
    /// Embedding batches processed.
    pub batches: usize,
    /// Where the index bundle was written.
    pub index_path: PathBuf,
}

/// Loads, chunks, embeds and persists a single document.
pub struct Ingestor<M> {
    embedder: Arc<M>,
    loader: Arc<dyn DocumentLoader>,
    chunker: FixedSizeChunker,
    config: RagConfig,
}

impl<M> std::fmt::Debug for Ingestor<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ingestor")
            .field("chunker", &self.chunker)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<M: EmbeddingModel> Ingestor<M> {
    /// Creates an ingestor reading plain text with [`TextLoader`].
    ///
    /// # Errors
    /// Returns an error if `config` fails validation.
    pub fn new(embedder: Arc<M>, config: RagConfig) -> Result<Self> {
        config.validate()?;
        let chunker = FixedSizeChunker::from_config(&config)?;
        Ok(Self {
            embedder,
            loader: Arc::new(TextLoader),
            chunker,
            config,
        })
    }

    /// Replaces the document loader.
    #[must_use]
    pub fn with_loader(mut self, loader: impl DocumentLoader + 'static) -> Self {
        self.loader = Arc::new(loader);
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Ingests `document_path` and writes the index bundle to `index_path`.
    ///
    /// Any existing bundle at `index_path` is replaced wholesale.
    ///
    /// # Errors
    /// Returns [`RagError::MissingDocument`] if the source is absent,
    /// [`RagError::IngestBatch`] if a batch fails to embed, and persistence errors
    /// if the bundle cannot be written.
    pub async fn ingest(&self, document_path: &Path, index_path: &Path) -> Result<IngestReport> {
        self.ingest_with_progress(document_path, index_path, |_| {})
            .await
    }

    /// Same as [`ingest`](Self::ingest), reporting progress through `on_progress`.
    ///
    /// # Errors
    /// See [`ingest`](Self::ingest).
    pub async fn ingest_with_progress<F>(
        &self,
        document_path: &Path,
        index_path: &Path,
        mut on_progress: F,
    ) -> Result<IngestReport>
    where
        F: FnMut(IngestProgress) + Send,
    {
        on_progress(IngestProgress::new(IngestStage::Loading, 0, 1));
        tracing::info!(path = %document_path.display(), "Loading document");
        let document = self.loader.load(document_path)?;
        tracing::info!(pages = document.pages.len(), "Loaded document");
        on_progress(IngestProgress::new(IngestStage::Loading, 1, 1));

        self.ingest_document(&document, index_path, on_progress)
            .await
    }

    /// Ingests an already loaded document.
    ///
    /// # Errors
    /// See [`ingest`](Self::ingest); additionally [`RagError::EmptyDocument`] if the
    /// document yields no chunks.
    pub async fn ingest_document<F>(
        &self,
        document: &Document,
        index_path: &Path,
        mut on_progress: F,
    ) -> Result<IngestReport>
    where
        F: FnMut(IngestProgress) + Send,
    {
        on_progress(IngestProgress::new(IngestStage::Chunking, 0, document.pages.len()));
        let chunks = self.chunker.chunk(document)?;
        if chunks.is_empty() {
            return Err(RagError::EmptyDocument(document.id.clone()));
        }
        tracing::info!(chunks = chunks.len(), chunker = self.chunker.name(), "Split document");
        on_progress(IngestProgress::new(
            IngestStage::Chunking,
            document.pages.len(),
            document.pages.len(),
        ));

        let batches = chunks.len().div_ceil(self.config.batch_size);
        let index = self.build_index(&chunks, &mut on_progress).await?;

        on_progress(IngestProgress::new(IngestStage::Saving, 0, 1));
        let manifest = IndexManifest::new(self.embedder.model_id(), document.id.clone())
            .with_chunking(self.chunker.chunk_size(), self.chunker.overlap())
            .with_document_title(document.title.clone());
        BundlePersistence::new(index_path).save(&index, manifest)?;
        on_progress(IngestProgress::new(IngestStage::Saving, 1, 1));

        let report = IngestReport {
            pages: document.pages.len(),
            chunks: chunks.len(),
            batches,
            index_path: index_path.to_path_buf(),
        };
        tracing::info!(
            pages = report.pages,
            chunks = report.chunks,
            batches = report.batches,
            "Ingestion complete"
        );
        on_progress(IngestProgress::new(IngestStage::Done, batches, batches));
        Ok(report)
    }

    /// Embeds `chunks` in batches and folds them into a new index.
    ///
    /// Up to `embed_concurrency` batches are in flight at once; results are still applied
    /// in batch order.
    ///
    /// # Errors
    /// Returns [`RagError::IngestBatch`] naming the first batch that failed.
    pub async fn build_index<F>(&self, chunks: &[Chunk], on_progress: &mut F) -> Result<FlatIndex>
    where
        F: FnMut(IngestProgress) + Send,
    {
        let batch_size = self.config.batch_size;
        let total = chunks.len().div_ceil(batch_size);
        on_progress(IngestProgress::new(IngestStage::Embedding, 0, total));

        let embedded = stream::iter(chunks.chunks(batch_size).enumerate())
            .map(|(i, batch)| async move {
                let number = i + 1;
                let offset = i * batch_size;
                tracing::info!(batch = number, batches = total, "Processing batch {number}/{total}");
                self.embed_batch(batch)
                    .await
                    .map(|entries| (number, offset, entries))
                    .map_err(|source| batch_error(number, offset, source))
            })
            .buffered(self.config.embed_concurrency);

        let index = embedded
            .try_fold(None::<FlatIndex>, |index, (number, offset, entries)| {
                let folded = match index {
                    None => FlatIndex::build(entries),
                    Some(mut index) => index.add(entries).map(|()| index),
                };
                on_progress(IngestProgress::new(IngestStage::Embedding, number, total));
                future::ready(
                    folded
                        .map(Some)
                        .map_err(|source| batch_error(number, offset, source)),
                )
            })
            .await?;

        index.ok_or_else(|| RagError::Index("no chunks to index".into()))
    }

    async fn embed_batch(&self, batch: &[Chunk]) -> Result<Vec<IndexEntry>> {
        let texts: Vec<String> = batch.iter().map(|chunk| chunk.text.clone()).collect();
        let vectors = timeout::within(
            "embed",
            self.config.embed_timeout,
            self.embedder.embed_batch(&texts),
            RagError::Embedding,
        )
        .await?;
        if vectors.len() != batch.len() {
            return Err(RagError::Embedding(anyhow::anyhow!(
                "expected {} embeddings, got {}",
                batch.len(),
                vectors.len()
            )));
        }
        Ok(batch
            .iter()
            .cloned()
            .zip(vectors)
            .map(|(chunk, embedding)| IndexEntry::new(chunk, embedding))
            .collect())
    }
}

fn batch_error(batch: usize, offset: usize, source: RagError) -> RagError {
    tracing::error!(batch, offset, error = %source, "Error on batch {batch}");
    RagError::IngestBatch {
        batch,
        offset,
        source: Box::new(source),
    }
}
