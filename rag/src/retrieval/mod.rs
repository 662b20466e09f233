//! Query-time retrieval.
//!
//! [`Retriever`] embeds a question, fetches the `fetch_n` nearest chunks and re-ranks them
//! with Maximal Marginal Relevance down to `k`, trading a little relevance for coverage of
//! distinct passages.

mod mmr;

pub use mmr::mmr_select;

use std::sync::Arc;
use std::time::Duration;

use docqa_core::EmbeddingModel;

use crate::config::RagConfig;
use crate::error::{RagError, Result};
use crate::index::VectorIndex;
use crate::timeout;
use crate::types::RetrievedChunk;

/// Retrieval parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrievalParams {
    /// Number of chunks returned.
    pub k: usize,
    /// Number of nearest neighbours considered.
    pub fetch_n: usize,
    /// Relevance/diversity trade-off in `[0, 1]`.
    pub lambda: f32,
}

impl RetrievalParams {
    /// Creates validated parameters.
    ///
    /// # Errors
    /// Returns [`RagError::Config`] if a count is zero or `lambda` is outside `[0, 1]`.
    pub fn new(k: usize, fetch_n: usize, lambda: f32) -> Result<Self> {
        if k == 0 || fetch_n == 0 {
            return Err(RagError::Config("k and fetch_n must be positive".into()));
        }
        if !(0.0..=1.0).contains(&lambda) {
            return Err(RagError::Config(format!(
                "diversity lambda ({lambda}) must be within [0, 1]"
            )));
        }
        Ok(Self { k, fetch_n, lambda })
    }

    /// Parameters from a validated configuration.
    #[must_use]
    pub const fn from_config(config: &RagConfig) -> Self {
        Self {
            k: config.top_k,
            fetch_n: config.fetch_n,
            lambda: config.diversity_lambda,
        }
    }

    /// Number of chunks a search over `index_len` entries yields.
    #[must_use]
    pub fn effective_k(&self, index_len: usize) -> usize {
        self.k.min(self.fetch_n).min(index_len)
    }
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self::from_config(&RagConfig::default())
    }
}

/// Embeds questions and selects context chunks with MMR.
pub struct Retriever<M> {
    embedder: Arc<M>,
    params: RetrievalParams,
    embed_timeout: Duration,
}

impl<M> std::fmt::Debug for Retriever<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("params", &self.params)
            .field("embed_timeout", &self.embed_timeout)
            .finish_non_exhaustive()
    }
}

impl<M: EmbeddingModel> Retriever<M> {
    /// Creates a retriever using the configuration's retrieval parameters and embed timeout.
    #[must_use]
    pub const fn new(embedder: Arc<M>, config: &RagConfig) -> Self {
        Self {
            embedder,
            params: RetrievalParams::from_config(config),
            embed_timeout: config.embed_timeout,
        }
    }

    /// Overrides the retrieval parameters.
    #[must_use]
    pub const fn with_params(mut self, params: RetrievalParams) -> Self {
        self.params = params;
        self
    }

    /// Returns the retrieval parameters.
    #[must_use]
    pub const fn params(&self) -> &RetrievalParams {
        &self.params
    }

    /// Embeds `question` and selects context chunks from `index`.
    ///
    /// # Errors
    /// Returns [`RagError::Embedding`] or [`RagError::Timeout`] if the question cannot be
    /// embedded, and [`RagError::DimensionMismatch`] if the embedder does not match the index.
    pub async fn retrieve<I: VectorIndex>(
        &self,
        index: &I,
        question: &str,
    ) -> Result<Vec<RetrievedChunk>> {
        let query = timeout::within(
            "embed",
            self.embed_timeout,
            self.embedder.embed(question),
            RagError::Embedding,
        )
        .await?;
        self.select(index, &query)
    }

    /// Selects context chunks for an already embedded query.
    ///
    /// Returns `min(k, fetch_n, index.len())` distinct chunks in MMR selection order.
    ///
    /// # Errors
    /// Returns [`RagError::DimensionMismatch`] if the query does not match the index.
    pub fn select<I: VectorIndex>(&self, index: &I, query: &[f32]) -> Result<Vec<RetrievedChunk>> {
        let candidates = index.search(query, self.params.fetch_n)?;
        let k = self.params.effective_k(index.len());
        let selected = mmr_select(&candidates, k, self.params.lambda);

        tracing::debug!(
            candidates = candidates.len(),
            selected = selected.len(),
            lambda = self.params.lambda,
            "Selected context chunks"
        );

        Ok(selected
            .into_iter()
            .map(|rank| {
                let hit = &candidates[rank];
                RetrievedChunk {
                    chunk: hit.entry.chunk.clone(),
                    score: hit.score,
                    rank,
                }
            })
            .collect())
    }
}
