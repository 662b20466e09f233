//! Exact flat index.

use std::cmp::Reverse;

use ordered_float::OrderedFloat;
use rayon::prelude::*;

use crate::error::{RagError, Result};
use crate::types::IndexEntry;

use super::{Neighbor, VectorIndex, cosine_with_norms, norm};

/// Exact nearest-neighbour index over cosine similarity.
///
/// Every query is scored against every entry in parallel. Results are ordered by
/// descending score, then by insertion position, so a given query always yields the same
/// ranking for the same entries. Vector norms are cached at insertion time and recomputed
/// identically on load, which keeps reloaded indexes bit-for-bit equivalent.
///
/// # Example
///
/// ```rust
/// use docqa_rag::index::{FlatIndex, VectorIndex};
/// use docqa_rag::{Chunk, IndexEntry};
///
/// let index = FlatIndex::build(vec![
///     IndexEntry::new(Chunk::new("c1", "orders", 3, 0), vec![1.0, 0.0]),
///     IndexEntry::new(Chunk::new("c2", "revenue", 4, 1), vec![0.0, 1.0]),
/// ])
/// .unwrap();
///
/// let hits = index.search(&[0.9, 0.1], 1).unwrap();
/// assert_eq!(hits[0].entry.chunk.id, "c1");
/// ```
#[derive(Clone, Default)]
pub struct FlatIndex {
    dimension: usize,
    entries: Vec<IndexEntry>,
    norms: Vec<f32>,
}

impl std::fmt::Debug for FlatIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlatIndex")
            .field("dimension", &self.dimension)
            .field("len", &self.entries.len())
            .finish()
    }
}

impl FlatIndex {
    /// Creates an empty index for vectors of `dimension` components.
    #[must_use]
    pub const fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension,
            entries: Vec::new(),
            norms: Vec::new(),
        }
    }

    /// Builds an index from an initial batch, taking the dimension from its first entry.
    ///
    /// # Errors
    /// Returns [`RagError::Index`] for an empty batch and
    /// [`RagError::DimensionMismatch`] if the entries disagree on dimension.
    pub fn build(entries: Vec<IndexEntry>) -> Result<Self> {
        let dimension = entries
            .first()
            .map(|entry| entry.embedding.len())
            .ok_or_else(|| RagError::Index("cannot build an index from an empty batch".into()))?;
        let mut index = Self::with_dimension(dimension);
        index.add(entries)?;
        Ok(index)
    }

    fn check_dimension(&self, actual: usize) -> Result<()> {
        if actual == self.dimension {
            Ok(())
        } else {
            Err(RagError::DimensionMismatch {
                expected: self.dimension,
                actual,
            })
        }
    }
}

impl VectorIndex for FlatIndex {
    fn add(&mut self, entries: Vec<IndexEntry>) -> Result<()> {
        for entry in &entries {
            self.check_dimension(entry.embedding.len())?;
        }
        self.norms
            .extend(entries.iter().map(|entry| norm(&entry.embedding)));
        self.entries.extend(entries);
        Ok(())
    }

    fn search(&self, query: &[f32], top_n: usize) -> Result<Vec<Neighbor<'_>>> {
        self.check_dimension(query.len())?;
        if top_n == 0 || self.entries.is_empty() {
            return Ok(Vec::new());
        }

        let query_norm = norm(query);
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .par_iter()
            .zip(self.norms.par_iter())
            .enumerate()
            .map(|(position, (entry, &entry_norm))| {
                let score = cosine_with_norms(query, query_norm, &entry.embedding, entry_norm);
                (position, score)
            })
            .collect();

        scored.sort_by_key(|&(position, score)| (Reverse(OrderedFloat(score)), position));
        scored.truncate(top_n);

        Ok(scored
            .into_iter()
            .map(|(position, score)| Neighbor {
                entry: &self.entries[position],
                score,
                position,
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }
}
