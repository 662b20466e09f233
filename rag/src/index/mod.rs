//! Vector index implementations for RAG.
//!
//! This module provides the [`VectorIndex`] trait and [`FlatIndex`], an exact
//! cosine-similarity index scored in parallel.

mod flat;

pub use flat::FlatIndex;

use crate::error::Result;
use crate::types::IndexEntry;

/// A search hit borrowed from an index.
#[derive(Debug, Clone, Copy)]
pub struct Neighbor<'a> {
    /// The matching entry.
    pub entry: &'a IndexEntry,
    /// Cosine similarity to the query (higher is more similar).
    pub score: f32,
    /// Insertion position of the entry inside the index.
    pub position: usize,
}

/// Trait for vector index implementations.
///
/// An index stores chunks with their embedding vectors and answers similarity queries.
/// Writes take `&mut self`: an index has exactly one writer while it is being built and
/// is shared read-only afterwards.
pub trait VectorIndex: Send + Sync {
    /// Appends entries.
    ///
    /// Entries are not deduplicated; inserting the same chunk twice yields two hits.
    ///
    /// # Errors
    /// Returns [`RagError::DimensionMismatch`](crate::RagError::DimensionMismatch) if any
    /// embedding has the wrong length. No entry is added in that case.
    fn add(&mut self, entries: Vec<IndexEntry>) -> Result<()>;

    /// Returns the `top_n` most similar entries, best first.
    ///
    /// # Errors
    /// Returns an error if the query dimension does not match the index.
    fn search(&self, query: &[f32], top_n: usize) -> Result<Vec<Neighbor<'_>>>;

    /// Returns the embedding dimension.
    fn dimension(&self) -> usize;

    /// Returns the number of stored entries.
    fn len(&self) -> usize;

    /// Returns `true` if the index is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns all entries in insertion order.
    fn entries(&self) -> &[IndexEntry];
}

/// Euclidean norm of a vector.
#[must_use]
pub fn norm(vector: &[f32]) -> f32 {
    vector.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Cosine similarity given precomputed norms. Zero vectors score `0.0`.
#[must_use]
pub fn cosine_with_norms(a: &[f32], a_norm: f32, b: &[f32], b_norm: f32) -> f32 {
    if a_norm <= 0.0 || b_norm <= 0.0 {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    dot / (a_norm * b_norm)
}

/// Cosine similarity between two vectors.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    cosine_with_norms(a, norm(a), b, norm(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_of_parallel_vectors_is_one() {
        let score = cosine_similarity(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]);
        assert!((score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_of_orthogonal_vectors_is_zero() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    }

    #[test]
    fn zero_vector_scores_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]).to_bits(), 0.0f32.to_bits());
    }
}
