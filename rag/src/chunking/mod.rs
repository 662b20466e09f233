//! Splitting documents into overlapping passages.
//!
//! This module provides the [`Chunker`] trait and [`FixedSizeChunker`], a sliding character
//! window with overlap. See [`StreamMode`] for how pages are fed to the window and how a
//! chunk's page is decided.

mod fixed;

pub use fixed::FixedSizeChunker;

use crate::error::Result;
use crate::types::{Chunk, Document};

/// How page text is presented to the chunk window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StreamMode {
    /// Every page is its own stream. Chunks never cross a page boundary, so a chunk's
    /// page is simply the page it came from.
    #[default]
    PerPage,
    /// Pages are joined by `separator` into one stream and chunks may straddle pages.
    ///
    /// A straddling chunk is attributed to the page that contributed the most characters
    /// to it; when two pages contribute equally the earlier page wins. The separator
    /// counts towards the page it follows.
    Continuous {
        /// Text inserted between consecutive pages.
        separator: String,
    },
}

impl StreamMode {
    /// Continuous mode with a newline between pages.
    #[must_use]
    pub fn continuous() -> Self {
        Self::Continuous {
            separator: "\n".to_string(),
        }
    }
}

/// Trait for text chunking strategies.
pub trait Chunker: Send + Sync {
    /// Splits a document into chunks.
    ///
    /// # Errors
    /// Returns [`RagError::Chunking`](crate::RagError::Chunking) if the document has no pages.
    fn chunk(&self, doc: &Document) -> Result<Vec<Chunk>>;

    /// Returns the name of this chunking strategy.
    fn name(&self) -> &'static str;
}
