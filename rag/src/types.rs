//! Core types for the RAG crate.

use serde::{Deserialize, Serialize};

use crate::hash::content_hash;

/// Number of characters shown for each source excerpt.
pub const EXCERPT_CHARS: usize = 150;

/// One page of a loaded document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Page number as reported by the loader, quoted verbatim in citations.
    pub index: usize,
    /// Page text.
    pub text: String,
}

impl Page {
    /// Creates a page.
    #[must_use]
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }
}

/// A document: an ordered, immutable sequence of pages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Stable identifier, used as the prefix of chunk ids.
    pub id: String,
    /// Title reported by the loader, if any.
    pub title: Option<String>,
    /// Pages in reading order.
    pub pages: Vec<Page>,
}

impl Document {
    /// Creates a document without a title.
    #[must_use]
    pub fn new(id: impl Into<String>, pages: Vec<Page>) -> Self {
        Self {
            id: id.into(),
            title: None,
            pages,
        }
    }

    /// Sets the document title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// A bounded passage of document text with page provenance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique identifier for this chunk (format: `{doc_id}#chunk_{n}`).
    pub id: String,
    /// Text content of the chunk.
    pub text: String,
    /// Page the chunk is attributed to.
    pub source_page: usize,
    /// Position of this chunk in the document's chunk sequence.
    pub sequence_index: usize,
    /// Character offset of the first character within its stream.
    pub char_start: usize,
    /// xxh3 hash of `text`.
    pub content_hash: u64,
}

impl Chunk {
    /// Creates a chunk starting at the beginning of its stream.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        source_page: usize,
        sequence_index: usize,
    ) -> Self {
        let text = text.into();
        Self {
            id: id.into(),
            content_hash: content_hash(&text),
            text,
            source_page,
            sequence_index,
            char_start: 0,
        }
    }

    /// Returns the first [`EXCERPT_CHARS`] characters, with `...` appended when cut.
    #[must_use]
    pub fn excerpt(&self) -> String {
        let mut chars = self.text.chars();
        let head: String = chars.by_ref().take(EXCERPT_CHARS).collect();
        if chars.next().is_some() {
            format!("{head}...")
        } else {
            head
        }
    }
}

/// A chunk together with its embedding, as stored in the index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// The indexed chunk.
    pub chunk: Chunk,
    /// Embedding vector.
    pub embedding: Vec<f32>,
}

impl IndexEntry {
    /// Creates a new index entry.
    #[must_use]
    pub const fn new(chunk: Chunk, embedding: Vec<f32>) -> Self {
        Self { chunk, embedding }
    }
}

/// A chunk selected by the retriever.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    /// The selected chunk.
    pub chunk: Chunk,
    /// Cosine similarity to the query.
    pub score: f32,
    /// Zero-based position in raw similarity order, before re-ranking.
    pub rank: usize,
}

/// The answer to one question together with the chunks it was generated from.
///
/// The answer is grounded by instruction only. Nothing checks that the generator
/// actually confined itself to `source_chunks`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerPackage {
    /// Trimmed generator output.
    pub answer: String,
    /// Chunks passed as context, in retrieval order.
    pub source_chunks: Vec<Chunk>,
}

impl AnswerPackage {
    /// Page number and excerpt for every source chunk, in retrieval order.
    pub fn citations(&self) -> impl Iterator<Item = (usize, String)> + '_ {
        self.source_chunks
            .iter()
            .map(|chunk| (chunk.source_page, chunk.excerpt()))
    }

    /// Whether the answer is exactly the given refusal sentence.
    #[must_use]
    pub fn is_refusal(&self, refusal: &str) -> bool {
        self.answer.trim() == refusal.trim()
    }
}
