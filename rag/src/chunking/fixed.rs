//! Fixed-size text chunking.

use std::ops::Range;

use crate::config::RagConfig;
use crate::error::{RagError, Result};
use crate::hash::content_hash;
use crate::types::{Chunk, Document};

use super::{Chunker, StreamMode};

/// Chunks text into fixed-size character windows with overlap.
///
/// Sizes count Unicode scalar values, not bytes. The first window of a stream starts at
/// character 0 and every following window starts `chunk_size - overlap` characters after
/// its predecessor. Windowing stops at the first window that reaches the end of the
/// stream, so the last chunk may be shorter than `chunk_size` but always extends past the
/// previous one. Dropping the first `overlap` characters of every chunk after the first
/// therefore reconstructs the stream exactly.
///
/// # Example
///
/// ```rust
/// use docqa_rag::chunking::{Chunker, FixedSizeChunker};
/// use docqa_rag::{Document, Page};
///
/// let chunker = FixedSizeChunker::new(10, 2).unwrap();
/// let doc = Document::new("report", vec![Page::new(1, "abcdefghijklmnopqrst")]);
/// let chunks = chunker.chunk(&doc).unwrap();
///
/// assert_eq!(chunks[0].text, "abcdefghij");
/// assert_eq!(chunks[1].text, "ijklmnopqr");
/// assert_eq!(chunks[2].text, "qrst");
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    /// Maximum size of each chunk in characters.
    chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    overlap: usize,
    mode: StreamMode,
}

impl FixedSizeChunker {
    /// Creates a per-page fixed-size chunker.
    ///
    /// # Errors
    /// Returns [`RagError::Chunking`] if `chunk_size` is zero or `overlap >= chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RagError::Chunking("chunk_size must be positive".into()));
        }
        if overlap >= chunk_size {
            return Err(RagError::Chunking(format!(
                "overlap ({overlap}) must be less than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
            mode: StreamMode::PerPage,
        })
    }

    /// Creates a chunker from the chunking fields of a configuration.
    ///
    /// # Errors
    /// Same as [`FixedSizeChunker::new`].
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        let chunker = Self::new(config.chunk_size, config.chunk_overlap)?;
        Ok(chunker.with_mode(config.stream_mode.clone()))
    }

    /// Sets the stream mode.
    #[must_use]
    pub fn with_mode(mut self, mode: StreamMode) -> Self {
        self.mode = mode;
        self
    }

    /// Maximum characters per chunk.
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Characters shared by consecutive chunks.
    #[must_use]
    pub const fn overlap(&self) -> usize {
        self.overlap
    }

    /// Distance in characters between consecutive chunk starts.
    #[must_use]
    pub const fn step(&self) -> usize {
        self.chunk_size - self.overlap
    }

    /// Character ranges of the windows covering a stream of `len` characters.
    fn windows(&self, len: usize) -> Vec<Range<usize>> {
        let mut windows = Vec::new();
        if len == 0 {
            return windows;
        }
        let mut start = 0;
        loop {
            let end = (start + self.chunk_size).min(len);
            windows.push(start..end);
            if end == len {
                break;
            }
            start += self.step();
        }
        windows
    }

    /// Cuts `text` into windows and hands each one, with its character range, to `emit`.
    fn cut(&self, text: &str, mut emit: impl FnMut(Range<usize>, &str)) {
        let bounds: Vec<usize> = text
            .char_indices()
            .map(|(offset, _)| offset)
            .chain(std::iter::once(text.len()))
            .collect();
        for window in self.windows(bounds.len() - 1) {
            let slice = &text[bounds[window.start]..bounds[window.end]];
            emit(window, slice);
        }
    }
}

impl Default for FixedSizeChunker {
    fn default() -> Self {
        Self {
            chunk_size: crate::config::DEFAULT_CHUNK_SIZE,
            overlap: crate::config::DEFAULT_CHUNK_OVERLAP,
            mode: StreamMode::PerPage,
        }
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, doc: &Document) -> Result<Vec<Chunk>> {
        if doc.pages.is_empty() {
            return Err(RagError::Chunking(format!(
                "document {} has no pages",
                doc.id
            )));
        }

        let mut chunks = Vec::new();
        let mut push = |text: &str, source_page: usize, char_start: usize| {
            let sequence_index = chunks.len();
            chunks.push(Chunk {
                id: format!("{}#chunk_{sequence_index}", doc.id),
                text: text.to_string(),
                source_page,
                sequence_index,
                char_start,
                content_hash: content_hash(text),
            });
        };

        match &self.mode {
            StreamMode::PerPage => {
                for page in &doc.pages {
                    self.cut(&page.text, |window, text| push(text, page.index, window.start));
                }
            }
            StreamMode::Continuous { separator } => {
                let separator_chars = separator.chars().count();
                let mut stream = String::new();
                let mut spans = Vec::with_capacity(doc.pages.len());
                let mut cursor = 0;
                for (position, page) in doc.pages.iter().enumerate() {
                    stream.push_str(&page.text);
                    let mut len = page.text.chars().count();
                    if position + 1 < doc.pages.len() {
                        stream.push_str(separator);
                        len += separator_chars;
                    }
                    spans.push((page.index, cursor..cursor + len));
                    cursor += len;
                }
                self.cut(&stream, |window, text| {
                    push(text, majority_page(&spans, &window), window.start);
                });
            }
        }

        Ok(chunks)
    }

    fn name(&self) -> &'static str {
        "fixed_size"
    }
}

/// Page contributing the most characters to `window`; the earlier page wins ties.
fn majority_page(spans: &[(usize, Range<usize>)], window: &Range<usize>) -> usize {
    let mut best_page = spans.first().map_or(0, |(page, _)| *page);
    let mut best_shared = 0;
    for (page, span) in spans {
        let shared = span
            .end
            .min(window.end)
            .saturating_sub(span.start.max(window.start));
        if shared > best_shared {
            best_page = *page;
            best_shared = shared;
        }
    }
    best_page
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Page;

    /// Rebuilds the streams by dropping the overlapping prefix of every follow-up chunk.
    fn reconstruct(chunks: &[Chunk], overlap: usize) -> String {
        let mut text = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            let continues = i > 0 && chunk.char_start > 0;
            let skip = if continues { overlap } else { 0 };
            text.extend(chunk.text.chars().skip(skip));
        }
        text
    }

    fn lorem(len: usize) -> String {
        "Total B2C orders grew steadily across quarters; käse & crème brûlée. "
            .chars()
            .cycle()
            .take(len)
            .collect()
    }

    #[test]
    fn small_text_single_chunk() {
        let chunker = FixedSizeChunker::new(100, 20).unwrap();
        let doc = Document::new("doc1", vec![Page::new(1, "Short text")]);
        let chunks = chunker.chunk(&doc).unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].id, "doc1#chunk_0");
        assert_eq!(chunks[0].text, "Short text");
        assert_eq!(chunks[0].source_page, 1);
        assert_eq!(chunks[0].sequence_index, 0);
    }

    #[test]
    fn windows_advance_by_step() {
        let chunker = FixedSizeChunker::new(1000, 150).unwrap();
        let doc = Document::new("doc1", vec![Page::new(0, lorem(3000))]);
        let chunks = chunker.chunk(&doc).unwrap();

        let starts: Vec<usize> = chunks.iter().map(|c| c.char_start).collect();
        assert_eq!(starts, vec![0, 850, 1700, 2550]);
        assert_eq!(chunks.last().unwrap().text.chars().count(), 450);
        assert!(chunks.iter().all(|c| c.text.chars().count() <= 1000));
    }

    #[test]
    fn coverage_is_lossless_per_page() {
        let lengths = [0, 1, 9, 10, 11, 37, 100];
        for (size, overlap) in [(10, 0), (10, 3), (10, 9), (7, 2), (1, 0)] {
            let chunker = FixedSizeChunker::new(size, overlap).unwrap();
            for len in lengths {
                let text = lorem(len);
                let doc = Document::new("doc", vec![Page::new(1, text.clone())]);
                let chunks = chunker.chunk(&doc).unwrap();
                assert_eq!(
                    reconstruct(&chunks, overlap),
                    text,
                    "size {size} overlap {overlap} len {len}"
                );
            }
        }
    }

    #[test]
    fn adjacent_chunks_share_exactly_the_overlap() {
        let chunker = FixedSizeChunker::new(40, 12).unwrap();
        let doc = Document::new("doc", vec![Page::new(1, lorem(333))]);
        let chunks = chunker.chunk(&doc).unwrap();
        assert!(chunks.len() > 3);

        for pair in chunks.windows(2) {
            let prev: Vec<char> = pair[0].text.chars().collect();
            let next: Vec<char> = pair[1].text.chars().collect();
            assert_eq!(&prev[prev.len() - 12..], &next[..12]);
            assert!(next.len() > 12);
        }
    }

    #[test]
    fn per_page_chunks_never_cross_pages() {
        let chunker = FixedSizeChunker::new(50, 10).unwrap();
        let pages = vec![
            Page::new(1, lorem(120)),
            Page::new(2, String::new()),
            Page::new(3, lorem(49)),
        ];
        let doc = Document::new("doc", pages.clone());
        let chunks = chunker.chunk(&doc).unwrap();

        for page in &pages {
            let own: Vec<Chunk> = chunks
                .iter()
                .filter(|c| c.source_page == page.index)
                .cloned()
                .collect();
            assert_eq!(reconstruct(&own, 10), page.text);
        }
        assert!(chunks.iter().all(|c| c.source_page != 2));
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.sequence_index, i);
            assert_eq!(chunk.id, format!("doc#chunk_{i}"));
        }
    }

    #[test]
    fn continuous_stream_is_lossless() {
        let chunker = FixedSizeChunker::new(64, 16)
            .unwrap()
            .with_mode(StreamMode::continuous());
        let pages = vec![
            Page::new(1, lorem(100)),
            Page::new(2, lorem(5)),
            Page::new(3, lorem(200)),
        ];
        let expected = pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let chunks = chunker.chunk(&Document::new("doc", pages)).unwrap();

        assert_eq!(reconstruct(&chunks, 16), expected);
    }

    #[test]
    fn straddling_chunk_goes_to_majority_page() {
        let chunker = FixedSizeChunker::new(5, 1).unwrap().with_mode(StreamMode::Continuous {
            separator: String::new(),
        });
        let doc = Document::new(
            "doc",
            vec![Page::new(1, "aaaaaa"), Page::new(2, "bbbb")],
        );
        let chunks = chunker.chunk(&doc).unwrap();

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["aaaaa", "aabbb", "bb"]);
        let pages: Vec<usize> = chunks.iter().map(|c| c.source_page).collect();
        assert_eq!(pages, vec![1, 2, 2]);
    }

    #[test]
    fn attribution_tie_goes_to_earlier_page() {
        let chunker = FixedSizeChunker::new(4, 0).unwrap().with_mode(StreamMode::Continuous {
            separator: String::new(),
        });
        let doc = Document::new(
            "doc",
            vec![Page::new(4, "aaaaaa"), Page::new(5, "bbbbbb")],
        );
        let chunks = chunker.chunk(&doc).unwrap();

        assert_eq!(chunks[1].text, "aabb");
        assert_eq!(chunks[1].source_page, 4);
        assert_eq!(chunks[2].source_page, 5);
    }

    #[test]
    fn separator_counts_towards_preceding_page() {
        let chunker = FixedSizeChunker::new(4, 0).unwrap().with_mode(StreamMode::Continuous {
            separator: "--".to_string(),
        });
        let doc = Document::new("doc", vec![Page::new(1, "aa"), Page::new(2, "bb")]);
        let chunks = chunker.chunk(&doc).unwrap();

        assert_eq!(chunks[0].text, "aa--");
        assert_eq!(chunks[0].source_page, 1);
        assert_eq!(chunks[1].text, "bb");
        assert_eq!(chunks[1].source_page, 2);
    }

    #[test]
    fn chunks_have_content_hash() {
        let chunker = FixedSizeChunker::default();
        let doc = Document::new("doc1", vec![Page::new(1, "Some text content")]);
        let chunks = chunker.chunk(&doc).unwrap();

        assert_eq!(chunks[0].content_hash, content_hash("Some text content"));
    }

    #[test]
    fn overlap_must_be_less_than_chunk_size() {
        assert!(matches!(
            FixedSizeChunker::new(10, 10),
            Err(RagError::Chunking(_))
        ));
        assert!(matches!(
            FixedSizeChunker::new(0, 0),
            Err(RagError::Chunking(_))
        ));
    }

    #[test]
    fn document_without_pages_is_rejected() {
        let chunker = FixedSizeChunker::default();
        let err = chunker.chunk(&Document::new("empty", Vec::new())).unwrap_err();
        assert!(matches!(err, RagError::Chunking(_)));
    }
}
