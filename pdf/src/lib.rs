//! PDF loading for docqa.
//!
//! [`PdfLoader`] implements [`DocumentLoader`] on top of `lopdf`: every page of the PDF
//! becomes one [`Page`](docqa_rag::Page) (numbered from 1 in page-tree order) with its
//! text trimmed line by line, and the `Title` entry of the document info dictionary
//! becomes the document title.
//!
//! Scanned pages have no text layer and load as empty pages; the chunker skips them.

mod error;
mod parser;

pub use error::{PdfError, Result};

use std::path::Path;

use docqa_rag::{Document, DocumentLoader, RagError, loader::document_id};

/// Loads PDF files page by page.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfLoader;

impl PdfLoader {
    /// Parses a PDF held in memory.
    ///
    /// # Errors
    /// Returns [`PdfError::Parse`] for malformed input and [`PdfError::NoPages`] for an
    /// empty page tree.
    pub fn load_bytes(bytes: &[u8], id: &str) -> Result<Document> {
        parser::parse_bytes(bytes, id)
    }

    /// Parses the PDF at `path`.
    ///
    /// # Errors
    /// Returns [`PdfError::Io`] if the file cannot be read, otherwise as
    /// [`load_bytes`](Self::load_bytes).
    pub fn load_file(path: &Path) -> Result<Document> {
        let bytes = std::fs::read(path)?;
        let document = Self::load_bytes(&bytes, &document_id(path))?;
        tracing::info!(
            path = %path.display(),
            pages = document.pages.len(),
            title = document.title.as_deref().unwrap_or(""),
            "Loaded PDF"
        );
        Ok(document)
    }
}

impl DocumentLoader for PdfLoader {
    fn load(&self, path: &Path) -> docqa_rag::Result<Document> {
        if !path.exists() {
            return Err(RagError::MissingDocument(path.to_path_buf()));
        }
        Self::load_file(path).map_err(|error| RagError::Loader {
            path: path.to_path_buf(),
            message: error.to_string(),
        })
    }
}
