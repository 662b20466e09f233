//! Turning source files into [`Document`]s.

use std::fs;
use std::path::Path;

use crate::error::{RagError, Result};
use crate::types::{Document, Page};

/// Page separator recognised by [`TextLoader`].
pub const FORM_FEED: char = '\x0c';

/// Loads a file into an ordered sequence of pages.
pub trait DocumentLoader: Send + Sync {
    /// Reads the document at `path`.
    ///
    /// # Errors
    /// Returns [`RagError::MissingDocument`] if `path` does not exist and
    /// [`RagError::Loader`] if the file cannot be read or parsed.
    fn load(&self, path: &Path) -> Result<Document>;
}

/// Derives a document id from a file name (`reports/annual.pdf` becomes `annual`).
#[must_use]
pub fn document_id(path: &Path) -> String {
    path.file_stem()
        .map_or_else(|| "document".to_string(), |stem| stem.to_string_lossy().into_owned())
}

/// Loads UTF-8 text files, splitting pages on form-feed characters.
///
/// Pages are numbered from 1. A file without form feeds is a single page.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextLoader;

impl TextLoader {
    /// Splits `text` into pages.
    #[must_use]
    pub fn split_pages(text: &str) -> Vec<Page> {
        text.split(FORM_FEED)
            .enumerate()
            .map(|(i, page)| Page::new(i + 1, page))
            .collect()
    }
}

impl DocumentLoader for TextLoader {
    fn load(&self, path: &Path) -> Result<Document> {
        if !path.exists() {
            return Err(RagError::MissingDocument(path.to_path_buf()));
        }
        let text = fs::read_to_string(path).map_err(|e| RagError::Loader {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(Document::new(document_id(path), Self::split_pages(&text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn pages_split_on_form_feed() {
        let pages = TextLoader::split_pages("one\x0ctwo\x0cthree");
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0], Page::new(1, "one"));
        assert_eq!(pages[2], Page::new(3, "three"));
    }

    #[test]
    fn load_text_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.txt");
        fs::write(&path, "intro\x0cTotal B2C orders: 1.2 billion").unwrap();

        let doc = TextLoader.load(&path).unwrap();
        assert_eq!(doc.id, "report");
        assert_eq!(doc.pages.len(), 2);
        assert_eq!(doc.pages[1].index, 2);
    }

    #[test]
    fn missing_file_is_configuration_error() {
        let dir = tempdir().unwrap();
        let err = TextLoader.load(&dir.path().join("absent.txt")).unwrap_err();
        assert!(matches!(err, RagError::MissingDocument(_)));
        assert_eq!(err.stage(), crate::Stage::Configuration);
    }
}
