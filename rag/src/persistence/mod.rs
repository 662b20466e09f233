//! Persistence for built indexes.
//!
//! An index is stored as a directory bundle:
//!
//! ```text
//! <index_path>/
//!   index.rkyv      rkyv archive of every entry, in insertion order
//!   manifest.json   format version, model id, dimension, counts, checksum
//! ```
//!
//! Bundles are written into a staging directory next to the target and renamed into
//! place. The previous bundle is parked beside it until the rename succeeds, so a reader
//! never sees a partially written bundle and a failed save restores the old one.

mod bundle;

pub use bundle::BundlePersistence;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::index::FlatIndex;

/// Current on-disk format version.
pub const FORMAT_VERSION: u32 = 1;
/// File name of the entry archive inside a bundle.
pub const INDEX_FILE: &str = "index.rkyv";
/// File name of the manifest inside a bundle.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Metadata stored next to the entry archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexManifest {
    /// On-disk format version.
    pub format_version: u32,
    /// Identifier of the model that produced the embeddings.
    pub embedding_model: String,
    /// Embedding dimension.
    pub dimension: usize,
    /// Number of stored entries.
    pub entry_count: usize,
    /// Chunk size used during ingestion.
    pub chunk_size: usize,
    /// Chunk overlap used during ingestion.
    pub chunk_overlap: usize,
    /// Identifier of the ingested document.
    pub document_id: String,
    /// Title of the ingested document, if the loader found one.
    #[serde(default)]
    pub document_title: Option<String>,
    /// xxh3 checksum of the entry archive.
    pub checksum: u64,
}

impl IndexManifest {
    /// Creates a manifest for `document_id` embedded with `embedding_model`.
    ///
    /// Dimension, entry count and checksum are filled in when the bundle is saved.
    #[must_use]
    pub fn new(embedding_model: impl Into<String>, document_id: impl Into<String>) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            embedding_model: embedding_model.into(),
            dimension: 0,
            entry_count: 0,
            chunk_size: 0,
            chunk_overlap: 0,
            document_id: document_id.into(),
            document_title: None,
            checksum: 0,
        }
    }

    /// Records the chunking parameters.
    #[must_use]
    pub const fn with_chunking(mut self, chunk_size: usize, chunk_overlap: usize) -> Self {
        self.chunk_size = chunk_size;
        self.chunk_overlap = chunk_overlap;
        self
    }

    /// Records the document title.
    #[must_use]
    pub fn with_document_title(mut self, title: Option<String>) -> Self {
        self.document_title = title;
        self
    }
}

/// An index restored from storage together with its manifest.
#[derive(Debug, Clone)]
pub struct LoadedIndex {
    /// The restored index.
    pub index: FlatIndex,
    /// The manifest it was saved with.
    pub manifest: IndexManifest,
}

/// Trait for persistence backends.
pub trait Persistence: Send + Sync {
    /// Saves the whole index, replacing anything previously stored.
    ///
    /// Returns the manifest as written, with dimension, entry count and checksum set.
    ///
    /// # Errors
    /// Returns an error if serialization or any filesystem step fails. A failed save
    /// leaves the previous bundle untouched.
    fn save(&self, index: &FlatIndex, manifest: IndexManifest) -> Result<IndexManifest>;

    /// Loads a previously saved index.
    ///
    /// # Errors
    /// Returns [`RagError::IndexNotFound`](crate::RagError::IndexNotFound) if nothing was
    /// saved at the path, and a persistence error if the bundle fails verification.
    fn load(&self) -> Result<LoadedIndex>;

    /// Whether a bundle exists at the storage path.
    fn exists(&self) -> bool {
        self.path().exists()
    }

    /// Returns the storage path.
    fn path(&self) -> &Path;
}
