//! Directory bundle backed by rkyv.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rkyv::rancor::Error as RkyvError;
use rkyv::util::AlignedVec;
use rkyv::{from_bytes, to_bytes};

use crate::error::{RagError, Result};
use crate::hash::checksum;
use crate::index::{FlatIndex, VectorIndex};
use crate::types::{Chunk, IndexEntry};

use super::{
    FORMAT_VERSION, INDEX_FILE, IndexManifest, LoadedIndex, MANIFEST_FILE, Persistence,
};

/// Wrapper for serialization with rkyv.
#[derive(rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
struct EntriesWrapper {
    entries: Vec<EntryData>,
}

/// Flattened entry as archived on disk.
#[derive(rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
struct EntryData {
    id: String,
    text: String,
    source_page: u64,
    sequence_index: u64,
    char_start: u64,
    content_hash: u64,
    embedding: Vec<f32>,
}

impl From<&IndexEntry> for EntryData {
    fn from(entry: &IndexEntry) -> Self {
        Self {
            id: entry.chunk.id.clone(),
            text: entry.chunk.text.clone(),
            source_page: entry.chunk.source_page as u64,
            sequence_index: entry.chunk.sequence_index as u64,
            char_start: entry.chunk.char_start as u64,
            content_hash: entry.chunk.content_hash,
            embedding: entry.embedding.clone(),
        }
    }
}

impl TryFrom<EntryData> for IndexEntry {
    type Error = RagError;

    fn try_from(data: EntryData) -> Result<Self> {
        let to_usize = |value: u64| {
            usize::try_from(value)
                .map_err(|_| RagError::Serialization(format!("offset {value} out of range")))
        };
        let chunk = Chunk {
            id: data.id,
            text: data.text,
            source_page: to_usize(data.source_page)?,
            sequence_index: to_usize(data.sequence_index)?,
            char_start: to_usize(data.char_start)?,
            content_hash: data.content_hash,
        };
        Ok(Self::new(chunk, data.embedding))
    }
}

/// Stores an index as `index.rkyv` plus `manifest.json` inside one directory.
///
/// # Example
///
/// ```rust,no_run
/// use docqa_rag::persistence::{BundlePersistence, Persistence};
///
/// let persistence = BundlePersistence::new("./docqa_index");
/// let loaded = persistence.load()?;
/// println!("{} entries", loaded.manifest.entry_count);
/// # Ok::<(), docqa_rag::RagError>(())
/// ```
#[derive(Debug, Clone)]
pub struct BundlePersistence {
    path: PathBuf,
}

impl BundlePersistence {
    /// Creates a backend rooted at the bundle directory `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn persistence_error(path: &Path, source: io::Error) -> RagError {
        RagError::Persistence {
            path: path.to_path_buf(),
            source,
        }
    }

    fn invalid_data(path: &Path, message: String) -> RagError {
        Self::persistence_error(path, io::Error::new(io::ErrorKind::InvalidData, message))
    }

    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Moves `staged` to the bundle path. The previous bundle is parked in a sibling
    /// directory until the swap succeeds and is moved back if it fails.
    fn replace_target(&self, staged: &Path) -> Result<()> {
        let parent = self.parent_dir();
        let backup_dir = tempfile::Builder::new()
            .prefix(".docqa-previous-")
            .tempdir_in(&parent)
            .map_err(|e| {
                let _ = fs::remove_dir_all(staged);
                Self::persistence_error(&parent, e)
            })?;
        let backup = backup_dir.path().join("bundle");

        let had_previous = self.path.exists();
        if had_previous {
            fs::rename(&self.path, &backup).map_err(|e| {
                let _ = fs::remove_dir_all(staged);
                Self::persistence_error(&self.path, e)
            })?;
        }

        if let Err(e) = fs::rename(staged, &self.path) {
            let _ = fs::remove_dir_all(staged);
            if had_previous {
                if let Err(restore) = fs::rename(&backup, &self.path) {
                    let kept = backup_dir.keep();
                    tracing::error!(
                        path = %self.path.display(),
                        backup = %kept.join("bundle").display(),
                        error = %restore,
                        "Could not restore previous index bundle"
                    );
                }
            }
            return Err(Self::persistence_error(&self.path, e));
        }

        if let Err(e) = backup_dir.close() {
            tracing::warn!(error = %e, "Failed to remove previous index bundle");
        }
        Ok(())
    }
}

impl Persistence for BundlePersistence {
    fn save(&self, index: &FlatIndex, mut manifest: IndexManifest) -> Result<IndexManifest> {
        let parent = self.parent_dir();
        fs::create_dir_all(&parent).map_err(|e| Self::persistence_error(&parent, e))?;

        let wrapper = EntriesWrapper {
            entries: index.entries().iter().map(EntryData::from).collect(),
        };
        let bytes =
            to_bytes::<RkyvError>(&wrapper).map_err(|e| RagError::Serialization(e.to_string()))?;

        manifest.format_version = FORMAT_VERSION;
        manifest.dimension = index.dimension();
        manifest.entry_count = index.len();
        manifest.checksum = checksum(&bytes);
        let manifest_json = serde_json::to_vec_pretty(&manifest)
            .map_err(|e| RagError::Serialization(e.to_string()))?;

        let staging = tempfile::Builder::new()
            .prefix(".docqa-index-")
            .tempdir_in(&parent)
            .map_err(|e| Self::persistence_error(&parent, e))?;

        let index_file = staging.path().join(INDEX_FILE);
        fs::write(&index_file, &bytes).map_err(|e| Self::persistence_error(&index_file, e))?;
        let manifest_file = staging.path().join(MANIFEST_FILE);
        fs::write(&manifest_file, &manifest_json)
            .map_err(|e| Self::persistence_error(&manifest_file, e))?;

        self.replace_target(&staging.keep())?;

        tracing::info!(
            path = %self.path.display(),
            entries = manifest.entry_count,
            dimension = manifest.dimension,
            "Saved index bundle"
        );
        Ok(manifest)
    }

    fn load(&self) -> Result<LoadedIndex> {
        if !self.path.exists() {
            return Err(RagError::IndexNotFound(self.path.clone()));
        }

        let manifest_file = self.path.join(MANIFEST_FILE);
        let manifest_json =
            fs::read(&manifest_file).map_err(|e| Self::persistence_error(&manifest_file, e))?;
        let manifest: IndexManifest = serde_json::from_slice(&manifest_json)
            .map_err(|e| RagError::Serialization(format!("invalid manifest: {e}")))?;
        if manifest.format_version != FORMAT_VERSION {
            return Err(Self::invalid_data(
                &manifest_file,
                format!(
                    "unsupported format version {} (expected {FORMAT_VERSION})",
                    manifest.format_version
                ),
            ));
        }

        let index_file = self.path.join(INDEX_FILE);
        let raw = fs::read(&index_file).map_err(|e| Self::persistence_error(&index_file, e))?;
        let actual = checksum(&raw);
        if actual != manifest.checksum {
            return Err(Self::invalid_data(
                &index_file,
                format!(
                    "checksum mismatch: manifest records {:016x}, file has {actual:016x}",
                    manifest.checksum
                ),
            ));
        }

        let mut bytes = AlignedVec::<16>::with_capacity(raw.len());
        bytes.extend_from_slice(&raw);
        let wrapper = from_bytes::<EntriesWrapper, RkyvError>(&bytes)
            .map_err(|e| RagError::Serialization(e.to_string()))?;

        if wrapper.entries.len() != manifest.entry_count {
            return Err(Self::invalid_data(
                &index_file,
                format!(
                    "manifest records {} entries, archive holds {}",
                    manifest.entry_count,
                    wrapper.entries.len()
                ),
            ));
        }

        let entries = wrapper
            .entries
            .into_iter()
            .map(IndexEntry::try_from)
            .collect::<Result<Vec<_>>>()?;
        let mut index = FlatIndex::with_dimension(manifest.dimension);
        index.add(entries)?;

        tracing::debug!(
            path = %self.path.display(),
            entries = index.len(),
            "Loaded index bundle"
        );
        Ok(LoadedIndex { index, manifest })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_entry(id: &str, text: &str, page: usize, embedding: Vec<f32>) -> IndexEntry {
        IndexEntry::new(Chunk::new(id, text, page, 0), embedding)
    }

    fn sample_index() -> FlatIndex {
        FlatIndex::build(vec![
            make_entry("doc#chunk_0", "Total B2C orders: 1.2 billion", 3, vec![0.1, 0.7, 0.2]),
            make_entry("doc#chunk_1", "Revenue grew", 4, vec![0.9, 0.05, 0.3]),
            make_entry("doc#chunk_2", "Headcount", 5, vec![-0.3, 0.2, 0.8]),
        ])
        .unwrap()
    }

    fn manifest() -> IndexManifest {
        IndexManifest::new("test-model", "doc").with_chunking(1000, 150)
    }

    #[test]
    fn round_trip_is_bit_exact() {
        let dir = tempdir().unwrap();
        let persistence = BundlePersistence::new(dir.path().join("index"));
        let index = sample_index();

        let written = persistence.save(&index, manifest()).unwrap();
        assert_eq!(written.entry_count, 3);
        assert_eq!(written.dimension, 3);

        let loaded = persistence.load().unwrap();
        assert_eq!(loaded.manifest, written);
        assert_eq!(loaded.index.entries(), index.entries());

        let query = [0.2, 0.5, 0.4];
        let before = index.search(&query, 3).unwrap();
        let after = loaded.index.search(&query, 3).unwrap();
        assert_eq!(before.len(), after.len());
        for (a, b) in before.iter().zip(&after) {
            assert_eq!(a.entry, b.entry);
            assert_eq!(a.score.to_bits(), b.score.to_bits());
            assert_eq!(a.position, b.position);
        }
    }

    #[test]
    fn missing_bundle_is_index_not_found() {
        let dir = tempdir().unwrap();
        let persistence = BundlePersistence::new(dir.path().join("absent"));
        assert!(!persistence.exists());
        assert!(matches!(persistence.load(), Err(RagError::IndexNotFound(_))));
    }

    #[test]
    fn save_replaces_previous_bundle() {
        let dir = tempdir().unwrap();
        let persistence = BundlePersistence::new(dir.path().join("index"));
        persistence.save(&sample_index(), manifest()).unwrap();

        let smaller = FlatIndex::build(vec![make_entry("only", "one", 1, vec![1.0, 0.0])]).unwrap();
        persistence.save(&smaller, manifest()).unwrap();

        let loaded = persistence.load().unwrap();
        assert_eq!(loaded.index.len(), 1);
        assert_eq!(loaded.manifest.dimension, 2);

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("index")]);
    }

    #[test]
    fn failed_swap_keeps_previous_bundle() {
        let dir = tempdir().unwrap();
        let persistence = BundlePersistence::new(dir.path().join("index"));
        persistence.save(&sample_index(), manifest()).unwrap();

        let err = persistence
            .replace_target(&dir.path().join("missing-staging"))
            .unwrap_err();
        assert!(matches!(err, RagError::Persistence { .. }));

        let loaded = persistence.load().unwrap();
        assert_eq!(loaded.index.len(), 3);
        assert_eq!(loaded.index.entries(), sample_index().entries());

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("index")]);
    }

    #[test]
    fn tampered_archive_fails_checksum() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index");
        let persistence = BundlePersistence::new(&path);
        persistence.save(&sample_index(), manifest()).unwrap();

        let archive = path.join(INDEX_FILE);
        let mut bytes = fs::read(&archive).unwrap();
        bytes[0] ^= 0xff;
        fs::write(&archive, bytes).unwrap();

        let err = persistence.load().unwrap_err();
        assert!(matches!(err, RagError::Persistence { .. }));
        assert!(err.to_string().contains("checksum"));
    }

    #[test]
    fn manifest_records_document_details() {
        let dir = tempdir().unwrap();
        let persistence = BundlePersistence::new(dir.path().join("index"));
        let manifest = manifest().with_document_title(Some("Annual Report".into()));
        persistence.save(&sample_index(), manifest).unwrap();

        let raw = fs::read_to_string(dir.path().join("index").join(MANIFEST_FILE)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["embedding_model"], "test-model");
        assert_eq!(json["document_title"], "Annual Report");
        assert_eq!(json["chunk_size"], 1000);
        assert_eq!(json["chunk_overlap"], 150);
    }

    #[test]
    fn empty_index_round_trips() {
        let dir = tempdir().unwrap();
        let persistence = BundlePersistence::new(dir.path().join("index"));
        persistence
            .save(&FlatIndex::with_dimension(4), manifest())
            .unwrap();
        let loaded = persistence.load().unwrap();
        assert!(loaded.index.is_empty());
        assert_eq!(loaded.index.dimension(), 4);
    }
}
