//! Versioned on-disk persistence for index snapshots
//!
//! Each build writes `index-v{n}.json` and then swaps the `current` pointer
//! file, so a snapshot on disk is never partially overwritten and older
//! versions survive later uploads.

use crate::errors::{ChatError, Result};
use crate::index::VectorIndex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Pointer file naming the current index version
const CURRENT_FILE: &str = "current";

/// Loads and saves [`VectorIndex`] snapshots under one directory
pub struct IndexStore {
    dir: PathBuf,
}

impl IndexStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Next build sequence number: one past the highest version on disk
    pub fn next_version(&self) -> Result<u64> {
        if !self.dir.exists() {
            return Ok(1);
        }
        let mut max = 0u64;
        for entry in fs::read_dir(&self.dir)? {
            let name = entry?.file_name();
            if let Some(version) = parse_version(&name.to_string_lossy()) {
                max = max.max(version);
            }
        }
        Ok(max + 1)
    }

    /// Persist a snapshot and move the `current` pointer to it.
    ///
    /// The data file is written via a temp file + rename so a crash cannot
    /// leave a truncated snapshot behind the pointer.
    pub fn save(&self, index: &VectorIndex) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let version = index.metadata().version;
        let path = self.version_path(version);
        let tmp_path = path.with_extension("json.tmp");

        let json = serde_json::to_vec(index)?;
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &path)?;

        fs::write(self.dir.join(CURRENT_FILE), version.to_string())?;

        info!(version, path = %path.display(), "persisted index snapshot");
        Ok(())
    }

    /// Load the snapshot the `current` pointer names, if any
    pub fn load_current(&self) -> Result<Option<VectorIndex>> {
        let pointer = self.dir.join(CURRENT_FILE);
        if !pointer.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&pointer)?;
        let version: u64 = contents.trim().parse().map_err(|_| {
            ChatError::IndexBuildFailure(format!("corrupt current pointer: '{}'", contents.trim()))
        })?;

        self.load_version(version).map(Some)
    }

    /// Load a specific snapshot version
    pub fn load_version(&self, version: u64) -> Result<VectorIndex> {
        let path = self.version_path(version);
        let json = fs::read(&path)?;
        Ok(serde_json::from_slice(&json)?)
    }

    fn version_path(&self, version: u64) -> PathBuf {
        self.dir.join(format!("index-v{}.json", version))
    }
}

fn parse_version(file_name: &str) -> Option<u64> {
    file_name
        .strip_prefix("index-v")?
        .strip_suffix(".json")?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{IndexEntry, IndexMetadata};
    use crate::types::Chunk;
    use chrono::Utc;
    use tempfile::TempDir;

    fn sample_index(version: u64, text: &str) -> VectorIndex {
        VectorIndex::new(
            vec![IndexEntry {
                chunk: Chunk {
                    text: text.to_string(),
                    page: 1,
                    source_id: "doc".to_string(),
                },
                embedding: vec![1.0, 2.0],
            }],
            IndexMetadata {
                embedding_model: "test-embed".to_string(),
                dimension: 2,
                version,
                document_name: "doc.pdf".to_string(),
                built_at: Utc::now(),
            },
        )
    }

    #[test]
    fn test_empty_store_has_no_current() {
        let dir = TempDir::new().unwrap();
        let store = IndexStore::new(dir.path());
        assert!(store.load_current().unwrap().is_none());
        assert_eq!(store.next_version().unwrap(), 1);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = IndexStore::new(dir.path());

        store.save(&sample_index(1, "first")).unwrap();
        let loaded = store.load_current().unwrap().unwrap();
        assert_eq!(loaded.metadata().version, 1);
        assert_eq!(loaded.len(), 1);
    }

    #[test]
    fn test_versions_do_not_clobber() {
        let dir = TempDir::new().unwrap();
        let store = IndexStore::new(dir.path());

        store.save(&sample_index(1, "from document A")).unwrap();
        store.save(&sample_index(2, "from document B")).unwrap();

        // Current points at v2, but v1 is still loadable
        assert_eq!(store.load_current().unwrap().unwrap().metadata().version, 2);
        let old = store.load_version(1).unwrap();
        assert_eq!(old.search(&[1.0, 2.0], 1)[0].chunk.text, "from document A");
    }

    #[test]
    fn test_next_version_increments() {
        let dir = TempDir::new().unwrap();
        let store = IndexStore::new(dir.path());

        store.save(&sample_index(1, "a")).unwrap();
        assert_eq!(store.next_version().unwrap(), 2);
        store.save(&sample_index(2, "b")).unwrap();
        assert_eq!(store.next_version().unwrap(), 3);
    }

    #[test]
    fn test_corrupt_pointer_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = IndexStore::new(dir.path());
        std::fs::write(dir.path().join("current"), "not-a-number").unwrap();
        assert!(store.load_current().is_err());
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("index-v12.json"), Some(12));
        assert_eq!(parse_version("index-v.json"), None);
        assert_eq!(parse_version("current"), None);
        assert_eq!(parse_version("index-v3.json.tmp"), None);
    }
}
