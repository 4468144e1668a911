//! TOML-file timer store
//!
//! The whole document is rewritten on every change, which keeps the file a
//! faithful copy of the in-memory map at all times:
//!
//! ```toml
//! [timers]
//! t0 = "1,1,7,30,0,20261017"
//! t3 = "1,0,22,0,1,0"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{StoreError, TimerStore};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    timers: BTreeMap<String, String>,
}

/// Timer store persisted to a TOML file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    document: StoreDocument,
}

impl FileStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let document = Self::load(&path)?;
        tracing::debug!(path = %path.display(), records = document.timers.len(), "Opened timer store");
        Ok(Self { path, document })
    }

    fn load(path: &Path) -> Result<StoreDocument, StoreError> {
        if !path.exists() {
            return Ok(StoreDocument::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| StoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn flush(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let content = toml::to_string_pretty(&self.document)?;

        std::fs::write(&self.path, content).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

impl TimerStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.document.timers.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.document.timers.get(key).map(String::as_str) == Some(value) {
            return Ok(());
        }
        let previous = self
            .document
            .timers
            .insert(key.to_string(), value.to_string());

        self.flush().inspect_err(|_| {
            // Keep the map equal to what is on disk so a retry writes again.
            match previous {
                Some(previous) => self.document.timers.insert(key.to_string(), previous),
                None => self.document.timers.remove(key),
            };
        })
    }

    fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        let Some(previous) = self.document.timers.remove(key) else {
            return Ok(());
        };

        self.flush().inspect_err(|_| {
            self.document.timers.insert(key.to_string(), previous);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("timers.toml")).unwrap();
        assert_eq!(store.get("t0").unwrap(), None);
    }

    #[test]
    fn records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("timers.toml");

        let mut store = FileStore::open(&path).unwrap();
        store.put("t0", "1,1,7,30,0,0").unwrap();
        store.put("t2", "1,0,22,15,1,0").unwrap();
        store.delete("t2").unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("t0").unwrap().as_deref(), Some("1,1,7,30,0,0"));
        assert!(!reopened.has("t2").unwrap());
    }

    #[test]
    fn unparsable_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timers.toml");
        std::fs::write(&path, "timers = [").unwrap();

        let err = FileStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));
    }

    #[test]
    fn rewriting_same_value_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timers.toml");

        let mut store = FileStore::open(&path).unwrap();
        store.put("t1", "1,0,6,0,0,0").unwrap();
        let before = std::fs::read_to_string(&path).unwrap();
        store.put("t1", "1,0,6,0,0,0").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn failed_put_is_written_on_retry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timers.toml");

        let mut store = FileStore::open(&path).unwrap();
        // A directory in the file's place makes the write fail.
        std::fs::create_dir(&path).unwrap();
        assert!(matches!(
            store.put("t0", "1,0,7,30,0,0"),
            Err(StoreError::Write { .. })
        ));
        assert_eq!(store.get("t0").unwrap(), None);

        std::fs::remove_dir(&path).unwrap();
        store.put("t0", "1,0,7,30,0,0").unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("t0").unwrap().as_deref(), Some("1,0,7,30,0,0"));
    }

    #[test]
    fn failed_delete_is_written_on_retry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timers.toml");

        let mut store = FileStore::open(&path).unwrap();
        store.put("t4", "1,1,22,0,1,0").unwrap();

        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();
        assert!(store.delete("t4").is_err());
        assert!(store.has("t4").unwrap());

        std::fs::remove_dir(&path).unwrap();
        store.delete("t4").unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert!(!reopened.has("t4").unwrap());
    }
}
