//! Flat-file persistence: each collection is one JSON array on disk.
//!
//! `append` is a read-modify-write of the whole file with no locking, so two
//! concurrent writers can lose one another's records. Reads never fail: a
//! missing, unreadable or corrupt file is treated as an empty collection.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode records: {0}")]
    Encode(#[from] serde_json::Error),
}

pub struct JsonStore<T> {
    path: PathBuf,
    _records: PhantomData<fn() -> T>,
}

impl<T> Clone for JsonStore<T> {
    fn clone(&self) -> Self {
        Self::new(self.path.clone())
    }
}

impl<T> std::fmt::Debug for JsonStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonStore").field("path", &self.path).finish()
    }
}

impl<T> JsonStore<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _records: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T: Serialize + DeserializeOwned> JsonStore<T> {
    /// All records in file order (oldest first).
    pub fn load_all(&self) -> Vec<T> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("{} does not exist yet", self.path.display());
                return Vec::new();
            }
            Err(e) => {
                warn!("Could not read {}: {e}", self.path.display());
                return Vec::new();
            }
        };

        if raw.trim().is_empty() {
            return Vec::new();
        }

        match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(e) => {
                warn!("{} is corrupt, treating as empty: {e}", self.path.display());
                Vec::new()
            }
        }
    }

    /// Appends one record and rewrites the file. Returns the new record count.
    pub fn append(&self, record: &T) -> Result<usize, StoreError>
    where
        T: Clone,
    {
        let mut records = self.load_all();
        records.push(record.clone());
        self.write_all(&records)?;
        Ok(records.len())
    }

    /// Replaces the whole collection.
    pub fn write_all(&self, records: &[T]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let json = serde_json::to_string_pretty(records)?;
        fs::write(&self.path, json).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;
        debug!("Wrote {} records to {}", records.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        author: String,
        score: f64,
    }

    fn note(author: &str, score: f64) -> Note {
        Note {
            author: author.to_string(),
            score,
        }
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store: JsonStore<Note> = JsonStore::new(dir.path().join("notes.json"));
        assert!(store.load_all().is_empty());
    }

    #[test]
    fn append_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("nested/deeper/notes.json"));
        assert_eq!(store.append(&note("amina", 0.25)).unwrap(), 1);
        assert_eq!(store.load_all(), vec![note("amina", 0.25)]);
    }

    #[test]
    fn appends_keep_call_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("notes.json"));
        store.append(&note("first", 0.1)).unwrap();
        store.append(&note("second", 0.9)).unwrap();
        assert_eq!(store.load_all(), vec![note("first", 0.1), note("second", 0.9)]);
    }

    #[test]
    fn corrupt_file_reads_as_empty_and_is_replaced_on_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.json");
        fs::write(&path, "{ not json").unwrap();

        let store = JsonStore::new(&path);
        assert!(store.load_all().is_empty());

        store.append(&note("fresh", 0.5)).unwrap();
        assert_eq!(store.load_all(), vec![note("fresh", 0.5)]);
    }

    #[test]
    fn write_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        // The target path is an existing directory, so the write must fail.
        let store: JsonStore<Note> = JsonStore::new(dir.path());
        assert!(matches!(
            store.append(&note("lost", 0.0)),
            Err(StoreError::Write { .. })
        ));
    }
}
