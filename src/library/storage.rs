//! Key-value persistence seam for the library.
//!
//! The library writes its whole state (collection plus active pointer) as one
//! batch through `commit`, so a reader after a restart sees either the old or
//! the new state, never a mix of the two.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("storage document is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("storage backend rejected the write: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageWrite {
    Set { key: String, value: String },
    Remove { key: String },
}

impl StorageWrite {
    pub fn set(key: impl Into<String>, value: impl Into<String>) -> Self {
        StorageWrite::Set {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn remove(key: impl Into<String>) -> Self {
        StorageWrite::Remove { key: key.into() }
    }
}

pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Apply every write or none of them.
    fn commit(&mut self, writes: Vec<StorageWrite>) -> Result<(), StorageError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.commit(vec![StorageWrite::set(key, value)])
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.commit(vec![StorageWrite::remove(key)])
    }
}

fn apply_writes(map: &mut BTreeMap<String, String>, writes: Vec<StorageWrite>) {
    for write in writes {
        match write {
            StorageWrite::Set { key, value } => {
                map.insert(key, value);
            }
            StorageWrite::Remove { key } => {
                map.remove(&key);
            }
        }
    }
}

/// In-process store, mainly for tests and ephemeral previews.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.get(key).cloned())
    }

    fn commit(&mut self, writes: Vec<StorageWrite>) -> Result<(), StorageError> {
        apply_writes(&mut self.values, writes);
        Ok(())
    }
}

/// All keys in one JSON object on disk, replaced wholesale on every commit
/// (write to a sibling temp file, then rename over the original).
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new());
            }
            Err(source) => {
                return Err(StorageError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if data.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&data)?)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| "store.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_all()?.remove(key))
    }

    fn commit(&mut self, writes: Vec<StorageWrite>) -> Result<(), StorageError> {
        let mut values = match self.read_all() {
            Ok(values) => values,
            Err(StorageError::Corrupt(err)) => {
                warn!(path = %self.path.display(), "Replacing unreadable store document: {err}");
                BTreeMap::new()
            }
            Err(err) => return Err(err),
        };
        apply_writes(&mut values, writes);

        let io_err = |source| StorageError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }
        let contents = serde_json::to_string_pretty(&values)?;
        let temp = self.temp_path();
        fs::write(&temp, contents).map_err(io_err)?;
        fs::rename(&temp, &self.path).map_err(io_err)?;
        debug!(path = %self.path.display(), keys = values.len(), "Committed store document");
        Ok(())
    }
}
