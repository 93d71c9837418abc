//! # Durable key-value persistence.
//!
//! [`Storage`] mirrors a browser-style local store: string keys, JSON values,
//! `set` overwrites. Clearing a key writes `null` instead of removing it.
//!
//! Two backends are provided:
//! - [`MemoryStorage`] process-local map (tests, ephemeral sessions)
//! - [`FileStorage`] one JSON object per file, rewritten on every `set`

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde_json::{Map, Value};

use crate::error::StorageError;

/// Key holding the JSON-encoded access token.
pub const ACCESS_TOKEN_KEY: &str = "accessToken";
/// Key holding the JSON-encoded ISO expiration of the access token.
pub const EXPIRATION_KEY: &str = "expiration";

/// Synchronous key-value persistence.
pub trait Storage: Send + Sync + 'static {
    fn set(&self, key: &str, value: Value) -> Result<(), StorageError>;

    /// `Ok(None)` when the key was never written.
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;
}

/// In-memory storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys ever written.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.entries.lock().insert(key.to_string(), value);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.entries.lock().get(key).cloned())
    }
}

/// File-backed storage holding a single JSON object.
///
/// A missing file reads as empty. Writes replace the file through a sibling
/// temp file so a crash never leaves half a document behind.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Map<String, Value>, StorageError> {
        match fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(Map::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn store(&self, map: &Map<String, Value>) -> Result<(), StorageError> {
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(map)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let _guard = self.lock.lock();
        let mut map = self.load()?;
        map.insert(key.to_string(), value);
        self.store(&map)
    }

    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let _guard = self.lock.lock();
        Ok(self.load()?.get(key).cloned())
    }
}
