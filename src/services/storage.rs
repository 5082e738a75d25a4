//! Key-value persistence adapter for store projections.
//!
//! DESIGN
//! ======
//! Stores never talk to a filesystem or browser API directly. They read their
//! persisted projection once at startup and write it after every mutation
//! through the [`Storage`] trait, keyed as `<namespace>.<name>`.
//!
//! TRADE-OFFS
//! ==========
//! No transactional guarantee spans keys: the session and theme projections
//! live under separate keys and the last write to each wins. `FileStorage`
//! writes through a temp file and rename so a crash never leaves a torn
//! record behind.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ErrorCode;

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;

/// Errors produced while reading or writing persisted state.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// The backing file could not be read or written.
    #[error("storage io failed for {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// A stored value could not be encoded or decoded as JSON.
    #[error("storage json failed for {key}: {source}")]
    Json {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The key contains characters that cannot be mapped to a storage slot.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    /// A previous writer panicked while holding the in-memory map.
    #[error("storage lock poisoned")]
    Poisoned,
}

impl ErrorCode for PersistenceError {
    fn error_code(&self) -> &'static str {
        "E_PERSISTENCE"
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

/// Scoped string key-value storage.
pub trait Storage: Send + Sync {
    /// Read the raw value for `key`, or `None` if nothing was stored.
    ///
    /// # Errors
    ///
    /// Returns a [`PersistenceError`] if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns a [`PersistenceError`] if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError>;
}

/// Build the storage key for a store projection, e.g. `algomaster.auth`.
#[must_use]
pub fn scoped_key(namespace: &str, name: &str) -> String {
    format!("{namespace}.{name}")
}

/// Load and decode a JSON value stored under `key`.
///
/// # Errors
///
/// Returns a [`PersistenceError`] if the read fails or the value is not valid
/// JSON for `T`.
pub fn load_json<T: DeserializeOwned>(storage: &dyn Storage, key: &str) -> Result<Option<T>, PersistenceError> {
    let Some(raw) = storage.get(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| PersistenceError::Json { key: key.to_owned(), source })
}

/// Encode `value` as JSON and store it under `key`.
///
/// # Errors
///
/// Returns a [`PersistenceError`] if encoding or the write fails.
pub fn save_json<T: Serialize>(storage: &dyn Storage, key: &str, value: &T) -> Result<(), PersistenceError> {
    let raw = serde_json::to_string(value).map_err(|source| PersistenceError::Json { key: key.to_owned(), source })?;
    storage.set(key, &raw)
}

// =============================================================================
// MEMORY
// =============================================================================

/// Process-lifetime storage backed by a map. Used by tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let entries = self.entries.lock().map_err(|_| PersistenceError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let mut entries = self.entries.lock().map_err(|_| PersistenceError::Poisoned)?;
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

// =============================================================================
// FILE
// =============================================================================

/// Durable storage: one `<key>.json` file per key inside a state directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Open (and create if missing) the state directory at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Io`] if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .map_err(|source| PersistenceError::Io { key: root.display().to_string(), source })?;
        Ok(Self { root })
    }

    /// Directory holding the per-key files.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, PersistenceError> {
        if !is_valid_key(key) {
            return Err(PersistenceError::InvalidKey(key.to_owned()));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('.')
        && !key.contains("..")
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(PersistenceError::Io { key: key.to_owned(), source }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value).map_err(|source| PersistenceError::Io { key: key.to_owned(), source })?;
        std::fs::rename(&tmp, &path).map_err(|source| PersistenceError::Io { key: key.to_owned(), source })
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
