//! Durable string-keyed state
//!
//! The endpoint keeps a small amount of state between orders, most
//! importantly the pinned control-plane key. Stores are string-keyed like
//! the variable stores of the host platforms this protocol manages.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::warn;

use crate::error::{ErrorCode, ProtocolError, Result};

/// Persistent name/value state.
pub trait StateStore: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&self, name: &str, value: &str) -> Result<()>;
    fn delete(&self, name: &str) -> Result<()>;
}

/// Volatile store for embedding and tests.
#[derive(Default)]
pub struct MemoryStateStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStateStore {
    fn get(&self, name: &str) -> Option<String> {
        self.entries.lock().ok()?.get(name).cloned()
    }

    fn set(&self, name: &str, value: &str) -> Result<()> {
        let mut entries = lock_or_error(&self.entries)?;
        entries.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<()> {
        let mut entries = lock_or_error(&self.entries)?;
        entries.remove(name);
        Ok(())
    }
}

/// Store backed by one pretty-printed JSON document on disk.
pub struct FileStateStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStateStore {
    /// Open the store, loading the existing document when there is one.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(io_error)?;
            serde_json::from_str(&content)
                .map_err(|e| ProtocolError::with_message(ErrorCode::GeneralError, e.to_string()))?
        } else {
            HashMap::new()
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn persist(&self, entries: &HashMap<String, String>) -> Result<()> {
        let content = serde_json::to_string_pretty(entries)
            .map_err(|e| ProtocolError::with_message(ErrorCode::GeneralError, e.to_string()))?;

        // Write to a temp file first, then rename for atomicity
        let temp_path = self.path.with_extension("json.tmp");
        std::fs::write(&temp_path, &content).map_err(io_error)?;
        std::fs::rename(&temp_path, &self.path).map_err(io_error)?;
        Ok(())
    }
}

impl StateStore for FileStateStore {
    fn get(&self, name: &str) -> Option<String> {
        match self.entries.lock() {
            Ok(entries) => entries.get(name).cloned(),
            Err(e) => {
                warn!("State store lock failed: {}", e);
                None
            }
        }
    }

    fn set(&self, name: &str, value: &str) -> Result<()> {
        let mut entries = lock_or_error(&self.entries)?;
        entries.insert(name.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn delete(&self, name: &str) -> Result<()> {
        let mut entries = lock_or_error(&self.entries)?;
        entries.remove(name);
        self.persist(&entries)
    }
}

fn lock_or_error<'a, T>(mutex: &'a Mutex<T>) -> Result<std::sync::MutexGuard<'a, T>> {
    mutex
        .lock()
        .map_err(|e| ProtocolError::with_message(ErrorCode::GeneralError, e.to_string()))
}

fn io_error(error: std::io::Error) -> ProtocolError {
    ProtocolError::with_message(ErrorCode::GeneralError, format!("State file error: {}", error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_round_trip() {
        let store = MemoryStateStore::new();
        assert_eq!(store.get("key"), None);
        store.set("key", "value").unwrap();
        assert_eq!(store.get("key").as_deref(), Some("value"));
        store.delete("key").unwrap();
        assert_eq!(store.get("key"), None);
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        let store = FileStateStore::open(&path).unwrap();
        store.set("remote_public_key", "-----BEGIN-----").unwrap();
        drop(store);

        let store = FileStateStore::open(&path).unwrap();
        assert_eq!(store.get("remote_public_key").as_deref(), Some("-----BEGIN-----"));
        store.delete("remote_public_key").unwrap();
        drop(store);

        let store = FileStateStore::open(&path).unwrap();
        assert_eq!(store.get("remote_public_key"), None);
    }

    #[test]
    fn test_file_store_starts_empty_without_document() {
        let dir = TempDir::new().unwrap();
        let store = FileStateStore::open(dir.path().join("missing.json")).unwrap();
        assert_eq!(store.get("anything"), None);
    }

    #[test]
    fn test_file_store_rejects_broken_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(FileStateStore::open(&path).is_err());
    }
}
