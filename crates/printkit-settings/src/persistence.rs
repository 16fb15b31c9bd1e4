//! Key-value persistence backends
//!
//! Local design storage writes whole documents under string keys. Two
//! backends are provided: a directory of files for real use and an
//! in-memory map (with an optional byte quota) for tests and embedding.

use crate::error::{PersistenceError, PersistenceResult};
use printkit_core::{thread_safe, ThreadSafe};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// String key-value storage
///
/// Implementations use interior mutability so a store can be shared with
/// background tasks behind an `Arc`.
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` when the key is absent
    fn get(&self, key: &str) -> PersistenceResult<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> PersistenceResult<()>;

    /// Delete a value; deleting an absent key succeeds
    fn remove(&self, key: &str) -> PersistenceResult<()>;
}

fn check_key(key: &str) -> PersistenceResult<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(PersistenceError::InvalidKey(key.to_string()))
    }
}

/// Directory-backed store, one `<key>.json` file per entry
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `root`; the directory is created lazily
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the entries
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PersistenceResult<PathBuf> {
        check_key(key)?;
        Ok(self.root.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> PersistenceResult<Option<String>> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> PersistenceResult<()> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.root)?;
        // Write then rename so a crash never leaves a truncated entry
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        tracing::debug!("Stored {} ({} bytes)", key, value.len());
        Ok(())
    }

    fn remove(&self, key: &str) -> PersistenceResult<()> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store
#[derive(Debug, Clone)]
pub struct MemoryStore {
    entries: ThreadSafe<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStore {
    /// Unbounded store
    pub fn new() -> Self {
        Self {
            entries: thread_safe(HashMap::new()),
            quota: None,
        }
    }

    /// Store that rejects writes once keys plus values exceed `bytes`
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            quota: Some(bytes),
            ..Self::new()
        }
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Keys currently stored, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.lock().keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> PersistenceResult<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> PersistenceResult<()> {
        check_key(key)?;
        let mut entries = self.entries.lock();
        if let Some(quota) = self.quota {
            let others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let requested = others + key.len() + value.len();
            if requested > quota {
                return Err(PersistenceError::QuotaExceeded { requested, quota });
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> PersistenceResult<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("designs"));

        assert_eq!(store.get("design_1").unwrap(), None);
        store.set("design_1", "{\"a\":1}").unwrap();
        assert_eq!(store.get("design_1").unwrap().as_deref(), Some("{\"a\":1}"));

        store.set("design_1", "{}").unwrap();
        assert_eq!(store.get("design_1").unwrap().as_deref(), Some("{}"));

        store.remove("design_1").unwrap();
        assert_eq!(store.get("design_1").unwrap(), None);
        store.remove("design_1").unwrap();
    }

    #[test]
    fn test_file_store_rejects_path_keys() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        assert!(matches!(
            store.set("../escape", "x"),
            Err(PersistenceError::InvalidKey(_))
        ));
        assert!(store.get("a/b").is_err());
    }

    #[test]
    fn test_memory_store_quota() {
        let store = MemoryStore::with_quota(20);
        store.set("k1", "0123456789").unwrap();
        let err = store.set("k2", "0123456789").unwrap_err();
        assert!(matches!(err, PersistenceError::QuotaExceeded { quota: 20, .. }));

        // Replacing an existing entry only counts the new value
        store.set("k1", "01234567890123").unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_memory_store_clones_share_entries() {
        let store = MemoryStore::new();
        let clone = store.clone();
        clone.set("shared", "yes").unwrap();
        assert_eq!(store.get("shared").unwrap().as_deref(), Some("yes"));
        assert_eq!(store.keys(), vec!["shared".to_string()]);
    }
}
