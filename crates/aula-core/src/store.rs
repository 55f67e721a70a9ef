//! Key-value state persistence behind an explicit capability trait.
//!
//! The persisted chat state is a handful of tiny JSON blobs, so the store is
//! modeled as a plain string key-value resource with last-writer-wins
//! semantics and no locking. The trait exists so session logic can run against
//! an in-memory store under test and a file-backed store in the binary.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::errors::AulaError;

pub trait StateStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, AulaError>;
    fn set(&self, key: &str, value: &str) -> Result<(), AulaError>;
    fn delete(&self, key: &str) -> Result<(), AulaError>;
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, AulaError> {
        let entries = self
            .entries
            .lock()
            .map_err(|err| AulaError::Storage(err.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AulaError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|err| AulaError::Storage(err.to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), AulaError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|err| AulaError::Storage(err.to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

/// File-backed store: one JSON file per key under a state directory.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Default state directory, `~/.local/share/aula/state` on Linux.
    pub fn default_root() -> Result<PathBuf, AulaError> {
        let data_dir = dirs::data_local_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".local/share")))
            .ok_or_else(|| AulaError::Storage("could not determine state directory".to_string()))?;
        Ok(data_dir.join("aula").join("state"))
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys may carry separators ("chat:piar"); keep file names flat.
        let sanitized: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.root.join(format!("{sanitized}.json"))
    }
}

impl StateStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, AulaError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AulaError> {
        fs::create_dir_all(&self.root)?;
        fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), AulaError> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("chat:piar").unwrap(), None);

        store.set("chat:piar", "{}").unwrap();
        assert_eq!(store.get("chat:piar").unwrap(), Some("{}".to_string()));

        store.delete("chat:piar").unwrap();
        assert_eq!(store.get("chat:piar").unwrap(), None);
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf());

        assert_eq!(store.get("chat:lesson-plan").unwrap(), None);
        store.set("chat:lesson-plan", r#"{"a":1}"#).unwrap();
        assert_eq!(
            store.get("chat:lesson-plan").unwrap(),
            Some(r#"{"a":1}"#.to_string())
        );

        // Deleting a missing key is not an error.
        store.delete("chat:lesson-plan").unwrap();
        store.delete("chat:lesson-plan").unwrap();
        assert_eq!(store.get("chat:lesson-plan").unwrap(), None);
    }

    #[test]
    fn test_file_store_sanitizes_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf());

        store.set("chat:../escape", "x").unwrap();
        assert_eq!(store.get("chat:../escape").unwrap(), Some("x".to_string()));
        // Everything stays inside the root directory.
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
