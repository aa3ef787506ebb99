//! Typed JSON access over a [`KeyValueStore`].
//!
//! Reads never fail: an absent key, an I/O error or a blob that no longer
//! matches its type all come back as the caller's default. State can always
//! be rebuilt from defaults, so this is safe for a single-family app.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{FailOpen, MathError, Result};
use crate::storage::KeyValueStore;

/// Prefix namespacing every key this crate writes.
pub const KEY_PREFIX: &str = "mathce1_";

/// Fixed blob names.
pub mod keys {
    pub const PROGRESSIONS: &str = "progressions";
    pub const SESSIONS: &str = "sessions";
    pub const CURRENT_SESSION: &str = "currentSession";
    pub const BADGES: &str = "badges";
    pub const CHILDREN: &str = "children";
}

/// Namespaced, JSON-serialized storage with fail-open reads.
#[derive(Debug, Clone)]
pub struct JsonStorage<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> JsonStorage<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The wrapped backend.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn full_key(key: &str) -> String {
        format!("{}{}", KEY_PREFIX, key)
    }

    /// Strict read, used by `get`.
    pub fn try_get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.store.get(&Self::full_key(key))? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| MathError::serde(format!("{}: {}", key, e))),
            None => Ok(None),
        }
    }

    /// Read `key`, falling back to `default` when absent or unreadable.
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.try_get(key) {
            Ok(Some(value)) => value,
            Ok(None) => default,
            Err(e) => Err::<T, _>(e).fail_open_with(&format!("reading '{}'", key), default),
        }
    }

    /// Strict write, used by `set`.
    pub fn try_set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.store.put(&Self::full_key(key), &value)
    }

    /// Write `key`. Returns `false` (and logs) on failure.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        match self.try_set(key, value) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("writing '{}': {}", key, e);
                false
            }
        }
    }

    /// Delete `key`. Returns `false` (and logs) on failure.
    pub fn remove(&self, key: &str) -> bool {
        match self.store.remove(&Self::full_key(key)) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("removing '{}': {}", key, e);
                false
            }
        }
    }

    /// Check whether `key` holds a value.
    pub fn contains(&self, key: &str) -> bool {
        self.store
            .exists(&Self::full_key(key))
            .fail_open_default("checking key")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStore, MemoryStore};
    use serde_json::json;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_get_absent_returns_default() {
        let storage = JsonStorage::new(MemoryStore::new());
        let value: Vec<u32> = storage.get(keys::SESSIONS, vec![42]);
        assert_eq!(value, vec![42]);
    }

    #[test]
    fn test_set_then_get() {
        let storage = JsonStorage::new(MemoryStore::new());
        let mut badges = HashMap::new();
        badges.insert("lea".to_string(), vec!["star_10".to_string()]);

        assert!(storage.set(keys::BADGES, &badges));
        let read: HashMap<String, Vec<String>> = storage.get(keys::BADGES, HashMap::new());
        assert_eq!(read, badges);
    }

    #[test]
    fn test_keys_are_prefixed() {
        let storage = JsonStorage::new(MemoryStore::new());
        storage.set(keys::CHILDREN, &json!([]));

        assert_eq!(
            storage.store().keys().unwrap(),
            vec!["mathce1_children".to_string()]
        );
        assert!(storage.contains(keys::CHILDREN));
    }

    #[test]
    fn test_type_mismatch_returns_default() {
        let storage = JsonStorage::new(MemoryStore::new());
        storage.set(keys::PROGRESSIONS, &"not a map");

        let read: HashMap<String, u32> = storage.get(keys::PROGRESSIONS, HashMap::new());
        assert!(read.is_empty());
        assert!(storage.try_get::<HashMap<String, u32>>(keys::PROGRESSIONS).is_err());
    }

    #[test]
    fn test_corrupt_file_returns_default() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("mathce1_sessions.json"), "[{oops").unwrap();
        let storage = JsonStorage::new(FileStore::with_dir(dir.path()).unwrap());

        let read: Vec<String> = storage.get(keys::SESSIONS, Vec::new());
        assert!(read.is_empty());
    }

    #[test]
    fn test_remove() {
        let storage = JsonStorage::new(MemoryStore::new());
        storage.set(keys::CURRENT_SESSION, &json!({"child_id": "lea"}));
        assert!(storage.remove(keys::CURRENT_SESSION));
        assert!(!storage.contains(keys::CURRENT_SESSION));
        // Removing an absent key is fine
        assert!(storage.remove(keys::CURRENT_SESSION));
    }
}
