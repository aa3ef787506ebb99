//! Key-value storage traits for mathce1.
//!
//! This module defines the `KeyValueStore` trait for blob persistence.

use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;

/// Trait for key-value storage backends.
///
/// Implementations persist whole JSON values under string keys. There is one
/// writer (the local child on the local device), so no versioning is done:
/// callers load a blob, mutate it in memory and write it back.
pub trait KeyValueStore: Send + Sync {
    /// Retrieve the value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Store a value, replacing any previous one.
    fn put(&self, key: &str, value: &Value) -> Result<()>;

    /// Remove a key.
    ///
    /// Returns `Ok(())` even if the key doesn't exist.
    fn remove(&self, key: &str) -> Result<()>;

    /// List stored keys, sorted.
    fn keys(&self) -> Result<Vec<String>>;

    /// Check if a key exists.
    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Blanket implementation of KeyValueStore for Arc-wrapped stores.
///
/// The engine hands one `Arc<S>` to each of its services so they all read
/// and write the same backing store.
impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &Value) -> Result<()> {
        (**self).put(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }

    fn keys(&self) -> Result<Vec<String>> {
        (**self).keys()
    }
}

/// Test utilities for KeyValueStore implementations.
#[cfg(test)]
pub mod tests {
    use super::*;
    use serde_json::json;

    /// Test helper to verify KeyValueStore implementations.
    pub fn test_key_value_store_crud<S: KeyValueStore>(store: &S) {
        let value = json!({"lea": {"calcul": {"level": 2}}});

        // Initially should not exist
        assert!(!store.exists("progressions").unwrap());
        assert!(store.get("progressions").unwrap().is_none());

        store.put("progressions", &value).unwrap();

        assert!(store.exists("progressions").unwrap());
        assert_eq!(store.get("progressions").unwrap(), Some(value));

        // Overwrite replaces the whole blob
        let replaced = json!([1, 2, 3]);
        store.put("progressions", &replaced).unwrap();
        assert_eq!(store.get("progressions").unwrap(), Some(replaced));

        store.put("badges", &json!({})).unwrap();
        assert_eq!(
            store.keys().unwrap(),
            vec!["badges".to_string(), "progressions".to_string()]
        );

        store.remove("progressions").unwrap();
        assert!(!store.exists("progressions").unwrap());

        // Remove again should succeed
        store.remove("progressions").unwrap();
    }
}
