//! File-based key-value storage for mathce1.
//!
//! Each key is stored as `<key>.json` in `~/.mathce1/data/`.
//! Atomic writes are achieved via temp file + rename pattern.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use serde_json::Value;

use crate::config::data_dir;
use crate::error::{MathError, Result};
use crate::storage::KeyValueStore;

/// File-based key-value store.
///
/// Stores one JSON document per key in a configurable directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    /// Directory where the JSON files live.
    data_dir: PathBuf,
}

impl FileStore {
    /// Create a file store in the default data directory.
    ///
    /// Uses `~/.mathce1/data/` or `$MATHCE1_HOME/data/`.
    pub fn new() -> Result<Self> {
        let dir = data_dir().ok_or_else(|| {
            MathError::config("Could not determine data directory (no home directory)")
        })?;
        Self::with_dir(dir)
    }

    /// Create a file store in a custom directory, creating it if needed.
    pub fn with_dir(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();

        if !data_dir.exists() {
            fs::create_dir_all(&data_dir).map_err(|e| MathError::storage(&data_dir, e))?;
        }

        Ok(Self { data_dir })
    }

    /// Directory backing this store.
    pub fn dir(&self) -> &PathBuf {
        &self.data_dir
    }

    /// Keys become file names, so path separators and dot-files are refused.
    fn check_key(key: &str) -> Result<()> {
        if key.is_empty() || key.starts_with('.') || key.contains(['/', '\\']) {
            return Err(MathError::invalid_input(format!(
                "storage key '{}' is not a valid file name",
                key
            )));
        }
        Ok(())
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", key))
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!(".{}.json.tmp", key))
    }

    /// Write a value atomically using temp file + rename.
    fn atomic_write(&self, key: &str, value: &Value) -> Result<()> {
        let final_path = self.key_path(key);
        let temp_path = self.temp_path(key);

        let json = serde_json::to_string_pretty(value)?;

        {
            let mut file =
                fs::File::create(&temp_path).map_err(|e| MathError::storage(&temp_path, e))?;
            file.write_all(json.as_bytes())
                .map_err(|e| MathError::storage(&temp_path, e))?;
            file.sync_all()
                .map_err(|e| MathError::storage(&temp_path, e))?;
        }

        // Rename temp file to final path (atomic on POSIX)
        fs::rename(&temp_path, &final_path).map_err(|e| MathError::storage(&final_path, e))?;

        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Self::check_key(key)?;
        let path = self.key_path(key);

        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).map_err(|e| MathError::storage(&path, e))?;
        let value: Value = serde_json::from_str(&content)?;

        Ok(Some(value))
    }

    fn put(&self, key: &str, value: &Value) -> Result<()> {
        Self::check_key(key)?;
        self.atomic_write(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        Self::check_key(key)?;
        let path = self.key_path(key);

        if path.exists() {
            fs::remove_file(&path).map_err(|e| MathError::storage(&path, e))?;
        }

        // Also clean up any temp file
        let temp_path = self.temp_path(key);
        if temp_path.exists() {
            let _ = fs::remove_file(&temp_path);
        }

        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        if !self.data_dir.exists() {
            return Ok(Vec::new());
        }

        let entries =
            fs::read_dir(&self.data_dir).map_err(|e| MathError::storage(&self.data_dir, e))?;

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| MathError::storage(&self.data_dir, e))?;
            let path = entry.path();

            // Skip non-JSON files and temp files
            if path.extension().map(|e| e != "json").unwrap_or(true) {
                continue;
            }
            let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
                continue;
            };
            if stem.starts_with('.') {
                continue;
            }
            keys.push(stem);
        }

        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::traits::tests::test_key_value_store_crud;
    use serde_json::json;
    use serial_test::serial;
    use tempfile::TempDir;

    fn create_test_store() -> (FileStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = FileStore::with_dir(dir.path()).unwrap();
        (store, dir)
    }

    #[test]
    fn test_file_store_crud() {
        let (store, _dir) = create_test_store();
        test_key_value_store_crud(&store);
    }

    #[test]
    fn test_with_dir_creates_directory() {
        let dir = TempDir::new().unwrap();
        let data_path = dir.path().join("nested").join("data");

        assert!(!data_path.exists());
        let store = FileStore::with_dir(&data_path).unwrap();
        assert!(data_path.exists());
        assert_eq!(store.dir(), &data_path);
    }

    #[test]
    fn test_put_writes_pretty_json_file() {
        let (store, dir) = create_test_store();
        store.put("badges", &json!({"lea": ["first_exercise"]})).unwrap();

        let path = dir.path().join("badges.json");
        assert!(path.exists());
        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains("first_exercise"));

        // No temp file left behind
        assert!(!dir.path().join(".badges.json.tmp").exists());
    }

    #[test]
    fn test_keys_skips_temp_and_foreign_files() {
        let (store, dir) = create_test_store();
        store.put("sessions", &json!([])).unwrap();
        fs::write(dir.path().join(".children.json.tmp"), "{").unwrap();
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();

        assert_eq!(store.keys().unwrap(), vec!["sessions".to_string()]);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let (store, dir) = create_test_store();
        fs::write(dir.path().join("progressions.json"), "{not json").unwrap();

        assert!(matches!(
            store.get("progressions"),
            Err(MathError::Serde { .. })
        ));
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let (store, _dir) = create_test_store();
        assert!(store.put("../escape", &json!(1)).is_err());
        assert!(store.get(".hidden").is_err());
        assert!(store.remove("").is_err());
    }

    #[test]
    fn test_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        FileStore::with_dir(dir.path())
            .unwrap()
            .put("children", &json!([{"id": "lea"}]))
            .unwrap();

        let reopened = FileStore::with_dir(dir.path()).unwrap();
        assert_eq!(
            reopened.get("children").unwrap(),
            Some(json!([{"id": "lea"}]))
        );
    }

    #[test]
    #[serial]
    fn test_new_uses_home_data_dir() {
        let dir = TempDir::new().unwrap();
        std::env::set_var("MATHCE1_HOME", dir.path());

        let store = FileStore::new().unwrap();
        assert_eq!(store.dir(), &dir.path().join("data"));
        assert!(dir.path().join("data").exists());

        std::env::remove_var("MATHCE1_HOME");
    }
}
