//! Key/value persistence for user preferences.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("storage document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage document is not a JSON object")]
    NotAnObject,
}

/// String key/value store that survives restarts.
pub trait PreferenceStorage: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// A JSON object on disk, one entry per key.
///
/// A missing file reads as empty and is created on first write. A file that
/// is not a JSON object fails reads but is replaced by the next write.
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
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        if text.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str(&text)? {
            Value::Object(map) => Ok(map),
            _ => Err(StorageError::NotAnObject),
        }
    }
}

impl PreferenceStorage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let map = self.load()?;
        Ok(map.get(key).and_then(Value::as_str).map(str::to_string))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = match self.load() {
            Ok(map) => map,
            Err(StorageError::Io(err)) => return Err(err.into()),
            Err(err) => {
                tracing::warn!(name: "preferences.storage.reset", path = %self.path.display(), error = %err, "Replacing unreadable preferences file");
                Map::new()
            }
        };
        map.insert(key.to_string(), Value::String(value.to_string()));

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&Value::Object(map))?)?;
        Ok(())
    }
}

/// In-process storage; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated with one entry.
    pub fn with_entry(key: &str, value: &str) -> Self {
        let storage = Self::default();
        storage
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        storage
    }
}

impl PreferenceStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_storage_roundtrip_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested").join("prefs.json"));

        assert_eq!(storage.read("finance-app-theme").unwrap(), None);

        storage.write("finance-app-theme", "dark").unwrap();
        storage.write("other", "value").unwrap();

        let reopened = FileStorage::new(storage.path());
        assert_eq!(
            reopened.read("finance-app-theme").unwrap().as_deref(),
            Some("dark")
        );
        assert_eq!(reopened.read("other").unwrap().as_deref(), Some("value"));
    }

    #[test]
    fn test_file_storage_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        let storage = FileStorage::new(&path);
        assert!(matches!(
            storage.read("finance-app-theme"),
            Err(StorageError::NotAnObject)
        ));

        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            storage.read("finance-app-theme"),
            Err(StorageError::Json(_))
        ));
    }

    #[test]
    fn test_write_replaces_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        for garbage in ["{not json", "[1, 2, 3]"] {
            fs::write(&path, garbage).unwrap();

            let storage = FileStorage::new(&path);
            storage.write("finance-app-theme", "dark").unwrap();

            let reopened = FileStorage::new(&path);
            assert_eq!(
                reopened.read("finance-app-theme").unwrap().as_deref(),
                Some("dark")
            );
        }
    }

    #[test]
    fn test_memory_storage() {
        let storage = MemoryStorage::with_entry("k", "v");
        assert_eq!(storage.read("k").unwrap().as_deref(), Some("v"));
        storage.write("k", "w").unwrap();
        assert_eq!(storage.read("k").unwrap().as_deref(), Some("w"));
        assert_eq!(storage.read("missing").unwrap(), None);
    }
}
