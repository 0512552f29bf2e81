use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use super::Storage;

/// All keys in one JSON object on disk. Every write rewrites the file.
pub struct FileStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileStorage {
    /// Opens (or creates) the storage file, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| format!("Failed to create '{}': {}", parent.display(), e))?;
            }
        }
        let storage = FileStorage {
            path,
            lock: Mutex::new(()),
        };
        // Fail early on a corrupt file rather than on the first request.
        storage.read_all()?;
        Ok(storage)
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, String> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = fs::read_to_string(&self.path)
            .map_err(|e| format!("Failed to read '{}': {}", self.path.display(), e))?;
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw)
            .map_err(|e| format!("Corrupt storage file '{}': {}", self.path.display(), e))
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), String> {
        let serialized = serde_json::to_string_pretty(entries).map_err(|e| e.to_string())?;
        fs::write(&self.path, serialized)
            .map_err(|e| format!("Failed to write '{}': {}", self.path.display(), e))
    }

    fn update<F>(&self, f: F) -> Result<(), String>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self.lock.lock().map_err(|e| e.to_string())?;
        let mut entries = self.read_all()?;
        f(&mut entries);
        self.write_all(&entries)
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, String> {
        let _guard = self.lock.lock().map_err(|e| e.to_string())?;
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), String> {
        debug!("Persisting key '{}' to '{}'", key, self.path.display());
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), String> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}
