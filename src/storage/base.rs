use std::sync::Arc;

use tracing::{info, warn};

use super::{file_storage::FileStorage, memory_storage::MemoryStorage};
use crate::config::{StorageBackend, StorageConfig};

/// Fixed keys shared with the web frontend's local storage layout.
pub mod keys {
    /// Serialized session blob: `{ "state": { "tokens": { "access_token": ... } } }`.
    pub const SESSION: &str = "auth-storage";
    pub const REFRESH_TOKEN: &str = "refreshToken";
    /// Last resolved tenant descriptor.
    pub const TENANT: &str = "tenant-config";
    /// Path to return to once the user has logged in again.
    pub const REDIRECT_AFTER_LOGIN: &str = "redirectAfterLogin";
}

/// The Storage trait abstracts client-side key/value persistence.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, String>;
    fn set(&self, key: &str, value: &str) -> Result<(), String>;
    fn remove(&self, key: &str) -> Result<(), String>;
    fn is_persistent(&self) -> bool {
        // Memory storage overrides this so logs can say nothing survives a restart
        true
    }
}

/// Creates a concrete storage implementation based on the StorageConfig.
/// If `storage.enabled = false`, returns MemoryStorage. Otherwise, picks the specified backend.
pub fn create_storage(config: &StorageConfig) -> Result<Arc<dyn Storage>, String> {
    if !config.enabled {
        info!("Persistent storage is disabled. Using MemoryStorage.");
        return Ok(Arc::new(MemoryStorage::new()));
    }

    match &config.backend {
        Some(StorageBackend::File(file_config)) => {
            let storage = FileStorage::open(&file_config.path)?;
            info!("Using file storage at '{}'.", file_config.path);
            Ok(Arc::new(storage))
        }
        Some(StorageBackend::Memory) => Ok(Arc::new(MemoryStorage::new())),
        None => {
            warn!("Storage is enabled, but no backend config is provided! Using MemoryStorage.");
            Ok(Arc::new(MemoryStorage::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FileStorageConfig;

    #[test]
    fn test_disabled_storage_is_memory() {
        let storage = create_storage(&StorageConfig::default()).unwrap();
        assert!(!storage.is_persistent());
    }

    #[test]
    fn test_file_backend_is_persistent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let config = StorageConfig {
            enabled: true,
            backend: Some(StorageBackend::File(FileStorageConfig {
                path: path.to_string_lossy().into_owned(),
            })),
        };
        let storage = create_storage(&config).unwrap();
        assert!(storage.is_persistent());
    }
}
