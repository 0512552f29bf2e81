use std::sync::{Arc, PoisonError, RwLock};

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::models::credential::{is_usable_token, Credential};
use crate::storage::{keys, Storage};

/// Holds the one active credential. Reads fall back to the persisted
/// session blob when nothing is in memory (e.g. right after a restart).
pub struct CredentialStore {
    current: RwLock<Option<Credential>>,
    storage: Arc<dyn Storage>,
}

impl CredentialStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        CredentialStore {
            current: RwLock::new(None),
            storage,
        }
    }

    /// The access token to send, if any usable one exists.
    pub fn access_token(&self) -> Option<String> {
        let in_memory = self
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|c| c.access_token.clone());

        in_memory
            .or_else(|| self.persisted_token("access_token"))
            .filter(|t| is_usable_token(t))
    }

    /// The token used to obtain a new access token.
    pub fn refresh_token(&self) -> Option<String> {
        let in_memory = self
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(|c| c.refresh_token.clone());

        in_memory
            .or_else(|| self.persisted_token("refresh_token"))
            .or_else(|| self.read_key(keys::REFRESH_TOKEN))
            .filter(|t| is_usable_token(t))
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }

    /// Replace the active credential, in memory and in storage.
    pub fn set(&self, credential: Credential) {
        let blob = json!({
            "state": {
                "tokens": {
                    "access_token": credential.access_token,
                    "refresh_token": credential.refresh_token,
                }
            },
            "version": 0
        });
        if let Err(e) = self.storage.set(keys::SESSION, &blob.to_string()) {
            warn!("Failed to persist session: {}", e);
        }
        if let Some(refresh_token) = &credential.refresh_token {
            if let Err(e) = self.storage.set(keys::REFRESH_TOKEN, refresh_token) {
                warn!("Failed to persist refresh token: {}", e);
            }
        }
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(credential);
        debug!("Stored new credential");
    }

    /// Forget every credential, in memory and in storage.
    pub fn clear(&self) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
        for key in [keys::SESSION, keys::REFRESH_TOKEN] {
            if let Err(e) = self.storage.remove(key) {
                warn!("Failed to remove '{}' from storage: {}", key, e);
            }
        }
        debug!("Cleared stored credentials");
    }

    fn read_key(&self, key: &str) -> Option<String> {
        match self.storage.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to read '{}' from storage: {}", key, e);
                None
            }
        }
    }

    fn persisted_token(&self, field: &str) -> Option<String> {
        let raw = self.read_key(keys::SESSION)?;
        let blob: Value = match serde_json::from_str(&raw) {
            Ok(v) => v,
            Err(e) => {
                warn!("Ignoring unreadable session blob: {}", e);
                return None;
            }
        };
        blob.pointer(&format!("/state/tokens/{}", field))
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}
