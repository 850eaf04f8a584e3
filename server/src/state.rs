use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use archiver_service_cli::error::ArchiveError;
use archiver_service_cli::ArchiveConfig;
use dashmap::DashMap;
use uuid::Uuid;

use crate::models::keys::{KeyPayload, SavedKey, StoredKey};

/// Shared application state: the in-memory key-alias store plus the
/// pipeline configuration and the directory produced archives land in.
#[derive(Clone)]
pub struct AppState {
    pub keys: Arc<DashMap<String, StoredKey>>,
    pub config: ArchiveConfig,
    pub output_dir: PathBuf,
}

impl AppState {
    pub fn new(config: ArchiveConfig, output_dir: PathBuf) -> Self {
        AppState {
            keys: Arc::new(DashMap::new()),
            config,
            output_dir,
        }
    }

    pub fn list_keys(&self) -> Vec<SavedKey> {
        let mut keys: Vec<SavedKey> = self
            .keys
            .iter()
            .map(|entry| SavedKey {
                id: entry.key().clone(),
                alias: entry.value().alias.clone(),
                masked: crate::models::keys::mask_secret(&entry.value().secret),
            })
            .collect();
        keys.sort_by(|a, b| a.alias.cmp(&b.alias));
        keys
    }

    pub fn save_key(&self, alias: String, secret: String) -> SavedKey {
        let id = Uuid::new_v4().to_string();
        let masked = crate::models::keys::mask_secret(&secret);
        self.keys.insert(id.clone(), StoredKey { alias: alias.clone(), secret });
        SavedKey { id, alias, masked }
    }

    pub fn delete_key(&self, id: &str) -> bool {
        self.keys.remove(id).is_some()
    }

    /// Resolves the Gemini key for one request: a saved key by id, a freshly
    /// supplied one (saved when an alias accompanies it), or the `API_KEY`
    /// environment variable as a last resort.
    pub fn resolve_api_key(&self, payload: Option<&KeyPayload>) -> Result<String, ArchiveError> {
        if let Some(payload) = payload {
            match payload.mode.as_str() {
                "saved" => {
                    if let Some(id) = &payload.id {
                        if let Some(stored) = self.keys.get(id) {
                            return Ok(stored.secret.clone());
                        }
                    }
                }
                "new" => {
                    if let Some(key) = payload.key.as_deref().filter(|k| !k.trim().is_empty()) {
                        if let Some(alias) =
                            payload.alias.as_deref().filter(|a| !a.trim().is_empty())
                        {
                            self.save_key(alias.to_string(), key.to_string());
                        }
                        return Ok(key.to_string());
                    }
                }
                _ => {}
            }
        }
        env::var("API_KEY").map_err(|_| ArchiveError::MissingApiKey)
    }
}
