//! Local design persistence.
//!
//! Designs are stored under `<prefix><id>` with an index of known ids under
//! `<prefix>index`. Storage failures are logged and swallowed: saving must
//! never interrupt editing.

use printkit_settings::{KeyValueStore, PersistenceResult, StorageSettings};
use std::sync::Arc;

use crate::model::Document;
use crate::serialization::{export_json, parse_document};

/// Key prefix used when none is configured
pub const DEFAULT_KEY_PREFIX: &str = "printkit_design_";

/// Document store over any [`KeyValueStore`]
#[derive(Clone)]
pub struct LocalDesignStore {
    store: Arc<dyn KeyValueStore>,
    prefix: String,
}

impl LocalDesignStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_prefix(store, DEFAULT_KEY_PREFIX)
    }

    pub fn with_prefix(store: Arc<dyn KeyValueStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    /// Store backed by a [`printkit_settings::FileStore`] in the configured
    /// directory
    pub fn from_settings(settings: &StorageSettings) -> Self {
        Self::with_prefix(
            Arc::new(printkit_settings::FileStore::new(&settings.directory)),
            settings.key_prefix.clone(),
        )
    }

    fn design_key(&self, id: &str) -> String {
        format!("{}{}", self.prefix, id)
    }

    fn index_key(&self) -> String {
        format!("{}index", self.prefix)
    }

    /// Save a document and register its id. Returns false on failure.
    pub fn save_local(&self, document: &Document) -> bool {
        match self.try_save(document) {
            Ok(()) => {
                tracing::debug!("Saved design {} locally", document.id);
                true
            }
            Err(err) => {
                tracing::warn!("Local save of design {} failed: {}", document.id, err);
                false
            }
        }
    }

    fn try_save(&self, document: &Document) -> anyhow::Result<()> {
        let json = export_json(document)?;
        self.store.set(&self.design_key(&document.id), &json)?;

        let mut index = self.read_index()?;
        if !index.contains(&document.id) {
            index.push(document.id.clone());
            self.write_index(&index)?;
        }
        Ok(())
    }

    /// Load a stored document, `None` when absent or unreadable
    pub fn load_local(&self, id: &str) -> Option<Document> {
        let raw = match self.store.get(&self.design_key(id)) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!("Local load of design {} failed: {}", id, err);
                return None;
            }
        };
        match parse_document(&raw) {
            Ok(document) => Some(document),
            Err(err) => {
                tracing::warn!("Stored design {} is unreadable: {}", id, err);
                None
            }
        }
    }

    /// Ids of locally saved designs, in save order
    pub fn list_local(&self) -> Vec<String> {
        self.read_index().unwrap_or_else(|err| {
            tracing::warn!("Design index unavailable: {}", err);
            Vec::new()
        })
    }

    /// Delete a stored design and drop it from the index
    pub fn delete_local(&self, id: &str) -> bool {
        let result = self.store.remove(&self.design_key(id)).and_then(|()| {
            let index: Vec<String> = self.list_local().into_iter().filter(|i| i != id).collect();
            self.write_index(&index)
        });
        match result {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!("Local delete of design {} failed: {}", id, err);
                false
            }
        }
    }

    fn read_index(&self) -> anyhow::Result<Vec<String>> {
        match self.store.get(&self.index_key())? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    fn write_index(&self, index: &[String]) -> PersistenceResult<()> {
        // A Vec<String> always serializes
        let raw = serde_json::to_string(index).unwrap_or_else(|_| "[]".to_string());
        self.store.set(&self.index_key(), &raw)
    }
}

impl std::fmt::Debug for LocalDesignStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalDesignStore")
            .field("prefix", &self.prefix)
            .finish()
    }
}
