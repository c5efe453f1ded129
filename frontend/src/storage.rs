//! localStorage-backed implementation of the core store contract.

use preplab_core::error::PrepError;
use preplab_core::{AppData, StateStore, StorageBackend};

/// `web_sys::Storage` behind the core trait. `storage` is `None` when the
/// browser denies access (private mode, sandboxed iframe); every
/// operation then degrades to the in-memory-only behaviour the store
/// contract already requires.
pub struct LocalStorageBackend {
    storage: Option<web_sys::Storage>,
}

impl LocalStorageBackend {
    pub fn new() -> Self {
        let storage = web_sys::window().and_then(|w| w.local_storage().ok().flatten());
        if storage.is_none() {
            log::warn!("localStorage unavailable; session will not survive a reload");
        }
        Self { storage }
    }
}

impl StorageBackend for LocalStorageBackend {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.as_ref()?.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PrepError> {
        let Some(storage) = self.storage.as_ref() else {
            return Err(PrepError::Storage("localStorage unavailable".into()));
        };
        storage
            .set_item(key, value)
            .map_err(|_| PrepError::Storage("quota exceeded".into()))
    }

    fn remove(&self, key: &str) {
        if let Some(storage) = self.storage.as_ref() {
            let _ = storage.remove_item(key);
        }
    }
}

pub fn store() -> StateStore<LocalStorageBackend> {
    StateStore::new(LocalStorageBackend::new())
}

/// Opportunistic persistence of the dataset-derived state.
pub fn persist_dataset(data: &AppData) {
    store().persist_dataset(data);
}
