//! Persistent state store: a key-value mirror of in-memory state so a
//! page reload can restore the last session.
//!
//! The backend is abstract (`web_sys::Storage` in the browser, a hash map
//! in tests). Every write is best-effort: quota overflows and
//! serialization failures are logged and skipped, and the in-memory copy
//! stays authoritative for the session. Corrupt entries restore as empty
//! defaults, never as errors.

use std::cell::RefCell;
use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::AppData;
use crate::error::PrepError;
use crate::models::{CreatedFeature, Row, UploadResponse, VariableChanges};

/// Storage keys. String keys with JSON values, matching the shipped
/// browser sessions so an existing localStorage carries over.
pub mod keys {
    pub const ALL_DATA: &str = "allData";
    pub const ALL_COLUMNS: &str = "allColumns";
    pub const VARIABLE_CHANGES: &str = "variableChanges";
    pub const CREATED_FEATURES: &str = "createdFeatures";
    pub const DATA_MODIFIED: &str = "dataModified";
    pub const UPLOADED_DATA: &str = "uploadedData";
    pub const IMAGE_DATA: &str = "imageData";
    pub const IMAGE_LABELS: &str = "imageLabels";
    pub const IMAGE_METADATA: &str = "imageMetadata";
    pub const SELECTED_MODEL_TYPE: &str = "selectedModelType";
    pub const TIME_SERIES_DATA: &str = "timeSeriesData";
}

/// Practical per-entry cap. Browsers allow ~5 MB per origin; a dataset
/// entry above this is kept in memory only.
pub const MAX_ENTRY_BYTES: usize = 5 * 1024 * 1024;

/// Minimal key-value contract the store runs on.
pub trait StorageBackend {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), PrepError>;
    fn remove(&self, key: &str);
}

/// In-memory backend for tests and storage-less environments.
#[derive(Default)]
pub struct MemoryBackend {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PrepError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.entries.borrow_mut().remove(key);
    }
}

/// Typed wrapper over a backend.
pub struct StateStore<B> {
    backend: B,
}

impl<B: StorageBackend> StateStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Persist a value as JSON. Failures (serialization, size cap, quota)
    /// are logged and swallowed; the caller's operation proceeds.
    pub fn save_json<T: Serialize>(&self, key: &str, value: &T) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(err) => {
                log::warn!("not persisting {key}: {err}");
                return;
            }
        };
        if json.len() > MAX_ENTRY_BYTES {
            log::warn!(
                "not persisting {key}: {} bytes exceeds the {} byte cap",
                json.len(),
                MAX_ENTRY_BYTES
            );
            return;
        }
        if let Err(err) = self.backend.set(key, &json) {
            log::warn!("not persisting {key}: {err}");
        }
    }

    /// Restore a value, degrading corrupt or absent entries to the type's
    /// default shape.
    pub fn restore_json<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        self.restore_opt(key).unwrap_or_default()
    }

    /// Restore a value, with `None` for both absent and corrupt entries.
    pub fn restore_opt<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.backend.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                log::error!("corrupt entry for {key}, using default: {err}");
                None
            }
        }
    }

    pub fn save_string(&self, key: &str, value: &str) {
        if let Err(err) = self.backend.set(key, value) {
            log::warn!("not persisting {key}: {err}");
        }
    }

    pub fn restore_string(&self, key: &str) -> Option<String> {
        self.backend.get(key)
    }

    pub fn remove(&self, key: &str) {
        self.backend.remove(key);
    }

    /// Persist the dataset-derived portion of the cache (opportunistic,
    /// size-bounded).
    pub fn persist_dataset(&self, data: &AppData) {
        self.save_json(keys::ALL_DATA, &data.rows);
        self.save_json(keys::ALL_COLUMNS, &data.columns);
        self.save_json(keys::VARIABLE_CHANGES, &data.variable_changes);
        self.save_json(keys::CREATED_FEATURES, &data.created_features);
        self.save_string(keys::DATA_MODIFIED, if data.data_modified { "true" } else { "false" });
        if let Some(upload) = &data.upload {
            self.save_json(keys::UPLOADED_DATA, upload);
        }
        if let Some(model_type) = &data.selected_model_type {
            self.save_string(keys::SELECTED_MODEL_TYPE, model_type);
        }
    }

    /// Rebuild the cache from storage.
    ///
    /// Restoration order matters: columns before rows before derived
    /// features before the upload descriptor — feature replay needs the
    /// column list in place, and descriptor restoration decides whether
    /// the non-tabular session keys are consulted at all.
    pub fn restore_app_data(&self) -> AppData {
        let mut data = AppData::default();

        data.columns = self.restore_json::<Vec<String>>(keys::ALL_COLUMNS);
        data.rows = self.restore_json::<Vec<Row>>(keys::ALL_DATA);
        data.data_modified = self.restore_string(keys::DATA_MODIFIED).as_deref() == Some("true");
        data.variable_changes = self.restore_json::<VariableChanges>(keys::VARIABLE_CHANGES);
        data.created_features = self.restore_json::<Vec<CreatedFeature>>(keys::CREATED_FEATURES);

        if let Some(upload) = self.restore_opt::<UploadResponse>(keys::UPLOADED_DATA) {
            if !upload.selected_model_type.is_empty() {
                data.selected_model_type = Some(upload.selected_model_type.clone());
            }
            if !upload.selected_model_action.is_empty() {
                data.selected_model_action = Some(upload.selected_model_action.clone());
            }
            data.upload = Some(upload);
        }
        if let Some(selected) = self.restore_string(keys::SELECTED_MODEL_TYPE) {
            data.selected_model_type = Some(selected);
        }

        data.total_rows = data.rows.len();
        data.total_cols = data.columns.len();
        data
    }

    /// The restored descriptor points at an image archive, so the image
    /// session keys are worth restoring too.
    pub fn restored_session_is_imaging(&self, data: &AppData) -> bool {
        data.upload
            .as_ref()
            .is_some_and(|u| u.model_type() == "imaging" || u.detected_type == "imaging")
    }

    /// Clear every dataset key for "start new upload". The selected model
    /// type survives so navigation stays rendered for it.
    pub fn clear_dataset_keys(&self) {
        for key in [
            keys::UPLOADED_DATA,
            keys::ALL_DATA,
            keys::ALL_COLUMNS,
            keys::VARIABLE_CHANGES,
            keys::CREATED_FEATURES,
            keys::DATA_MODIFIED,
            keys::TIME_SERIES_DATA,
            keys::IMAGE_DATA,
            keys::IMAGE_LABELS,
            keys::IMAGE_METADATA,
        ] {
            self.backend.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> StateStore<MemoryBackend> {
        StateStore::new(MemoryBackend::new())
    }

    #[test]
    fn dataset_round_trips_through_storage() {
        let store = store();
        let mut data = AppData::default();
        data.upload = Some(UploadResponse {
            file_ids: vec!["f1".into()],
            selected_model_type: "ehr".into(),
            ..Default::default()
        });
        data.replace_dataset(
            vec![
                serde_json::from_value(json!({"name": "a", "score": 1})).unwrap(),
                serde_json::from_value(json!({"name": "b", "score": 2})).unwrap(),
                serde_json::from_value(json!({"name": "c", "score": 3})).unwrap(),
            ],
            vec!["name".into(), "score".into()],
            None,
        );
        store.persist_dataset(&data);

        // Simulated reload: a fresh restore from the same backend.
        let restored = store.restore_app_data();
        assert_eq!(restored.rows, data.rows);
        assert_eq!(restored.columns, data.columns);
        assert_eq!(restored.upload, data.upload);
        assert_eq!(restored.selected_model_type.as_deref(), Some("ehr"));
        assert!(restored.has_dataset());
    }

    #[test]
    fn corrupt_entries_restore_as_defaults() {
        let store = store();
        store.backend.set(keys::ALL_DATA, "{not json").unwrap();
        store.backend.set(keys::ALL_COLUMNS, "42").unwrap();
        let data = store.restore_app_data();
        assert!(data.rows.is_empty());
        assert!(data.columns.is_empty());
    }

    #[test]
    fn oversized_entries_are_skipped() {
        let store = store();
        let huge = vec!["x".repeat(1024); 6 * 1024];
        store.save_json(keys::ALL_DATA, &huge);
        assert!(store.backend.get(keys::ALL_DATA).is_none());
    }

    #[test]
    fn clear_preserves_selected_model_type() {
        let store = store();
        store.save_string(keys::SELECTED_MODEL_TYPE, "time_series");
        store.save_json(keys::ALL_COLUMNS, &vec!["a".to_string()]);
        store.clear_dataset_keys();
        assert!(store.restore_string(keys::SELECTED_MODEL_TYPE).is_some());
        assert!(store.backend.get(keys::ALL_COLUMNS).is_none());
    }

    #[test]
    fn features_replay_after_restore() {
        let store = store();
        let mut data = AppData::default();
        data.replace_dataset(
            vec![serde_json::from_value(json!({"score": 9})).unwrap()],
            vec!["score".into()],
            None,
        );
        data.add_feature(CreatedFeature::RuleBased {
            variable: "score".into(),
            operator: crate::models::CompareOp::Gt,
            value: 5.0,
            feature_name: "high".into(),
        });
        store.persist_dataset(&data);

        let mut restored = store.restore_app_data();
        // A later full fetch carries only backend columns; replay restores
        // the engineered one.
        let ticket = restored.begin_full_fetch("f1").unwrap();
        restored.finish_full_fetch(
            ticket,
            vec![serde_json::from_value(json!({"score": 2})).unwrap()],
            vec!["score".into()],
            None,
        );
        assert!(restored.columns.contains(&"high".to_string()));
        assert_eq!(restored.rows[0]["high"], json!(0));
    }
}
