//! The in-memory data cache: resident rows, tracked totals, the upload
//! descriptor, and the coalescing/staleness bookkeeping for background
//! full-dataset fetches.

use serde::{Deserialize, Serialize};

use crate::features::replay_features;
use crate::models::{CreatedFeature, Row, UploadResponse, VariableChanges};

/// Handle for one background full-dataset fetch.
///
/// Issued by [`AppData::begin_full_fetch`] and redeemed by
/// [`AppData::finish_full_fetch`]. The embedded generation makes a fetch
/// result stale the moment the cache is reset, so data resolved after a
/// "start new upload" is dropped instead of resurrecting the old session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    file_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct FullFetchState {
    generation: u64,
    in_flight: Option<String>,
    loaded_for: Option<String>,
}

/// Single application state object: every component reads and mutates the
/// dataset through this rather than ambient globals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppData {
    pub rows: Vec<Row>,
    pub columns: Vec<String>,
    /// Size of the full dataset, which may exceed `rows.len()` while only
    /// a preview is resident. Pagination math uses this.
    pub total_rows: usize,
    pub total_cols: usize,
    pub upload: Option<UploadResponse>,
    pub selected_model_type: Option<String>,
    pub selected_model_action: Option<String>,
    pub variable_changes: VariableChanges,
    pub created_features: Vec<CreatedFeature>,
    pub data_modified: bool,
    fetch: FullFetchState,
}

impl AppData {
    /// Shared availability rule for every non-upload step: a descriptor
    /// with at least one backend file reference AND at least one resident
    /// row.
    pub fn has_dataset(&self) -> bool {
        let has_upload = self
            .upload
            .as_ref()
            .is_some_and(|u| !u.file_ids.is_empty());
        has_upload && !self.rows.is_empty()
    }

    /// Row count to display and paginate against: the tracked total when
    /// it exceeds the resident preview.
    pub fn display_total_rows(&self) -> usize {
        self.total_rows.max(self.rows.len())
    }

    pub fn display_total_cols(&self) -> usize {
        self.total_cols.max(self.columns.len())
    }

    /// Install a freshly loaded dataset and replay derived features over
    /// it. `shape` is the backend's `[rows, cols]` for the full dataset.
    pub fn replace_dataset(
        &mut self,
        rows: Vec<Row>,
        columns: Vec<String>,
        shape: Option<[usize; 2]>,
    ) {
        self.rows = rows;
        self.columns = columns;
        let [r, c] = shape.unwrap_or([self.rows.len(), self.columns.len()]);
        self.total_rows = r.max(self.rows.len());
        self.total_cols = c;
        replay_features(&mut self.rows, &mut self.columns, &self.created_features);
        self.total_cols = self.total_cols.max(self.columns.len());
    }

    /// Record a new feature and compute its column immediately.
    pub fn add_feature(&mut self, feature: CreatedFeature) {
        crate::features::apply_feature(&mut self.rows, &mut self.columns, &feature);
        self.created_features.push(feature);
        self.total_cols = self.total_cols.max(self.columns.len());
        self.data_modified = true;
    }

    /// Begin a background full fetch for `file_id`.
    ///
    /// Returns `None` when a fetch for the same file is already in flight
    /// (the caller joins the in-flight result instead of issuing a second
    /// request) or when that file's full dataset is already resident
    /// (repeating the fetch is a no-op).
    pub fn begin_full_fetch(&mut self, file_id: &str) -> Option<FetchTicket> {
        if self.fetch.loaded_for.as_deref() == Some(file_id)
            || self.fetch.in_flight.as_deref() == Some(file_id)
        {
            return None;
        }
        self.fetch.in_flight = Some(file_id.to_string());
        Some(FetchTicket {
            generation: self.fetch.generation,
            file_id: file_id.to_string(),
        })
    }

    /// Apply the rows resolved for `ticket`. Returns `false` (without
    /// touching the cache) when the cache was reset after the ticket was
    /// issued — the fetch result is stale and must be discarded.
    pub fn finish_full_fetch(
        &mut self,
        ticket: FetchTicket,
        rows: Vec<Row>,
        columns: Vec<String>,
        shape: Option<[usize; 2]>,
    ) -> bool {
        if self.fetch.in_flight.as_deref() == Some(ticket.file_id.as_str()) {
            self.fetch.in_flight = None;
        }
        if ticket.generation != self.fetch.generation {
            log::info!("discarding stale full-dataset fetch for {}", ticket.file_id);
            return false;
        }
        self.replace_dataset(rows, columns, shape);
        self.fetch.loaded_for = Some(ticket.file_id);
        true
    }

    /// Release the in-flight slot after a failed fetch so a retry can run.
    pub fn abort_full_fetch(&mut self, ticket: &FetchTicket) {
        if self.fetch.in_flight.as_deref() == Some(ticket.file_id.as_str()) {
            self.fetch.in_flight = None;
        }
    }

    pub fn full_dataset_loaded(&self) -> bool {
        self.fetch.loaded_for.is_some()
    }

    /// Wholesale reset for "start new upload". Clears every
    /// dataset-derived field, invalidates in-flight fetches, and keeps the
    /// selected model type (navigation stays rendered for it).
    pub fn reset(&mut self) {
        let keep_type = self.selected_model_type.take();
        let generation = self.fetch.generation + 1;
        *self = AppData {
            selected_model_type: keep_type,
            fetch: FullFetchState {
                generation,
                ..Default::default()
            },
            ..Default::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_rows(n: usize) -> Vec<Row> {
        (0..n)
            .map(|i| serde_json::from_value(json!({"x": i})).unwrap())
            .collect()
    }

    fn uploaded() -> UploadResponse {
        UploadResponse {
            file_ids: vec!["f1".into()],
            selected_model_type: "ehr".into(),
            ..Default::default()
        }
    }

    #[test]
    fn dataset_requires_upload_and_rows() {
        let mut data = AppData::default();
        assert!(!data.has_dataset());

        data.upload = Some(uploaded());
        assert!(!data.has_dataset());

        data.replace_dataset(sample_rows(3), vec!["x".into()], None);
        assert!(data.has_dataset());

        data.rows.clear();
        assert!(!data.has_dataset());
    }

    #[test]
    fn tracked_total_wins_over_resident_preview() {
        let mut data = AppData::default();
        data.replace_dataset(sample_rows(10), vec!["x".into()], Some([5000, 1]));
        assert_eq!(data.display_total_rows(), 5000);
        assert_eq!(data.rows.len(), 10);
    }

    #[test]
    fn concurrent_full_fetches_coalesce_to_one_ticket() {
        let mut data = AppData::default();
        let first = data.begin_full_fetch("f1");
        assert!(first.is_some());
        // Second caller while the first is in flight: no second request.
        assert!(data.begin_full_fetch("f1").is_none());

        let ok = data.finish_full_fetch(first.unwrap(), sample_rows(4), vec!["x".into()], None);
        assert!(ok);
        // Re-fetching an already-loaded file is a no-op.
        assert!(data.begin_full_fetch("f1").is_none());
        assert!(data.full_dataset_loaded());
    }

    #[test]
    fn failed_fetch_releases_the_slot() {
        let mut data = AppData::default();
        let ticket = data.begin_full_fetch("f1").unwrap();
        data.abort_full_fetch(&ticket);
        assert!(data.begin_full_fetch("f1").is_some());
    }

    #[test]
    fn reset_invalidates_in_flight_fetch() {
        let mut data = AppData::default();
        data.upload = Some(uploaded());
        let ticket = data.begin_full_fetch("f1").unwrap();

        data.reset();
        let applied = data.finish_full_fetch(ticket, sample_rows(9), vec!["x".into()], None);
        assert!(!applied, "stale fetch must not repopulate a reset cache");
        assert!(data.rows.is_empty());
        assert!(data.upload.is_none());
    }

    #[test]
    fn reset_keeps_selected_model_type() {
        let mut data = AppData::default();
        data.selected_model_type = Some("time_series".into());
        data.replace_dataset(sample_rows(2), vec!["x".into()], None);
        data.reset();
        assert_eq!(data.selected_model_type.as_deref(), Some("time_series"));
        assert_eq!(data.total_rows, 0);
    }

    #[test]
    fn full_fetch_replays_features_and_tracks_shape() {
        let mut data = AppData::default();
        data.created_features.push(CreatedFeature::RuleBased {
            variable: "x".into(),
            operator: crate::models::CompareOp::Ge,
            value: 2.0,
            feature_name: "big".into(),
        });
        let ticket = data.begin_full_fetch("f1").unwrap();
        data.finish_full_fetch(ticket, sample_rows(4), vec!["x".into()], Some([4, 1]));
        assert_eq!(data.columns, vec!["x", "big"]);
        assert_eq!(data.rows[3]["big"], json!(1));
        assert_eq!(data.display_total_cols(), 2);
    }
}
