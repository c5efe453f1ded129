//! Integration tests for preplab-core: the workflow-level properties the
//! frontend relies on, exercised through the public API.

use serde_json::json;

use preplab_core::nav::navigate;
use preplab_core::paginate::ROWS_PER_PAGE;
use preplab_core::store::{keys, MemoryBackend};
use preplab_core::{
    AppData, NavOutcome, Pager, Row, StateStore, Step, TimeSeriesSession, UploadResponse,
};

fn rows(n: usize) -> Vec<Row> {
    (0..n)
        .map(|i| serde_json::from_value(json!({"id": i, "value": i * 2})).unwrap())
        .collect()
}

fn uploaded_data(n: usize) -> AppData {
    let mut data = AppData::default();
    data.upload = Some(UploadResponse {
        file_ids: vec!["file-1".into()],
        selected_model_type: "ehr".into(),
        detected_type: "tabular".into(),
        ..Default::default()
    });
    data.replace_dataset(rows(n), vec!["id".into(), "value".into()], None);
    data
}

#[test]
fn pagination_slices_are_exact_for_every_page_size() {
    let data = uploaded_data(437);
    let total = data.display_total_rows();
    for per in ROWS_PER_PAGE {
        let mut pager = Pager { page: 1, per };
        for page in 1..=pager.total_pages(total) {
            pager.goto(page, total);
            let (start, end) = pager.slice_bounds(total);
            let slice = &data.rows[start..end];
            assert!(slice.len() <= per);
            assert_eq!(start + slice.len(), (start + per).min(total));
        }
    }
}

#[test]
fn concurrent_full_fetch_issues_exactly_one_request() {
    let mut data = uploaded_data(10);
    let mut issued = 0;

    // Two callers race to trigger the background fetch; only the first
    // gets a ticket, the second joins the in-flight operation.
    let ticket_a = data.begin_full_fetch("file-1");
    if ticket_a.is_some() {
        issued += 1;
    }
    let ticket_b = data.begin_full_fetch("file-1");
    if ticket_b.is_some() {
        issued += 1;
    }
    assert_eq!(issued, 1);

    assert!(data.finish_full_fetch(
        ticket_a.unwrap(),
        rows(5000),
        vec!["id".into(), "value".into()],
        Some([5000, 2]),
    ));
    // Both callers observe the same eventual result.
    assert_eq!(data.rows.len(), 5000);
    // And repeating the whole operation is a no-op.
    assert!(data.begin_full_fetch("file-1").is_none());
}

#[test]
fn navigation_tracks_dataset_lifecycle() {
    let mut data = AppData::default();
    for step in Step::ALL {
        assert_eq!(step.is_available(&data), step == Step::Upload);
    }

    // Upload lands: every step opens in the same refresh cycle.
    data = uploaded_data(1);
    for step in Step::ALL {
        assert!(step.is_available(&data));
    }

    // Reset collapses everything except upload again.
    data.reset();
    assert!(matches!(
        navigate(&data, Step::Cleaning),
        NavOutcome::FellBack { .. }
    ));
    assert_eq!(navigate(&data, Step::Upload), NavOutcome::Activated(Step::Upload));
}

#[test]
fn histogram_of_one_to_ten_bins_as_specified() {
    let values: Vec<serde_json::Value> = (1..=10).map(|i| json!(i)).collect();
    let h = preplab_core::stats::histogram(&values).expect("numeric column");
    assert_eq!(h.bins.len(), 4);
    assert_eq!(h.bins.iter().map(|b| b.count).sum::<usize>(), 10);
    // 10.0 falls exactly on the upper bound and belongs to the last bin.
    let last = h.bins.last().unwrap();
    assert_eq!(last.upper, 10.0);
    assert!(last.count > 0);
}

#[test]
fn frequency_editor_contract() {
    let mut session = TimeSeriesSession {
        sample_count: 100,
        ..Default::default()
    };
    session.set_frequency(10.0).unwrap();
    assert_eq!(format!("{:.2}", session.duration_secs()), "10.00");

    assert!(session.set_frequency(0.0).is_err());
    assert!(session.set_frequency(-5.0).is_err());
    assert_eq!(session.frequency, 10.0, "rejected edits leave state unchanged");
}

#[test]
fn persistence_round_trip_preserves_rows_columns_and_order() {
    let store = StateStore::new(MemoryBackend::new());
    let mut data = AppData::default();
    data.upload = Some(UploadResponse {
        file_ids: vec!["file-9".into()],
        ..Default::default()
    });
    data.replace_dataset(
        vec![
            serde_json::from_value(json!({"name": "ada", "age": 36})).unwrap(),
            serde_json::from_value(json!({"name": "grace", "age": 85})).unwrap(),
            serde_json::from_value(json!({"name": "mary", "age": 97})).unwrap(),
        ],
        vec!["name".into(), "age".into()],
        None,
    );
    store.persist_dataset(&data);

    let restored = store.restore_app_data();
    assert_eq!(restored.rows, data.rows);
    assert_eq!(restored.columns, data.columns);
    assert_eq!(restored.total_rows, 3);
}

#[test]
fn restore_order_supports_feature_replay() {
    let store = StateStore::new(MemoryBackend::new());

    // Persist a session that engineered one feature.
    let mut data = uploaded_data(4);
    data.add_feature(preplab_core::CreatedFeature::RuleBased {
        variable: "value".into(),
        operator: preplab_core::CompareOp::Ge,
        value: 4.0,
        feature_name: "value_high".into(),
    });
    store.persist_dataset(&data);

    // Reload, then refresh from the backend (which knows nothing of the
    // engineered column). The feature record replays it.
    let mut restored = store.restore_app_data();
    assert_eq!(restored.created_features.len(), 1);
    let ticket = restored.begin_full_fetch("file-1").unwrap();
    restored.finish_full_fetch(ticket, rows(4), vec!["id".into(), "value".into()], None);
    assert_eq!(
        restored.columns,
        vec!["id".to_string(), "value".to_string(), "value_high".to_string()]
    );
    assert_eq!(restored.rows[0]["value_high"], json!(0));
    assert_eq!(restored.rows[2]["value_high"], json!(1));
}

#[test]
fn stale_fetch_after_new_upload_is_dropped() {
    let store = StateStore::new(MemoryBackend::new());
    let mut data = uploaded_data(10);
    let stale_ticket = data.begin_full_fetch("file-1").unwrap();

    // User starts a new upload before the fetch resolves.
    data.reset();
    store.clear_dataset_keys();
    data.upload = Some(UploadResponse {
        file_ids: vec!["file-2".into()],
        ..Default::default()
    });
    data.replace_dataset(rows(2), vec!["id".into(), "value".into()], None);

    assert!(!data.finish_full_fetch(
        stale_ticket,
        rows(9999),
        vec!["id".into(), "value".into()],
        None
    ));
    assert_eq!(data.rows.len(), 2, "new session data must survive the stale fetch");

    // The new file's own fetch still works.
    assert!(data.begin_full_fetch("file-2").is_some());
    assert!(store.restore_string(keys::SELECTED_MODEL_TYPE).is_none());
}
