//! Dataset and snapshot persistence.

use cv_classifier::{classify_by_rule, fit_snapshot, TrainedSnapshot};
use cv_core::config::TrainingConfig;
use cv_core::{DatasetRow, FeatureVector, LabeledRecord, TriageError, UrgencyLabel};
use cv_storage::{write_atomic, DatasetStore, JsonlDatasetStore, MemoryDatasetStore, SnapshotStore};
use serde_json::json;
use std::fs;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn row(values: [f64; 8], label: Option<UrgencyLabel>) -> DatasetRow {
    DatasetRow::from_features(&FeatureVector::from_array(values).unwrap(), label)
}

fn grid_records() -> Vec<LabeledRecord> {
    let mut out = Vec::new();
    for i in 0..=10 {
        for j in 0..=10 {
            let a = i as f64 / 10.0;
            let b = j as f64 / 10.0;
            let features = FeatureVector::from_array([a, 0.2, 0.4, 0.6, 0.1, b, 0.3, (a + b) / 2.0]).unwrap();
            out.push(LabeledRecord::new(features, classify_by_rule(&features)));
        }
    }
    out
}

fn snapshot() -> TrainedSnapshot {
    fit_snapshot(&grid_records(), &TrainingConfig::default()).unwrap()
}

// ============================================================
// JSONL dataset
// ============================================================

#[test]
fn test_missing_file_reads_empty() {
    let dir = TempDir::new().unwrap();
    let store = JsonlDatasetStore::new(dir.path().join("nope.jsonl"));
    assert!(!store.exists());
    assert!(store.read_all().unwrap().is_empty());
    assert_eq!(store.len().unwrap(), 0);
    assert!(store.is_empty().unwrap());
}

#[test]
fn test_rewrite_then_read_preserves_order_and_labels() {
    let dir = TempDir::new().unwrap();
    let store = JsonlDatasetStore::new(dir.path().join("nested/data.jsonl"));
    let rows = vec![
        row([0.9; 8], Some(UrgencyLabel::Critical)),
        row([0.1; 8], None),
        row([0.4; 8], Some(UrgencyLabel::Medium)),
    ];
    store.rewrite(&rows).unwrap();
    assert_eq!(store.read_all().unwrap(), rows);

    let text = fs::read_to_string(store.path()).unwrap();
    assert_eq!(text.lines().count(), 3);
    assert!(text.lines().next().unwrap().contains("\"urgency_label\":\"Critical\""));
    assert!(!text.lines().nth(1).unwrap().contains("urgency_label"));
}

#[test]
fn test_append_returns_new_size() {
    let dir = TempDir::new().unwrap();
    let store = JsonlDatasetStore::new(dir.path().join("data.jsonl"));
    assert_eq!(store.append(&[row([0.2; 8], None)]).unwrap(), 1);
    assert_eq!(store.append(&[row([0.3; 8], None), row([0.4; 8], None)]).unwrap(), 3);
    assert_eq!(store.append(&[]).unwrap(), 3);
    assert_eq!(store.len().unwrap(), 3);
}

#[test]
fn test_blank_lines_and_extra_columns_tolerated() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.jsonl");
    let line = json!({
        "danger_score": 0.8, "health_risk": 0.5, "environment_damage": 0.3,
        "infrastructure_damage": 0.4, "fire_risk": 0.1, "flooding_indicator": 0.9,
        "urgency_keywords_score": 0.6, "human_harm_risk": 0.85,
        "reporter": "anon", "urgency_label": "High"
    });
    fs::write(&path, format!("\n{line}\n\n{line}\n")).unwrap();
    let rows = JsonlDatasetStore::new(&path).read_all().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].urgency_label, Some(UrgencyLabel::High));
    assert_eq!(rows[0].columns["reporter"], json!("anon"));
    assert!(rows[0].to_feature_vector().is_ok());
}

#[test]
fn test_malformed_line_names_row() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.jsonl");
    let good = serde_json::to_string(&row([0.5; 8], None)).unwrap();
    fs::write(&path, format!("{good}\n{good}\n{{\"danger_score\": 0.5, \"urgency_label\": \"Urgent\"}}\n")).unwrap();
    match JsonlDatasetStore::new(&path).read_all() {
        Err(TriageError::SchemaMismatch { row, .. }) => assert_eq!(row, Some(2)),
        other => panic!("expected schema mismatch, got {other:?}"),
    }
}

#[test]
fn test_concurrent_appends_are_not_lost() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(JsonlDatasetStore::new(dir.path().join("data.jsonl")));
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let store = store.clone();
            thread::spawn(move || {
                for _ in 0..5 {
                    store.append(&[row([t as f64 / 10.0; 8], None)]).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(store.len().unwrap(), 40);
}

#[test]
fn test_atomic_write_leaves_no_temp_files() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("artifact.json");
    write_atomic(&path, b"first").unwrap();
    write_atomic(&path, b"second").unwrap();
    assert_eq!(fs::read(&path).unwrap(), b"second");
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

// ============================================================
// Memory dataset
// ============================================================

#[test]
fn test_memory_store_append_and_rewrite() {
    let store = MemoryDatasetStore::new();
    assert_eq!(store.append(&[row([0.1; 8], None)]).unwrap(), 1);
    store.rewrite(&[row([0.2; 8], None), row([0.3; 8], None)]).unwrap();
    assert_eq!(store.len().unwrap(), 2);
    assert_eq!(store.describe(), "memory");

    let seeded = MemoryDatasetStore::with_rows(vec![row([0.9; 8], Some(UrgencyLabel::Critical))]);
    assert_eq!(seeded.read_all().unwrap()[0].urgency_label, Some(UrgencyLabel::Critical));
}

// ============================================================
// Snapshot artifact
// ============================================================

#[test]
fn test_snapshot_load_missing_is_none() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(dir.path().join("models/urgency_model.json"));
    assert!(store.load().unwrap().is_none());
}

#[test]
fn test_snapshot_save_load_predicts_identically() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(dir.path().join("models/urgency_model.json"));
    let original = snapshot();
    store.save(&original).unwrap();

    let loaded = store.load().unwrap().unwrap();
    assert_eq!(loaded.id, original.id);
    assert_eq!(loaded.classes(), original.classes());
    for record in grid_records() {
        assert_eq!(loaded.predict(&record.features).unwrap(), original.predict(&record.features).unwrap());
    }
}

#[test]
fn test_corrupt_snapshot_is_storage_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("urgency_model.json");
    fs::write(&path, b"{\"id\": 12").unwrap();
    assert!(matches!(SnapshotStore::new(&path).load(), Err(TriageError::Storage(_))));
}

#[test]
fn test_snapshot_overwrite_replaces_previous() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(dir.path().join("urgency_model.json"));
    let first = snapshot();
    let second = snapshot();
    store.save(&first).unwrap();
    store.save(&second).unwrap();
    assert_eq!(store.load().unwrap().unwrap().id, second.id);
}
