use crate::*;
use async_trait::async_trait;
use cv_classifier::classify_by_rule;
use cv_core::config::TrainingConfig;
use cv_core::{DatasetRow, FeatureVector, TriageError, UrgencyLabel};
use cv_extract::{ExtractionError, FeatureExtractor, FeatureSource, SimulatedFeatureSource};
use cv_storage::{DatasetStore, MemoryDatasetStore};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn flood() -> FeatureVector {
    FeatureVector::from_array([0.8, 0.5, 0.3, 0.4, 0.1, 0.9, 0.6, 0.85]).unwrap()
}

struct Fixed {
    features: FeatureVector,
    calls: AtomicUsize,
}

#[async_trait]
impl FeatureSource for Fixed {
    fn name(&self) -> &str {
        "fixed"
    }
    async fn extract(&self, _report_text: &str) -> Result<FeatureVector, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.features)
    }
}

/// Holds extraction until the test releases it.
struct Gated {
    gate: tokio::sync::Notify,
}

#[async_trait]
impl FeatureSource for Gated {
    fn name(&self) -> &str {
        "gated"
    }
    async fn extract(&self, _report_text: &str) -> Result<FeatureVector, ExtractionError> {
        self.gate.notified().await;
        Ok(flood())
    }
}

fn fixed(features: FeatureVector) -> Arc<Fixed> {
    Arc::new(Fixed { features, calls: AtomicUsize::new(0) })
}

fn memory_store(n: usize) -> Arc<MemoryDatasetStore> {
    Arc::new(MemoryDatasetStore::with_rows(bootstrap_rows(n, &SimulatedFeatureSource::seeded(7))))
}

fn model_with(store: Arc<MemoryDatasetStore>, source: Option<Arc<Fixed>>) -> UrgencyModel {
    let mut extractor = FeatureExtractor::new(SimulatedFeatureSource::seeded(11));
    if let Some(source) = source {
        extractor = extractor.with_source(source);
    }
    UrgencyModel::new(extractor, TrainingConfig::default()).with_dataset(store)
}

fn probe_vectors() -> Vec<FeatureVector> {
    bootstrap_rows(200, &SimulatedFeatureSource::seeded(99))
        .iter()
        .map(|r| r.to_feature_vector().unwrap())
        .collect()
}

// ========== Training ==========

#[tokio::test]
async fn test_untrained_predict_fails_before_extraction() {
    let source = fixed(flood());
    let model = model_with(memory_store(10), Some(source.clone()));
    let err = model.predict("Flooding on X street", true).await.unwrap_err();
    assert!(matches!(err, TriageError::NotTrained));
    assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    assert!(matches!(model.predict_features(&flood()), Err(TriageError::NotTrained)));
}

#[tokio::test]
async fn test_train_without_dataset_is_configuration_error() {
    let model = UrgencyModel::new(FeatureExtractor::simulated(), TrainingConfig::default());
    assert!(matches!(model.train().await, Err(TriageError::Configuration(_))));
    assert!(matches!(model.retrain_with_new_data(vec![]).await, Err(TriageError::Configuration(_))));
}

#[tokio::test]
async fn test_train_on_empty_dataset_is_configuration_error() {
    let model = model_with(Arc::new(MemoryDatasetStore::new()), None);
    assert!(matches!(model.train().await, Err(TriageError::Configuration(_))));
    assert!(!model.is_trained());
}

#[tokio::test]
async fn test_trained_model_recovers_rule_labels() {
    let store = memory_store(1000);
    let model = model_with(store.clone(), None);
    let report = model.train().await.unwrap();
    assert_eq!(report.rows, 1000);
    assert_eq!(report.classes, UrgencyLabel::ALL.to_vec());

    let rows = store.read_all().unwrap();
    let correct = rows
        .iter()
        .filter(|r| {
            let fv = r.to_feature_vector().unwrap();
            model.predict_features(&fv).unwrap() == classify_by_rule(&fv)
        })
        .count();
    assert!(correct as f64 / rows.len() as f64 >= 0.9, "accuracy {correct}/1000");
}

#[tokio::test]
async fn test_missing_labels_are_derived() {
    let rows: Vec<DatasetRow> = bootstrap_rows(300, &SimulatedFeatureSource::seeded(3))
        .into_iter()
        .map(|mut r| {
            r.urgency_label = None;
            r
        })
        .collect();
    let model = model_with(Arc::new(MemoryDatasetStore::with_rows(rows)), None);
    let report = model.train().await.unwrap();
    assert!(report.classes.len() >= 2);
}

// ========== Prediction / assessment ==========

#[tokio::test]
async fn test_flood_report_is_critical_with_100_points() {
    let model = model_with(memory_store(1000), Some(fixed(flood())));
    model.train().await.unwrap();
    let pipeline = TriagePipeline::new(Arc::new(model));

    let request = ReportRequest::new("Flooding on X street, houses affected, people trapped").prefer_external(true);
    let assessment = pipeline.assess(&request).await.unwrap();
    assert_eq!(assessment.source, "fixed");
    assert_eq!(assessment.features, flood());
    assert_eq!(assessment.urgency, UrgencyLabel::Critical);
    assert_eq!(assessment.points, 100.0);

    let doubled = pipeline.assess(&request.clone().with_multipliers(2.0, 1.5)).await.unwrap();
    assert_eq!(doubled.points, 300.0);
}

#[tokio::test]
async fn test_prefer_external_false_uses_simulated() {
    let source = fixed(flood());
    let model = model_with(memory_store(300), Some(source.clone()));
    model.train().await.unwrap();
    let prediction = model.predict("pothole", false).await.unwrap();
    assert_eq!(prediction.source, "simulated");
    assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    assert_eq!(Some(prediction.snapshot_id), model.current().map(|s| s.id));
}

#[tokio::test]
async fn test_predict_uses_snapshot_installed_during_extraction() {
    let gated = Arc::new(Gated { gate: tokio::sync::Notify::new() });
    let extractor = FeatureExtractor::new(SimulatedFeatureSource::seeded(11)).with_source(gated.clone());
    let model = Arc::new(UrgencyModel::new(extractor, TrainingConfig::default()).with_dataset(memory_store(300)));
    model.train().await.unwrap();
    let first = model.current().unwrap().id;

    let pending = tokio::spawn({
        let model = model.clone();
        async move { model.predict("Flooding on X street", true).await }
    });
    tokio::task::yield_now().await;
    model.retrain_with_new_data(vec![]).await.unwrap();
    let second = model.current().unwrap().id;
    assert_ne!(first, second);

    gated.gate.notify_one();
    let prediction = pending.await.unwrap().unwrap();
    assert_eq!(prediction.source, "gated");
    assert_eq!(prediction.snapshot_id, second);
}

#[tokio::test]
async fn test_retrain_fit_does_not_block_predictions() {
    let model = Arc::new(model_with(memory_store(300), None));
    model.train().await.unwrap();

    let retrain = tokio::spawn({
        let model = model.clone();
        async move { model.retrain_with_new_data(bootstrap_rows(3000, &SimulatedFeatureSource::seeded(8))).await }
    });
    tokio::task::yield_now().await;
    model.predict("pothole", false).await.unwrap();
    assert!(!retrain.is_finished());
    assert_eq!(retrain.await.unwrap().unwrap().dataset_size, 3300);
}

#[test]
fn test_report_request_defaults() {
    let request = ReportRequest::new("fire");
    assert!(!request.prefer_external);
    assert_eq!(request.volunteer_multiplier, 1.0);
    assert_eq!(request.task_multiplier, 1.0);
}

#[tokio::test]
async fn test_predict_rejects_out_of_schema_vector() {
    let model = model_with(memory_store(300), None);
    model.train().await.unwrap();
    let bad = FeatureVector { danger_score: 1.5, ..flood() };
    assert!(matches!(model.predict_features(&bad), Err(TriageError::SchemaMismatch { .. })));
}

// ========== Retraining ==========

#[tokio::test]
async fn test_empty_retrain_is_idempotent() {
    let store = memory_store(400);
    let model = model_with(store.clone(), None);
    model.train().await.unwrap();
    let before: Vec<_> = probe_vectors().iter().map(|v| model.predict_features(v).unwrap()).collect();

    let report = model.retrain_with_new_data(vec![]).await.unwrap();
    assert_eq!(report, RetrainReport { added: 0, dataset_size: 400 });
    assert_eq!(store.len().unwrap(), 400);
    let after: Vec<_> = probe_vectors().iter().map(|v| model.predict_features(v).unwrap()).collect();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_retrain_appends_and_swaps_snapshot() {
    let store = memory_store(300);
    let pipeline = TriagePipeline::new(Arc::new(model_with(store.clone(), None)));
    pipeline.train().await.unwrap();
    let first = pipeline.model().current().unwrap().id;

    let new_rows = bootstrap_rows(25, &SimulatedFeatureSource::seeded(5));
    let report = pipeline.retrain(new_rows).await.unwrap();
    assert_eq!(report, RetrainReport { added: 25, dataset_size: 325 });
    assert_eq!(store.len().unwrap(), 325);

    let status = pipeline.status();
    assert!(status.trained);
    assert_eq!(status.rows, Some(325));
    assert_ne!(status.snapshot_id, Some(first));
}

#[tokio::test]
async fn test_bad_new_row_leaves_dataset_and_state_untouched() {
    let store = memory_store(300);
    let model = model_with(store.clone(), None);
    model.train().await.unwrap();
    let before = model.current().unwrap().id;

    let mut bad: DatasetRow = bootstrap_rows(1, &SimulatedFeatureSource::seeded(1)).remove(0);
    bad.columns.insert("fire_risk".into(), json!("high"));
    let good = bootstrap_rows(1, &SimulatedFeatureSource::seeded(2)).remove(0);

    match model.retrain_with_new_data(vec![good, bad]).await {
        Err(TriageError::SchemaMismatch { row, detail }) => {
            assert_eq!(row, Some(1));
            assert!(detail.contains("fire_risk"));
        }
        other => panic!("expected schema mismatch, got {other:?}"),
    }
    assert_eq!(store.len().unwrap(), 300);
    assert_eq!(model.current().unwrap().id, before);
}

#[tokio::test]
async fn test_single_class_retrain_on_empty_store_fails() {
    let store = Arc::new(MemoryDatasetStore::new());
    let model = model_with(store.clone(), None);
    let calm = DatasetRow::from_features(&FeatureVector::default(), Some(UrgencyLabel::Low));
    let err = model.retrain_with_new_data(vec![calm.clone(), calm]).await.unwrap_err();
    assert!(matches!(err, TriageError::Configuration(_)));
    assert!(store.is_empty().unwrap());
    assert!(!model.is_trained());
}

// ========== Status / bootstrap ==========

#[tokio::test]
async fn test_status_reports_cold_and_warm() {
    let model = model_with(memory_store(200), Some(fixed(flood())));
    let cold = model.status();
    assert!(!cold.trained);
    assert!(cold.snapshot_id.is_none());
    assert!(cold.classes.is_empty());
    assert!(cold.external_extraction);

    model.train().await.unwrap();
    let warm = model.status();
    assert!(warm.trained);
    assert_eq!(warm.rows, Some(200));
    assert!(warm.trained_at.is_some());
}

#[test]
fn test_bootstrap_rows_are_rule_labeled() {
    let rows = bootstrap_rows(50, &SimulatedFeatureSource::seeded(4));
    assert_eq!(rows.len(), 50);
    for row in rows {
        let fv = row.to_feature_vector().unwrap();
        assert_eq!(row.urgency_label, Some(classify_by_rule(&fv)));
    }
}

#[test]
fn test_bootstrap_dataset_only_seeds_empty_store() {
    let source = SimulatedFeatureSource::seeded(4);
    let empty = MemoryDatasetStore::new();
    assert_eq!(bootstrap_dataset(&empty, 30, &source).unwrap(), 30);
    assert_eq!(bootstrap_dataset(&empty, 30, &source).unwrap(), 0);
    assert_eq!(empty.len().unwrap(), 30);
    assert_eq!(bootstrap_dataset(&MemoryDatasetStore::new(), 0, &source).unwrap(), 0);
}
