//! The shared classifier handle: training, prediction and retraining.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use cv_classifier::{fit_snapshot, label_rows, ClassifierState, TrainedSnapshot};
use cv_core::config::{TrainingConfig, TriageConfig};
use cv_core::{DatasetRow, FeatureVector, Result, TriageError, UrgencyLabel};
use cv_extract::FeatureExtractor;
use cv_storage::{DatasetStore, JsonlDatasetStore, SnapshotStore};

use crate::types::{ModelStatus, Prediction, RetrainReport, TrainReport};

/// Classifier state plus the stores it trains from and persists to.
///
/// Predictions read the current snapshot without waiting on training;
/// `train` and `retrain_with_new_data` are serialized by one async lock.
pub struct UrgencyModel {
    dataset: Option<Arc<dyn DatasetStore>>,
    artifacts: Option<SnapshotStore>,
    extractor: FeatureExtractor,
    state: ClassifierState,
    training: TrainingConfig,
    retrain_lock: Mutex<()>,
}

impl UrgencyModel {
    pub fn new(extractor: FeatureExtractor, training: TrainingConfig) -> Self {
        Self {
            dataset: None,
            artifacts: None,
            extractor,
            state: ClassifierState::new(),
            training,
            retrain_lock: Mutex::new(()),
        }
    }

    pub fn with_dataset(mut self, dataset: Arc<dyn DatasetStore>) -> Self {
        self.dataset = Some(dataset);
        self
    }

    pub fn with_artifacts(mut self, artifacts: SnapshotStore) -> Self {
        self.artifacts = Some(artifacts);
        self
    }

    /// JSONL dataset, JSON snapshot artifact and the configured extractor,
    /// warm-started from the artifact when one exists.
    pub fn from_config(cfg: &TriageConfig) -> Self {
        let model = Self::new(FeatureExtractor::from_config(&cfg.extraction), cfg.training.clone())
            .with_dataset(Arc::new(JsonlDatasetStore::new(&cfg.dataset.path)))
            .with_artifacts(SnapshotStore::new(cfg.artifacts.snapshot_path()));
        if let Err(err) = model.warm_start() {
            warn!(error = %err, "ignoring unusable snapshot artifact; starting cold");
        }
        model
    }

    /// Install the persisted snapshot if there is one. Returns whether a
    /// snapshot was loaded.
    pub fn warm_start(&self) -> Result<bool> {
        let Some(artifacts) = &self.artifacts else {
            return Ok(false);
        };
        match artifacts.load()? {
            Some(snapshot) => {
                self.state.install(snapshot);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn dataset(&self) -> Option<&Arc<dyn DatasetStore>> {
        self.dataset.as_ref()
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    pub fn is_trained(&self) -> bool {
        self.state.is_trained()
    }

    pub fn current(&self) -> Option<Arc<TrainedSnapshot>> {
        self.state.current()
    }

    /// Fit on the whole stored dataset and install the result.
    pub async fn train(&self) -> Result<TrainReport> {
        let _guard = self.retrain_lock.lock().await;
        let store = self.require_dataset()?.clone();
        let training = self.training.clone();
        let snapshot = blocking(move || {
            let rows = store.read_all()?;
            fit_rows(&rows, &training)
        })
        .await?;
        let report = TrainReport::from(&snapshot);
        self.commit(snapshot).await;
        info!(rows = report.rows, snapshot = %report.snapshot_id, "training complete");
        Ok(report)
    }

    /// Extract features from `report_text` and classify them.
    ///
    /// The classifier is read only after extraction finishes, so a snapshot
    /// installed while the backend is being queried is the one used.
    pub async fn predict(&self, report_text: &str, prefer_external: bool) -> Result<Prediction> {
        if !self.state.is_trained() {
            return Err(TriageError::NotTrained);
        }
        let extraction = self.extractor.extract_traced(report_text, prefer_external).await;
        let snapshot = self.state.require()?;
        let urgency = snapshot.predict(&extraction.features)?;
        debug!(%urgency, source = %extraction.source, snapshot = %snapshot.id, "report classified");
        Ok(Prediction {
            urgency,
            features: extraction.features,
            source: extraction.source,
            snapshot_id: snapshot.id,
        })
    }

    pub fn predict_features(&self, features: &FeatureVector) -> Result<UrgencyLabel> {
        self.state.require()?.predict(features)
    }

    /// Merge `new_rows` into the dataset and refit on the combined set.
    ///
    /// The dataset is rewritten only after the fit succeeds, so a bad row or
    /// a failed fit leaves both dataset and installed snapshot untouched.
    pub async fn retrain_with_new_data(&self, new_rows: Vec<DatasetRow>) -> Result<RetrainReport> {
        let _guard = self.retrain_lock.lock().await;
        let store = self.require_dataset()?.clone();
        let training = self.training.clone();
        let added = new_rows.len();

        let (snapshot, dataset_size) = blocking(move || {
            let mut rows = store.read_all()?;
            let previous = rows.len();
            rows.extend(new_rows);
            let snapshot = fit_rows(&rows, &training).map_err(|err| match err {
                TriageError::SchemaMismatch { row: Some(i), detail } if i >= previous => {
                    TriageError::SchemaMismatch { row: Some(i - previous), detail: format!("new row: {detail}") }
                }
                other => other,
            })?;
            store.rewrite(&rows)?;
            Ok((snapshot, rows.len()))
        })
        .await?;
        self.commit(snapshot).await;

        let report = RetrainReport { added, dataset_size };
        info!(added, dataset_size, "retrain complete");
        Ok(report)
    }

    pub fn status(&self) -> ModelStatus {
        let current = self.state.current();
        ModelStatus {
            trained: current.is_some(),
            snapshot_id: current.as_ref().map(|s| s.id),
            rows: current.as_ref().map(|s| s.rows),
            classes: current.as_ref().map(|s| s.classes().to_vec()).unwrap_or_default(),
            trained_at: current.as_ref().map(|s| s.trained_at),
            external_extraction: self.extractor.has_external(),
        }
    }

    fn require_dataset(&self) -> Result<&Arc<dyn DatasetStore>> {
        self.dataset
            .as_ref()
            .ok_or_else(|| TriageError::Configuration("no dataset store configured".into()))
    }

    /// Swap in the new snapshot, then persist it. Persisting is best-effort:
    /// the dataset is already committed and the snapshot can be refitted.
    async fn commit(&self, snapshot: TrainedSnapshot) {
        let snapshot = Arc::new(snapshot);
        self.state.install_shared(snapshot.clone());
        let Some(artifacts) = self.artifacts.clone() else {
            return;
        };
        let path = artifacts.path().display().to_string();
        if let Err(err) = blocking(move || artifacts.save(&snapshot)).await {
            warn!(error = %err, %path, "failed to persist snapshot");
        }
    }
}

fn fit_rows(rows: &[DatasetRow], training: &TrainingConfig) -> Result<TrainedSnapshot> {
    let records = label_rows(rows)?;
    fit_snapshot(&records, training)
}

/// Run dataset I/O and fitting off the async workers.
async fn blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| TriageError::Other(anyhow::Error::new(e).context("blocking task failed")))?
}
