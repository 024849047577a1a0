use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use cv_classifier::TrainedSnapshot;
use cv_core::{FeatureVector, UrgencyLabel};

#[derive(Debug, Clone, Serialize)]
pub struct TrainReport {
    pub snapshot_id: Uuid,
    pub rows: usize,
    pub classes: Vec<UrgencyLabel>,
}

impl From<&TrainedSnapshot> for TrainReport {
    fn from(snapshot: &TrainedSnapshot) -> Self {
        Self {
            snapshot_id: snapshot.id,
            rows: snapshot.rows,
            classes: snapshot.classes().to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub urgency: UrgencyLabel,
    pub features: FeatureVector,
    /// Extraction strategy that produced `features`.
    pub source: String,
    pub snapshot_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RetrainReport {
    pub added: usize,
    pub dataset_size: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelStatus {
    pub trained: bool,
    pub snapshot_id: Option<Uuid>,
    pub rows: Option<usize>,
    pub classes: Vec<UrgencyLabel>,
    pub trained_at: Option<DateTime<Utc>>,
    pub external_extraction: bool,
}

/// One citizen report to assess.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub text: String,
    pub prefer_external: bool,
    pub volunteer_multiplier: f64,
    pub task_multiplier: f64,
}

impl ReportRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            prefer_external: false,
            volunteer_multiplier: 1.0,
            task_multiplier: 1.0,
        }
    }

    pub fn prefer_external(mut self, prefer: bool) -> Self {
        self.prefer_external = prefer;
        self
    }

    pub fn with_multipliers(mut self, volunteer: f64, task: f64) -> Self {
        self.volunteer_multiplier = volunteer;
        self.task_multiplier = task;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Assessment {
    pub urgency: UrgencyLabel,
    pub features: FeatureVector,
    pub points: f64,
    pub source: String,
}
