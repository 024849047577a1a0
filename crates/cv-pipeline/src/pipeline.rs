use std::sync::Arc;
use tracing::debug;

use cv_core::{points, DatasetRow, Result};

use crate::model::UrgencyModel;
use crate::types::{Assessment, ModelStatus, ReportRequest, RetrainReport, TrainReport};

/// Report in, urgency and reward out.
#[derive(Clone)]
pub struct TriagePipeline {
    model: Arc<UrgencyModel>,
}

impl TriagePipeline {
    pub fn new(model: Arc<UrgencyModel>) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &Arc<UrgencyModel> {
        &self.model
    }

    pub async fn assess(&self, report: &ReportRequest) -> Result<Assessment> {
        let prediction = self.model.predict(&report.text, report.prefer_external).await?;
        let points = points(prediction.urgency, report.volunteer_multiplier, report.task_multiplier);
        debug!(urgency = %prediction.urgency, points, "report assessed");
        Ok(Assessment {
            urgency: prediction.urgency,
            features: prediction.features,
            points,
            source: prediction.source,
        })
    }

    pub async fn retrain(&self, new_rows: Vec<DatasetRow>) -> Result<RetrainReport> {
        self.model.retrain_with_new_data(new_rows).await
    }

    pub async fn train(&self) -> Result<TrainReport> {
        self.model.train().await
    }

    pub fn status(&self) -> ModelStatus {
        self.model.status()
    }
}
