use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cv_core::{FeatureVector, Result, TriageError, UrgencyLabel};

use crate::encoder::LabelEncoder;
use crate::logistic::MultinomialLogit;

/// A fitted model together with the encoder it was fitted with.
///
/// Never mutated after construction; retraining produces a new snapshot with
/// a new `id`, so a model can never be decoded with another fit's encoder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedSnapshot {
    pub id: Uuid,
    pub trained_at: DateTime<Utc>,
    pub rows: usize,
    encoder: LabelEncoder,
    model: MultinomialLogit,
}

impl TrainedSnapshot {
    pub fn new(encoder: LabelEncoder, model: MultinomialLogit, rows: usize) -> Result<Self> {
        let snapshot = Self {
            id: Uuid::new_v4(),
            trained_at: Utc::now(),
            rows,
            encoder,
            model,
        };
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Consistency check between encoder and model, used after loading from disk.
    pub fn validate(&self) -> Result<()> {
        self.model.validate()?;
        if self.encoder.len() != self.model.classes() {
            return Err(TriageError::Storage(format!(
                "snapshot {} pairs a {}-class model with a {}-label encoder",
                self.id,
                self.model.classes(),
                self.encoder.len()
            )));
        }
        Ok(())
    }

    pub fn encoder(&self) -> &LabelEncoder {
        &self.encoder
    }

    pub fn model(&self) -> &MultinomialLogit {
        &self.model
    }

    pub fn classes(&self) -> &[UrgencyLabel] {
        self.encoder.classes()
    }

    pub fn predict(&self, features: &FeatureVector) -> Result<UrgencyLabel> {
        features.validate()?;
        let index = self.model.predict(&features.to_array());
        self.encoder.inverse_transform(index).ok_or_else(|| {
            TriageError::Storage(format!("snapshot {} predicted unknown class index {index}", self.id))
        })
    }

    /// Class probabilities keyed by label, in severity order.
    pub fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<(UrgencyLabel, f64)>> {
        features.validate()?;
        let probs = self.model.predict_proba(&features.to_array());
        Ok(self.encoder.classes().iter().copied().zip(probs).collect())
    }
}
