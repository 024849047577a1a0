//! The fixed eight-column risk feature schema.
//!
//! Column order matters: it is the order of the classifier's input vector.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::{Result, TriageError};
use crate::label::UrgencyLabel;

pub const FEATURE_COLUMNS: [&str; 8] = [
    "danger_score",
    "health_risk",
    "environment_damage",
    "infrastructure_damage",
    "fire_risk",
    "flooding_indicator",
    "urgency_keywords_score",
    "human_harm_risk",
];

pub const LABEL_COLUMN: &str = "urgency_label";

/// Numeric risk summary of one report. Every field lies in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub danger_score: f64,
    pub health_risk: f64,
    pub environment_damage: f64,
    pub infrastructure_damage: f64,
    pub fire_risk: f64,
    pub flooding_indicator: f64,
    pub urgency_keywords_score: f64,
    pub human_harm_risk: f64,
}

impl FeatureVector {
    pub const DIM: usize = FEATURE_COLUMNS.len();

    /// Build from values in `FEATURE_COLUMNS` order, rejecting anything outside `[0, 1]`.
    pub fn from_array(values: [f64; 8]) -> Result<Self> {
        for (column, value) in FEATURE_COLUMNS.iter().zip(values.iter()) {
            check_unit_interval(column, *value)?;
        }
        Ok(Self {
            danger_score: values[0],
            health_risk: values[1],
            environment_damage: values[2],
            infrastructure_damage: values[3],
            fire_risk: values[4],
            flooding_indicator: values[5],
            urgency_keywords_score: values[6],
            human_harm_risk: values[7],
        })
    }

    pub fn to_array(&self) -> [f64; 8] {
        [
            self.danger_score,
            self.health_risk,
            self.environment_damage,
            self.infrastructure_damage,
            self.fire_risk,
            self.flooding_indicator,
            self.urgency_keywords_score,
            self.human_harm_risk,
        ]
    }

    pub fn get(&self, column: &str) -> Option<f64> {
        FEATURE_COLUMNS
            .iter()
            .position(|c| *c == column)
            .map(|i| self.to_array()[i])
    }

    /// Strict parse of a JSON object: all eight columns present, numeric, in range.
    /// Extra keys are ignored.
    pub fn from_json_object(obj: &Map<String, Value>) -> Result<Self> {
        let mut values = [0.0; 8];
        for (slot, column) in values.iter_mut().zip(FEATURE_COLUMNS.iter()) {
            let raw = obj
                .get(*column)
                .ok_or_else(|| TriageError::schema(format!("missing feature column `{column}`")))?;
            *slot = raw.as_f64().ok_or_else(|| {
                TriageError::schema(format!("feature column `{column}` is not numeric: {raw}"))
            })?;
        }
        Self::from_array(values)
    }

    pub fn validate(&self) -> Result<()> {
        Self::from_array(self.to_array()).map(|_| ())
    }
}

fn check_unit_interval(column: &str, value: f64) -> Result<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(TriageError::schema(format!(
            "feature column `{column}` out of range [0, 1]: {value}"
        )))
    }
}

/// A feature vector paired with its urgency label; one training example.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabeledRecord {
    pub features: FeatureVector,
    pub label: UrgencyLabel,
}

impl LabeledRecord {
    pub fn new(features: FeatureVector, label: UrgencyLabel) -> Self {
        Self { features, label }
    }

    pub fn to_row(&self) -> DatasetRow {
        DatasetRow::from_features(&self.features, Some(self.label))
    }
}

/// Raw dataset row as stored: loose feature columns plus an optional label.
///
/// Columns are kept as JSON values so that a malformed row can be reported
/// precisely instead of failing the whole file at parse time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetRow {
    #[serde(flatten)]
    pub columns: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency_label: Option<UrgencyLabel>,
}

impl DatasetRow {
    pub fn from_features(features: &FeatureVector, label: Option<UrgencyLabel>) -> Self {
        let columns = FEATURE_COLUMNS
            .iter()
            .zip(features.to_array())
            .map(|(c, v)| (c.to_string(), Value::from(v)))
            .collect();
        Self { columns, urgency_label: label }
    }

    /// Lenient numeric lookup; missing or non-numeric columns read as `None`.
    pub fn value(&self, column: &str) -> Option<f64> {
        self.columns.get(column).and_then(Value::as_f64)
    }

    pub fn to_feature_vector(&self) -> Result<FeatureVector> {
        let obj: Map<String, Value> = self
            .columns
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        FeatureVector::from_json_object(&obj)
    }
}
