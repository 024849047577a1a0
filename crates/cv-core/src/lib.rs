//! Shared types for the CiviSmart triage workspace: the feature schema,
//! urgency labels, reward points, configuration and the error taxonomy.

pub mod config;
pub mod error;
pub mod features;
pub mod label;
pub mod reward;

pub use config::TriageConfig;
pub use error::{Result, TriageError};
pub use features::{DatasetRow, FeatureVector, LabeledRecord, FEATURE_COLUMNS, LABEL_COLUMN};
pub use label::UrgencyLabel;
pub use reward::{base_points, points, points_for_name};
