//! Report triage: extraction, classification and reward points behind one
//! shared model handle.

pub mod bootstrap;
pub mod model;
pub mod pipeline;
pub mod types;

pub use bootstrap::{bootstrap_dataset, bootstrap_rows};
pub use model::UrgencyModel;
pub use pipeline::TriagePipeline;
pub use types::{Assessment, ModelStatus, Prediction, ReportRequest, RetrainReport, TrainReport};

#[cfg(test)]
mod tests;
