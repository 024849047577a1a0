//! Application state shared across all handlers.

use std::sync::Arc;

use cv_core::TriageConfig;
use cv_extract::Assistant;
use cv_pipeline::{TriagePipeline, UrgencyModel};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: TriagePipeline,
    pub assistant: Arc<Assistant>,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(pipeline: TriagePipeline, assistant: Assistant) -> Self {
        Self {
            pipeline,
            assistant: Arc::new(assistant),
            start_time: std::time::Instant::now(),
        }
    }

    /// Model warm-started from the configured artifact, assistant on the
    /// configured backend.
    pub fn from_config(cfg: &TriageConfig) -> Self {
        let model = UrgencyModel::from_config(cfg);
        Self::new(
            TriagePipeline::new(Arc::new(model)),
            Assistant::from_config(&cfg.extraction),
        )
    }
}
