//! CiviSmart triage HTTP API server (Axum).
//!
//! Provides report assessment, dataset retraining, the volunteer chat
//! assistant and health/status monitoring.

pub mod error;
pub mod routes;
pub mod state;

use axum::Router;
use tracing::{info, warn};

use cv_core::TriageConfig;
use cv_extract::SimulatedFeatureSource;
use cv_pipeline::bootstrap_dataset;
use cv_storage::DatasetStore;
use state::AppState;

/// Build the application router from configuration.
pub fn app(cfg: &TriageConfig) -> Router {
    app_with_state(AppState::from_config(cfg))
}

/// Build the application router with a custom state.
pub fn app_with_state(state: AppState) -> Router {
    Router::new()
        .merge(routes::health_routes())
        .merge(routes::triage_routes())
        .merge(routes::chat_routes())
        .with_state(state)
}

/// Bring a cold model up: seed an empty dataset when configured, then fit
/// once if there is anything to fit on. Failures leave the server running
/// untrained.
pub async fn prepare(state: &AppState, cfg: &TriageConfig) {
    let model = state.pipeline.model();
    if model.is_trained() {
        info!("serving warm snapshot");
        return;
    }
    let Some(dataset) = model.dataset() else {
        return;
    };
    if let Err(err) = bootstrap_dataset(dataset.as_ref(), cfg.dataset.bootstrap_rows, &SimulatedFeatureSource::new()) {
        warn!(error = %err, "dataset bootstrap failed");
    }
    match dataset.is_empty() {
        Ok(false) => match state.pipeline.train().await {
            Ok(report) => info!(rows = report.rows, snapshot = %report.snapshot_id, "initial training complete"),
            Err(err) => warn!(error = %err, "initial training failed; predictions unavailable until retrain"),
        },
        Ok(true) => warn!(dataset = %dataset.describe(), "dataset is empty; predictions unavailable until retrain"),
        Err(err) => warn!(error = %err, "dataset unreadable; predictions unavailable until retrain"),
    }
}
