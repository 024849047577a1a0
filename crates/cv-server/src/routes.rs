use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use cv_core::{DatasetRow, FeatureVector, UrgencyLabel};
use cv_pipeline::ReportRequest;

use crate::error::ApiError;
use crate::state::AppState;

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

pub fn triage_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/predict", post(predict))
        .route("/api/v1/retrain", post(retrain))
}

pub fn chat_routes() -> Router<AppState> {
    Router::new().route("/api/v1/chat", post(chat))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "uptime_secs": state.start_time.elapsed().as_secs(),
        "model": state.pipeline.status(),
    }))
}

fn one() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub report_text: String,
    #[serde(default)]
    pub use_openai: bool,
    #[serde(default = "one")]
    pub volunteer_score: f64,
    #[serde(default = "one")]
    pub task_complexity: f64,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub urgency: UrgencyLabel,
    pub features: FeatureVector,
    pub points: f64,
    pub source: String,
}

async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let Json(body) = payload?;
    if body.report_text.trim().is_empty() {
        return Err(ApiError::bad_request("report_text must not be empty"));
    }
    let request = ReportRequest::new(body.report_text)
        .prefer_external(body.use_openai)
        .with_multipliers(body.volunteer_score, body.task_complexity);
    let assessment = state.pipeline.assess(&request).await?;
    Ok(Json(PredictResponse {
        urgency: assessment.urgency,
        features: assessment.features,
        points: assessment.points,
        source: assessment.source,
    }))
}

#[derive(Debug, Deserialize)]
pub struct RetrainRequest {
    #[serde(default)]
    pub rows: Vec<DatasetRow>,
}

#[derive(Debug, Serialize)]
pub struct RetrainResponse {
    pub detail: String,
    pub added: usize,
    pub dataset_size: usize,
}

async fn retrain(
    State(state): State<AppState>,
    payload: Result<Json<RetrainRequest>, JsonRejection>,
) -> Result<Json<RetrainResponse>, ApiError> {
    let Json(body) = payload?;
    let report = state.pipeline.retrain(body.rows).await?;
    Ok(Json(RetrainResponse {
        detail: format!("Model retrained successfully with {} new rows.", report.added),
        added: report.added,
        dataset_size: report.dataset_size,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub user_message: String,
}

async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = payload?;
    let response = state.assistant.reply(&body.user_message).await;
    Ok(Json(json!({ "response": response })))
}
