use crate::api::AppState;
use crate::error::Result;
use crate::ml::{feature_names, ModelMetadata};
use axum::{extract::State, Json};
use serde::Serialize;

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    }))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Classify the latest telemetry reading
pub async fn predict(State(state): State<AppState>) -> Result<Json<PredictResponse>> {
    let outcome = state.service.predict_latest().await?;

    Ok(Json(PredictResponse {
        prediction: outcome.prediction,
    }))
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub prediction: i64,
}

/// Describe the loaded model
pub async fn model_info(State(state): State<AppState>) -> Result<Json<ModelInfoResponse>> {
    Ok(Json(ModelInfoResponse {
        features: feature_names(),
        metadata: state.service.metadata().cloned(),
    }))
}

#[derive(Debug, Serialize)]
pub struct ModelInfoResponse {
    pub features: Vec<String>,
    pub metadata: Option<ModelMetadata>,
}
