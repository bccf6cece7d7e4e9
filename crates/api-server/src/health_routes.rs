use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    /// Gemini key configured; otherwise AI endpoints use local fallbacks.
    pub gemini: bool,
    /// Hugging Face key configured; otherwise FinBERT uses the keyword heuristic.
    pub huggingface: bool,
    pub data_source: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub services: ServiceStatus,
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/api/health", get(health))
}

#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Liveness and configured services", body = HealthResponse)),
    tag = "Health"
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        services: ServiceStatus {
            gemini: state.ai.gemini_configured(),
            huggingface: state.ai.finbert_configured(),
            data_source: state.market.source_name().to_string(),
        },
    })
}
