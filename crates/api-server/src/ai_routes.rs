//! AI prediction and analysis routes. Both degrade to local heuristics when
//! the model is unavailable, so only lookup failures surface as errors.

use axum::{
    extract::{rejection::PathRejection, Path, State},
    routing::get,
    Json, Router,
};
use market_core::{AIAnalysis, AIPrediction};

use crate::error::ApiError;
use crate::params;
use crate::AppState;

pub fn ai_routes() -> Router<AppState> {
    Router::new()
        .route("/api/prediction/:symbol", get(get_prediction))
        .route("/api/analysis/:symbol", get(get_analysis))
}

#[utoipa::path(
    get,
    path = "/api/prediction/{symbol}",
    params(("symbol" = String, Path, description = "Stock ticker symbol")),
    responses(
        (status = 200, description = "Seven day price prediction", body = AIPrediction),
        (status = 404, description = "Stock not found")
    ),
    tag = "AI"
)]
pub async fn get_prediction(
    State(state): State<AppState>,
    symbol: Result<Path<String>, PathRejection>,
) -> Result<Json<AIPrediction>, ApiError> {
    let Path(symbol) = symbol?;
    let symbol = params::symbol(&symbol)?;
    let quote = state
        .market
        .quote(&symbol)
        .await
        .map_err(ApiError::context("Failed to generate prediction"))?
        .ok_or(ApiError::NotFound("Stock not found"))?;

    Ok(Json(state.ai.predict(&quote).await))
}

#[utoipa::path(
    get,
    path = "/api/analysis/{symbol}",
    params(("symbol" = String, Path, description = "Stock ticker symbol")),
    responses(
        (status = 200, description = "Comprehensive narrative analysis", body = AIAnalysis),
        (status = 404, description = "Stock not found")
    ),
    tag = "AI"
)]
pub async fn get_analysis(
    State(state): State<AppState>,
    symbol: Result<Path<String>, PathRejection>,
) -> Result<Json<AIAnalysis>, ApiError> {
    let Path(symbol) = symbol?;
    let symbol = params::symbol(&symbol)?;
    let fundamentals = state
        .market
        .fundamentals(&symbol)
        .await
        .map_err(ApiError::context("Failed to generate analysis"))?
        .ok_or(ApiError::NotFound("Stock not found"))?;

    Ok(Json(state.ai.analyze(&fundamentals).await))
}
