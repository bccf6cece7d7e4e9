use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use market_core::{MarketIndex, MarketSummary, SectorPerformance};

use crate::error::ApiError;
use crate::AppState;

pub fn market_routes() -> Router<AppState> {
    Router::new()
        .route("/api/indices", get(list_indices))
        .route("/api/sectors", get(list_sectors))
        .route("/api/market/summary", get(market_summary))
}

#[utoipa::path(
    get,
    path = "/api/indices",
    responses((status = 200, description = "Major market indices", body = Vec<MarketIndex>)),
    tag = "Market"
)]
pub async fn list_indices(
    State(state): State<AppState>,
) -> Result<Json<Vec<MarketIndex>>, ApiError> {
    let indices = state
        .market
        .indices()
        .await
        .map_err(ApiError::context("Failed to fetch indices"))?;
    Ok(Json(indices))
}

#[utoipa::path(
    get,
    path = "/api/sectors",
    responses((status = 200, description = "Per-sector performance", body = Vec<SectorPerformance>)),
    tag = "Market"
)]
pub async fn list_sectors(
    State(state): State<AppState>,
) -> Result<Json<Vec<SectorPerformance>>, ApiError> {
    let sectors = state
        .market
        .sectors()
        .await
        .map_err(ApiError::context("Failed to fetch sectors"))?;
    Ok(Json(sectors))
}

#[utoipa::path(
    get,
    path = "/api/market/summary",
    responses((status = 200, description = "Indices, sectors, movers and session status", body = MarketSummary)),
    tag = "Market"
)]
pub async fn market_summary(
    State(state): State<AppState>,
) -> Result<Json<MarketSummary>, ApiError> {
    let (indices, sectors, quotes) = tokio::join!(
        state.market.indices(),
        state.market.sectors(),
        state.market.quotes(),
    );

    let context = "Failed to fetch market summary";
    let indices = indices.map_err(ApiError::context(context))?;
    let sectors = sectors.map_err(ApiError::context(context))?;
    let quotes = quotes.map_err(ApiError::context(context))?;

    Ok(Json(MarketSummary::build(
        indices,
        sectors,
        &quotes,
        Utc::now(),
    )))
}
