use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::get,
    Json, Router,
};
use market_core::NewsArticle;
use market_sim::news::{DEFAULT_LATEST_LIMIT, DEFAULT_SYMBOL_LIMIT};

use crate::error::ApiError;
use crate::params::{self, LimitQuery};
use crate::AppState;

pub fn news_routes() -> Router<AppState> {
    Router::new()
        .route("/api/news", get(latest_news))
        .route("/api/news/:symbol", get(symbol_news))
}

#[utoipa::path(
    get,
    path = "/api/news",
    params(LimitQuery),
    responses((status = 200, description = "Latest headlines, newest first", body = Vec<NewsArticle>)),
    tag = "News"
)]
pub async fn latest_news(
    State(state): State<AppState>,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> Result<Json<Vec<NewsArticle>>, ApiError> {
    let Query(query) = query?;
    let limit = params::count(
        query.limit.as_deref(),
        DEFAULT_LATEST_LIMIT,
        params::MAX_NEWS_LIMIT,
    );
    Ok(Json(state.news.latest(limit).await))
}

/// Unknown symbols produce an empty list rather than a 404.
#[utoipa::path(
    get,
    path = "/api/news/{symbol}",
    params(("symbol" = String, Path, description = "Stock ticker symbol"), LimitQuery),
    responses((status = 200, description = "Headlines mentioning the symbol", body = Vec<NewsArticle>)),
    tag = "News"
)]
pub async fn symbol_news(
    State(state): State<AppState>,
    symbol: Result<Path<String>, PathRejection>,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> Result<Json<Vec<NewsArticle>>, ApiError> {
    let Path(symbol) = symbol?;
    let Query(query) = query?;
    let symbol = params::symbol(&symbol)?;
    let limit = params::count(
        query.limit.as_deref(),
        DEFAULT_SYMBOL_LIMIT,
        params::MAX_NEWS_LIMIT,
    );
    Ok(Json(state.news.for_symbol(&symbol, limit).await))
}
