//! Stock API Routes
//!
//! Quotes, search, fundamentals, charts and the extended per-symbol records.

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::get,
    Json, Router,
};
use market_core::{
    ChartDataPoint, ChartRange, DividendHistory, EarningsData, Fundamentals, InsiderTransaction,
    InstitutionalHolder, Quote,
};
use market_sim::fundamentals::{
    DEFAULT_DIVIDEND_COUNT, DEFAULT_EARNINGS_QUARTERS, DEFAULT_INSIDER_COUNT,
};

use crate::error::ApiError;
use crate::params::{self, CountQuery, QuartersQuery, RangeQuery, SearchQuery};
use crate::AppState;

pub fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/api/stocks", get(list_stocks))
        .route("/api/symbols", get(list_symbols))
        .route("/api/stocks/search", get(search_stocks))
        .route("/api/stocks/:symbol", get(get_stock))
        .route("/api/stocks/:symbol/fundamentals", get(get_fundamentals))
        .route("/api/stocks/:symbol/chart", get(get_chart))
        .route("/api/stocks/:symbol/earnings", get(get_earnings))
        .route("/api/stocks/:symbol/dividends", get(get_dividends))
        .route("/api/stocks/:symbol/insiders", get(get_insiders))
        .route("/api/stocks/:symbol/institutions", get(get_institutions))
}

fn found<T>(value: Option<T>) -> Result<Json<T>, ApiError> {
    value.map(Json).ok_or(ApiError::NotFound("Stock not found"))
}

#[utoipa::path(
    get,
    path = "/api/stocks",
    responses((status = 200, description = "Dashboard quotes with sparklines", body = Vec<Quote>)),
    tag = "Stocks"
)]
pub async fn list_stocks(State(state): State<AppState>) -> Result<Json<Vec<Quote>>, ApiError> {
    let quotes = state
        .market
        .quotes()
        .await
        .map_err(ApiError::context("Failed to fetch stocks"))?;
    Ok(Json(quotes))
}

#[utoipa::path(
    get,
    path = "/api/symbols",
    responses((status = 200, description = "Default watchlist symbols", body = Vec<String>)),
    tag = "Stocks"
)]
pub async fn list_symbols(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.market.default_symbols())
}

#[utoipa::path(
    get,
    path = "/api/stocks/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Quotes matching the query", body = Vec<Quote>),
        (status = 400, description = "Missing or invalid query")
    ),
    tag = "Stocks"
)]
pub async fn search_stocks(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<Quote>>, ApiError> {
    let Query(query) = query?;
    let q = query.validated()?;
    let quotes = state
        .market
        .search(q)
        .await
        .map_err(ApiError::context("Failed to search stocks"))?;
    Ok(Json(quotes))
}

#[utoipa::path(
    get,
    path = "/api/stocks/{symbol}",
    params(("symbol" = String, Path, description = "Stock ticker symbol")),
    responses(
        (status = 200, description = "Quote snapshot", body = Quote),
        (status = 404, description = "Stock not found")
    ),
    tag = "Stocks"
)]
pub async fn get_stock(
    State(state): State<AppState>,
    symbol: Result<Path<String>, PathRejection>,
) -> Result<Json<Quote>, ApiError> {
    let Path(symbol) = symbol?;
    let symbol = params::symbol(&symbol)?;
    let quote = state
        .market
        .quote(&symbol)
        .await
        .map_err(ApiError::context("Failed to fetch stock"))?;
    found(quote)
}

#[utoipa::path(
    get,
    path = "/api/stocks/{symbol}/fundamentals",
    params(("symbol" = String, Path, description = "Stock ticker symbol")),
    responses(
        (status = 200, description = "Extended fundamentals", body = Fundamentals),
        (status = 404, description = "Stock not found")
    ),
    tag = "Stocks"
)]
pub async fn get_fundamentals(
    State(state): State<AppState>,
    symbol: Result<Path<String>, PathRejection>,
) -> Result<Json<Fundamentals>, ApiError> {
    let Path(symbol) = symbol?;
    let symbol = params::symbol(&symbol)?;
    let fundamentals = state
        .market
        .fundamentals(&symbol)
        .await
        .map_err(ApiError::context("Failed to fetch fundamentals"))?;
    found(fundamentals)
}

#[utoipa::path(
    get,
    path = "/api/stocks/{symbol}/chart",
    params(("symbol" = String, Path, description = "Stock ticker symbol"), RangeQuery),
    responses(
        (status = 200, description = "OHLCV bars, oldest first", body = Vec<ChartDataPoint>),
        (status = 404, description = "Chart data not found")
    ),
    tag = "Stocks"
)]
pub async fn get_chart(
    State(state): State<AppState>,
    symbol: Result<Path<String>, PathRejection>,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> Result<Json<Vec<ChartDataPoint>>, ApiError> {
    let Path(symbol) = symbol?;
    let Query(query) = query?;
    let symbol = params::symbol(&symbol)?;
    let range = query
        .range
        .as_deref()
        .map(ChartRange::parse)
        .unwrap_or_default();

    let bars = state
        .market
        .chart(&symbol, range)
        .await
        .map_err(ApiError::context("Failed to fetch chart data"))?;

    if bars.is_empty() {
        return Err(ApiError::NotFound("Chart data not found"));
    }
    Ok(Json(bars))
}

#[utoipa::path(
    get,
    path = "/api/stocks/{symbol}/earnings",
    params(("symbol" = String, Path, description = "Stock ticker symbol"), QuartersQuery),
    responses(
        (status = 200, description = "Quarterly earnings, newest first", body = Vec<EarningsData>),
        (status = 404, description = "Stock not found")
    ),
    tag = "Stocks"
)]
pub async fn get_earnings(
    State(state): State<AppState>,
    symbol: Result<Path<String>, PathRejection>,
    query: Result<Query<QuartersQuery>, QueryRejection>,
) -> Result<Json<Vec<EarningsData>>, ApiError> {
    let Path(symbol) = symbol?;
    let Query(query) = query?;
    let symbol = params::symbol(&symbol)?;
    let quarters = params::count(
        query.quarters.as_deref(),
        DEFAULT_EARNINGS_QUARTERS,
        params::MAX_QUARTERS,
    );
    let earnings = state
        .market
        .earnings(&symbol, quarters)
        .await
        .map_err(ApiError::context("Failed to fetch earnings"))?;
    found(earnings)
}

#[utoipa::path(
    get,
    path = "/api/stocks/{symbol}/dividends",
    params(("symbol" = String, Path, description = "Stock ticker symbol"), CountQuery),
    responses(
        (status = 200, description = "Dividend payments, newest first", body = Vec<DividendHistory>),
        (status = 404, description = "Stock not found")
    ),
    tag = "Stocks"
)]
pub async fn get_dividends(
    State(state): State<AppState>,
    symbol: Result<Path<String>, PathRejection>,
    query: Result<Query<CountQuery>, QueryRejection>,
) -> Result<Json<Vec<DividendHistory>>, ApiError> {
    let Path(symbol) = symbol?;
    let Query(query) = query?;
    let symbol = params::symbol(&symbol)?;
    let count = params::count(
        query.count.as_deref(),
        DEFAULT_DIVIDEND_COUNT,
        params::MAX_COUNT,
    );
    let dividends = state
        .market
        .dividends(&symbol, count)
        .await
        .map_err(ApiError::context("Failed to fetch dividends"))?;
    found(dividends)
}

#[utoipa::path(
    get,
    path = "/api/stocks/{symbol}/insiders",
    params(("symbol" = String, Path, description = "Stock ticker symbol"), CountQuery),
    responses(
        (status = 200, description = "Insider transactions, newest first", body = Vec<InsiderTransaction>),
        (status = 404, description = "Stock not found")
    ),
    tag = "Stocks"
)]
pub async fn get_insiders(
    State(state): State<AppState>,
    symbol: Result<Path<String>, PathRejection>,
    query: Result<Query<CountQuery>, QueryRejection>,
) -> Result<Json<Vec<InsiderTransaction>>, ApiError> {
    let Path(symbol) = symbol?;
    let Query(query) = query?;
    let symbol = params::symbol(&symbol)?;
    let count = params::count(
        query.count.as_deref(),
        DEFAULT_INSIDER_COUNT,
        params::MAX_COUNT,
    );
    let insiders = state
        .market
        .insiders(&symbol, count)
        .await
        .map_err(ApiError::context("Failed to fetch insider transactions"))?;
    found(insiders)
}

#[utoipa::path(
    get,
    path = "/api/stocks/{symbol}/institutions",
    params(("symbol" = String, Path, description = "Stock ticker symbol")),
    responses(
        (status = 200, description = "Largest institutional holders", body = Vec<InstitutionalHolder>),
        (status = 404, description = "Stock not found")
    ),
    tag = "Stocks"
)]
pub async fn get_institutions(
    State(state): State<AppState>,
    symbol: Result<Path<String>, PathRejection>,
) -> Result<Json<Vec<InstitutionalHolder>>, ApiError> {
    let Path(symbol) = symbol?;
    let symbol = params::symbol(&symbol)?;
    let holders = state
        .market
        .institutions(&symbol)
        .await
        .map_err(ApiError::context("Failed to fetch institutional holders"))?;
    found(holders)
}
