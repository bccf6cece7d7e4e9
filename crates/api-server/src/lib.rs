//! HTTP layer: routing, middleware and shared state for the dashboard API.

pub mod ai_routes;
pub mod config;
pub mod error;
pub mod health_routes;
pub mod market_routes;
pub mod news_routes;
pub mod params;
pub mod request_id;
pub mod security_headers;
pub mod sentiment_routes;
pub mod stock_routes;

use std::sync::Arc;

use ai_client::AnalysisService;
use anyhow::Context;
use axum::{
    extract::Request,
    http::Method,
    middleware,
    routing::get,
    Json, Router,
};
use market_core::MarketDataSource;
use market_sim::{NewsFeed, SyntheticMarket};
use quote_provider::CachedProvider;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

pub use config::{DataSource, ServerConfig};
pub use error::ApiError;

use ai_routes::ai_routes;
use health_routes::health_routes;
use market_routes::market_routes;
use news_routes::news_routes;
use request_id::request_id_middleware;
use security_headers::security_headers_middleware;
use sentiment_routes::sentiment_routes;
use stock_routes::stock_routes;

#[derive(OpenApi)]
#[openapi(
    info(title = "Market Pulse API", description = "Stock market dashboard data, news and AI insights"),
    paths(
        stock_routes::list_stocks,
        stock_routes::list_symbols,
        stock_routes::search_stocks,
        stock_routes::get_stock,
        stock_routes::get_fundamentals,
        stock_routes::get_chart,
        stock_routes::get_earnings,
        stock_routes::get_dividends,
        stock_routes::get_insiders,
        stock_routes::get_institutions,
        market_routes::list_indices,
        market_routes::list_sectors,
        market_routes::market_summary,
        news_routes::latest_news,
        news_routes::symbol_news,
        ai_routes::get_prediction,
        ai_routes::get_analysis,
        sentiment_routes::gemini_sentiment,
        sentiment_routes::finbert_sentiment,
        sentiment_routes::batch_sentiment,
        health_routes::health,
    ),
    tags(
        (name = "Stocks", description = "Quotes, fundamentals, charts and per-symbol records"),
        (name = "Market", description = "Indices, sectors and market summary"),
        (name = "News", description = "Generated headlines with sentiment"),
        (name = "AI", description = "Predictions and analysis with local fallbacks"),
        (name = "Sentiment", description = "Text sentiment classification"),
        (name = "Health", description = "Service status"),
    )
)]
pub struct ApiDoc;

/// Shared application state. Exactly one market data source is active.
#[derive(Clone)]
pub struct AppState {
    pub market: Arc<dyn MarketDataSource>,
    pub news: Arc<NewsFeed>,
    pub ai: Arc<AnalysisService>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(
        market: Arc<dyn MarketDataSource>,
        news: NewsFeed,
        ai: AnalysisService,
        config: ServerConfig,
    ) -> Self {
        Self {
            market,
            news: Arc::new(news),
            ai: Arc::new(ai),
            config: Arc::new(config),
        }
    }

    pub fn from_config(config: ServerConfig) -> Self {
        let market: Arc<dyn MarketDataSource> = match config.data_source {
            DataSource::Synthetic => Arc::new(SyntheticMarket::new()),
            DataSource::Yahoo => Arc::new(CachedProvider::yahoo(
                config.ai.timeout,
                config.cache_ttl,
                config.cache_capacity,
            )),
        };
        let ai = AnalysisService::new(&config.ai);
        Self::new(market, NewsFeed::new(), ai, config)
    }
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

async fn not_found() -> ApiError {
    ApiError::NotFound("Not found")
}

pub fn build_router(state: AppState) -> Router {
    let enable_hsts = state.config.enable_hsts;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = tracing::field::Empty,
        )
    });

    Router::new()
        .merge(stock_routes())
        .merge(market_routes())
        .merge(news_routes())
        .merge(ai_routes())
        .merge(sentiment_routes())
        .merge(health_routes())
        .route("/api/openapi.json", get(openapi_json))
        .fallback(not_found)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(cors)
                .layer(middleware::from_fn_with_state(
                    enable_hsts,
                    security_headers_middleware,
                ))
                .layer(trace)
                .layer(middleware::from_fn(request_id_middleware)),
        )
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

pub async fn run_server() -> anyhow::Result<()> {
    let config = ServerConfig::from_env();
    let addr = config.bind_addr();
    let state = AppState::from_config(config);

    tracing::info!(
        data_source = state.market.source_name(),
        gemini = state.ai.gemini_configured(),
        huggingface = state.ai.finbert_configured(),
        "Starting API server on {}",
        addr
    );
    if !state.ai.gemini_configured() {
        tracing::warn!("GEMINI_API_KEY not set, AI endpoints will use local fallbacks");
    }

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}
