use std::sync::Arc;

use ai_client::{AiConfig, AnalysisService};
use api_server::{build_router, AppState, ServerConfig};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use market_sim::{NewsFeed, SyntheticMarket};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> Router {
    let state = AppState::new(
        Arc::new(SyntheticMarket::with_seed(42)),
        NewsFeed::with_seed(42),
        AnalysisService::with_seed(&AiConfig::offline(), 42),
        ServerConfig::offline(),
    );
    build_router(state)
}

async fn send(request: Request<Body>) -> (StatusCode, Value) {
    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn get(uri: &str) -> (StatusCode, Value) {
    send(Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

async fn post(uri: &str, body: Value) -> (StatusCode, Value) {
    send(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

#[tokio::test]
async fn test_unknown_stock_is_404() {
    let (status, body) = get("/api/stocks/ZZZZ").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Stock not found" }));
}

#[tokio::test]
async fn test_known_stock_quote() {
    let (status, body) = get("/api/stocks/AAPL").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["symbol"], "AAPL");
    assert!(body["price"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn test_invalid_symbol_is_400() {
    let (status, body) = get("/api/stocks/TOOLONGSYMBOL").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid symbol");
}

#[tokio::test]
async fn test_stock_list_and_symbols() {
    let (status, body) = get("/api/stocks").await;
    assert_eq!(status, StatusCode::OK);
    let stocks = body.as_array().unwrap();
    assert!(!stocks.is_empty());
    assert!(stocks
        .iter()
        .all(|s| s["sparklineData"].as_array().map_or(false, |d| !d.is_empty())));

    let (status, body) = get("/api/symbols").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 15);
}

#[tokio::test]
async fn test_search_validation() {
    let (status, body) = get("/api/stocks/search?q=").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Query parameter 'q' is required");

    let (status, _) = get("/api/stocks/search").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let long = "x".repeat(101);
    let (status, body) = get(&format!("/api/stocks/search?q={}", long)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid search query");

    let (status, body) = get("/api/stocks/search?q=apple").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body
        .as_array()
        .unwrap()
        .iter()
        .any(|q| q["symbol"] == "AAPL"));
}

#[tokio::test]
async fn test_chart_lengths_per_range() {
    for (range, expected) in [
        ("1D", 78),
        ("1W", 35),
        ("1M", 22),
        ("3M", 65),
        ("1Y", 252),
        ("ALL", 500),
        ("6M", 22),
    ] {
        let (status, body) = get(&format!("/api/stocks/MSFT/chart?range={}", range)).await;
        assert_eq!(status, StatusCode::OK);
        let bars = body.as_array().unwrap();
        assert_eq!(bars.len(), expected, "range {}", range);
        for bar in bars {
            let open = bar["open"].as_f64().unwrap();
            let close = bar["close"].as_f64().unwrap();
            assert!(bar["low"].as_f64().unwrap() <= open.min(close));
            assert!(bar["high"].as_f64().unwrap() >= open.max(close));
        }
    }

    let (status, body) = get("/api/stocks/ZZZZ/chart").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Chart data not found");
}

#[tokio::test]
async fn test_extended_records() {
    let (status, body) = get("/api/stocks/JPM/fundamentals").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["symbol"], "JPM");

    let (_, body) = get("/api/stocks/JPM/earnings?quarters=4").await;
    assert_eq!(body.as_array().unwrap().len(), 4);

    let (_, body) = get("/api/stocks/JPM/earnings?quarters=abc").await;
    assert_eq!(body.as_array().unwrap().len(), 8);

    let (_, body) = get("/api/stocks/JPM/insiders?count=500").await;
    assert_eq!(body.as_array().unwrap().len(), 100);

    let (_, body) = get("/api/stocks/TSLA/dividends").await;
    assert!(body.as_array().unwrap().is_empty());

    let (status, _) = get("/api/stocks/ZZZZ/institutions").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_market_endpoints() {
    let (status, body) = get("/api/indices").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body.as_array().unwrap().is_empty());

    let (status, body) = get("/api/sectors").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body.as_array().unwrap().is_empty());

    let (status, body) = get("/api/market/summary").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["topGainers"].as_array().unwrap().len() <= 5);
    assert!(body["mostActive"].as_array().unwrap().len() == 5);
    assert!(body["marketStatus"].is_string());
}

#[tokio::test]
async fn test_news_limits() {
    let (status, body) = get("/api/news").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 20);

    let (_, body) = get("/api/news?limit=5").await;
    assert_eq!(body.as_array().unwrap().len(), 5);

    let (_, body) = get("/api/news?limit=1000").await;
    assert_eq!(body.as_array().unwrap().len(), 100);

    let (status, body) = get("/api/news/aapl?limit=5").await;
    assert_eq!(status, StatusCode::OK);
    let articles = body.as_array().unwrap();
    assert!(articles.len() <= 5);
    for article in articles {
        assert!(article["relatedSymbols"]
            .as_array()
            .unwrap()
            .contains(&json!("AAPL")));
    }
}

#[tokio::test]
async fn test_prediction_and_analysis_fall_back() {
    let (status, body) = get("/api/prediction/NVDA").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "fallback");
    let confidence = body["confidence"].as_f64().unwrap();
    assert!((60.0..85.0).contains(&confidence));
    assert_eq!(body["reasoning"].as_array().unwrap().len(), 3);

    let (status, body) = get("/api/analysis/NVDA").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["confidenceScore"], 70.0);

    let (status, body) = get("/api/prediction/ZZZZ").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Stock not found");
}

#[tokio::test]
async fn test_finbert_fallback_positive() {
    let (status, body) = post(
        "/api/sentiment/huggingface",
        json!({ "text": "Company reports record profit and strong growth" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sentiment"], "positive");
    assert!(body["score"].as_f64().unwrap() > 0.0);
    assert_eq!(body["model"], "ProsusAI/finbert");
}

#[tokio::test]
async fn test_sentiment_body_validation() {
    let (status, body) = post("/api/sentiment/gemini", json!({ "text": "" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request body");

    let (status, body) = post("/api/sentiment/gemini", json!({ "message": "hi" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request body");

    let (status, body) = post("/api/sentiment/gemini", json!({ "text": "x".repeat(5001) })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request body");

    let (status, body) = post("/api/sentiment/gemini", json!({ "text": "Shares drop on weak guidance and a downgrade" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sentiment"], "negative");
}

#[tokio::test]
async fn test_batch_sentiment() {
    let texts: Vec<String> = (0..12).map(|i| format!("headline {} shows strong growth and a profit beat", i)).collect();
    let (status, body) = post("/api/sentiment/batch", json!({ "texts": texts })).await;
    assert_eq!(status, StatusCode::OK);
    let results = body.as_array().unwrap();
    assert_eq!(results.len(), 10);
    assert_eq!(results[3]["text"], texts[3].as_str());
    assert!(results.iter().all(|r| r["model"] == "ProsusAI/finbert"));

    let (status, body) = post("/api/sentiment/batch", json!({ "texts": [] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "texts array is required");

    let (status, _) = post("/api/sentiment/batch", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_and_openapi() {
    let (status, body) = get("/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["services"]["gemini"], false);
    assert_eq!(body["services"]["huggingface"], false);
    assert_eq!(body["services"]["dataSource"], "synthetic");

    let (status, body) = get("/api/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/stocks/{symbol}"].is_object());
}

#[tokio::test]
async fn test_middleware_headers() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .header("x-request-id", "abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "abc-123");
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert!(response.headers().get("strict-transport-security").is_none());

    let response = app()
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let (status, body) = get("/api/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not found");
}

#[tokio::test]
async fn test_malformed_query_is_json_400() {
    let (status, body) = get("/api/stocks/search?q=a&q=b").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Invalid query parameters" }));

    let (status, body) = get("/api/news?limit=1&limit=2").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid query parameters");
}

#[tokio::test]
async fn test_undecodable_path_is_json_400() {
    for uri in ["/api/stocks/%FF", "/api/prediction/%FF", "/api/news/%FF"] {
        let (status, body) = get(uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body, json!({ "error": "Invalid symbol" }));
    }
}
