//! Sentiment API Routes
//!
//! Gemini and FinBERT classification of free text, single and batched.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use market_core::{SentimentResult, SentimentScore};
use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::params::{self, TextRequest};
use crate::AppState;

pub fn sentiment_routes() -> Router<AppState> {
    Router::new()
        .route("/api/sentiment/gemini", post(gemini_sentiment))
        .route("/api/sentiment/huggingface", post(finbert_sentiment))
        .route("/api/sentiment/batch", post(batch_sentiment))
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct BatchRequest {
    /// Non-empty list of texts; only the first ten are classified.
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub texts: Value,
}

impl BatchRequest {
    fn texts(&self) -> Result<Vec<String>, ApiError> {
        const REQUIRED: ApiError = ApiError::BadRequest("texts array is required");

        let items = match &self.texts {
            Value::Array(items) if !items.is_empty() => items,
            _ => return Err(REQUIRED),
        };

        items
            .iter()
            .take(ai_client::MAX_BATCH_TEXTS)
            .map(|item| {
                let text = item.as_str().ok_or(REQUIRED)?;
                params::text(text).map(str::to_string)
            })
            .collect()
    }
}

#[utoipa::path(
    post,
    path = "/api/sentiment/gemini",
    request_body = TextRequest,
    responses(
        (status = 200, description = "Sentiment label and score in [-1, 1]", body = SentimentScore),
        (status = 400, description = "Invalid request body")
    ),
    tag = "Sentiment"
)]
pub async fn gemini_sentiment(
    State(state): State<AppState>,
    payload: Result<Json<TextRequest>, JsonRejection>,
) -> Result<Json<SentimentScore>, ApiError> {
    let Json(request) = payload?;
    let text = params::text(&request.text)?;
    Ok(Json(state.ai.sentiment(text).await))
}

#[utoipa::path(
    post,
    path = "/api/sentiment/huggingface",
    request_body = TextRequest,
    responses(
        (status = 200, description = "FinBERT classification", body = SentimentResult),
        (status = 400, description = "Invalid request body")
    ),
    tag = "Sentiment"
)]
pub async fn finbert_sentiment(
    State(state): State<AppState>,
    payload: Result<Json<TextRequest>, JsonRejection>,
) -> Result<Json<SentimentResult>, ApiError> {
    let Json(request) = payload?;
    let text = params::text(&request.text)?;
    Ok(Json(state.ai.classify(text).await))
}

#[utoipa::path(
    post,
    path = "/api/sentiment/batch",
    request_body = BatchRequest,
    responses(
        (status = 200, description = "One result per text, in request order", body = Vec<SentimentResult>),
        (status = 400, description = "texts array is required")
    ),
    tag = "Sentiment"
)]
pub async fn batch_sentiment(
    State(state): State<AppState>,
    payload: Result<Json<BatchRequest>, JsonRejection>,
) -> Result<Json<Vec<SentimentResult>>, ApiError> {
    let Json(request) =
        payload.map_err(|_| ApiError::BadRequest("texts array is required"))?;
    let texts = request.texts()?;
    Ok(Json(state.ai.classify_batch(&texts).await))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn batch(texts: Value) -> Result<Vec<String>, String> {
        BatchRequest { texts }.texts().map_err(|e| e.to_string())
    }

    #[test]
    fn test_batch_shape_validation() {
        assert_eq!(batch(json!([])), Err("texts array is required".to_string()));
        assert_eq!(batch(json!("one")), Err("texts array is required".to_string()));
        assert_eq!(batch(json!([1, 2])), Err("texts array is required".to_string()));
        assert_eq!(batch(json!([""])), Err("Invalid request body".to_string()));
        assert_eq!(batch(json!(["a", "b"])), Ok(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn test_batch_takes_first_ten() {
        let texts: Vec<String> = (0..15).map(|i| format!("text {}", i)).collect();
        let taken = batch(json!(texts)).unwrap();
        assert_eq!(taken.len(), 10);
        assert_eq!(taken[9], "text 9");
    }
}
