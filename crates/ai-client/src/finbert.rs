use crate::error::{AiError, AiResult};
use crate::AiConfig;
use market_core::{Sentiment, SentimentScore};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

pub const FINBERT_MODEL: &str = "ProsusAI/finbert";

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

/// The inference API nests results per input; some deployments return the
/// flat list instead.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClassifyResponse {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

impl ClassifyResponse {
    fn into_labels(self) -> Vec<LabelScore> {
        match self {
            ClassifyResponse::Nested(outer) => outer.into_iter().next().unwrap_or_default(),
            ClassifyResponse::Flat(labels) => labels,
        }
    }
}

/// Map the top label to a signed score.
fn to_score(labels: Vec<LabelScore>) -> Option<SentimentScore> {
    let top = labels
        .into_iter()
        .filter(|l| l.score.is_finite())
        .max_by(|a, b| a.score.total_cmp(&b.score))?;

    let sentiment = Sentiment::from_label(&top.label);
    let score = match sentiment {
        Sentiment::Positive => top.score,
        Sentiment::Negative => -top.score,
        Sentiment::Neutral => 0.0,
    };
    Some(SentimentScore { sentiment, score })
}

/// Client for the hosted FinBERT classifier.
pub struct FinBertClient {
    client: Client,
    api_key: Option<String>,
    url: String,
}

impl FinBertClient {
    pub fn new(config: &AiConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: config.huggingface_api_key.clone(),
            url: config.huggingface_model_url.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub async fn classify(&self, text: &str) -> AiResult<SentimentScore> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            AiError::Unavailable("HUGGINGFACE_API_KEY not configured".to_string())
        })?;

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(api_key)
            .json(&json!({ "inputs": text }))
            .send()
            .await?;

        match response.status() {
            StatusCode::SERVICE_UNAVAILABLE => {
                tracing::info!("FinBERT model is loading");
                return Err(AiError::Unavailable("model loading".to_string()));
            }
            StatusCode::TOO_MANY_REQUESTS => return Err(AiError::RateLimited),
            status if !status.is_success() => {
                return Err(AiError::Unavailable(format!("FinBERT returned {}", status)));
            }
            _ => {}
        }

        let labels = response.json::<ClassifyResponse>().await?.into_labels();
        to_score(labels).ok_or_else(|| AiError::InvalidResponse("no labels".to_string()))
    }
}
