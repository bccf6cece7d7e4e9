use crate::error::{AiError, AiResult};
use crate::AiConfig;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateResponse {
    fn into_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .find_map(|part| part.text)
            .filter(|text| !text.trim().is_empty())
    }
}

/// Client for the Gemini `generateContent` endpoint in JSON mode.
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(config: &AiConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Send `prompt` with a response schema and decode the model's JSON
    /// answer into `T`.
    pub async fn generate_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
        schema: Value,
    ) -> AiResult<T> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AiError::Unavailable("GEMINI_API_KEY not configured".to_string()))?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema,
            },
        });

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await?;

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => return Err(AiError::RateLimited),
            status if !status.is_success() => {
                tracing::warn!("Gemini returned {}", status);
                return Err(AiError::Unavailable(format!("Gemini returned {}", status)));
            }
            _ => {}
        }

        let text = response
            .json::<GenerateResponse>()
            .await?
            .into_text()
            .ok_or_else(|| AiError::InvalidResponse("empty response".to_string()))?;

        Ok(serde_json::from_str(&text)?)
    }
}
