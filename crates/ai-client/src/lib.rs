#![recursion_limit = "256"]

pub mod error;
pub mod fallback;
pub mod finbert;
pub mod gemini;
pub mod service;

pub use error::{AiError, AiResult};
pub use finbert::{FinBertClient, FINBERT_MODEL};
pub use gemini::GeminiClient;
pub use service::{AnalysisService, MAX_BATCH_TEXTS};

use std::time::Duration;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_HUGGINGFACE_MODEL_URL: &str =
    "https://api-inference.huggingface.co/models/ProsusAI/finbert";

/// Configuration for the hosted model services.
///
/// A missing key is not an error: the corresponding calls report
/// `Unavailable` and callers use the local fallback.
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub huggingface_api_key: Option<String>,
    pub huggingface_model_url: String,
    pub timeout: Duration,
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl AiConfig {
    pub fn from_env() -> Self {
        Self {
            gemini_api_key: non_empty_var("GEMINI_API_KEY"),
            gemini_model: non_empty_var("GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_base_url: non_empty_var("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            huggingface_api_key: non_empty_var("HUGGINGFACE_API_KEY"),
            huggingface_model_url: non_empty_var("HUGGINGFACE_MODEL_URL")
                .unwrap_or_else(|| DEFAULT_HUGGINGFACE_MODEL_URL.to_string()),
            timeout: Duration::from_secs(
                non_empty_var("AI_TIMEOUT_SECS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }

    /// No keys; every call goes straight to the fallback.
    pub fn offline() -> Self {
        Self {
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            huggingface_api_key: None,
            huggingface_model_url: DEFAULT_HUGGINGFACE_MODEL_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
