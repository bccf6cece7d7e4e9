use thiserror::Error;

/// Failure reasons for the hosted model calls. Every variant is recoverable
/// by falling back to a local heuristic.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AiError {
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for AiError {
    fn from(e: reqwest::Error) -> Self {
        // Request URLs may carry credentials or user input.
        let e = e.without_url();
        if e.is_decode() {
            AiError::InvalidResponse(e.to_string())
        } else if e.is_timeout() {
            AiError::Unavailable("timeout".to_string())
        } else {
            AiError::Unavailable(e.to_string())
        }
    }
}

impl From<serde_json::Error> for AiError {
    fn from(e: serde_json::Error) -> Self {
        AiError::InvalidResponse(e.to_string())
    }
}

pub type AiResult<T> = Result<T, AiError>;
