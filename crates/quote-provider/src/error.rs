use thiserror::Error;

/// Why a provider call produced no data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("Provider rate limit exceeded")]
    RateLimited,

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Symbol not found: {0}")]
    NotFound(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        // Request URLs may carry credentials or user input.
        let e = e.without_url();
        if e.is_decode() {
            ProviderError::InvalidResponse(e.to_string())
        } else {
            ProviderError::Unavailable(e.to_string())
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;
