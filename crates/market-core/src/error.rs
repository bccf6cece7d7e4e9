use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

pub type MarketResult<T> = Result<T, MarketError>;
