//! Third-party quote provider (Yahoo Finance) behind a bounded TTL cache.

pub mod cache;
pub mod error;
pub mod provider;
pub mod yahoo;

pub use cache::{TtlCache, DEFAULT_CAPACITY, DEFAULT_TTL};
pub use error::{ProviderError, ProviderResult};
pub use provider::CachedProvider;
pub use yahoo::{YahooApi, YahooClient};
