use ai_client::AiConfig;
use std::time::Duration;

/// Which market data backend serves the stock endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Synthetic,
    Yahoo,
}

impl DataSource {
    /// Anything other than `yahoo` selects the synthetic generator.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("yahoo") {
            DataSource::Yahoo
        } else {
            DataSource::Synthetic
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_source: DataSource,
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
    pub enable_hsts: bool,
    pub ai: AiConfig,
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_or("PORT", 5000),
            data_source: DataSource::parse(&std::env::var("DATA_SOURCE").unwrap_or_default()),
            cache_ttl: Duration::from_secs(env_or("CACHE_TTL_SECS", 60)),
            cache_capacity: env_or("CACHE_CAPACITY", 1024),
            enable_hsts: std::env::var("ENABLE_HSTS")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false),
            ai: AiConfig::from_env(),
        }
    }

    /// Synthetic data, no AI keys. Used by tests and local demos.
    pub fn offline() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            data_source: DataSource::Synthetic,
            cache_ttl: Duration::from_secs(60),
            cache_capacity: 1024,
            enable_hsts: false,
            ai: AiConfig::offline(),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_source_parse() {
        assert_eq!(DataSource::parse("yahoo"), DataSource::Yahoo);
        assert_eq!(DataSource::parse(" YAHOO "), DataSource::Yahoo);
        assert_eq!(DataSource::parse("synthetic"), DataSource::Synthetic);
        assert_eq!(DataSource::parse(""), DataSource::Synthetic);
        assert_eq!(DataSource::parse("polygon"), DataSource::Synthetic);
    }

    #[test]
    fn test_offline_bind_addr() {
        assert_eq!(ServerConfig::offline().bind_addr(), "127.0.0.1:0");
    }
}
