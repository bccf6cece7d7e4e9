//! Self-contained synthetic market: quotes, charts, fundamentals, extended
//! records and news generated from a fixed catalog.
//!
//! Every generator takes the random source as a parameter; [`SyntheticMarket`]
//! owns one behind an async mutex so the server can share it across requests.

pub mod catalog;
pub mod charts;
pub mod fundamentals;
pub mod news;
pub mod quotes;

use async_trait::async_trait;
use chrono::Utc;
use market_core::{
    ChartDataPoint, ChartRange, DividendHistory, EarningsData, Fundamentals, InsiderTransaction,
    InstitutionalHolder, MarketDataSource, MarketIndex, MarketResult, Quote, SectorPerformance,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::Mutex;

pub use catalog::{Listing, DEFAULT_SYMBOLS, LISTINGS};
pub use news::NewsFeed;

pub struct SyntheticMarket {
    rng: Mutex<StdRng>,
}

impl SyntheticMarket {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Reproducible market for tests and demos.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn listing(symbol: &str) -> Option<&'static Listing> {
        let listing = catalog::find(symbol);
        if listing.is_none() {
            tracing::debug!("Symbol {} not in synthetic catalog", symbol);
        }
        listing
    }
}

impl Default for SyntheticMarket {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataSource for SyntheticMarket {
    fn default_symbols(&self) -> Vec<String> {
        DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect()
    }

    async fn quotes(&self) -> MarketResult<Vec<Quote>> {
        let mut rng = self.rng.lock().await;
        Ok(quotes::all_quotes(&mut *rng))
    }

    async fn quote(&self, symbol: &str) -> MarketResult<Option<Quote>> {
        let Some(listing) = Self::listing(symbol) else {
            return Ok(None);
        };
        let mut rng = self.rng.lock().await;
        Ok(Some(quotes::quote(&mut *rng, listing)))
    }

    async fn search(&self, query: &str) -> MarketResult<Vec<Quote>> {
        let mut rng = self.rng.lock().await;
        Ok(quotes::search(&mut *rng, query))
    }

    async fn fundamentals(&self, symbol: &str) -> MarketResult<Option<Fundamentals>> {
        let Some(listing) = Self::listing(symbol) else {
            return Ok(None);
        };
        let mut rng = self.rng.lock().await;
        let quote = quotes::quote(&mut *rng, listing);
        Ok(Some(fundamentals::fundamentals(
            &mut *rng,
            listing,
            &quote,
            Utc::now(),
        )))
    }

    async fn chart(&self, symbol: &str, range: ChartRange) -> MarketResult<Vec<ChartDataPoint>> {
        let Some(listing) = Self::listing(symbol) else {
            return Ok(Vec::new());
        };
        let mut rng = self.rng.lock().await;
        Ok(charts::series(
            &mut *rng,
            listing.base_price,
            range,
            Utc::now().date_naive(),
        ))
    }

    async fn earnings(
        &self,
        symbol: &str,
        quarters: usize,
    ) -> MarketResult<Option<Vec<EarningsData>>> {
        let Some(listing) = Self::listing(symbol) else {
            return Ok(None);
        };
        let mut rng = self.rng.lock().await;
        Ok(Some(fundamentals::earnings(
            &mut *rng,
            listing,
            quarters,
            Utc::now().date_naive(),
        )))
    }

    async fn dividends(
        &self,
        symbol: &str,
        count: usize,
    ) -> MarketResult<Option<Vec<DividendHistory>>> {
        let Some(listing) = Self::listing(symbol) else {
            return Ok(None);
        };
        let mut rng = self.rng.lock().await;
        Ok(Some(fundamentals::dividends(
            &mut *rng,
            listing,
            count,
            Utc::now().date_naive(),
        )))
    }

    async fn insiders(
        &self,
        symbol: &str,
        count: usize,
    ) -> MarketResult<Option<Vec<InsiderTransaction>>> {
        let Some(listing) = Self::listing(symbol) else {
            return Ok(None);
        };
        let mut rng = self.rng.lock().await;
        Ok(Some(fundamentals::insiders(
            &mut *rng,
            listing,
            count,
            Utc::now().date_naive(),
        )))
    }

    async fn institutions(&self, symbol: &str) -> MarketResult<Option<Vec<InstitutionalHolder>>> {
        let Some(listing) = Self::listing(symbol) else {
            return Ok(None);
        };
        let mut rng = self.rng.lock().await;
        Ok(Some(fundamentals::institutions(
            &mut *rng,
            listing,
            Utc::now().date_naive(),
        )))
    }

    async fn indices(&self) -> MarketResult<Vec<MarketIndex>> {
        let mut rng = self.rng.lock().await;
        Ok(quotes::indices(&mut *rng))
    }

    async fn sectors(&self) -> MarketResult<Vec<SectorPerformance>> {
        let mut rng = self.rng.lock().await;
        Ok(quotes::sectors(&mut *rng))
    }

    fn source_name(&self) -> &'static str {
        "synthetic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_symbol_is_absent() {
        let market = SyntheticMarket::with_seed(1);
        assert!(market.quote("ZZZZ").await.unwrap().is_none());
        assert!(market.fundamentals("ZZZZ").await.unwrap().is_none());
        assert!(market.chart("ZZZZ", ChartRange::OneMonth).await.unwrap().is_empty());
        assert!(market.earnings("ZZZZ", 8).await.unwrap().is_none());
        assert!(market.institutions("ZZZZ").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lookup_is_case_insensitive() {
        let market = SyntheticMarket::with_seed(2);
        let quote = market.quote("aapl").await.unwrap().unwrap();
        assert_eq!(quote.symbol, "AAPL");
        assert!(quote.price > 0.0);
    }

    #[tokio::test]
    async fn test_consecutive_calls_differ() {
        let market = SyntheticMarket::with_seed(3);
        let first = market.quotes().await.unwrap();
        let second = market.quotes().await.unwrap();
        assert_eq!(first.len(), LISTINGS.len());
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_non_payer_dividends_empty() {
        let market = SyntheticMarket::with_seed(4);
        let divs = market.dividends("TSLA", 8).await.unwrap();
        assert_eq!(divs, Some(vec![]));
        assert_eq!(market.default_symbols().len(), 15);
        assert_eq!(market.source_name(), "synthetic");
    }
}
