use async_trait::async_trait;

use crate::{
    ChartDataPoint, ChartRange, DividendHistory, EarningsData, Fundamentals, InsiderTransaction,
    InstitutionalHolder, MarketIndex, MarketResult, Quote, SectorPerformance,
};

/// Backend-agnostic source of market data.
///
/// Implemented by the synthetic generator and by the cached third-party
/// provider. `Ok(None)` means the symbol is unknown to the source; the HTTP
/// layer turns it into a 404.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Symbols shown on the dashboard by default.
    fn default_symbols(&self) -> Vec<String>;

    /// Dashboard list, each quote carrying its sparkline.
    async fn quotes(&self) -> MarketResult<Vec<Quote>>;

    async fn quote(&self, symbol: &str) -> MarketResult<Option<Quote>>;

    /// Case-insensitive match over symbol, name and sector.
    async fn search(&self, query: &str) -> MarketResult<Vec<Quote>>;

    async fn fundamentals(&self, symbol: &str) -> MarketResult<Option<Fundamentals>>;

    /// An empty series means the symbol has no chart.
    async fn chart(&self, symbol: &str, range: ChartRange) -> MarketResult<Vec<ChartDataPoint>>;

    async fn earnings(&self, symbol: &str, quarters: usize)
        -> MarketResult<Option<Vec<EarningsData>>>;

    async fn dividends(&self, symbol: &str, count: usize)
        -> MarketResult<Option<Vec<DividendHistory>>>;

    async fn insiders(&self, symbol: &str, count: usize)
        -> MarketResult<Option<Vec<InsiderTransaction>>>;

    async fn institutions(&self, symbol: &str) -> MarketResult<Option<Vec<InstitutionalHolder>>>;

    async fn indices(&self) -> MarketResult<Vec<MarketIndex>>;

    async fn sectors(&self) -> MarketResult<Vec<SectorPerformance>>;

    // -- Meta ----------------------------------------------------------------
    fn source_name(&self) -> &'static str;
}
