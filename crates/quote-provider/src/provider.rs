use async_trait::async_trait;
use chrono::Utc;
use futures_util::future::join_all;
use market_core::{
    ChartDataPoint, ChartRange, DividendHistory, EarningsData, Fundamentals, InsiderTransaction,
    InstitutionalHolder, MarketDataSource, MarketIndex, MarketResult, Quote, SectorPerformance,
};
use std::future::Future;
use std::time::Duration;

use crate::cache::TtlCache;
use crate::error::{ProviderError, ProviderResult};
use crate::yahoo::{self, YahooApi, YahooClient, YahooSummary, DETAIL_MODULES};

pub const DEFAULT_SYMBOLS: &[&str] = &[
    "AAPL", "MSFT", "GOOGL", "AMZN", "NVDA", "META", "TSLA", "JPM", "JNJ", "V", "UNH", "HD",
    "PG", "MA", "NFLX",
];

/// Dashboard list: the defaults plus a few more liquid names.
pub const TRENDING_SYMBOLS: &[&str] = &[
    "AAPL", "MSFT", "GOOGL", "AMZN", "NVDA", "META", "TSLA", "JPM", "JNJ", "V", "UNH", "HD",
    "PG", "MA", "NFLX", "AMD", "INTC", "CRM", "BA", "GS", "XOM", "CVX",
];

/// (Yahoo symbol, display name)
pub const INDEX_SYMBOLS: &[(&str, &str)] = &[
    ("^GSPC", "S&P 500"),
    ("^DJI", "Dow Jones"),
    ("^IXIC", "NASDAQ"),
    ("^RUT", "Russell 2000"),
    ("^VIX", "Volatility Index"),
];

pub const SPARKLINE_POINTS: usize = 12;
const SEARCH_LIMIT: usize = 10;

/// Read-through cache in front of `key`'s upstream fetch. Errors are not cached.
async fn cached<T, F, Fut>(cache: &TtlCache<T>, key: String, fetch: F) -> ProviderResult<T>
where
    T: Clone,
    F: FnOnce() -> Fut,
    Fut: Future<Output = ProviderResult<T>>,
{
    if let Some(hit) = cache.get(&key) {
        tracing::debug!("Cache hit: {}", key);
        return Ok(hit);
    }
    let value = fetch().await?;
    cache.insert(key, value.clone());
    Ok(value)
}

/// Third-party market data behind per-kind TTL caches.
///
/// Implements [`MarketDataSource`] by swallowing provider errors: single
/// entities become `None`, collections become empty. Everything is logged.
pub struct CachedProvider<A = YahooClient> {
    api: A,
    quotes: TtlCache<Quote>,
    charts: TtlCache<Vec<ChartDataPoint>>,
    details: TtlCache<Fundamentals>,
    summaries: TtlCache<YahooSummary>,
    dividends: TtlCache<Vec<DividendHistory>>,
    searches: TtlCache<Vec<String>>,
    indices: TtlCache<Vec<MarketIndex>>,
    sectors: TtlCache<Vec<SectorPerformance>>,
}

impl CachedProvider<YahooClient> {
    pub fn yahoo(timeout: Duration, ttl: Duration, capacity: usize) -> Self {
        Self::new(YahooClient::new(timeout), ttl, capacity)
    }
}

impl<A: YahooApi> CachedProvider<A> {
    pub fn new(api: A, ttl: Duration, capacity: usize) -> Self {
        Self {
            api,
            quotes: TtlCache::new(ttl, capacity),
            charts: TtlCache::new(ttl, capacity),
            details: TtlCache::new(ttl, capacity),
            summaries: TtlCache::new(ttl, capacity),
            dividends: TtlCache::new(ttl, capacity),
            searches: TtlCache::new(ttl, capacity),
            indices: TtlCache::new(ttl, capacity),
            sectors: TtlCache::new(ttl, capacity),
        }
    }

    pub async fn fetch_quote(&self, symbol: &str) -> ProviderResult<Quote> {
        cached(&self.quotes, format!("quote_{}", symbol), || async {
            Ok::<_, ProviderError>(self.api.quote(symbol).await?.into_quote(symbol))
        })
        .await
    }

    pub async fn fetch_chart(
        &self,
        symbol: &str,
        range: ChartRange,
    ) -> ProviderResult<Vec<ChartDataPoint>> {
        let key = format!("historical_{}_{}", symbol, range.as_str());
        cached(&self.charts, key, || async {
            let (span, interval) = yahoo::chart_span(range);
            Ok::<_, ProviderError>(self.api.chart(symbol, span, interval).await?.bars())
        })
        .await
    }

    /// Last closes of the one-month chart. Empty when the chart is unavailable.
    pub async fn sparkline(&self, symbol: &str) -> Vec<f64> {
        match self.fetch_chart(symbol, ChartRange::OneMonth).await {
            Ok(bars) => {
                let skip = bars.len().saturating_sub(SPARKLINE_POINTS);
                bars[skip..].iter().map(|b| b.close).collect()
            }
            Err(e) => {
                tracing::debug!("No sparkline for {}: {}", symbol, e);
                Vec::new()
            }
        }
    }

    async fn quote_with_sparkline(&self, symbol: &str) -> ProviderResult<Quote> {
        let (quote, sparkline) = tokio::join!(self.fetch_quote(symbol), self.sparkline(symbol));
        let mut quote = quote?;
        quote.sparkline_data = sparkline;
        Ok(quote)
    }

    /// Fan out one request per symbol; failed symbols are dropped.
    pub async fn batch_quotes(&self, symbols: &[String], with_sparkline: bool) -> Vec<Quote> {
        let results = join_all(symbols.iter().map(|symbol| async move {
            let result = if with_sparkline {
                self.quote_with_sparkline(symbol).await
            } else {
                self.fetch_quote(symbol).await
            };
            (symbol, result)
        }))
        .await;

        results
            .into_iter()
            .filter_map(|(symbol, result)| match result {
                Ok(quote) => Some(quote),
                Err(e) => {
                    tracing::warn!("Dropping {} from batch: {}", symbol, e);
                    None
                }
            })
            .collect()
    }

    pub async fn fetch_fundamentals(&self, symbol: &str) -> ProviderResult<Fundamentals> {
        cached(&self.details, format!("details_{}", symbol), || async {
            let (quote, summary) = tokio::join!(
                self.api.quote(symbol),
                self.api.summary(symbol, DETAIL_MODULES)
            );
            let quote = quote?;
            let summary = summary.unwrap_or_else(|e| {
                tracing::warn!("Summary modules unavailable for {}: {}", symbol, e);
                YahooSummary::default()
            });
            Ok::<_, ProviderError>(yahoo::fundamentals(quote, summary, symbol, Utc::now()))
        })
        .await
    }

    async fn fetch_summary(&self, symbol: &str, module: &'static str) -> ProviderResult<YahooSummary> {
        let modules = [module];
        cached(&self.summaries, format!("{}_{}", module, symbol), || {
            self.api.summary(symbol, &modules)
        })
        .await
    }

    pub async fn fetch_dividends(&self, symbol: &str) -> ProviderResult<Vec<DividendHistory>> {
        cached(&self.dividends, format!("dividends_{}", symbol), || async {
            let (span, interval) = yahoo::chart_span(ChartRange::All);
            Ok::<_, ProviderError>(self.api.chart(symbol, span, interval).await?.dividends(symbol))
        })
        .await
    }

    /// Equity hits only, at most ten, then quoted concurrently.
    pub async fn search_symbols(&self, query: &str) -> ProviderResult<Vec<String>> {
        let key = format!("search_{}", query.to_lowercase());
        cached(&self.searches, key, || async {
            let hits = self.api.search(query).await?;
            let symbols: Vec<String> = hits
                .into_iter()
                .filter(|h| h.quote_type.as_deref() == Some("EQUITY"))
                .filter_map(|h| h.symbol)
                .take(SEARCH_LIMIT)
                .collect();
            Ok::<_, ProviderError>(symbols)
        })
        .await
    }

    /// Major indices; an index whose quote fails is reported as zeros.
    ///
    /// Only a complete set is cached, so a recovered upstream is picked up
    /// on the next call.
    pub async fn fetch_indices(&self) -> Vec<MarketIndex> {
        const KEY: &str = "market_indices";
        if let Some(hit) = self.indices.get(KEY) {
            tracing::debug!("Cache hit: {}", KEY);
            return hit;
        }

        let results = join_all(INDEX_SYMBOLS.iter().map(|(symbol, name)| async move {
            let display = symbol.trim_start_matches('^').to_string();
            match self.api.quote(symbol).await {
                Ok(q) => Ok(MarketIndex {
                    symbol: display,
                    name: name.to_string(),
                    value: q.regular_market_price.unwrap_or(0.0),
                    change: q.regular_market_change.unwrap_or(0.0),
                    change_percent: q.regular_market_change_percent.unwrap_or(0.0),
                }),
                Err(e) => {
                    tracing::warn!("Index {} unavailable: {}", symbol, e);
                    Err(MarketIndex {
                        symbol: display,
                        name: name.to_string(),
                        value: 0.0,
                        change: 0.0,
                        change_percent: 0.0,
                    })
                }
            }
        }))
        .await;

        let complete = results.iter().all(Result::is_ok);
        let indices: Vec<MarketIndex> = results
            .into_iter()
            .map(|r| r.unwrap_or_else(|zeroed| zeroed))
            .collect();
        if complete {
            self.indices.insert(KEY.to_string(), indices.clone());
        }
        indices
    }

    /// Sector moves over the trending list, using each name's profile sector.
    pub async fn fetch_sectors(&self) -> Vec<SectorPerformance> {
        let result = cached(&self.sectors, "sector_performance".to_string(), || async {
            let symbols: Vec<String> = TRENDING_SYMBOLS.iter().map(|s| s.to_string()).collect();
            let quotes = self.batch_quotes(&symbols, false).await;
            if quotes.is_empty() {
                return Err(ProviderError::Unavailable("no sector quotes".to_string()));
            }
            let profiles = join_all(
                quotes
                    .iter()
                    .map(|q| self.fetch_summary(&q.symbol, "summaryProfile")),
            )
            .await;

            let classified: Vec<Quote> = quotes
                .into_iter()
                .zip(profiles)
                .map(|(mut quote, profile)| {
                    if let Some(sector) = profile.ok().and_then(|p| p.sector()) {
                        quote.sector = sector;
                    }
                    quote
                })
                .collect();
            Ok::<_, ProviderError>(SectorPerformance::aggregate(&classified))
        })
        .await;

        result.unwrap_or_else(|e| {
            tracing::warn!("Sector performance unavailable: {}", e);
            Vec::new()
        })
    }
}

/// `NotFound` is expected for unknown symbols; anything else is worth a warning.
fn log_failure(what: &str, symbol: &str, e: &ProviderError) {
    match e {
        ProviderError::NotFound(_) => tracing::debug!("{} not found for {}", what, symbol),
        _ => tracing::warn!("Failed to fetch {} for {}: {}", what, symbol, e),
    }
}

/// Collection records: unknown symbol is `None`, other failures are empty.
fn records<T>(what: &str, symbol: &str, result: ProviderResult<Vec<T>>, limit: usize) -> Option<Vec<T>> {
    match result {
        Ok(mut items) => {
            items.truncate(limit);
            Some(items)
        }
        Err(ProviderError::NotFound(_)) => {
            tracing::debug!("{} not found for {}", what, symbol);
            None
        }
        Err(e) => {
            tracing::warn!("Failed to fetch {} for {}: {}", what, symbol, e);
            Some(Vec::new())
        }
    }
}

#[async_trait]
impl<A: YahooApi> MarketDataSource for CachedProvider<A> {
    fn default_symbols(&self) -> Vec<String> {
        DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect()
    }

    async fn quotes(&self) -> MarketResult<Vec<Quote>> {
        let symbols: Vec<String> = TRENDING_SYMBOLS.iter().map(|s| s.to_string()).collect();
        Ok(self.batch_quotes(&symbols, true).await)
    }

    async fn quote(&self, symbol: &str) -> MarketResult<Option<Quote>> {
        match self.quote_with_sparkline(symbol).await {
            Ok(quote) => Ok(Some(quote)),
            Err(e) => {
                log_failure("quote", symbol, &e);
                Ok(None)
            }
        }
    }

    async fn search(&self, query: &str) -> MarketResult<Vec<Quote>> {
        match self.search_symbols(query).await {
            Ok(symbols) if symbols.is_empty() => Ok(Vec::new()),
            Ok(symbols) => Ok(self.batch_quotes(&symbols, false).await),
            Err(e) => {
                tracing::warn!("Search for {:?} failed: {}", query, e);
                Ok(Vec::new())
            }
        }
    }

    async fn fundamentals(&self, symbol: &str) -> MarketResult<Option<Fundamentals>> {
        match self.fetch_fundamentals(symbol).await {
            Ok(f) => Ok(Some(f)),
            Err(e) => {
                log_failure("fundamentals", symbol, &e);
                Ok(None)
            }
        }
    }

    async fn chart(&self, symbol: &str, range: ChartRange) -> MarketResult<Vec<ChartDataPoint>> {
        match self.fetch_chart(symbol, range).await {
            Ok(bars) => Ok(bars),
            Err(e) => {
                log_failure("chart", symbol, &e);
                Ok(Vec::new())
            }
        }
    }

    async fn earnings(
        &self,
        symbol: &str,
        quarters: usize,
    ) -> MarketResult<Option<Vec<EarningsData>>> {
        let result = self
            .fetch_summary(symbol, "earningsHistory")
            .await
            .map(|s| s.earnings(symbol));
        Ok(records("earnings", symbol, result, quarters))
    }

    async fn dividends(
        &self,
        symbol: &str,
        count: usize,
    ) -> MarketResult<Option<Vec<DividendHistory>>> {
        let result = self.fetch_dividends(symbol).await;
        Ok(records("dividends", symbol, result, count))
    }

    async fn insiders(
        &self,
        symbol: &str,
        count: usize,
    ) -> MarketResult<Option<Vec<InsiderTransaction>>> {
        let result = self
            .fetch_summary(symbol, "insiderTransactions")
            .await
            .map(|s| s.insiders(symbol));
        Ok(records("insider transactions", symbol, result, count))
    }

    async fn institutions(&self, symbol: &str) -> MarketResult<Option<Vec<InstitutionalHolder>>> {
        let result = self
            .fetch_summary(symbol, "institutionOwnership")
            .await
            .map(|s| s.institutions(symbol));
        Ok(records("institutional holders", symbol, result, usize::MAX))
    }

    async fn indices(&self) -> MarketResult<Vec<MarketIndex>> {
        Ok(self.fetch_indices().await)
    }

    async fn sectors(&self) -> MarketResult<Vec<SectorPerformance>> {
        Ok(self.fetch_sectors().await)
    }

    fn source_name(&self) -> &'static str {
        "yahoo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::yahoo::{YahooChart, YahooQuote, YahooSearchHit};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Counts upstream calls; knows AAPL and MSFT, fails everything else.
    #[derive(Default)]
    struct FakeYahoo {
        quote_calls: AtomicUsize,
        chart_calls: AtomicUsize,
        summary_down: bool,
        quotes_down: AtomicBool,
        indices_known: bool,
    }

    fn known(symbol: &str) -> Option<f64> {
        match symbol {
            "AAPL" => Some(180.0),
            "MSFT" => Some(400.0),
            "^GSPC" => Some(5100.0),
            _ => None,
        }
    }

    #[async_trait]
    impl YahooApi for FakeYahoo {
        async fn quote(&self, symbol: &str) -> ProviderResult<YahooQuote> {
            self.quote_calls.fetch_add(1, Ordering::SeqCst);
            if self.quotes_down.load(Ordering::SeqCst) {
                return Err(ProviderError::Unavailable("down".to_string()));
            }
            let price = known(symbol)
                .or_else(|| (self.indices_known && symbol.starts_with('^')).then_some(100.0))
                .ok_or_else(|| ProviderError::NotFound(symbol.to_string()))?;
            Ok(YahooQuote {
                symbol: Some(symbol.to_string()),
                short_name: Some(format!("{} Corp", symbol)),
                regular_market_price: Some(price),
                regular_market_change: Some(1.0),
                regular_market_volume: Some(1_000_000.0),
                ..Default::default()
            })
        }

        async fn chart(&self, symbol: &str, _range: &str, _interval: &str) -> ProviderResult<YahooChart> {
            self.chart_calls.fetch_add(1, Ordering::SeqCst);
            let price = known(symbol).ok_or(ProviderError::Unavailable("down".to_string()))?;
            let n = 20;
            let json = serde_json::json!({
                "timestamp": (0..n).map(|i| 1_700_000_000 + i * 86_400).collect::<Vec<i64>>(),
                "indicators": { "quote": [{
                    "open": vec![price; n as usize],
                    "high": vec![price + 1.0; n as usize],
                    "low": vec![price - 1.0; n as usize],
                    "close": (0..n).map(|i| price + i as f64).collect::<Vec<f64>>(),
                    "volume": vec![1000; n as usize]
                }]}
            });
            serde_json::from_value(json).map_err(|e| ProviderError::InvalidResponse(e.to_string()))
        }

        async fn search(&self, _query: &str) -> ProviderResult<Vec<YahooSearchHit>> {
            let mut hits: Vec<YahooSearchHit> = (0..12)
                .map(|_| YahooSearchHit {
                    symbol: Some("AAPL".to_string()),
                    quote_type: Some("EQUITY".to_string()),
                })
                .collect();
            hits.insert(
                0,
                YahooSearchHit {
                    symbol: Some("AAPL240315C00180000".to_string()),
                    quote_type: Some("OPTION".to_string()),
                },
            );
            Ok(hits)
        }

        async fn summary(&self, symbol: &str, _modules: &[&str]) -> ProviderResult<YahooSummary> {
            if self.summary_down {
                return Err(ProviderError::Unavailable("down".to_string()));
            }
            known(symbol).ok_or_else(|| ProviderError::NotFound(symbol.to_string()))?;
            Ok(YahooSummary::default())
        }
    }

    fn provider(api: FakeYahoo) -> CachedProvider<FakeYahoo> {
        CachedProvider::new(api, Duration::from_secs(60), 64)
    }

    #[tokio::test(start_paused = true)]
    async fn test_quote_cached_until_ttl() {
        let p = provider(FakeYahoo::default());

        let first = p.fetch_quote("AAPL").await.unwrap();
        tokio::time::advance(Duration::from_secs(30)).await;
        let second = p.fetch_quote("AAPL").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(p.api.quote_calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(31)).await;
        p.fetch_quote("AAPL").await.unwrap();
        assert_eq!(p.api.quote_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let p = provider(FakeYahoo::default());
        assert!(p.quote("ZZZZ").await.unwrap().is_none());
        assert!(p.quote("ZZZZ").await.unwrap().is_none());
        assert_eq!(p.api.quote_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_quote_carries_sparkline() {
        let p = provider(FakeYahoo::default());
        let quote = p.quote("AAPL").await.unwrap().unwrap();
        assert_eq!(quote.sparkline_data.len(), SPARKLINE_POINTS);
        assert_eq!(quote.sparkline_data.last(), Some(&199.0));
    }

    #[tokio::test]
    async fn test_batch_drops_failures() {
        let p = provider(FakeYahoo::default());
        let symbols: Vec<String> = ["AAPL", "ZZZZ", "MSFT"].iter().map(|s| s.to_string()).collect();
        let quotes = p.batch_quotes(&symbols, false).await;
        let mut got: Vec<&str> = quotes.iter().map(|q| q.symbol.as_str()).collect();
        got.sort();
        assert_eq!(got, vec!["AAPL", "MSFT"]);
    }

    #[tokio::test]
    async fn test_indices_zero_filled() {
        let p = provider(FakeYahoo::default());
        let indices = p.indices().await.unwrap();
        assert_eq!(indices.len(), 5);
        assert_eq!(indices[0].symbol, "GSPC");
        assert_eq!(indices[0].value, 5100.0);
        assert!(indices[1..].iter().all(|i| i.value == 0.0));
    }

    #[tokio::test]
    async fn test_search_keeps_equities_only() {
        let p = provider(FakeYahoo::default());
        let symbols = p.search_symbols("apple").await.unwrap();
        assert_eq!(symbols.len(), SEARCH_LIMIT);
        assert!(symbols.iter().all(|s| s == "AAPL"));
    }

    #[tokio::test]
    async fn test_fundamentals_survive_summary_outage() {
        let p = provider(FakeYahoo {
            summary_down: true,
            ..Default::default()
        });
        let f = p.fundamentals("AAPL").await.unwrap().unwrap();
        assert_eq!(f.price, 180.0);
        assert_eq!(f.sector, "Unknown");

        // Records degrade to empty rather than 404 when the upstream is down.
        assert_eq!(p.earnings("AAPL", 8).await.unwrap(), Some(vec![]));
    }

    #[tokio::test]
    async fn test_unknown_symbol_records_absent() {
        let p = provider(FakeYahoo::default());
        assert!(p.earnings("ZZZZ", 8).await.unwrap().is_none());
        assert!(p.fundamentals("ZZZZ").await.unwrap().is_none());
        assert!(p.chart("ZZZZ", ChartRange::OneMonth).await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_outage_indices_not_cached() {
        let p = provider(FakeYahoo::default());
        p.api.quotes_down.store(true, Ordering::SeqCst);
        let down = p.indices().await.unwrap();
        assert!(down.iter().all(|i| i.value == 0.0));

        p.api.quotes_down.store(false, Ordering::SeqCst);
        tokio::time::advance(Duration::from_secs(5)).await;
        let up = p.indices().await.unwrap();
        assert_eq!(up[0].value, 5100.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_complete_indices_cached() {
        let p = provider(FakeYahoo {
            indices_known: true,
            ..Default::default()
        });
        p.indices().await.unwrap();
        p.indices().await.unwrap();
        assert_eq!(p.api.quote_calls.load(Ordering::SeqCst), INDEX_SYMBOLS.len());
    }

    #[tokio::test]
    async fn test_partial_indices_refetched() {
        let p = provider(FakeYahoo::default());
        p.indices().await.unwrap();
        p.indices().await.unwrap();
        assert_eq!(p.api.quote_calls.load(Ordering::SeqCst), INDEX_SYMBOLS.len() * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_outage_sectors_not_cached() {
        let p = provider(FakeYahoo::default());
        p.api.quotes_down.store(true, Ordering::SeqCst);
        assert!(p.sectors().await.unwrap().is_empty());

        p.api.quotes_down.store(false, Ordering::SeqCst);
        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(!p.sectors().await.unwrap().is_empty());
    }
}
