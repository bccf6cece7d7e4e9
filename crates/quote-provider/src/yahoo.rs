//! Yahoo Finance over plain HTTP.
//!
//! Responses are deserialized into the explicit optional-field types below and
//! converted to `market_core` types in one place, where missing values are
//! defaulted.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use market_core::format::round2;
use market_core::{
    ChartDataPoint, ChartRange, DividendHistory, EarningsData, Fundamentals, InsiderTransaction,
    InstitutionalHolder, Quote, TransactionType,
};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{ProviderError, ProviderResult};

const BASE_URL: &str = "https://query2.finance.yahoo.com";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// quoteSummary modules needed for [`Fundamentals`].
pub const DETAIL_MODULES: &[&str] = &[
    "summaryProfile",
    "summaryDetail",
    "financialData",
    "defaultKeyStatistics",
];

/// Yahoo `range`/`interval` pair for a dashboard chart range.
pub fn chart_span(range: ChartRange) -> (&'static str, &'static str) {
    match range {
        ChartRange::OneDay => ("1d", "5m"),
        ChartRange::OneWeek => ("5d", "1d"),
        ChartRange::OneMonth => ("1mo", "1d"),
        ChartRange::ThreeMonths => ("3mo", "1d"),
        ChartRange::OneYear => ("1y", "1wk"),
        ChartRange::All => ("5y", "1mo"),
    }
}

// -- Wire types --------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YahooQuote {
    pub symbol: Option<String>,
    pub short_name: Option<String>,
    pub long_name: Option<String>,
    pub regular_market_price: Option<f64>,
    pub regular_market_change: Option<f64>,
    pub regular_market_change_percent: Option<f64>,
    pub regular_market_volume: Option<f64>,
    pub regular_market_previous_close: Option<f64>,
    pub regular_market_open: Option<f64>,
    pub regular_market_day_high: Option<f64>,
    pub regular_market_day_low: Option<f64>,
    pub market_cap: Option<f64>,
    pub sector: Option<String>,
    pub exchange: Option<String>,
    pub currency: Option<String>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
    #[serde(rename = "averageDailyVolume3Month")]
    pub average_daily_volume_3_month: Option<f64>,
    #[serde(rename = "averageDailyVolume10Day")]
    pub average_daily_volume_10_day: Option<f64>,
    #[serde(rename = "trailingPE")]
    pub trailing_pe: Option<f64>,
    #[serde(rename = "forwardPE")]
    pub forward_pe: Option<f64>,
    #[serde(rename = "priceToSalesTrailing12Months")]
    pub price_to_sales: Option<f64>,
    pub price_to_book: Option<f64>,
    pub eps_trailing_twelve_months: Option<f64>,
    pub trailing_annual_dividend_rate: Option<f64>,
    pub trailing_annual_dividend_yield: Option<f64>,
    pub fifty_day_average: Option<f64>,
    pub two_hundred_day_average: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteEnvelope {
    quote_response: QuoteResponse,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    result: Option<Vec<YahooQuote>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YahooApiError {
    pub code: Option<String>,
    pub description: Option<String>,
}

/// quoteSummary wraps numbers as `{ "raw": 1.23, "fmt": "1.23" }`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct RawNumber {
    pub raw: Option<f64>,
}

fn raw(value: &Option<RawNumber>) -> Option<f64> {
    value.and_then(|n| n.raw)
}

fn pct(value: &Option<RawNumber>) -> f64 {
    raw(value).map(|v| v * 100.0).unwrap_or(0.0)
}

fn epoch_date(seconds: f64) -> Option<String> {
    DateTime::from_timestamp(seconds as i64, 0).map(|d| d.format(DATE_FORMAT).to_string())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YahooSummary {
    pub summary_profile: Option<SummaryProfile>,
    pub summary_detail: Option<SummaryDetail>,
    pub financial_data: Option<FinancialData>,
    pub default_key_statistics: Option<KeyStatistics>,
    pub earnings_history: Option<EarningsHistory>,
    pub insider_transactions: Option<InsiderTransactions>,
    pub institution_ownership: Option<InstitutionOwnership>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryEnvelope {
    quote_summary: SummaryBody,
}

#[derive(Debug, Deserialize)]
struct SummaryBody {
    result: Option<Vec<YahooSummary>>,
    error: Option<YahooApiError>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryProfile {
    pub long_business_summary: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub country: Option<String>,
    pub website: Option<String>,
    pub full_time_employees: Option<f64>,
    #[serde(default)]
    pub company_officers: Vec<Officer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Officer {
    pub name: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryDetail {
    pub payout_ratio: Option<RawNumber>,
    pub ex_dividend_date: Option<RawNumber>,
    pub five_year_avg_dividend_yield: Option<RawNumber>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialData {
    pub profit_margins: Option<RawNumber>,
    pub operating_margins: Option<RawNumber>,
    pub gross_margins: Option<RawNumber>,
    pub return_on_assets: Option<RawNumber>,
    pub return_on_equity: Option<RawNumber>,
    pub total_revenue: Option<RawNumber>,
    pub revenue_per_share: Option<RawNumber>,
    pub revenue_growth: Option<RawNumber>,
    pub gross_profits: Option<RawNumber>,
    pub ebitda: Option<RawNumber>,
    pub total_cash: Option<RawNumber>,
    pub total_debt: Option<RawNumber>,
    pub debt_to_equity: Option<RawNumber>,
    pub current_ratio: Option<RawNumber>,
    pub quick_ratio: Option<RawNumber>,
    pub target_high_price: Option<RawNumber>,
    pub target_low_price: Option<RawNumber>,
    pub target_mean_price: Option<RawNumber>,
    pub target_median_price: Option<RawNumber>,
    pub recommendation_mean: Option<RawNumber>,
    pub recommendation_key: Option<String>,
    pub number_of_analyst_opinions: Option<RawNumber>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyStatistics {
    #[serde(rename = "52WeekChange")]
    pub fifty_two_week_change: Option<RawNumber>,
    pub shares_outstanding: Option<RawNumber>,
    pub float_shares: Option<RawNumber>,
    pub shares_short: Option<RawNumber>,
    pub short_ratio: Option<RawNumber>,
    pub peg_ratio: Option<RawNumber>,
    pub enterprise_value: Option<RawNumber>,
    pub enterprise_to_revenue: Option<RawNumber>,
    pub enterprise_to_ebitda: Option<RawNumber>,
    pub earnings_quarterly_growth: Option<RawNumber>,
    pub book_value: Option<RawNumber>,
    pub beta: Option<RawNumber>,
    pub held_percent_institutions: Option<RawNumber>,
    pub held_percent_insiders: Option<RawNumber>,
    pub net_income_to_common: Option<RawNumber>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EarningsHistory {
    #[serde(default)]
    pub history: Vec<EarningsRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsRecord {
    pub quarter: Option<RawNumber>,
    pub period: Option<String>,
    pub eps_actual: Option<RawNumber>,
    pub eps_estimate: Option<RawNumber>,
    pub eps_difference: Option<RawNumber>,
    pub surprise_percent: Option<RawNumber>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InsiderTransactions {
    #[serde(default)]
    pub transactions: Vec<InsiderRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsiderRecord {
    pub filer_name: Option<String>,
    pub filer_relation: Option<String>,
    pub transaction_text: Option<String>,
    pub start_date: Option<RawNumber>,
    pub shares: Option<RawNumber>,
    pub value: Option<RawNumber>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstitutionOwnership {
    #[serde(default)]
    pub ownership_list: Vec<OwnershipRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnershipRecord {
    pub organization: Option<String>,
    pub report_date: Option<RawNumber>,
    pub pct_held: Option<RawNumber>,
    pub position: Option<RawNumber>,
    pub value: Option<RawNumber>,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<YahooChart>>,
    error: Option<YahooApiError>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct YahooChart {
    #[serde(default)]
    pub timestamp: Vec<i64>,
    #[serde(default)]
    pub indicators: ChartIndicators,
    #[serde(default)]
    pub events: ChartEvents,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChartIndicators {
    #[serde(default)]
    pub quote: Vec<ChartSeries>,
}

/// Parallel arrays; Yahoo sends `null` for intervals without trades.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChartSeries {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChartEvents {
    #[serde(default)]
    pub dividends: HashMap<String, DividendEvent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DividendEvent {
    pub amount: f64,
    pub date: i64,
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(default)]
    quotes: Vec<YahooSearchHit>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YahooSearchHit {
    pub symbol: Option<String>,
    pub quote_type: Option<String>,
}

// -- Conversion --------------------------------------------------------------

impl YahooQuote {
    pub fn into_quote(self, requested: &str) -> Quote {
        Quote {
            name: self
                .short_name
                .or(self.long_name)
                .unwrap_or_else(|| requested.to_string()),
            symbol: self.symbol.unwrap_or_else(|| requested.to_string()),
            price: self.regular_market_price.unwrap_or(0.0),
            change: self.regular_market_change.unwrap_or(0.0),
            change_percent: self.regular_market_change_percent.unwrap_or(0.0),
            volume: self.regular_market_volume.unwrap_or(0.0) as u64,
            market_cap: self.market_cap.unwrap_or(0.0) as u64,
            sector: self.sector.unwrap_or_else(|| "Unknown".to_string()),
            exchange: self.exchange.unwrap_or_else(|| "Unknown".to_string()),
            sparkline_data: Vec::new(),
        }
    }
}

impl YahooChart {
    /// OHLCV bars with ISO-8601 labels. Intervals without a close are skipped.
    pub fn bars(&self) -> Vec<ChartDataPoint> {
        let Some(series) = self.indicators.quote.first() else {
            return Vec::new();
        };
        let at = |v: &Vec<Option<f64>>, i: usize| v.get(i).copied().flatten();

        self.timestamp
            .iter()
            .enumerate()
            .filter_map(|(i, ts)| {
                let close = at(&series.close, i)?;
                let time = DateTime::<Utc>::from_timestamp(*ts, 0)?
                    .to_rfc3339_opts(SecondsFormat::Millis, true);
                Some(ChartDataPoint {
                    time,
                    open: at(&series.open, i).unwrap_or(0.0),
                    high: at(&series.high, i).unwrap_or(0.0),
                    low: at(&series.low, i).unwrap_or(0.0),
                    close,
                    volume: at(&series.volume, i).unwrap_or(0.0) as u64,
                })
            })
            .collect()
    }

    /// Dividend events, newest first.
    pub fn dividends(&self, symbol: &str) -> Vec<DividendHistory> {
        let mut events: Vec<&DividendEvent> = self.events.dividends.values().collect();
        events.sort_by(|a, b| b.date.cmp(&a.date));
        events
            .into_iter()
            .filter_map(|e| {
                Some(DividendHistory {
                    symbol: symbol.to_string(),
                    date: epoch_date(e.date as f64)?,
                    amount: round2(e.amount),
                    dividend_type: "Cash".to_string(),
                })
            })
            .collect()
    }
}

impl YahooSummary {
    pub fn earnings(&self, symbol: &str) -> Vec<EarningsData> {
        let Some(history) = &self.earnings_history else {
            return Vec::new();
        };
        let mut records: Vec<(f64, EarningsData)> = history
            .history
            .iter()
            .map(|r| {
                let quarter_end = raw(&r.quarter).unwrap_or(0.0);
                let actual_eps = raw(&r.eps_actual).unwrap_or(0.0);
                let estimated_eps = raw(&r.eps_estimate).unwrap_or(0.0);
                let label = epoch_date(quarter_end)
                    .and_then(|d| quarter_label(&d))
                    .or_else(|| r.period.clone())
                    .unwrap_or_default();
                let record = EarningsData {
                    symbol: symbol.to_string(),
                    quarter: label,
                    date: epoch_date(quarter_end).unwrap_or_default(),
                    actual_eps,
                    estimated_eps,
                    surprise: raw(&r.eps_difference).unwrap_or(actual_eps - estimated_eps),
                    surprise_percent: pct(&r.surprise_percent),
                    revenue: 0,
                    estimated_revenue: 0,
                };
                (quarter_end, record)
            })
            .collect();
        records.sort_by(|a, b| b.0.total_cmp(&a.0));
        records.into_iter().map(|(_, r)| r).collect()
    }

    pub fn insiders(&self, symbol: &str) -> Vec<InsiderTransaction> {
        let Some(insiders) = &self.insider_transactions else {
            return Vec::new();
        };
        insiders
            .transactions
            .iter()
            .map(|t| {
                let shares = raw(&t.shares).unwrap_or(0.0).abs();
                let value = raw(&t.value).unwrap_or(0.0).abs();
                let text = t.transaction_text.as_deref().unwrap_or_default().to_lowercase();
                let transaction_type = if text.contains("purchase") || text.contains("buy") {
                    TransactionType::Buy
                } else {
                    TransactionType::Sell
                };
                InsiderTransaction {
                    symbol: symbol.to_string(),
                    name: t.filer_name.clone().unwrap_or_default(),
                    title: t.filer_relation.clone().unwrap_or_default(),
                    transaction_date: raw(&t.start_date).and_then(epoch_date).unwrap_or_default(),
                    transaction_type,
                    shares: shares as u64,
                    price: if shares > 0.0 { round2(value / shares) } else { 0.0 },
                    value,
                }
            })
            .collect()
    }

    pub fn institutions(&self, symbol: &str) -> Vec<InstitutionalHolder> {
        let Some(ownership) = &self.institution_ownership else {
            return Vec::new();
        };
        ownership
            .ownership_list
            .iter()
            .map(|o| InstitutionalHolder {
                symbol: symbol.to_string(),
                holder: o.organization.clone().unwrap_or_default(),
                shares: raw(&o.position).unwrap_or(0.0) as u64,
                date_reported: raw(&o.report_date).and_then(epoch_date).unwrap_or_default(),
                percent_held: round2(pct(&o.pct_held)),
                value: raw(&o.value).unwrap_or(0.0),
            })
            .collect()
    }

    /// Sector from the profile module, if present.
    pub fn sector(&self) -> Option<String> {
        self.summary_profile.as_ref()?.sector.clone()
    }
}

/// `2024-03-31` → `Q1 2024`
fn quarter_label(date: &str) -> Option<String> {
    let mut parts = date.split('-');
    let year = parts.next()?;
    let month: u32 = parts.next()?.parse().ok()?;
    Some(format!("Q{} {}", (month - 1) / 3 + 1, year))
}

/// Merge a quote and its summary modules into [`Fundamentals`].
pub fn fundamentals(
    quote: YahooQuote,
    summary: YahooSummary,
    requested: &str,
    now: DateTime<Utc>,
) -> Fundamentals {
    let profile = summary.summary_profile.unwrap_or_default();
    let detail = summary.summary_detail.unwrap_or_default();
    let financial = summary.financial_data.unwrap_or_default();
    let stats = summary.default_key_statistics.unwrap_or_default();

    let ceo = profile
        .company_officers
        .iter()
        .find(|o| {
            o.title
                .as_deref()
                .is_some_and(|t| t.contains("CEO") || t.contains("Chief Executive"))
        })
        .and_then(|o| o.name.clone())
        .unwrap_or_default();

    let num = |v: &Option<RawNumber>| raw(v).unwrap_or(0.0);

    Fundamentals {
        symbol: quote.symbol.clone().unwrap_or_else(|| requested.to_string()),
        name: quote
            .short_name
            .clone()
            .or_else(|| quote.long_name.clone())
            .unwrap_or_else(|| requested.to_string()),
        description: profile.long_business_summary.unwrap_or_default(),
        sector: profile.sector.unwrap_or_else(|| "Unknown".to_string()),
        industry: profile.industry.unwrap_or_else(|| "Unknown".to_string()),
        exchange: quote.exchange.clone().unwrap_or_else(|| "Unknown".to_string()),
        currency: quote.currency.clone().unwrap_or_else(|| "USD".to_string()),
        country: profile.country.unwrap_or_else(|| "Unknown".to_string()),
        website: profile.website.unwrap_or_default(),
        employees: profile.full_time_employees.unwrap_or(0.0) as u64,
        ceo,

        price: quote.regular_market_price.unwrap_or(0.0),
        change: quote.regular_market_change.unwrap_or(0.0),
        change_percent: quote.regular_market_change_percent.unwrap_or(0.0),
        previous_close: quote.regular_market_previous_close.unwrap_or(0.0),
        open: quote.regular_market_open.unwrap_or(0.0),
        day_high: quote.regular_market_day_high.unwrap_or(0.0),
        day_low: quote.regular_market_day_low.unwrap_or(0.0),

        fifty_two_week_high: quote.fifty_two_week_high.unwrap_or(0.0),
        fifty_two_week_low: quote.fifty_two_week_low.unwrap_or(0.0),
        fifty_two_week_change: pct(&stats.fifty_two_week_change),

        volume: quote.regular_market_volume.unwrap_or(0.0) as u64,
        avg_volume: quote.average_daily_volume_3_month.unwrap_or(0.0) as u64,
        avg_volume_10_day: quote.average_daily_volume_10_day.unwrap_or(0.0) as u64,

        market_cap: quote.market_cap.unwrap_or(0.0) as u64,
        shares_outstanding: num(&stats.shares_outstanding) as u64,
        shares_float: num(&stats.float_shares) as u64,
        shares_short: num(&stats.shares_short) as u64,
        short_ratio: num(&stats.short_ratio),

        pe_ratio: quote.trailing_pe.unwrap_or(0.0),
        forward_pe: quote.forward_pe.unwrap_or(0.0),
        peg_ratio: num(&stats.peg_ratio),
        price_to_sales: quote.price_to_sales.unwrap_or(0.0),
        price_to_book: quote.price_to_book.unwrap_or(0.0),
        enterprise_value: num(&stats.enterprise_value).max(0.0) as u64,
        ev_to_revenue: num(&stats.enterprise_to_revenue),
        ev_to_ebitda: num(&stats.enterprise_to_ebitda),

        profit_margin: pct(&financial.profit_margins),
        operating_margin: pct(&financial.operating_margins),
        gross_margin: pct(&financial.gross_margins),
        return_on_assets: pct(&financial.return_on_assets),
        return_on_equity: pct(&financial.return_on_equity),

        revenue: num(&financial.total_revenue) as u64,
        revenue_per_share: num(&financial.revenue_per_share),
        revenue_growth: pct(&financial.revenue_growth),
        gross_profit: num(&financial.gross_profits) as u64,
        ebitda: num(&financial.ebitda).max(0.0) as u64,
        net_income: num(&stats.net_income_to_common) as i64,
        eps: quote.eps_trailing_twelve_months.unwrap_or(0.0),
        eps_growth: pct(&stats.earnings_quarterly_growth),

        total_cash: num(&financial.total_cash) as u64,
        total_debt: num(&financial.total_debt) as u64,
        debt_to_equity: num(&financial.debt_to_equity),
        current_ratio: num(&financial.current_ratio),
        quick_ratio: num(&financial.quick_ratio),
        book_value: num(&stats.book_value),

        dividend_rate: quote.trailing_annual_dividend_rate.unwrap_or(0.0),
        dividend_yield: quote.trailing_annual_dividend_yield.unwrap_or(0.0) * 100.0,
        payout_ratio: pct(&detail.payout_ratio),
        ex_dividend_date: raw(&detail.ex_dividend_date).and_then(epoch_date),
        dividend_date: None,
        five_year_dividend_yield: num(&detail.five_year_avg_dividend_yield),

        beta: num(&stats.beta),
        fifty_day_ma: quote.fifty_day_average.unwrap_or(0.0),
        two_hundred_day_ma: quote.two_hundred_day_average.unwrap_or(0.0),

        target_high_price: num(&financial.target_high_price),
        target_low_price: num(&financial.target_low_price),
        target_mean_price: num(&financial.target_mean_price),
        target_median_price: num(&financial.target_median_price),
        recommendation_mean: num(&financial.recommendation_mean),
        recommendation_key: financial
            .recommendation_key
            .unwrap_or_else(|| "hold".to_string()),
        number_of_analysts: num(&financial.number_of_analyst_opinions) as u32,

        institutional_ownership: pct(&stats.held_percent_institutions),
        insider_ownership: pct(&stats.held_percent_insiders),

        earnings_date: None,
        earnings_quarterly_growth: pct(&stats.earnings_quarterly_growth),

        last_updated: now,
    }
}

// -- Client ------------------------------------------------------------------

/// The four Yahoo endpoints the provider depends on.
#[async_trait]
pub trait YahooApi: Send + Sync {
    async fn quote(&self, symbol: &str) -> ProviderResult<YahooQuote>;

    async fn chart(&self, symbol: &str, range: &str, interval: &str) -> ProviderResult<YahooChart>;

    async fn search(&self, query: &str) -> ProviderResult<Vec<YahooSearchHit>>;

    async fn summary(&self, symbol: &str, modules: &[&str]) -> ProviderResult<YahooSummary>;
}

#[derive(Clone)]
pub struct YahooClient {
    client: Client,
    base_url: String,
}

impl YahooClient {
    pub fn new(timeout: Duration) -> Self {
        Self::with_base_url(BASE_URL, timeout)
    }

    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        symbol: &str,
    ) -> ProviderResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.get(&url).query(query).send().await?;

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => {
                tracing::warn!("Yahoo rate limited request for {}", symbol);
                return Err(ProviderError::RateLimited);
            }
            StatusCode::NOT_FOUND => return Err(ProviderError::NotFound(symbol.to_string())),
            status if !status.is_success() => {
                return Err(ProviderError::Unavailable(format!("HTTP {}", status)));
            }
            _ => {}
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }
}

fn api_error(error: Option<YahooApiError>, symbol: &str) -> ProviderError {
    match error {
        Some(e) if e.code.as_deref() == Some("Not Found") => {
            ProviderError::NotFound(symbol.to_string())
        }
        Some(e) => ProviderError::InvalidResponse(
            e.description
                .or(e.code)
                .unwrap_or_else(|| "unspecified error".to_string()),
        ),
        None => ProviderError::NotFound(symbol.to_string()),
    }
}

#[async_trait]
impl YahooApi for YahooClient {
    async fn quote(&self, symbol: &str) -> ProviderResult<YahooQuote> {
        let envelope: QuoteEnvelope = self
            .get_json("/v7/finance/quote", &[("symbols", symbol)], symbol)
            .await?;
        envelope
            .quote_response
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| ProviderError::NotFound(symbol.to_string()))
    }

    async fn chart(&self, symbol: &str, range: &str, interval: &str) -> ProviderResult<YahooChart> {
        let path = format!("/v8/finance/chart/{}", symbol);
        let envelope: ChartEnvelope = self
            .get_json(
                &path,
                &[("range", range), ("interval", interval), ("events", "div")],
                symbol,
            )
            .await?;
        match envelope.chart.result.and_then(|r| r.into_iter().next()) {
            Some(chart) => Ok(chart),
            None => Err(api_error(envelope.chart.error, symbol)),
        }
    }

    async fn search(&self, query: &str) -> ProviderResult<Vec<YahooSearchHit>> {
        let envelope: SearchEnvelope = self
            .get_json(
                "/v1/finance/search",
                &[("q", query), ("newsCount", "0")],
                query,
            )
            .await?;
        Ok(envelope.quotes)
    }

    async fn summary(&self, symbol: &str, modules: &[&str]) -> ProviderResult<YahooSummary> {
        let path = format!("/v10/finance/quoteSummary/{}", symbol);
        let modules = modules.join(",");
        let envelope: SummaryEnvelope = self
            .get_json(&path, &[("modules", modules.as_str())], symbol)
            .await?;
        match envelope.quote_summary.result.and_then(|r| r.into_iter().next()) {
            Some(summary) => Ok(summary),
            None => Err(api_error(envelope.quote_summary.error, symbol)),
        }
    }
}
