use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use chrono_tz::America::New_York;
use serde::{Deserialize, Serialize};

use crate::format::round2;

/// Quote snapshot for a tradeable symbol.
///
/// `change` is not guaranteed to equal `price - previous close` on the
/// synthetic path; the two are generated independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: u64,
    pub market_cap: u64,
    pub sector: String,
    pub exchange: String,
    #[serde(default)]
    pub sparkline_data: Vec<f64>,
}

/// Extended per-symbol fundamentals. A superset of [`Quote`] minus the sparkline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Fundamentals {
    pub symbol: String,
    pub name: String,
    pub description: String,
    pub sector: String,
    pub industry: String,
    pub exchange: String,
    pub currency: String,
    pub country: String,
    pub website: String,
    pub employees: u64,
    pub ceo: String,

    // Price metrics
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub previous_close: f64,
    pub open: f64,
    pub day_high: f64,
    pub day_low: f64,

    // 52-week range
    pub fifty_two_week_high: f64,
    pub fifty_two_week_low: f64,
    pub fifty_two_week_change: f64,

    // Volume
    pub volume: u64,
    pub avg_volume: u64,
    #[serde(rename = "avgVolume10Day")]
    pub avg_volume_10_day: u64,

    // Market cap and shares
    pub market_cap: u64,
    pub shares_outstanding: u64,
    pub shares_float: u64,
    pub shares_short: u64,
    pub short_ratio: f64,

    // Valuation
    pub pe_ratio: f64,
    #[serde(rename = "forwardPE")]
    pub forward_pe: f64,
    pub peg_ratio: f64,
    pub price_to_sales: f64,
    pub price_to_book: f64,
    pub enterprise_value: u64,
    pub ev_to_revenue: f64,
    pub ev_to_ebitda: f64,

    // Profitability (percentages)
    pub profit_margin: f64,
    pub operating_margin: f64,
    pub gross_margin: f64,
    pub return_on_assets: f64,
    pub return_on_equity: f64,

    // Income statement
    pub revenue: u64,
    pub revenue_per_share: f64,
    pub revenue_growth: f64,
    pub gross_profit: u64,
    pub ebitda: u64,
    pub net_income: i64,
    pub eps: f64,
    pub eps_growth: f64,

    // Balance sheet
    pub total_cash: u64,
    pub total_debt: u64,
    pub debt_to_equity: f64,
    pub current_ratio: f64,
    pub quick_ratio: f64,
    pub book_value: f64,

    // Dividends
    pub dividend_rate: f64,
    pub dividend_yield: f64,
    pub payout_ratio: f64,
    pub ex_dividend_date: Option<String>,
    pub dividend_date: Option<String>,
    pub five_year_dividend_yield: f64,

    // Technicals
    pub beta: f64,
    #[serde(rename = "fiftyDayMA")]
    pub fifty_day_ma: f64,
    #[serde(rename = "twoHundredDayMA")]
    pub two_hundred_day_ma: f64,

    // Analyst coverage
    pub target_high_price: f64,
    pub target_low_price: f64,
    pub target_mean_price: f64,
    pub target_median_price: f64,
    pub recommendation_mean: f64,
    pub recommendation_key: String,
    pub number_of_analysts: u32,

    // Ownership (percentages)
    pub institutional_ownership: f64,
    pub insider_ownership: f64,

    // Earnings
    pub earnings_date: Option<String>,
    pub earnings_quarterly_growth: f64,

    pub last_updated: DateTime<Utc>,
}

/// Requested chart window. Unrecognized inputs fall back to [`ChartRange::OneMonth`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum ChartRange {
    #[serde(rename = "1D")]
    OneDay,
    #[serde(rename = "1W")]
    OneWeek,
    #[default]
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "ALL")]
    All,
}

impl ChartRange {
    pub const ALL_RANGES: [ChartRange; 6] = [
        ChartRange::OneDay,
        ChartRange::OneWeek,
        ChartRange::OneMonth,
        ChartRange::ThreeMonths,
        ChartRange::OneYear,
        ChartRange::All,
    ];

    /// Lenient parse: anything unknown maps to the one-month shape.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "1D" => ChartRange::OneDay,
            "1W" => ChartRange::OneWeek,
            "3M" => ChartRange::ThreeMonths,
            "1Y" => ChartRange::OneYear,
            "ALL" => ChartRange::All,
            _ => ChartRange::OneMonth,
        }
    }

    /// Number of bars a generated series carries for this range.
    pub fn points(&self) -> usize {
        match self {
            ChartRange::OneDay => 78,
            ChartRange::OneWeek => 35,
            ChartRange::OneMonth => 22,
            ChartRange::ThreeMonths => 65,
            ChartRange::OneYear => 252,
            ChartRange::All => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartRange::OneDay => "1D",
            ChartRange::OneWeek => "1W",
            ChartRange::OneMonth => "1M",
            ChartRange::ThreeMonths => "3M",
            ChartRange::OneYear => "1Y",
            ChartRange::All => "ALL",
        }
    }
}

/// One OHLCV bar. `time` is a display label whose granularity depends on the range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ChartDataPoint {
    pub time: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct EarningsData {
    pub symbol: String,
    pub quarter: String,
    pub date: String,
    #[serde(rename = "actualEPS")]
    pub actual_eps: f64,
    #[serde(rename = "estimatedEPS")]
    pub estimated_eps: f64,
    pub surprise: f64,
    pub surprise_percent: f64,
    pub revenue: u64,
    pub estimated_revenue: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DividendHistory {
    pub symbol: String,
    pub date: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub dividend_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Buy,
    Sell,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct InsiderTransaction {
    pub symbol: String,
    pub name: String,
    pub title: String,
    pub transaction_date: String,
    pub transaction_type: TransactionType,
    pub shares: u64,
    pub price: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct InstitutionalHolder {
    pub symbol: String,
    pub holder: String,
    pub shares: u64,
    pub date_reported: String,
    pub percent_held: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct MarketIndex {
    pub symbol: String,
    pub name: String,
    pub value: f64,
    pub change: f64,
    pub change_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SectorPerformance {
    pub sector: String,
    pub change: f64,
    pub change_percent: f64,
    pub market_cap: u64,
    pub volume: u64,
}

impl SectorPerformance {
    /// Mean move and summed size per sector, in first-seen order.
    pub fn aggregate(quotes: &[Quote]) -> Vec<SectorPerformance> {
        let mut order: Vec<&str> = Vec::new();
        for q in quotes {
            if !order.contains(&q.sector.as_str()) {
                order.push(q.sector.as_str());
            }
        }

        order
            .into_iter()
            .map(|sector| {
                let members: Vec<&Quote> = quotes.iter().filter(|q| q.sector == sector).collect();
                let n = members.len() as f64;
                SectorPerformance {
                    sector: sector.to_string(),
                    change: round2(members.iter().map(|q| q.change).sum::<f64>() / n),
                    change_percent: round2(
                        members.iter().map(|q| q.change_percent).sum::<f64>() / n,
                    ),
                    market_cap: members.iter().map(|q| q.market_cap).sum(),
                    volume: members.iter().map(|q| q.volume).sum(),
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "kebab-case")]
pub enum MarketStatus {
    Open,
    Closed,
    PreMarket,
    AfterHours,
}

impl MarketStatus {
    /// Session state for a UTC instant.
    ///
    /// Pre-market 04:00-09:30, regular 09:30-16:00, after-hours 16:00-20:00
    /// New York time (daylight saving aware); weekends are closed.
    pub fn at(now: DateTime<Utc>) -> Self {
        let eastern = now.with_timezone(&New_York);
        if matches!(eastern.weekday(), Weekday::Sat | Weekday::Sun) {
            return MarketStatus::Closed;
        }
        let minutes = eastern.hour() * 60 + eastern.minute();
        match minutes {
            240..=569 => MarketStatus::PreMarket,
            570..=959 => MarketStatus::Open,
            960..=1199 => MarketStatus::AfterHours,
            _ => MarketStatus::Closed,
        }
    }
}

/// Dashboard overview: indices, sector moves and the day's leaders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct MarketSummary {
    pub indices: Vec<MarketIndex>,
    pub sectors: Vec<SectorPerformance>,
    pub top_gainers: Vec<Quote>,
    pub top_losers: Vec<Quote>,
    pub most_active: Vec<Quote>,
    pub market_status: MarketStatus,
    pub last_updated: DateTime<Utc>,
}

impl MarketSummary {
    pub const LEADERS: usize = 5;

    /// Rank `quotes` into gainers, losers and most active.
    pub fn build(
        indices: Vec<MarketIndex>,
        sectors: Vec<SectorPerformance>,
        quotes: &[Quote],
        now: DateTime<Utc>,
    ) -> Self {
        let mut by_change: Vec<&Quote> = quotes.iter().collect();
        by_change.sort_by(|a, b| b.change_percent.total_cmp(&a.change_percent));

        let top_gainers = by_change
            .iter()
            .filter(|q| q.change_percent > 0.0)
            .take(Self::LEADERS)
            .map(|q| (*q).clone())
            .collect();
        let top_losers = by_change
            .iter()
            .rev()
            .filter(|q| q.change_percent < 0.0)
            .take(Self::LEADERS)
            .map(|q| (*q).clone())
            .collect();

        let mut by_volume: Vec<&Quote> = quotes.iter().collect();
        by_volume.sort_by(|a, b| b.volume.cmp(&a.volume));
        let most_active = by_volume
            .into_iter()
            .take(Self::LEADERS)
            .cloned()
            .collect();

        Self {
            indices,
            sectors,
            top_gainers,
            top_losers,
            most_active,
            market_status: MarketStatus::at(now),
            last_updated: now,
        }
    }
}

/// Three-way sentiment label used for news and text classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    /// Case-insensitive label parse; anything unrecognized is neutral.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "positive" => Sentiment::Positive,
            "negative" => Sentiment::Negative,
            _ => Sentiment::Neutral,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    pub id: String,
    pub title: String,
    pub source: String,
    pub timestamp: DateTime<Utc>,
    pub summary: String,
    pub sentiment: Sentiment,
    pub sentiment_score: f64,
    pub url: String,
    pub related_symbols: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Directional outlook attached to a price prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Outlook {
    Bullish,
    Bearish,
    Neutral,
}

impl Outlook {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "bullish" => Outlook::Bullish,
            "bearish" => Outlook::Bearish,
            _ => Outlook::Neutral,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
}

impl Recommendation {
    /// Unknown strings degrade to `Hold`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "strong_buy" => Recommendation::StrongBuy,
            "buy" => Recommendation::Buy,
            "sell" => Recommendation::Sell,
            "strong_sell" => Recommendation::StrongSell,
            _ => Recommendation::Hold,
        }
    }
}

/// Where a narrative result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum InsightSource {
    Model,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AIPrediction {
    pub symbol: String,
    pub current_price: f64,
    pub predicted_price: f64,
    pub predicted_change: f64,
    pub confidence: f64,
    pub timeframe: String,
    pub reasoning: Vec<String>,
    pub last_updated: DateTime<Utc>,
    pub sentiment: Outlook,
    pub source: InsightSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AIAnalysis {
    pub symbol: String,
    pub summary: String,
    pub technical_analysis: String,
    pub fundamental_analysis: String,
    pub risks: Vec<String>,
    pub opportunities: Vec<String>,
    pub recommendation: Recommendation,
    pub confidence_score: f64,
    pub last_updated: DateTime<Utc>,
    pub source: InsightSource,
}

/// Label plus signed score (positive > 0, negative < 0, neutral near 0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SentimentScore {
    pub sentiment: Sentiment,
    pub score: f64,
}

/// Classifier output as returned by the sentiment endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SentimentResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub sentiment: Sentiment,
    pub score: f64,
    pub model: String,
}
