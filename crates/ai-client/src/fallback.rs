//! Local answers used whenever a hosted model is missing or misbehaves.
//! None of these can fail.

use chrono::{DateTime, Utc};
use market_core::format::{format_market_cap, round2};
use market_core::{
    AIAnalysis, AIPrediction, Fundamentals, InsightSource, Outlook, Quote, Recommendation,
    Sentiment, SentimentScore,
};
use rand::seq::SliceRandom;
use rand::Rng;

pub const PREDICTION_TIMEFRAME: &str = "7 Days";

const POSITIVE_WORDS: [&str; 13] = [
    "growth",
    "profit",
    "beat",
    "surge",
    "gain",
    "rise",
    "strong",
    "positive",
    "upgrade",
    "outperform",
    "bullish",
    "record",
    "success",
];

const NEGATIVE_WORDS: [&str; 13] = [
    "loss",
    "drop",
    "fall",
    "decline",
    "miss",
    "weak",
    "negative",
    "downgrade",
    "underperform",
    "bearish",
    "concern",
    "risk",
    "cut",
];

const BULLISH_REASONS: [&str; 4] = [
    "Strong recent momentum suggests continued upward movement",
    "Sector performance has been positive this quarter",
    "Technical indicators show bullish patterns",
    "Volume trends suggest institutional buying interest",
];

const BEARISH_REASONS: [&str; 4] = [
    "Recent price action shows signs of weakness",
    "Market volatility may pressure the stock",
    "Technical resistance levels may limit upside",
    "Sector rotation could affect near-term performance",
];

const NEUTRAL_REASONS: [&str; 4] = [
    "Price appears to be consolidating at current levels",
    "Mixed market signals suggest sideways movement",
    "Awaiting upcoming earnings for clearer direction",
    "Current valuation appears fairly priced",
];

/// Keyword count sentiment. Each word counts at most once, as a substring
/// of the lowercased text.
pub fn keyword_sentiment(text: &str) -> SentimentScore {
    let lower = text.to_lowercase();
    let count = |words: &[&str]| words.iter().filter(|w| lower.contains(*w)).count() as f64;
    let pos = count(&POSITIVE_WORDS);
    let neg = count(&NEGATIVE_WORDS);

    if pos > neg + 1.0 {
        SentimentScore {
            sentiment: Sentiment::Positive,
            score: (0.5 + pos * 0.1).min(0.9),
        }
    } else if neg > pos + 1.0 {
        SentimentScore {
            sentiment: Sentiment::Negative,
            score: (-0.5 - neg * 0.1).max(-0.9),
        }
    } else {
        SentimentScore {
            sentiment: Sentiment::Neutral,
            score: (pos - neg) * 0.1,
        }
    }
}

/// Random walk of up to five percent either way with canned reasoning.
pub fn prediction<R: Rng + ?Sized>(
    rng: &mut R,
    quote: &Quote,
    now: DateTime<Utc>,
) -> AIPrediction {
    let pct: f64 = rng.gen_range(-5.0..5.0);
    let predicted_price = quote.price * (1.0 + pct / 100.0);

    let (sentiment, pool) = if pct > 2.0 {
        (Outlook::Bullish, &BULLISH_REASONS)
    } else if pct < -2.0 {
        (Outlook::Bearish, &BEARISH_REASONS)
    } else {
        (Outlook::Neutral, &NEUTRAL_REASONS)
    };

    let reasoning = pool
        .choose_multiple(rng, 3)
        .map(|r| r.to_string())
        .collect();

    AIPrediction {
        symbol: quote.symbol.clone(),
        current_price: round2(quote.price),
        predicted_price: round2(predicted_price),
        predicted_change: round2(predicted_price - quote.price),
        confidence: rng.gen_range(60..85) as f64,
        timeframe: PREDICTION_TIMEFRAME.to_string(),
        reasoning,
        last_updated: now,
        sentiment,
        source: InsightSource::Fallback,
    }
}

/// Rule-based verdict from valuation, growth and balance sheet health.
pub fn recommendation(f: &Fundamentals) -> Recommendation {
    let value = f.pe_ratio > 0.0 && f.pe_ratio < 20.0;
    let growth = f.revenue_growth > 10.0;
    let healthy = f.current_ratio > 1.5 && f.debt_to_equity < 100.0;

    if growth && healthy {
        Recommendation::StrongBuy
    } else if value && healthy {
        Recommendation::Buy
    } else if !healthy && f.pe_ratio > 40.0 {
        Recommendation::Sell
    } else {
        Recommendation::Hold
    }
}

fn risks(f: &Fundamentals) -> Vec<String> {
    let mut risks = Vec::new();
    if f.pe_ratio > 40.0 {
        risks.push(format!(
            "Elevated valuation at {:.1}x earnings leaves little room for disappointment",
            f.pe_ratio
        ));
    }
    if f.debt_to_equity >= 100.0 {
        risks.push(format!(
            "Debt-to-equity of {:.1} points to meaningful leverage",
            f.debt_to_equity
        ));
    }
    if f.current_ratio <= 1.5 {
        risks.push(format!(
            "Current ratio of {:.2} offers a thin liquidity cushion",
            f.current_ratio
        ));
    }
    if f.beta > 1.3 {
        risks.push(format!(
            "Beta of {:.2} implies above-market volatility",
            f.beta
        ));
    }
    if f.revenue_growth < 0.0 {
        risks.push(format!(
            "Revenue contracted {:.1}% year over year",
            f.revenue_growth.abs()
        ));
    }
    if risks.is_empty() {
        risks.push(format!(
            "Broad market and {} sector swings can still weigh on the shares",
            f.sector
        ));
    }
    risks
}

fn opportunities(f: &Fundamentals) -> Vec<String> {
    let mut opportunities = Vec::new();
    if f.pe_ratio > 0.0 && f.pe_ratio < 20.0 {
        opportunities.push(format!(
            "Modest valuation at {:.1}x earnings",
            f.pe_ratio
        ));
    }
    if f.revenue_growth > 10.0 {
        opportunities.push(format!(
            "Revenue growing {:.1}% year over year",
            f.revenue_growth
        ));
    }
    if f.dividend_yield > 0.0 {
        opportunities.push(format!("Dividend yield of {:.2}%", f.dividend_yield));
    }
    if f.target_mean_price > f.price && f.price > 0.0 {
        opportunities.push(format!(
            "Analyst mean target of ${:.2} sits {:.1}% above the current price",
            f.target_mean_price,
            (f.target_mean_price / f.price - 1.0) * 100.0
        ));
    }
    if f.profit_margin > 20.0 {
        opportunities.push(format!(
            "Profit margin of {:.1}% supports reinvestment",
            f.profit_margin
        ));
    }
    if opportunities.is_empty() {
        opportunities.push(format!(
            "Position within the {} industry could benefit from a sector rebound",
            f.industry
        ));
    }
    opportunities
}

/// Narrative built from the actual numbers with a fixed confidence of 70.
pub fn analysis(f: &Fundamentals, now: DateTime<Utc>) -> AIAnalysis {
    let trend = if f.price >= f.fifty_day_ma {
        "above"
    } else {
        "below"
    };

    let summary = format!(
        "{} ({}) trades at ${:.2} with a market capitalization of ${}. The company operates in the {} sector ({}).",
        f.name,
        f.symbol,
        f.price,
        format_market_cap(f.market_cap as f64),
        f.sector,
        f.industry,
    );
    let technical_analysis = format!(
        "The stock is trading {} its 50-day moving average of ${:.2} (200-day: ${:.2}) within a 52-week range of ${:.2} to ${:.2}. Beta is {:.2}.",
        trend,
        f.fifty_day_ma,
        f.two_hundred_day_ma,
        f.fifty_two_week_low,
        f.fifty_two_week_high,
        f.beta,
    );
    let fundamental_analysis = format!(
        "P/E ratio of {:.1}, revenue growth of {:.1}% and a profit margin of {:.1}%. The balance sheet shows a current ratio of {:.2} and debt-to-equity of {:.1}.",
        f.pe_ratio, f.revenue_growth, f.profit_margin, f.current_ratio, f.debt_to_equity,
    );

    AIAnalysis {
        symbol: f.symbol.clone(),
        summary,
        technical_analysis,
        fundamental_analysis,
        risks: risks(f),
        opportunities: opportunities(f),
        recommendation: recommendation(f),
        confidence_score: 70.0,
        last_updated: now,
        source: InsightSource::Fallback,
    }
}
