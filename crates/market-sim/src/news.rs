//! Template-driven headlines with a sentiment label and score.

use chrono::{DateTime, Duration, Utc};
use market_core::{NewsArticle, Sentiment};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tokio::sync::Mutex;

pub const DEFAULT_LATEST_LIMIT: usize = 20;
pub const DEFAULT_SYMBOL_LIMIT: usize = 10;

/// Each article's score drifts up to this far from its template's base.
const SCORE_JITTER: f64 = 0.1;

struct Template {
    title: &'static str,
    summary: &'static str,
    sentiment: Sentiment,
    score: f64,
}

const TEMPLATES: [Template; 10] = [
    Template {
        title: "{company} Reports Strong Q4 Earnings, Beats Estimates",
        summary: "{company} announced quarterly earnings that exceeded analyst expectations, with revenue growth driven by strong demand in its core business segments. The company also raised its full-year guidance.",
        sentiment: Sentiment::Positive,
        score: 0.85,
    },
    Template {
        title: "{company} Announces Major Partnership with Tech Giant",
        summary: "In a strategic move, {company} has entered into a significant partnership that analysts believe will strengthen its market position and open new revenue streams in the coming quarters.",
        sentiment: Sentiment::Positive,
        score: 0.78,
    },
    Template {
        title: "Analysts Upgrade {company} Stock on Growth Prospects",
        summary: "Multiple Wall Street analysts have upgraded their ratings on {company}, citing improved fundamentals and positive market momentum. Price targets have been revised upward by an average of 15%.",
        sentiment: Sentiment::Positive,
        score: 0.72,
    },
    Template {
        title: "{company} Faces Regulatory Scrutiny Over Business Practices",
        summary: "Federal regulators have announced an investigation into {company}'s business practices, raising concerns among investors about potential fines and operational restrictions.",
        sentiment: Sentiment::Negative,
        score: -0.65,
    },
    Template {
        title: "{company} Stock Drops After Missing Revenue Targets",
        summary: "Shares of {company} fell sharply after the company reported quarterly revenue below expectations. Management cited challenging market conditions and supply chain issues.",
        sentiment: Sentiment::Negative,
        score: -0.72,
    },
    Template {
        title: "{company} Announces Workforce Reduction Amid Restructuring",
        summary: "{company} revealed plans to cut approximately 5% of its workforce as part of a broader cost-cutting initiative. The company expects to save $500 million annually.",
        sentiment: Sentiment::Negative,
        score: -0.55,
    },
    Template {
        title: "Market Watch: {company} Trading Sideways Amid Economic Uncertainty",
        summary: "{company} shares remained relatively flat as investors await more clarity on economic conditions and the company's strategic direction for the coming year.",
        sentiment: Sentiment::Neutral,
        score: 0.05,
    },
    Template {
        title: "{company} Expands Into New Markets with Product Launch",
        summary: "{company} has announced the expansion of its product line into new geographic markets, signaling confidence in long-term growth despite near-term headwinds.",
        sentiment: Sentiment::Positive,
        score: 0.68,
    },
    Template {
        title: "Investors Eye {company} as Sector Rotation Continues",
        summary: "Institutional investors are increasingly looking at {company} as market dynamics shift. Trading volume has increased significantly over the past week.",
        sentiment: Sentiment::Neutral,
        score: 0.15,
    },
    Template {
        title: "{company} CEO Discusses AI Strategy in Investor Call",
        summary: "During the latest investor call, {company}'s CEO outlined ambitious plans for artificial intelligence integration across the company's product portfolio.",
        sentiment: Sentiment::Positive,
        score: 0.62,
    },
];

/// (display name, symbol)
const COMPANIES: [(&str, &str); 10] = [
    ("Apple", "AAPL"),
    ("Microsoft", "MSFT"),
    ("Google", "GOOGL"),
    ("Amazon", "AMZN"),
    ("Tesla", "TSLA"),
    ("NVIDIA", "NVDA"),
    ("Meta", "META"),
    ("Netflix", "NFLX"),
    ("JPMorgan", "JPM"),
    ("Goldman Sachs", "GS"),
];

const SOURCES: [&str; 10] = [
    "Reuters",
    "Bloomberg",
    "CNBC",
    "Wall Street Journal",
    "Financial Times",
    "MarketWatch",
    "Yahoo Finance",
    "Barron's",
    "Investor's Business Daily",
    "The Motley Fool",
];

fn article<R: Rng + ?Sized>(rng: &mut R, index: usize, now: DateTime<Utc>) -> NewsArticle {
    let template = &TEMPLATES[rng.gen_range(0..TEMPLATES.len())];
    let (company, symbol) = COMPANIES[rng.gen_range(0..COMPANIES.len())];
    let source = SOURCES.choose(rng).copied().unwrap_or("Reuters");

    let hours_ago = rng.gen_range(0..48);
    let score = template.score + rng.gen_range(-SCORE_JITTER..SCORE_JITTER);

    let mut related_symbols = vec![symbol.to_string()];
    let extra = rng.gen_range(0..2);
    related_symbols.extend(
        COMPANIES
            .iter()
            .filter(|(_, other)| *other != symbol)
            .take(extra)
            .map(|(_, other)| other.to_string()),
    );

    NewsArticle {
        id: format!("news-{}-{}", index, now.timestamp_millis()),
        title: template.title.replacen("{company}", company, 1),
        source: source.to_string(),
        timestamp: now - Duration::hours(hours_ago),
        summary: template.summary.replace("{company}", company),
        sentiment: template.sentiment,
        sentiment_score: score,
        url: format!("https://example.com/news/{}", index),
        related_symbols,
        image_url: None,
    }
}

/// `limit` fresh articles, newest first.
pub fn latest<R: Rng + ?Sized>(rng: &mut R, limit: usize, now: DateTime<Utc>) -> Vec<NewsArticle> {
    let mut articles: Vec<NewsArticle> = (0..limit).map(|i| article(rng, i, now)).collect();
    articles.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    articles
}

/// Articles mentioning `symbol`, drawn from a pool three times `limit`.
///
/// May return fewer than `limit`, including none for symbols outside the
/// covered companies.
pub fn for_symbol<R: Rng + ?Sized>(
    rng: &mut R,
    symbol: &str,
    limit: usize,
    now: DateTime<Utc>,
) -> Vec<NewsArticle> {
    latest(rng, limit.saturating_mul(3), now)
        .into_iter()
        .filter(|a| a.related_symbols.iter().any(|s| s == symbol))
        .take(limit)
        .collect()
}

/// Shared news source. Independent of which market data source is active.
pub struct NewsFeed {
    rng: Mutex<StdRng>,
}

impl NewsFeed {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub async fn latest(&self, limit: usize) -> Vec<NewsArticle> {
        let mut rng = self.rng.lock().await;
        latest(&mut *rng, limit, Utc::now())
    }

    pub async fn for_symbol(&self, symbol: &str, limit: usize) -> Vec<NewsArticle> {
        let symbol = symbol.trim().to_uppercase();
        let mut rng = self.rng.lock().await;
        for_symbol(&mut *rng, &symbol, limit, Utc::now())
    }
}

impl Default for NewsFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 15, 0, 0).unwrap()
    }

    #[test]
    fn test_latest_sorted_and_sized() {
        let mut rng = StdRng::seed_from_u64(1);
        let news = latest(&mut rng, DEFAULT_LATEST_LIMIT, now());

        assert_eq!(news.len(), 20);
        for pair in news.windows(2) {
            assert!(pair[0].timestamp >= pair[1].timestamp);
        }
        for a in &news {
            assert!(a.timestamp <= now());
            assert!(now() - a.timestamp < Duration::hours(48));
            assert!(!a.title.contains("{company}"));
            assert!(!a.summary.contains("{company}"));
            assert!(a.url.starts_with("https://example.com/news/"));
            assert!((1..=2).contains(&a.related_symbols.len()));
        }
    }

    #[test]
    fn test_score_sign_matches_label() {
        let mut rng = StdRng::seed_from_u64(2);
        for a in latest(&mut rng, 200, now()) {
            match a.sentiment {
                Sentiment::Positive => assert!(a.sentiment_score > 0.0),
                Sentiment::Negative => assert!(a.sentiment_score < 0.0),
                Sentiment::Neutral => assert!(a.sentiment_score.abs() < 0.26),
            }
        }
    }

    #[test]
    fn test_for_symbol_filters_and_limits() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..20 {
            let news = for_symbol(&mut rng, "AAPL", DEFAULT_SYMBOL_LIMIT, now());
            assert!(news.len() <= DEFAULT_SYMBOL_LIMIT);
            assert!(news
                .iter()
                .all(|a| a.related_symbols.iter().any(|s| s == "AAPL")));
        }
        assert!(for_symbol(&mut rng, "ZZZZ", 10, now()).is_empty());
    }

    #[tokio::test]
    async fn test_feed_normalizes_symbol() {
        let feed = NewsFeed::with_seed(4);
        let news = feed.for_symbol("aapl", 50).await;
        assert!(news.iter().all(|a| a.related_symbols.contains(&"AAPL".to_string())));
        assert_eq!(feed.latest(5).await.len(), 5);
    }
}
