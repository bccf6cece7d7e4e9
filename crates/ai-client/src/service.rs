use crate::error::{AiError, AiResult};
use crate::fallback::{self, PREDICTION_TIMEFRAME};
use crate::finbert::{FinBertClient, FINBERT_MODEL};
use crate::gemini::GeminiClient;
use crate::AiConfig;
use chrono::Utc;
use futures_util::future::join_all;
use market_core::format::{format_market_cap, format_volume, round2, signed};
use market_core::{
    AIAnalysis, AIPrediction, Fundamentals, InsightSource, Outlook, Quote, Recommendation,
    Sentiment, SentimentResult, SentimentScore,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;

pub const MAX_BATCH_TEXTS: usize = 10;

const MAX_REASONS: usize = 4;
const MAX_RISKS: usize = 5;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PredictionAnswer {
    predicted_price: f64,
    confidence: f64,
    sentiment: String,
    #[serde(default)]
    reasoning: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisAnswer {
    summary: String,
    technical_analysis: String,
    fundamental_analysis: String,
    #[serde(default)]
    risks: Vec<String>,
    #[serde(default)]
    opportunities: Vec<String>,
    recommendation: String,
    confidence_score: f64,
}

#[derive(Debug, Deserialize)]
struct SentimentAnswer {
    sentiment: String,
    score: f64,
}

fn prediction_prompt(quote: &Quote) -> String {
    format!(
        "You are a financial analyst AI. Analyze the following stock and provide a prediction:\n\n\
         Stock: {} ({})\n\
         Current Price: ${:.2}\n\
         Daily Change: {} ({}%)\n\
         Sector: {}\n\
         Market Cap: ${}\n\
         Volume: {}\n\n\
         Respond with the predicted price in 7 days, a confidence percentage between 50 and 95, \
         a sentiment of bullish, bearish or neutral, and three short reasons. \
         Be realistic: a one week move is usually within 5-15% of the current price.",
        quote.symbol,
        quote.name,
        quote.price,
        signed(quote.change),
        signed(quote.change_percent),
        quote.sector,
        format_market_cap(quote.market_cap as f64),
        format_volume(quote.volume as f64),
    )
}

fn prediction_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "predictedPrice": { "type": "number" },
            "confidence": { "type": "number" },
            "sentiment": { "type": "string" },
            "reasoning": { "type": "array", "items": { "type": "string" } }
        },
        "required": ["predictedPrice", "confidence", "sentiment", "reasoning"]
    })
}

fn analysis_prompt(f: &Fundamentals) -> String {
    format!(
        "You are a senior equity analyst. Write a comprehensive analysis of {} ({}).\n\n\
         Sector: {} / {}\n\
         Price: ${:.2} (52-week range ${:.2} - ${:.2})\n\
         50-day MA: ${:.2}, 200-day MA: ${:.2}, Beta: {:.2}\n\
         Market Cap: ${}\n\
         P/E: {:.2}, Forward P/E: {:.2}, PEG: {:.2}\n\
         Revenue Growth: {:.2}%, Profit Margin: {:.2}%, ROE: {:.2}%\n\
         Current Ratio: {:.2}, Debt/Equity: {:.2}\n\
         Dividend Yield: {:.2}%\n\
         Analyst Target Mean: ${:.2}, Consensus: {}\n\n\
         Provide a summary, a technical analysis, a fundamental analysis, up to five risks, \
         up to five opportunities, a recommendation (strong_buy, buy, hold, sell or strong_sell) \
         and a confidence score between 60 and 95.",
        f.name,
        f.symbol,
        f.sector,
        f.industry,
        f.price,
        f.fifty_two_week_low,
        f.fifty_two_week_high,
        f.fifty_day_ma,
        f.two_hundred_day_ma,
        f.beta,
        format_market_cap(f.market_cap as f64),
        f.pe_ratio,
        f.forward_pe,
        f.peg_ratio,
        f.revenue_growth,
        f.profit_margin,
        f.return_on_equity,
        f.current_ratio,
        f.debt_to_equity,
        f.dividend_yield,
        f.target_mean_price,
        f.recommendation_key,
    )
}

fn analysis_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "summary": { "type": "string" },
            "technicalAnalysis": { "type": "string" },
            "fundamentalAnalysis": { "type": "string" },
            "risks": { "type": "array", "items": { "type": "string" } },
            "opportunities": { "type": "array", "items": { "type": "string" } },
            "recommendation": { "type": "string" },
            "confidenceScore": { "type": "number" }
        },
        "required": [
            "summary", "technicalAnalysis", "fundamentalAnalysis",
            "risks", "opportunities", "recommendation", "confidenceScore"
        ]
    })
}

fn sentiment_prompt(text: &str) -> String {
    format!(
        "Analyze the sentiment of the following financial news text. \
         Respond with a sentiment of positive, negative or neutral and a score between -1 and 1.\n\n\
         Text: {}",
        text
    )
}

fn sentiment_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "sentiment": { "type": "string" },
            "score": { "type": "number" }
        },
        "required": ["sentiment", "score"]
    })
}

/// Model-backed narratives and sentiment, each with a local fallback.
pub struct AnalysisService {
    gemini: GeminiClient,
    finbert: FinBertClient,
    rng: Mutex<StdRng>,
}

impl AnalysisService {
    pub fn new(config: &AiConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Seeded fallback randomness for reproducible tests.
    pub fn with_seed(config: &AiConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: &AiConfig, rng: StdRng) -> Self {
        Self {
            gemini: GeminiClient::new(config),
            finbert: FinBertClient::new(config),
            rng: Mutex::new(rng),
        }
    }

    pub fn gemini_configured(&self) -> bool {
        self.gemini.is_configured()
    }

    pub fn finbert_configured(&self) -> bool {
        self.finbert.is_configured()
    }

    /// Seven day price prediction.
    pub async fn predict(&self, quote: &Quote) -> AIPrediction {
        match self.model_prediction(quote).await {
            Ok(prediction) => prediction,
            Err(e) => {
                tracing::warn!("Prediction for {} fell back: {}", quote.symbol, e);
                let mut rng = self.rng.lock().await;
                fallback::prediction(&mut *rng, quote, Utc::now())
            }
        }
    }

    async fn model_prediction(&self, quote: &Quote) -> AiResult<AIPrediction> {
        let answer: PredictionAnswer = self
            .gemini
            .generate_json(&prediction_prompt(quote), prediction_schema())
            .await?;

        if !answer.predicted_price.is_finite() || answer.predicted_price <= 0.0 {
            return Err(AiError::InvalidResponse(format!(
                "predicted price {}",
                answer.predicted_price
            )));
        }

        let mut reasoning = answer.reasoning;
        reasoning.truncate(MAX_REASONS);

        Ok(AIPrediction {
            symbol: quote.symbol.clone(),
            current_price: round2(quote.price),
            predicted_price: round2(answer.predicted_price),
            predicted_change: round2(answer.predicted_price - quote.price),
            confidence: answer.confidence.clamp(50.0, 95.0),
            timeframe: PREDICTION_TIMEFRAME.to_string(),
            reasoning,
            last_updated: Utc::now(),
            sentiment: Outlook::from_label(&answer.sentiment),
            source: InsightSource::Model,
        })
    }

    /// Comprehensive narrative over a fundamentals snapshot.
    pub async fn analyze(&self, fundamentals: &Fundamentals) -> AIAnalysis {
        match self.model_analysis(fundamentals).await {
            Ok(analysis) => analysis,
            Err(e) => {
                tracing::warn!("Analysis for {} fell back: {}", fundamentals.symbol, e);
                fallback::analysis(fundamentals, Utc::now())
            }
        }
    }

    async fn model_analysis(&self, f: &Fundamentals) -> AiResult<AIAnalysis> {
        let answer: AnalysisAnswer = self
            .gemini
            .generate_json(&analysis_prompt(f), analysis_schema())
            .await?;

        let mut risks = answer.risks;
        risks.truncate(MAX_RISKS);
        let mut opportunities = answer.opportunities;
        opportunities.truncate(MAX_RISKS);

        let confidence_score = if answer.confidence_score.is_finite() {
            answer.confidence_score.clamp(60.0, 95.0)
        } else {
            60.0
        };

        Ok(AIAnalysis {
            symbol: f.symbol.clone(),
            summary: answer.summary,
            technical_analysis: answer.technical_analysis,
            fundamental_analysis: answer.fundamental_analysis,
            risks,
            opportunities,
            recommendation: Recommendation::from_label(&answer.recommendation),
            confidence_score,
            last_updated: Utc::now(),
            source: InsightSource::Model,
        })
    }

    /// Gemini sentiment; keyword heuristic when the model is unavailable.
    pub async fn sentiment(&self, text: &str) -> SentimentScore {
        let result = self
            .gemini
            .generate_json::<SentimentAnswer>(&sentiment_prompt(text), sentiment_schema())
            .await
            .and_then(|answer| {
                if answer.score.is_finite() {
                    Ok(SentimentScore {
                        sentiment: Sentiment::from_label(&answer.sentiment),
                        score: answer.score.clamp(-1.0, 1.0),
                    })
                } else {
                    Err(AiError::InvalidResponse("non-finite score".to_string()))
                }
            });

        result.unwrap_or_else(|e| {
            tracing::warn!("Gemini sentiment fell back: {}", e);
            fallback::keyword_sentiment(text)
        })
    }

    /// FinBERT classification; keyword heuristic when the model is unavailable.
    pub async fn classify(&self, text: &str) -> SentimentResult {
        let score = match self.finbert.classify(text).await {
            Ok(score) => score,
            Err(e) => {
                tracing::warn!("FinBERT fell back: {}", e);
                fallback::keyword_sentiment(text)
            }
        };

        SentimentResult {
            text: None,
            sentiment: score.sentiment,
            score: score.score,
            model: FINBERT_MODEL.to_string(),
        }
    }

    /// Classify up to [`MAX_BATCH_TEXTS`] texts concurrently. Results keep
    /// the input order.
    pub async fn classify_batch(&self, texts: &[String]) -> Vec<SentimentResult> {
        let batch = &texts[..texts.len().min(MAX_BATCH_TEXTS)];
        let results = join_all(batch.iter().map(|text| self.classify(text))).await;

        batch
            .iter()
            .zip(results)
            .map(|(text, result)| SentimentResult {
                text: Some(text.clone()),
                ..result
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use std::time::Duration;

    fn quote() -> Quote {
        Quote {
            symbol: "NVDA".to_string(),
            name: "NVIDIA Corporation".to_string(),
            price: 500.0,
            change: -4.5,
            change_percent: -0.89,
            volume: 41_000_000,
            market_cap: 1_230_000_000_000,
            sector: "Technology".to_string(),
            exchange: "NASDAQ".to_string(),
            sparkline_data: vec![],
        }
    }

    async fn gemini_stub(answer: Option<Value>) -> AiConfig {
        let router = Router::new().route(
            "/v1beta/models/:action",
            post(move || {
                let answer = answer.clone();
                async move {
                    match answer {
                        Some(answer) => {
                            let text = answer.to_string();
                            Ok(Json(json!({
                                "candidates": [{ "content": { "parts": [{ "text": text }] } }]
                            })))
                        }
                        None => Err(StatusCode::SERVICE_UNAVAILABLE),
                    }
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        AiConfig {
            gemini_api_key: Some("test-key".to_string()),
            gemini_base_url: format!("http://{}", addr),
            timeout: Duration::from_secs(5),
            ..AiConfig::offline()
        }
    }

    #[test]
    fn test_prediction_prompt_formats_numbers() {
        let prompt = prediction_prompt(&quote());
        assert!(prompt.contains("Stock: NVDA (NVIDIA Corporation)"));
        assert!(prompt.contains("Current Price: $500.00"));
        assert!(prompt.contains("Daily Change: -4.50 (-0.89%)"));
        assert!(prompt.contains("Market Cap: $1.23T"));
        assert!(prompt.contains("Volume: 41.00M"));
    }

    #[tokio::test]
    async fn test_prediction_normalizes_model_answer() {
        let config = gemini_stub(Some(json!({
            "predictedPrice": 520.0,
            "confidence": 120,
            "sentiment": "Bullish",
            "reasoning": ["a", "b", "c", "d", "e", "f"]
        })))
        .await;
        let service = AnalysisService::with_seed(&config, 1);

        let p = service.predict(&quote()).await;
        assert_eq!(p.source, InsightSource::Model);
        assert_eq!(p.predicted_change, 20.0);
        assert_eq!(p.confidence, 95.0);
        assert_eq!(p.reasoning.len(), 4);
        assert_eq!(p.sentiment, Outlook::Bullish);
        assert_eq!(p.timeframe, "7 Days");
    }

    #[tokio::test]
    async fn test_prediction_falls_back_on_outage() {
        let config = gemini_stub(None).await;
        let service = AnalysisService::with_seed(&config, 2);

        let p = service.predict(&quote()).await;
        assert_eq!(p.source, InsightSource::Fallback);
        assert_eq!(p.symbol, "NVDA");
        assert!((60.0..85.0).contains(&p.confidence));
    }

    #[tokio::test]
    async fn test_prediction_rejects_nonsense_price() {
        let config = gemini_stub(Some(json!({
            "predictedPrice": -3.0,
            "confidence": 80,
            "sentiment": "bearish",
            "reasoning": []
        })))
        .await;
        let service = AnalysisService::with_seed(&config, 3);
        assert_eq!(
            service.predict(&quote()).await.source,
            InsightSource::Fallback
        );
    }

    #[tokio::test]
    async fn test_sentiment_clamps_model_score() {
        let config = gemini_stub(Some(json!({ "sentiment": "negative", "score": -3.5 }))).await;
        let service = AnalysisService::new(&config);

        let s = service.sentiment("shares sink").await;
        assert_eq!(s.sentiment, Sentiment::Negative);
        assert_eq!(s.score, -1.0);
    }

    #[tokio::test]
    async fn test_offline_sentiment_uses_keywords() {
        let service = AnalysisService::new(&AiConfig::offline());
        assert!(!service.gemini_configured());
        assert!(!service.finbert_configured());

        let text = "Company reports record profit and strong growth";
        let gemini = service.sentiment(text).await;
        let finbert = service.classify(text).await;

        assert_eq!(gemini, fallback::keyword_sentiment(text));
        assert_eq!(finbert.sentiment, Sentiment::Positive);
        assert!(finbert.score > 0.0);
        assert_eq!(finbert.model, FINBERT_MODEL);
        assert_eq!(finbert.text, None);
    }

    #[tokio::test]
    async fn test_batch_caps_and_keeps_order() {
        let service = AnalysisService::new(&AiConfig::offline());
        let texts: Vec<String> = (0..12)
            .map(|i| {
                if i % 2 == 0 {
                    format!("{} record profit and strong growth", i)
                } else {
                    format!("{} loss, weak outlook and downgrade", i)
                }
            })
            .collect();

        let results = service.classify_batch(&texts).await;
        assert_eq!(results.len(), MAX_BATCH_TEXTS);
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.text.as_deref(), Some(texts[i].as_str()));
            let expected = if i % 2 == 0 {
                Sentiment::Positive
            } else {
                Sentiment::Negative
            };
            assert_eq!(result.sentiment, expected);
        }
        assert!(service.classify_batch(&[]).await.is_empty());
    }

    #[tokio::test]
    async fn test_analysis_clamps_model_answer() {
        let config = gemini_stub(Some(json!({
            "summary": "s",
            "technicalAnalysis": "t",
            "fundamentalAnalysis": "f",
            "risks": ["1", "2", "3", "4", "5", "6", "7"],
            "opportunities": ["o"],
            "recommendation": "accumulate",
            "confidenceScore": 40
        })))
        .await;
        let service = AnalysisService::new(&config);

        let f: Fundamentals = serde_json::from_value(fundamentals_json()).unwrap();
        let a = service.analyze(&f).await;
        assert_eq!(a.source, InsightSource::Model);
        assert_eq!(a.risks.len(), 5);
        assert_eq!(a.recommendation, Recommendation::Hold);
        assert_eq!(a.confidence_score, 60.0);
    }

    fn fundamentals_json() -> Value {
        let mut value = serde_json::to_value(quote()).unwrap();
        let extra = json!({
            "description": "", "industry": "Semiconductors", "currency": "USD",
            "country": "United States", "website": "", "employees": 26000, "ceo": "",
            "previousClose": 504.5, "open": 503.0, "dayHigh": 506.0, "dayLow": 497.0,
            "fiftyTwoWeekHigh": 550.0, "fiftyTwoWeekLow": 220.0, "fiftyTwoWeekChange": 120.0,
            "avgVolume": 45_000_000u64, "avgVolume10Day": 43_000_000u64,
            "sharesOutstanding": 2_460_000_000u64, "sharesFloat": 2_400_000_000u64,
            "sharesShort": 28_000_000u64, "shortRatio": 0.7,
            "peRatio": 65.0, "forwardPE": 35.0, "pegRatio": 1.2, "priceToSales": 30.0,
            "priceToBook": 40.0, "enterpriseValue": 1_200_000_000_000u64, "evToRevenue": 29.0,
            "evToEbitda": 55.0, "profitMargin": 48.0, "operatingMargin": 54.0,
            "grossMargin": 72.0, "returnOnAssets": 40.0, "returnOnEquity": 90.0,
            "revenue": 41_000_000_000u64, "revenuePerShare": 16.6, "revenueGrowth": 120.0,
            "grossProfit": 29_000_000_000u64, "ebitda": 22_000_000_000u64,
            "netIncome": 19_000_000_000i64, "eps": 7.7, "epsGrowth": 500.0,
            "totalCash": 18_000_000_000u64, "totalDebt": 11_000_000_000u64,
            "debtToEquity": 25.0, "currentRatio": 3.5, "quickRatio": 2.9, "bookValue": 14.0,
            "dividendRate": 0.16, "dividendYield": 0.03, "payoutRatio": 1.0,
            "fiveYearDividendYield": 0.1, "beta": 1.7, "fiftyDayMA": 470.0,
            "twoHundredDayMA": 420.0, "targetHighPrice": 700.0, "targetLowPrice": 400.0,
            "targetMeanPrice": 600.0, "targetMedianPrice": 610.0, "recommendationMean": 1.6,
            "recommendationKey": "strong_buy", "numberOfAnalysts": 45,
            "institutionalOwnership": 65.0, "insiderOwnership": 4.0,
            "earningsQuarterlyGrowth": 580.0, "lastUpdated": "2024-03-15T15:00:00Z"
        });
        if let (Some(target), Some(extra)) = (value.as_object_mut(), extra.as_object()) {
            for (k, v) in extra {
                target.insert(k.clone(), v.clone());
            }
            target.remove("sparklineData");
        }
        value
    }

    /// Collects formatted log lines for the current thread's subscriber.
    #[derive(Clone, Default)]
    struct LogBuffer(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_finbert_fallback_logged_as_warning() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let service = AnalysisService::with_seed(&AiConfig::offline(), 1);
        service.classify("Shares surge on record profit").await;

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("WARN"), "{}", output);
        assert!(output.contains("FinBERT fell back"), "{}", output);
    }
}
