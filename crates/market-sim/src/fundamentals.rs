//! Fundamentals and the extended per-symbol records (earnings, dividends,
//! insider trades, institutional holders).
//!
//! Everything is derived from the catalog listing plus a freshly generated
//! quote, so prices in the extended records stay in the same neighbourhood as
//! the quote the dashboard shows next to them.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use market_core::format::round2;
use market_core::{
    DividendHistory, EarningsData, Fundamentals, InsiderTransaction, InstitutionalHolder, Quote,
    TransactionType,
};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::catalog::Listing;

pub const DEFAULT_EARNINGS_QUARTERS: usize = 8;
pub const DEFAULT_DIVIDEND_COUNT: usize = 8;
pub const DEFAULT_INSIDER_COUNT: usize = 10;

const DATE_FORMAT: &str = "%Y-%m-%d";

const INSTITUTIONS: [&str; 10] = [
    "Vanguard Group",
    "BlackRock Inc.",
    "State Street Corp",
    "FMR LLC",
    "Geode Capital Management",
    "T. Rowe Price Associates",
    "Morgan Stanley",
    "JPMorgan Chase & Co",
    "Northern Trust Corp",
    "Bank of America Corp",
];

const INSIDER_NAMES: [&str; 10] = [
    "Sarah Mitchell",
    "David Chen",
    "Robert Alvarez",
    "Emily Carter",
    "Michael Brooks",
    "Jennifer Walsh",
    "Thomas Nguyen",
    "Laura Bennett",
    "James O'Connor",
    "Priya Raman",
];

const INSIDER_TITLES: [&str; 7] = [
    "Chief Executive Officer",
    "Chief Financial Officer",
    "Chief Operating Officer",
    "Chief Technology Officer",
    "General Counsel",
    "Director",
    "EVP, Sales",
];

fn website(name: &str) -> String {
    let stem: String = name
        .split_whitespace()
        .next()
        .unwrap_or(name)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    format!("https://www.{}.com", stem.to_lowercase())
}

/// Build a full fundamentals snapshot around `quote`.
pub fn fundamentals<R: Rng + ?Sized>(
    rng: &mut R,
    listing: &Listing,
    quote: &Quote,
    now: DateTime<Utc>,
) -> Fundamentals {
    let today = now.date_naive();
    let price = quote.price;
    let market_cap = quote.market_cap as f64;

    // Session
    let previous_close = round2(price - quote.change);
    let open = round2(previous_close * (1.0 + rng.gen_range(-0.01..0.01)));
    let day_high = round2(price.max(open) * (1.0 + rng.gen_range(0.0..0.015)));
    let day_low = round2(price.min(open) * (1.0 - rng.gen_range(0.0..0.015)));

    // Shares
    let shares_outstanding = (market_cap / price.max(0.01)).floor();
    let shares_float = (shares_outstanding * rng.gen_range(0.80..0.98)).floor();
    let shares_short = (shares_float * rng.gen_range(0.01..0.05)).floor();

    // Earnings power; four out of five names are profitable.
    let profitable = rng.gen_bool(0.8);
    let eps_magnitude = rng.gen_range(1.0..11.0);
    let eps = round2(if profitable { eps_magnitude } else { -eps_magnitude });
    let pe_ratio = if eps > 0.0 { round2(price / eps) } else { 0.0 };
    let forward_pe = round2(pe_ratio * rng.gen_range(0.8..1.0));
    let peg_ratio = if pe_ratio > 0.0 {
        round2(pe_ratio / rng.gen_range(5.0..30.0))
    } else {
        0.0
    };

    // Income statement
    let revenue = market_cap / rng.gen_range(2.0..12.0);
    let gross_margin = rng.gen_range(20.0..70.0);
    let operating_margin = gross_margin * rng.gen_range(0.3..0.7);
    let profit_margin = if profitable {
        operating_margin * rng.gen_range(0.5..0.9)
    } else {
        -rng.gen_range(1.0..20.0)
    };
    let gross_profit = revenue * gross_margin / 100.0;
    let ebitda = revenue * (operating_margin + rng.gen_range(2.0..8.0)) / 100.0;
    let net_income = revenue * profit_margin / 100.0;

    // Balance sheet
    let total_cash = market_cap * rng.gen_range(0.02..0.15);
    let total_debt = market_cap * rng.gen_range(0.0..0.3);
    let enterprise_value = (market_cap + total_debt - total_cash).max(0.0);
    let price_to_book = rng.gen_range(1.0..15.0);
    let current_ratio = rng.gen_range(0.8..3.0);

    let return_on_assets = if profitable { rng.gen_range(2.0..20.0) } else { 0.0 };

    // Dividends
    let (dividend_rate, dividend_yield, ex_dividend_date, dividend_date) = if listing.pays_dividend() {
        let dividend_yield = rng.gen_range(0.5..4.0);
        let ex_date = today + Duration::days(rng.gen_range(5..40));
        (
            round2(price * dividend_yield / 100.0),
            round2(dividend_yield),
            Some(ex_date.format(DATE_FORMAT).to_string()),
            Some((ex_date + Duration::days(14)).format(DATE_FORMAT).to_string()),
        )
    } else {
        (0.0, 0.0, None, None)
    };
    let payout_ratio = if eps > 0.0 && dividend_rate > 0.0 {
        round2((dividend_rate / eps * 100.0).min(100.0))
    } else {
        0.0
    };

    // Analyst coverage
    let target_mean_price = price * rng.gen_range(1.0..1.25);
    let recommendation_mean = rng.gen_range(1.5..3.5);
    let recommendation_key = match recommendation_mean {
        m if m < 1.8 => "strong_buy",
        m if m < 2.5 => "buy",
        _ => "hold",
    };

    Fundamentals {
        symbol: listing.symbol.to_string(),
        name: listing.name.to_string(),
        description: format!(
            "{} operates in the {} industry within the {} sector and trades on the {}.",
            listing.name,
            listing.industry(),
            listing.sector,
            listing.exchange
        ),
        sector: listing.sector.to_string(),
        industry: listing.industry().to_string(),
        exchange: listing.exchange.to_string(),
        currency: "USD".to_string(),
        country: "United States".to_string(),
        website: website(listing.name),
        employees: rng.gen_range(5_000..250_000),
        ceo: INSIDER_NAMES.choose(rng).copied().unwrap_or_default().to_string(),

        price,
        change: quote.change,
        change_percent: quote.change_percent,
        previous_close,
        open,
        day_high,
        day_low,

        fifty_two_week_high: round2(listing.base_price.max(price) * rng.gen_range(1.05..1.4)),
        fifty_two_week_low: round2(listing.base_price.min(price) * rng.gen_range(0.6..0.95)),
        fifty_two_week_change: round2(rng.gen_range(-20.0..40.0)),

        volume: quote.volume,
        avg_volume: (quote.volume as f64 * rng.gen_range(0.8..1.2)) as u64,
        avg_volume_10_day: (quote.volume as f64 * rng.gen_range(0.8..1.2)) as u64,

        market_cap: quote.market_cap,
        shares_outstanding: shares_outstanding as u64,
        shares_float: shares_float as u64,
        shares_short: shares_short as u64,
        short_ratio: round2(rng.gen_range(1.0..6.0)),

        pe_ratio,
        forward_pe,
        peg_ratio,
        price_to_sales: round2(market_cap / revenue),
        price_to_book: round2(price_to_book),
        enterprise_value: enterprise_value as u64,
        ev_to_revenue: round2(enterprise_value / revenue),
        ev_to_ebitda: round2(enterprise_value / ebitda),

        profit_margin: round2(profit_margin),
        operating_margin: round2(operating_margin),
        gross_margin: round2(gross_margin),
        return_on_assets: round2(return_on_assets),
        return_on_equity: round2(return_on_assets * rng.gen_range(1.5..3.0)),

        revenue: revenue as u64,
        revenue_per_share: round2(revenue / shares_outstanding.max(1.0)),
        revenue_growth: round2(rng.gen_range(-10.0..30.0)),
        gross_profit: gross_profit as u64,
        ebitda: ebitda as u64,
        net_income: net_income as i64,
        eps,
        eps_growth: round2(rng.gen_range(-20.0..40.0)),

        total_cash: total_cash as u64,
        total_debt: total_debt as u64,
        debt_to_equity: round2(rng.gen_range(0.0..200.0)),
        current_ratio: round2(current_ratio),
        quick_ratio: round2(current_ratio * rng.gen_range(0.6..0.95)),
        book_value: round2(price / price_to_book),

        dividend_rate,
        dividend_yield,
        payout_ratio,
        ex_dividend_date,
        dividend_date,
        five_year_dividend_yield: round2(dividend_yield * rng.gen_range(0.8..1.2)),

        beta: round2(rng.gen_range(0.6..1.8)),
        fifty_day_ma: round2(price * rng.gen_range(0.95..1.05)),
        two_hundred_day_ma: round2(price * rng.gen_range(0.85..1.1)),

        target_high_price: round2(target_mean_price * rng.gen_range(1.1..1.3)),
        target_low_price: round2(target_mean_price * rng.gen_range(0.7..0.9)),
        target_mean_price: round2(target_mean_price),
        target_median_price: round2(target_mean_price * rng.gen_range(0.97..1.03)),
        recommendation_mean: round2(recommendation_mean),
        recommendation_key: recommendation_key.to_string(),
        number_of_analysts: rng.gen_range(5..45),

        institutional_ownership: round2(rng.gen_range(50.0..85.0)),
        insider_ownership: round2(rng.gen_range(0.1..10.0)),

        earnings_date: Some(
            (today + Duration::days(rng.gen_range(10..80)))
                .format(DATE_FORMAT)
                .to_string(),
        ),
        earnings_quarterly_growth: round2(rng.gen_range(-15.0..35.0)),

        last_updated: now,
    }
}

/// Calendar quarter `back` quarters before the one containing `today`.
fn quarter_before(today: NaiveDate, back: usize) -> (i32, u32) {
    let current = today.year() * 4 + (today.month0() / 3) as i32;
    let target = current - back as i32;
    (target.div_euclid(4), target.rem_euclid(4) as u32 + 1)
}

/// Reports land a few weeks after the quarter closes.
fn report_date(year: i32, quarter: u32) -> Option<NaiveDate> {
    let (year, month) = if quarter == 4 { (year + 1, 1) } else { (year, quarter * 3 + 1) };
    NaiveDate::from_ymd_opt(year, month, 25)
}

/// Most recent `quarters` completed quarters, newest first.
pub fn earnings<R: Rng + ?Sized>(
    rng: &mut R,
    listing: &Listing,
    quarters: usize,
    today: NaiveDate,
) -> Vec<EarningsData> {
    let eps_base = rng.gen_range(0.5..4.0);
    let revenue_base = listing.base_price * rng.gen_range(20.0..60.0) * 1_000_000.0;

    (1..=quarters)
        .filter_map(|back| {
            let (year, quarter) = quarter_before(today, back);
            let date = report_date(year, quarter)?;

            let estimated_eps = round2(eps_base * rng.gen_range(0.9..1.1));
            let actual_eps = round2(estimated_eps * (1.0 + rng.gen_range(-0.1..0.15)));
            let surprise = round2(actual_eps - estimated_eps);
            let estimated_revenue = revenue_base * rng.gen_range(0.9..1.1);

            Some(EarningsData {
                symbol: listing.symbol.to_string(),
                quarter: format!("Q{} {}", quarter, year),
                date: date.format(DATE_FORMAT).to_string(),
                actual_eps,
                estimated_eps,
                surprise,
                surprise_percent: round2(surprise / estimated_eps * 100.0),
                revenue: (estimated_revenue * rng.gen_range(0.95..1.08)) as u64,
                estimated_revenue: estimated_revenue as u64,
            })
        })
        .collect()
}

/// Quarterly cash dividends, newest first. Empty for non-payers.
pub fn dividends<R: Rng + ?Sized>(
    rng: &mut R,
    listing: &Listing,
    count: usize,
    today: NaiveDate,
) -> Vec<DividendHistory> {
    if !listing.pays_dividend() {
        return Vec::new();
    }

    let latest = listing.base_price * rng.gen_range(0.004..0.01);
    (0..count)
        .map(|k| {
            let date = today - Duration::days(k as i64 * 91 + rng.gen_range(0..7));
            // Payouts ratchet up over time, so older ones are a little smaller.
            let amount = latest * (1.0 - 0.02 * k as f64).max(0.5);
            DividendHistory {
                symbol: listing.symbol.to_string(),
                date: date.format(DATE_FORMAT).to_string(),
                amount: round2(amount),
                dividend_type: "Cash".to_string(),
            }
        })
        .collect()
}

/// Form 4 style trades from the last six months, newest first.
pub fn insiders<R: Rng + ?Sized>(
    rng: &mut R,
    listing: &Listing,
    count: usize,
    today: NaiveDate,
) -> Vec<InsiderTransaction> {
    let mut dated: Vec<(NaiveDate, InsiderTransaction)> = (0..count)
        .map(|_| {
            let date = today - Duration::days(rng.gen_range(1..180));
            let shares: u64 = rng.gen_range(1_000..100_000);
            let price = round2(listing.base_price * rng.gen_range(0.9..1.1));
            let transaction_type = if rng.gen_bool(0.3) {
                TransactionType::Buy
            } else {
                TransactionType::Sell
            };
            let record = InsiderTransaction {
                symbol: listing.symbol.to_string(),
                name: INSIDER_NAMES.choose(rng).copied().unwrap_or_default().to_string(),
                title: INSIDER_TITLES.choose(rng).copied().unwrap_or_default().to_string(),
                transaction_date: date.format(DATE_FORMAT).to_string(),
                transaction_type,
                shares,
                price,
                value: round2(shares as f64 * price),
            };
            (date, record)
        })
        .collect();

    dated.sort_by(|a, b| b.0.cmp(&a.0));
    dated.into_iter().map(|(_, record)| record).collect()
}

/// The ten largest holders, largest first.
pub fn institutions<R: Rng + ?Sized>(
    rng: &mut R,
    listing: &Listing,
    today: NaiveDate,
) -> Vec<InstitutionalHolder> {
    let shares_outstanding: f64 = rng.gen_range(100.0..1000.0) * 1_000_000.0;
    let date_reported = (today - Duration::days(rng.gen_range(15..60)))
        .format(DATE_FORMAT)
        .to_string();
    let mut percent_held: f64 = rng.gen_range(7.0..9.0);

    INSTITUTIONS
        .iter()
        .map(|holder| {
            let shares = (shares_outstanding * percent_held / 100.0).floor();
            let record = InstitutionalHolder {
                symbol: listing.symbol.to_string(),
                holder: holder.to_string(),
                shares: shares as u64,
                date_reported: date_reported.clone(),
                percent_held: round2(percent_held),
                value: round2(shares * listing.base_price),
            };
            percent_held *= rng.gen_range(0.6..0.9);
            record
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{catalog, quotes};
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const SIGNED_FIELDS: &[&str] = &[
        "change",
        "changePercent",
        "fiftyTwoWeekChange",
        "revenueGrowth",
        "earningsQuarterlyGrowth",
        "eps",
        "epsGrowth",
        "netIncome",
        "profitMargin",
    ];

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 15, 0, 0).unwrap()
    }

    #[test]
    fn test_fundamentals_non_negative() {
        let mut rng = StdRng::seed_from_u64(31);
        for listing in catalog::LISTINGS {
            let quote = quotes::quote(&mut rng, listing);
            let f = fundamentals(&mut rng, listing, &quote, now());
            let json = serde_json::to_value(&f).unwrap();

            for (field, value) in json.as_object().unwrap() {
                if SIGNED_FIELDS.contains(&field.as_str()) {
                    continue;
                }
                if let Some(n) = value.as_f64() {
                    assert!(n >= 0.0, "{} {} = {}", listing.symbol, field, n);
                }
            }
        }
    }

    #[test]
    fn test_pe_zero_for_loss_makers() {
        let mut rng = StdRng::seed_from_u64(8);
        let listing = catalog::find("MSFT").unwrap();
        for _ in 0..50 {
            let quote = quotes::quote(&mut rng, listing);
            let f = fundamentals(&mut rng, listing, &quote, now());
            assert!(f.eps.abs() >= 1.0 && f.eps.abs() <= 11.0);
            if f.eps > 0.0 {
                assert!(f.pe_ratio > 0.0);
            } else {
                assert_eq!(f.pe_ratio, 0.0);
            }
        }
    }

    #[test]
    fn test_non_payer_has_no_dividend() {
        let mut rng = StdRng::seed_from_u64(2);
        let tesla = catalog::find("TSLA").unwrap();
        let quote = quotes::quote(&mut rng, tesla);
        let f = fundamentals(&mut rng, tesla, &quote, now());
        assert_eq!(f.dividend_yield, 0.0);
        assert!(f.ex_dividend_date.is_none());
        assert!(dividends(&mut rng, tesla, 8, now().date_naive()).is_empty());
    }

    #[test]
    fn test_earnings_newest_first() {
        let mut rng = StdRng::seed_from_u64(4);
        let listing = catalog::find("AAPL").unwrap();
        let records = earnings(&mut rng, listing, DEFAULT_EARNINGS_QUARTERS, now().date_naive());

        assert_eq!(records.len(), 8);
        assert_eq!(records[0].quarter, "Q4 2023");
        assert_eq!(records[0].date, "2024-01-25");
        assert_eq!(records[7].quarter, "Q1 2022");
        for pair in records.windows(2) {
            assert!(pair[0].date > pair[1].date);
        }
    }

    #[test]
    fn test_dividends_and_insiders_sorted() {
        let mut rng = StdRng::seed_from_u64(6);
        let listing = catalog::find("KO").unwrap();
        let today = now().date_naive();

        let divs = dividends(&mut rng, listing, DEFAULT_DIVIDEND_COUNT, today);
        assert_eq!(divs.len(), 8);
        assert!(divs.iter().all(|d| d.amount > 0.0 && d.dividend_type == "Cash"));
        for pair in divs.windows(2) {
            assert!(pair[0].date > pair[1].date);
        }

        let trades = insiders(&mut rng, listing, DEFAULT_INSIDER_COUNT, today);
        assert_eq!(trades.len(), 10);
        for pair in trades.windows(2) {
            assert!(pair[0].transaction_date >= pair[1].transaction_date);
        }
    }

    #[test]
    fn test_institutions_fixed_holders() {
        let mut rng = StdRng::seed_from_u64(10);
        let listing = catalog::find("JPM").unwrap();
        let holders = institutions(&mut rng, listing, now().date_naive());

        assert_eq!(holders.len(), 10);
        assert_eq!(holders[0].holder, "Vanguard Group");
        for pair in holders.windows(2) {
            assert!(pair[0].percent_held >= pair[1].percent_held);
        }
    }
}
