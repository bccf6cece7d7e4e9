//! OHLCV series as a biased random walk.

use chrono::{Datelike, Duration, Months, NaiveDate};
use market_core::format::round2;
use market_core::{ChartDataPoint, ChartRange};
use rand::Rng;

const WEEKDAYS: [&str; 5] = ["Mon", "Tue", "Wed", "Thu", "Fri"];
const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Trading days per month used to bucket long ranges.
const DAYS_PER_MONTH: usize = 21;

/// Display label for bar `index` of a `range` series ending on `today`.
pub fn time_label(range: ChartRange, index: usize, total: usize, today: NaiveDate) -> String {
    match range {
        ChartRange::OneDay => {
            // 5-minute bars from the 9:30 open
            let minutes = 9 * 60 + 30 + index * 5;
            format!("{}:{:02}", minutes / 60, minutes % 60)
        }
        ChartRange::OneWeek => WEEKDAYS.get(index / 7).copied().unwrap_or("Fri").to_string(),
        ChartRange::OneMonth | ChartRange::ThreeMonths => {
            let date = today - Duration::days((total - index) as i64);
            format!("{}/{}", date.month(), date.day())
        }
        ChartRange::OneYear => MONTHS[(index / DAYS_PER_MONTH) % 12].to_string(),
        ChartRange::All => {
            let back = ((total - index) / DAYS_PER_MONTH) as u32;
            today
                .checked_sub_months(Months::new(back))
                .unwrap_or(today)
                .year()
                .to_string()
        }
    }
}

/// Generate `range.points()` bars starting from `base_price`.
///
/// Volatility is drawn once per series in `[0.02, 0.05)`. Each bar opens at
/// the previous close; highs and lows widen around the body by up to half the
/// move, so `low <= min(open, close)` and `high >= max(open, close)` hold.
pub fn series<R: Rng + ?Sized>(
    rng: &mut R,
    base_price: f64,
    range: ChartRange,
    today: NaiveDate,
) -> Vec<ChartDataPoint> {
    let total = range.points();
    let volatility = rng.gen_range(0.02..0.05);
    let mut current = base_price;

    (0..total)
        .map(|i| {
            let change = rng.gen_range(-1.0..1.0) * current * volatility;
            let open = current;
            let close = (current + change).max(0.01);
            let high = open.max(close) + rng.gen::<f64>() * change.abs() * 0.5;
            let low = (open.min(close) - rng.gen::<f64>() * change.abs() * 0.5).max(0.0);

            current = close;

            let open = round2(open);
            let close = round2(close);
            ChartDataPoint {
                time: time_label(range, i, total, today),
                open,
                // Rounding can pull the wick inside the body; re-clamp after it.
                high: round2(high).max(open.max(close)),
                low: round2(low).min(open.min(close)),
                close,
                volume: rng.gen_range(1_000_000..11_000_000),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn test_series_length_per_range() {
        let mut rng = StdRng::seed_from_u64(5);
        let expected = [
            (ChartRange::OneDay, 78),
            (ChartRange::OneWeek, 35),
            (ChartRange::OneMonth, 22),
            (ChartRange::ThreeMonths, 65),
            (ChartRange::OneYear, 252),
            (ChartRange::All, 500),
        ];
        for (range, len) in expected {
            assert_eq!(series(&mut rng, 178.5, range, today()).len(), len, "{:?}", range);
        }
        assert_eq!(series(&mut rng, 178.5, ChartRange::parse("6M"), today()).len(), 22);
    }

    #[test]
    fn test_bars_bracket_body() {
        let mut rng = StdRng::seed_from_u64(17);
        for range in ChartRange::ALL_RANGES {
            for bar in series(&mut rng, 12.85, range, today()) {
                assert!(bar.low <= bar.open.min(bar.close), "{:?}", bar);
                assert!(bar.high >= bar.open.max(bar.close), "{:?}", bar);
                assert!(bar.low >= 0.0);
                assert!(bar.volume >= 1_000_000 && bar.volume < 11_000_000);
            }
        }
    }

    #[test]
    fn test_walk_is_continuous() {
        let mut rng = StdRng::seed_from_u64(23);
        let bars = series(&mut rng, 100.0, ChartRange::OneMonth, today());
        assert_eq!(bars[0].open, 100.0);
        for pair in bars.windows(2) {
            assert!((pair[1].open - pair[0].close).abs() < 0.011);
        }
    }

    #[test]
    fn test_time_labels() {
        let t = today();
        assert_eq!(time_label(ChartRange::OneDay, 0, 78, t), "9:30");
        assert_eq!(time_label(ChartRange::OneDay, 6, 78, t), "10:00");
        assert_eq!(time_label(ChartRange::OneDay, 77, 78, t), "15:55");
        assert_eq!(time_label(ChartRange::OneWeek, 0, 35, t), "Mon");
        assert_eq!(time_label(ChartRange::OneWeek, 34, 35, t), "Fri");
        assert_eq!(time_label(ChartRange::OneMonth, 21, 22, t), "3/14");
        assert_eq!(time_label(ChartRange::OneYear, 0, 252, t), "Jan");
        assert_eq!(time_label(ChartRange::OneYear, 251, 252, t), "Dec");
        assert_eq!(time_label(ChartRange::All, 499, 500, t), "2024");
        assert_eq!(time_label(ChartRange::All, 0, 500, t), "2022");
    }

    #[test]
    fn test_seeded_series_reproducible() {
        let a = series(&mut StdRng::seed_from_u64(99), 50.0, ChartRange::OneWeek, today());
        let b = series(&mut StdRng::seed_from_u64(99), 50.0, ChartRange::OneWeek, today());
        assert_eq!(a, b);
    }
}
