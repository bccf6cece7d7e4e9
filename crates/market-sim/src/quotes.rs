use market_core::format::round2;
use market_core::{MarketIndex, Quote, SectorPerformance};
use rand::Rng;

use crate::catalog::{Listing, INDICES, LISTINGS};

/// Daily stock volatility used for quotes.
pub const STOCK_VOLATILITY: f64 = 0.03;
/// Indices move less than single names.
pub const INDEX_VOLATILITY: f64 = 0.015;

pub const SPARKLINE_POINTS: usize = 12;

/// A randomized move around `base`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceMove {
    pub value: f64,
    pub change: f64,
    pub change_percent: f64,
}

/// Draw a percent move uniformly in `±volatility * 100` and apply it to `base`.
pub fn random_change<R: Rng + ?Sized>(rng: &mut R, base: f64, volatility: f64) -> PriceMove {
    let change_percent = rng.gen_range(-1.0..1.0) * volatility * 100.0;
    let change = base * (change_percent / 100.0);
    PriceMove {
        value: round2(base + change),
        change: round2(change),
        change_percent: round2(change_percent),
    }
}

/// Short walk starting just under `base_price`, each step within ±1% of base.
pub fn sparkline<R: Rng + ?Sized>(rng: &mut R, base_price: f64, points: usize) -> Vec<f64> {
    let mut current = base_price * 0.98;
    (0..points)
        .map(|_| {
            current += rng.gen_range(-0.5..0.5) * (base_price * 0.02);
            round2(current)
        })
        .collect()
}

pub fn quote<R: Rng + ?Sized>(rng: &mut R, listing: &Listing) -> Quote {
    let mv = random_change(rng, listing.base_price, STOCK_VOLATILITY);
    // Market cap multiplier spans roughly 100M..1T for the catalog's price range.
    let cap_multiplier = rng.gen_range(100.0..1000.0);

    Quote {
        symbol: listing.symbol.to_string(),
        name: listing.name.to_string(),
        price: mv.value,
        change: mv.change,
        change_percent: mv.change_percent,
        volume: rng.gen_range(1_000_000..51_000_000),
        market_cap: (listing.base_price * cap_multiplier * 1_000_000.0).floor() as u64,
        sector: listing.sector.to_string(),
        exchange: listing.exchange.to_string(),
        sparkline_data: sparkline(rng, listing.base_price, SPARKLINE_POINTS),
    }
}

pub fn all_quotes<R: Rng + ?Sized>(rng: &mut R) -> Vec<Quote> {
    LISTINGS.iter().map(|l| quote(rng, l)).collect()
}

/// Substring match over symbol, name and sector.
pub fn search<R: Rng + ?Sized>(rng: &mut R, query: &str) -> Vec<Quote> {
    let needle = query.trim().to_lowercase();
    all_quotes(rng)
        .into_iter()
        .filter(|q| {
            q.symbol.to_lowercase().contains(&needle)
                || q.name.to_lowercase().contains(&needle)
                || q.sector.to_lowercase().contains(&needle)
        })
        .collect()
}

pub fn indices<R: Rng + ?Sized>(rng: &mut R) -> Vec<MarketIndex> {
    INDICES
        .iter()
        .map(|idx| {
            let mv = random_change(rng, idx.base_value, INDEX_VOLATILITY);
            MarketIndex {
                symbol: idx.symbol.to_string(),
                name: idx.name.to_string(),
                value: mv.value,
                change: mv.change,
                change_percent: mv.change_percent,
            }
        })
        .collect()
}

/// Aggregate a fresh set of quotes per sector, in catalog order.
pub fn sectors<R: Rng + ?Sized>(rng: &mut R) -> Vec<SectorPerformance> {
    SectorPerformance::aggregate(&all_quotes(rng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_random_change_bounded() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let mv = random_change(&mut rng, 100.0, STOCK_VOLATILITY);
            assert!(mv.change_percent.abs() <= 3.0);
            assert!((mv.value - 100.0 - mv.change).abs() < 0.011);
        }
    }

    #[test]
    fn test_quote_shape() {
        let mut rng = StdRng::seed_from_u64(1);
        let listing = catalog::find("AAPL").unwrap();
        let q = quote(&mut rng, listing);

        assert_eq!(q.symbol, "AAPL");
        assert!(q.price > 0.0);
        assert!(q.volume >= 1_000_000 && q.volume < 51_000_000);
        assert!(q.market_cap >= (178.50 * 100.0 * 1_000_000.0) as u64);
        assert_eq!(q.sparkline_data.len(), SPARKLINE_POINTS);
    }

    #[test]
    fn test_seeded_quotes_reproducible() {
        let a = all_quotes(&mut StdRng::seed_from_u64(42));
        let b = all_quotes(&mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);

        let c = all_quotes(&mut StdRng::seed_from_u64(43));
        assert_ne!(a, c);
    }

    #[test]
    fn test_search_matches_symbol_name_and_sector() {
        let mut rng = StdRng::seed_from_u64(3);
        let by_name = search(&mut rng, "apple");
        assert!(by_name.iter().any(|q| q.symbol == "AAPL"));

        let by_sector = search(&mut rng, "ENERGY");
        assert_eq!(by_sector.len(), 5);
        assert!(by_sector.iter().all(|q| q.sector == "Energy"));

        assert!(search(&mut rng, "no-such-company").is_empty());
    }

    #[test]
    fn test_indices_use_lower_volatility() {
        let mut rng = StdRng::seed_from_u64(9);
        let idx = indices(&mut rng);
        assert_eq!(idx.len(), 4);
        assert!(idx.iter().all(|i| i.change_percent.abs() <= 1.5));
    }

    #[test]
    fn test_sectors_cover_catalog() {
        let mut rng = StdRng::seed_from_u64(11);
        let sectors = sectors(&mut rng);
        let names: Vec<&str> = sectors.iter().map(|s| s.sector.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Technology",
                "Finance",
                "Healthcare",
                "Consumer",
                "Energy",
                "Industrial",
                "Communications",
                "Crypto"
            ]
        );
        assert!(sectors.iter().all(|s| s.market_cap > 0 && s.volume > 0));
    }
}
