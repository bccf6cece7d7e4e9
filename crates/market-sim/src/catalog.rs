//! Fixed universe backing the synthetic market.

#[derive(Debug, Clone, Copy)]
pub struct Listing {
    pub symbol: &'static str,
    pub name: &'static str,
    pub sector: &'static str,
    pub exchange: &'static str,
    pub base_price: f64,
}

const fn listing(
    symbol: &'static str,
    name: &'static str,
    sector: &'static str,
    exchange: &'static str,
    base_price: f64,
) -> Listing {
    Listing { symbol, name, sector, exchange, base_price }
}

pub const LISTINGS: &[Listing] = &[
    // Technology
    listing("AAPL", "Apple Inc.", "Technology", "NASDAQ", 178.50),
    listing("MSFT", "Microsoft Corporation", "Technology", "NASDAQ", 378.90),
    listing("GOOGL", "Alphabet Inc.", "Technology", "NASDAQ", 141.25),
    listing("AMZN", "Amazon.com Inc.", "Technology", "NASDAQ", 178.35),
    listing("META", "Meta Platforms Inc.", "Technology", "NASDAQ", 505.75),
    listing("NVDA", "NVIDIA Corporation", "Technology", "NASDAQ", 875.50),
    listing("TSLA", "Tesla Inc.", "Technology", "NASDAQ", 245.80),
    listing("AMD", "Advanced Micro Devices", "Technology", "NASDAQ", 165.40),
    listing("INTC", "Intel Corporation", "Technology", "NASDAQ", 43.25),
    listing("CRM", "Salesforce Inc.", "Technology", "NYSE", 267.80),
    listing("ORCL", "Oracle Corporation", "Technology", "NYSE", 125.60),
    listing("ADBE", "Adobe Inc.", "Technology", "NASDAQ", 578.90),
    listing("CSCO", "Cisco Systems Inc.", "Technology", "NASDAQ", 48.75),
    listing("IBM", "IBM Corporation", "Technology", "NYSE", 168.45),
    listing("NFLX", "Netflix Inc.", "Technology", "NASDAQ", 485.30),
    // Finance
    listing("JPM", "JPMorgan Chase & Co.", "Finance", "NYSE", 195.40),
    listing("V", "Visa Inc.", "Finance", "NYSE", 278.90),
    listing("MA", "Mastercard Inc.", "Finance", "NYSE", 458.25),
    listing("BAC", "Bank of America Corp.", "Finance", "NYSE", 37.80),
    listing("WFC", "Wells Fargo & Co.", "Finance", "NYSE", 57.45),
    listing("GS", "Goldman Sachs Group", "Finance", "NYSE", 385.60),
    listing("MS", "Morgan Stanley", "Finance", "NYSE", 98.75),
    listing("AXP", "American Express Co.", "Finance", "NYSE", 215.30),
    listing("BLK", "BlackRock Inc.", "Finance", "NYSE", 785.40),
    listing("SCHW", "Charles Schwab Corp.", "Finance", "NYSE", 72.15),
    // Healthcare
    listing("JNJ", "Johnson & Johnson", "Healthcare", "NYSE", 158.90),
    listing("UNH", "UnitedHealth Group", "Healthcare", "NYSE", 528.45),
    listing("PFE", "Pfizer Inc.", "Healthcare", "NYSE", 28.65),
    listing("ABBV", "AbbVie Inc.", "Healthcare", "NYSE", 175.80),
    listing("MRK", "Merck & Co. Inc.", "Healthcare", "NYSE", 125.40),
    listing("LLY", "Eli Lilly and Co.", "Healthcare", "NYSE", 785.60),
    listing("TMO", "Thermo Fisher Scientific", "Healthcare", "NYSE", 565.25),
    listing("ABT", "Abbott Laboratories", "Healthcare", "NYSE", 108.90),
    listing("DHR", "Danaher Corporation", "Healthcare", "NYSE", 248.75),
    listing("BMY", "Bristol-Myers Squibb", "Healthcare", "NYSE", 52.30),
    // Consumer
    listing("WMT", "Walmart Inc.", "Consumer", "NYSE", 165.80),
    listing("PG", "Procter & Gamble Co.", "Consumer", "NYSE", 158.45),
    listing("KO", "Coca-Cola Company", "Consumer", "NYSE", 62.75),
    listing("PEP", "PepsiCo Inc.", "Consumer", "NASDAQ", 178.90),
    listing("COST", "Costco Wholesale", "Consumer", "NASDAQ", 725.60),
    listing("MCD", "McDonald's Corporation", "Consumer", "NYSE", 298.45),
    listing("NKE", "Nike Inc.", "Consumer", "NYSE", 98.75),
    listing("SBUX", "Starbucks Corporation", "Consumer", "NASDAQ", 95.40),
    listing("HD", "Home Depot Inc.", "Consumer", "NYSE", 385.60),
    listing("LOW", "Lowe's Companies", "Consumer", "NYSE", 248.90),
    // Energy
    listing("XOM", "Exxon Mobil Corp.", "Energy", "NYSE", 108.75),
    listing("CVX", "Chevron Corporation", "Energy", "NYSE", 155.40),
    listing("COP", "ConocoPhillips", "Energy", "NYSE", 118.25),
    listing("SLB", "Schlumberger Ltd.", "Energy", "NYSE", 52.80),
    listing("EOG", "EOG Resources Inc.", "Energy", "NYSE", 128.45),
    // Industrial
    listing("CAT", "Caterpillar Inc.", "Industrial", "NYSE", 345.60),
    listing("BA", "Boeing Company", "Industrial", "NYSE", 215.80),
    listing("GE", "General Electric Co.", "Industrial", "NYSE", 158.45),
    listing("MMM", "3M Company", "Industrial", "NYSE", 108.75),
    listing("UPS", "United Parcel Service", "Industrial", "NYSE", 148.90),
    listing("HON", "Honeywell International", "Industrial", "NASDAQ", 205.60),
    listing("RTX", "RTX Corporation", "Industrial", "NYSE", 98.45),
    listing("LMT", "Lockheed Martin Corp.", "Industrial", "NYSE", 465.80),
    // Communications
    listing("VZ", "Verizon Communications", "Communications", "NYSE", 42.75),
    listing("T", "AT&T Inc.", "Communications", "NYSE", 17.85),
    listing("TMUS", "T-Mobile US Inc.", "Communications", "NASDAQ", 165.40),
    listing("DIS", "Walt Disney Company", "Communications", "NYSE", 108.90),
    listing("CMCSA", "Comcast Corporation", "Communications", "NASDAQ", 42.65),
    // Crypto-related
    listing("COIN", "Coinbase Global Inc.", "Crypto", "NASDAQ", 245.80),
    listing("MARA", "Marathon Digital", "Crypto", "NASDAQ", 24.65),
    listing("RIOT", "Riot Platforms Inc.", "Crypto", "NASDAQ", 12.85),
];

/// Listings that never pay a dividend in the synthetic market.
const NON_PAYERS: &[&str] = &[
    "AMZN", "TSLA", "AMD", "ADBE", "NFLX", "CRM", "BA", "DIS", "COIN", "MARA", "RIOT",
];

/// Symbols surfaced on the dashboard by default.
pub const DEFAULT_SYMBOLS: &[&str] = &[
    "AAPL", "MSFT", "GOOGL", "AMZN", "NVDA", "META", "TSLA", "JPM", "JNJ", "V", "UNH", "HD",
    "PG", "MA", "NFLX",
];

#[derive(Debug, Clone, Copy)]
pub struct IndexListing {
    pub symbol: &'static str,
    pub name: &'static str,
    pub base_value: f64,
}

pub const INDICES: &[IndexListing] = &[
    IndexListing { symbol: "SPX", name: "S&P 500", base_value: 5125.40 },
    IndexListing { symbol: "DJI", name: "Dow Jones", base_value: 38875.50 },
    IndexListing { symbol: "IXIC", name: "NASDAQ", base_value: 16245.80 },
    IndexListing { symbol: "RUT", name: "Russell 2000", base_value: 2045.60 },
];

/// Case-insensitive catalog lookup.
pub fn find(symbol: &str) -> Option<&'static Listing> {
    LISTINGS
        .iter()
        .find(|l| l.symbol.eq_ignore_ascii_case(symbol.trim()))
}

impl Listing {
    pub fn pays_dividend(&self) -> bool {
        !NON_PAYERS.contains(&self.symbol)
    }

    pub fn industry(&self) -> &'static str {
        match self.sector {
            "Technology" => "Software & Semiconductors",
            "Finance" => "Banking & Financial Services",
            "Healthcare" => "Pharmaceuticals & Health Services",
            "Consumer" => "Consumer Staples & Retail",
            "Energy" => "Oil & Gas",
            "Industrial" => "Aerospace & Machinery",
            "Communications" => "Telecom & Media",
            "Crypto" => "Digital Asset Services",
            _ => "Diversified",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_symbols_unique() {
        let symbols: HashSet<&str> = LISTINGS.iter().map(|l| l.symbol).collect();
        assert_eq!(symbols.len(), LISTINGS.len());
        assert_eq!(LISTINGS.len(), 66);
    }

    #[test]
    fn test_default_symbols_are_listed() {
        for symbol in DEFAULT_SYMBOLS {
            assert!(find(symbol).is_some(), "{} missing from catalog", symbol);
        }
    }

    #[test]
    fn test_find_is_case_insensitive() {
        assert_eq!(find("aapl").map(|l| l.symbol), Some("AAPL"));
        assert!(find("ZZZZ").is_none());
    }
}
