//! Small numeric helpers shared by the generators and prompt builders.

/// Round a monetary figure to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Compact market-cap label: `2.85T`, `512.40B`, `75.00M`.
pub fn format_market_cap(value: f64) -> String {
    if value >= 1e12 {
        format!("{:.2}T", value / 1e12)
    } else if value >= 1e9 {
        format!("{:.2}B", value / 1e9)
    } else if value >= 1e6 {
        format!("{:.2}M", value / 1e6)
    } else {
        format!("{:.0}", value)
    }
}

/// Compact volume label: `1.20B`, `45.10M`, `980.00K`.
pub fn format_volume(value: f64) -> String {
    if value >= 1e9 {
        format!("{:.2}B", value / 1e9)
    } else if value >= 1e6 {
        format!("{:.2}M", value / 1e6)
    } else if value >= 1e3 {
        format!("{:.2}K", value / 1e3)
    } else {
        format!("{:.0}", value)
    }
}

/// Prefix non-negative numbers with `+`.
pub fn signed(value: f64) -> String {
    if value >= 0.0 {
        format!("+{:.2}", value)
    } else {
        format!("{:.2}", value)
    }
}
