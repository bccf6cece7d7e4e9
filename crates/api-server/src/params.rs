//! Request parameters and their validation.

use serde::Deserialize;

use crate::error::ApiError;

pub const MAX_SYMBOL_LEN: usize = 10;
pub const MAX_QUERY_LEN: usize = 100;
pub const MAX_TEXT_LEN: usize = 5000;
pub const MAX_QUARTERS: usize = 40;
pub const MAX_COUNT: usize = 100;
pub const MAX_NEWS_LIMIT: usize = 100;

/// Uppercased ticker. Letters, digits and `.-^=` only, at most ten characters.
pub fn symbol(raw: &str) -> Result<String, ApiError> {
    let symbol = raw.trim().to_uppercase();
    let valid = !symbol.is_empty()
        && symbol.chars().count() <= MAX_SYMBOL_LEN
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='));

    if valid {
        Ok(symbol)
    } else {
        Err(ApiError::BadRequest("Invalid symbol"))
    }
}

/// Positive integer or `default` when absent, zero or unparsable; capped at `max`.
pub fn count(raw: Option<&str>, default: usize, max: usize) -> usize {
    raw.and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(default)
        .min(max)
}

/// Free text between 1 and 5000 characters.
pub fn text(raw: &str) -> Result<&str, ApiError> {
    let len = raw.chars().count();
    if len == 0 || len > MAX_TEXT_LEN {
        Err(ApiError::BadRequest("Invalid request body"))
    } else {
        Ok(raw)
    }
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Matched against symbol, name and sector.
    pub q: Option<String>,
}

impl SearchQuery {
    pub fn validated(&self) -> Result<&str, ApiError> {
        let q = self.q.as_deref().unwrap_or_default();
        if q.is_empty() {
            return Err(ApiError::BadRequest("Query parameter 'q' is required"));
        }
        if q.trim().is_empty() || q.chars().count() > MAX_QUERY_LEN {
            return Err(ApiError::BadRequest("Invalid search query"));
        }
        Ok(q.trim())
    }
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RangeQuery {
    /// `1D`, `1W`, `1M`, `3M`, `1Y` or `ALL`; anything else means `1M`.
    pub range: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LimitQuery {
    pub limit: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct QuartersQuery {
    pub quarters: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CountQuery {
    pub count: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct TextRequest {
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_validation() {
        assert_eq!(symbol(" aapl ").unwrap(), "AAPL");
        assert_eq!(symbol("brk.b").unwrap(), "BRK.B");
        assert_eq!(symbol("^GSPC").unwrap(), "^GSPC");
        assert!(symbol("").is_err());
        assert!(symbol("ABCDEFGHIJK").is_err());
        assert!(symbol("AA PL").is_err());
        assert!(symbol("<script>").is_err());
    }

    #[test]
    fn test_count_defaults_and_caps() {
        assert_eq!(count(None, 8, MAX_QUARTERS), 8);
        assert_eq!(count(Some("abc"), 8, MAX_QUARTERS), 8);
        assert_eq!(count(Some("0"), 8, MAX_QUARTERS), 8);
        assert_eq!(count(Some("-3"), 8, MAX_QUARTERS), 8);
        assert_eq!(count(Some("12"), 8, MAX_QUARTERS), 12);
        assert_eq!(count(Some("500"), 8, MAX_QUARTERS), 40);
    }

    #[test]
    fn test_search_query_messages() {
        let missing = SearchQuery { q: None }.validated().unwrap_err();
        assert_eq!(missing.to_string(), "Query parameter 'q' is required");

        let long = SearchQuery {
            q: Some("x".repeat(101)),
        };
        assert_eq!(
            long.validated().unwrap_err().to_string(),
            "Invalid search query"
        );

        let ok = SearchQuery {
            q: Some(" tech ".to_string()),
        };
        assert_eq!(ok.validated().unwrap(), "tech");
    }

    #[test]
    fn test_text_bounds() {
        assert!(text("").is_err());
        assert!(text(&"a".repeat(5001)).is_err());
        assert_eq!(text("fine").unwrap(), "fine");
    }
}
