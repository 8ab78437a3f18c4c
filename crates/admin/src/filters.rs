//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use coza_core::catalog::LOW_STOCK_THRESHOLD;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// CSS class for a stock level: out, low (below the low-stock threshold) or ok.
///
/// Usage in templates: `<span class="stock {{ product.stock|stock_class }}">`
#[askama::filter_fn]
pub fn stock_class(stock: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(stock_level(&stock.to_string()))
}

fn stock_level(stock: &str) -> &'static str {
    match stock.parse::<u32>() {
        Ok(0) | Err(_) => "stock-out",
        Ok(n) if n < LOW_STOCK_THRESHOLD => "stock-low",
        Ok(_) => "stock-ok",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_level() {
        assert_eq!(stock_level("0"), "stock-out");
        assert_eq!(stock_level("4"), "stock-low");
        assert_eq!(stock_level("5"), "stock-ok");
        assert_eq!(stock_level("-1"), "stock-out");
    }
}
