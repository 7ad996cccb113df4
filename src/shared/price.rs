//! Exact parsing of wire price strings.

use rust_decimal::prelude::*;

use crate::error::ParseError;

/// Parse a decimal price string (e.g. `"45123.45000000"`) into a finite,
/// strictly positive `f64`.
///
/// Goes through `Decimal` so long exchange strings are read exactly before
/// the single lossy conversion. Magnitudes outside `Decimal`'s range are
/// read as plain `f64`.
pub fn parse_price(raw: &str) -> Result<f64, ParseError> {
    let trimmed = raw.trim();
    let value = Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
        .and_then(|decimal| decimal.to_f64())
        .or_else(|| trimmed.parse::<f64>().ok())
        .ok_or_else(|| ParseError::InvalidPrice(raw.to_string()))?;
    check_price(value)
}

/// Reject non-finite and non-positive prices.
pub fn check_price(value: f64) -> Result<f64, ParseError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ParseError::InvalidPrice(value.to_string()))
    }
}
