//! Custom serde helpers for exchange wire formats.

use serde::Deserialize;

/// A JSON value that may carry a number either bare or as a string.
///
/// Exchanges disagree: Binance sends `"p": "45000.10"`, others send
/// `"price": 45000.1`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum NumberOrString {
    Int(i64),
    Float(f64),
    Str(String),
}

/// Deserializes a price given as a number or a decimal string into `f64`.
pub mod price {
    use super::NumberOrString;
    use crate::shared::price::{check_price, parse_price};
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<NumberOrString>::deserialize(deserializer)?;
        let parsed = match raw {
            None => return Ok(None),
            Some(NumberOrString::Int(i)) => check_price(i as f64),
            Some(NumberOrString::Float(f)) => check_price(f),
            Some(NumberOrString::Str(s)) => parse_price(&s),
        };
        parsed.map(Some).map_err(serde::de::Error::custom)
    }
}

/// Deserializes Unix-millis given as a number or a numeric string into `i64`.
pub mod timestamp_ms {
    use super::NumberOrString;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<NumberOrString>::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(NumberOrString::Int(i)) => Ok(Some(i)),
            Some(NumberOrString::Float(f)) if f.is_finite() && f.fract() == 0.0 => {
                Ok(Some(f as i64))
            }
            Some(NumberOrString::Float(f)) => Err(serde::de::Error::custom(format!(
                "Invalid timestamp: {}",
                f
            ))),
            Some(NumberOrString::Str(s)) => s.trim().parse::<i64>().map(Some).map_err(|_| {
                serde::de::Error::custom(format!("Invalid timestamp: {}", s))
            }),
        }
    }
}
