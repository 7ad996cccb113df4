//! Wire types for the trade stream.

use serde::Deserialize;

use crate::shared::serde_util;

/// One inbound trade frame.
///
/// Field names follow the Binance `<symbol>@trade` stream (`p`, `T`, `E`,
/// `s`); the long spellings are accepted as aliases. Unknown fields are
/// ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TradeMessage {
    #[serde(rename = "e", default)]
    pub event_type: Option<String>,
    #[serde(rename = "s", alias = "symbol", default)]
    pub symbol: Option<String>,
    #[serde(rename = "p", alias = "price", default, with = "serde_util::price")]
    pub price: Option<f64>,
    #[serde(
        rename = "T",
        alias = "time",
        alias = "timestamp",
        default,
        with = "serde_util::timestamp_ms"
    )]
    pub trade_time: Option<i64>,
    #[serde(rename = "E", default, with = "serde_util::timestamp_ms")]
    pub event_time: Option<i64>,
}
