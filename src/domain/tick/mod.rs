//! Tick domain: one validated price observation from the wire.

mod convert;
pub mod wire;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::shared::Sample;

pub use wire::TradeMessage;

/// A validated trade tick: finite positive price and a millisecond timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub price: f64,
    pub timestamp: i64,
}

impl Tick {
    /// Parse one raw text frame.
    ///
    /// Any failure is a [`ParseError`]; callers drop the frame and continue.
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let msg: TradeMessage =
            serde_json::from_str(raw).map_err(|e| ParseError::Json(e.to_string()))?;
        Tick::try_from(msg)
    }

    pub fn to_sample(self) -> Sample {
        Sample::new(self.timestamp, self.price)
    }
}

impl From<Tick> for Sample {
    fn from(tick: Tick) -> Self {
        tick.to_sample()
    }
}
