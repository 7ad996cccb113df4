//! Conversion from the wire trade frame to a validated tick.

use super::wire::TradeMessage;
use super::Tick;
use crate::error::ParseError;

impl TryFrom<TradeMessage> for Tick {
    type Error = ParseError;

    fn try_from(msg: TradeMessage) -> Result<Self, Self::Error> {
        let price = msg.price.ok_or(ParseError::MissingField("price"))?;
        // Trade time first; the event time is a close second on Binance.
        let timestamp = msg
            .trade_time
            .or(msg.event_time)
            .ok_or(ParseError::MissingField("timestamp"))?;
        if timestamp < 0 {
            return Err(ParseError::InvalidTimestamp(timestamp.to_string()));
        }
        Ok(Tick { price, timestamp })
    }
}
