//! Human-readable formatting for prices and price changes.

pub mod num;
