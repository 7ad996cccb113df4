//! Domain modules: the ingestion path from wire message to rolling window.
//!
//! - `tick` — Wire trade message, conversion into a validated [`tick::Tick`]
//! - `throttle` — Coalesces bursts of ticks into a capped-rate sample stream
//! - `buffer` — Fixed-capacity ordered store of accepted samples
//! - `stats` — Session price-change statistics over accepted samples

pub mod buffer;
pub mod stats;
pub mod throttle;
pub mod tick;
