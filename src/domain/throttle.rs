//! Ingestion throttle: decouples wire delivery rate from the acceptance cadence.
//!
//! Every tick overwrites `latest`; a fixed-period timer calls
//! [`IngestionThrottle::on_period`] which accepts `latest` if it arrived after
//! the last accepted sample. Within one period the last tick wins, and nothing
//! is synthesized while the stream is idle.

use crate::domain::tick::Tick;
use crate::shared::Sample;

#[derive(Debug, Clone, Copy)]
struct Pending {
    tick: Tick,
    seq: u64,
}

/// Counters exposed for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThrottleStats {
    /// Ticks passed to `record`.
    pub received: u64,
    /// Samples handed to the buffer.
    pub accepted: u64,
    /// Ticks overwritten before they could be accepted.
    pub coalesced: u64,
    /// Ticks older than the last accepted sample.
    pub stale: u64,
}

#[derive(Debug, Clone, Default)]
pub struct IngestionThrottle {
    latest: Option<Pending>,
    seq: u64,
    accepted_seq: u64,
    last_accepted: Option<Sample>,
    stats: ThrottleStats,
}

impl IngestionThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one tick.
    ///
    /// Returns `Some` only for the very first tick of a session, which is
    /// accepted immediately to establish the baseline.
    pub fn record(&mut self, tick: Tick) -> Option<Sample> {
        self.seq += 1;
        self.stats.received += 1;
        if self.has_pending() {
            self.stats.coalesced += 1;
        }
        self.latest = Some(Pending {
            tick,
            seq: self.seq,
        });

        if self.last_accepted.is_none() {
            return self.accept();
        }
        None
    }

    /// Periodic acceptance check.
    pub fn on_period(&mut self) -> Option<Sample> {
        if !self.has_pending() {
            return None;
        }
        self.accept()
    }

    /// Whether a tick is waiting for the next period.
    pub fn has_pending(&self) -> bool {
        self.latest.is_some_and(|p| p.seq > self.accepted_seq)
    }

    /// Latest raw tick, accepted or not.
    pub fn latest(&self) -> Option<Tick> {
        self.latest.map(|p| p.tick)
    }

    pub fn last_accepted(&self) -> Option<Sample> {
        self.last_accepted
    }

    pub fn stats(&self) -> ThrottleStats {
        self.stats
    }

    /// Forget everything; the next tick becomes a new baseline.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn accept(&mut self) -> Option<Sample> {
        let pending = self.latest?;
        self.accepted_seq = pending.seq;

        let sample = pending.tick.to_sample();
        if let Some(last) = self.last_accepted {
            if sample.timestamp < last.timestamp {
                self.stats.stale += 1;
                tracing::debug!(
                    "Dropping stale tick: ts={} < last accepted ts={}",
                    sample.timestamp,
                    last.timestamp
                );
                return None;
            }
        }

        self.last_accepted = Some(sample);
        self.stats.accepted += 1;
        Some(sample)
    }
}
