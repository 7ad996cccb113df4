//! Session statistics over accepted samples.

use serde::Serialize;

use crate::shared::fmt::num;
use crate::shared::{Direction, Sample};

/// Running open/high/low/last over every sample accepted this session.
///
/// Unlike the rolling window this never evicts, so the change is measured
/// from the first sample of the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SessionStats {
    pub open: Option<Sample>,
    pub last: Option<Sample>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub count: u64,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, sample: Sample) {
        if self.open.is_none() {
            self.open = Some(sample);
        }
        self.last = Some(sample);
        self.high = Some(self.high.map_or(sample.price, |h| h.max(sample.price)));
        self.low = Some(self.low.map_or(sample.price, |l| l.min(sample.price)));
        self.count += 1;
    }

    /// `last - open`.
    pub fn change(&self) -> Option<f64> {
        Some(self.last?.price - self.open?.price)
    }

    /// Change relative to the open, in percent.
    pub fn change_percent(&self) -> Option<f64> {
        let open = self.open?.price;
        if open == 0.0 {
            return None;
        }
        Some(self.change()? / open * 100.0)
    }

    /// Session-level trend used for line coloring.
    pub fn trend(&self) -> Direction {
        match (self.open, self.last) {
            (Some(open), Some(last)) => Direction::between(open.price, last.price),
            _ => Direction::Flat,
        }
    }

    /// Change badge text, e.g. `+1,250.50`.
    pub fn change_label(&self, decimals: usize) -> Option<String> {
        self.change().map(|c| num::signed_change(c, decimals))
    }

    /// Percent badge text, e.g. `-0.11%`.
    pub fn percent_label(&self) -> Option<String> {
        self.change_percent().map(num::signed_percent)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_stats() {
        let stats = SessionStats::new();
        assert!(stats.change().is_none());
        assert!(stats.change_percent().is_none());
        assert_eq!(stats.trend(), Direction::Flat);
    }

    #[test]
    fn test_change_from_open() {
        let mut stats = SessionStats::new();
        stats.update(Sample::new(1000, 45000.0));
        stats.update(Sample::new(1200, 45100.0));
        stats.update(Sample::new(1400, 44950.0));
        assert_eq!(stats.change(), Some(-50.0));
        let pct = stats.change_percent().unwrap();
        assert!((pct - (-50.0 / 45000.0 * 100.0)).abs() < 1e-12);
        assert_eq!(stats.high, Some(45100.0));
        assert_eq!(stats.low, Some(44950.0));
        assert_eq!(stats.count, 3);
        assert_eq!(stats.trend(), Direction::Down);
        assert_eq!(stats.change_label(2).as_deref(), Some("-50.00"));
        assert_eq!(stats.percent_label().as_deref(), Some("-0.11%"));
    }

    #[test]
    fn test_reset() {
        let mut stats = SessionStats::new();
        stats.update(Sample::new(1, 1.0));
        stats.reset();
        assert_eq!(stats, SessionStats::default());
    }
}
