//! Axis ticks and grid levels derived from a [`ScaleState`].

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::ScaleState;
use crate::shared::fmt::num;

/// Upper bound on generated labels, whatever the caller asks for.
const MAX_TICKS: usize = 64;

pub const TIME_LABEL_FORMAT: &str = "%H:%M:%S";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeTick {
    pub timestamp: i64,
    pub x: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceTick {
    pub price: f64,
    pub y: f64,
    pub label: String,
}

/// `HH:MM:SS` (UTC) for an epoch-millis timestamp.
pub fn time_label(timestamp_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
        .map(|dt| dt.format(TIME_LABEL_FORMAT).to_string())
        .unwrap_or_default()
}

/// Round step giving roughly `labels` ticks across `[lowest, highest]`.
fn optimal_step(highest: f64, lowest: f64, labels: usize) -> f64 {
    let range = ((highest / 2.0 - lowest / 2.0).abs() * 2.0)
        .clamp(f64::EPSILON, f64::MAX);
    let labels = labels.max(1) as f64;
    let base = 10f64.powf(range.log10().floor());

    match range / base {
        r if r <= labels * 0.1 => 0.1 * base,
        r if r <= labels * 0.2 => 0.2 * base,
        r if r <= labels * 0.5 => 0.5 * base,
        r if r <= labels => base,
        r if r <= labels * 2.0 => 2.0 * base,
        _ => (range / labels).min(5.0 * base),
    }
}

impl ScaleState {
    /// `count` evenly spaced time ticks from the oldest to the newest sample.
    pub fn time_ticks(&self, count: usize) -> Vec<TimeTick> {
        let count = count.min(MAX_TICKS);
        let (t0, t1) = self.time.domain();
        match count {
            0 => Vec::new(),
            1 => vec![self.time_tick(t1)],
            _ => (0..count)
                .map(|i| self.time_tick(t0 + (t1 - t0) * i as f64 / (count - 1) as f64))
                .collect(),
        }
    }

    fn time_tick(&self, t: f64) -> TimeTick {
        let timestamp = t.round() as i64;
        TimeTick {
            timestamp,
            x: self.x(timestamp),
            label: time_label(timestamp),
        }
    }

    /// `levels` evenly spaced horizontal grid lines across the constrained
    /// price band, bottom to top.
    pub fn price_grid(&self, levels: usize) -> Vec<PriceTick> {
        let levels = levels.min(MAX_TICKS);
        let lo = self.bounds.min + self.margin;
        let hi = self.bounds.max - self.margin;
        if levels == 0 {
            return Vec::new();
        }
        if levels == 1 {
            return vec![self.price_tick(self.bounds.mid(), 0)];
        }
        let step = (hi / 2.0 - lo / 2.0) / (levels - 1) as f64 * 2.0;
        let decimals = num::decimals_for_step(step);
        (0..levels)
            .map(|i| self.price_tick(lo + step * i as f64, decimals))
            .collect()
    }

    /// Round-valued price ticks (1/2/5 × 10ⁿ steps), at most about `max_labels`.
    pub fn nice_price_ticks(&self, max_labels: usize) -> Vec<PriceTick> {
        let (lowest, highest) = (self.bounds.min, self.bounds.max);
        if !lowest.is_finite() || !highest.is_finite() || highest <= lowest || max_labels == 0 {
            return Vec::new();
        }
        let step = optimal_step(highest, lowest, max_labels);
        if !(step.is_finite() && step > 0.0) {
            return Vec::new();
        }
        let first = (lowest / step).ceil();
        let last = (highest / step).floor();
        if !(first.is_finite() && last.is_finite()) || last < first {
            return Vec::new();
        }
        let decimals = num::decimals_for_step(step);
        // Float-to-int casts saturate.
        let count = ((last - first) as usize).saturating_add(1).min(MAX_TICKS);
        (0..count)
            .map(|i| self.price_tick((first + i as f64) * step, decimals))
            .collect()
    }

    fn price_tick(&self, price: f64, decimals: usize) -> PriceTick {
        PriceTick {
            price,
            y: self.y(price),
            label: num::price_label(price, decimals),
        }
    }
}
