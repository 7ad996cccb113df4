//! Displayed-price animator.
//!
//! Two phases: `Idle` holds the displayed value, `Converging` moves it toward
//! the latest target. The first target is taken as-is (baseline). A jump
//! larger than `jump_fraction × zoom_precision` is mostly absorbed at once:
//! the displayed value snaps to within `jump_fraction × zoom_precision ×
//! jump_remainder` of the target and only that remainder is animated.

use serde::Serialize;

use crate::animation::animator::{self, Animator};
use crate::config::ChartConfig;
use crate::shared::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PricePhase {
    #[default]
    Idle,
    Converging,
}

/// Emitted once per completed convergence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceSettled {
    pub price: f64,
    /// Sign of `price - previous settled price`.
    pub direction: Direction,
}

/// What `set_target` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetOutcome {
    /// First price; displayed immediately.
    Baseline,
    /// Within epsilon of the current target; nothing to do.
    Unchanged,
    /// Motion (re)started; the caller should request a frame.
    Started { snapped: bool },
}

#[derive(Debug)]
pub struct PriceAnimator {
    motion: Box<dyn Animator>,
    phase: PricePhase,
    displayed: Option<f64>,
    target: Option<f64>,
    last_settled: Option<f64>,
    last_frame_ms: Option<f64>,
    direction: Direction,
    epsilon: f64,
    jump_fraction: f64,
    jump_remainder: f64,
    settles: u64,
}

impl PriceAnimator {
    pub fn new(config: &ChartConfig) -> Self {
        Self {
            motion: animator::from_kind(config.price_animator, config.settle_epsilon),
            phase: PricePhase::Idle,
            displayed: None,
            target: None,
            last_settled: None,
            last_frame_ms: None,
            direction: Direction::Flat,
            epsilon: config.settle_epsilon,
            jump_fraction: config.jump_fraction,
            jump_remainder: config.jump_remainder,
            settles: 0,
        }
    }

    /// Point the animator at a new accepted price.
    pub fn set_target(&mut self, price: f64, zoom_precision: f64, now_ms: f64) -> TargetOutcome {
        let Some(displayed) = self.displayed else {
            self.motion.snap(price);
            self.displayed = Some(price);
            self.target = Some(price);
            self.last_settled = Some(price);
            self.phase = PricePhase::Idle;
            return TargetOutcome::Baseline;
        };

        if let Some(target) = self.target {
            if (price - target).abs() <= self.epsilon {
                return TargetOutcome::Unchanged;
            }
        }

        let threshold = self.jump_fraction * zoom_precision;
        let delta = price - displayed;
        let (from, snapped) = if delta.abs() > threshold {
            let remainder = threshold * self.jump_remainder;
            (price - delta.signum() * remainder, true)
        } else {
            (displayed, false)
        };

        if snapped {
            // A snap discards any momentum.
            self.motion.snap(from);
            tracing::debug!(
                "Price jump {:.4} > {:.4}: snapped to {:.4}",
                delta,
                threshold,
                from
            );
        }
        self.motion.retarget(from, price);
        self.displayed = Some(from);
        self.target = Some(price);
        self.last_frame_ms = Some(now_ms);
        self.phase = PricePhase::Converging;
        TargetOutcome::Started { snapped }
    }

    /// Advance to `now_ms`. Returns the settle event on the frame the motion
    /// completes; a convergence interrupted by a new target settles once, at
    /// the end of its replacement.
    pub fn advance(&mut self, now_ms: f64) -> Option<PriceSettled> {
        if self.phase != PricePhase::Converging {
            return None;
        }
        let target = self.target?;
        let dt = self
            .last_frame_ms
            .map_or(0.0, |last| (now_ms - last).max(0.0));
        self.last_frame_ms = Some(now_ms);

        let (value, done) = self.motion.step(dt);
        if !done && (value - target).abs() > self.epsilon {
            self.displayed = Some(value);
            return None;
        }

        self.displayed = Some(target);
        self.motion.snap(target);
        self.phase = PricePhase::Idle;
        self.direction = self
            .last_settled
            .map_or(Direction::Flat, |prev| Direction::between(prev, target));
        self.last_settled = Some(target);
        self.settles += 1;
        Some(PriceSettled {
            price: target,
            direction: self.direction,
        })
    }

    /// Drop any in-flight motion, holding the current displayed value.
    pub fn cancel(&mut self) {
        if let Some(displayed) = self.displayed {
            self.motion.snap(displayed);
            self.target = Some(displayed);
        }
        self.phase = PricePhase::Idle;
        self.last_frame_ms = None;
    }

    /// Forget the baseline; the next target is displayed immediately.
    pub fn reset(&mut self) {
        self.cancel();
        self.displayed = None;
        self.target = None;
        self.last_settled = None;
        self.direction = Direction::Flat;
    }

    pub fn displayed(&self) -> Option<f64> {
        self.displayed
    }

    pub fn target(&self) -> Option<f64> {
        self.target
    }

    pub fn phase(&self) -> PricePhase {
        self.phase
    }

    pub fn is_animating(&self) -> bool {
        self.phase == PricePhase::Converging
    }

    /// Direction of the most recent settle.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn last_settled(&self) -> Option<f64> {
        self.last_settled
    }

    pub fn settle_count(&self) -> u64 {
        self.settles
    }
}
