//! Chart configuration: plain numeric constants supplied at construction.
//!
//! Every field has a default matching the reference live BTC chart, and
//! `#[serde(default)]` lets a JSON document override any subset:
//!
//! ```rust,ignore
//! let config = ChartConfig::from_json_str(r#"{ "capacity": 150, "zoom_precision": 25 }"#)?;
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Maximum number of accepted samples kept in the rolling window.
pub const DEFAULT_CAPACITY: usize = 40;

/// Fixed acceptance period of the ingestion throttle.
pub const DEFAULT_ACCEPTANCE_PERIOD_MS: u64 = 200;

// ─── Viewport ────────────────────────────────────────────────────────────────

/// Drawing surface size and inner padding, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub padding_top: f64,
    pub padding_right: f64,
    pub padding_bottom: f64,
    pub padding_left: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 400.0,
            padding_top: 20.0,
            padding_right: 20.0,
            padding_bottom: 30.0,
            padding_left: 50.0,
        }
    }
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Horizontal plotting range `[left, right]`.
    pub fn x_range(&self) -> (f64, f64) {
        (self.padding_left, self.width - self.padding_right)
    }

    /// Vertical plotting range `[bottom, top]` in screen coordinates
    /// (y grows downward, so higher prices map to smaller y).
    pub fn y_range(&self) -> (f64, f64) {
        (self.height - self.padding_bottom, self.padding_top)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let (x0, x1) = self.x_range();
        let (y0, y1) = self.y_range();
        let finite = [self.width, self.height, x0, x1, y0, y1]
            .iter()
            .all(|v| v.is_finite());
        if !finite || x1 <= x0 || y0 <= y1 {
            return Err(ConfigError::Viewport {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

// ─── Animator selection ──────────────────────────────────────────────────────

/// Motion used by the displayed-price animator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnimatorKind {
    /// Fixed-duration cubic ease-out.
    Tween { duration_ms: u64 },
    /// Critically damped spring; `stiffness` is ω² in 1/s².
    Spring { stiffness: f64 },
}

impl Default for AnimatorKind {
    fn default() -> Self {
        AnimatorKind::Tween { duration_ms: 1200 }
    }
}

// ─── ChartConfig ─────────────────────────────────────────────────────────────

/// Construction-time configuration for [`LiveChart`](crate::chart::LiveChart).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Rolling window size.
    pub capacity: usize,
    /// Ingestion throttle period.
    pub acceptance_period_ms: u64,
    /// Half-width of the default visible price range, in price units.
    pub zoom_precision: f64,
    /// Expansion applied to the observed price range (0.3 = 30 %).
    pub buffer_fraction: f64,
    /// Inset applied when constraining plotted prices (0.05 = 5 % of span).
    pub margin_fraction: f64,

    pub price_animator: AnimatorKind,
    /// Jumps larger than this fraction of the zoom precision are mostly snapped.
    pub jump_fraction: f64,
    /// Share of the jump threshold left to animate after a snap.
    pub jump_remainder: f64,
    pub settle_epsilon: f64,

    pub segment_reveal_ms: u64,
    pub echo_size: usize,
    pub echo_interval_ms: u64,
    pub echo_draw_ms: u64,

    /// Host frame period used by the async driver.
    pub frame_interval_ms: u64,

    pub viewport: Viewport,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            acceptance_period_ms: DEFAULT_ACCEPTANCE_PERIOD_MS,
            zoom_precision: 100.0,
            buffer_fraction: 0.3,
            margin_fraction: 0.05,
            price_animator: AnimatorKind::default(),
            jump_fraction: 0.8,
            jump_remainder: 0.2,
            settle_epsilon: 1e-6,
            segment_reveal_ms: 1000,
            echo_size: 10,
            echo_interval_ms: 1000,
            echo_draw_ms: 1000,
            frame_interval_ms: 16,
            viewport: Viewport::default(),
        }
    }
}

impl ChartConfig {
    /// Parse a (possibly partial) JSON config and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: ChartConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::out_of_range("capacity", ">= 1", self.capacity));
        }
        if self.acceptance_period_ms == 0 {
            return Err(ConfigError::out_of_range(
                "acceptance_period_ms",
                "> 0",
                self.acceptance_period_ms,
            ));
        }
        if !(self.zoom_precision.is_finite() && self.zoom_precision > 0.0) {
            return Err(ConfigError::out_of_range(
                "zoom_precision",
                "finite and > 0",
                self.zoom_precision,
            ));
        }
        if !(self.buffer_fraction.is_finite() && self.buffer_fraction >= 0.0) {
            return Err(ConfigError::out_of_range(
                "buffer_fraction",
                "finite and >= 0",
                self.buffer_fraction,
            ));
        }
        if !(0.0..0.5).contains(&self.margin_fraction) {
            return Err(ConfigError::out_of_range(
                "margin_fraction",
                "in [0, 0.5)",
                self.margin_fraction,
            ));
        }
        if !(self.jump_fraction.is_finite() && self.jump_fraction > 0.0) {
            return Err(ConfigError::out_of_range(
                "jump_fraction",
                "finite and > 0",
                self.jump_fraction,
            ));
        }
        if !(0.0..=1.0).contains(&self.jump_remainder) {
            return Err(ConfigError::out_of_range(
                "jump_remainder",
                "in [0, 1]",
                self.jump_remainder,
            ));
        }
        if !(self.settle_epsilon.is_finite() && self.settle_epsilon > 0.0) {
            return Err(ConfigError::out_of_range(
                "settle_epsilon",
                "finite and > 0",
                self.settle_epsilon,
            ));
        }
        match self.price_animator {
            AnimatorKind::Tween { duration_ms: 0 } => {
                return Err(ConfigError::out_of_range(
                    "price_animator.duration_ms",
                    "> 0",
                    0,
                ));
            }
            AnimatorKind::Spring { stiffness } if !(stiffness.is_finite() && stiffness > 0.0) => {
                return Err(ConfigError::out_of_range(
                    "price_animator.stiffness",
                    "finite and > 0",
                    stiffness,
                ));
            }
            _ => {}
        }
        if self.echo_size < 2 {
            return Err(ConfigError::out_of_range("echo_size", ">= 2", self.echo_size));
        }
        for (field, value) in [
            ("segment_reveal_ms", self.segment_reveal_ms),
            ("echo_interval_ms", self.echo_interval_ms),
            ("echo_draw_ms", self.echo_draw_ms),
            ("frame_interval_ms", self.frame_interval_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::out_of_range(field, "> 0", value));
            }
        }
        self.viewport.validate()
    }
}
