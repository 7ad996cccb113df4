//! Scale computation: time→x and price→y mappings derived from the window.
//!
//! The price domain is centred on the midpoint of the observed extent and
//! expanded by a buffer fraction, with the zoom precision as a floor on the
//! half-width. Plotted prices are then inset by a safety margin through
//! [`ScaleState::constrain_price`]. Growing the domain and placing points are
//! two separate stages so a single tick does not visibly rescale the chart.

pub mod axis;

use serde::Serialize;

use crate::config::{ChartConfig, Viewport};
use crate::domain::buffer::SampleBuffer;
use crate::shared::{Point, Sample};

pub use axis::{PriceTick, TimeTick};

// ─── LinearScale ─────────────────────────────────────────────────────────────

/// Affine map from `domain` onto `range`.
///
/// A degenerate domain (both ends equal) maps every input to the middle of
/// the range instead of dividing by zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    pub fn is_degenerate(&self) -> bool {
        self.domain.0 == self.domain.1
    }

    pub fn apply(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if self.is_degenerate() {
            return (r0 + r1) / 2.0;
        }
        // Halved operands keep extreme domains from overflowing.
        let t = (value / 2.0 - d0 / 2.0) / (d1 / 2.0 - d0 / 2.0);
        r0 + t * (r1 - r0)
    }

    pub fn invert(&self, pixel: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if r0 == r1 {
            return (d0 + d1) / 2.0;
        }
        let t = (pixel - r0) / (r1 - r0);
        d0 + t * (d1 / 2.0 - d0 / 2.0) * 2.0
    }
}

// ─── PriceBounds ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceBounds {
    pub min: f64,
    pub max: f64,
}

impl PriceBounds {
    /// May be infinite for extreme bounds; [`PriceBounds::half_span`] is not.
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn half_span(&self) -> f64 {
        self.max / 2.0 - self.min / 2.0
    }

    pub fn mid(&self) -> f64 {
        self.min / 2.0 + self.max / 2.0
    }
}

/// Parameters of the price domain, usually taken from [`ChartConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleParams {
    pub zoom_precision: f64,
    pub buffer_fraction: f64,
    pub margin_fraction: f64,
}

impl From<&ChartConfig> for ScaleParams {
    fn from(config: &ChartConfig) -> Self {
        Self {
            zoom_precision: config.zoom_precision,
            buffer_fraction: config.buffer_fraction,
            margin_fraction: config.margin_fraction,
        }
    }
}

impl ScaleParams {
    /// Domain around an observed `[lo, hi]` extent.
    ///
    /// Both ends stay finite for any finite extent.
    pub fn bounds_for(&self, lo: f64, hi: f64) -> PriceBounds {
        let mid = lo / 2.0 + hi / 2.0;
        let half = ((hi / 2.0 - lo / 2.0) * (1.0 + self.buffer_fraction))
            .max(self.zoom_precision)
            .min(f64::MAX / 2.0);
        PriceBounds {
            min: (mid - half).max(-f64::MAX),
            max: (mid + half).min(f64::MAX),
        }
    }
}

// ─── ScaleState ──────────────────────────────────────────────────────────────

/// Derived view mapping. Recomputed whenever the window or the animated
/// price changes; never stored across sessions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScaleState {
    pub time: LinearScale,
    pub price: LinearScale,
    pub bounds: PriceBounds,
    /// Inset applied by [`ScaleState::constrain_price`].
    pub margin: f64,
}

impl ScaleState {
    #[inline]
    pub fn x(&self, timestamp: i64) -> f64 {
        self.time.apply(timestamp as f64)
    }

    #[inline]
    pub fn y(&self, price: f64) -> f64 {
        self.price.apply(price)
    }

    /// Unconstrained projection, used by the historical path.
    pub fn project(&self, sample: &Sample) -> Point {
        Point::new(self.x(sample.timestamp), self.y(sample.price))
    }

    /// Projection with the price constrained, used for markers.
    pub fn project_constrained(&self, sample: &Sample) -> Point {
        Point::new(
            self.x(sample.timestamp),
            self.y(self.constrain_price(sample.price)),
        )
    }

    /// Clamp a price into `[min + margin, max - margin]`.
    ///
    /// NaN maps to the midpoint; infinities clamp like any far-out value.
    pub fn constrain_price(&self, price: f64) -> f64 {
        let lo = self.bounds.min + self.margin;
        let hi = self.bounds.max - self.margin;
        if price.is_nan() || !(lo <= hi) {
            return self.bounds.mid();
        }
        price.max(lo).min(hi)
    }
}

/// Compute scales for the current window.
///
/// Returns `None` below two samples: callers render a placeholder instead.
pub fn compute_scales(
    buffer: &SampleBuffer,
    animated_price: Option<f64>,
    viewport: &Viewport,
    params: &ScaleParams,
) -> Option<ScaleState> {
    if buffer.len() < 2 {
        return None;
    }
    let first = buffer.first()?;
    let last = buffer.last()?;
    let (mut lo, mut hi) = buffer.price_extent()?;
    if let Some(p) = animated_price.filter(|p| p.is_finite()) {
        lo = lo.min(p);
        hi = hi.max(p);
    }

    let bounds = params.bounds_for(lo, hi);
    let margin = params.margin_fraction * 2.0 * bounds.half_span();

    Some(ScaleState {
        time: LinearScale::new(
            (first.timestamp as f64, last.timestamp as f64),
            viewport.x_range(),
        ),
        price: LinearScale::new((bounds.min, bounds.max), viewport.y_range()),
        bounds,
        margin,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(zoom: f64) -> ScaleParams {
        ScaleParams {
            zoom_precision: zoom,
            buffer_fraction: 0.3,
            margin_fraction: 0.05,
        }
    }

    fn buffer(samples: &[(i64, f64)]) -> SampleBuffer {
        let mut buf = SampleBuffer::new(40);
        for &(t, p) in samples {
            buf.push(Sample::new(t, p));
        }
        buf
    }

    #[test]
    fn test_linear_scale_apply_invert() {
        let s = LinearScale::new((0.0, 100.0), (10.0, 210.0));
        assert_eq!(s.apply(0.0), 10.0);
        assert_eq!(s.apply(50.0), 110.0);
        assert_eq!(s.invert(110.0), 50.0);
    }

    #[test]
    fn test_degenerate_domain_maps_to_midpoint() {
        let s = LinearScale::new((5.0, 5.0), (0.0, 100.0));
        assert!(s.is_degenerate());
        assert_eq!(s.apply(5.0), 50.0);
        assert_eq!(s.apply(1e9), 50.0);
    }

    #[test]
    fn test_none_below_two_samples() {
        let vp = Viewport::default();
        assert!(compute_scales(&buffer(&[]), None, &vp, &params(100.0)).is_none());
        assert!(compute_scales(&buffer(&[(1, 1.0)]), Some(1.0), &vp, &params(100.0)).is_none());
    }

    #[test]
    fn test_buffer_fraction_expands_range() {
        let vp = Viewport::default();
        let s = compute_scales(
            &buffer(&[(1000, 50000.0), (2000, 51000.0)]),
            None,
            &vp,
            &params(1.0),
        )
        .unwrap();
        assert!((s.bounds.min - 49850.0).abs() < 1e-9);
        assert!((s.bounds.max - 51150.0).abs() < 1e-9);
        assert!((s.margin - 65.0).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_precision_floor() {
        let vp = Viewport::default();
        let s = compute_scales(
            &buffer(&[(1000, 45000.0), (1200, 45100.0), (1400, 44950.0)]),
            None,
            &vp,
            &params(100.0),
        )
        .unwrap();
        assert_eq!(s.bounds.min, 44925.0);
        assert_eq!(s.bounds.max, 45125.0);
        assert_eq!(s.margin, 10.0);
    }

    #[test]
    fn test_animated_price_widens_extent() {
        let vp = Viewport::default();
        let buf = buffer(&[(1, 100.0), (2, 101.0)]);
        let s = compute_scales(&buf, Some(120.0), &vp, &params(0.5)).unwrap();
        assert!(s.bounds.max > 120.0);
        assert!(s.bounds.min < 100.0);
    }

    #[test]
    fn test_scales_are_monotonic() {
        let vp = Viewport::default();
        let s = compute_scales(
            &buffer(&[(1000, 45000.0), (5000, 45100.0)]),
            None,
            &vp,
            &params(10.0),
        )
        .unwrap();
        let xs: Vec<f64> = (1000..=5000).step_by(500).map(|t| s.x(t)).collect();
        assert!(xs.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(xs[0], 50.0);
        assert_eq!(*xs.last().unwrap(), 780.0);

        // Higher price, smaller y
        let ys: Vec<f64> = (0..10).map(|i| s.y(44950.0 + i as f64 * 20.0)).collect();
        assert!(ys.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn test_constrain_price_stays_inside_margin() {
        let vp = Viewport::default();
        let s = compute_scales(
            &buffer(&[(1000, 45000.0), (1200, 45100.0)]),
            None,
            &vp,
            &params(100.0),
        )
        .unwrap();
        let lo = s.bounds.min + s.margin;
        let hi = s.bounds.max - s.margin;
        for p in [-1e12, 0.0, 44000.0, 45050.0, 46000.0, 1e12, f64::INFINITY, f64::NEG_INFINITY] {
            let c = s.constrain_price(p);
            assert!(c >= lo && c <= hi, "{} -> {}", p, c);
        }
        assert_eq!(s.constrain_price(45050.0), 45050.0);
        assert_eq!(s.constrain_price(f64::NAN), s.bounds.mid());
    }

    #[test]
    fn test_extreme_prices_keep_scales_finite() {
        let vp = Viewport::default();
        let s = compute_scales(
            &buffer(&[(1000, 1.0), (1200, 1.7e308)]),
            None,
            &vp,
            &params(100.0),
        )
        .unwrap();
        assert!(s.bounds.min.is_finite() && s.bounds.max.is_finite());
        assert!(s.margin.is_finite() && s.margin > 0.0);
        assert!(s.bounds.mid().is_finite());

        let lo = s.bounds.min + s.margin;
        let hi = s.bounds.max - s.margin;
        for p in [1.0, 1.7e308, f64::MAX, f64::INFINITY, f64::NEG_INFINITY] {
            let c = s.constrain_price(p);
            assert!(c >= lo && c <= hi, "{} -> {}", p, c);
            assert!(s.y(c).is_finite());
        }
        assert!(s.y(1.7e308) < s.y(1.0));
    }

    #[test]
    fn test_constrain_price_with_nan_bounds_returns_mid() {
        let s = ScaleState {
            time: LinearScale::new((0.0, 1.0), (0.0, 1.0)),
            price: LinearScale::new((0.0, 1.0), (1.0, 0.0)),
            bounds: PriceBounds { min: 0.0, max: 10.0 },
            margin: f64::NAN,
        };
        assert_eq!(s.constrain_price(3.0), 5.0);
    }
}
