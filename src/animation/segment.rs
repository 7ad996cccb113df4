//! New-segment reveal.
//!
//! Each append after the first captures `(previous, latest)` and eases
//! `progress` from 0 to 1. A later append restarts the reveal against the
//! then-current last two samples; reveals are never stacked.

use crate::animation::easing::{CubicBezier, REVEAL};
use crate::animation::Phase;
use crate::shared::Sample;

#[derive(Debug, Clone)]
pub struct SegmentAnimator {
    endpoints: Option<(Sample, Sample)>,
    progress: f64,
    phase: Phase,
    started_ms: f64,
    duration_ms: f64,
    easing: CubicBezier,
    reveals: u64,
}

impl SegmentAnimator {
    pub fn new(duration_ms: u64) -> Self {
        Self {
            endpoints: None,
            progress: 1.0,
            phase: Phase::Idle,
            started_ms: 0.0,
            duration_ms: (duration_ms as f64).max(1.0),
            easing: REVEAL,
            reveals: 0,
        }
    }

    pub fn with_easing(mut self, easing: CubicBezier) -> Self {
        self.easing = easing;
        self
    }

    /// Begin revealing the segment `previous → latest`.
    pub fn start(&mut self, previous: Sample, latest: Sample, now_ms: f64) {
        if self.phase == Phase::Animating {
            tracing::debug!(
                "Segment reveal superseded at progress {:.3}",
                self.progress
            );
        }
        self.endpoints = Some((previous, latest));
        self.progress = 0.0;
        self.started_ms = now_ms;
        self.phase = Phase::Animating;
        self.reveals += 1;
    }

    /// Advance to `now_ms`. Returns `true` while another frame is needed.
    pub fn advance(&mut self, now_ms: f64) -> bool {
        if self.phase != Phase::Animating {
            return false;
        }
        let linear = ((now_ms - self.started_ms) / self.duration_ms).clamp(0.0, 1.0);
        // Monotonic even if the host clock stutters backwards.
        self.progress = self.easing.ease(linear).max(self.progress);
        if linear >= 1.0 {
            self.progress = 1.0;
            self.phase = Phase::Idle;
            return false;
        }
        true
    }

    /// Stop where it is; the segment is then drawn in full.
    pub fn cancel(&mut self) {
        self.phase = Phase::Idle;
        self.progress = 1.0;
    }

    pub fn reset(&mut self) {
        self.cancel();
        self.endpoints = None;
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn is_animating(&self) -> bool {
        self.phase == Phase::Animating
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn endpoints(&self) -> Option<(Sample, Sample)> {
        self.endpoints
    }

    /// Reveals started since construction.
    pub fn reveals_started(&self) -> u64 {
        self.reveals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_starts_at_zero_and_reaches_one() {
        let mut seg = SegmentAnimator::new(1000);
        seg.start(Sample::new(0, 1.0), Sample::new(200, 2.0), 0.0);
        assert_eq!(seg.progress(), 0.0);

        let mut prev = 0.0;
        let mut now = 0.0;
        while seg.advance(now) {
            let p = seg.progress();
            assert!((0.0..=1.0).contains(&p));
            assert!(p >= prev);
            prev = p;
            now += 7.0;
        }
        assert_eq!(seg.progress(), 1.0);
        assert!(!seg.is_animating());
    }

    #[test]
    fn test_restart_supersedes_in_flight() {
        let mut seg = SegmentAnimator::new(1000);
        seg.start(Sample::new(0, 1.0), Sample::new(200, 2.0), 0.0);
        seg.advance(500.0);
        assert!(seg.progress() > 0.5);

        seg.start(Sample::new(200, 2.0), Sample::new(400, 3.0), 500.0);
        assert_eq!(seg.progress(), 0.0);
        assert_eq!(seg.endpoints().unwrap().1, Sample::new(400, 3.0));
        assert_eq!(seg.reveals_started(), 2);
    }

    #[test]
    fn test_clock_going_backwards_never_regresses() {
        let mut seg = SegmentAnimator::new(1000);
        seg.start(Sample::new(0, 1.0), Sample::new(200, 2.0), 100.0);
        seg.advance(600.0);
        let p = seg.progress();
        seg.advance(300.0);
        assert_eq!(seg.progress(), p);
        seg.advance(50.0);
        assert_eq!(seg.progress(), p);
    }

    #[test]
    fn test_cancel_shows_full_segment() {
        let mut seg = SegmentAnimator::new(1000);
        seg.start(Sample::new(0, 1.0), Sample::new(200, 2.0), 0.0);
        seg.cancel();
        assert!(!seg.is_animating());
        assert_eq!(seg.progress(), 1.0);
        assert!(!seg.advance(10.0));
    }
}
