//! Delayed trailing "echo" path.
//!
//! On its own fixed interval the echo reseeds with the newest `size` samples
//! and reveals that snapshot over `draw_ms`. It is cosmetic and shares no
//! state with the segment reveal.

use serde::Serialize;

use crate::animation::easing::ease_out_cubic;
use crate::animation::Phase;
use crate::shared::Sample;

/// Read-only view handed to renderers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EchoState {
    /// Snapshot, oldest-first.
    pub path: Vec<Sample>,
    pub progress: f64,
    pub phase: Phase,
}

impl EchoState {
    /// Prefix of the snapshot visible at the current progress.
    pub fn visible(&self) -> &[Sample] {
        &self.path[..visible_count(self.path.len(), self.progress)]
    }
}

/// `max(2, ⌈len × progress⌉)` points, or none below two.
pub fn visible_count(len: usize, progress: f64) -> usize {
    if len < 2 {
        return 0;
    }
    let wanted = (len as f64 * progress.clamp(0.0, 1.0)).ceil() as usize;
    wanted.clamp(2, len)
}

#[derive(Debug, Clone)]
pub struct EchoAnimator {
    snapshot: Vec<Sample>,
    size: usize,
    progress: f64,
    phase: Phase,
    started_ms: f64,
    draw_ms: f64,
    reseeds: u64,
}

impl EchoAnimator {
    pub fn new(size: usize, draw_ms: u64) -> Self {
        Self {
            snapshot: Vec::with_capacity(size),
            size: size.max(2),
            progress: 0.0,
            phase: Phase::Idle,
            started_ms: 0.0,
            draw_ms: (draw_ms as f64).max(1.0),
            reseeds: 0,
        }
    }

    /// Number of samples the echo wants from the window tail.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Replace the snapshot with `tail` and restart the reveal.
    ///
    /// Returns `false` (and stays idle) when fewer than two samples exist.
    pub fn reseed(&mut self, tail: Vec<Sample>, now_ms: f64) -> bool {
        self.snapshot = tail;
        if self.snapshot.len() > self.size {
            let excess = self.snapshot.len() - self.size;
            self.snapshot.drain(..excess);
        }
        self.reseeds += 1;
        self.progress = 0.0;
        if self.snapshot.len() < 2 {
            self.phase = Phase::Idle;
            return false;
        }
        self.started_ms = now_ms;
        self.phase = Phase::Animating;
        true
    }

    /// Advance to `now_ms`. Returns `true` while another frame is needed.
    pub fn advance(&mut self, now_ms: f64) -> bool {
        if self.phase != Phase::Animating {
            return false;
        }
        let linear = ((now_ms - self.started_ms) / self.draw_ms).clamp(0.0, 1.0);
        self.progress = ease_out_cubic(linear).max(self.progress);
        if linear >= 1.0 {
            self.progress = 1.0;
            self.phase = Phase::Idle;
            return false;
        }
        true
    }

    pub fn cancel(&mut self) {
        self.phase = Phase::Idle;
    }

    pub fn reset(&mut self) {
        self.cancel();
        self.snapshot.clear();
        self.progress = 0.0;
    }

    pub fn state(&self) -> EchoState {
        EchoState {
            path: self.snapshot.clone(),
            progress: self.progress,
            phase: self.phase,
        }
    }

    pub fn snapshot(&self) -> &[Sample] {
        &self.snapshot
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn is_animating(&self) -> bool {
        self.phase == Phase::Animating
    }

    pub fn reseed_count(&self) -> u64 {
        self.reseeds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(n: usize) -> Vec<Sample> {
        (0..n).map(|i| Sample::new(i as i64 * 200, 100.0 + i as f64)).collect()
    }

    #[test]
    fn test_visible_count() {
        assert_eq!(visible_count(0, 0.5), 0);
        assert_eq!(visible_count(1, 1.0), 0);
        assert_eq!(visible_count(10, 0.0), 2);
        assert_eq!(visible_count(10, 0.05), 2);
        assert_eq!(visible_count(10, 0.41), 5);
        assert_eq!(visible_count(10, 1.0), 10);
    }

    #[test]
    fn test_reseed_keeps_newest() {
        let mut echo = EchoAnimator::new(10, 1000);
        assert!(echo.reseed(samples(15), 0.0));
        assert_eq!(echo.snapshot().len(), 10);
        assert_eq!(echo.snapshot()[0].timestamp, 5 * 200);
        assert!(echo.is_animating());
    }

    #[test]
    fn test_reseed_needs_two_samples() {
        let mut echo = EchoAnimator::new(10, 1000);
        assert!(!echo.reseed(samples(1), 0.0));
        assert!(!echo.is_animating());
        assert!(echo.state().visible().is_empty());
    }

    #[test]
    fn test_reveal_runs_to_completion() {
        let mut echo = EchoAnimator::new(10, 1000);
        echo.reseed(samples(10), 0.0);
        assert!(echo.advance(500.0));
        let mid = echo.state();
        assert!(mid.progress > 0.5 && mid.progress < 1.0);
        assert!(mid.visible().len() >= 2 && mid.visible().len() < 10);
        assert!(!echo.advance(1000.0));
        assert_eq!(echo.state().visible().len(), 10);
    }

    #[test]
    fn test_always_reseeds_on_interval() {
        let mut echo = EchoAnimator::new(10, 1000);
        let data = samples(10);
        echo.reseed(data.clone(), 0.0);
        echo.advance(1000.0);
        // Same data again still restarts the reveal
        assert!(echo.reseed(data, 1000.0));
        assert_eq!(echo.progress(), 0.0);
        assert_eq!(echo.reseed_count(), 2);
    }
}
