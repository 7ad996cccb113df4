//! Scalar motion: one interface, a fixed-duration tween and a critically
//! damped spring behind it.

use crate::animation::easing::ease_out_cubic;
use crate::config::AnimatorKind;

/// A scalar moving toward a target, advanced by elapsed frame time.
pub trait Animator: std::fmt::Debug + Send + Sync {
    /// Start a new motion from `from` toward `to`.
    fn retarget(&mut self, from: f64, to: f64);

    /// Jump to `value` and hold there.
    fn snap(&mut self, value: f64);

    /// Advance by `dt_ms`; returns the new value and whether the motion is done.
    fn step(&mut self, dt_ms: f64) -> (f64, bool);

    fn value(&self) -> f64;

    fn target(&self) -> f64;
}

/// Build the configured motion, settling within `epsilon`.
pub fn from_kind(kind: AnimatorKind, epsilon: f64) -> Box<dyn Animator> {
    match kind {
        AnimatorKind::Tween { duration_ms } => Box::new(Tween::new(duration_ms as f64)),
        AnimatorKind::Spring { stiffness } => Box::new(Spring::new(stiffness, epsilon)),
    }
}

// ─── Tween ───────────────────────────────────────────────────────────────────

/// Fixed-duration cubic ease-out.
#[derive(Debug, Clone)]
pub struct Tween {
    from: f64,
    to: f64,
    elapsed_ms: f64,
    duration_ms: f64,
    value: f64,
}

impl Tween {
    pub fn new(duration_ms: f64) -> Self {
        Self {
            from: 0.0,
            to: 0.0,
            elapsed_ms: 0.0,
            duration_ms: duration_ms.max(1.0),
            value: 0.0,
        }
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }
}

impl Animator for Tween {
    fn retarget(&mut self, from: f64, to: f64) {
        self.from = from;
        self.to = to;
        self.value = from;
        self.elapsed_ms = 0.0;
    }

    fn snap(&mut self, value: f64) {
        self.from = value;
        self.to = value;
        self.value = value;
        self.elapsed_ms = self.duration_ms;
    }

    fn step(&mut self, dt_ms: f64) -> (f64, bool) {
        self.elapsed_ms = (self.elapsed_ms + dt_ms.max(0.0)).min(self.duration_ms);
        let progress = self.elapsed_ms / self.duration_ms;
        if progress >= 1.0 {
            self.value = self.to;
            return (self.to, true);
        }
        self.value = self.from + (self.to - self.from) * ease_out_cubic(progress);
        (self.value, false)
    }

    fn value(&self) -> f64 {
        self.value
    }

    fn target(&self) -> f64 {
        self.to
    }
}

// ─── Spring ──────────────────────────────────────────────────────────────────

/// Critically damped spring, integrated in closed form.
///
/// With displacement `d = value - target` and `ω = √stiffness`:
/// `d(t) = (d₀ + (v₀ + ω·d₀)·t)·e^(−ωt)`. Started from rest it approaches
/// the target monotonically and never overshoots.
#[derive(Debug, Clone)]
pub struct Spring {
    omega: f64,
    epsilon: f64,
    target: f64,
    displacement: f64,
    velocity: f64,
}

impl Spring {
    /// `stiffness` in 1/s²; `epsilon` is the settle tolerance in value units.
    pub fn new(stiffness: f64, epsilon: f64) -> Self {
        Self {
            omega: stiffness.max(f64::MIN_POSITIVE).sqrt(),
            epsilon: epsilon.abs().max(f64::MIN_POSITIVE),
            target: 0.0,
            displacement: 0.0,
            velocity: 0.0,
        }
    }

    /// Current velocity in value units per second.
    pub fn velocity(&self) -> f64 {
        self.velocity
    }
}

impl Animator for Spring {
    fn retarget(&mut self, from: f64, to: f64) {
        let d0 = from - to;
        // Keep momentum only toward the target and no faster than ω·|d₀|:
        // beyond that the closed form crosses zero.
        let v0 = if self.velocity * d0 < 0.0 {
            self.velocity.signum() * self.velocity.abs().min(self.omega * d0.abs())
        } else {
            0.0
        };
        self.target = to;
        self.displacement = d0;
        self.velocity = v0;
    }

    fn snap(&mut self, value: f64) {
        self.target = value;
        self.displacement = 0.0;
        self.velocity = 0.0;
    }

    fn step(&mut self, dt_ms: f64) -> (f64, bool) {
        let t = dt_ms.max(0.0) / 1000.0;
        let w = self.omega;
        let (d0, v0) = (self.displacement, self.velocity);
        let decay = (-w * t).exp();
        let c = v0 + w * d0;

        self.displacement = (d0 + c * t) * decay;
        self.velocity = (v0 - w * c * t) * decay;

        let done = self.displacement.abs() <= self.epsilon
            && self.velocity.abs() <= self.epsilon * w;
        if done {
            self.displacement = 0.0;
            self.velocity = 0.0;
        }
        (self.target + self.displacement, done)
    }

    fn value(&self) -> f64 {
        self.target + self.displacement
    }

    fn target(&self) -> f64 {
        self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(anim: &mut dyn Animator, dt: f64, max_frames: usize) -> Vec<f64> {
        let mut values = Vec::new();
        for _ in 0..max_frames {
            let (v, done) = anim.step(dt);
            values.push(v);
            if done {
                break;
            }
        }
        values
    }

    #[test]
    fn test_tween_reaches_target_exactly() {
        let mut t = Tween::new(1200.0);
        t.retarget(50000.0, 50100.0);
        let values = run(&mut t, 16.0, 1000);
        assert_eq!(*values.last().unwrap(), 50100.0);
        assert_eq!(values.len(), 75);
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_tween_midpoint_is_eased() {
        let mut t = Tween::new(1000.0);
        t.retarget(0.0, 100.0);
        let (v, done) = t.step(500.0);
        assert!(!done);
        assert_eq!(v, 87.5);
    }

    #[test]
    fn test_tween_large_dt_finishes() {
        let mut t = Tween::new(1000.0);
        t.retarget(10.0, 20.0);
        assert_eq!(t.step(1e9), (20.0, true));
    }

    #[test]
    fn test_spring_converges_without_overshoot() {
        let mut s = Spring::new(170.0, 1e-6);
        s.retarget(50000.0, 50100.0);
        let values = run(&mut s, 16.0, 10_000);
        assert_eq!(*values.last().unwrap(), 50100.0);
        assert!(values.windows(2).all(|w| w[0] <= w[1] + 1e-9));
        assert!(values.iter().all(|v| *v <= 50100.0 + 1.0));
    }

    #[test]
    fn test_spring_retarget_mid_flight_stays_monotonic() {
        let mut s = Spring::new(170.0, 1e-6);
        s.retarget(0.0, 100.0);
        for _ in 0..5 {
            s.step(16.0);
        }
        let here = s.value();
        // New target barely ahead: momentum must be clamped.
        s.retarget(here, here + 1.0);
        let values = run(&mut s, 16.0, 10_000);
        assert!(values.iter().all(|v| *v <= here + 1.0 + 1e-9));
        assert_eq!(*values.last().unwrap(), here + 1.0);
    }

    #[test]
    fn test_snap_holds() {
        let mut s = Spring::new(100.0, 1e-6);
        s.snap(42.0);
        assert_eq!(s.step(16.0), (42.0, true));
        let mut t = Tween::new(100.0);
        t.snap(7.0);
        assert_eq!(t.step(16.0), (7.0, true));
    }

    #[test]
    fn test_from_kind() {
        let mut a = from_kind(AnimatorKind::Tween { duration_ms: 10 }, 1e-6);
        a.retarget(0.0, 1.0);
        assert_eq!(a.step(10.0), (1.0, true));
        let b = from_kind(AnimatorKind::Spring { stiffness: 100.0 }, 1e-6);
        assert_eq!(b.value(), 0.0);
    }
}
