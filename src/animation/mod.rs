//! Frame-driven animations.
//!
//! Every animator is an explicit state object advanced with the current
//! frame time; none of them capture the data they animate toward. The
//! [`frame::FrameScheduler`] stands in for the host "next frame" callback and
//! allows at most one outstanding request per animator.

pub mod animator;
pub mod easing;
pub mod echo;
pub mod frame;
pub mod price;
pub mod segment;

pub use animator::{Animator, Spring, Tween};
pub use echo::{EchoAnimator, EchoState};
pub use frame::{FrameId, FrameScheduler, FrameTarget};
pub use price::{PriceAnimator, PricePhase, PriceSettled};
pub use segment::SegmentAnimator;

/// Whether an animator is advancing or holding still.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Idle,
    Animating,
}
