//! Host frame-callback model.
//!
//! Animators call [`FrameScheduler::request`] to be woken on the next frame.
//! Each target holds at most one outstanding request; requesting again
//! replaces it. The host drains due targets once per frame with
//! [`FrameScheduler::take_due`].

use serde::Serialize;

/// Which animator a frame request wakes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameTarget {
    Price,
    Segment,
    Echo,
}

impl FrameTarget {
    pub const ALL: [FrameTarget; 3] = [FrameTarget::Price, FrameTarget::Segment, FrameTarget::Echo];

    fn slot(self) -> usize {
        match self {
            FrameTarget::Price => 0,
            FrameTarget::Segment => 1,
            FrameTarget::Echo => 2,
        }
    }
}

/// Handle of one frame request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(u64);

#[derive(Debug, Default)]
pub struct FrameScheduler {
    next_id: u64,
    slots: [Option<FrameId>; 3],
    cancelled: u64,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for a callback on the next frame, superseding any pending one.
    pub fn request(&mut self, target: FrameTarget) -> FrameId {
        self.next_id += 1;
        let id = FrameId(self.next_id);
        self.slots[target.slot()] = Some(id);
        id
    }

    /// Cancel the pending request for `target`. Returns whether one existed.
    pub fn cancel(&mut self, target: FrameTarget) -> bool {
        let existed = self.slots[target.slot()].take().is_some();
        if existed {
            self.cancelled += 1;
        }
        existed
    }

    /// Cancel every pending request. Returns how many were cancelled.
    pub fn cancel_all(&mut self) -> usize {
        FrameTarget::ALL
            .iter()
            .filter(|t| self.cancel(**t))
            .count()
    }

    pub fn is_pending(&self, target: FrameTarget) -> bool {
        self.slots[target.slot()].is_some()
    }

    pub fn pending_id(&self, target: FrameTarget) -> Option<FrameId> {
        self.slots[target.slot()]
    }

    pub fn has_pending(&self) -> bool {
        self.slots.iter().any(Option::is_some)
    }

    pub fn pending_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Total requests cancelled over the scheduler's lifetime.
    pub fn cancelled(&self) -> u64 {
        self.cancelled
    }

    /// Drain the requests due this frame, in request order.
    ///
    /// Requests made while handling them belong to the next frame.
    pub fn take_due(&mut self) -> Vec<FrameTarget> {
        let mut due: Vec<(FrameId, FrameTarget)> = FrameTarget::ALL
            .iter()
            .filter_map(|t| self.slots[t.slot()].take().map(|id| (id, *t)))
            .collect();
        due.sort_by_key(|(id, _)| *id);
        due.into_iter().map(|(_, t)| t).collect()
    }
}
