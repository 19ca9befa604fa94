//! Frame pacing
//!
//! The host owns the real animation-frame clock. The scheduler only tracks
//! whether a frame has been requested, so bursts of resize or recovery
//! requests collapse into one callback.

/// Identifies one requested frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

#[derive(Debug, Default)]
pub struct FrameScheduler {
    next_id: u64,
    pending: Option<FrameHandle>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a frame; None when one is already pending
    pub fn request(&mut self) -> Option<FrameHandle> {
        if self.pending.is_some() {
            return None;
        }
        self.next_id += 1;
        let handle = FrameHandle(self.next_id);
        self.pending = Some(handle);
        Some(handle)
    }

    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    /// Consume the pending frame, if any
    pub fn fire(&mut self) -> Option<FrameHandle> {
        self.pending.take()
    }

    /// Drop the pending frame so its callback does nothing
    pub fn cancel(&mut self) -> Option<FrameHandle> {
        self.pending.take()
    }
}
