use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Marks the end of one preview's lifetime.
///
/// The controller owns the original and wake tasks carry clones. Once the
/// preview is closed every clone reports it, so a wake that outlives its
/// preview can bail out before touching controller state.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the flag. Returns `true` only for the call that closed the
    /// preview; repeated closes return `false`.
    pub fn cancel(&self) -> bool {
        !self.cancelled.swap(true, Ordering::AcqRel)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
