use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic count of samples dropped because the ring buffer was full.
///
/// Incremented only by the producer, read at session end.
#[derive(Debug, Default)]
pub struct OverrunCounter {
    dropped: AtomicU64,
}

impl OverrunCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for `samples` dropped samples. Lock-free; safe on the realtime thread.
    #[inline]
    pub fn record(&self, samples: u64) {
        if samples > 0 {
            self.dropped.fetch_add(samples, Ordering::Relaxed);
        }
    }

    pub fn total(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
