//! Atomic counters and the snapshot type exposed to callers.
//!
//! Grounded on the teacher crate's `PoolStats`/`AllocatorStats` split
//! (`allocator/pool/stats.rs`): a `Counters` struct of raw atomics owned by
//! the allocator, snapshotted into a plain `Copy` struct on demand.

use core::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time view of a [`crate::Slab`]'s activity.
///
/// Zeroed throughout if [`crate::SlabConfig::track_stats`] is off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlabStats {
    /// Total successful `create` calls over the slab's lifetime.
    pub total_creates: u64,
    /// Total `destroy` calls over the slab's lifetime.
    pub total_destroys: u64,
    /// Blocks currently handed out (`total_creates - total_destroys`).
    pub live_blocks: u64,
    /// Puddles allocated so far.
    pub puddle_count: usize,
    /// `puddle_count * 256`, the capacity reached without a further grow.
    pub capacity: usize,
}

#[derive(Default)]
pub(crate) struct Counters {
    total_creates: AtomicU64,
    total_destroys: AtomicU64,
}

impl Counters {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn record_create(&self) {
        self.total_creates.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_destroy(&self) {
        self.total_destroys.fetch_add(1, Ordering::Relaxed);
    }

    /// Combines the create/destroy counters with a puddle count obtained
    /// separately (the allocator's own `puddle_count` atomic), since that
    /// count is structural state, not purely a statistic.
    pub(crate) fn snapshot(&self, puddle_count: usize) -> SlabStats {
        let total_creates = self.total_creates.load(Ordering::Relaxed);
        let total_destroys = self.total_destroys.load(Ordering::Relaxed);
        SlabStats {
            total_creates,
            total_destroys,
            live_blocks: total_creates.saturating_sub(total_destroys),
            puddle_count,
            capacity: puddle_count * crate::storage::BLOCKS_PER_PUDDLE,
        }
    }
}
