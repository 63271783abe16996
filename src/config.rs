//! Construction-time behavior presets.
//!
//! Grounded on the teacher crate's `PoolConfig` (`allocator/pool/config.rs`):
//! the same four-preset shape (`default`, `production`, `debug`,
//! `performance`), narrowed to the knobs this allocator actually has.

/// Tunable behavior for a [`crate::Slab`], fixed for its whole lifetime.
///
/// `Slab::new()` uses [`SlabConfig::default`]; `Slab::with_config` takes any
/// of these explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlabConfig {
    /// Maintain the atomic counters exposed by [`crate::SlabStats`].
    pub track_stats: bool,
    /// Stamp freed memory with `0xAA` before it re-enters the free list, to
    /// make use-after-free of stale data visible in a debugger.
    pub poison_on_push: bool,
    /// Stamp a block with `0xBB` the instant it is handed out by `create`,
    /// so an uninitialized read shows a recognizable pattern rather than
    /// whatever was poisoned in by `poison_on_push`.
    pub poison_on_pop: bool,
    /// Debug-assert that every block's recorded [`crate::storage::BlockState`]
    /// matches the transition being performed.
    pub validate_state: bool,
    /// On `destroy`, scan the puddle address ranges to confirm the pointer
    /// actually came from this `Slab` before trusting it.
    pub validate_destroy_ownership: bool,
}

impl SlabConfig {
    /// `debug()` under `cfg!(debug_assertions)`, `performance()` otherwise —
    /// mirrors the teacher's `PoolConfig::default()`.
    pub fn default_for_build() -> Self {
        if cfg!(debug_assertions) {
            Self::debug()
        } else {
            Self::performance()
        }
    }

    /// Every safety net on. Intended for development and CI.
    pub fn debug() -> Self {
        Self {
            track_stats: true,
            poison_on_push: true,
            poison_on_pop: true,
            validate_state: true,
            validate_destroy_ownership: true,
        }
    }

    /// Every safety net off, same as [`SlabConfig::performance`]. Kept as a
    /// distinct preset name so call sites can name the environment they mean
    /// (a production service vs. an explicitly performance-tuned hot path)
    /// without the two diverging in behavior, mirroring the teacher crate's
    /// own `PoolConfig::production`, which likewise drops `track_stats`.
    pub fn production() -> Self {
        Self {
            track_stats: false,
            poison_on_push: false,
            poison_on_pop: false,
            validate_state: false,
            validate_destroy_ownership: false,
        }
    }

    /// Everything off. No atomics beyond the free list itself, no poisoning,
    /// no validation.
    pub fn performance() -> Self {
        Self {
            track_stats: false,
            poison_on_push: false,
            poison_on_pop: false,
            validate_state: false,
            validate_destroy_ownership: false,
        }
    }
}

impl Default for SlabConfig {
    fn default() -> Self {
        Self::default_for_build()
    }
}
