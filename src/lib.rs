//! A lock-free, fixed-block slab allocator.
//!
//! [`Slab<T>`] hands out stable `NonNull<T>` pointers backed by fixed-size
//! blocks drawn from append-only "puddles". Freed blocks are tracked by a
//! Treiber-style lock-free free list whose head carries a generation-tagged
//! handle rather than a raw pointer, so the classic ABA hazard of a plain
//! pointer-based free list is closed without a hazard-pointer scheme.
//!
//! ```
//! use puddle::Slab;
//!
//! let slab: Slab<u64> = Slab::new().unwrap();
//! let ptr = slab.create(42);
//! assert_eq!(unsafe { *ptr.as_ref() }, 42);
//! unsafe { slab.destroy(ptr) };
//! ```
//!
//! Construction is the only fallible operation ([`SlabError`]); everything
//! after that either succeeds or indicates a programmer bug (capacity
//! exhaustion, a foreign or already-destroyed pointer) and is reported by
//! panicking rather than by a `Result`, since by definition the caller
//! cannot recover a block it no longer has a valid handle to.

mod config;
mod error;
mod freelist;
mod slab;
mod stats;
mod storage;
mod utils;

pub use config::SlabConfig;
pub use error::SlabError;
pub use slab::{Slab, SlabBox};
pub use stats::SlabStats;

/// Thin wrappers around `tracing` macros that compile to nothing when the
/// default-on `logging` feature is disabled, so call sites never need their
/// own `#[cfg(feature = "logging")]`.
#[cfg(feature = "logging")]
macro_rules! trace_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) };
}
#[cfg(not(feature = "logging"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "logging")]
macro_rules! trace_error {
    ($($arg:tt)*) => { tracing::error!($($arg)*) };
}
#[cfg(not(feature = "logging"))]
macro_rules! trace_error {
    ($($arg:tt)*) => {};
}

pub(crate) use trace_debug;
pub(crate) use trace_error;
