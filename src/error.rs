//! The allocator's single recoverable failure mode.
//!
//! Everything else (capacity exhaustion, a foreign pointer handed to
//! `destroy`, a double destroy) is a programmer bug detected mid-operation,
//! after blocks are already live, and is handled with `panic!` at the point
//! of detection rather than a `Result`, since there is no value to hand
//! back to a caller whose handle was never valid to begin with.

/// Why a [`crate::Slab`] could not be constructed for a given `T`.
///
/// This is determined entirely from `size_of::<T>()` and `align_of::<T>()`,
/// so it is always known before the first `create` call — never mid-operation.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlabError {
    /// `T` is a zero-sized type. The block stride would be exactly
    /// `sizeof(header)` (16 bytes), violating the invariant that the stride
    /// be at least twice the header size.
    #[error(
        "Slab<T> does not support zero-sized types (stride would be {stride} bytes, minimum is {min})"
    )]
    ZeroSizedType {
        /// The stride that would have resulted.
        stride: usize,
        /// The minimum permitted stride (`2 * sizeof(header)`).
        min: usize,
    },

    /// `size_of::<T>()` is large enough that computing the rounded-up
    /// stride or the per-puddle byte count overflows `usize`.
    #[error("stride computation overflowed for a type of size {size} bytes (align {align})")]
    StrideOverflow {
        /// `size_of::<T>()`.
        size: usize,
        /// The alignment the stride was being rounded to.
        align: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sized_message_mentions_stride() {
        let err = SlabError::ZeroSizedType { stride: 16, min: 32 };
        let msg = err.to_string();
        assert!(msg.contains("16"));
        assert!(msg.contains("32"));
    }
}
