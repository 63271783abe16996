//! The tagged-handle lock-free free list.
//!
//! Grounded on the teacher crate's `PoolAllocator` free-list CAS loop
//! (`allocator/pool/allocator.rs`, `push_free`/`pop_free`), generalized from
//! a raw `AtomicPtr<FreeBlock>` head to an `AtomicU32` head holding a
//! [`Handle`], so the head can carry a generation tag instead of relying on
//! pointer bit-stealing for ABA protection.

use core::sync::atomic::{AtomicU16, AtomicU32, Ordering};

use crate::storage::{BlockHeader, BlockState, Handle, Puddles};
use crate::utils::Backoff;

/// `head` is the free list; `generation` is a per-slab counter stamped onto
/// a block's handle every time that block is pushed, so two different
/// logical pushes of the same physical block never compare equal.
pub(crate) struct FreeList {
    head: AtomicU32,
    generation: AtomicU16,
}

impl FreeList {
    pub(crate) fn new() -> Self {
        Self {
            head: AtomicU32::new(Handle::SENTINEL.bits()),
            generation: AtomicU16::new(0),
        }
    }

    /// Pops the head of the free list, returning its handle, or `None` if
    /// the list was empty. `header_of` resolves a handle's low 16 bits to
    /// its block header.
    pub(crate) fn pop(&self, puddles: &Puddles, stride: usize) -> Option<Handle> {
        let mut backoff = Backoff::new();
        let mut head = Handle::from_bits(self.head.load(Ordering::Acquire));
        loop {
            if head.is_sentinel() {
                return None;
            }

            // SAFETY: `head` came from the free list, so its puddle has been
            // published and its block has been initialized. We only read
            // `next` here; nothing is mutated until after the CAS succeeds.
            let header_ptr = puddles.block_ptr(head, stride) as *mut BlockHeader;
            let next = unsafe { Handle::from_bits((*header_ptr).next) };

            match self.head.compare_exchange_weak(
                head.bits(),
                next.bits(),
                Ordering::Acquire,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    // SAFETY: the CAS succeeding makes this the block's
                    // exclusive owner; `state` is an AtomicU8 so this store
                    // is race-free even against the debug-only readers.
                    unsafe { (*header_ptr).state.store(BlockState::Used as u8, Ordering::Relaxed) };
                    return Some(head);
                }
                Err(observed) => {
                    head = Handle::from_bits(observed);
                    backoff.spin();
                }
            }
        }
    }

    /// Pushes `handle`'s block back onto the free list, stamping a fresh
    /// generation onto its identity first.
    pub(crate) fn push(&self, handle: Handle, puddles: &Puddles, stride: usize) {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        let handle = handle.with_generation(generation);

        let header_ptr = puddles.block_ptr(handle, stride) as *mut BlockHeader;
        // SAFETY: the caller holds the only live reference to this block
        // (it is either being destroyed or was just carved out of a fresh
        // puddle), so writing its header is race-free until the CAS below
        // publishes it.
        unsafe { (*header_ptr).state.store(BlockState::Free as u8, Ordering::Relaxed) };

        let mut backoff = Backoff::new();
        let mut head = self.head.load(Ordering::Relaxed);
        loop {
            // SAFETY: this raw write is synchronized by the Release half of
            // the CAS below, matching the teacher's `(*block).next = head`.
            unsafe {
                (*header_ptr).next = head;
                (*header_ptr).self_handle = handle.bits();
            }

            match self.head.compare_exchange_weak(
                head,
                handle.bits(),
                Ordering::Release,
                Ordering::Relaxed,
            ) {
                Ok(_) => return,
                Err(observed) => {
                    head = observed;
                    backoff.spin();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::layout_for;
    use std::alloc::{alloc_zeroed, Layout as AllocLayout};

    fn make_puddle(stride: usize) -> (Puddles, *mut u8) {
        let puddles = Puddles::new();
        let layout = AllocLayout::from_size_align(stride * 256, 16).unwrap();
        let buf = unsafe { alloc_zeroed(layout) };
        puddles.publish(0, buf);
        (puddles, buf)
    }

    #[test]
    fn push_then_pop_round_trips() {
        struct Payload(u64);
        let layout = layout_for::<Payload>().unwrap();
        let (puddles, _buf) = make_puddle(layout.stride);
        let list = FreeList::new();

        list.push(Handle::new(3, 0, 0), &puddles, layout.stride);
        let popped = list.pop(&puddles, layout.stride).unwrap();
        assert_eq!(popped.element_index(), 3);
        assert_eq!(popped.puddle_index(), 0);
        assert!(list.pop(&puddles, layout.stride).is_none());
    }

    #[test]
    fn pop_on_empty_list_returns_none() {
        struct Payload(u64);
        let layout = layout_for::<Payload>().unwrap();
        let (puddles, _buf) = make_puddle(layout.stride);
        let list = FreeList::new();
        assert!(list.pop(&puddles, layout.stride).is_none());
    }

    #[test]
    fn repeated_push_pop_bumps_generation() {
        struct Payload(u64);
        let layout = layout_for::<Payload>().unwrap();
        let (puddles, _buf) = make_puddle(layout.stride);
        let list = FreeList::new();

        list.push(Handle::new(1, 0, 0), &puddles, layout.stride);
        let first = list.pop(&puddles, layout.stride).unwrap();
        list.push(first, &puddles, layout.stride);
        let second = list.pop(&puddles, layout.stride).unwrap();

        assert_eq!(first.element_index(), second.element_index());
        assert_ne!(first.generation(), second.generation());
    }
}
