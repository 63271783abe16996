//! `Slab<T>`: the public allocator type, and its RAII handle `SlabBox`.

use core::marker::PhantomData;
use core::mem::size_of;
use core::ops::{Deref, DerefMut};
use core::ptr::NonNull;
use core::sync::atomic::{AtomicUsize, Ordering};

use crate::config::SlabConfig;
use crate::error::SlabError;
use crate::freelist::FreeList;
use crate::stats::{Counters, SlabStats};
use crate::storage::{self, layout_for, BlockHeader, BlockState, Handle, Layout, Puddles, HEADER_SIZE, MAX_CAPACITY, MAX_PUDDLES};

/// A lock-free, fixed-block allocator for a single type `T`.
///
/// Blocks are carved out of append-only "puddles" allocated 256 at a time as
/// demand requires; a puddle, once allocated, is never moved or freed until
/// the whole `Slab` is dropped, so a `NonNull<T>` handed out by `create`
/// stays valid until the matching `destroy`.
///
/// `Slab<T>` is `Send + Sync` for `T: Send`: values may be created on one
/// thread and destroyed on another.
pub struct Slab<T> {
    config: SlabConfig,
    free_list: FreeList,
    puddles: Puddles,
    /// Reservation counter: the next puddle index to hand out to a grower.
    next_puddle: AtomicUsize,
    /// Published count: how many puddles have finished initializing and are
    /// safe to scan (for destroy-ownership validation, `Drop`, and stats).
    puddle_count: AtomicUsize,
    layout: Layout,
    counters: Counters,
    _marker: PhantomData<T>,
}

impl<T> Slab<T> {
    /// Builds a `Slab` with [`SlabConfig::default`].
    pub fn new() -> Result<Self, SlabError> {
        Self::with_config(SlabConfig::default())
    }

    /// Builds a `Slab` with an explicit configuration.
    ///
    /// Fails only if `T` cannot be stored at all — a zero-sized type, or one
    /// large/aligned enough that stride computation would overflow.
    pub fn with_config(config: SlabConfig) -> Result<Self, SlabError> {
        let layout = layout_for::<T>()?;
        Ok(Self {
            config,
            free_list: FreeList::new(),
            puddles: Puddles::new(),
            next_puddle: AtomicUsize::new(0),
            puddle_count: AtomicUsize::new(0),
            layout,
            counters: Counters::new(),
            _marker: PhantomData,
        })
    }

    /// Moves `value` into a freshly carved block and returns a stable
    /// pointer to it. Growing the slab (allocating a new puddle) happens
    /// transparently and only when the free list is empty.
    ///
    /// # Panics
    ///
    /// Panics if the slab has already grown to `MAX_PUDDLES` puddles
    /// (65536 live blocks) and all of them are exhausted. This is a
    /// capacity-planning bug, not a recoverable error.
    pub fn create(&self, value: T) -> NonNull<T> {
        loop {
            if let Some(handle) = self.free_list.pop(&self.puddles, self.layout.stride) {
                let block = self.puddles.block_ptr(handle, self.layout.stride);
                // SAFETY: `block` is HEADER_SIZE-aligned and at least
                // HEADER_SIZE + size_of::<T>() bytes, per `layout_for`.
                let payload = unsafe { block.add(HEADER_SIZE) } as *mut T;

                if self.config.validate_state {
                    let header = block as *const BlockHeader;
                    let state = unsafe { (*header).state() };
                    debug_assert_eq!(state, BlockState::Used, "freelist handed out a non-Used block");
                }

                if self.config.poison_on_pop && size_of::<T>() > 0 {
                    // SAFETY: payload is valid for size_of::<T>() bytes and
                    // not yet read as a `T` (it is written below).
                    unsafe { core::ptr::write_bytes(payload as *mut u8, 0xBB, size_of::<T>()) };
                }

                // SAFETY: payload is a fresh, properly aligned T-sized slot.
                unsafe { payload.write(value) };

                if self.config.track_stats {
                    self.counters.record_create();
                }

                // SAFETY: payload came from `block.add(..)` on a non-null base.
                return unsafe { NonNull::new_unchecked(payload) };
            }

            if !self.grow_one() {
                crate::trace_error!(max_capacity = MAX_CAPACITY, "slab capacity exhausted");
                panic!("Slab<T>::create: capacity exhausted at {MAX_CAPACITY} blocks");
            }
        }
    }

    /// Like [`Slab::create`], but returns an RAII [`SlabBox`] that calls
    /// `destroy` automatically when dropped.
    pub fn create_boxed(&self, value: T) -> SlabBox<'_, T> {
        SlabBox { slab: self, ptr: self.create(value) }
    }

    /// Drops the value at `ptr` and returns its block to the free list.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by a prior `create` on this exact
    /// `Slab`, and must not already have been passed to `destroy`.
    /// Violating either is a programmer bug: with
    /// [`SlabConfig::validate_destroy_ownership`] or
    /// [`SlabConfig::validate_state`] enabled it is caught and turned into a
    /// panic; with both disabled it is undefined behavior, same as any other
    /// `unsafe fn` contract violation.
    pub unsafe fn destroy(&self, ptr: NonNull<T>) {
        let payload = ptr.as_ptr() as *mut u8;
        // `wrapping_sub` rather than `sub`: until the ownership check below
        // runs, `payload` may not point into one of our allocations at all
        // (that is exactly the bug this function is meant to catch), so the
        // offset must not assert in-bounds provenance.
        let block = payload.wrapping_sub(HEADER_SIZE);
        let header = block as *mut BlockHeader;

        if self.config.validate_destroy_ownership {
            let puddle_count = self.puddle_count.load(Ordering::Acquire);
            if !self.puddles.contains(block, self.layout.stride, puddle_count) {
                crate::trace_error!("destroy called with a pointer this Slab did not allocate");
                panic!("Slab<T>::destroy: pointer does not belong to this Slab");
            }
        }

        if self.config.validate_state {
            // SAFETY: header is inside a published puddle once ownership
            // (or, without that check, the caller's contract) holds.
            let state = unsafe { (*header).state() };
            if state != BlockState::Used {
                crate::trace_error!(?state, "destroy called on a block that is not in use");
                panic!("Slab<T>::destroy: double destroy, or destroy of a block never returned by create");
            }
        }

        // SAFETY: the caller's contract guarantees `payload` holds a live T.
        unsafe { core::ptr::drop_in_place(payload as *mut T) };

        if self.config.poison_on_push && size_of::<T>() > 0 {
            // SAFETY: the value was just dropped; these bytes are free.
            unsafe { core::ptr::write_bytes(payload, 0xAA, size_of::<T>()) };
        }

        // The block's own identity (element + puddle index) was stamped
        // into its header the last time it was pushed; read it back rather
        // than re-deriving it by scanning puddle address ranges.
        // SAFETY: header was initialized by the `grow_one`/`push` that
        // produced this block and never touched concurrently while Used.
        let identity = unsafe { (*header).self_handle } as u16;
        let handle = Handle::from_bits(identity as u32);
        self.free_list.push(handle, &self.puddles, self.layout.stride);

        if self.config.track_stats {
            self.counters.record_destroy();
        }
    }

    /// A snapshot of this slab's activity. Meaningful only when
    /// [`SlabConfig::track_stats`] is enabled; otherwise the create/destroy
    /// counters read zero.
    pub fn stats(&self) -> SlabStats {
        self.counters.snapshot(self.puddle_count.load(Ordering::Relaxed))
    }

    /// Appends one more 256-block puddle. Returns `false` if the slab has
    /// already reached `MAX_PUDDLES`.
    fn grow_one(&self) -> bool {
        let index = self.next_puddle.fetch_add(1, Ordering::Relaxed);
        if index >= MAX_PUDDLES {
            return false;
        }

        let alloc_layout = core::alloc::Layout::from_size_align(
            self.layout.stride * storage::BLOCKS_PER_PUDDLE,
            self.layout.align,
        )
        .expect("puddle layout was validated when the Slab was constructed");

        // SAFETY: alloc_layout has non-zero size (stride >= 32).
        let buf = unsafe { std::alloc::alloc_zeroed(alloc_layout) };
        if buf.is_null() {
            std::alloc::handle_alloc_error(alloc_layout);
        }

        self.puddles.publish(index as u8, buf);
        crate::trace_debug!(puddle = index, stride = self.layout.stride, "slab grew by one puddle");

        // Reverse order so the lowest element index ends up on top of the
        // free list (the next `create` gets element 0), matching the
        // teacher's own `initialize_free_list`.
        for element in (0..storage::BLOCKS_PER_PUDDLE as u16).rev() {
            let handle = Handle::new(element as u8, index as u8, 0);
            self.free_list.push(handle, &self.puddles, self.layout.stride);
        }

        // `fetch_max`-style update, not a bare store: two threads racing
        // `grow_one` reserve indices (say) 0 and 1 via the fetch-add above,
        // but may finish publishing and reach this line in either order. A
        // plain `store(index + 1, ..)` would let the thread publishing index
        // 0 overwrite a `puddle_count` the other thread already advanced to
        // 2, stranding puddle 1 outside `0..puddle_count` for `destroy`'s
        // ownership scan and for `Drop`.
        crate::utils::atomic_max(&self.puddle_count, index + 1);
        true
    }
}

// SAFETY: `Slab<T>` only ever exposes `T` through `create`/`destroy`, both
// of which work identically regardless of which thread calls them; no `&T`
// or `&mut T` is reachable through `&Slab<T>` directly. A value created on
// one thread can be destroyed (and thus dropped) on another, so `T: Send`
// is required for `Sync` as well as `Send`.
unsafe impl<T: Send> Send for Slab<T> {}
unsafe impl<T: Send> Sync for Slab<T> {}

impl<T> Drop for Slab<T> {
    fn drop(&mut self) {
        let puddle_count = *self.puddle_count.get_mut();
        let puddle_bytes = self.layout.stride * storage::BLOCKS_PER_PUDDLE;
        let alloc_layout =
            core::alloc::Layout::from_size_align(puddle_bytes, self.layout.align)
                .expect("puddle layout was validated when the Slab was constructed");

        for index in 0..puddle_count.min(MAX_PUDDLES) {
            let ptr = self.puddles.get(index as u8);
            if ptr.is_null() {
                continue;
            }
            // SAFETY: ptr was allocated by `alloc_zeroed` with this exact
            // layout in `grow_one`, and is dropped at most once (drop takes
            // `&mut self`, so no concurrent access is possible).
            unsafe { std::alloc::dealloc(ptr, alloc_layout) };
        }
    }
}

/// An RAII handle to a value owned by a [`Slab`].
///
/// Behaves like `Box<T>`, except deallocation returns the block to the
/// slab's free list instead of the global allocator.
pub struct SlabBox<'a, T> {
    slab: &'a Slab<T>,
    ptr: NonNull<T>,
}

impl<T> Deref for SlabBox<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: `ptr` is live for the lifetime of this `SlabBox`.
        unsafe { self.ptr.as_ref() }
    }
}

impl<T> DerefMut for SlabBox<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: `ptr` is live and uniquely owned by this `SlabBox`.
        unsafe { self.ptr.as_mut() }
    }
}

impl<T> Drop for SlabBox<'_, T> {
    fn drop(&mut self) {
        // SAFETY: `ptr` was produced by `self.slab.create` and has not been
        // destroyed yet; a `SlabBox` destroys it exactly once, here.
        unsafe { self.slab.destroy(self.ptr) };
    }
}

// SAFETY: same reasoning as `Slab<T>`'s Send/Sync impls; a `SlabBox<T>` is
// just a `Slab<T>` reference plus a live `T`.
unsafe impl<T: Send> Send for SlabBox<'_, T> {}
unsafe impl<T: Send + Sync> Sync for SlabBox<'_, T> {}
