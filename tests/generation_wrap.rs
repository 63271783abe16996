//! S6 — the 16-bit generation counter wraps without breaking correctness.

use puddle::Slab;

#[test]
fn generation_counter_wraps_through_zero_without_corrupting_the_list() {
    let slab: Slab<u64> = Slab::new().unwrap();

    // A single block, pushed and popped enough times to overflow a u16
    // generation counter at least once. Single-threaded, so there is no
    // actual ABA race here — this only exercises wrapping arithmetic.
    let mut ptr = slab.create(0);
    for i in 0..(1u32 << 16) + 1 {
        unsafe { slab.destroy(ptr) };
        ptr = slab.create(i as u64);
    }

    assert_eq!(unsafe { *ptr.as_ref() }, 1u64 << 16);
    unsafe { slab.destroy(ptr) };

    // The list is still sane: one more create/destroy cycle works normally.
    let p = slab.create(1);
    unsafe { slab.destroy(p) };
}
