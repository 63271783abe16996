//! S1 — single thread, create/destroy cycle at the computed stride.

use puddle::Slab;

/// `round_up(16 + 24, 16) == 48`.
struct Payload24([u8; 24]);

#[test]
fn three_creates_land_at_the_expected_stride() {
    let slab: Slab<Payload24> = Slab::new().unwrap();

    let a = slab.create(Payload24([1; 24]));
    let b = slab.create(Payload24([2; 24]));
    let c = slab.create(Payload24([3; 24]));

    let base = a.as_ptr() as usize;
    let offsets = [
        0usize,
        b.as_ptr() as usize - base,
        c.as_ptr() as usize - base,
    ];
    let mut sorted = offsets;
    sorted.sort_unstable();
    assert_eq!(sorted, [0, 48, 96]);

    unsafe {
        slab.destroy(a);
        slab.destroy(b);
        slab.destroy(c);
    }
}

#[test]
fn destroying_the_middle_block_recycles_its_exact_offset() {
    let slab: Slab<Payload24> = Slab::new().unwrap();

    let a = slab.create(Payload24([1; 24]));
    let b = slab.create(Payload24([2; 24]));
    let c = slab.create(Payload24([3; 24]));
    let b_addr = b.as_ptr() as usize;

    unsafe { slab.destroy(b) };
    let d = slab.create(Payload24([4; 24]));
    assert_eq!(d.as_ptr() as usize, b_addr, "freed block should be the next one handed out");

    unsafe {
        slab.destroy(a);
        slab.destroy(d);
        slab.destroy(c);
    }
}

#[test]
fn payload_round_trips_through_create() {
    let slab: Slab<(u32, u32)> = Slab::new().unwrap();
    let ptr = slab.create((7, 9));
    assert_eq!(unsafe { *ptr.as_ref() }, (7, 9));
    unsafe { slab.destroy(ptr) };
}
