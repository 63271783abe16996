//! S5 — exhausting all 65536 blocks makes the next `create` fatal.

use puddle::Slab;

#[test]
fn sixty_five_thousand_five_hundred_thirty_seventh_create_panics() {
    let slab: Slab<u8> = Slab::new().unwrap();

    let mut ptrs = Vec::with_capacity(65_536);
    for i in 0..65_536u32 {
        ptrs.push(slab.create(i as u8));
    }
    assert_eq!(slab.stats().puddle_count, 256);

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| slab.create(0)));
    assert!(result.is_err(), "create past the 65536-block ceiling must panic");

    for ptr in ptrs {
        unsafe { slab.destroy(ptr) };
    }
}
