//! Pure arithmetic and shift helpers.

/// Adds `a`, `b` and the incoming carry, returning the 16-bit sum and the
/// unsigned carry-out.
#[must_use]
pub const fn add_with_carry(a: u16, b: u16, carry_in: bool) -> (u16, bool) {
    let (partial, first) = a.overflowing_add(b);
    let (sum, second) = partial.overflowing_add(if carry_in { 1 } else { 0 });
    (sum, first || second)
}

/// Shift distance encoded by an operand: its population count.
#[must_use]
pub const fn shift_count(operand: u16) -> u32 {
    operand.count_ones()
}

/// Shifts or rotates left by `count` bits. Plain shifts of 16 or more clear
/// the value.
#[must_use]
pub const fn shift_left(value: u16, count: u32, rotate: bool) -> u16 {
    if rotate {
        value.rotate_left(count)
    } else if count >= u16::BITS {
        0
    } else {
        value << count
    }
}

/// Shifts or rotates right by `count` bits. Plain shifts of 16 or more clear
/// the value.
#[must_use]
pub const fn shift_right(value: u16, count: u32, rotate: bool) -> u16 {
    if rotate {
        value.rotate_right(count)
    } else if count >= u16::BITS {
        0
    } else {
        value >> count
    }
}

/// Mask applied by `and`: immediates keep the accumulator's top nibble.
#[must_use]
pub const fn and_mask(lop: u16, indirect: bool) -> u16 {
    if indirect {
        lop
    } else {
        0xF000 | lop
    }
}
