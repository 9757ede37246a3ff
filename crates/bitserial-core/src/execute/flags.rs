//! Accumulator-derived status flags.

use crate::state::{FLAG_NEGATIVE, FLAG_PARITY, FLAG_STATUS_MASK, FLAG_ZERO};

/// Recomputes Zero, Negative and Parity from `acc`, leaving every other
/// flag bit untouched.
#[must_use]
pub const fn derive_status_flags(flags: u16, acc: u16) -> u16 {
    let mut status = 0;
    if acc == 0 {
        status |= FLAG_ZERO;
    }
    if acc & 0x8000 != 0 {
        status |= FLAG_NEGATIVE;
    }
    if acc.count_ones() % 2 == 0 {
        status |= FLAG_PARITY;
    }
    (flags & !FLAG_STATUS_MASK) | status
}
