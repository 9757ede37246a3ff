/// `FLAGS` bit for ADD carry-out.
pub const FLAG_CARRY: u16 = 1 << 0;
/// `FLAGS` bit set when the accumulator is zero.
pub const FLAG_ZERO: u16 = 1 << 1;
/// `FLAGS` bit set when accumulator bit 15 is set.
pub const FLAG_NEGATIVE: u16 = 1 << 2;
/// `FLAGS` bit set when the accumulator has an even population count.
pub const FLAG_PARITY: u16 = 1 << 3;
/// `FLAGS` bit selecting rotate instead of shift.
pub const FLAG_ROTATE: u16 = 1 << 4;
/// `FLAGS` bit requesting a reset on the next cycle.
pub const FLAG_RESET: u16 = 1 << 5;
/// `FLAGS` bit enabling indirect operand fetch.
pub const FLAG_INDIRECT: u16 = 1 << 6;
/// `FLAGS` bit that stops the engine.
pub const FLAG_HALT: u16 = 1 << 7;
/// Status bits derived from the accumulator every cycle.
pub const FLAG_STATUS_MASK: u16 = FLAG_ZERO | FLAG_NEGATIVE | FLAG_PARITY;

/// Program counter, accumulator and flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Registers {
    pc: u16,
    acc: u16,
    flags: u16,
}

impl Registers {
    /// Builds a register file from explicit values.
    #[must_use]
    pub const fn new(pc: u16, acc: u16, flags: u16) -> Self {
        Self { pc, acc, flags }
    }

    /// Reads the `PC` register.
    #[must_use]
    pub const fn pc(&self) -> u16 {
        self.pc
    }

    /// Writes the `PC` register.
    pub const fn set_pc(&mut self, value: u16) {
        self.pc = value;
    }

    /// Reads the accumulator.
    #[must_use]
    pub const fn acc(&self) -> u16 {
        self.acc
    }

    /// Writes the accumulator.
    pub const fn set_acc(&mut self, value: u16) {
        self.acc = value;
    }

    /// Reads the `FLAGS` register.
    #[must_use]
    pub const fn flags(&self) -> u16 {
        self.flags
    }

    /// Writes the `FLAGS` register.
    pub const fn set_flags(&mut self, value: u16) {
        self.flags = value;
    }

    /// Returns `true` if every bit in `flag` is set.
    #[must_use]
    pub const fn flag_is_set(&self, flag: u16) -> bool {
        (self.flags & flag) == flag
    }

    /// Sets or clears the bits in `flag`.
    pub const fn set_flag(&mut self, flag: u16, enabled: bool) {
        if enabled {
            self.flags |= flag;
        } else {
            self.flags &= !flag;
        }
    }
}
