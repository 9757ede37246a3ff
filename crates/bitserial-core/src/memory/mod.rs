//! Word memory and sizing.
//!
//! Memory is a flat array of 16-bit words. Every address is reduced modulo
//! the memory size before use, so no access can fall outside the array.

/// Operand address translation into memory or port-bank targets.
pub mod map;

pub use map::{
    translate, virtual_address, Address, Port, IO_SELECT_BIT, OPERAND_MASK, PORT_SELECT_MASK,
    VIRTUAL_IO_BIT,
};

/// Validated power-of-two memory capacity in words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MemorySize(usize);

impl MemorySize {
    /// Smallest accepted capacity.
    pub const MIN_WORDS: usize = 16;
    /// Largest accepted capacity (full 16-bit address space).
    pub const MAX_WORDS: usize = 1 << 16;
    /// 4096-word memory, the default.
    pub const W4096: Self = Self(4096);
    /// 8192-word memory.
    pub const W8192: Self = Self(8192);

    /// Validates a capacity; returns `None` unless it is a power of two in
    /// `MIN_WORDS..=MAX_WORDS`.
    #[must_use]
    pub const fn new(words: usize) -> Option<Self> {
        if words.is_power_of_two() && words >= Self::MIN_WORDS && words <= Self::MAX_WORDS {
            Some(Self(words))
        } else {
            None
        }
    }

    /// Capacity in words.
    #[must_use]
    pub const fn words(self) -> usize {
        self.0
    }

    /// Address mask (`words - 1`).
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn mask(self) -> u16 {
        (self.0 - 1) as u16
    }

    /// Reduces an address modulo the capacity.
    #[must_use]
    pub const fn wrap(self, addr: u16) -> u16 {
        addr & self.mask()
    }
}

impl Default for MemorySize {
    fn default() -> Self {
        Self::W4096
    }
}

/// Fixed-capacity word memory shared by code and data.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Memory {
    size: MemorySize,
    words: Box<[u16]>,
}

impl Memory {
    /// Allocates zeroed memory of the given capacity.
    #[must_use]
    pub fn new(size: MemorySize) -> Self {
        Self {
            size,
            words: vec![0; size.words()].into_boxed_slice(),
        }
    }

    /// Capacity of this memory.
    #[must_use]
    pub const fn size(&self) -> MemorySize {
        self.size
    }

    /// Reads the word at `addr` (wrapped).
    #[must_use]
    pub fn read(&self, addr: u16) -> u16 {
        self.words[usize::from(self.size.wrap(addr))]
    }

    /// Writes the word at `addr` (wrapped).
    pub fn write(&mut self, addr: u16, value: u16) {
        self.words[usize::from(self.size.wrap(addr))] = value;
    }

    /// Copies `words` into memory starting at address 0. Words past the
    /// capacity are ignored; untouched cells keep their value.
    pub fn load(&mut self, words: &[u16]) {
        let count = words.len().min(self.words.len());
        self.words[..count].copy_from_slice(&words[..count]);
    }

    /// Zeroes every cell.
    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    /// Borrows the raw word array.
    #[must_use]
    pub fn as_slice(&self) -> &[u16] {
        &self.words
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new(MemorySize::default())
    }
}
