//! Address translation for memory-or-port operands.
//!
//! Port-capable opcodes form a virtual 16-bit address from the low bits of
//! the operand plus the operand's I/O-select bit, which lands in bit 15.
//! [`translate`] is the only place that interprets that bit.

use super::MemorySize;

/// Operand bit that selects the port bank for port-capable opcodes.
pub const IO_SELECT_BIT: u16 = 1 << 11;
/// Bit of the virtual address that marks a port-bank access.
pub const VIRTUAL_IO_BIT: u16 = 1 << 15;
/// Low operand bits that select a port register.
pub const PORT_SELECT_MASK: u16 = 0x0007;
/// Operand field of an instruction word.
pub const OPERAND_MASK: u16 = 0x0FFF;

/// Registers of the memory-mapped port bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Port {
    /// Switches on read, LEDs on write.
    Switches,
    /// Console data and status.
    Console,
    /// Transmit control (reserved).
    TxControl,
    /// Receive control (reserved).
    RxControl,
    /// UART control (reserved).
    UartControl,
    /// Unassigned register index (5..=7).
    Unassigned(u8),
}

impl Port {
    /// Decodes the low three bits of a port address.
    #[must_use]
    pub const fn from_u3(bits: u8) -> Self {
        match bits & 0x7 {
            0 => Self::Switches,
            1 => Self::Console,
            2 => Self::TxControl,
            3 => Self::RxControl,
            4 => Self::UartControl,
            other => Self::Unassigned(other),
        }
    }

    /// Register index within the bank.
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Self::Switches => 0,
            Self::Console => 1,
            Self::TxControl => 2,
            Self::RxControl => 3,
            Self::UartControl => 4,
            Self::Unassigned(index) => index,
        }
    }
}

/// Resolved target of a port-capable operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Address {
    /// Ordinary memory cell, already wrapped to the memory size.
    Memory(u16),
    /// Port-bank register.
    Port(Port),
}

/// Builds the virtual 16-bit address for a 12-bit operand.
#[must_use]
pub const fn virtual_address(operand: u16) -> u16 {
    let low = operand & OPERAND_MASK & !IO_SELECT_BIT;
    if operand & IO_SELECT_BIT == 0 {
        low
    } else {
        low | VIRTUAL_IO_BIT
    }
}

/// Translates an operand into a memory or port target.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn translate(operand: u16, size: MemorySize) -> Address {
    let virt = virtual_address(operand);
    if virt & VIRTUAL_IO_BIT == 0 {
        Address::Memory(size.wrap(virt))
    } else {
        Address::Port(Port::from_u3((virt & PORT_SELECT_MASK) as u8))
    }
}

#[cfg(test)]
mod tests {
    use super::{translate, virtual_address, Address, Port, VIRTUAL_IO_BIT};
    use crate::MemorySize;

    #[test]
    fn operands_without_io_bit_address_memory() {
        assert_eq!(translate(0x010, MemorySize::W4096), Address::Memory(0x010));
        assert_eq!(translate(0x7FF, MemorySize::W4096), Address::Memory(0x7FF));
    }

    #[test]
    fn memory_addresses_wrap_for_small_memories() {
        let size = MemorySize::new(256).expect("valid size");
        assert_eq!(translate(0x123, size), Address::Memory(0x23));
    }

    #[test]
    fn io_bit_selects_port_from_low_bits() {
        assert_eq!(translate(0x800, MemorySize::W4096), Address::Port(Port::Switches));
        assert_eq!(translate(0x801, MemorySize::W4096), Address::Port(Port::Console));
        assert_eq!(translate(0x8F4, MemorySize::W4096), Address::Port(Port::UartControl));
        assert_eq!(
            translate(0x807, MemorySize::W4096),
            Address::Port(Port::Unassigned(7))
        );
    }

    #[test]
    fn virtual_address_moves_io_bit_to_bit_15() {
        assert_eq!(virtual_address(0x801), VIRTUAL_IO_BIT | 0x001);
        assert_eq!(virtual_address(0x0F00), 0x0700 | VIRTUAL_IO_BIT);
        assert_eq!(virtual_address(0x0700), 0x0700);
    }

    #[test]
    fn port_index_roundtrips() {
        for bits in 0u8..8 {
            assert_eq!(Port::from_u3(bits).index(), bits);
        }
    }
}
