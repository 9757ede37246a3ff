//! Instruction decoder.
//!
//! Decoding is total: every 16-bit word splits into an opcode and a 12-bit
//! operand, and `set`/`get` operands further select a port, the flags
//! register, or the program counter.

use crate::encoding::{Opcode, OperandClass};
use crate::memory::{Port, IO_SELECT_BIT, OPERAND_MASK, PORT_SELECT_MASK};

/// A decoded instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecodedInstruction {
    /// Raw instruction word.
    pub raw: u16,
    /// Operation (bits 15..12).
    pub opcode: Opcode,
    /// Operand field (bits 11..0).
    pub operand: u16,
}

impl DecodedInstruction {
    /// Returns `true` when the Indirect flag applies to this instruction.
    #[must_use]
    pub fn honors_indirect(&self) -> bool {
        self.opcode.class() == OperandClass::MemoryReference
    }

    /// Sub-mode selected by a `set`/`get` operand.
    #[must_use]
    pub const fn system_target(&self) -> SystemTarget {
        SystemTarget::from_operand(self.operand)
    }
}

/// Target of a `set`/`get` instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemTarget {
    /// Port-bank register (I/O-select bit set).
    Port(Port),
    /// Flags register (operand bit 0 set).
    Flags,
    /// Program counter.
    ProgramCounter,
}

impl SystemTarget {
    /// Classifies a `set`/`get` operand.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_operand(operand: u16) -> Self {
        if operand & IO_SELECT_BIT != 0 {
            Self::Port(Port::from_u3((operand & PORT_SELECT_MASK) as u8))
        } else if operand & 1 != 0 {
            Self::Flags
        } else {
            Self::ProgramCounter
        }
    }
}

/// Stateless instruction decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct Decoder;

impl Decoder {
    /// Splits an instruction word into opcode and operand.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn decode(word: u16) -> DecodedInstruction {
        DecodedInstruction {
            raw: word,
            opcode: Opcode::from_u4((word >> 12) as u8),
            operand: word & OPERAND_MASK,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Decoder, SystemTarget};
    use crate::encoding::Opcode;
    use crate::memory::Port;

    #[test]
    fn decode_splits_opcode_and_operand() {
        let decoded = Decoder::decode(0xA005);
        assert_eq!(decoded.opcode, Opcode::Literal);
        assert_eq!(decoded.operand, 0x005);
        assert_eq!(decoded.raw, 0xA005);

        let decoded = Decoder::decode(0x7F00);
        assert_eq!(decoded.opcode, Opcode::Store);
        assert_eq!(decoded.operand, 0xF00);
    }

    #[test]
    fn every_word_decodes() {
        for word in [0x0000u16, 0xB123, 0xFFFF] {
            let decoded = Decoder::decode(word);
            assert_eq!(crate::encode(decoded.opcode, decoded.operand), word);
        }
    }

    #[test]
    fn indirect_applies_only_to_memory_reference_opcodes() {
        assert!(Decoder::decode(0x6010).honors_indirect());
        assert!(Decoder::decode(0xC010).honors_indirect());
        assert!(!Decoder::decode(0x8010).honors_indirect());
        assert!(!Decoder::decode(0xA010).honors_indirect());
        assert!(!Decoder::decode(0xE001).honors_indirect());
    }

    #[test]
    fn system_target_prefers_port_then_flags_then_pc() {
        assert_eq!(SystemTarget::from_operand(0x000), SystemTarget::ProgramCounter);
        assert_eq!(SystemTarget::from_operand(0x001), SystemTarget::Flags);
        assert_eq!(SystemTarget::from_operand(0x801), SystemTarget::Port(Port::Console));
        assert_eq!(SystemTarget::from_operand(0x800), SystemTarget::Port(Port::Switches));
    }
}
