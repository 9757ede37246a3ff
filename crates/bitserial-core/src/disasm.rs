//! Instruction disassembly and flag rendering.
//!
//! Used by trace output and assembler listings. `set`/`get` are rendered by
//! sub-mode (`set.flags`, `get.pc`, `set.port 1`) because the raw operand
//! hides which register they touch.

use crate::decoder::{Decoder, SystemTarget};
use crate::encoding::OperandClass;
use crate::state::{
    FLAG_CARRY, FLAG_HALT, FLAG_INDIRECT, FLAG_NEGATIVE, FLAG_PARITY, FLAG_RESET, FLAG_ROTATE,
    FLAG_ZERO,
};
use crate::Memory;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single disassembled memory cell.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisassemblyRow {
    /// Address of the word.
    pub addr: u16,
    /// Raw instruction word.
    pub raw: u16,
    /// Mnemonic, including any `set`/`get` sub-mode suffix.
    pub mnemonic: String,
    /// Formatted operand, empty when the sub-mode already names it.
    pub operand: String,
}

impl DisassemblyRow {
    /// Disassembles the word stored at `addr`.
    #[must_use]
    pub fn new(addr: u16, raw: u16) -> Self {
        let decoded = Decoder::decode(raw);
        let name = decoded.opcode.mnemonic();
        let (mnemonic, operand) = match decoded.opcode.class() {
            OperandClass::System => match decoded.system_target() {
                SystemTarget::Port(port) => (format!("{name}.port"), port.index().to_string()),
                SystemTarget::Flags => (format!("{name}.flags"), String::new()),
                SystemTarget::ProgramCounter => (format!("{name}.pc"), String::new()),
            },
            OperandClass::MemoryReference
            | OperandClass::PortOrMemory
            | OperandClass::Immediate => (name.to_owned(), format!("${:03x}", decoded.operand)),
        };
        Self {
            addr,
            raw,
            mnemonic,
            operand,
        }
    }

    /// Mnemonic and operand joined by a space.
    #[must_use]
    pub fn text(&self) -> String {
        if self.operand.is_empty() {
            self.mnemonic.clone()
        } else {
            format!("{} {}", self.mnemonic, self.operand)
        }
    }
}

/// Renders one instruction word as assembler text.
#[must_use]
pub fn disassemble(word: u16) -> String {
    DisassemblyRow::new(0, word).text()
}

/// Disassembles `count` consecutive cells starting at `start`, wrapping at
/// the end of memory.
#[must_use]
pub fn disassemble_range(memory: &Memory, start: u16, count: usize) -> Vec<DisassemblyRow> {
    let size = memory.size();
    let mut addr = size.wrap(start);
    let mut rows = Vec::with_capacity(count);
    for _ in 0..count {
        rows.push(DisassemblyRow::new(addr, memory.read(addr)));
        addr = size.wrap(addr.wrapping_add(1));
    }
    rows
}

const FLAG_LETTERS: [(u16, char); 8] = [
    (FLAG_HALT, 'H'),
    (FLAG_INDIRECT, 'I'),
    (FLAG_RESET, 'R'),
    (FLAG_ROTATE, 'O'),
    (FLAG_PARITY, 'P'),
    (FLAG_NEGATIVE, 'N'),
    (FLAG_ZERO, 'Z'),
    (FLAG_CARRY, 'C'),
];

/// Eight-character flag summary, high bit first, `-` for clear bits.
#[must_use]
pub fn flags_summary(flags: u16) -> String {
    FLAG_LETTERS
        .iter()
        .map(|&(bit, letter)| if flags & bit != 0 { letter } else { '-' })
        .collect()
}
