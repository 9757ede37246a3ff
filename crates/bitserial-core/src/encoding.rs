//! Opcode table for the word machine.
//!
//! Instruction words are `opcode:4 | operand:12`. All sixteen opcode values
//! are assigned, so every word decodes.

use crate::memory::OPERAND_MASK;

/// The sixteen operations, in opcode order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Opcode {
    Or = 0x0,
    And = 0x1,
    Xor = 0x2,
    Add = 0x3,
    Lshift = 0x4,
    Rshift = 0x5,
    Load = 0x6,
    Store = 0x7,
    LoadDirect = 0x8,
    StoreDirect = 0x9,
    Literal = 0xA,
    Reserved = 0xB,
    Jump = 0xC,
    Jumpz = 0xD,
    Set = 0xE,
    Get = 0xF,
}

/// How an opcode interprets its 12-bit operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandClass {
    /// Immediate value, or a pointer to it when the Indirect flag is set.
    MemoryReference,
    /// Memory address or port register selected by the I/O-select bit.
    PortOrMemory,
    /// Literal value, never dereferenced.
    Immediate,
    /// Sub-mode selector for `set`/`get` (port, flags, or pc).
    System,
}

/// One row of the opcode table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeInfo {
    /// 4-bit opcode value.
    pub code: u8,
    /// Assembler mnemonic.
    pub mnemonic: &'static str,
    /// Operation.
    pub opcode: Opcode,
    /// Operand interpretation.
    pub class: OperandClass,
}

const fn row(opcode: Opcode, mnemonic: &'static str, class: OperandClass) -> OpcodeInfo {
    OpcodeInfo {
        code: opcode as u8,
        mnemonic,
        opcode,
        class,
    }
}

/// Single source of truth for opcode values, mnemonics and operand classes.
pub const OPCODE_TABLE: [OpcodeInfo; 16] = [
    row(Opcode::Or, "or", OperandClass::MemoryReference),
    row(Opcode::And, "and", OperandClass::MemoryReference),
    row(Opcode::Xor, "xor", OperandClass::MemoryReference),
    row(Opcode::Add, "add", OperandClass::MemoryReference),
    row(Opcode::Lshift, "lshift", OperandClass::MemoryReference),
    row(Opcode::Rshift, "rshift", OperandClass::MemoryReference),
    row(Opcode::Load, "load", OperandClass::MemoryReference),
    row(Opcode::Store, "store", OperandClass::MemoryReference),
    row(Opcode::LoadDirect, "load-direct", OperandClass::PortOrMemory),
    row(Opcode::StoreDirect, "store-direct", OperandClass::PortOrMemory),
    row(Opcode::Literal, "literal", OperandClass::Immediate),
    row(Opcode::Reserved, "reserved", OperandClass::Immediate),
    row(Opcode::Jump, "jump", OperandClass::MemoryReference),
    row(Opcode::Jumpz, "jumpz", OperandClass::MemoryReference),
    row(Opcode::Set, "set", OperandClass::System),
    row(Opcode::Get, "get", OperandClass::System),
];

impl Opcode {
    /// Decodes the low four bits of `op`.
    #[must_use]
    pub const fn from_u4(op: u8) -> Self {
        OPCODE_TABLE[(op & 0xF) as usize].opcode
    }

    /// Table row for this opcode.
    #[must_use]
    pub const fn info(self) -> OpcodeInfo {
        OPCODE_TABLE[self as usize]
    }

    /// Assembler mnemonic.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        self.info().mnemonic
    }

    /// Operand interpretation.
    #[must_use]
    pub const fn class(self) -> OperandClass {
        self.info().class
    }

    /// Looks up an opcode by its exact mnemonic.
    #[must_use]
    pub fn from_mnemonic(name: &str) -> Option<Self> {
        OPCODE_TABLE
            .iter()
            .find(|info| info.mnemonic == name)
            .map(|info| info.opcode)
    }
}

/// Composes an instruction word; operand bits above 11 are discarded.
#[must_use]
pub const fn encode(opcode: Opcode, operand: u16) -> u16 {
    ((opcode as u16) << 12) | (operand & OPERAND_MASK)
}
