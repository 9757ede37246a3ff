//! Mnemonic, pseudo-op and directive resolution.
//!
//! Instruction mnemonics come straight from the core opcode table so the
//! assembler and engine can never disagree on an encoding.

use bitserial_core::{encode, Opcode, OPCODE_TABLE};

/// Assembler directives, recognised by their first field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Directive {
    /// `variable <name>`: reserve one data cell from the top of memory.
    Variable,
    /// `label <name>`: name the next code address.
    Label,
    /// `allocate <n>`: reserve `n` data cells.
    Allocate,
    /// `macro <name>`: capture lines up to `.end`.
    Macro,
    /// `.set <addr> <value>`: store a word at an address.
    Set,
    /// `.constant <name> <value>`: define a named value.
    Constant,
    /// `.end`: terminates a macro body.
    End,
}

impl Directive {
    /// Recognises a directive keyword.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "variable" => Some(Self::Variable),
            "label" => Some(Self::Label),
            "allocate" => Some(Self::Allocate),
            "macro" => Some(Self::Macro),
            ".set" => Some(Self::Set),
            ".constant" => Some(Self::Constant),
            ".end" => Some(Self::End),
            _ => None,
        }
    }
}

const PSEUDO_OPS: [(&str, u16); 2] = [
    ("nop", encode(Opcode::Or, 0)),
    ("clr", encode(Opcode::Literal, 0)),
];

/// Resolves an operand-less pseudo-op to its fixed instruction word.
#[must_use]
pub fn pseudo_op(name: &str) -> Option<u16> {
    PSEUDO_OPS
        .iter()
        .find(|(pseudo, _)| *pseudo == name)
        .map(|&(_, word)| word)
}

/// Resolves an instruction mnemonic. Matching is case-sensitive.
#[must_use]
pub fn resolve(name: &str) -> Option<Opcode> {
    Opcode::from_mnemonic(name)
}

/// Every instruction mnemonic, in opcode order.
pub fn mnemonics() -> impl Iterator<Item = &'static str> {
    OPCODE_TABLE.iter().map(|info| info.mnemonic)
}
