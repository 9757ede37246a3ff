//! Assembler for the bit-serial word machine.
//!
//! Source is line oriented: up to three whitespace-separated fields per
//! line, `;` or `#` comments, and `$`-prefixed hex numbers. Assembly is a
//! single pass with deferred patching of forward label references.

/// Single-pass assembly pipeline.
pub mod assembler;
/// Structured assembly error types.
pub mod errors;
/// Macro capture and lookup.
pub mod macros;
/// Mnemonic, pseudo-op and directive resolution.
pub mod mnemonic;
/// Line tokenizer and number syntax.
pub mod parser;
/// Insertion-ordered symbol table.
pub mod symbols;

pub use assembler::{assemble, assemble_with, Assembly, AssemblerConfig, DEFAULT_MAX_MACRO_DEPTH};
pub use errors::{AssembleError, AssembleErrorKind, SourceLocation};
pub use symbols::{Symbol, SymbolKind, SymbolTable};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
#[cfg(test)]
use tempfile as _;
