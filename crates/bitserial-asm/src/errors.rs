//! Structured error reporting for the assembler.
//!
//! Every error carries the line it was raised on. Lines inside a macro body
//! are numbered from the start of the body and name the macro:
//!
//! ```text
//! line 12: error: duplicate definition: loop
//! line 2 in macro 'halt': error: unknown command: hlt
//! ```

use std::fmt;

use thiserror::Error;

/// Where an error was raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// 1-indexed line number, relative to the macro body when inside one.
    pub line: usize,
    /// Macro whose body contains the line.
    pub macro_name: Option<String>,
}

impl SourceLocation {
    /// Location of a top-level source line.
    #[must_use]
    pub const fn line(line: usize) -> Self {
        Self {
            line,
            macro_name: None,
        }
    }

    /// Location of a line inside a macro body.
    #[must_use]
    pub fn in_macro(line: usize, name: &str) -> Self {
        Self {
            line,
            macro_name: Some(name.to_owned()),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.macro_name {
            Some(name) => write!(f, "line {} in macro '{name}'", self.line),
            None => write!(f, "line {}", self.line),
        }
    }
}

/// Classification of assembly errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssembleErrorKind {
    /// Code and variables collided.
    #[error("program space full")]
    SpaceExhausted,
    /// A numeric instruction operand does not fit in 12 bits.
    #[error("operand too big: ${0:x}")]
    OperandTooLarge(u16),
    /// First field is neither a directive, mnemonic, symbol nor macro.
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    /// A symbol or macro name was defined twice.
    #[error("duplicate definition: {0}")]
    DuplicateDefinition(String),
    /// A forward reference never resolved to a label.
    #[error("invalid reference: {0}")]
    UnresolvedReference(String),
    /// `macro` without a matching `.end`.
    #[error("unterminated macro: {0}")]
    UnterminatedMacro(String),
    /// A `$`-prefixed token is not a 16-bit hex number.
    #[error("malformed number: {0}")]
    MalformedNumber(String),
    /// Instruction or directive written without its operand.
    #[error("missing operand for {0}")]
    MissingOperand(String),
    /// More than three fields on one line.
    #[error("too many fields: {0}")]
    TooManyFields(usize),
    /// A directive referenced a symbol that is not defined yet.
    #[error("unknown variable: {0}")]
    UndefinedSymbol(String),
    /// `allocate` named a symbol that is not a constant.
    #[error("not a constant: {0}")]
    NotAConstant(String),
    /// `.set` target outside memory.
    #[error("address ${0:x} is outside memory")]
    AddressOutOfRange(u16),
    /// `.end` outside a macro definition.
    #[error(".end outside of a macro definition")]
    StrayEnd,
    /// `macro` appeared inside a macro body.
    #[error("nested macro definition: {0}")]
    NestedMacro(String),
    /// Macro expansion recursed past the configured depth.
    #[error("macro nesting deeper than {limit} levels in {name}")]
    MacroDepthExceeded {
        /// Macro being invoked.
        name: String,
        /// Configured depth limit.
        limit: usize,
    },
}

/// Assembly error with source location context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembleError {
    /// Kind of error.
    pub kind: AssembleErrorKind,
    /// Source location, absent for whole-program checks.
    pub location: Option<SourceLocation>,
}

impl AssembleError {
    /// Error without a location.
    #[must_use]
    pub const fn new(kind: AssembleErrorKind) -> Self {
        Self {
            kind,
            location: None,
        }
    }

    /// Attaches a source location.
    #[must_use]
    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Formats the error for stderr output.
    #[must_use]
    pub fn format_for_stderr(&self) -> String {
        self.location.as_ref().map_or_else(
            || format!("error: {}", self.kind),
            |loc| format!("{loc}: error: {}", self.kind),
        )
    }
}

impl fmt::Display for AssembleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "{loc}: {}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for AssembleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl From<AssembleErrorKind> for AssembleError {
    fn from(kind: AssembleErrorKind) -> Self {
        Self::new(kind)
    }
}
