//! Insertion-ordered symbol table.
//!
//! Symbols are never removed or redefined. Lookup is by exact name; listing
//! order is definition order.

use std::collections::HashMap;
use std::fmt;

use crate::errors::AssembleErrorKind;

/// What a symbol names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    /// Data cell allocated from the top of memory.
    Variable,
    /// Code address.
    Label,
    /// Value from `.constant`.
    Constant,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Variable => "variable",
            Self::Label => "label",
            Self::Constant => "constant",
        })
    }
}

/// A defined symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    /// Symbol name.
    pub name: String,
    /// What the symbol names.
    pub kind: SymbolKind,
    /// Address or value.
    pub value: u16,
}

/// Symbol table mapping names to definitions, in definition order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    entries: Vec<Symbol>,
    index: HashMap<String, usize>,
}

impl SymbolTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines a new symbol.
    ///
    /// # Errors
    ///
    /// Returns [`AssembleErrorKind::DuplicateDefinition`] when `name` is
    /// already defined.
    pub fn define(
        &mut self,
        name: &str,
        kind: SymbolKind,
        value: u16,
    ) -> Result<(), AssembleErrorKind> {
        if self.index.contains_key(name) {
            return Err(AssembleErrorKind::DuplicateDefinition(name.to_owned()));
        }
        self.index.insert(name.to_owned(), self.entries.len());
        self.entries.push(Symbol {
            name: name.to_owned(),
            kind,
            value,
        });
        Ok(())
    }

    /// Looks up a symbol by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.index.get(name).map(|&slot| &self.entries[slot])
    }

    /// Symbols in definition order.
    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.entries.iter()
    }

    /// Number of symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when nothing is defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
