//! Parameterless textual macros.

use std::collections::HashMap;

use crate::errors::AssembleErrorKind;
use crate::parser::tokenize;

/// A captured macro body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Macro {
    /// Macro name.
    pub name: String,
    /// Body lines, excluding the `macro` and `.end` lines.
    pub body: Vec<String>,
}

/// Macros by name.
#[derive(Debug, Clone, Default)]
pub struct MacroTable {
    macros: HashMap<String, Macro>,
}

impl MacroTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a macro.
    ///
    /// # Errors
    ///
    /// Returns [`AssembleErrorKind::DuplicateDefinition`] when the name is
    /// taken.
    pub fn define(&mut self, name: &str, body: Vec<String>) -> Result<(), AssembleErrorKind> {
        if self.macros.contains_key(name) {
            return Err(AssembleErrorKind::DuplicateDefinition(name.to_owned()));
        }
        self.macros.insert(
            name.to_owned(),
            Macro {
                name: name.to_owned(),
                body,
            },
        );
        Ok(())
    }

    /// Looks up a macro by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Macro> {
        self.macros.get(name)
    }
}

/// Collects the lines after `start` up to the first line whose first field
/// is `.end`.
///
/// Returns the body and the index of the `.end` line, or `None` when the
/// body is never terminated.
#[must_use]
pub fn capture_body<S: AsRef<str>>(lines: &[S], start: usize) -> Option<(Vec<String>, usize)> {
    let end = lines
        .iter()
        .enumerate()
        .skip(start)
        .find(|(_, line)| tokenize(line.as_ref()).first() == Some(&".end"))
        .map(|(index, _)| index)?;
    let body = lines[start..end]
        .iter()
        .map(|line| line.as_ref().to_owned())
        .collect();
    Some((body, end))
}
