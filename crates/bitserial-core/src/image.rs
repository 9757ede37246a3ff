//! Hex-text memory images.
//!
//! The text form is whitespace-separated hex words, one per memory cell
//! from address 0. Saving writes four lowercase digits and a newline per
//! word.

use std::fmt;
use std::io::{self, Write};

use thiserror::Error;

use crate::{Memory, MemorySize};

/// Memory image load/save failure.
#[derive(Debug, Error)]
pub enum ImageError {
    /// A token is not a 16-bit hex number.
    #[error("invalid hex word {token:?} at word {index}")]
    InvalidToken {
        /// Zero-based token position.
        index: usize,
        /// Offending token text.
        token: String,
    },
    /// Writing the image failed.
    #[error("image write failed: {0}")]
    Io(#[from] io::Error),
}

/// A sequence of machine words loaded at address 0.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MemoryImage {
    words: Vec<u16>,
    used: Option<usize>,
}

impl MemoryImage {
    /// Image whose every word is significant.
    #[must_use]
    pub const fn new(words: Vec<u16>) -> Self {
        Self { words, used: None }
    }

    /// Image where only the first `used` words are saved.
    #[must_use]
    pub fn with_used(words: Vec<u16>, used: usize) -> Self {
        let used = used.min(words.len());
        Self {
            words,
            used: Some(used),
        }
    }

    /// Snapshot of a whole memory.
    #[must_use]
    pub fn from_memory(memory: &Memory) -> Self {
        Self::new(memory.as_slice().to_vec())
    }

    /// All words, starting at address 0.
    #[must_use]
    pub fn words(&self) -> &[u16] {
        &self.words
    }

    /// Length of the significant prefix, when tracked.
    #[must_use]
    pub const fn used(&self) -> Option<usize> {
        self.used
    }

    /// Words written by [`Self::write_hex`].
    #[must_use]
    pub fn saved_words(&self) -> &[u16] {
        match self.used {
            Some(used) => &self.words[..used],
            None => &self.words,
        }
    }

    /// Parses hex text, stopping after `size` words.
    ///
    /// Tokens may carry a `0x` prefix.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::InvalidToken`] for the first token that is not
    /// a 16-bit hex number.
    pub fn parse_hex(text: &str, size: MemorySize) -> Result<Self, ImageError> {
        let words = text
            .split_whitespace()
            .take(size.words())
            .enumerate()
            .map(|(index, token)| {
                let digits = token
                    .strip_prefix("0x")
                    .or_else(|| token.strip_prefix("0X"))
                    .unwrap_or(token);
                u16::from_str_radix(digits, 16).map_err(|_| ImageError::InvalidToken {
                    index,
                    token: token.to_owned(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(words))
    }

    /// Renders the saved words as hex text.
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.to_string()
    }

    /// Writes the saved words as hex text.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::Io`] when the writer fails.
    pub fn write_hex<W: Write>(&self, mut out: W) -> Result<(), ImageError> {
        for word in self.saved_words() {
            writeln!(out, "{word:04x}")?;
        }
        out.flush()?;
        Ok(())
    }
}

impl fmt::Display for MemoryImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for word in self.saved_words() {
            writeln!(f, "{word:04x}")?;
        }
        Ok(())
    }
}
