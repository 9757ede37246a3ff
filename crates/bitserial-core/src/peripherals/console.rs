//! Console byte transport.
//!
//! The engine never touches a terminal directly. Hosts hand it a
//! [`Console`]; raw-mode handling and keyboard polling stay on the host
//! side behind [`Console::input_ready`].

use std::collections::VecDeque;
use std::io::{self, Read, Write};

use thiserror::Error;

/// Console transport failure.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// The output stream rejected a byte.
    #[error("console write failed: {0}")]
    Write(#[source] io::Error),
    /// The input stream failed while reading a byte.
    #[error("console read failed: {0}")]
    Read(#[source] io::Error),
}

/// Byte-oriented console consumed by the port bank.
pub trait Console {
    /// Writes one byte to the output stream.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Write`] when the byte cannot be delivered.
    fn write_byte(&mut self, byte: u8) -> Result<(), ConsoleError>;

    /// Reads one byte, blocking until one is available. `Ok(None)` means the
    /// input stream has ended.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Read`] when the input stream fails.
    fn read_byte(&mut self) -> Result<Option<u8>, ConsoleError>;

    /// Returns `true` when a read would not block.
    fn input_ready(&mut self) -> bool;
}

/// Console over arbitrary blocking reader/writer streams.
///
/// Input is always reported ready, which is the behavior of a
/// non-interactive stream.
#[derive(Debug)]
pub struct StdConsole<R, W> {
    input: R,
    output: W,
}

impl<R: Read, W: Write> StdConsole<R, W> {
    /// Wraps an input and output stream.
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Releases the wrapped streams.
    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }
}

impl StdConsole<io::Stdin, io::Stdout> {
    /// Console bound to the process's stdin and stdout.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::stdin(), io::stdout())
    }
}

impl<R: Read, W: Write> Console for StdConsole<R, W> {
    fn write_byte(&mut self, byte: u8) -> Result<(), ConsoleError> {
        self.output.write_all(&[byte]).map_err(ConsoleError::Write)?;
        self.output.flush().map_err(ConsoleError::Write)
    }

    fn read_byte(&mut self) -> Result<Option<u8>, ConsoleError> {
        let mut buf = [0u8; 1];
        loop {
            match self.input.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(ConsoleError::Read(e)),
            }
        }
    }

    fn input_ready(&mut self) -> bool {
        true
    }
}

/// In-memory console with scripted input and captured output.
#[derive(Debug, Clone, Default)]
pub struct BufferedConsole {
    input: VecDeque<u8>,
    output: Vec<u8>,
    fail_writes: bool,
    fail_reads: bool,
}

impl BufferedConsole {
    /// Empty console: no pending input, no output.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Console whose input stream yields `bytes` and then ends.
    #[must_use]
    pub fn with_input(bytes: &[u8]) -> Self {
        Self {
            input: bytes.iter().copied().collect(),
            ..Self::default()
        }
    }

    /// Appends bytes to the pending input.
    pub fn push_input(&mut self, bytes: &[u8]) {
        self.input.extend(bytes.iter().copied());
    }

    /// Bytes written so far.
    #[must_use]
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Takes the captured output, leaving the buffer empty.
    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }

    /// Makes every subsequent write fail.
    pub const fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Makes every subsequent read fail.
    pub const fn set_fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }
}

impl Console for BufferedConsole {
    fn write_byte(&mut self, byte: u8) -> Result<(), ConsoleError> {
        if self.fail_writes {
            return Err(ConsoleError::Write(io::Error::other("output closed")));
        }
        self.output.push(byte);
        Ok(())
    }

    fn read_byte(&mut self) -> Result<Option<u8>, ConsoleError> {
        if self.fail_reads {
            return Err(ConsoleError::Read(io::Error::other("input broken")));
        }
        Ok(self.input.pop_front())
    }

    fn input_ready(&mut self) -> bool {
        !self.input.is_empty()
    }
}
