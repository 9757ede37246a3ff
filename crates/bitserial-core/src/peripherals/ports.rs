//! Switches, LEDs and console registers.

use log::warn;

use super::console::Console;
use crate::memory::Port;
use crate::FaultCode;

/// Console write bit: transmit the low byte.
pub const CONSOLE_TRANSMIT_BIT: u16 = 1 << 13;
/// Console write bit: receive one byte into `ch`.
pub const CONSOLE_RECEIVE_BIT: u16 = 1 << 10;
/// Console read bit: set when no input is ready.
pub const CONSOLE_INPUT_EMPTY_BIT: u16 = 1 << 8;
/// Value stored in `ch` once the input stream has ended.
pub const INPUT_CLOSED: u16 = 0xFFFF;

/// Result of a port write that did not fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortWrite {
    /// The register accepted the value.
    Applied,
    /// Reserved or unassigned register; nothing happened.
    Ignored,
    /// A receive request hit the end of input; the engine halts.
    InputClosed,
}

/// Port-bank register state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct PortBank {
    switches: u16,
    leds: u16,
    ch: u16,
}

impl PortBank {
    /// Port bank with the given switch positions.
    #[must_use]
    pub const fn new(switches: u16) -> Self {
        Self {
            switches,
            leds: 0,
            ch: 0,
        }
    }

    /// External switch positions.
    #[must_use]
    pub const fn switches(&self) -> u16 {
        self.switches
    }

    /// Changes the external switch positions.
    pub const fn set_switches(&mut self, value: u16) {
        self.switches = value;
    }

    /// Last value written to the LEDs.
    #[must_use]
    pub const fn leds(&self) -> u16 {
        self.leds
    }

    /// Last received input byte, or [`INPUT_CLOSED`].
    #[must_use]
    pub const fn ch(&self) -> u16 {
        self.ch
    }

    /// Reads a port register.
    pub fn read(&self, port: Port, console: &mut dyn Console) -> u16 {
        match port {
            Port::Switches => self.switches,
            Port::Console => {
                let empty = if console.input_ready() {
                    0
                } else {
                    CONSOLE_INPUT_EMPTY_BIT
                };
                empty | (self.ch & 0x00FF)
            }
            Port::TxControl | Port::RxControl | Port::UartControl | Port::Unassigned(_) => 0,
        }
    }

    /// Writes a port register, performing any console transfer it requests.
    ///
    /// # Errors
    ///
    /// Returns the console fault when the transmit or receive fails.
    pub fn write(
        &mut self,
        port: Port,
        value: u16,
        console: &mut dyn Console,
    ) -> Result<PortWrite, FaultCode> {
        match port {
            Port::Switches => {
                self.leds = value;
                Ok(PortWrite::Applied)
            }
            Port::Console => self.write_console(value, console),
            Port::TxControl | Port::RxControl | Port::UartControl | Port::Unassigned(_) => {
                Ok(PortWrite::Ignored)
            }
        }
    }

    fn write_console(
        &mut self,
        value: u16,
        console: &mut dyn Console,
    ) -> Result<PortWrite, FaultCode> {
        if value & CONSOLE_TRANSMIT_BIT != 0 {
            let [_, byte] = value.to_be_bytes();
            console.write_byte(byte).map_err(|e| {
                warn!("{e}");
                FaultCode::ConsoleWriteFailed
            })?;
        }
        if value & CONSOLE_RECEIVE_BIT != 0 {
            match console.read_byte() {
                Ok(Some(byte)) => self.ch = u16::from(byte),
                Ok(None) => {
                    warn!("console input closed");
                    self.ch = INPUT_CLOSED;
                    return Ok(PortWrite::InputClosed);
                }
                Err(e) => {
                    warn!("{e}");
                    return Err(FaultCode::ConsoleReadFailed);
                }
            }
        }
        Ok(PortWrite::Applied)
    }
}
