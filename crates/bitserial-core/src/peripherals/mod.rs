//! Port-bank devices reachable through the memory-mapped I/O region.

/// Console transport trait and stock implementations.
pub mod console;
/// Switches, LEDs and console registers.
pub mod ports;

pub use console::{BufferedConsole, Console, ConsoleError, StdConsole};
pub use ports::{
    PortBank, PortWrite, CONSOLE_INPUT_EMPTY_BIT, CONSOLE_RECEIVE_BIT, CONSOLE_TRANSMIT_BIT,
    INPUT_CLOSED,
};
