//! Architectural CPU state model primitives.

/// Register file and flag bit layout.
pub mod registers;

pub use registers::{
    Registers, FLAG_CARRY, FLAG_HALT, FLAG_INDIRECT, FLAG_NEGATIVE, FLAG_PARITY, FLAG_RESET,
    FLAG_ROTATE, FLAG_STATUS_MASK, FLAG_ZERO,
};
use crate::FaultCode;

/// Host-observable execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RunState {
    /// Ready to execute the next instruction.
    #[default]
    Running,
    /// The Halt flag was observed; stepping again re-checks the flag.
    Halted,
    /// A console fault is latched until the core is reset.
    FaultLatched(FaultCode),
}

impl RunState {
    /// Returns the currently latched fault, if any.
    #[must_use]
    pub const fn latched_fault(self) -> Option<FaultCode> {
        match self {
            Self::FaultLatched(cause) => Some(cause),
            Self::Running | Self::Halted => None,
        }
    }
}
