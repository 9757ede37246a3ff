//! Core execution engine for the bit-serial word machine.

/// Word memory, memory sizing, and address translation.
pub mod memory;
pub use memory::{
    translate, virtual_address, Address, Memory, MemorySize, Port, IO_SELECT_BIT, OPERAND_MASK,
    PORT_SELECT_MASK, VIRTUAL_IO_BIT,
};

/// Public host-facing API contract and integration types.
pub mod api;
pub use api::{CoreConfig, CoreState, NullTrace, RunOutcome, StepOutcome, TraceEvent, TraceSink};

/// Architectural register and run-state model.
pub mod state;
pub use state::{
    Registers, RunState, FLAG_CARRY, FLAG_HALT, FLAG_INDIRECT, FLAG_NEGATIVE, FLAG_PARITY,
    FLAG_RESET, FLAG_ROTATE, FLAG_STATUS_MASK, FLAG_ZERO,
};

/// Opcode table and operand classes.
pub mod encoding;
pub use encoding::{encode, Opcode, OperandClass, OpcodeInfo, OPCODE_TABLE};

/// Instruction word decoding.
pub mod decoder;
pub use decoder::{DecodedInstruction, Decoder, SystemTarget};

/// Execution fault taxonomy.
pub mod fault;
pub use fault::FaultCode;

/// Instruction execution pipeline.
pub mod execute;
pub use execute::{
    commit_execution, execute_instruction, run, step_one, ExecuteOutcome, ExecuteState,
};

/// Memory-mapped port bank and console transport.
pub mod peripherals;
pub use peripherals::{
    BufferedConsole, Console, ConsoleError, PortBank, PortWrite, StdConsole,
    CONSOLE_INPUT_EMPTY_BIT, CONSOLE_RECEIVE_BIT, CONSOLE_TRANSMIT_BIT, INPUT_CLOSED,
};

/// Hex-text memory image load/save.
pub mod image;
pub use image::{ImageError, MemoryImage};

/// Instruction disassembly.
pub mod disasm;
pub use disasm::{disassemble, disassemble_range, flags_summary, DisassemblyRow};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
