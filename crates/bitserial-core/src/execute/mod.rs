//! Instruction execution pipeline.
//!
//! A cycle is split in two: [`execute_instruction`] computes every register
//! and memory effect into an [`ExecuteState`] without touching the
//! architectural state, and [`commit_execution`] applies it. A console
//! fault therefore leaves pc, acc, flags and memory exactly as they were.

mod alu;
mod flags;

pub use alu::{add_with_carry, and_mask, shift_count, shift_left, shift_right};
pub use flags::derive_status_flags;

use log::{debug, warn};

use crate::decoder::{DecodedInstruction, SystemTarget};
use crate::memory::{translate, Address, Port};
use crate::peripherals::PortWrite;
use crate::state::{FLAG_CARRY, FLAG_HALT, FLAG_INDIRECT, FLAG_RESET, FLAG_ROTATE};
use crate::{
    Console, CoreState, Decoder, FaultCode, Opcode, RunOutcome, RunState, StepOutcome,
    TraceEvent, TraceSink,
};

/// Outcome of executing a single instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecuteOutcome {
    /// Instruction completed; its effects are ready to commit.
    Retired,
    /// Console transport failed; nothing may be committed.
    Fault {
        /// Fault code.
        cause: FaultCode,
    },
}

/// Register and memory effects of one instruction, pending commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecuteState {
    /// Program counter after the instruction.
    pub next_pc: u16,
    /// Accumulator after the instruction.
    pub acc: u16,
    /// Flags after the instruction.
    pub flags: u16,
    /// Pending memory write as `(address, value)`.
    pub memory_write: Option<(u16, u16)>,
}

impl ExecuteState {
    /// Effects of an instruction that changes nothing but the program counter.
    #[must_use]
    pub const fn new(next_pc: u16, acc: u16, flags: u16) -> Self {
        Self {
            next_pc,
            acc,
            flags,
            memory_write: None,
        }
    }
}

/// Executes one decoded instruction against `state`.
///
/// `state` must already hold the cycle's derived status flags, and its pc
/// must still address the instruction. Port-bank side effects happen here;
/// everything else is returned for [`commit_execution`].
pub fn execute_instruction(
    instr: &DecodedInstruction,
    state: &mut CoreState,
    console: &mut dyn Console,
    sink: &mut dyn TraceSink,
) -> (ExecuteOutcome, ExecuteState) {
    let size = state.memory.size();
    let pc = state.regs.pc();
    let acc = state.regs.acc();
    let flags = state.regs.flags();
    let indirect = instr.honors_indirect() && flags & FLAG_INDIRECT != 0;
    let lop = if indirect {
        state.memory.read(instr.operand)
    } else {
        instr.operand
    };
    let rotate = flags & FLAG_ROTATE != 0;

    let mut exec = ExecuteState::new(size.wrap(pc.wrapping_add(1)), acc, flags);

    match instr.opcode {
        Opcode::Or => exec.acc = acc | lop,
        Opcode::And => exec.acc = acc & and_mask(lop, indirect),
        Opcode::Xor => exec.acc = acc ^ lop,
        Opcode::Add => {
            let (sum, carry) = add_with_carry(acc, lop, flags & FLAG_CARRY != 0);
            exec.acc = sum;
            exec.flags = if carry {
                flags | FLAG_CARRY
            } else {
                flags & !FLAG_CARRY
            };
        }
        Opcode::Lshift => exec.acc = shift_left(acc, shift_count(lop), rotate),
        Opcode::Rshift => exec.acc = shift_right(acc, shift_count(lop), rotate),
        Opcode::Load => exec.acc = state.memory.read(lop),
        Opcode::Store => exec.memory_write = Some((size.wrap(lop), acc)),
        Opcode::LoadDirect => match translate(instr.operand, size) {
            Address::Memory(addr) => exec.acc = state.memory.read(addr),
            Address::Port(port) => exec.acc = read_port(state, port, console, sink),
        },
        Opcode::StoreDirect => match translate(instr.operand, size) {
            Address::Memory(addr) => exec.memory_write = Some((addr, acc)),
            Address::Port(port) => {
                if let Err(cause) = write_port(state, port, acc, console, sink, &mut exec) {
                    return (ExecuteOutcome::Fault { cause }, exec);
                }
            }
        },
        Opcode::Literal => exec.acc = instr.operand,
        Opcode::Reserved => {}
        Opcode::Jump => exec.next_pc = size.wrap(lop),
        Opcode::Jumpz => {
            if acc == 0 {
                exec.next_pc = size.wrap(lop);
            }
        }
        Opcode::Set => match instr.system_target() {
            SystemTarget::Port(port) => {
                if let Err(cause) = write_port(state, port, acc, console, sink, &mut exec) {
                    return (ExecuteOutcome::Fault { cause }, exec);
                }
            }
            SystemTarget::Flags => exec.flags = acc,
            SystemTarget::ProgramCounter => exec.next_pc = size.wrap(acc),
        },
        Opcode::Get => match instr.system_target() {
            SystemTarget::Port(port) => exec.acc = read_port(state, port, console, sink),
            SystemTarget::Flags => exec.acc = flags,
            SystemTarget::ProgramCounter => exec.acc = pc,
        },
    }

    (ExecuteOutcome::Retired, exec)
}

fn read_port(
    state: &CoreState,
    port: Port,
    console: &mut dyn Console,
    sink: &mut dyn TraceSink,
) -> u16 {
    let value = state.ports.read(port, console);
    sink.on_event(TraceEvent::PortAccess {
        port,
        value,
        is_write: false,
    });
    value
}

fn write_port(
    state: &mut CoreState,
    port: Port,
    value: u16,
    console: &mut dyn Console,
    sink: &mut dyn TraceSink,
    exec: &mut ExecuteState,
) -> Result<(), FaultCode> {
    let result = state.ports.write(port, value, console)?;
    sink.on_event(TraceEvent::PortAccess {
        port,
        value,
        is_write: true,
    });
    if result == PortWrite::InputClosed {
        exec.flags |= FLAG_HALT;
    }
    Ok(())
}

/// Applies the effects computed by [`execute_instruction`].
pub fn commit_execution(state: &mut CoreState, exec: &ExecuteState) {
    state.regs.set_pc(exec.next_pc);
    state.regs.set_acc(exec.acc);
    state.regs.set_flags(exec.flags);
    if let Some((addr, value)) = exec.memory_write {
        state.memory.write(addr, value);
    }
}

/// Runs one machine cycle.
///
/// Order: fetch, derive status flags, check Halt, check Reset, execute,
/// commit. A latched fault short-circuits the cycle until the state is
/// reset.
pub fn step_one(
    state: &mut CoreState,
    console: &mut dyn Console,
    sink: &mut dyn TraceSink,
) -> StepOutcome {
    if let RunState::FaultLatched(cause) = state.run_state {
        return StepOutcome::Fault { cause };
    }

    let pc = state.regs.pc();
    let raw_word = state.memory.read(pc);
    let instruction = Decoder::decode(raw_word);

    let flags = derive_status_flags(state.regs.flags(), state.regs.acc());
    state.regs.set_flags(flags);
    sink.on_event(TraceEvent::InstructionStart {
        pc,
        raw_word,
        acc: state.regs.acc(),
        flags,
    });

    if flags & FLAG_HALT != 0 {
        state.run_state = RunState::Halted;
        sink.on_event(TraceEvent::Halted { pc });
        return StepOutcome::Halted;
    }
    state.run_state = RunState::Running;

    if flags & FLAG_RESET != 0 {
        debug!("reset requested at pc {pc:04x}");
        state.regs.set_pc(0);
        state.regs.set_acc(0);
        state.regs.set_flags(0);
        sink.on_event(TraceEvent::Reset { pc });
        return StepOutcome::Continuing;
    }

    let (outcome, exec_state) = execute_instruction(&instruction, state, console, sink);
    match outcome {
        ExecuteOutcome::Retired => {
            commit_execution(state, &exec_state);
            StepOutcome::Continuing
        }
        ExecuteOutcome::Fault { cause } => {
            warn!("fault latched at pc {pc:04x}: {cause}");
            state.run_state = RunState::FaultLatched(cause);
            sink.on_event(TraceEvent::FaultRaised { cause, pc });
            StepOutcome::Fault { cause }
        }
    }
}

/// Steps until the engine halts, faults, or `max_cycles` cycles have run.
///
/// `None` runs without a budget. Only executed and reset cycles count;
/// observing Halt or a fault does not.
pub fn run(
    state: &mut CoreState,
    console: &mut dyn Console,
    sink: &mut dyn TraceSink,
    max_cycles: Option<u64>,
) -> RunOutcome {
    let mut cycles = 0u64;
    loop {
        if max_cycles.is_some_and(|limit| cycles >= limit) {
            return RunOutcome {
                cycles,
                final_step: StepOutcome::Continuing,
            };
        }
        match step_one(state, console, sink) {
            StepOutcome::Continuing => cycles += 1,
            final_step => return RunOutcome { cycles, final_step },
        }
    }
}
