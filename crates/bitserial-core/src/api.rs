//! Public host-facing API for embedding the engine.

use crate::{
    execute, Console, FaultCode, Memory, MemoryImage, MemorySize, Port, PortBank, Registers,
    RunState,
};

/// Top-level configuration for a core instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CoreConfig {
    /// Memory capacity in words.
    pub memory_size: MemorySize,
    /// Initial switch positions presented on port 0.
    pub switches: u16,
}

/// Complete host-visible engine state.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CoreState {
    /// Program counter, accumulator and flags.
    pub regs: Registers,
    /// Code and data memory.
    pub memory: Memory,
    /// Memory-mapped port bank.
    pub ports: PortBank,
    /// Current execution state.
    pub run_state: RunState,
}

impl Default for CoreState {
    fn default() -> Self {
        Self::with_config(&CoreConfig::default())
    }
}

impl CoreState {
    /// Creates a powered-on engine with zeroed memory.
    #[must_use]
    pub fn with_config(config: &CoreConfig) -> Self {
        Self {
            regs: Registers::default(),
            memory: Memory::new(config.memory_size),
            ports: PortBank::new(config.switches),
            run_state: RunState::Running,
        }
    }

    /// Creates a powered-on engine with `image` loaded from address 0.
    #[must_use]
    pub fn from_image(image: &MemoryImage, config: &CoreConfig) -> Self {
        let mut state = Self::with_config(config);
        state.load_image(image);
        state
    }

    /// Copies `image` into memory from address 0. Cells past the image keep
    /// their contents; words past the capacity are dropped.
    pub fn load_image(&mut self, image: &MemoryImage) {
        self.memory.load(image.words());
    }

    /// Returns to power-on state: registers cleared, console latches cleared,
    /// any latched fault released. Memory and switches are kept.
    pub fn reset(&mut self) {
        self.regs = Registers::default();
        self.ports = PortBank::new(self.ports.switches());
        self.run_state = RunState::Running;
    }

    /// Program counter.
    #[must_use]
    pub const fn pc(&self) -> u16 {
        self.regs.pc()
    }

    /// Moves the program counter, wrapped to the memory size.
    pub fn set_pc(&mut self, value: u16) {
        self.regs.set_pc(self.memory.size().wrap(value));
    }

    /// Accumulator.
    #[must_use]
    pub const fn acc(&self) -> u16 {
        self.regs.acc()
    }

    /// Overwrites the accumulator.
    pub const fn set_acc(&mut self, value: u16) {
        self.regs.set_acc(value);
    }

    /// Flags register.
    #[must_use]
    pub const fn flags(&self) -> u16 {
        self.regs.flags()
    }

    /// Overwrites the flags register.
    pub const fn set_flags(&mut self, value: u16) {
        self.regs.set_flags(value);
    }

    /// Reads a memory word (address wrapped).
    #[must_use]
    pub fn peek(&self, addr: u16) -> u16 {
        self.memory.read(addr)
    }

    /// Writes a memory word (address wrapped).
    pub fn poke(&mut self, addr: u16, value: u16) {
        self.memory.write(addr, value);
    }

    /// Changes the switch positions seen on port 0.
    pub const fn set_switches(&mut self, value: u16) {
        self.ports.set_switches(value);
    }

    /// Last value the program wrote to the LEDs.
    #[must_use]
    pub const fn leds(&self) -> u16 {
        self.ports.leds()
    }

    /// Last received console byte, or `0xFFFF` once input has ended.
    #[must_use]
    pub const fn ch(&self) -> u16 {
        self.ports.ch()
    }

    /// Returns `true` once the Halt flag has been observed.
    #[must_use]
    pub const fn is_halted(&self) -> bool {
        matches!(self.run_state, RunState::Halted)
    }

    /// Runs one cycle without tracing.
    pub fn step(&mut self, console: &mut dyn Console) -> StepOutcome {
        execute::step_one(self, console, &mut NullTrace)
    }

    /// Runs until halt, fault, or the cycle budget is spent, without tracing.
    pub fn run(&mut self, console: &mut dyn Console, max_cycles: Option<u64>) -> RunOutcome {
        execute::run(self, console, &mut NullTrace, max_cycles)
    }
}

/// Output status from one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepOutcome {
    /// The cycle executed an instruction or a reset.
    Continuing,
    /// The Halt flag is set; nothing executed.
    Halted,
    /// A fault was raised or is still latched.
    Fault {
        /// Latched fault code.
        cause: FaultCode,
    },
}

/// Aggregated outcome of [`CoreState::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunOutcome {
    /// Executed and reset cycles during this call.
    pub cycles: u64,
    /// Last step-level status; `Continuing` when the budget ran out.
    pub final_step: StepOutcome,
}

/// Deterministic trace events emitted in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceEvent {
    /// Cycle start, after status flags are derived.
    InstructionStart {
        /// Address of the fetched word.
        pc: u16,
        /// Fetched instruction word.
        raw_word: u16,
        /// Accumulator before execution.
        acc: u16,
        /// Flags before execution.
        flags: u16,
    },
    /// Port-bank access.
    PortAccess {
        /// Register accessed.
        port: Port,
        /// Value read or written.
        value: u16,
        /// True for writes.
        is_write: bool,
    },
    /// The Reset flag cleared the registers.
    Reset {
        /// Program counter before the reset.
        pc: u16,
    },
    /// The Halt flag was observed.
    Halted {
        /// Program counter at halt.
        pc: u16,
    },
    /// A console fault was raised.
    FaultRaised {
        /// Raised fault code.
        cause: FaultCode,
        /// Address of the faulting instruction.
        pc: u16,
    },
}

/// Sink trait for deterministic trace hooks.
pub trait TraceSink {
    /// Records an event in execution order.
    fn on_event(&mut self, event: TraceEvent);
}

/// Sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTrace;

impl TraceSink for NullTrace {
    fn on_event(&mut self, _event: TraceEvent) {}
}
