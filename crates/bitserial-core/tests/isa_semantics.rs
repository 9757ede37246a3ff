//! Per-opcode execution semantics driven through the public stepping API.

use log as _;
use proptest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

use bitserial_core::{
    encode, run, step_one, BufferedConsole, CoreConfig, CoreState, MemoryImage, NullTrace,
    Opcode, RunState, StepOutcome, TraceEvent, TraceSink, CONSOLE_INPUT_EMPTY_BIT,
    CONSOLE_RECEIVE_BIT, CONSOLE_TRANSMIT_BIT, FLAG_CARRY, FLAG_HALT, FLAG_INDIRECT,
    FLAG_NEGATIVE, FLAG_PARITY, FLAG_RESET, FLAG_ROTATE, FLAG_ZERO,
};
use rstest::rstest;

fn core_with(words: &[u16], acc: u16, flags: u16) -> CoreState {
    let mut state = CoreState::from_image(&MemoryImage::new(words.to_vec()), &CoreConfig::default());
    state.set_acc(acc);
    state.set_flags(flags);
    state
}

fn single_step(word: u16, acc: u16, flags: u16) -> CoreState {
    let mut state = core_with(&[word], acc, flags);
    assert_eq!(
        state.step(&mut BufferedConsole::new()),
        StepOutcome::Continuing
    );
    state
}

#[rstest]
#[case::or(Opcode::Or, 0x0F0, 0x1200, 0x12F0)]
#[case::and_immediate_keeps_top_nibble(Opcode::And, 0x0F0, 0xA3C5, 0xA0C0)]
#[case::xor(Opcode::Xor, 0xFFF, 0x0F0F, 0x00F0)]
#[case::add(Opcode::Add, 0x001, 0x0001, 0x0002)]
#[case::lshift_by_popcount(Opcode::Lshift, 0x007, 0x0001, 0x0008)]
#[case::rshift_by_popcount(Opcode::Rshift, 0x101, 0x8000, 0x2000)]
#[case::literal(Opcode::Literal, 0xABC, 0xFFFF, 0x0ABC)]
#[case::reserved_is_noop(Opcode::Reserved, 0xABC, 0x1234, 0x1234)]
fn accumulator_ops(
    #[case] opcode: Opcode,
    #[case] operand: u16,
    #[case] acc: u16,
    #[case] expected: u16,
) {
    let state = single_step(encode(opcode, operand), acc, 0);
    assert_eq!(state.acc(), expected);
    assert_eq!(state.pc(), 1);
}

#[rstest]
#[case::plain_shift_left(Opcode::Lshift, 0, 0x8001, 0x0002)]
#[case::rotate_left(Opcode::Lshift, FLAG_ROTATE, 0x8001, 0x0003)]
#[case::plain_shift_right(Opcode::Rshift, 0, 0x8001, 0x4000)]
#[case::rotate_right(Opcode::Rshift, FLAG_ROTATE, 0x8001, 0xC000)]
fn rotate_mode_selects_shift_or_rotate(
    #[case] opcode: Opcode,
    #[case] flags: u16,
    #[case] acc: u16,
    #[case] expected: u16,
) {
    let state = single_step(encode(opcode, 0x001), acc, flags);
    assert_eq!(state.acc(), expected);
}

#[test]
fn add_overflow_sets_carry_and_next_add_consumes_it() {
    let state = single_step(encode(Opcode::Add, 0x001), 0xFFFF, 0);
    assert_eq!(state.acc(), 0x0000);
    assert!(state.regs.flag_is_set(FLAG_CARRY));

    let state = single_step(encode(Opcode::Add, 0x001), 0x0001, 0);
    assert_eq!(state.acc(), 0x0002);
    assert!(!state.regs.flag_is_set(FLAG_CARRY));
}

#[rstest]
#[case::zero(0x0000, FLAG_ZERO | FLAG_PARITY)]
#[case::negative_odd(0x8000, FLAG_NEGATIVE)]
#[case::negative_even(0xC000, FLAG_NEGATIVE | FLAG_PARITY)]
#[case::positive_odd(0x0001, 0)]
#[case::positive_even(0x0003, FLAG_PARITY)]
fn status_flags_come_from_accumulator_before_execution(#[case] acc: u16, #[case] status: u16) {
    let state = single_step(encode(Opcode::Literal, 0x001), acc, 0);
    assert_eq!(state.flags() & (FLAG_ZERO | FLAG_NEGATIVE | FLAG_PARITY), status);
}

#[test]
fn indirect_flag_switches_load_between_one_and_two_dereferences() {
    let mut words = vec![encode(Opcode::Load, 0x010)];
    words.resize(0x31, 0);
    words[0x010] = 0x0030;
    words[0x030] = 0x5A5A;

    let mut state = core_with(&words, 0, 0);
    state.step(&mut BufferedConsole::new());
    assert_eq!(state.acc(), 0x0030);

    let mut state = core_with(&words, 0, FLAG_INDIRECT);
    state.step(&mut BufferedConsole::new());
    assert_eq!(state.acc(), 0x5A5A);
}

#[test]
fn indirect_store_and_jump_use_pointer() {
    let mut words = vec![encode(Opcode::Store, 0x010), encode(Opcode::Jump, 0x011)];
    words.resize(0x12, 0);
    words[0x010] = 0x0200;
    words[0x011] = 0x0345;

    let mut state = core_with(&words, 0x0077, FLAG_INDIRECT);
    let mut console = BufferedConsole::new();
    state.step(&mut console);
    assert_eq!(state.peek(0x0200), 0x0077);
    state.step(&mut console);
    assert_eq!(state.pc(), 0x0345);
}

#[test]
fn load_direct_and_store_direct_reach_memory_without_io_bit() {
    let mut words = vec![encode(Opcode::LoadDirect, 0x020), encode(Opcode::StoreDirect, 0x021)];
    words.resize(0x21, 0);
    words[0x020] = 0x4242;

    let mut state = core_with(&words, 0, FLAG_INDIRECT);
    let mut console = BufferedConsole::new();
    state.step(&mut console);
    assert_eq!(state.acc(), 0x4242, "indirect flag does not apply");
    state.step(&mut console);
    assert_eq!(state.peek(0x021), 0x4242);
}

#[test]
fn switches_and_leds_share_port_zero() {
    let config = CoreConfig {
        switches: 0x00C3,
        ..CoreConfig::default()
    };
    let image = MemoryImage::new(vec![
        encode(Opcode::LoadDirect, 0x800),
        encode(Opcode::Xor, 0x0FF),
        encode(Opcode::StoreDirect, 0x800),
    ]);
    let mut state = CoreState::from_image(&image, &config);
    let outcome = state.run(&mut BufferedConsole::new(), Some(3));
    assert_eq!(outcome.cycles, 3);
    assert_eq!(state.leds(), 0x003C);
}

#[test]
fn console_echo_reads_status_receives_and_transmits() {
    let image = MemoryImage::new(vec![
        encode(Opcode::Get, 0x801),
        encode(Opcode::Literal, CONSOLE_RECEIVE_BIT),
        encode(Opcode::Set, 0x801),
        encode(Opcode::Get, 0x801),
        encode(Opcode::Set, 0x801),
    ]);
    let mut state = CoreState::from_image(&image, &CoreConfig::default());
    let mut console = BufferedConsole::with_input(b"k");

    state.step(&mut console);
    assert_eq!(state.acc(), 0, "input is ready before the first receive");
    state.run(&mut console, Some(3));
    assert_eq!(state.acc(), CONSOLE_INPUT_EMPTY_BIT | u16::from(b'k'));
    assert_eq!(state.ch(), u16::from(b'k'));

    state.set_acc(CONSOLE_TRANSMIT_BIT | state.ch());
    state.step(&mut console);
    assert_eq!(console.output(), b"k");
}

#[test]
fn get_and_set_flags_move_the_whole_register() {
    let image = MemoryImage::new(vec![
        encode(Opcode::Literal, FLAG_ROTATE | FLAG_CARRY),
        encode(Opcode::Set, 0x001),
        encode(Opcode::Get, 0x001),
    ]);
    let mut state = CoreState::from_image(&image, &CoreConfig::default());
    state.run(&mut BufferedConsole::new(), Some(3));
    assert_eq!(state.acc() & (FLAG_ROTATE | FLAG_CARRY), FLAG_ROTATE | FLAG_CARRY);
}

#[test]
fn reset_request_takes_effect_next_cycle_without_executing() {
    let image = MemoryImage::new(vec![
        encode(Opcode::Literal, FLAG_RESET),
        encode(Opcode::Set, 0x001),
        encode(Opcode::Literal, 0x0EE),
    ]);
    let mut state = CoreState::from_image(&image, &CoreConfig::default());
    let outcome = state.run(&mut BufferedConsole::new(), Some(3));
    assert_eq!(outcome.cycles, 3);
    assert_eq!((state.pc(), state.acc(), state.flags()), (0, 0, 0));
}

#[derive(Default)]
struct Collect(Vec<TraceEvent>);

impl TraceSink for Collect {
    fn on_event(&mut self, event: TraceEvent) {
        self.0.push(event);
    }
}

#[test]
fn trace_reports_cycle_starts_and_halt_in_order() {
    let mut state = core_with(
        &[encode(Opcode::Literal, FLAG_HALT), encode(Opcode::Set, 0x001)],
        0,
        0,
    );
    let mut sink = Collect::default();
    let outcome = run(&mut state, &mut BufferedConsole::new(), &mut sink, None);
    assert_eq!(outcome.final_step, StepOutcome::Halted);

    let starts: Vec<u16> = sink
        .0
        .iter()
        .filter_map(|event| match event {
            TraceEvent::InstructionStart { pc, .. } => Some(*pc),
            _ => None,
        })
        .collect();
    assert_eq!(starts, vec![0, 1, 2]);
    assert_eq!(sink.0.last(), Some(&TraceEvent::Halted { pc: 2 }));
}

#[test]
fn latched_fault_survives_until_reset() {
    let mut state = core_with(&[encode(Opcode::Set, 0x801)], CONSOLE_RECEIVE_BIT, 0);
    let mut console = BufferedConsole::with_input(b"x");
    console.set_fail_reads(true);

    let first = step_one(&mut state, &mut console, &mut NullTrace);
    assert!(matches!(first, StepOutcome::Fault { .. }));
    console.set_fail_reads(false);
    assert_eq!(step_one(&mut state, &mut console, &mut NullTrace), first);
    assert!(matches!(state.run_state, RunState::FaultLatched(_)));

    state.reset();
    state.set_acc(CONSOLE_RECEIVE_BIT);
    assert_eq!(state.step(&mut console), StepOutcome::Continuing);
    assert_eq!(state.ch(), u16::from(b'x'));
}
