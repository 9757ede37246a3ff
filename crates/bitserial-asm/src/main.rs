//! CLI entry point for the bit-serial assembler and runner.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bitserial_asm::{assemble, AssembleError, Assembly};
use bitserial_core::{
    disassemble, flags_summary, run, CoreConfig, CoreState, FaultCode, MemoryImage, MemorySize,
    NullTrace, StdConsole, StepOutcome, TraceEvent, TraceSink,
};
use log::{LevelFilter, Log, Metadata, Record};
#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
#[cfg(test)]
use tempfile as _;
use thiserror as _;

const USAGE_TEXT: &str = "\
Usage: bitserial <command> [options]

Commands:
  build <input> [-o <output>] [--verbose]  Assemble source to a hex image
  run   <input> [options]                  Load or assemble, then execute

Options:
  -o, --output <file>    Output image path (build default: input stem + .hex)
  -v, --verbose          Print listing, symbols and assembler log to stderr (build only)
      --asm              Treat the run input as assembly source
      --hex              Treat the run input as a hex image
  -c, --cycles <n>       Stop after n cycles (0 = no limit)
  -t, --trace            Trace every cycle and engine log records to stderr
      --switches <hex>   Initial switch positions

Examples:
  bitserial build echo.asm
  bitserial run echo.asm -t
  bitserial run echo.hex -c 1000
";

const EXIT_USAGE: i32 = 1;
const EXIT_READ: i32 = 2;
const EXIT_LOAD: i32 = 3;
const EXIT_ASSEMBLE: i32 = 4;
const EXIT_FAULT: i32 = 5;
const EXIT_SAVE: i32 = 6;

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Build(BuildArgs),
    Run(RunArgs),
}

#[derive(Debug, PartialEq, Eq)]
struct BuildArgs {
    input: PathBuf,
    output: Option<PathBuf>,
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputFormat {
    Assembly,
    Hex,
}

#[derive(Debug, PartialEq, Eq)]
struct RunArgs {
    input: PathBuf,
    format: Option<InputFormat>,
    output: Option<PathBuf>,
    max_cycles: Option<u64>,
    trace: bool,
    switches: u16,
}

#[derive(Debug)]
enum ParseResult {
    Command(Command),
    Help,
}

fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let first = args.next().ok_or_else(|| "missing command".to_string())?;

    if first == "--help" || first == "-h" {
        return Ok(ParseResult::Help);
    }

    let command_str = first.to_string_lossy().to_string();

    match command_str.as_str() {
        "build" => parse_build_args(args)
            .map(Command::Build)
            .map(ParseResult::Command),
        "run" => parse_run_args(args)
            .map(Command::Run)
            .map(ParseResult::Command),
        other => Err(format!("unknown command: {other}")),
    }
}

#[allow(clippy::while_let_on_iterator)]
fn parse_build_args(mut args: impl Iterator<Item = OsString>) -> Result<BuildArgs, String> {
    let mut input: Option<PathBuf> = None;
    let mut output: Option<PathBuf> = None;
    let mut verbose = false;

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Err(USAGE_TEXT.to_string());
        }

        if arg == "--verbose" || arg == "-v" {
            verbose = true;
            continue;
        }

        if arg == "-o" || arg == "--output" {
            let value = args
                .next()
                .ok_or_else(|| "missing value for -o".to_string())?;
            output = Some(PathBuf::from(value));
            continue;
        }

        if arg.to_string_lossy().starts_with('-') {
            return Err(format!("unknown option: {}", arg.to_string_lossy()));
        }

        if input.is_some() {
            return Err("multiple input paths provided".to_string());
        }
        input = Some(PathBuf::from(arg));
    }

    let input = input.ok_or_else(|| "missing input path".to_string())?;
    Ok(BuildArgs {
        input,
        output,
        verbose,
    })
}

#[allow(clippy::while_let_on_iterator)]
fn parse_run_args(mut args: impl Iterator<Item = OsString>) -> Result<RunArgs, String> {
    let mut input: Option<PathBuf> = None;
    let mut format: Option<InputFormat> = None;
    let mut output: Option<PathBuf> = None;
    let mut max_cycles: Option<u64> = None;
    let mut trace = false;
    let mut switches = 0u16;

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Err(USAGE_TEXT.to_string());
        }

        if arg == "--asm" || arg == "--hex" {
            let requested = if arg == "--asm" {
                InputFormat::Assembly
            } else {
                InputFormat::Hex
            };
            if format.is_some_and(|current| current != requested) {
                return Err("--asm and --hex are mutually exclusive".to_string());
            }
            format = Some(requested);
            continue;
        }

        if arg == "--trace" || arg == "-t" {
            trace = true;
            continue;
        }

        if arg == "-o" || arg == "--output" {
            let value = args
                .next()
                .ok_or_else(|| "missing value for -o".to_string())?;
            output = Some(PathBuf::from(value));
            continue;
        }

        if arg == "-c" || arg == "--cycles" {
            let value = args
                .next()
                .ok_or_else(|| "missing value for -c".to_string())?;
            let text = value.to_string_lossy();
            let count: u64 = text
                .parse()
                .map_err(|_| format!("invalid cycle count: {text}"))?;
            max_cycles = (count > 0).then_some(count);
            continue;
        }

        if arg == "--switches" {
            let value = args
                .next()
                .ok_or_else(|| "missing value for --switches".to_string())?;
            switches = parse_hex_u16(&value.to_string_lossy())?;
            continue;
        }

        if arg.to_string_lossy().starts_with('-') {
            return Err(format!("unknown option: {}", arg.to_string_lossy()));
        }

        if input.is_some() {
            return Err("multiple input paths provided".to_string());
        }
        input = Some(PathBuf::from(arg));
    }

    let input = input.ok_or_else(|| "missing input path".to_string())?;
    Ok(RunArgs {
        input,
        format,
        output,
        max_cycles,
        trace,
        switches,
    })
}

fn parse_hex_u16(text: &str) -> Result<u16, String> {
    let digits = text
        .strip_prefix('$')
        .or_else(|| text.strip_prefix("0x"))
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u16::from_str_radix(digits, 16).map_err(|_| format!("invalid hex value: {text}"))
}

fn input_format(path: &Path) -> InputFormat {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("asm" | "s") => InputFormat::Assembly,
        _ => InputFormat::Hex,
    }
}

fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("out");

    let parent = input.parent().unwrap_or_else(|| Path::new(""));

    parent.join(format!("{stem}.hex"))
}

fn read_source(path: &Path) -> Result<String, i32> {
    fs::read_to_string(path).map_err(|e| {
        eprintln!("error: failed to read {}: {e}", path.display());
        EXIT_READ
    })
}

fn assemble_source(path: &Path) -> Result<Assembly, i32> {
    let source = read_source(path)?;
    assemble(&source).map_err(|e| {
        report_assemble_error(path, &e);
        EXIT_ASSEMBLE
    })
}

fn report_assemble_error(path: &Path, e: &AssembleError) {
    eprintln!("{}: {}", path.display(), e.format_for_stderr());
}

fn save_image(image: &MemoryImage, path: &Path) -> Result<(), i32> {
    let file = fs::File::create(path).map_err(|e| {
        eprintln!("error: failed to write output: {e}");
        EXIT_SAVE
    })?;
    image.write_hex(io::BufWriter::new(file)).map_err(|e| {
        eprintln!("error: failed to write output: {e}");
        EXIT_SAVE
    })
}

/// Forwards library log records to stderr.
struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            eprintln!("{:<5} {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

fn install_logger(level: LevelFilter) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

fn run_build(args: BuildArgs) -> Result<(), i32> {
    if args.verbose {
        install_logger(LevelFilter::Debug);
    }

    let assembly = assemble_source(&args.input)?;

    let output_path = args
        .output
        .unwrap_or_else(|| default_output_path(&args.input));

    save_image(&assembly.image, &output_path)?;

    if args.verbose {
        print_listing(&assembly);
    }

    println!(
        "Assembled {} ({} words) -> {}",
        args.input.display(),
        assembly.image.saved_words().len(),
        output_path.display()
    );

    Ok(())
}

fn print_listing(assembly: &Assembly) {
    for row in assembly.listing() {
        eprintln!("{:04x}: {:04x}  {}", row.addr, row.raw, row.text());
    }

    if !assembly.symbols.is_empty() {
        eprintln!();
        for symbol in assembly.symbols.iter() {
            eprintln!("{:<16} {:<8} ${:04x}", symbol.name, symbol.kind, symbol.value);
        }
    }
}

fn load_image(args: &RunArgs) -> Result<MemoryImage, i32> {
    match args.format.unwrap_or_else(|| input_format(&args.input)) {
        InputFormat::Assembly => assemble_source(&args.input).map(|assembly| assembly.image),
        InputFormat::Hex => {
            let text = read_source(&args.input)?;
            MemoryImage::parse_hex(&text, MemorySize::default()).map_err(|e| {
                eprintln!("error: failed to load {}: {e}", args.input.display());
                EXIT_LOAD
            })
        }
    }
}

/// Prints one line per trace event to stderr.
struct StderrTrace;

impl TraceSink for StderrTrace {
    fn on_event(&mut self, event: TraceEvent) {
        match event {
            TraceEvent::InstructionStart {
                pc,
                raw_word,
                acc,
                flags,
            } => eprintln!(
                "{pc:04x}: {raw_word:04x}  {:<16} acc={acc:04x} flags={}",
                disassemble(raw_word),
                flags_summary(flags)
            ),
            TraceEvent::PortAccess {
                port,
                value,
                is_write,
            } => eprintln!(
                "      port {} {} {value:04x}",
                port.index(),
                if is_write { "<-" } else { "->" }
            ),
            TraceEvent::Reset { pc } => eprintln!("{pc:04x}: reset"),
            TraceEvent::Halted { pc } => eprintln!("{pc:04x}: halted"),
            TraceEvent::FaultRaised { cause, pc } => {
                eprintln!("{pc:04x}: fault 0x{:02x}: {cause}", cause.as_u8());
            }
        }
    }
}

fn fault_report(cause: FaultCode, state: &CoreState, cycles: u64) -> String {
    format!(
        "fault at {:04x} after {cycles} cycles: {cause} (acc={:04x} flags={})",
        state.pc(),
        state.acc(),
        flags_summary(state.flags())
    )
}

fn run_program(args: &RunArgs) -> Result<(), i32> {
    if args.trace {
        install_logger(LevelFilter::Debug);
    }

    let image = load_image(args)?;

    if let Some(output) = &args.output {
        save_image(&image, output)?;
    }

    let config = CoreConfig {
        memory_size: MemorySize::default(),
        switches: args.switches,
    };
    let mut state = CoreState::from_image(&image, &config);
    let mut console = StdConsole::stdio();

    let outcome = if args.trace {
        run(&mut state, &mut console, &mut StderrTrace, args.max_cycles)
    } else {
        run(&mut state, &mut console, &mut NullTrace, args.max_cycles)
    };

    if args.trace {
        eprintln!(
            "{} cycles, pc={:04x} acc={:04x} flags={} leds={:04x}",
            outcome.cycles,
            state.pc(),
            state.acc(),
            flags_summary(state.flags()),
            state.leds()
        );
    }

    match outcome.final_step {
        StepOutcome::Fault { cause } => {
            eprintln!("error: {}", fault_report(cause, &state, outcome.cycles));
            Err(EXIT_FAULT)
        }
        StepOutcome::Halted | StepOutcome::Continuing => Ok(()),
    }
}

fn main() {
    let exit_code = match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{USAGE_TEXT}");
            0
        }
        Ok(ParseResult::Command(Command::Build(args))) => match run_build(args) {
            Ok(()) => 0,
            Err(code) => code,
        },
        Ok(ParseResult::Command(Command::Run(args))) => match run_program(&args) {
            Ok(()) => 0,
            Err(code) => code,
        },
        Err(error) => {
            if error.starts_with("Usage:") {
                println!("{error}");
            } else {
                eprintln!("error: {error}");
                eprintln!("{USAGE_TEXT}");
            }
            EXIT_USAGE
        }
    };

    std::process::exit(exit_code);
}
