use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;

use tmsim::{Compilation, DemoLibrary, Machine, ProgramLoader, StepResult, Variant};

/// Steps executed per batch before yielding back to the outer loop.
const BATCH_SIZE: usize = 25;

#[derive(Parser)]
#[clap(author, version, about = "Turing machine interpreter", long_about = None, arg_required_else_help = true)]
struct Cli {
    /// Rule program file to execute
    #[clap(short, long, conflicts_with = "demo")]
    program: Option<PathBuf>,

    /// Embedded demo program to execute (see --list)
    #[clap(short, long)]
    demo: Option<String>,

    /// List embedded demo programs and exit
    #[clap(long)]
    list: bool,

    /// Initial tape contents; a '*' marks the head position
    #[clap(short, long)]
    tape: Option<String>,

    /// Initial state
    #[clap(short, long, default_value = "0")]
    state: String,

    /// Machine variant
    #[clap(short, long, value_enum, default_value_t = VariantArg::Standard)]
    variant: VariantArg,

    /// Stop after this many steps
    #[clap(long, default_value_t = 10_000)]
    max_steps: usize,

    /// Undo entries the machine retains; 0 disables undo recording
    #[clap(long, default_value_t = 10)]
    undo_capacity: usize,

    /// Report breakpoints but keep running
    #[clap(long)]
    ignore_breakpoints: bool,

    /// Print the machine configuration after every step
    #[clap(long)]
    trace: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum VariantArg {
    Standard,
    LeftBounded,
    Nondeterministic,
}

impl From<VariantArg> for Variant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Standard => Variant::Standard,
            VariantArg::LeftBounded => Variant::LeftBounded,
            VariantArg::Nondeterministic => Variant::Nondeterministic,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let variant = Variant::from(cli.variant);

    if cli.list {
        for name in DemoLibrary::names() {
            println!("{name}");
        }
        return ExitCode::SUCCESS;
    }

    let (loaded, default_tape) = if let Some(path) = &cli.program {
        match ProgramLoader::load(path, variant) {
            Ok(loaded) => {
                let default_tape = loaded.initial_tape.clone();
                (loaded, default_tape)
            }
            Err(e) => {
                eprintln!("{e}");
                return ExitCode::FAILURE;
            }
        }
    } else if let Some(name) = &cli.demo {
        match DemoLibrary::find(name) {
            Ok(demo) => (
                ProgramLoader::from_source(demo.source.to_string(), variant),
                Some(demo.initial_tape),
            ),
            Err(e) => {
                eprintln!("{e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        eprintln!("either --program or --demo is required");
        return ExitCode::FAILURE;
    };

    let Compilation {
        table, diagnostics, ..
    } = loaded.compilation;
    for diagnostic in &diagnostics {
        eprintln!("{diagnostic}");
    }

    let initial_tape = cli
        .tape
        .clone()
        .or(default_tape)
        .unwrap_or_default();
    let mut machine = Machine::new(table, variant);
    machine.set_undo_capacity(cli.undo_capacity);
    machine.reset(&initial_tape, &cli.state);

    run(&mut machine, &cli);

    println!(
        "state: {}  steps: {}  head: {}",
        machine.state(),
        machine.steps(),
        machine.head_position()
    );
    println!("tape: {}", tape_line(&machine));
    ExitCode::SUCCESS
}

/// Drives the machine in bounded batches until it halts, pauses, or runs
/// out of steps. Running is caller policy; the machine itself only steps.
fn run(machine: &mut Machine, cli: &Cli) {
    while machine.steps() < cli.max_steps {
        let batch = BATCH_SIZE.min(cli.max_steps - machine.steps());
        for _ in 0..batch {
            match machine.step() {
                StepResult::Continue => {
                    if cli.trace {
                        print_configuration(machine);
                    }
                }
                StepResult::Breakpoint { line } => {
                    if cli.trace {
                        print_configuration(machine);
                    }
                    println!("Stopped at breakpoint on line {}", line + 1);
                    if !cli.ignore_breakpoints {
                        return;
                    }
                }
                StepResult::Halted(cause) => {
                    println!("{cause}");
                    return;
                }
                StepResult::AlreadyHalted => return,
            }
        }
    }
    println!("Stopped after {} steps", machine.steps());
}

fn print_configuration(machine: &Machine) {
    println!(
        "{:>6}  {:<12} {}",
        machine.steps(),
        machine.state(),
        tape_line(machine)
    );
}

/// The tape window around the head, with the head cell bracketed.
fn tape_line(machine: &Machine) -> String {
    let head = machine.head_position();
    let tape = machine.tape();
    let from = head.min(tape.offset()).max(head - 30);
    let to = (tape.offset() + tape.len() as i64).max(head + 1).min(head + 31);
    let mut line = String::new();
    for position in from..to {
        if position == head {
            line.push('[');
            line.push(tape.read(position));
            line.push(']');
        } else {
            line.push(tape.read(position));
        }
    }
    line
}
