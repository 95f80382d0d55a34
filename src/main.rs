use std::ffi::OsStr;
use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use console::{Key, Term};
use log::LevelFilter;
use miette::{bail, IntoDiagnostic, Result};

use stackasm::{lexer, Output, Program, RunEnvironment};

/// Stackasm assembles and runs programs for a small stack-oriented CPU.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Quickly provide a `.asm` file to run
    path: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Run text `.asm` or compiled `.bin` file and print the final machine state
    Run {
        /// `.asm` or `.bin` file to run
        name: PathBuf,
        /// Produce minimal output, suited for blackbox tests
        #[arg(short, long)]
        minimal: bool,
        /// Stop after this many instructions
        #[arg(short, long)]
        limit: Option<u64>,
        /// Depth of the operand stack
        #[arg(short, long)]
        stack_size: Option<usize>,
    },
    /// Execute one instruction at a time, showing state after each
    Step {
        /// `.asm` or `.bin` file to step through
        name: PathBuf,
        /// Produce minimal output, suited for blackbox tests
        #[arg(short, long)]
        minimal: bool,
        /// Stop after this many instructions
        #[arg(short, long)]
        limit: Option<u64>,
        /// Depth of the operand stack
        #[arg(short, long)]
        stack_size: Option<usize>,
    },
    /// Create `.bin` listing of instruction words to run later
    Compile {
        /// `.asm` file to compile
        name: PathBuf,
        /// Destination to output `.bin` file
        dest: Option<PathBuf>,
    },
    /// Check a `.asm` file without running or outputting binary
    Check {
        /// File to check
        name: PathBuf,
    },
}

fn main() -> miette::Result<()> {
    use MsgColor::*;
    let args = Args::parse();

    let level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
    stackasm::env::init();

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new() //
                .context_lines(stackasm::DIAGNOSTIC_CONTEXT_LINES)
                .build(),
        )
    }))?;

    let Some(command) = args.command else {
        return match args.path {
            Some(path) => run(&path, false, None, None),
            None => {
                println!("\n~ stackasm v{VERSION} ~");
                println!("{SHORT_INFO}");
                Ok(())
            }
        };
    };

    match command {
        Command::Run {
            name,
            minimal,
            limit,
            stack_size,
        } => run(&name, minimal, limit, stack_size),
        Command::Step {
            name,
            minimal,
            limit,
            stack_size,
        } => step(&name, minimal, limit, stack_size),
        Command::Compile { name, dest } => {
            file_message(Green, "Assembling", &name);
            let program = assemble(&name)?;

            let out_file_name = dest.unwrap_or_else(|| name.with_extension("bin"));
            fs::write(&out_file_name, program.to_bits()).into_diagnostic()?;

            message(Green, "Finished", &format!("emit {} words", program.len()));
            file_message(Green, "Saved", &out_file_name);
            Ok(())
        }
        Command::Check { name } => {
            file_message(Green, "Checking", &name);
            let _ = assemble(&name)?;
            message(Green, "Success", "no errors found!");
            Ok(())
        }
    }
}

#[allow(unused)]
enum MsgColor {
    Green,
    Cyan,
    Red,
}

fn file_message(color: MsgColor, left: &str, right: &Path) {
    let right = format!("target {}", right.display());
    message(color, left, &right);
}

fn message(color: MsgColor, left: &str, right: &str) {
    let left = match color {
        MsgColor::Green => left.green(),
        MsgColor::Cyan => left.cyan(),
        MsgColor::Red => left.red(),
    };
    println!("{left:>12} {right}");
}

fn run(name: &Path, minimal: bool, limit: Option<u64>, stack_size: Option<usize>) -> Result<()> {
    let mut env = load(name, stack_size)?;
    let out = Output::new(minimal);

    message(MsgColor::Green, "Running", "loaded program");
    match limit {
        Some(limit) => {
            if !env.run_for(limit) {
                message(MsgColor::Cyan, "Stopped", &format!("after {limit} steps"));
            }
        }
        None => env.run(),
    }
    out.print_state(&env);
    report_fault(&env);

    file_message(MsgColor::Green, "Completed", name);
    Ok(())
}

fn step(name: &Path, minimal: bool, limit: Option<u64>, stack_size: Option<usize>) -> Result<()> {
    let mut env = load(name, stack_size)?;
    let out = Output::new(minimal);
    let term = Term::stdout();
    let interactive = std::io::stdin().is_terminal() && term.is_term();

    if interactive {
        message(
            MsgColor::Cyan,
            "Help",
            "enter/space to step, c to continue, r to reset, q to quit",
        );
    }

    let mut steps = 0;
    let mut continuing = !interactive;
    while !env.is_halted() && limit.map_or(true, |limit| steps < limit) {
        out.print_step(&env);
        if !continuing {
            match term.read_key().into_diagnostic()? {
                Key::Char('c') => continuing = true,
                Key::Char('r') => {
                    env.reset();
                    steps = 0;
                    message(MsgColor::Cyan, "Reset", "back to the first instruction");
                    continue;
                }
                Key::Char('q') | Key::Escape => {
                    message(MsgColor::Cyan, "Quit", &format!("after {steps} steps"));
                    return Ok(());
                }
                Key::Enter | Key::Char(' ') => (),
                _ => continue,
            }
        }
        env.step();
        steps += 1;
        out.print_state(&env);
    }
    report_fault(&env);

    file_message(MsgColor::Green, "Completed", name);
    Ok(())
}

fn report_fault(env: &RunEnvironment) {
    if let Some(fault) = env.fault() {
        message(MsgColor::Red, "Halted", &fault.to_string());
    }
}

/// Load source text or a compiled listing, chosen by file extension.
fn load(name: &Path, stack_size: Option<usize>) -> Result<RunEnvironment> {
    let stack_size = stack_size.unwrap_or_else(stackasm::env::stack_size);
    let mut env = RunEnvironment::with_stack_size(stack_size);
    match name.extension().and_then(OsStr::to_str) {
        Some("asm") => {
            file_message(MsgColor::Green, "Assembling", name);
            env.load_program(assemble(name)?);
        }
        Some("bin") => {
            file_message(MsgColor::Green, "Loading", name);
            let listing = fs::read_to_string(name).into_diagnostic()?;
            env.load_bits(&listing)?;
        }
        Some(_) => bail!("File has unknown extension. Exiting..."),
        None => bail!("File has no extension. Exiting..."),
    }
    Ok(env)
}

/// Read, normalise and assemble a source file.
fn assemble(name: &Path) -> Result<Program> {
    let contents = fs::read_to_string(name).into_diagnostic()?;
    let src = lexer::normalize(&contents);
    stackasm::assemble(&src)
}

const SHORT_INFO: &str = r"
Welcome to stackasm, an assembler and emulator for a small stack CPU.
Please use `-h` or `--help` to access the usage instructions and documentation.
";

const VERSION: &str = env!("CARGO_PKG_VERSION");
