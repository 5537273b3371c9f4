// File: src/main.rs
//
// Main entry point for the EngPy interpreter.
// Handles command-line argument parsing and dispatches to the appropriate
// subcommand. `engpy <file>` runs a script; `engpy` alone prints a usage
// banner and runs the bundled factorial sample.

use clap::{ArgAction, Parser as ClapParser, Subcommand};
use engpy::errors::EngError;
use engpy::interpreter::{Environment, Limits};
use engpy::repl::Repl;
use engpy::{lexer, snapshot};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(
    name = "engpy",
    about = "EngPy: an indentation-structured scripting language with English comparisons",
    version = env!("CARGO_PKG_VERSION"),
    long_about = None
)]
struct Cli {
    /// Script to run; without one the bundled sample program runs
    file: Option<PathBuf>,

    /// Abort a run after this many execution steps
    #[arg(long, env = "ENGPY_MAX_STEPS", global = true)]
    max_steps: Option<u64>,

    /// Disable colored diagnostics
    #[arg(long, global = true)]
    no_color: bool,

    /// Log more to stderr (-v debug, -vv trace); ENGPY_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an EngPy script file
    Run {
        /// Path to the .eng file
        file: PathBuf,
    },

    /// Launch the interactive EngPy REPL
    Repl,

    /// Print the token stream of a script
    Tokens {
        file: PathBuf,
    },

    /// Print the parsed statements of a script with explicit grouping
    Ast {
        file: PathBuf,
    },

    /// Run every .eng script in a directory against its .out snapshot
    Test {
        #[arg(default_value = "tests/scripts")]
        dir: PathBuf,

        /// Regenerate all .out files based on actual output
        #[arg(long)]
        update: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    if cli.no_color {
        colored::control::set_override(false);
    }
    let limits = Limits { max_steps: cli.max_steps };

    match dispatch(cli.command, cli.file, limits) {
        Ok(code) => code,
        Err(err) => {
            eprint!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_env("ENGPY_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn dispatch(
    command: Option<Commands>,
    file: Option<PathBuf>,
    limits: Limits,
) -> Result<ExitCode, EngError> {
    match command {
        None => match file {
            Some(file) => run_file(&file, limits),
            None => {
                println!("{}", engpy::USAGE_BANNER);
                run_source(engpy::SAMPLE_PROGRAM, limits)
            }
        },

        Some(Commands::Run { file }) => run_file(&file, limits),

        Some(Commands::Repl) => {
            let result = Repl::new(limits).and_then(|mut repl| repl.run());
            if let Err(err) = result {
                eprintln!("REPL failed: {}", err);
                return Ok(ExitCode::FAILURE);
            }
            Ok(ExitCode::SUCCESS)
        }

        Some(Commands::Tokens { file }) => {
            let source = read_source(&file)?;
            let tokens = lexer::tokenize(&source)?;
            write_dump(tokens.iter().map(|t| format!("{}:{}\t{}\n", t.line, t.column, t.kind)))
        }

        Some(Commands::Ast { file }) => {
            let source = read_source(&file)?;
            let stmts = engpy::parse_program(&source)?;
            write_dump(stmts.iter().map(|stmt| stmt.to_string()))
        }

        Some(Commands::Test { dir, update }) => {
            let report = snapshot::run_all(&dir, update, limits)?;
            if report.all_passed() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

/// Writes a dump to stdout. A reader that closes the pipe early (`| head`)
/// ends the dump without an error.
fn write_dump(chunks: impl Iterator<Item = String>) -> Result<ExitCode, EngError> {
    let mut out = io::stdout().lock();
    let result = chunks
        .map(|chunk| out.write_all(chunk.as_bytes()))
        .collect::<io::Result<()>>()
        .and_then(|()| out.flush());
    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(ExitCode::SUCCESS),
        Err(err) => Err(err.into()),
    }
}

fn read_source(path: &Path) -> Result<String, EngError> {
    fs::read_to_string(path)
        .map_err(|err| EngError::from(err).with_note(format!("while reading {}", path.display())))
}

fn run_file(path: &Path, limits: Limits) -> Result<ExitCode, EngError> {
    let source = read_source(path)?;
    let start = Instant::now();
    let result = run_source(&source, limits);
    debug!(file = %path.display(), elapsed = ?start.elapsed(), "run finished");
    result
}

fn run_source(source: &str, limits: Limits) -> Result<ExitCode, EngError> {
    let mut env = Environment::new();
    engpy::run_source(source, &mut env, io::stdout().lock(), limits)?;
    Ok(ExitCode::SUCCESS)
}
