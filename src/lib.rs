// File: src/lib.rs
//
// Library interface for the EngPy interpreter.
// Exposes the pipeline stages for the binary, the REPL and integration tests.

pub mod ast;
pub mod errors;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod snapshot;

use std::io::Write;

use ast::Stmt;
use errors::EngError;
use interpreter::{Environment, Interpreter, Limits};
use tracing::debug;

/// Program run when the binary is started without a script: factorial of 5
pub const SAMPLE_PROGRAM: &str = "
# sample: factorial of 5
let n = 5
let fact = 1
while n > 1:
  fact = fact * n
  n = n - 1
print fact
";

pub const USAGE_BANNER: &str = "Usage: engpy <source.eng>\nRuns included sample program...";

/// Tokenizes and parses `source` into statements
pub fn parse_program(source: &str) -> Result<Vec<Stmt>, EngError> {
    let tokens = lexer::tokenize(source)?;
    debug!(tokens = tokens.len(), "tokenized");
    let stmts = parser::Parser::new(tokens).parse()?;
    debug!(statements = stmts.len(), "parsed");
    Ok(stmts)
}

/// Runs the whole pipeline against a caller-owned environment.
///
/// Output already written before an error stays written.
pub fn run_source<W: Write>(
    source: &str,
    env: &mut Environment,
    output: W,
    limits: Limits,
) -> Result<(), EngError> {
    let stmts = parse_program(source)?;
    let mut interpreter = Interpreter::with_output(output, limits);
    let result = interpreter.eval_stmts(&stmts, env);
    debug!(steps = interpreter.steps(), ok = result.is_ok(), "executed");
    result
}
