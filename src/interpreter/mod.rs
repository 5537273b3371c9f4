// File: src/interpreter/mod.rs
//
// Tree-walking interpreter for the EngPy language.
// Executes programs by traversing the Abstract Syntax Tree (AST).
//
// Every expression reduces to an `i64`. Comparisons and boolean operators
// produce 1 or 0, and any nonzero value is truthy in `if` and `while`.
// Division and modulo round toward negative infinity. `and`/`or` always
// evaluate both operands.
//
// The environment is owned by the caller and threaded through execution by
// reference; blocks run inline against the same bindings.

mod environment;

pub use environment::Environment;

use crate::ast::{BinaryOp, Expr, Stmt};
use crate::errors::{find_closest_match, EngError};
use std::io::{self, Write};
use tracing::{trace, warn};

/// Execution budget. The default is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Limits {
    /// Maximum statement executions plus `while` condition checks
    pub max_steps: Option<u64>,
}

impl Limits {
    pub fn with_max_steps(max_steps: u64) -> Self {
        Limits { max_steps: Some(max_steps) }
    }
}

/// Executes statements, writing `print` output to `W`
pub struct Interpreter<W: Write = io::Stdout> {
    output: W,
    limits: Limits,
    steps: u64,
}

impl Interpreter<io::Stdout> {
    /// Interpreter printing to standard output
    pub fn new(limits: Limits) -> Self {
        Self::with_output(io::stdout(), limits)
    }
}

impl<W: Write> Interpreter<W> {
    pub fn with_output(output: W, limits: Limits) -> Self {
        Interpreter { output, limits, steps: 0 }
    }

    /// Steps consumed so far
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Evaluates a list of statements sequentially, stopping at the first error
    pub fn eval_stmts(&mut self, stmts: &[Stmt], env: &mut Environment) -> Result<(), EngError> {
        for stmt in stmts {
            self.eval_stmt(stmt, env)?;
        }
        Ok(())
    }

    fn eval_stmt(&mut self, stmt: &Stmt, env: &mut Environment) -> Result<(), EngError> {
        self.tick()?;
        trace!(step = self.steps, statement = describe(stmt), "exec");

        match stmt {
            Stmt::Let { name, value } | Stmt::Assign { name, value } => {
                let value = self.eval_expr(value, env)?;
                env.set(name.clone(), value);
            }
            Stmt::Print(expr) => {
                let value = self.eval_expr(expr, env)?;
                writeln!(self.output, "{}", value)?;
            }
            Stmt::If { condition, body } => {
                if self.eval_expr(condition, env)? != 0 {
                    self.eval_stmts(body, env)?;
                }
            }
            Stmt::While { condition, body } => loop {
                if self.eval_expr(condition, env)? == 0 {
                    break;
                }
                self.eval_stmts(body, env)?;
                self.tick()?;
            },
            Stmt::ExprStmt(expr) => {
                self.eval_expr(expr, env)?;
            }
        }
        Ok(())
    }

    /// Counts one unit of work against the step budget
    fn tick(&mut self) -> Result<(), EngError> {
        self.steps += 1;
        match self.limits.max_steps {
            Some(max) if self.steps > max => {
                warn!(max_steps = max, "execution step limit exceeded");
                Err(EngError::step_limit(max)
                    .with_note("raise the budget with --max-steps".to_string()))
            }
            _ => Ok(()),
        }
    }

    /// Reduces an expression to its integer value
    pub fn eval_expr(&self, expr: &Expr, env: &Environment) -> Result<i64, EngError> {
        match expr {
            Expr::Number(n) => Ok(*n),
            Expr::Identifier(name) => env.get(name).ok_or_else(|| undefined(name, env)),
            Expr::Negate(inner) => {
                let value = self.eval_expr(inner, env)?;
                value.checked_neg().ok_or_else(|| EngError::integer_overflow("-"))
            }
            Expr::BinaryOp { left, op, right } => {
                // both sides first: no short-circuit, even for and/or
                let a = self.eval_expr(left, env)?;
                let b = self.eval_expr(right, env)?;
                apply_binary(*op, a, b)
            }
        }
    }
}

fn undefined(name: &str, env: &Environment) -> EngError {
    let err = EngError::undefined_variable(name);
    match find_closest_match(name, env.names()) {
        Some(candidate) => err.with_suggestion(candidate.to_string()),
        None => err,
    }
}

fn describe(stmt: &Stmt) -> &'static str {
    match stmt {
        Stmt::Let { .. } => "let",
        Stmt::Assign { .. } => "assign",
        Stmt::Print(_) => "print",
        Stmt::If { .. } => "if",
        Stmt::While { .. } => "while",
        Stmt::ExprStmt(_) => "expr",
    }
}

pub fn apply_binary(op: BinaryOp, a: i64, b: i64) -> Result<i64, EngError> {
    let overflow = || EngError::integer_overflow(op.as_str());
    match op {
        BinaryOp::Add => a.checked_add(b).ok_or_else(overflow),
        BinaryOp::Sub => a.checked_sub(b).ok_or_else(overflow),
        BinaryOp::Mul => a.checked_mul(b).ok_or_else(overflow),
        BinaryOp::Div => {
            if b == 0 {
                return Err(EngError::division_by_zero(op.as_str()));
            }
            floor_div(a, b).ok_or_else(overflow)
        }
        BinaryOp::Mod => {
            if b == 0 {
                return Err(EngError::division_by_zero(op.as_str()));
            }
            Ok(floor_mod(a, b))
        }
        BinaryOp::Eq => Ok(truth(a == b)),
        BinaryOp::NotEq => Ok(truth(a != b)),
        BinaryOp::Lt => Ok(truth(a < b)),
        BinaryOp::Gt => Ok(truth(a > b)),
        BinaryOp::LtEq => Ok(truth(a <= b)),
        BinaryOp::GtEq => Ok(truth(a >= b)),
        BinaryOp::And => Ok(truth(a != 0 && b != 0)),
        BinaryOp::Or => Ok(truth(a != 0 || b != 0)),
    }
}

fn truth(condition: bool) -> i64 {
    i64::from(condition)
}

/// Quotient rounded toward negative infinity. `None` on overflow; `b` is nonzero.
fn floor_div(a: i64, b: i64) -> Option<i64> {
    let q = a.checked_div(b)?;
    if a % b != 0 && (a < 0) != (b < 0) {
        Some(q - 1)
    } else {
        Some(q)
    }
}

/// Remainder with the sign of the divisor; `b` is nonzero.
fn floor_mod(a: i64, b: i64) -> i64 {
    let r = a.wrapping_rem(b);
    if r != 0 && (r < 0) != (b < 0) {
        r + b
    } else {
        r
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::lexer::tokenize;
    use crate::parser::Parser;

    fn run(source: &str, limits: Limits) -> (Result<(), EngError>, String, Environment) {
        let stmts = Parser::new(tokenize(source).unwrap()).parse().unwrap();
        let mut env = Environment::new();
        let mut out = Vec::new();
        let result = Interpreter::with_output(&mut out, limits).eval_stmts(&stmts, &mut env);
        (result, String::from_utf8(out).unwrap(), env)
    }

    #[test]
    fn test_floor_division_and_modulo() {
        assert_eq!(floor_div(-7, 2), Some(-4));
        assert_eq!(floor_div(7, -2), Some(-4));
        assert_eq!(floor_div(7, 2), Some(3));
        assert_eq!(floor_div(-8, 2), Some(-4));
        assert_eq!(floor_div(i64::MIN, -1), None);
        assert_eq!(floor_mod(-7, 2), 1);
        assert_eq!(floor_mod(7, -2), -1);
        assert_eq!(floor_mod(-7, -2), -1);
        assert_eq!(floor_mod(i64::MIN, -1), 0);
    }

    #[test]
    fn test_zero_divisor_errors_name_operator() {
        let err = apply_binary(BinaryOp::Div, 1, 0).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DivisionByZero);
        assert_eq!(err.message, "Division by zero in '/'");
        let err = apply_binary(BinaryOp::Mod, 1, 0).unwrap_err();
        assert_eq!(err.message, "Modulo by zero in '%'");
    }

    #[test]
    fn test_overflow_is_reported() {
        let err = apply_binary(BinaryOp::Mul, i64::MAX, 2).unwrap_err();
        assert_eq!(err.kind, ErrorKind::IntegerOverflow);
        let (result, _, _) = run(&format!("print -(0 - {} - 1)", i64::MAX), Limits::default());
        assert_eq!(result.unwrap_err().message, "Integer overflow in '-'");
    }

    #[test]
    fn test_boolean_operators_yield_integers() {
        assert_eq!(apply_binary(BinaryOp::And, 3, -1).unwrap(), 1);
        assert_eq!(apply_binary(BinaryOp::And, 3, 0).unwrap(), 0);
        assert_eq!(apply_binary(BinaryOp::Or, 0, 0).unwrap(), 0);
        assert_eq!(apply_binary(BinaryOp::Or, 0, 7).unwrap(), 1);
    }

    #[test]
    fn test_and_or_do_not_short_circuit() {
        let (result, _, _) = run("print 0 and 1 / 0", Limits::default());
        assert_eq!(result.unwrap_err().kind, ErrorKind::DivisionByZero);
        let (result, _, _) = run("print 1 or 1 % 0", Limits::default());
        assert_eq!(result.unwrap_err().message, "Modulo by zero in '%'");
    }

    #[test]
    fn test_blocks_share_environment() {
        let (result, out, env) = run("let a = 1\nif a:\n  let b = a + 1\nprint b\n", Limits::default());
        result.unwrap();
        assert_eq!(out, "2\n");
        assert_eq!(env.get("b"), Some(2));
    }

    #[test]
    fn test_undefined_variable_suggests_close_name() {
        let (result, out, _) = run("let count = 1\nprint cont\n", Limits::default());
        let err = result.unwrap_err();
        assert_eq!(err.kind, ErrorKind::UndefinedVariable);
        assert_eq!(err.message, "Undefined variable 'cont'");
        assert_eq!(err.suggestion.as_deref(), Some("count"));
        assert_eq!(out, "");
    }

    #[test]
    fn test_step_limit_stops_infinite_loop() {
        let (result, _, env) = run("let n = 0\nwhile 1:\n  n = n + 1\n", Limits::with_max_steps(50));
        let err = result.unwrap_err();
        assert_eq!(err.kind, ErrorKind::StepLimitExceeded);
        assert_eq!(err.message, "Execution step limit of 50 exceeded");
        assert!(env.get("n").unwrap() > 0);
    }

    #[test]
    fn test_step_count_for_straight_line_program() {
        let stmts = Parser::new(tokenize("let a = 1\nprint a\n").unwrap()).parse().unwrap();
        let mut env = Environment::new();
        let mut interp = Interpreter::with_output(Vec::new(), Limits::with_max_steps(2));
        interp.eval_stmts(&stmts, &mut env).unwrap();
        assert_eq!(interp.steps(), 2);
        assert_eq!(interp.into_output(), b"1\n");
    }

    #[test]
    fn test_environment_persists_across_calls() {
        let mut env = Environment::new();
        let mut out = Vec::new();
        let mut interp = Interpreter::with_output(&mut out, Limits::default());
        let first = Parser::new(tokenize("let x = 41").unwrap()).parse().unwrap();
        let second = Parser::new(tokenize("x = x + 1\nprint x").unwrap()).parse().unwrap();
        interp.eval_stmts(&first, &mut env).unwrap();
        interp.eval_stmts(&second, &mut env).unwrap();
        assert_eq!(out, b"42\n");
    }
}
