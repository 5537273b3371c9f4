// File: src/repl.rs
//
// Interactive REPL (Read-Eval-Print Loop) for the EngPy language.
// Provides an interactive shell with:
// - Multi-line input for `if` / `while` blocks (finish with an empty line)
// - Command history with up/down arrow navigation
// - Special commands (:help, :clear, :quit, :vars, :reset)
// - Bindings that persist across inputs for the whole session

use crate::ast::Stmt;
use crate::errors::EngError;
use crate::interpreter::{Environment, Interpreter, Limits};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

const COMMANDS: [(&str, &str); 5] = [
    (":help, :h", "list commands"),
    (":quit, :q", "leave (Ctrl+D works too)"),
    (":clear, :c", "clear the screen"),
    (":vars, :v", "show bound variables"),
    (":reset, :r", "forget every variable"),
];

const HELP_EXAMPLE: &str = "engpy> let x be 10
engpy> x is greater than 5
=> 1
engpy> while x > 8:
  ...>   x = x - 1
  ...>
";

enum Flow {
    Continue,
    Quit,
}

/// REPL session that keeps one environment and handles user interaction
pub struct Repl {
    env: Environment,
    limits: Limits,
    editor: DefaultEditor,
}

impl Repl {
    pub fn new(limits: Limits) -> Result<Self, Box<dyn std::error::Error>> {
        let editor = DefaultEditor::new()?;
        Ok(Repl { env: Environment::new(), limits, editor })
    }

    fn show_banner(&self) {
        println!("{} {}", "engpy".bright_cyan().bold(), env!("CARGO_PKG_VERSION").dimmed());
        println!(
            "{}",
            "blocks opened with ':' run after an empty line; :help lists commands".dimmed()
        );
        println!();
    }

    /// Reads inputs until `:quit` or end of input
    pub fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.show_banner();

        let mut pending = String::new();
        loop {
            let prompt = if pending.is_empty() { "engpy> ".bright_green() } else { "  ...> ".bright_blue() };

            let line = match self.editor.readline(&prompt.to_string()) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) => {
                    if !pending.is_empty() {
                        println!("{}", "(block discarded)".dimmed());
                    }
                    pending.clear();
                    continue;
                }
                Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err.into()),
            };
            let _ = self.editor.add_history_entry(line.as_str());

            if pending.is_empty() && line.trim().starts_with(':') {
                match self.handle_command(line.trim()) {
                    Flow::Continue => continue,
                    Flow::Quit => break,
                }
            }

            pending.push_str(&line);
            pending.push('\n');
            if is_input_complete(&pending) {
                self.eval_input(&pending);
                pending.clear();
            }
        }

        println!("{}", "bye".bright_cyan());
        Ok(())
    }

    fn handle_command(&mut self, cmd: &str) -> Flow {
        match cmd {
            ":help" | ":h" => self.show_help(),
            ":quit" | ":q" | ":exit" => return Flow::Quit,
            ":clear" | ":c" => {
                print!("\x1B[2J\x1B[1;1H");
                self.show_banner();
            }
            ":vars" | ":v" => self.show_variables(),
            ":reset" | ":r" => {
                let forgotten = self.env.len();
                self.env.clear();
                println!("{} {} variable(s) forgotten", "reset:".bright_green(), forgotten);
            }
            _ => println!("{} no command '{}' (see {})", "?".bright_red(), cmd, ":help".bright_yellow()),
        }
        Flow::Continue
    }

    fn show_help(&self) {
        for (names, what) in COMMANDS {
            println!("  {} {}", format!("{:<12}", names).bright_yellow(), what);
        }
        println!();
        for line in HELP_EXAMPLE.lines() {
            println!("  {}", line.dimmed());
        }
    }

    fn show_variables(&self) {
        println!();
        if self.env.is_empty() {
            println!("  {}", "(no variables defined)".dimmed());
        }
        for (name, value) in self.env.iter_sorted() {
            println!("  {} = {}", name.bright_yellow(), value.to_string().bright_white());
        }
        println!();
    }

    /// Runs one complete input. Bare expressions echo their value.
    fn eval_input(&mut self, input: &str) {
        if input.trim().is_empty() {
            return;
        }

        let stmts = match crate::parse_program(input) {
            Ok(stmts) => stmts,
            Err(err) => return self.print_error(&err),
        };

        let mut interpreter = Interpreter::new(self.limits);
        for stmt in &stmts {
            let result = match stmt {
                Stmt::ExprStmt(expr) => interpreter.eval_expr(expr, &self.env).map(|value| {
                    println!("{} {}", "=>".bright_blue(), value.to_string().bright_white());
                }),
                _ => interpreter.eval_stmts(std::slice::from_ref(stmt), &mut self.env),
            };
            if let Err(err) = result {
                return self.print_error(&err);
            }
        }
    }

    fn print_error(&self, err: &EngError) {
        eprint!("{}", err);
    }
}

/// Input is complete unless it opened a block that has not been closed by
/// an empty line
pub fn is_input_complete(input: &str) -> bool {
    let opens_block = input
        .lines()
        .any(|line| line.split('#').next().unwrap_or("").trim_end().ends_with(':'));
    if !opens_block {
        return true;
    }
    input.lines().last().map_or(true, |line| line.trim().is_empty())
}
