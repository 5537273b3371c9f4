// File: src/errors.rs
//
// Error handling and reporting for the EngPy language.
// Provides a structured error type with source location information
// and pretty-printed diagnostics.

use colored::Colorize;
use std::fmt;

/// Source location information for tracking where code appears in a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    pub fn unknown() -> Self {
        Self { line: 0, column: 0 }
    }

    pub fn is_known(&self) -> bool {
        self.line > 0
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Types of errors that can occur while running EngPy code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    LexError,
    ParseError,
    UndefinedVariable,
    DivisionByZero,
    IntegerOverflow,
    StepLimitExceeded,
    IoError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorKind::LexError => write!(f, "Lex Error"),
            ErrorKind::ParseError => write!(f, "Parse Error"),
            ErrorKind::UndefinedVariable => write!(f, "Undefined Variable"),
            ErrorKind::DivisionByZero => write!(f, "Division By Zero"),
            ErrorKind::IntegerOverflow => write!(f, "Integer Overflow"),
            ErrorKind::StepLimitExceeded => write!(f, "Step Limit Exceeded"),
            ErrorKind::IoError => write!(f, "IO Error"),
        }
    }
}

/// A structured error with location information
#[derive(Debug, Clone, PartialEq)]
pub struct EngError {
    pub kind: ErrorKind,
    pub message: String,
    pub location: SourceLocation,
    pub source_line: Option<String>,
    pub suggestion: Option<String>,
    pub help: Option<String>,
    pub note: Option<String>,
}

impl EngError {
    pub fn new(kind: ErrorKind, message: String, location: SourceLocation) -> Self {
        Self {
            kind,
            message,
            location,
            source_line: None,
            suggestion: None,
            help: None,
            note: None,
        }
    }

    pub fn with_source(mut self, source_line: String) -> Self {
        self.source_line = Some(source_line);
        self
    }

    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestion = Some(suggestion);
        self
    }

    pub fn with_help(mut self, help: String) -> Self {
        self.help = Some(help);
        self
    }

    pub fn with_note(mut self, note: String) -> Self {
        self.note = Some(note);
        self
    }

    /// Create a lexical error
    pub fn lex_error(message: String, location: SourceLocation) -> Self {
        Self::new(ErrorKind::LexError, message, location)
    }

    /// Create a parse error
    pub fn parse_error(message: String, location: SourceLocation) -> Self {
        Self::new(ErrorKind::ParseError, message, location)
    }

    /// Create an undefined variable error
    pub fn undefined_variable(name: &str) -> Self {
        Self::new(
            ErrorKind::UndefinedVariable,
            format!("Undefined variable '{}'", name),
            SourceLocation::unknown(),
        )
    }

    pub fn division_by_zero(op: &str) -> Self {
        let message = if op == "%" {
            format!("Modulo by zero in '{}'", op)
        } else {
            format!("Division by zero in '{}'", op)
        };
        Self::new(ErrorKind::DivisionByZero, message, SourceLocation::unknown())
    }

    pub fn integer_overflow(op: &str) -> Self {
        Self::new(
            ErrorKind::IntegerOverflow,
            format!("Integer overflow in '{}'", op),
            SourceLocation::unknown(),
        )
    }

    pub fn step_limit(max_steps: u64) -> Self {
        Self::new(
            ErrorKind::StepLimitExceeded,
            format!("Execution step limit of {} exceeded", max_steps),
            SourceLocation::unknown(),
        )
    }

    pub fn io_error(err: std::io::Error) -> Self {
        Self::new(ErrorKind::IoError, err.to_string(), SourceLocation::unknown())
    }

    /// True for errors raised while executing, as opposed to lexing or parsing
    pub fn is_runtime(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::UndefinedVariable
                | ErrorKind::DivisionByZero
                | ErrorKind::IntegerOverflow
                | ErrorKind::StepLimitExceeded
        )
    }

    /// One-line rendering without color or source context
    pub fn plain(&self) -> String {
        format!("{}: {}", self.kind, self.message)
    }
}

impl fmt::Display for EngError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind_str = format!("{}", self.kind);
        writeln!(f, "{}: {}", kind_str.red().bold(), self.message.bold())?;

        if self.location.is_known() {
            let location_str = format!("  --> {}", self.location);
            writeln!(f, "{}", location_str.bright_blue())?;
        }

        if let Some(ref source) = self.source_line {
            let line_num = self.location.line;
            let col_num = self.location.column;

            writeln!(f, "   {}", "|".bright_blue())?;
            writeln!(
                f,
                "{} {} {}",
                format!("{:3}", line_num).bright_blue(),
                "|".bright_blue(),
                source
            )?;
            writeln!(
                f,
                "   {} {}{}",
                "|".bright_blue(),
                " ".repeat(col_num.saturating_sub(1)),
                "^".red().bold()
            )?;
            writeln!(f, "   {}", "|".bright_blue())?;
        }

        if let Some(ref help) = self.help {
            writeln!(
                f,
                "   {} {}",
                "=".bright_yellow(),
                format!("help: {}", help).bright_yellow()
            )?;
        }

        if let Some(ref suggestion) = self.suggestion {
            writeln!(
                f,
                "   {} {}",
                "=".bright_green(),
                format!("Did you mean '{}'?", suggestion).bright_green()
            )?;
        }

        if let Some(ref note) = self.note {
            writeln!(f, "   {} {}", "=".bright_cyan(), format!("note: {}", note).bright_cyan())?;
        }

        Ok(())
    }
}

impl std::error::Error for EngError {}

impl From<std::io::Error> for EngError {
    fn from(err: std::io::Error) -> Self {
        EngError::io_error(err)
    }
}

/// Computes the Levenshtein distance between two strings
/// Used for "Did you mean?" suggestions
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let s1_chars: Vec<char> = s1.chars().collect();
    let s2_chars: Vec<char> = s2.chars().collect();

    if s1_chars.is_empty() {
        return s2_chars.len();
    }
    if s2_chars.is_empty() {
        return s1_chars.len();
    }

    // Single rolling row instead of the full matrix
    let mut prev: Vec<usize> = (0..=s2_chars.len()).collect();
    let mut curr = vec![0; s2_chars.len() + 1];

    for (i, a) in s1_chars.iter().enumerate() {
        curr[0] = i + 1;
        for (j, b) in s2_chars.iter().enumerate() {
            let cost = if a == b { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[s2_chars.len()]
}

/// Find the closest match from a list of candidates using Levenshtein distance
/// Returns None if no candidate is within distance 2
pub fn find_closest_match<'a, I>(target: &str, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best_match = None;
    let mut best_distance = usize::MAX;

    for candidate in candidates {
        let distance = levenshtein_distance(target, candidate);
        if distance <= 2 && distance < best_distance {
            best_distance = distance;
            best_match = Some(candidate);
        }
    }

    best_match
}
