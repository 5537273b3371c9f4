// File: src/lexer.rs
//
// Lexical analyzer (tokenizer) for the EngPy language.
// Converts source text into a flat stream of tokens for parsing.
//
// The lexer is line oriented:
// - `#` starts a comment that runs to the end of the line
// - blank and comment-only lines are skipped and never affect indentation
// - leading whitespace (space = 1, tab = 4) drives INDENT/DEDENT synthesis
// - the rest of the line is split with a single regular expression into
//   numbers, identifiers (keywords included), operators and punctuation

use crate::errors::{EngError, SourceLocation};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use tracing::trace;

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:([0-9]+)|([A-Za-z_]\w*)|(==|!=|<=|>=)|(.))")
        .expect("token pattern must compile")
});

const TAB_WIDTH: usize = 4;

/// Symbolic operators recognised by the lexer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Assign,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Bang,
}

impl Operator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol {
            "+" => Operator::Plus,
            "-" => Operator::Minus,
            "*" => Operator::Star,
            "/" => Operator::Slash,
            "%" => Operator::Percent,
            "=" => Operator::Assign,
            "==" => Operator::Eq,
            "!=" => Operator::NotEq,
            "<" => Operator::Lt,
            ">" => Operator::Gt,
            "<=" => Operator::LtEq,
            ">=" => Operator::GtEq,
            "!" => Operator::Bang,
            _ => return None,
        };
        Some(op)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Star => "*",
            Operator::Slash => "/",
            Operator::Percent => "%",
            Operator::Assign => "=",
            Operator::Eq => "==",
            Operator::NotEq => "!=",
            Operator::Lt => "<",
            Operator::Gt => ">",
            Operator::LtEq => "<=",
            Operator::GtEq => ">=",
            Operator::Bang => "!",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Number(i64),
    /// Identifiers and keywords alike; keywords are not reserved
    Identifier(String),
    Operator(Operator),
    /// One of `( ) { } , :`
    Punctuation(char),
    Indent,
    Dedent,
    Eof,
}

impl TokenKind {
    /// True when this token is the identifier `word`
    pub fn is_word(&self, word: &str) -> bool {
        matches!(self, TokenKind::Identifier(w) if w == word)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TokenKind::Number(n) => write!(f, "number {}", n),
            TokenKind::Identifier(name) => write!(f, "identifier '{}'", name),
            TokenKind::Operator(op) => write!(f, "'{}'", op.as_str()),
            TokenKind::Punctuation(c) => write!(f, "'{}'", c),
            TokenKind::Indent => write!(f, "INDENT"),
            TokenKind::Dedent => write!(f, "DEDENT"),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

impl Token {
    fn new(kind: TokenKind, line: usize, column: usize) -> Self {
        Token { kind, line, column }
    }

    pub fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

/// Tokenizes EngPy source code into a vector of tokens terminated by `Eof`.
///
/// Every INDENT is matched by exactly one DEDENT: blocks still open at the
/// end of input are closed implicitly. A dedent that does not land on an
/// enclosing block's indentation is rejected.
pub fn tokenize(source: &str) -> Result<Vec<Token>, EngError> {
    let mut tokens = Vec::new();
    let mut indent_stack: Vec<usize> = vec![0];
    let mut last_line = 0;

    // `\r\n` and a lone `\r` both end a physical line
    let source = source.replace("\r\n", "\n").replace('\r', "\n");
    for (index, raw) in source.lines().enumerate() {
        let line_no = index + 1;
        let line = strip_comment(raw).trim_end();
        if line.is_empty() {
            continue;
        }
        last_line = line_no;

        let width = indent_width(line);
        let mut popped = false;
        while indent_stack.last().is_some_and(|&top| width < top) {
            indent_stack.pop();
            trace!(line = line_no, width, "dedent");
            tokens.push(Token::new(TokenKind::Dedent, line_no, 1));
            popped = true;
        }

        let top = indent_stack.last().copied().unwrap_or(0);
        if width > top {
            if popped {
                return Err(EngError::lex_error(
                    format!(
                        "Inconsistent dedent: indentation of {} does not match any enclosing block",
                        width
                    ),
                    SourceLocation::new(line_no, 1),
                )
                .with_source(line.to_string())
                .with_help(format!("indent this line by exactly {} columns", top)));
            }
            indent_stack.push(width);
            trace!(line = line_no, width, "indent");
            tokens.push(Token::new(TokenKind::Indent, line_no, 1));
        }

        scan_line(line, line_no, &mut tokens)?;
    }

    let eof_line = last_line + 1;
    while indent_stack.len() > 1 {
        indent_stack.pop();
        tokens.push(Token::new(TokenKind::Dedent, eof_line, 1));
    }
    tokens.push(Token::new(TokenKind::Eof, eof_line, 1));

    Ok(tokens)
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

/// Width of the leading whitespace: spaces count 1, tabs count 4
fn indent_width(line: &str) -> usize {
    line.chars()
        .map_while(|c| match c {
            ' ' => Some(1),
            '\t' => Some(TAB_WIDTH),
            _ => None,
        })
        .sum()
}

fn scan_line(line: &str, line_no: usize, tokens: &mut Vec<Token>) -> Result<(), EngError> {
    let mut pos = 0;

    while pos < line.len() {
        let Some(caps) = TOKEN_RE.captures(&line[pos..]) else {
            break;
        };
        let whole = caps.get(0).map(|m| m.end()).unwrap_or(0);

        if let Some(m) = caps.get(1) {
            let column = column_of(line, pos + m.start());
            let value = m.as_str().parse::<i64>().map_err(|_| {
                EngError::lex_error(
                    format!("Integer literal '{}' is too large", m.as_str()),
                    SourceLocation::new(line_no, column),
                )
                .with_source(line.to_string())
            })?;
            tokens.push(Token::new(TokenKind::Number(value), line_no, column));
        } else if let Some(m) = caps.get(2) {
            let column = column_of(line, pos + m.start());
            tokens.push(Token::new(TokenKind::Identifier(m.as_str().to_string()), line_no, column));
        } else if let Some(m) = caps.get(3) {
            let column = column_of(line, pos + m.start());
            let op = Operator::from_symbol(m.as_str()).ok_or_else(|| {
                illegal_character(m.as_str(), line, line_no, column)
            })?;
            tokens.push(Token::new(TokenKind::Operator(op), line_no, column));
        } else if let Some(m) = caps.get(4) {
            let column = column_of(line, pos + m.start());
            let text = m.as_str();
            if let Some(op) = Operator::from_symbol(text) {
                tokens.push(Token::new(TokenKind::Operator(op), line_no, column));
            } else if let Some(c) = text.chars().next().filter(|c| "(){},:".contains(*c)) {
                tokens.push(Token::new(TokenKind::Punctuation(c), line_no, column));
            } else {
                return Err(illegal_character(text, line, line_no, column));
            }
        }

        if whole == 0 {
            break;
        }
        pos += whole;
    }

    Ok(())
}

/// 1-based character column of a byte offset within `line`
fn column_of(line: &str, byte_offset: usize) -> usize {
    line[..byte_offset].chars().count() + 1
}

fn illegal_character(text: &str, line: &str, line_no: usize, column: usize) -> EngError {
    EngError::lex_error(
        format!("Illegal character '{}' at column {}", text, column),
        SourceLocation::new(line_no, column),
    )
    .with_source(line.to_string())
}
