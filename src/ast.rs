// File: src/ast.rs
//
// Abstract Syntax Tree (AST) definitions for the EngPy language.
//
// Expressions (Expr) reduce to integers; statements (Stmt) perform actions
// and control flow. Only `If` and `While` own child statements.

use std::fmt;

/// Binary operators. Arithmetic, comparison and boolean operators share this
/// enum; the parser decides which precedence tier produces which.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    And,
    Or,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::LtEq => "<=",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Number(i64),
    Identifier(String),
    Negate(Box<Expr>),
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
}

impl Expr {
    pub fn binary(left: Expr, op: BinaryOp, right: Expr) -> Self {
        Expr::BinaryOp { left: Box::new(left), op, right: Box::new(right) }
    }
}

/// Renders every binary node in parentheses so grouping is explicit:
/// `8 - 3 - 2` displays as `((8 - 3) - 2)`.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{}", n),
            Expr::Identifier(name) => f.write_str(name),
            Expr::Negate(inner) => write!(f, "-{}", inner),
            Expr::BinaryOp { left, op, right } => write!(f, "({} {} {})", left, op, right),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    /// `let|var|const|set name (= | be | is [equal] [to]) value`
    Let { name: String, value: Expr },
    /// `name = value`, `name be value`, `name is value`
    Assign { name: String, value: Expr },
    Print(Expr),
    If { condition: Expr, body: Vec<Stmt> },
    While { condition: Expr, body: Vec<Stmt> },
    ExprStmt(Expr),
}

impl Stmt {
    /// Writes an indented outline of the statement, one line per statement.
    pub fn write_outline(&self, f: &mut impl fmt::Write, depth: usize) -> fmt::Result {
        let pad = "  ".repeat(depth);
        match self {
            Stmt::Let { name, value } => writeln!(f, "{}let {} = {}", pad, name, value),
            Stmt::Assign { name, value } => writeln!(f, "{}{} = {}", pad, name, value),
            Stmt::Print(expr) => writeln!(f, "{}print {}", pad, expr),
            Stmt::ExprStmt(expr) => writeln!(f, "{}{}", pad, expr),
            Stmt::If { condition, body } | Stmt::While { condition, body } => {
                let keyword = if matches!(self, Stmt::If { .. }) { "if" } else { "while" };
                writeln!(f, "{}{} {}:", pad, keyword, condition)?;
                for stmt in body {
                    stmt.write_outline(f, depth + 1)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.write_outline(f, 0)
    }
}
