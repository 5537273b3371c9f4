// File: src/parser.rs
//
// Recursive descent parser for the EngPy language.
// Transforms a sequence of tokens into an Abstract Syntax Tree (AST).
//
// Expression tiers, lowest to highest:
// - comparison / boolean: `== != < > <= >=`, `and`, `or` and the English
//   idioms (`is greater than or equal to`, `equals`, `not equal to`, ...)
// - additive: `+ -`
// - multiplicative: `* / %`
// - unary negation and primaries (numbers, identifiers, parentheses)
//
// Every binary tier is a left fold. All comparison and boolean operators
// share a single tier and chain left to right.
//
// The cursor never backtracks. Deciding whether an identifier starts an
// assignment or a comparison needs at most MAX_LOOKAHEAD tokens of lookahead.

use crate::ast::{BinaryOp, Expr, Stmt};
use crate::errors::{EngError, SourceLocation};
use crate::lexer::{Operator, Token, TokenKind};

/// Furthest offset `peek_n` is ever asked for
const MAX_LOOKAHEAD: usize = 3;

/// Guards the recursive productions against stack exhaustion
const MAX_NESTING: usize = 128;

/// Binary operators allowed in one statement. Each one deepens the left
/// spine that evaluation and drop walk recursively.
const MAX_OPERATORS: usize = 512;

const DECLARATION_KEYWORDS: [&str; 4] = ["let", "var", "const", "set"];

/// Words that, two tokens after an identifier, mean `x is ...` is a
/// comparison rather than an assignment
const COMPARISON_WORDS: [&str; 4] = ["greater", "less", "not", "equal"];

/// Parser maintains position in token stream and provides methods to parse statements and expressions
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    operators: usize,
}

impl Parser {
    /// Creates a new parser from a vector of tokens
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0, depth: 0, operators: 0 }
    }

    /// Peek at the current token without consuming it
    fn peek(&self) -> &TokenKind {
        self.peek_n(0)
    }

    /// Peek `n` tokens ahead; running off the end reads as `Eof`
    fn peek_n(&self, n: usize) -> &TokenKind {
        debug_assert!(n <= MAX_LOOKAHEAD);
        self.tokens
            .get(self.pos + n)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    /// Consume and return the current token, then advance to the next
    fn advance(&mut self) -> TokenKind {
        let tok = self.peek().clone();
        self.pos += 1;
        tok
    }

    fn location(&self) -> SourceLocation {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(Token::location)
            .unwrap_or_else(SourceLocation::unknown)
    }

    fn unexpected(&self, expected: &str) -> EngError {
        EngError::parse_error(format!("Expected {}, got {}", expected, self.peek()), self.location())
    }

    /// Consume the identifier `word` if it is next
    fn accept_word(&mut self, word: &str) -> bool {
        if self.peek().is_word(word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn accept_operator(&mut self, op: Operator) -> bool {
        if matches!(self.peek(), TokenKind::Operator(o) if *o == op) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_punctuation(&mut self, c: char) -> Result<(), EngError> {
        if matches!(self.peek(), TokenKind::Punctuation(p) if *p == c) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{}'", c)))
        }
    }

    fn expect_kind(&mut self, kind: TokenKind) -> Result<(), EngError> {
        if *self.peek() == kind {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected(&kind.to_string()))
        }
    }

    fn expect_identifier(&mut self) -> Result<String, EngError> {
        match self.peek() {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn enter(&mut self) -> Result<(), EngError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(EngError::parse_error(
                format!("Nesting deeper than {} levels", MAX_NESTING),
                self.location(),
            ));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Counts one binary operator folded into the current statement
    fn fold_step(&mut self) -> Result<(), EngError> {
        self.operators += 1;
        if self.operators > MAX_OPERATORS {
            return Err(EngError::parse_error(
                format!("More than {} operators in one statement", MAX_OPERATORS),
                self.location(),
            )
            .with_help("split the expression across several assignments".to_string()));
        }
        Ok(())
    }

    /// Parse the entire token stream into a vector of statements
    pub fn parse(&mut self) -> Result<Vec<Stmt>, EngError> {
        let mut stmts = Vec::new();
        while !matches!(self.peek(), TokenKind::Eof) {
            stmts.push(self.parse_stmt()?);
        }
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> Result<Stmt, EngError> {
        self.operators = 0;
        match self.peek() {
            TokenKind::Identifier(k) if DECLARATION_KEYWORDS.contains(&k.as_str()) => {
                self.parse_let()
            }
            TokenKind::Identifier(k) if k == "print" => {
                self.advance();
                Ok(Stmt::Print(self.parse_expr()?))
            }
            TokenKind::Identifier(k) if k == "if" => {
                let (condition, body) = self.parse_header_and_block()?;
                Ok(Stmt::If { condition, body })
            }
            TokenKind::Identifier(k) if k == "while" => {
                let (condition, body) = self.parse_header_and_block()?;
                Ok(Stmt::While { condition, body })
            }
            TokenKind::Identifier(_) => match self.parse_assignment()? {
                Some(stmt) => Ok(stmt),
                None => Ok(Stmt::ExprStmt(self.parse_expr()?)),
            },
            _ => Ok(Stmt::ExprStmt(self.parse_expr()?)),
        }
    }

    /// `let|var|const|set name (= | be | is [equal] [to]) expr`
    fn parse_let(&mut self) -> Result<Stmt, EngError> {
        let keyword = self.advance();
        let name = self.expect_identifier()?;

        if self.accept_word("is") {
            self.accept_word("equal");
            self.accept_word("to");
        } else if !(self.accept_operator(Operator::Assign) || self.accept_word("be")) {
            let keyword = match keyword {
                TokenKind::Identifier(k) => k,
                other => other.to_string(),
            };
            return Err(self.unexpected(&format!(
                "'=', 'be' or 'is' after '{} {}'",
                keyword, name
            )));
        }

        let value = self.parse_expr()?;
        Ok(Stmt::Let { name, value })
    }

    /// Plain `name = expr`, `name be expr` or `name is [equal] [to] expr`.
    ///
    /// Returns `None` without consuming anything when the identifier instead
    /// starts an expression, e.g. `x is greater than 3`.
    fn parse_assignment(&mut self) -> Result<Option<Stmt>, EngError> {
        let name = match self.peek() {
            TokenKind::Identifier(name) => name.clone(),
            _ => return Ok(None),
        };

        match self.peek_n(1) {
            TokenKind::Operator(Operator::Assign) => {
                self.pos += 2;
            }
            next if next.is_word("be") || next.is_word("is") => {
                let third = self.peek_n(2);
                if COMPARISON_WORDS.iter().any(|w| third.is_word(w)) {
                    return Ok(None);
                }
                self.pos += 2;
                self.accept_word("equal");
                self.accept_word("to");
            }
            _ => return Ok(None),
        }

        let value = self.parse_expr()?;
        Ok(Some(Stmt::Assign { name, value }))
    }

    /// `if|while expr : block`
    fn parse_header_and_block(&mut self) -> Result<(Expr, Vec<Stmt>), EngError> {
        self.advance(); // if / while
        let condition = self.parse_expr()?;
        self.expect_punctuation(':')?;
        let body = self.parse_block()?;
        Ok((condition, body))
    }

    fn parse_block(&mut self) -> Result<Vec<Stmt>, EngError> {
        self.expect_kind(TokenKind::Indent)?;
        if matches!(self.peek(), TokenKind::Dedent) {
            return Err(self.unexpected("at least one statement in block"));
        }

        self.enter()?;
        let mut stmts = Vec::new();
        while !matches!(self.peek(), TokenKind::Dedent | TokenKind::Eof) {
            stmts.push(self.parse_stmt()?);
        }
        self.leave();

        self.expect_kind(TokenKind::Dedent)?;
        Ok(stmts)
    }

    pub fn parse_expr(&mut self) -> Result<Expr, EngError> {
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, EngError> {
        let mut expr = self.parse_additive()?;
        while let Some(op) = self.comparison_operator() {
            self.fold_step()?;
            let right = self.parse_additive()?;
            expr = Expr::binary(expr, op, right);
        }
        Ok(expr)
    }

    /// Recognises and consumes one comparison or boolean operator, symbolic
    /// or spelled out. Consumes nothing when the next tokens are not one.
    fn comparison_operator(&mut self) -> Option<BinaryOp> {
        match self.peek() {
            TokenKind::Operator(op) => {
                let op = match op {
                    Operator::Eq => BinaryOp::Eq,
                    Operator::NotEq => BinaryOp::NotEq,
                    Operator::Lt => BinaryOp::Lt,
                    Operator::Gt => BinaryOp::Gt,
                    Operator::LtEq => BinaryOp::LtEq,
                    Operator::GtEq => BinaryOp::GtEq,
                    _ => return None,
                };
                self.pos += 1;
                Some(op)
            }
            TokenKind::Identifier(w) if w == "and" => {
                self.pos += 1;
                Some(BinaryOp::And)
            }
            TokenKind::Identifier(w) if w == "or" => {
                self.pos += 1;
                Some(BinaryOp::Or)
            }
            TokenKind::Identifier(w) if w == "is" => self.is_phrase(),
            TokenKind::Identifier(w) if w == "equals" || w == "equal" => {
                self.pos += 1;
                self.accept_word("to");
                Some(BinaryOp::Eq)
            }
            TokenKind::Identifier(w) if w == "not" && self.peek_n(1).is_word("equal") => {
                self.pos += 2;
                self.accept_word("to");
                Some(BinaryOp::NotEq)
            }
            _ => None,
        }
    }

    /// Phrases anchored on `is`:
    /// `is not equal [to]`, `is equal [to]`,
    /// `is greater than [or [equal] [to]]`, `is less than [or [equal] [to]]`
    fn is_phrase(&mut self) -> Option<BinaryOp> {
        let a = self.peek_n(1);
        let b = self.peek_n(2);

        if a.is_word("not") && b.is_word("equal") {
            self.pos += 3;
            self.accept_word("to");
            Some(BinaryOp::NotEq)
        } else if a.is_word("equal") {
            self.pos += 2;
            self.accept_word("to");
            Some(BinaryOp::Eq)
        } else if a.is_word("greater") && b.is_word("than") {
            self.pos += 3;
            Some(self.or_equal(BinaryOp::Gt, BinaryOp::GtEq))
        } else if a.is_word("less") && b.is_word("than") {
            self.pos += 3;
            Some(self.or_equal(BinaryOp::Lt, BinaryOp::LtEq))
        } else {
            None
        }
    }

    fn or_equal(&mut self, strict: BinaryOp, inclusive: BinaryOp) -> BinaryOp {
        if self.accept_word("or") {
            self.accept_word("equal");
            self.accept_word("to");
            inclusive
        } else {
            strict
        }
    }

    fn parse_additive(&mut self) -> Result<Expr, EngError> {
        let mut expr = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                TokenKind::Operator(Operator::Plus) => BinaryOp::Add,
                TokenKind::Operator(Operator::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.pos += 1;
            self.fold_step()?;
            let right = self.parse_multiplicative()?;
            expr = Expr::binary(expr, op, right);
        }
        Ok(expr)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, EngError> {
        let mut expr = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                TokenKind::Operator(Operator::Star) => BinaryOp::Mul,
                TokenKind::Operator(Operator::Slash) => BinaryOp::Div,
                TokenKind::Operator(Operator::Percent) => BinaryOp::Mod,
                _ => break,
            };
            self.pos += 1;
            self.fold_step()?;
            let right = self.parse_unary()?;
            expr = Expr::binary(expr, op, right);
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Expr, EngError> {
        self.enter()?;
        let expr = if self.accept_operator(Operator::Minus) {
            Expr::Negate(Box::new(self.parse_unary()?))
        } else {
            self.parse_primary()?
        };
        self.leave();
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, EngError> {
        match self.peek() {
            TokenKind::Number(n) => {
                let n = *n;
                self.pos += 1;
                Ok(Expr::Number(n))
            }
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.pos += 1;
                Ok(Expr::Identifier(name))
            }
            TokenKind::Punctuation('(') => {
                self.pos += 1;
                let expr = self.parse_expr()?;
                self.expect_punctuation(')')?;
                Ok(expr)
            }
            _ => Err(self.unexpected("expression")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::lexer::tokenize;

    fn parse(source: &str) -> Vec<Stmt> {
        Parser::new(tokenize(source).unwrap()).parse().unwrap()
    }

    fn parse_err(source: &str) -> EngError {
        Parser::new(tokenize(source).unwrap()).parse().unwrap_err()
    }

    fn expr_of(source: &str) -> Expr {
        match parse(source).remove(0) {
            Stmt::ExprStmt(expr) | Stmt::Print(expr) => expr,
            other => panic!("expected an expression statement, got {:?}", other),
        }
    }

    fn var(name: &str) -> Expr {
        Expr::Identifier(name.to_string())
    }

    #[test]
    fn test_same_tier_operators_fold_left() {
        assert_eq!(expr_of("8 - 3 - 2").to_string(), "((8 - 3) - 2)");
        assert_eq!(expr_of("64 / 4 / 2 * 3").to_string(), "(((64 / 4) / 2) * 3)");
        assert_eq!(expr_of("a < b == c").to_string(), "((a < b) == c)");
    }

    #[test]
    fn test_precedence_tiers() {
        assert_eq!(expr_of("1 + 2 * 3").to_string(), "(1 + (2 * 3))");
        assert_eq!(expr_of("(1 + 2) * 3").to_string(), "((1 + 2) * 3)");
        assert_eq!(expr_of("a + 1 > b and c").to_string(), "(((a + 1) > b) and c)");
        assert_eq!(expr_of("-a * 2").to_string(), "(-a * 2)");
        assert_eq!(expr_of("7 % 3 + 1").to_string(), "((7 % 3) + 1)");
    }

    #[test]
    fn test_equality_idioms_share_one_shape() {
        let symbolic = expr_of("x == 5");
        assert_eq!(expr_of("x is equal to 5"), symbolic);
        assert_eq!(expr_of("x is equal 5"), symbolic);
        assert_eq!(expr_of("x equals 5"), symbolic);
        assert_eq!(expr_of("x equal to 5"), symbolic);
        assert_eq!(symbolic, Expr::binary(var("x"), BinaryOp::Eq, Expr::Number(5)));
    }

    #[test]
    fn test_inequality_idioms() {
        let symbolic = expr_of("x != 5");
        assert_eq!(expr_of("x is not equal to 5"), symbolic);
        assert_eq!(expr_of("x is not equal 5"), symbolic);
        assert_eq!(expr_of("x not equal to 5"), symbolic);
    }

    #[test]
    fn test_ordering_idioms() {
        assert_eq!(expr_of("x is greater than 5"), expr_of("x > 5"));
        assert_eq!(expr_of("x is greater than or equal to 5"), expr_of("x >= 5"));
        assert_eq!(expr_of("x is greater than or equal 5"), expr_of("x >= 5"));
        assert_eq!(expr_of("x is greater than or 5"), expr_of("x >= 5"));
        assert_eq!(expr_of("x is less than 5"), expr_of("x < 5"));
        assert_eq!(expr_of("x is less than or equal to 5"), expr_of("x <= 5"));
    }

    #[test]
    fn test_idioms_take_additive_right_operand() {
        assert_eq!(expr_of("x is less than y + 1").to_string(), "(x < (y + 1))");
        assert_eq!(
            expr_of("a is greater than 1 and b equals 2").to_string(),
            "(((a > 1) and b) == 2)"
        );
    }

    #[test]
    fn test_let_forms() {
        let expected = Stmt::Let { name: "x".into(), value: Expr::Number(10) };
        for src in [
            "let x = 10",
            "var x = 10",
            "const x be 10",
            "set x is 10",
            "let x is equal to 10",
            "let x is to 10",
        ] {
            assert_eq!(parse(src), vec![expected.clone()], "{}", src);
        }
    }

    #[test]
    fn test_let_requires_binder() {
        let err = parse_err("let x 10");
        assert_eq!(err.kind, ErrorKind::ParseError);
        assert_eq!(err.message, "Expected '=', 'be' or 'is' after 'let x', got number 10");
    }

    #[test]
    fn test_plain_assignment_forms() {
        let expected = Stmt::Assign { name: "n".into(), value: Expr::Number(3) };
        assert_eq!(parse("n = 3"), vec![expected.clone()]);
        assert_eq!(parse("n be 3"), vec![expected.clone()]);
        assert_eq!(parse("n is 3"), vec![expected.clone()]);
        assert_eq!(parse("n is to 3"), vec![expected]);
    }

    #[test]
    fn test_is_followed_by_comparison_word_is_an_expression() {
        for src in ["n is greater than 3", "n is less than 3", "n is not equal to 3", "n is equal to 3"] {
            assert!(matches!(parse(src)[0], Stmt::ExprStmt(_)), "{}", src);
        }
    }

    #[test]
    fn test_if_and_while_blocks() {
        let stmts = parse("while n > 1:\n  fact = fact * n\n  n = n - 1\nprint fact\n");
        assert_eq!(stmts.len(), 2);
        match &stmts[0] {
            Stmt::While { condition, body } => {
                assert_eq!(condition.to_string(), "(n > 1)");
                assert_eq!(body.len(), 2);
            }
            other => panic!("expected while, got {:?}", other),
        }

        let stmts = parse("if a:\n  if b:\n    print 1\n  print 2\n");
        match &stmts[0] {
            Stmt::If { body, .. } => {
                assert_eq!(body.len(), 2);
                assert!(matches!(body[0], Stmt::If { .. }));
            }
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_colon_names_expected_and_found() {
        let err = parse_err("if a > 1\n  print a\n");
        assert_eq!(err.message, "Expected ':', got INDENT");
    }

    #[test]
    fn test_block_requires_indent() {
        let err = parse_err("if a:\nprint a\n");
        assert_eq!(err.message, "Expected INDENT, got identifier 'print'");
    }

    #[test]
    fn test_empty_block_is_rejected() {
        let tokens = vec![
            Token { kind: TokenKind::Identifier("if".into()), line: 1, column: 1 },
            Token { kind: TokenKind::Number(1), line: 1, column: 4 },
            Token { kind: TokenKind::Punctuation(':'), line: 1, column: 5 },
            Token { kind: TokenKind::Indent, line: 2, column: 1 },
            Token { kind: TokenKind::Dedent, line: 2, column: 1 },
            Token { kind: TokenKind::Eof, line: 2, column: 1 },
        ];
        let err = Parser::new(tokens).parse().unwrap_err();
        assert_eq!(err.message, "Expected at least one statement in block, got DEDENT");
    }

    #[test]
    fn test_unclosed_paren() {
        let err = parse_err("print (1 + 2");
        assert_eq!(err.message, "Expected ')', got end of input");
    }

    #[test]
    fn test_unexpected_token_in_expression() {
        let err = parse_err("print * 2");
        assert_eq!(err.message, "Expected expression, got '*'");
        assert_eq!(err.location, SourceLocation::new(1, 7));
    }

    #[test]
    fn test_statements_need_no_separator() {
        assert_eq!(
            parse("print 1 2"),
            vec![Stmt::Print(Expr::Number(1)), Stmt::ExprStmt(Expr::Number(2))]
        );
    }

    #[test]
    fn test_keywords_are_readable_as_variables() {
        assert_eq!(parse("print print"), vec![Stmt::Print(var("print"))]);
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let src = format!("print {}1{}", "(".repeat(200), ")".repeat(200));
        let err = parse_err(&src);
        assert!(err.message.starts_with("Nesting deeper than"));
    }

    #[test]
    fn test_long_operator_chain_is_rejected() {
        let err = parse_err(&format!("print 0{}", "+1".repeat(200_000)));
        assert_eq!(err.kind, ErrorKind::ParseError);
        assert_eq!(err.message, "More than 512 operators in one statement");

        let err = parse_err(&format!("print 1{}", " is less than 2".repeat(2_000)));
        assert!(err.message.starts_with("More than"));
    }

    #[test]
    fn test_operator_budget_is_per_statement() {
        let line = format!("print 0{}\n", "*1".repeat(500));
        let stmts = parse(&line.repeat(3));
        assert_eq!(stmts.len(), 3);
    }

    #[test]
    fn test_outline_rendering() {
        let stmts = parse("let n = 5\nwhile n > 1:\n  n = n - 1\n");
        let outline: String = stmts.iter().map(|s| s.to_string()).collect();
        assert_eq!(outline, "let n = 5\nwhile (n > 1):\n  n = (n - 1)\n");
    }
}
