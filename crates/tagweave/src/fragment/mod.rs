/*
 * mod.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The fragment language.
//!
//! Control tags carry code written in a small Python-flavoured language:
//! expressions, assignments, `pass`/`break`/`continue`, and a single block
//! header (`for`, `while`, `if`, `elif`, `else`) on the last line of a
//! fragment that opens a block. This module lexes and parses fragments; the
//! [`crate::interpreter`] runs them.

pub mod ast;
pub mod lexer;
mod parser;

use std::fmt;

pub use ast::{Expr, ExprKind, Fragment, Header, Stmt, StmtKind, Target};
pub use lexer::{Lexer, Token, TokenKind, tokenize};

/// A fragment that does not lex or parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    /// 0-based line within the fragment
    pub line: usize,
    /// 0-based column, in characters
    pub column: usize,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        SyntaxError {
            message: message.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SyntaxError {}

/// Parse the code of a `code` attribute.
///
/// ```
/// use tagweave::fragment::{parse_fragment, Header};
///
/// let fragment = parse_fragment("total = 0\nfor item in items:").unwrap();
/// assert_eq!(fragment.body.len(), 1);
/// assert!(matches!(fragment.header, Some((Header::For { .. }, 1))));
/// ```
pub fn parse_fragment(source: &str) -> Result<Fragment, SyntaxError> {
    parser::Parser::new(source)?.fragment()
}

/// Parse the code of an `expr` attribute: a single expression, or a
/// comma-separated list of them.
pub fn parse_expression(source: &str) -> Result<Expr, SyntaxError> {
    let fragment = parse_fragment(source)?;
    if fragment.header.is_none()
        && let [stmt] = fragment.body.as_slice()
        && let StmtKind::Expr(expr) = &stmt.kind
    {
        return Ok(expr.clone());
    }
    Err(SyntaxError::new("expected a single expression", 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_expression() {
        let expr = parse_expression(" price * qty ").unwrap();
        assert!(matches!(expr.kind, ExprKind::Binary { .. }));
    }

    #[test]
    fn test_parse_expression_rejects_statements() {
        assert_eq!(
            parse_expression("x = 1").unwrap_err().message,
            "expected a single expression"
        );
        assert_eq!(
            parse_expression("a\nb").unwrap_err().message,
            "expected a single expression"
        );
        assert!(parse_expression("").is_err());
    }

    #[test]
    fn test_syntax_error_display() {
        let err = SyntaxError::new("invalid syntax", 2, 4);
        assert_eq!(err.to_string(), "invalid syntax");
    }
}
