/*
 * parser.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Recursive-descent parser for fragment code.

use super::SyntaxError;
use super::ast::*;
use super::lexer::{Token, TokenKind, tokenize};
use crate::value::Value;

/// Keywords that are valid Python but have no meaning inside a fragment.
const UNSUPPORTED: &[&str] = &[
    "def", "class", "return", "lambda", "with", "try", "except", "finally", "raise", "yield",
    "import", "from", "global", "nonlocal", "del", "assert", "async", "await", "as",
];

/// Words that cannot be used as names.
const RESERVED: &[&str] = &[
    "and", "or", "not", "in", "is", "if", "elif", "else", "for", "while", "pass", "break",
    "continue", "None", "True", "False",
];

/// Deepest expression nesting (parentheses, brackets, unary and `not`
/// chains) a fragment may use.
pub(super) const MAX_NESTING: usize = 32;

pub(super) struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    pub(super) fn new(source: &str) -> Result<Self, SyntaxError> {
        Ok(Parser {
            tokens: tokenize(source)?,
            pos: 0,
            depth: 0,
        })
    }

    fn peek(&self) -> &Token {
        // tokenize always ends the stream with Eof
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    fn peek_next(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[(self.pos + 1).min(last)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn at_punct(&self, p: &str) -> bool {
        self.peek().is_punct(p)
    }

    fn at_name(&self, name: &str) -> bool {
        self.peek().is_name(name)
    }

    fn eat_punct(&mut self, p: &str) -> bool {
        if self.at_punct(p) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_name(&mut self, name: &str) -> bool {
        if self.at_name(name) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn unexpected(&self) -> SyntaxError {
        let token = self.peek();
        SyntaxError::new(
            format!("invalid syntax: unexpected {}", token.describe()),
            token.line,
            token.column,
        )
    }

    /// Run `parse` one nesting level deeper.
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, SyntaxError>,
    ) -> Result<T, SyntaxError> {
        if self.depth >= MAX_NESTING {
            let token = self.peek();
            return Err(SyntaxError::new(
                format!("too many nested expressions (limit {})", MAX_NESTING),
                token.line,
                token.column,
            ));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn expect_punct(&mut self, p: &str) -> Result<Token, SyntaxError> {
        if self.at_punct(p) {
            Ok(self.advance())
        } else {
            let token = self.peek();
            Err(SyntaxError::new(
                format!("expected '{}', found {}", p, token.describe()),
                token.line,
                token.column,
            ))
        }
    }

    fn skip_newlines(&mut self) {
        while self.peek().kind == TokenKind::Newline {
            self.advance();
        }
    }

    fn expect_line_end(&mut self) -> Result<(), SyntaxError> {
        match self.peek().kind {
            TokenKind::Newline => {
                self.advance();
                Ok(())
            }
            TokenKind::Eof => Ok(()),
            _ => Err(self.unexpected()),
        }
    }

    // ---- fragments and statements ----

    pub(super) fn fragment(&mut self) -> Result<Fragment, SyntaxError> {
        let mut fragment = Fragment::default();
        self.skip_newlines();
        while self.peek().kind != TokenKind::Eof {
            if let Some(header) = self.header()? {
                self.skip_newlines();
                if self.peek().kind != TokenKind::Eof {
                    let token = self.peek();
                    return Err(SyntaxError::new(
                        format!("'{}' block header must end the fragment", header.0.keyword()),
                        token.line,
                        token.column,
                    ));
                }
                fragment.header = Some(header);
                break;
            }
            fragment.body.push(self.statement()?);
            self.skip_newlines();
        }
        Ok(fragment)
    }

    fn header(&mut self) -> Result<Option<(Header, usize)>, SyntaxError> {
        let token = self.peek().clone();
        let TokenKind::Name(keyword) = &token.kind else {
            return Ok(None);
        };
        let header = match keyword.as_str() {
            "for" => {
                self.advance();
                let mut targets = vec![self.identifier()?];
                while self.eat_punct(",") {
                    if self.at_name("in") {
                        break;
                    }
                    targets.push(self.identifier()?);
                }
                if !self.eat_name("in") {
                    return Err(self.unexpected());
                }
                let iter = self.expression_list()?;
                Header::For { targets, iter }
            }
            "while" => {
                self.advance();
                Header::While(self.expression()?)
            }
            "if" => {
                self.advance();
                Header::If(self.expression()?)
            }
            "elif" => {
                self.advance();
                Header::Elif(self.expression()?)
            }
            "else" => {
                self.advance();
                Header::Else
            }
            _ => return Ok(None),
        };
        if !self.at_punct(":") {
            let found = self.peek();
            return Err(SyntaxError::new(
                format!("expected ':' after '{}' header", header.keyword()),
                found.line,
                found.column,
            ));
        }
        self.advance();
        self.expect_line_end()?;
        Ok(Some((header, token.line)))
    }

    fn identifier(&mut self) -> Result<String, SyntaxError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Name(name) if !RESERVED.contains(&name.as_str()) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected()),
        }
    }

    fn statement(&mut self) -> Result<Stmt, SyntaxError> {
        let token = self.peek().clone();
        let line = token.line;

        if let TokenKind::Name(name) = &token.kind {
            let simple = match name.as_str() {
                "pass" => Some(StmtKind::Pass),
                "break" => Some(StmtKind::Break),
                "continue" => Some(StmtKind::Continue),
                _ => None,
            };
            if let Some(kind) = simple {
                self.advance();
                self.expect_line_end()?;
                return Ok(Stmt { kind, line });
            }
            if UNSUPPORTED.contains(&name.as_str()) {
                return Err(SyntaxError::new(
                    format!("'{}' is not supported in fragments", name),
                    token.line,
                    token.column,
                ));
            }
        }

        let first = self.expression_list()?;

        if let Some(op) = self.augmented_operator() {
            let op_token = self.advance();
            let target = to_target(first, &op_token)?;
            if matches!(target, Target::Unpack(_)) {
                return Err(SyntaxError::new(
                    "illegal expression for augmented assignment",
                    op_token.line,
                    op_token.column,
                ));
            }
            let value = self.expression_list()?;
            self.expect_line_end()?;
            return Ok(Stmt {
                kind: StmtKind::AugAssign { target, op, value },
                line,
            });
        }

        if self.at_punct("=") {
            let mut exprs = vec![first];
            let mut last_eq = self.peek().clone();
            while self.eat_punct("=") {
                exprs.push(self.expression_list()?);
                if self.at_punct("=") {
                    last_eq = self.peek().clone();
                }
            }
            self.expect_line_end()?;
            let value = exprs.pop().ok_or_else(|| self.unexpected())?;
            let targets = exprs
                .into_iter()
                .map(|e| to_target(e, &last_eq))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Stmt {
                kind: StmtKind::Assign { targets, value },
                line,
            });
        }

        self.expect_line_end()?;
        Ok(Stmt {
            kind: StmtKind::Expr(first),
            line,
        })
    }

    fn augmented_operator(&self) -> Option<BinaryOp> {
        match self.peek().kind {
            TokenKind::Punct("+=") => Some(BinaryOp::Add),
            TokenKind::Punct("-=") => Some(BinaryOp::Sub),
            TokenKind::Punct("*=") => Some(BinaryOp::Mul),
            TokenKind::Punct("/=") => Some(BinaryOp::Div),
            TokenKind::Punct("//=") => Some(BinaryOp::FloorDiv),
            TokenKind::Punct("%=") => Some(BinaryOp::Mod),
            _ => None,
        }
    }

    // ---- expressions ----

    /// `a, b, c` builds a list; a single expression stays as it is.
    pub(super) fn expression_list(&mut self) -> Result<Expr, SyntaxError> {
        let first = self.expression()?;
        if !self.at_punct(",") {
            return Ok(first);
        }
        let line = first.line;
        let mut items = vec![first];
        while self.eat_punct(",") {
            if self.at_expression_end() {
                break;
            }
            items.push(self.expression()?);
        }
        Ok(Expr::new(ExprKind::List(items), line))
    }

    fn at_expression_end(&self) -> bool {
        let token = self.peek();
        matches!(token.kind, TokenKind::Newline | TokenKind::Eof)
            || token.is_punct("=")
            || token.is_punct(":")
            || token.is_punct(")")
            || self.augmented_operator().is_some()
    }

    pub(super) fn expression(&mut self) -> Result<Expr, SyntaxError> {
        self.nested(Self::conditional)
    }

    fn conditional(&mut self) -> Result<Expr, SyntaxError> {
        let then = self.or_expr()?;
        if self.at_name("if") {
            self.advance();
            let cond = self.or_expr()?;
            if !self.eat_name("else") {
                let token = self.peek();
                return Err(SyntaxError::new(
                    "expected 'else' after 'if' expression",
                    token.line,
                    token.column,
                ));
            }
            let otherwise = self.expression()?;
            let line = then.line;
            return Ok(Expr::new(
                ExprKind::Conditional {
                    cond: Box::new(cond),
                    then: Box::new(then),
                    otherwise: Box::new(otherwise),
                },
                line,
            ));
        }
        Ok(then)
    }

    fn or_expr(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.and_expr()?;
        while self.eat_name("or") {
            let right = self.and_expr()?;
            let line = left.line;
            left = Expr::new(ExprKind::Or(Box::new(left), Box::new(right)), line);
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.not_expr()?;
        while self.eat_name("and") {
            let right = self.not_expr()?;
            let line = left.line;
            left = Expr::new(ExprKind::And(Box::new(left), Box::new(right)), line);
        }
        Ok(left)
    }

    fn not_expr(&mut self) -> Result<Expr, SyntaxError> {
        if self.at_name("not") {
            let line = self.advance().line;
            let operand = self.nested(Self::not_expr)?;
            return Ok(Expr::new(ExprKind::Not(Box::new(operand)), line));
        }
        self.comparison()
    }

    fn compare_operator(&mut self) -> Option<CompareOp> {
        let not_in = self.at_name("not") && self.peek_next().is_name("in");
        let is_not = self.at_name("is") && self.peek_next().is_name("not");
        let op = match &self.peek().kind {
            TokenKind::Punct("==") => CompareOp::Eq,
            TokenKind::Punct("!=") => CompareOp::NotEq,
            TokenKind::Punct("<") => CompareOp::Lt,
            TokenKind::Punct("<=") => CompareOp::LtE,
            TokenKind::Punct(">") => CompareOp::Gt,
            TokenKind::Punct(">=") => CompareOp::GtE,
            TokenKind::Name(n) if n == "in" => CompareOp::In,
            _ if not_in => CompareOp::NotIn,
            _ if is_not => CompareOp::IsNot,
            TokenKind::Name(n) if n == "is" => CompareOp::Is,
            _ => return None,
        };
        let width = if not_in || is_not { 2 } else { 1 };
        for _ in 0..width {
            self.advance();
        }
        Some(op)
    }

    fn comparison(&mut self) -> Result<Expr, SyntaxError> {
        let left = self.arith()?;
        let mut rest = Vec::new();
        while let Some(op) = self.compare_operator() {
            rest.push((op, self.arith()?));
        }
        if rest.is_empty() {
            return Ok(left);
        }
        let line = left.line;
        Ok(Expr::new(
            ExprKind::Compare {
                left: Box::new(left),
                rest,
            },
            line,
        ))
    }

    fn arith(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.term()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Punct("+") => BinaryOp::Add,
                TokenKind::Punct("-") => BinaryOp::Sub,
                _ => return Ok(left),
            };
            let line = self.advance().line;
            let right = self.term()?;
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                line,
            );
        }
    }

    fn term(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Punct("*") => BinaryOp::Mul,
                TokenKind::Punct("/") => BinaryOp::Div,
                TokenKind::Punct("//") => BinaryOp::FloorDiv,
                TokenKind::Punct("%") => BinaryOp::Mod,
                _ => return Ok(left),
            };
            let line = self.advance().line;
            let right = self.unary()?;
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                line,
            );
        }
    }

    fn unary(&mut self) -> Result<Expr, SyntaxError> {
        let op = match self.peek().kind {
            TokenKind::Punct("-") => UnaryOp::Neg,
            TokenKind::Punct("+") => UnaryOp::Pos,
            _ => return self.postfix(),
        };
        let line = self.advance().line;
        let operand = self.nested(Self::unary)?;
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            line,
        ))
    }

    fn postfix(&mut self) -> Result<Expr, SyntaxError> {
        let mut expr = self.atom()?;
        loop {
            if self.at_punct("(") {
                let line = self.advance().line;
                let (args, kwargs) = self.arguments()?;
                expr = Expr::new(
                    ExprKind::Call {
                        func: Box::new(expr),
                        args,
                        kwargs,
                    },
                    line,
                );
            } else if self.at_punct("[") {
                let line = self.advance().line;
                expr = self.subscript(expr, line)?;
            } else if self.at_punct(".") {
                let dot = self.advance();
                let method = self.identifier()?;
                if !self.at_punct("(") {
                    return Err(SyntaxError::new(
                        format!("attribute access '.{}' is only supported for method calls", method),
                        dot.line,
                        dot.column,
                    ));
                }
                self.advance();
                let (args, kwargs) = self.arguments()?;
                expr = Expr::new(
                    ExprKind::MethodCall {
                        receiver: Box::new(expr),
                        method,
                        args,
                        kwargs,
                    },
                    dot.line,
                );
            } else {
                return Ok(expr);
            }
        }
    }

    /// Call arguments after the opening parenthesis, through the closing one.
    #[allow(clippy::type_complexity)]
    fn arguments(&mut self) -> Result<(Vec<Expr>, Vec<(String, Expr)>), SyntaxError> {
        let mut args = Vec::new();
        let mut kwargs: Vec<(String, Expr)> = Vec::new();
        while !self.at_punct(")") {
            let is_keyword = matches!(self.peek().kind, TokenKind::Name(_))
                && self.peek_next().is_punct("=");
            if is_keyword {
                let token = self.peek().clone();
                let name = self.identifier()?;
                self.advance();
                if kwargs.iter().any(|(n, _)| *n == name) {
                    return Err(SyntaxError::new(
                        format!("keyword argument repeated: {}", name),
                        token.line,
                        token.column,
                    ));
                }
                kwargs.push((name, self.expression()?));
            } else {
                if !kwargs.is_empty() {
                    let token = self.peek();
                    return Err(SyntaxError::new(
                        "positional argument follows keyword argument",
                        token.line,
                        token.column,
                    ));
                }
                args.push(self.expression()?);
            }
            if !self.eat_punct(",") {
                break;
            }
        }
        self.expect_punct(")")?;
        Ok((args, kwargs))
    }

    fn subscript(&mut self, value: Expr, line: usize) -> Result<Expr, SyntaxError> {
        let start = if self.at_punct(":") {
            None
        } else {
            Some(Box::new(self.expression()?))
        };
        if self.eat_punct(":") {
            let stop = if self.at_punct("]") {
                None
            } else {
                Some(Box::new(self.expression()?))
            };
            self.expect_punct("]")?;
            return Ok(Expr::new(
                ExprKind::Slice {
                    value: Box::new(value),
                    start,
                    stop,
                },
                line,
            ));
        }
        self.expect_punct("]")?;
        let index = start.ok_or_else(|| self.unexpected())?;
        Ok(Expr::new(
            ExprKind::Index {
                value: Box::new(value),
                index,
            },
            line,
        ))
    }

    fn atom(&mut self) -> Result<Expr, SyntaxError> {
        let token = self.peek().clone();
        let line = token.line;
        let kind = match token.kind {
            TokenKind::Int(i) => {
                self.advance();
                ExprKind::Literal(Value::Int(i))
            }
            TokenKind::Float(f) => {
                self.advance();
                ExprKind::Literal(Value::Float(f))
            }
            TokenKind::Str(_) => {
                // adjacent string literals concatenate
                let mut text = String::new();
                while let TokenKind::Str(s) = &self.peek().kind {
                    text.push_str(s);
                    self.advance();
                }
                ExprKind::Literal(Value::Str(text))
            }
            TokenKind::Name(ref name) => match name.as_str() {
                "None" => {
                    self.advance();
                    ExprKind::Literal(Value::None)
                }
                "True" => {
                    self.advance();
                    ExprKind::Literal(Value::Bool(true))
                }
                "False" => {
                    self.advance();
                    ExprKind::Literal(Value::Bool(false))
                }
                n if UNSUPPORTED.contains(&n) => {
                    return Err(SyntaxError::new(
                        format!("'{}' is not supported in fragments", n),
                        token.line,
                        token.column,
                    ));
                }
                _ => ExprKind::Name(self.identifier()?),
            },
            TokenKind::Punct("(") => {
                self.advance();
                if self.eat_punct(")") {
                    ExprKind::List(Vec::new())
                } else {
                    let inner = self.expression_list()?;
                    self.expect_punct(")")?;
                    return Ok(inner);
                }
            }
            TokenKind::Punct("[") => {
                self.advance();
                let mut items = Vec::new();
                while !self.at_punct("]") {
                    items.push(self.expression()?);
                    if !self.eat_punct(",") {
                        break;
                    }
                }
                self.expect_punct("]")?;
                ExprKind::List(items)
            }
            TokenKind::Punct("{") => {
                self.advance();
                let mut entries = Vec::new();
                while !self.at_punct("}") {
                    let key = self.expression()?;
                    self.expect_punct(":")?;
                    let value = self.expression()?;
                    entries.push((key, value));
                    if !self.eat_punct(",") {
                        break;
                    }
                }
                self.expect_punct("}")?;
                ExprKind::Dict(entries)
            }
            _ => return Err(self.unexpected()),
        };
        Ok(Expr::new(kind, line))
    }
}

fn to_target(expr: Expr, at: &Token) -> Result<Target, SyntaxError> {
    match expr.kind {
        ExprKind::Name(name) => Ok(Target::Name(name)),
        ExprKind::List(items) => Ok(Target::Unpack(
            items
                .into_iter()
                .map(|e| to_target(e, at))
                .collect::<Result<_, _>>()?,
        )),
        ExprKind::Index { value, index } => {
            let mut indices = vec![*index];
            let mut base = *value;
            loop {
                match base.kind {
                    ExprKind::Name(name) => {
                        indices.reverse();
                        return Ok(Target::Subscript { name, indices });
                    }
                    ExprKind::Index { value, index } => {
                        indices.push(*index);
                        base = *value;
                    }
                    _ => break,
                }
            }
            Err(SyntaxError::new(
                "cannot assign to subscript of an expression",
                at.line,
                at.column,
            ))
        }
        _ => Err(SyntaxError::new(
            "cannot assign to expression",
            at.line,
            at.column,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fragment(source: &str) -> Fragment {
        Parser::new(source).unwrap().fragment().unwrap()
    }

    fn fragment_err(source: &str) -> SyntaxError {
        match Parser::new(source).and_then(|mut p| p.fragment()) {
            Ok(f) => panic!("expected a syntax error, got {:?}", f),
            Err(e) => e,
        }
    }

    fn name(n: &str, line: usize) -> Expr {
        Expr::new(ExprKind::Name(n.to_string()), line)
    }

    fn int(i: i64) -> Expr {
        Expr::new(ExprKind::Literal(Value::Int(i)), 0)
    }

    #[test]
    fn test_nesting_limit() {
        let shallow = format!("x = {}1{}", "(".repeat(20), ")".repeat(20));
        assert_eq!(fragment(&shallow).body.len(), 1);

        let deep = format!("x = {}1{}", "(".repeat(1000), ")".repeat(1000));
        let err = fragment_err(&deep);
        assert_eq!(err.message, "too many nested expressions (limit 32)");
        assert_eq!(err.line, 0);

        let err = fragment_err(&format!("x = {}1{}", "[".repeat(200), "]".repeat(200)));
        assert_eq!(err.message, "too many nested expressions (limit 32)");
        let err = fragment_err(&format!("x = {}1", "-".repeat(5000)));
        assert_eq!(err.message, "too many nested expressions (limit 32)");
        let err = fragment_err(&format!("x = {}y", "not ".repeat(5000)));
        assert_eq!(err.message, "too many nested expressions (limit 32)");
    }

    #[test]
    fn test_assignment() {
        let f = fragment("x = 1");
        assert_eq!(
            f.body,
            vec![Stmt {
                kind: StmtKind::Assign {
                    targets: vec![Target::Name("x".to_string())],
                    value: int(1),
                },
                line: 0,
            }]
        );
        assert!(f.header.is_none());
    }

    #[test]
    fn test_chained_and_unpacking_assignment() {
        let f = fragment("a = b = 0\nx, y = y, x");
        let StmtKind::Assign { targets, .. } = &f.body[0].kind else {
            panic!("expected assignment");
        };
        assert_eq!(targets.len(), 2);

        let StmtKind::Assign { targets, .. } = &f.body[1].kind else {
            panic!("expected assignment");
        };
        assert_eq!(
            targets,
            &vec![Target::Unpack(vec![
                Target::Name("x".to_string()),
                Target::Name("y".to_string())
            ])]
        );
        assert_eq!(f.body[1].line, 1);
    }

    #[test]
    fn test_subscript_assignment() {
        let f = fragment("d['a'][0] = 5");
        let StmtKind::Assign { targets, .. } = &f.body[0].kind else {
            panic!("expected assignment");
        };
        let Target::Subscript { name, indices } = &targets[0] else {
            panic!("expected subscript target");
        };
        assert_eq!(name, "d");
        assert_eq!(indices.len(), 2);
        assert_eq!(
            indices[0].kind,
            ExprKind::Literal(Value::Str("a".to_string()))
        );
    }

    #[test]
    fn test_augmented_assignment() {
        let f = fragment("total += price * 2");
        let StmtKind::AugAssign { target, op, .. } = &f.body[0].kind else {
            panic!("expected augmented assignment");
        };
        assert_eq!(target, &Target::Name("total".to_string()));
        assert_eq!(*op, BinaryOp::Add);
    }

    #[test]
    fn test_for_header() {
        let f = fragment("for key, value in items.items():");
        let Some((Header::For { targets, iter }, line)) = &f.header else {
            panic!("expected for header");
        };
        assert_eq!(targets, &vec!["key".to_string(), "value".to_string()]);
        assert!(matches!(iter.kind, ExprKind::MethodCall { ref method, .. } if method == "items"));
        assert_eq!(*line, 0);
    }

    #[test]
    fn test_statements_before_header() {
        let f = fragment("n = 0\nwhile n < 3:");
        assert_eq!(f.body.len(), 1);
        let Some((Header::While(_), line)) = &f.header else {
            panic!("expected while header");
        };
        assert_eq!(*line, 1);
    }

    #[test]
    fn test_header_must_be_last() {
        let err = fragment_err("if x:\ny = 1");
        assert_eq!(err.message, "'if' block header must end the fragment");
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_else_and_elif() {
        assert_eq!(fragment("else:").header, Some((Header::Else, 0)));
        assert!(matches!(
            fragment("elif x > 1:").header,
            Some((Header::Elif(_), 0))
        ));
    }

    #[test]
    fn test_precedence() {
        let f = fragment("1 + 2 * 3");
        let StmtKind::Expr(expr) = &f.body[0].kind else {
            panic!("expected expression");
        };
        let ExprKind::Binary { op, right, .. } = &expr.kind else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinaryOp::Add);
        assert!(matches!(
            right.kind,
            ExprKind::Binary {
                op: BinaryOp::Mul,
                ..
            }
        ));
    }

    #[test]
    fn test_comparison_operators() {
        let f = fragment("a not in b is not c");
        let StmtKind::Expr(expr) = &f.body[0].kind else {
            panic!("expected expression");
        };
        let ExprKind::Compare { left, rest } = &expr.kind else {
            panic!("expected comparison");
        };
        assert_eq!(**left, name("a", 0));
        let ops: Vec<CompareOp> = rest.iter().map(|(op, _)| *op).collect();
        assert_eq!(ops, vec![CompareOp::NotIn, CompareOp::IsNot]);
    }

    #[test]
    fn test_call_with_keywords() {
        let f = fragment("print(a, b, sep='-', end='')");
        let StmtKind::Expr(expr) = &f.body[0].kind else {
            panic!("expected expression");
        };
        let ExprKind::Call { args, kwargs, .. } = &expr.kind else {
            panic!("expected call");
        };
        assert_eq!(args.len(), 2);
        let names: Vec<&str> = kwargs.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["sep", "end"]);
    }

    #[test]
    fn test_dict_list_and_slice() {
        let f = fragment("{'a': [1, 2][1:], 'b': (3,)}");
        let StmtKind::Expr(expr) = &f.body[0].kind else {
            panic!("expected expression");
        };
        let ExprKind::Dict(entries) = &expr.kind else {
            panic!("expected dict");
        };
        assert!(matches!(entries[0].1.kind, ExprKind::Slice { stop: None, .. }));
        assert_eq!(entries[1].1.kind, ExprKind::List(vec![int(3)]));
    }

    #[test]
    fn test_conditional_expression() {
        let f = fragment("'yes' if ok else 'no'");
        let StmtKind::Expr(expr) = &f.body[0].kind else {
            panic!("expected expression");
        };
        assert!(matches!(expr.kind, ExprKind::Conditional { .. }));
    }

    #[test]
    fn test_multiline_expression_lines() {
        let f = fragment("x = [\n  1,\n  missing\n]");
        let StmtKind::Assign { value, .. } = &f.body[0].kind else {
            panic!("expected assignment");
        };
        let ExprKind::List(items) = &value.kind else {
            panic!("expected list");
        };
        assert_eq!(items[1], name("missing", 2));
    }

    #[test]
    fn test_unsupported_keywords() {
        let err = fragment_err("def f(): pass");
        assert_eq!(err.message, "'def' is not supported in fragments");
        let err = fragment_err("x = lambda: 1");
        assert_eq!(err.message, "'lambda' is not supported in fragments");
    }

    #[test]
    fn test_attribute_access_rejected() {
        let err = fragment_err("x.y");
        assert_eq!(
            err.message,
            "attribute access '.y' is only supported for method calls"
        );
    }

    #[test]
    fn test_missing_colon() {
        let err = fragment_err("for i in x");
        assert_eq!(err.message, "expected ':' after 'for' header");
    }

    #[test]
    fn test_invalid_assignment_target() {
        let err = fragment_err("f() = 1");
        assert_eq!(err.message, "cannot assign to expression");
    }

    #[test]
    fn test_unbalanced_parenthesis() {
        let err = fragment_err("print(1");
        assert_eq!(err.message, "expected ')', found end of line");
    }
}
