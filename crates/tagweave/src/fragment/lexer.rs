/*
 * lexer.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Tokenizer for fragment code.
//!
//! Fragments are line oriented. A line break ends a logical line unless it
//! sits inside brackets or follows a backslash, and `;` also ends one.
//! Indentation carries no meaning: nesting comes from the markup, not from
//! whitespace inside attribute values.

use super::SyntaxError;

/// Operators and punctuation, longest first so that the first prefix match
/// is the right one.
const PUNCTUATION: &[&str] = &[
    "//=", "==", "!=", "<=", ">=", "+=", "-=", "*=", "/=", "%=", "//", "+", "-", "*", "/", "%",
    "<", ">", "=", "(", ")", "[", "]", "{", "}", ",", ":", ".",
];

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Identifiers and keywords alike
    Name(String),
    Int(i64),
    Float(f64),
    Str(String),
    Punct(&'static str),
    /// End of a logical line
    Newline,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// 0-based line within the fragment
    pub line: usize,
    /// 0-based column, in characters
    pub column: usize,
}

impl Token {
    pub fn is_punct(&self, p: &str) -> bool {
        matches!(self.kind, TokenKind::Punct(q) if q == p)
    }

    pub fn is_name(&self, name: &str) -> bool {
        matches!(&self.kind, TokenKind::Name(n) if n == name)
    }

    /// Short description for error messages.
    pub fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Name(n) => format!("'{}'", n),
            TokenKind::Int(i) => format!("'{}'", i),
            TokenKind::Float(f) => format!("'{}'", f),
            TokenKind::Str(_) => "string literal".to_string(),
            TokenKind::Punct(p) => format!("'{}'", p),
            TokenKind::Newline => "end of line".to_string(),
            TokenKind::Eof => "end of fragment".to_string(),
        }
    }
}

/// Streaming tokenizer. Call [`Lexer::next_token`] until it yields
/// [`TokenKind::Eof`] or an error.
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    depth: usize,
    /// Whether the last token emitted ended a logical line (or nothing has
    /// been emitted yet), so that blank lines do not produce empty lines.
    at_line_start: bool,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            chars: source.chars().collect(),
            pos: 0,
            line: 0,
            column: 0,
            depth: 0,
            at_line_start: true,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(message, self.line, self.column)
    }

    fn token(&mut self, kind: TokenKind, line: usize, column: usize) -> Token {
        self.at_line_start = kind == TokenKind::Newline;
        Token { kind, line, column }
    }

    pub fn next_token(&mut self) -> Result<Token, SyntaxError> {
        loop {
            let Some(c) = self.peek() else {
                let (line, column) = (self.line, self.column);
                if !self.at_line_start {
                    // close the last logical line before EOF
                    return Ok(self.token(TokenKind::Newline, line, column));
                }
                return Ok(Token {
                    kind: TokenKind::Eof,
                    line,
                    column,
                });
            };

            match c {
                ' ' | '\t' | '\r' | '\x0c' => {
                    self.bump();
                }
                '#' => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.bump();
                    }
                }
                '\\' if self.peek_at(1) == Some('\n') => {
                    self.bump();
                    self.bump();
                }
                '\n' | ';' => {
                    let (line, column) = (self.line, self.column);
                    self.bump();
                    if c == '\n' && self.depth > 0 {
                        continue;
                    }
                    if c == ';' && self.depth > 0 {
                        return Err(SyntaxError::new("invalid syntax ';'", line, column));
                    }
                    if self.at_line_start {
                        continue;
                    }
                    return Ok(self.token(TokenKind::Newline, line, column));
                }
                '\'' | '"' => return self.string(c),
                c if c.is_ascii_digit() => return self.number(),
                '.' if self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) => {
                    return self.number();
                }
                c if c.is_alphabetic() || c == '_' => return Ok(self.name()),
                _ => return self.punctuation(),
            }
        }
    }

    fn name(&mut self) -> Token {
        let (line, column) = (self.line, self.column);
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                name.push(c);
                self.bump();
            } else {
                break;
            }
        }
        self.token(TokenKind::Name(name), line, column)
    }

    fn number(&mut self) -> Result<Token, SyntaxError> {
        let (line, column) = (self.line, self.column);
        let mut text = String::new();
        let mut is_float = false;

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == '_' {
                if c != '_' {
                    text.push(c);
                }
                self.bump();
            } else if c == '.' && !is_float {
                is_float = true;
                text.push(c);
                self.bump();
            } else if (c == 'e' || c == 'E')
                && (self.peek_at(1).is_some_and(|d| d.is_ascii_digit())
                    || (matches!(self.peek_at(1), Some('+' | '-'))
                        && self.peek_at(2).is_some_and(|d| d.is_ascii_digit())))
            {
                is_float = true;
                text.push(c);
                self.bump();
                if let Some(sign @ ('+' | '-')) = self.peek() {
                    text.push(sign);
                    self.bump();
                }
            } else {
                break;
            }
        }

        if self.peek().is_some_and(|c| c.is_alphabetic() || c == '_') {
            return Err(SyntaxError::new("invalid decimal literal", line, column));
        }

        let kind = if is_float {
            text.parse::<f64>()
                .map(TokenKind::Float)
                .map_err(|_| SyntaxError::new("invalid decimal literal", line, column))?
        } else {
            text.parse::<i64>()
                .map(TokenKind::Int)
                .map_err(|_| SyntaxError::new("integer literal is too large", line, column))?
        };
        Ok(self.token(kind, line, column))
    }

    fn string(&mut self, quote: char) -> Result<Token, SyntaxError> {
        let (line, column) = (self.line, self.column);
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => {
                    return Err(SyntaxError::new(
                        "unterminated string literal",
                        line,
                        column,
                    ));
                }
                Some(c) if c == quote => break,
                Some('\\') => match self.bump() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some('0') => value.push('\0'),
                    Some('\\') => value.push('\\'),
                    Some('\'') => value.push('\''),
                    Some('"') => value.push('"'),
                    Some('\n') => {}
                    Some(other) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => {
                        return Err(SyntaxError::new(
                            "unterminated string literal",
                            line,
                            column,
                        ));
                    }
                },
                Some(c) => value.push(c),
            }
        }
        Ok(self.token(TokenKind::Str(value), line, column))
    }

    fn punctuation(&mut self) -> Result<Token, SyntaxError> {
        let (line, column) = (self.line, self.column);
        for p in PUNCTUATION {
            let matches = p
                .chars()
                .enumerate()
                .all(|(i, c)| self.peek_at(i) == Some(c));
            if matches {
                for _ in 0..p.chars().count() {
                    self.bump();
                }
                match *p {
                    "(" | "[" | "{" => self.depth += 1,
                    ")" | "]" | "}" => self.depth = self.depth.saturating_sub(1),
                    _ => {}
                }
                return Ok(self.token(TokenKind::Punct(p), line, column));
            }
        }
        let c = self.peek().unwrap_or('?');
        Err(self.error(format!("invalid character '{}'", c)))
    }
}

/// Tokenize a whole fragment. The result always ends with
/// [`TokenKind::Eof`], preceded by a [`TokenKind::Newline`] when the
/// fragment is not empty.
pub fn tokenize(source: &str) -> Result<Vec<Token>, SyntaxError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let eof = token.kind == TokenKind::Eof;
        tokens.push(token);
        if eof {
            return Ok(tokens);
        }
    }
}
