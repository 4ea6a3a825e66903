/*
 * security.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Identifier screen for fragment code.
//!
//! Every fragment is tokenized before it is emitted, and any identifier on
//! the denylist rejects the document. This is a shallow, lexical screen
//! against the obvious escape hatches (imports, dynamic evaluation, host
//! introspection); it is not a sandbox.

use crate::error::TemplateError;
use crate::fragment::{Lexer, TokenKind};

/// Names rejected in every fragment.
pub const DEFAULT_DENYLIST: &[&str] = &[
    // module imports
    "import",
    "__import__",
    // dynamic code execution
    "exec",
    "eval",
    "compile",
    // host introspection
    "__builtins__",
    "globals",
    "locals",
    "vars",
    "getattr",
    "setattr",
    "delattr",
    "__class__",
    "__subclasses__",
    "__globals__",
    "__dict__",
];

/// The set of forbidden identifiers for one engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denylist {
    names: Vec<String>,
}

impl Default for Denylist {
    fn default() -> Self {
        Denylist {
            names: DEFAULT_DENYLIST.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Denylist {
    /// The default denylist extended with `extra` names.
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Denylist::default();
        for name in extra {
            let name = name.into();
            if !list.contains(&name) {
                list.names.push(name);
            }
        }
        list
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Scan `fragment` and fail on the first forbidden identifier.
    ///
    /// Lexing stops quietly at the first lexical error: the tokens read so
    /// far are still screened, and the error itself is reported by the
    /// parser.
    ///
    /// ```
    /// use tagweave::security::Denylist;
    ///
    /// let denylist = Denylist::default();
    /// assert!(denylist.screen("total = price * 2").is_ok());
    /// assert!(denylist.screen("x = eval('1')").is_err());
    /// ```
    pub fn screen(&self, fragment: &str) -> Result<(), TemplateError> {
        let mut lexer = Lexer::new(fragment);
        while let Ok(token) = lexer.next_token() {
            match token.kind {
                TokenKind::Eof => break,
                TokenKind::Name(name) if self.contains(&name) => {
                    return Err(TemplateError::ForbiddenName { name });
                }
                _ => {}
            }
        }
        Ok(())
    }
}
