/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for compiling and rendering documents.
//!
//! [`TemplateError`] says what went wrong. [`RenderError`] is what callers
//! receive: the failure together with the document, the line and the literal
//! markup that triggered it.

use std::fmt;
use std::sync::Arc;

use tagweave_error_reporting::{DiagnosticMessage, DiagnosticMessageBuilder, get_error_info};
use tagweave_source_map::{SourceContext, SourceInfo};
use thiserror::Error;

/// Errors that can occur while compiling or rendering a document.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// A control tag lacks its required attribute(s).
    #[error("control tag is missing attribute {expected}")]
    MissingAttribute { expected: String },

    /// A control tag carries an attribute it does not understand.
    #[error("unknown attribute \"{name}\" on control tag")]
    UnknownAttribute { name: String },

    /// `expr` used on a control tag that is not self-closing.
    #[error("attribute \"expr\" is only supported on self-closing control tags")]
    ExprAttributeMisuse,

    /// A self-closing control tag whose code ends with `:`.
    #[error("a self-closing control tag cannot open a block: {fragment}")]
    IllegalBlockOpener { fragment: String },

    /// More than one of `code`, `expr` and `include` on a self-closing tag.
    #[error("control tag cannot have both \"{first}\" and \"{second}\"")]
    ConflictingAttributes { first: String, second: String },

    /// A closing control tag with no open control tag.
    #[error("unexpected closing tag </{tag}>")]
    UnmatchedClose { tag: String },

    /// The document ended with a control tag still open.
    #[error("unclosed control tag opened at line {line} column {column}")]
    UnclosedBlock { line: usize, column: usize },

    /// A fragment uses a denylisted identifier.
    #[error("forbidden name \"{name}\"")]
    ForbiddenName { name: String },

    /// The markup scanner rejected the document.
    #[error("malformed markup: {message}")]
    Markup { message: String },

    /// A fragment does not parse.
    #[error("SyntaxError: {message}")]
    Syntax { message: String },

    /// A fragment failed while the program ran.
    #[error("{message}")]
    Execution { message: String },

    /// An included document failed to compile or render.
    #[error("error in included document \"{path}\": {source}")]
    IncludeFailure {
        path: String,
        source: Box<RenderError>,
    },

    /// A document includes itself, directly or transitively.
    #[error("include cycle: {}", chain.join(" -> "))]
    IncludeCycle { chain: Vec<String> },

    /// Includes are nested deeper than the configured limit.
    #[error("includes nested deeper than {max_depth} levels at \"{path}\"")]
    IncludeTooDeep { path: String, max_depth: usize },

    /// The resolver has no document at this path.
    #[error("document not found: {path}")]
    DocumentNotFound { path: String },

    /// I/O error while reading a document.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TemplateError {
    /// Stable error code, listed in the error catalog.
    pub fn code(&self) -> &'static str {
        match self {
            TemplateError::Markup { .. } => "T-1-1",
            TemplateError::MissingAttribute { .. } => "T-2-1",
            TemplateError::UnknownAttribute { .. } => "T-2-2",
            TemplateError::ExprAttributeMisuse => "T-2-3",
            TemplateError::IllegalBlockOpener { .. } => "T-2-4",
            TemplateError::ConflictingAttributes { .. } => "T-2-5",
            TemplateError::UnmatchedClose { .. } => "T-2-6",
            TemplateError::UnclosedBlock { .. } => "T-2-7",
            TemplateError::ForbiddenName { .. } => "T-3-1",
            TemplateError::Syntax { .. } => "T-4-1",
            TemplateError::Execution { .. } => "T-4-2",
            TemplateError::IncludeFailure { .. } => "T-5-1",
            TemplateError::IncludeCycle { .. } => "T-5-2",
            TemplateError::IncludeTooDeep { .. } => "T-5-3",
            TemplateError::DocumentNotFound { .. } | TemplateError::Io(_) => "T-5-4",
        }
    }

    fn hint(&self) -> Option<&'static str> {
        match self {
            TemplateError::MissingAttribute { .. } => {
                Some("Did you mean to write the code in a `code` attribute?")
            }
            TemplateError::ExprAttributeMisuse => {
                Some("Write the tag as self-closing, e.g. `<py expr=\"...\"/>`?")
            }
            TemplateError::IllegalBlockOpener { .. } => {
                Some("Use an opening and a closing control tag around the block body?")
            }
            TemplateError::UnmatchedClose { .. } => Some("Is there an extra closing tag?"),
            TemplateError::UnclosedBlock { .. } => {
                Some("Is the closing control tag missing?")
            }
            TemplateError::ForbiddenName { .. } => {
                Some("Compute the value in the render context instead?")
            }
            TemplateError::IncludeCycle { .. } => {
                Some("Remove one of the includes to break the cycle?")
            }
            _ => None,
        }
    }
}

/// Result type for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// A failure positioned in a document.
///
/// `Display` renders the composite report:
///
/// ```text
/// NameError: name 'missing' is not defined
/// Line 3 in document page.html
/// <py expr="missing"/>
/// ```
#[derive(Debug)]
pub struct RenderError {
    /// What went wrong
    pub error: TemplateError,
    /// Name of the document being rendered
    pub document: String,
    /// Where in the document, when known
    pub location: Option<SourceInfo>,
    /// The literal markup that triggered the failure
    pub text: String,
    source: Arc<str>,
}

impl RenderError {
    pub(crate) fn new(
        error: TemplateError,
        document: impl Into<String>,
        source: Arc<str>,
        location: Option<SourceInfo>,
        text: impl Into<String>,
    ) -> Self {
        RenderError {
            error,
            document: document.into(),
            location,
            text: text.into(),
            source,
        }
    }

    /// A failure with no position, such as a document that cannot be loaded.
    pub(crate) fn unpositioned(error: TemplateError, document: impl Into<String>) -> Self {
        RenderError::new(error, document, Arc::from(""), None, "")
    }

    /// 1-based document line, when known.
    pub fn line(&self) -> Option<usize> {
        self.location.map(|loc| loc.start_line())
    }

    /// 0-based column in characters, when known.
    pub fn column(&self) -> Option<usize> {
        self.location.map(|loc| loc.range.start.column)
    }

    pub fn code(&self) -> &'static str {
        self.error.code()
    }

    /// The innermost error, following include failures down to the document
    /// where the problem actually is.
    pub fn root_cause(&self) -> &TemplateError {
        match &self.error {
            TemplateError::IncludeFailure { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Structured diagnostic for this failure.
    pub fn to_diagnostic(&self) -> DiagnosticMessage {
        let code = self.code();
        let title = get_error_info(code)
            .map(|info| info.title.clone())
            .unwrap_or_else(|| "Render Error".to_string());

        let mut builder = DiagnosticMessageBuilder::error(title)
            .with_code(code)
            .problem(first_line(&self.error));

        if let TemplateError::IncludeFailure { source, .. } = &self.error {
            let cause = source.root_cause();
            let mut inner: &RenderError = source;
            while let TemplateError::IncludeFailure { source, .. } = &inner.error {
                inner = &**source;
            }
            let position = match inner.line() {
                Some(line) => format!("line {} of `{}`", line, inner.document),
                None => format!("`{}`", inner.document),
            };
            builder = builder.add_detail(format!("{} at {}", first_line(cause), position));
        }

        builder = builder.add_info(format!("In document `{}`", self.document));
        if !self.text.is_empty() {
            builder = builder.add_note(format!("Triggered by `{}`", self.text.trim()));
        }
        if let Some(hint) = self.error.hint() {
            builder = builder.add_hint(hint);
        }
        if let Some(location) = self.location {
            builder = builder.with_location(location);
        }
        builder.build()
    }

    /// Render the diagnostic with the offending markup shown in place.
    pub fn report(&self) -> String {
        let mut ctx = SourceContext::new();
        ctx.add_file(self.document.clone(), self.source.to_string());
        self.to_diagnostic().to_text(Some(&ctx))
    }
}

fn first_line(error: &TemplateError) -> String {
    let text = error.to_string();
    text.lines().next().unwrap_or_default().to_string()
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line() {
            Some(line) => write!(
                f,
                "{}\nLine {} in document {}\n{}",
                self.error, line, self.document, self.text
            ),
            None => write!(f, "{}\nin document {}", self.error, self.document),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagweave_error_reporting::ERROR_CATALOG;

    fn positioned(error: TemplateError) -> RenderError {
        let source = "<p>\n<py expr=\"missing\"/>\n</p>";
        let mut ctx = SourceContext::new();
        let id = ctx.add_file("page.html", source);
        let location = ctx.source_info(id, 4, 24);
        RenderError::new(
            error,
            "page.html",
            Arc::from(source),
            location,
            "<py expr=\"missing\"/>",
        )
    }

    #[test]
    fn test_every_code_is_in_catalog() {
        let errors = vec![
            TemplateError::MissingAttribute {
                expected: "\"code\"".to_string(),
            },
            TemplateError::UnknownAttribute {
                name: "x".to_string(),
            },
            TemplateError::ExprAttributeMisuse,
            TemplateError::IllegalBlockOpener {
                fragment: "if x:".to_string(),
            },
            TemplateError::ConflictingAttributes {
                first: "code".to_string(),
                second: "expr".to_string(),
            },
            TemplateError::UnmatchedClose {
                tag: "py".to_string(),
            },
            TemplateError::UnclosedBlock { line: 1, column: 0 },
            TemplateError::ForbiddenName {
                name: "exec".to_string(),
            },
            TemplateError::Markup {
                message: "bad".to_string(),
            },
            TemplateError::Syntax {
                message: "bad".to_string(),
            },
            TemplateError::Execution {
                message: "bad".to_string(),
            },
            TemplateError::IncludeCycle { chain: vec![] },
            TemplateError::IncludeTooDeep {
                path: "a".to_string(),
                max_depth: 1,
            },
            TemplateError::DocumentNotFound {
                path: "a".to_string(),
            },
        ];
        for error in errors {
            assert!(
                ERROR_CATALOG.contains_key(error.code()),
                "missing {}",
                error.code()
            );
        }
    }

    #[test]
    fn test_display_is_composite_report() {
        let err = positioned(TemplateError::Execution {
            message: "NameError: name 'missing' is not defined".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "NameError: name 'missing' is not defined\nLine 2 in document page.html\n<py expr=\"missing\"/>"
        );
        assert_eq!(err.line(), Some(2));
        assert_eq!(err.column(), Some(0));
    }

    #[test]
    fn test_display_without_location() {
        let err = RenderError::unpositioned(
            TemplateError::DocumentNotFound {
                path: "nope.html".to_string(),
            },
            "nope.html",
        );
        assert_eq!(
            err.to_string(),
            "document not found: nope.html\nin document nope.html"
        );
        assert_eq!(err.line(), None);
    }

    #[test]
    fn test_include_cycle_message() {
        let err = TemplateError::IncludeCycle {
            chain: vec!["a.html".to_string(), "b.html".to_string(), "a.html".to_string()],
        };
        assert_eq!(err.to_string(), "include cycle: a.html -> b.html -> a.html");
    }

    #[test]
    fn test_root_cause_follows_includes() {
        let inner = positioned(TemplateError::ForbiddenName {
            name: "exec".to_string(),
        });
        let outer = positioned(TemplateError::IncludeFailure {
            path: "inner.html".to_string(),
            source: Box::new(inner),
        });
        assert_eq!(outer.code(), "T-5-1");
        assert!(matches!(
            outer.root_cause(),
            TemplateError::ForbiddenName { name } if name == "exec"
        ));

        let diagnostic = outer.to_diagnostic();
        assert!(
            diagnostic
                .details
                .iter()
                .any(|d| d.content == "forbidden name \"exec\" at line 2 of `page.html`")
        );
    }

    #[test]
    fn test_to_diagnostic() {
        let err = positioned(TemplateError::ForbiddenName {
            name: "eval".to_string(),
        });
        let diagnostic = err.to_diagnostic();
        assert_eq!(diagnostic.code.as_deref(), Some("T-3-1"));
        assert_eq!(diagnostic.title, "Forbidden Name");
        assert_eq!(diagnostic.problem.as_deref(), Some("forbidden name \"eval\""));
        assert_eq!(diagnostic.location, err.location);
        assert_eq!(diagnostic.hints.len(), 1);
    }

    #[test]
    fn test_report_shows_markup() {
        let err = positioned(TemplateError::Execution {
            message: "NameError: name 'missing' is not defined".to_string(),
        });
        let report = err.report();
        assert!(report.contains("[T-4-2] Execution Failure"));
        assert!(report.contains("page.html"));
        assert!(report.contains("<py expr=\"missing\"/>"));
        assert!(report.contains("NameError: name 'missing' is not defined"));
    }
}
