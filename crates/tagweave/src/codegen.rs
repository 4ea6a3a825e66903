/*
 * codegen.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Turns a document into a [`Program`].
//!
//! The generator is a [`MarkupHandler`]: each scanner event is classified
//! into a [`TagAction`] and appended to the program under construction.
//! Ordinary markup becomes literal text, control tags become fragment code,
//! and `<py>` ... `</py>` pairs whose code ends in `:` delimit blocks.
//!
//! Every emitted statement is recorded in the line map with the document
//! position and the markup that produced it, so failures found later (a
//! syntax error in a fragment, a runtime error) can be reported against the
//! document.

use std::ops::Range;

use tagweave_source_map::{FileId, SourceContext, SourceInfo};
use tracing::debug;

use crate::attrs::{AttrExpansion, DIRECTIVE};
use crate::error::{TemplateError, TemplateResult};
use crate::fragment::{Header, StmtKind, parse_expression, parse_fragment};
use crate::markup::{self, EndTag, MarkupError, MarkupHandler, ScanError, Tag};
use crate::program::{
    FrameError, FrameKind, Instruction, MAX_BLOCK_DEPTH, Program, ProgramBuilder,
};
use crate::security::Denylist;

/// What a tag asks the generator to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagAction {
    /// `<py code="...">`: code that may open a block
    ControlBlock { code: String },
    /// `<py code="..."/>`: code that must not open a block
    ControlCode { code: String },
    /// `<py expr="..."/>`
    ControlExpr { expr: String },
    /// `<py include="..."/>`
    ControlInclude { target: String },
    /// Any other tag, with its `attrs` directive if present
    OrdinaryMarkup { dynamic: Option<String> },
}

const SELF_CLOSING_ATTRIBUTES: [&str; 3] = ["code", "expr", "include"];

impl TagAction {
    /// Classify a start or self-closing tag.
    pub fn classify(tag: &Tag<'_>, self_closing: bool, control_tag: &str) -> TemplateResult<Self> {
        if tag.name != control_tag {
            return Ok(TagAction::OrdinaryMarkup {
                dynamic: tag.attribute(DIRECTIVE).map(str::to_string),
            });
        }

        if !self_closing {
            for attr in &tag.attributes {
                match attr.name.as_str() {
                    "code" => {}
                    "expr" => return Err(TemplateError::ExprAttributeMisuse),
                    other => {
                        return Err(TemplateError::UnknownAttribute {
                            name: other.to_string(),
                        });
                    }
                }
            }
            return match tag.attribute("code") {
                Some(code) => Ok(TagAction::ControlBlock {
                    code: code.to_string(),
                }),
                None => Err(TemplateError::MissingAttribute {
                    expected: "\"code\"".to_string(),
                }),
            };
        }

        if let Some(attr) = tag
            .attributes
            .iter()
            .find(|a| !SELF_CLOSING_ATTRIBUTES.contains(&a.name.as_str()))
        {
            return Err(TemplateError::UnknownAttribute {
                name: attr.name.clone(),
            });
        }
        let present: Vec<&str> = SELF_CLOSING_ATTRIBUTES
            .into_iter()
            .filter(|name| tag.has_attribute(name))
            .collect();
        match present.as_slice() {
            [] => Err(TemplateError::MissingAttribute {
                expected: "\"code\", \"expr\" or \"include\"".to_string(),
            }),
            [first, second, ..] => Err(TemplateError::ConflictingAttributes {
                first: first.to_string(),
                second: second.to_string(),
            }),
            [name] => {
                let value = tag.attribute(name).unwrap_or_default().to_string();
                Ok(match *name {
                    "code" => TagAction::ControlCode { code: value },
                    "expr" => TagAction::ControlExpr { expr: value },
                    _ => TagAction::ControlInclude { target: value },
                })
            }
        }
    }
}

/// A compile-time failure with its document position.
#[derive(Debug)]
pub(crate) struct LocatedError {
    pub error: TemplateError,
    pub location: Option<SourceInfo>,
    pub text: String,
}

/// A control tag that has not been closed yet.
#[derive(Debug)]
struct OpenBlock {
    location: SourceInfo,
    text: String,
    opens_block: bool,
}

/// Listing form of a literal text statement.
fn text_statement(text: &str) -> String {
    let escaped = text.replace('\\', "\\\\").replace('"', "\\\"");
    format!("print(\"\"\"{}\"\"\", end=\"\")", escaped)
}

/// Builds a program from markup events.
///
/// `include` renders an included document and returns its output; it is
/// called with the target exactly as written in the tag.
pub(crate) struct CodeGenerator<'a, F> {
    control_tag: &'a str,
    denylist: &'a Denylist,
    sources: SourceContext,
    file: FileId,
    builder: ProgramBuilder,
    blocks: Vec<OpenBlock>,
    helper_counter: usize,
    include: F,
}

impl<'a, F> CodeGenerator<'a, F>
where
    F: FnMut(&str) -> TemplateResult<String>,
{
    pub(crate) fn new(
        document: &str,
        source: &str,
        control_tag: &'a str,
        denylist: &'a Denylist,
        include: F,
    ) -> Self {
        let mut sources = SourceContext::new();
        let file = sources.add_file(document, source);
        CodeGenerator {
            control_tag,
            denylist,
            sources,
            file,
            builder: ProgramBuilder::new(),
            blocks: Vec::new(),
            helper_counter: 0,
            include,
        }
    }

    /// Current block depth of the generated program.
    #[cfg(test)]
    pub(crate) fn indent(&self) -> usize {
        self.builder.indent()
    }

    /// Number of control tags still open.
    #[cfg(test)]
    pub(crate) fn open_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Scan `source` and generate its program.
    pub(crate) fn generate(mut self, source: &str) -> Result<Program, LocatedError> {
        match markup::scan(source, &mut self) {
            Ok(()) => {}
            Err(ScanError::Handler(e)) => return Err(e),
            Err(ScanError::Markup(e)) => return Err(self.markup_error(e)),
        }
        self.finish()
    }

    fn finish(self) -> Result<Program, LocatedError> {
        if let Some(open) = self.blocks.last() {
            return Err(LocatedError {
                error: TemplateError::UnclosedBlock {
                    line: open.location.start_line(),
                    column: open.location.range.start.column + 1,
                },
                location: Some(open.location),
                text: open.text.clone(),
            });
        }
        let program = self.builder.finish();
        debug!(
            statements = program.statement_count(),
            "generated program"
        );
        Ok(program)
    }

    fn locate(&self, span: &Range<usize>) -> SourceInfo {
        self.sources
            .source_info(self.file, span.start, span.end)
            .unwrap_or_default()
    }

    fn at(&self, error: TemplateError, span: &Range<usize>, text: &str) -> LocatedError {
        LocatedError {
            error,
            location: Some(self.locate(span)),
            text: text.to_string(),
        }
    }

    fn markup_error(&self, e: MarkupError) -> LocatedError {
        let location = self.sources.source_info(self.file, e.offset, e.offset);
        let text = location
            .and_then(|loc| {
                self.sources
                    .get_file(self.file)
                    .and_then(|file| file.line_text(loc.range.start.row))
            })
            .unwrap_or_default()
            .to_string();
        LocatedError {
            error: TemplateError::Markup { message: e.message },
            location,
            text,
        }
    }

    /// A syntax error at generated `line`, positioned through the line map.
    fn syntax_error(&self, line: usize, message: impl Into<String>) -> LocatedError {
        let (location, text) = match self.builder.line_map().lookup(line) {
            Some((_, entry)) => (Some(entry.location), entry.text.clone()),
            None => (None, String::new()),
        };
        LocatedError {
            error: TemplateError::Syntax {
                message: message.into(),
            },
            location,
            text,
        }
    }

    fn emit_text(&mut self, text: &str, location: SourceInfo, origin: &str) {
        let line = self.builder.emit(&text_statement(text), location, origin);
        self.builder.push(Instruction::Text {
            text: text.to_string(),
            line,
        });
    }

    /// Emit one code fragment. Returns whether it opened a block.
    fn emit_code(
        &mut self,
        code: &str,
        location: SourceInfo,
        origin: &str,
    ) -> Result<bool, LocatedError> {
        let line = self.builder.emit(code, location, origin);
        let fragment =
            parse_fragment(code).map_err(|e| self.syntax_error(line + e.line, e.message))?;

        if !self.builder.in_loop()
            && let Some(stmt) = fragment
                .body
                .iter()
                .find(|s| matches!(s.kind, StmtKind::Break | StmtKind::Continue))
        {
            let keyword = if stmt.kind == StmtKind::Break {
                "break"
            } else {
                "continue"
            };
            return Err(self.syntax_error(
                line + stmt.line,
                format!("'{}' outside loop", keyword),
            ));
        }
        if !fragment.body.is_empty() {
            self.builder.push(Instruction::Exec {
                body: fragment.body,
                line,
            });
        }

        let Some((header, header_line)) = fragment.header else {
            return Ok(false);
        };
        let kind = match header {
            Header::For { targets, iter } => FrameKind::For { targets, iter },
            Header::While(cond) => FrameKind::While { cond },
            Header::If(cond) => FrameKind::If { cond },
            Header::Elif(cond) => FrameKind::Elif { cond },
            Header::Else => FrameKind::Else,
        };
        self.builder.open(kind, line).map_err(|e| match e {
            FrameError::DanglingBranch(keyword) => self.syntax_error(
                line + header_line,
                format!("'{}' must follow an 'if' block", keyword),
            ),
            FrameError::TooDeep => self.syntax_error(
                line + header_line,
                format!("too many nested blocks (limit {})", MAX_BLOCK_DEPTH),
            ),
        })?;
        Ok(true)
    }

    fn control_start(&mut self, tag: &Tag<'_>, code: &str) -> Result<(), LocatedError> {
        let code = code.trim_end();
        let location = self.locate(&tag.span);
        self.denylist
            .screen(code)
            .map_err(|e| self.at(e, &tag.span, tag.raw))?;
        let opens_block = self.emit_code(code, location, tag.raw)?;
        if opens_block != code.ends_with(':') {
            let message = if opens_block {
                "a block header must be the last thing in its fragment"
            } else {
                "fragment ends with ':' but is not a block header"
            };
            return Err(self.at(
                TemplateError::Syntax {
                    message: message.to_string(),
                },
                &tag.span,
                tag.raw,
            ));
        }
        self.blocks.push(OpenBlock {
            location,
            text: tag.raw.to_string(),
            opens_block,
        });
        Ok(())
    }

    fn control_code(&mut self, tag: &Tag<'_>, code: &str) -> Result<(), LocatedError> {
        let code = code.trim_end();
        if code.ends_with(':') {
            return Err(self.at(
                TemplateError::IllegalBlockOpener {
                    fragment: code.to_string(),
                },
                &tag.span,
                tag.raw,
            ));
        }
        let location = self.locate(&tag.span);
        self.denylist
            .screen(code)
            .map_err(|e| self.at(e, &tag.span, tag.raw))?;
        if self.emit_code(code, location, tag.raw)? {
            // a header followed by a trailing comment
            return Err(self.at(
                TemplateError::IllegalBlockOpener {
                    fragment: code.to_string(),
                },
                &tag.span,
                tag.raw,
            ));
        }
        Ok(())
    }

    fn control_expr(&mut self, tag: &Tag<'_>, expr: &str) -> Result<(), LocatedError> {
        let expr = expr.trim();
        let location = self.locate(&tag.span);
        self.denylist
            .screen(expr)
            .map_err(|e| self.at(e, &tag.span, tag.raw))?;
        let line = self
            .builder
            .emit(&format!("print({}, end=\"\")", expr), location, tag.raw);
        let parsed =
            parse_expression(expr).map_err(|e| self.syntax_error(line + e.line, e.message))?;
        self.builder.push(Instruction::Echo { expr: parsed, line });
        Ok(())
    }

    fn control_include(&mut self, tag: &Tag<'_>, target: &str) -> Result<(), LocatedError> {
        let output = (self.include)(target).map_err(|e| self.at(e, &tag.span, tag.raw))?;
        let location = self.locate(&tag.span);
        self.emit_text(&output, location, tag.raw);
        Ok(())
    }

    fn dynamic_attributes(
        &mut self,
        tag: &Tag<'_>,
        directive: &str,
        self_closing: bool,
    ) -> Result<(), LocatedError> {
        let expansion = AttrExpansion::new(tag, directive, self_closing, self.helper_counter);
        self.helper_counter += 1;
        let location = self.locate(&tag.span);

        self.emit_text(&expansion.prefix, location, tag.raw);
        self.denylist
            .screen(&expansion.directive)
            .map_err(|e| self.at(e, &tag.span, tag.raw))?;
        for statement in expansion.statements() {
            match statement {
                Some(code) => {
                    self.emit_code(&code, location, tag.raw)?;
                }
                None => self.builder.close(),
            }
        }
        self.emit_text(expansion.suffix, location, tag.raw);
        Ok(())
    }

    fn tag(&mut self, tag: &Tag<'_>, self_closing: bool) -> Result<(), LocatedError> {
        let action = TagAction::classify(tag, self_closing, self.control_tag)
            .map_err(|e| self.at(e, &tag.span, tag.raw))?;
        match action {
            TagAction::ControlBlock { code } => self.control_start(tag, &code),
            TagAction::ControlCode { code } => self.control_code(tag, &code),
            TagAction::ControlExpr { expr } => self.control_expr(tag, &expr),
            TagAction::ControlInclude { target } => self.control_include(tag, &target),
            TagAction::OrdinaryMarkup {
                dynamic: Some(directive),
            } => self.dynamic_attributes(tag, &directive, self_closing),
            TagAction::OrdinaryMarkup { dynamic: None } => {
                let location = self.locate(&tag.span);
                self.emit_text(tag.raw, location, tag.raw);
                Ok(())
            }
        }
    }
}

impl<F> MarkupHandler for CodeGenerator<'_, F>
where
    F: FnMut(&str) -> TemplateResult<String>,
{
    type Error = LocatedError;

    fn start_tag(&mut self, tag: &Tag<'_>) -> Result<(), LocatedError> {
        self.tag(tag, false)
    }

    fn empty_tag(&mut self, tag: &Tag<'_>) -> Result<(), LocatedError> {
        self.tag(tag, true)
    }

    fn end_tag(&mut self, tag: &EndTag<'_>) -> Result<(), LocatedError> {
        if tag.name != self.control_tag {
            let location = self.locate(&tag.span);
            self.emit_text(tag.raw, location, tag.raw);
            return Ok(());
        }
        let Some(open) = self.blocks.pop() else {
            return Err(self.at(
                TemplateError::UnmatchedClose {
                    tag: tag.name.clone(),
                },
                &tag.span,
                tag.raw,
            ));
        };
        if open.opens_block {
            self.builder.close();
        }
        Ok(())
    }

    fn text(&mut self, raw: &str, span: Range<usize>) -> Result<(), LocatedError> {
        if raw.trim().is_empty() {
            return Ok(());
        }
        let location = self.locate(&span);
        self.emit_text(raw, location, raw);
        Ok(())
    }

    fn declaration(&mut self, decl: &str, span: Range<usize>) -> Result<(), LocatedError> {
        let text = format!("<!{}>", decl);
        let location = self.locate(&span);
        self.emit_text(&text, location, &text);
        Ok(())
    }
}
