//! Builder API for diagnostic messages.

use crate::diagnostic::{DetailItem, DetailKind, DiagnosticKind, DiagnosticMessage};
use tagweave_source_map::SourceInfo;

/// Builder for [`DiagnosticMessage`]s.
///
/// The method names mirror the tidyverse message structure: a problem
/// statement (`problem`), bulleted details (`add_detail`, `add_info`,
/// `add_note`) and hints (`add_hint`).
///
/// ```
/// use tagweave_error_reporting::DiagnosticMessageBuilder;
///
/// let msg = DiagnosticMessageBuilder::error("Unmatched Closing Tag")
///     .with_code("T-2-6")
///     .problem("A closing `</py>` has no matching opening tag")
///     .add_detail("Found on line 4")
///     .add_hint("Remove the closing tag?")
///     .build();
///
/// assert_eq!(msg.code.as_deref(), Some("T-2-6"));
/// assert_eq!(msg.details.len(), 1);
/// assert_eq!(msg.hints.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct DiagnosticMessageBuilder {
    message: DiagnosticMessage,
}

impl DiagnosticMessageBuilder {
    pub fn new(kind: DiagnosticKind, title: impl Into<String>) -> Self {
        Self {
            message: DiagnosticMessage::new(kind, title),
        }
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Error, title)
    }

    pub fn warning(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Warning, title)
    }

    pub fn info(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Info, title)
    }

    /// Set the error code, e.g. `"T-4-2"`.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.message.code = Some(code.into());
        self
    }

    /// Set the problem statement: what went wrong, in one sentence.
    pub fn problem(mut self, problem: impl Into<String>) -> Self {
        self.message.problem = Some(problem.into());
        self
    }

    /// Add an error detail (✖ bullet).
    pub fn add_detail(self, detail: impl Into<String>) -> Self {
        self.push_detail(DetailKind::Error, detail.into(), None)
    }

    /// Add an error detail that points at its own location.
    pub fn add_detail_at(self, detail: impl Into<String>, location: SourceInfo) -> Self {
        self.push_detail(DetailKind::Error, detail.into(), Some(location))
    }

    /// Add an info detail (ℹ bullet).
    pub fn add_info(self, info: impl Into<String>) -> Self {
        self.push_detail(DetailKind::Info, info.into(), None)
    }

    /// Add a note detail (plain bullet).
    pub fn add_note(self, note: impl Into<String>) -> Self {
        self.push_detail(DetailKind::Note, note.into(), None)
    }

    /// Add a hint. Hints should end with a question mark.
    pub fn add_hint(mut self, hint: impl Into<String>) -> Self {
        self.message.hints.push(hint.into());
        self
    }

    pub fn with_location(mut self, location: SourceInfo) -> Self {
        self.message.location = Some(location);
        self
    }

    pub fn build(self) -> DiagnosticMessage {
        self.message
    }

    fn push_detail(
        mut self,
        kind: DetailKind,
        content: String,
        location: Option<SourceInfo>,
    ) -> Self {
        self.message.details.push(DetailItem {
            kind,
            content,
            location,
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_collects_details_in_order() {
        let msg = DiagnosticMessageBuilder::error("Syntax Error")
            .add_detail("unexpected token `)`")
            .add_info("the fragment starts on line 3")
            .add_note("fragments use a small Python-like language")
            .build();

        let kinds: Vec<DetailKind> = msg.details.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![DetailKind::Error, DetailKind::Info, DetailKind::Note]
        );
        assert_eq!(msg.details[0].content, "unexpected token `)`");
    }

    #[test]
    fn test_builder_kinds() {
        assert_eq!(
            DiagnosticMessageBuilder::warning("w").build().kind,
            DiagnosticKind::Warning
        );
        assert_eq!(
            DiagnosticMessageBuilder::info("i").build().kind,
            DiagnosticKind::Info
        );
    }

    #[test]
    fn test_builder_location() {
        let location = SourceInfo::default();
        let msg = DiagnosticMessageBuilder::error("Unclosed Block")
            .with_location(location)
            .add_detail_at("opened here", location)
            .build();

        assert_eq!(msg.location, Some(location));
        assert_eq!(msg.details[0].location, Some(location));
    }
}
