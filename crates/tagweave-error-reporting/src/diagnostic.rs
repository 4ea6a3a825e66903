//! Core diagnostic message types.
//!
//! A [`DiagnosticMessage`] is the structured form of every error tagweave
//! surfaces: title, optional code, problem statement, details, hints and the
//! document location the problem was traced back to.

use serde::{Deserialize, Serialize};
use tagweave_source_map::{SourceContext, SourceInfo};

/// The kind of diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// An error that prevents completion
    Error,
    /// A problem that does not prevent completion
    Warning,
    /// Informational message
    Info,
}

impl DiagnosticKind {
    fn label(self) -> &'static str {
        match self {
            DiagnosticKind::Error => "Error",
            DiagnosticKind::Warning => "Warning",
            DiagnosticKind::Info => "Info",
        }
    }
}

/// How detail items should be presented (tidyverse x/i bullet style).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetailKind {
    /// Error detail (✖ bullet)
    Error,
    /// Info detail (ℹ bullet)
    Info,
    /// Note detail (plain bullet)
    Note,
}

impl DetailKind {
    fn bullet(self) -> &'static str {
        match self {
            DetailKind::Error => "✖",
            DetailKind::Info => "ℹ",
            DetailKind::Note => "•",
        }
    }
}

/// A detail item in a diagnostic message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailItem {
    pub kind: DetailKind,
    pub content: String,
    /// Optional location this detail points at, shown as an extra label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceInfo>,
}

/// A diagnostic message following tidyverse-style structure.
///
/// 1. **Code**: optional error code (e.g., "T-2-6")
/// 2. **Title**: brief error message
/// 3. **Kind**: error, warning or info
/// 4. **Problem**: what went wrong
/// 5. **Details**: specific information, as bullets
/// 6. **Hints**: optional guidance, ending with `?`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    pub title: String,

    pub kind: DiagnosticKind,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,

    pub details: Vec<DetailItem>,

    pub hints: Vec<String>,

    /// Where in the document the problem was located
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceInfo>,
}

impl DiagnosticMessage {
    /// Create a new diagnostic message with just a title and kind.
    ///
    /// Prefer [`crate::DiagnosticMessageBuilder`] for anything with details.
    pub fn new(kind: DiagnosticKind, title: impl Into<String>) -> Self {
        Self {
            code: None,
            title: title.into(),
            kind,
            problem: None,
            details: Vec::new(),
            hints: Vec::new(),
            location: None,
        }
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Error, title)
    }

    pub fn warning(title: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Warning, title)
    }

    /// Title prefixed with the error code, e.g. `[T-2-6] Unmatched Closing Tag`.
    pub fn headline(&self) -> String {
        match &self.code {
            Some(code) => format!("[{}] {}", code, self.title),
            None => self.title.clone(),
        }
    }

    /// Render this diagnostic message as text.
    ///
    /// Without a source context (or without a location) the output is plain
    /// tidyverse style:
    ///
    /// ```text
    /// Error [T-2-6]: Unmatched Closing Tag
    /// Problem statement here
    /// ✖ Error detail
    /// ℹ Info detail
    /// ? Hint
    /// ```
    ///
    /// With both, the title, problem and located details are drawn by ariadne
    /// over the document text, followed by unlocated details and hints.
    pub fn to_text(&self, ctx: Option<&SourceContext>) -> String {
        let mut result = String::new();

        let ariadne = match (&self.location, ctx) {
            (Some(location), Some(ctx)) => self.render_ariadne_source_context(location, ctx),
            _ => None,
        };

        match ariadne {
            Some(rendered) => {
                result.push_str(&rendered);
                for detail in self.details.iter().filter(|d| d.location.is_none()) {
                    result.push_str(&format!("{} {}\n", detail.kind.bullet(), detail.content));
                }
            }
            None => {
                match &self.code {
                    Some(code) => result.push_str(&format!(
                        "{} [{}]: {}\n",
                        self.kind.label(),
                        code,
                        self.title
                    )),
                    None => result.push_str(&format!("{}: {}\n", self.kind.label(), self.title)),
                }
                if let Some(problem) = &self.problem {
                    result.push_str(problem);
                    result.push('\n');
                }
                for detail in &self.details {
                    result.push_str(&format!("{} {}\n", detail.kind.bullet(), detail.content));
                }
            }
        }

        for hint in &self.hints {
            result.push_str(&format!("? {}\n", hint));
        }

        result
    }

    /// Render this diagnostic message as a JSON value.
    ///
    /// ```
    /// use tagweave_error_reporting::DiagnosticMessage;
    ///
    /// let msg = DiagnosticMessage::error("Something went wrong");
    /// let json = msg.to_json();
    /// assert_eq!(json["kind"], "error");
    /// assert_eq!(json["title"], "Something went wrong");
    /// ```
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::json;

        let mut obj = json!({
            "kind": self.kind.label().to_lowercase(),
            "title": self.title,
        });

        if let Some(code) = &self.code {
            obj["code"] = json!(code);
        }
        if let Some(problem) = &self.problem {
            obj["problem"] = json!(problem);
        }
        if !self.details.is_empty() {
            let details: Vec<_> = self
                .details
                .iter()
                .map(|d| {
                    let mut detail = json!({
                        "kind": format!("{:?}", d.kind).to_lowercase(),
                        "content": d.content,
                    });
                    if let Some(location) = &d.location {
                        detail["location"] = json!(location);
                    }
                    detail
                })
                .collect();
            obj["details"] = json!(details);
        }
        if !self.hints.is_empty() {
            obj["hints"] = json!(self.hints);
        }
        if let Some(location) = &self.location {
            obj["location"] = json!(location);
        }

        obj
    }

    fn render_ariadne_source_context(
        &self,
        location: &SourceInfo,
        ctx: &SourceContext,
    ) -> Option<String> {
        use ariadne::{Color, Config, Label, Report, ReportKind, Source};

        let file = ctx.get_file(location.file_id)?;
        let content = file.content.as_str();

        // ariadne spans count characters, SourceInfo counts bytes
        let char_offset = |byte: usize| content.get(..byte).map(|s| s.chars().count());
        let start = char_offset(location.start_offset())?;
        let end = char_offset(location.end_offset())?.max(start);

        let (report_kind, main_color) = match self.kind {
            DiagnosticKind::Error => (ReportKind::Error, Color::Red),
            DiagnosticKind::Warning => (ReportKind::Warning, Color::Yellow),
            DiagnosticKind::Info => (ReportKind::Advice, Color::Cyan),
        };

        let main_message = self.problem.as_deref().unwrap_or(&self.title);

        let mut report = Report::build(report_kind, file.path.clone(), start)
            .with_config(Config::default().with_color(false))
            .with_message(self.headline())
            .with_label(
                Label::new((file.path.clone(), start..end))
                    .with_message(main_message)
                    .with_color(main_color),
            );

        for detail in &self.details {
            let Some(detail_loc) = &detail.location else {
                continue;
            };
            if detail_loc.file_id != location.file_id {
                continue;
            }
            if let (Some(detail_start), Some(detail_end)) = (
                char_offset(detail_loc.start_offset()),
                char_offset(detail_loc.end_offset()),
            ) {
                let color = match detail.kind {
                    DetailKind::Error => Color::Red,
                    DetailKind::Info => Color::Cyan,
                    DetailKind::Note => Color::Blue,
                };
                report = report.with_label(
                    Label::new((file.path.clone(), detail_start..detail_end.max(detail_start)))
                        .with_message(detail.content.as_str())
                        .with_color(color),
                );
            }
        }

        let mut output = Vec::new();
        report
            .finish()
            .write((file.path.clone(), Source::from(content)), &mut output)
            .ok()?;

        String::from_utf8(output).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DiagnosticMessageBuilder;

    #[test]
    fn test_diagnostic_message_new() {
        let msg = DiagnosticMessage::new(DiagnosticKind::Error, "Test error");
        assert_eq!(msg.title, "Test error");
        assert!(msg.code.is_none());
        assert!(msg.problem.is_none());
        assert!(msg.details.is_empty());
    }

    #[test]
    fn test_headline() {
        let msg = DiagnosticMessage::error("Unclosed Block");
        assert_eq!(msg.headline(), "Unclosed Block");

        let mut coded = msg.clone();
        coded.code = Some("T-2-7".to_string());
        assert_eq!(coded.headline(), "[T-2-7] Unclosed Block");
    }

    #[test]
    fn test_to_text_full_message() {
        let msg = DiagnosticMessageBuilder::error("Forbidden Name")
            .with_code("T-3-1")
            .problem("Fragments cannot use `exec`")
            .add_detail("Found in `<py code=\"exec(x)\">`")
            .add_info("The name screen is lexical")
            .add_hint("Remove the call?")
            .build();

        let text = msg.to_text(None);
        assert!(text.starts_with("Error [T-3-1]: Forbidden Name\n"));
        assert!(text.contains("Fragments cannot use `exec`\n"));
        assert!(text.contains("✖ Found in"));
        assert!(text.contains("ℹ The name screen is lexical"));
        assert!(text.ends_with("? Remove the call?\n"));
    }

    #[test]
    fn test_location_without_context_falls_back_to_plain() {
        let mut ctx = SourceContext::new();
        let file_id = ctx.add_file("page.html", "<p>\n</py>\n");
        let location = ctx.source_info(file_id, 4, 9).unwrap();

        let msg = DiagnosticMessageBuilder::error("Unmatched Closing Tag")
            .with_location(location)
            .build();

        assert_eq!(msg.to_text(None), "Error: Unmatched Closing Tag\n");
    }

    #[test]
    fn test_location_with_context_uses_ariadne() {
        let mut ctx = SourceContext::new();
        let file_id = ctx.add_file("page.html", "<p>\n</py>\n");
        let location = ctx.source_info(file_id, 4, 9).unwrap();

        let msg = DiagnosticMessageBuilder::error("Unmatched Closing Tag")
            .with_code("T-2-6")
            .problem("no control tag is open here")
            .with_location(location)
            .add_hint("Remove the closing tag?")
            .build();

        let text = msg.to_text(Some(&ctx));
        assert!(text.contains("[T-2-6] Unmatched Closing Tag"));
        assert!(text.contains("page.html"));
        assert!(text.contains("</py>"));
        assert!(text.contains("no control tag is open here"));
        assert!(text.contains("? Remove the closing tag?"));
    }

    #[test]
    fn test_to_json_full_message() {
        let mut ctx = SourceContext::new();
        let file_id = ctx.add_file("page.html", "<py code=\"x\">");
        let location = ctx.source_info(file_id, 0, 13).unwrap();

        let msg = DiagnosticMessageBuilder::error("Unclosed Block")
            .with_code("T-2-7")
            .problem("the tag is never closed")
            .add_detail("opened here")
            .add_hint("Add `</py>`?")
            .with_location(location)
            .build();

        let json = msg.to_json();
        assert_eq!(json["kind"], "error");
        assert_eq!(json["code"], "T-2-7");
        assert_eq!(json["problem"], "the tag is never closed");
        assert_eq!(json["details"][0]["kind"], "error");
        assert_eq!(json["details"][0]["content"], "opened here");
        assert_eq!(json["hints"][0], "Add `</py>`?");
        assert_eq!(json["location"]["range"]["end"]["offset"], 13);
    }

    #[test]
    fn test_to_json_omits_empty_fields() {
        let json = DiagnosticMessage::warning("Heads up").to_json();
        assert_eq!(json["kind"], "warning");
        assert!(json.get("code").is_none());
        assert!(json.get("details").is_none());
        assert!(json.get("location").is_none());
    }
}
