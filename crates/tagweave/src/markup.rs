/*
 * markup.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Streaming markup scanner.
//!
//! Drives a lenient `quick_xml` reader over an HTML-like document and hands
//! each construct to a [`MarkupHandler`] in document order, together with its
//! exact source text and byte span. The scanner does not build a tree and
//! does not check that tags nest: void elements such as `<br>` and stray
//! closing tags are passed through as they are.

use std::ops::Range;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// An attribute of a start tag. Names are lower-cased; values are
/// entity-decoded when they decode cleanly and kept raw otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// A start tag or a self-closing tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag<'a> {
    /// Lower-cased tag name
    pub name: String,
    /// Attributes in document order
    pub attributes: Vec<Attribute>,
    /// The literal tag text, `<` through `>`
    pub raw: &'a str,
    pub span: Range<usize>,
}

impl Tag<'_> {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a.name == name)
    }
}

/// A closing tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndTag<'a> {
    /// Lower-cased tag name
    pub name: String,
    pub raw: &'a str,
    pub span: Range<usize>,
}

/// The scanner could not make sense of the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupError {
    pub message: String,
    /// Byte offset where the problem was detected
    pub offset: usize,
}

/// Receives markup events in document order.
///
/// Comments, CDATA sections and processing instructions default to being
/// treated as text.
pub trait MarkupHandler {
    type Error;

    fn start_tag(&mut self, tag: &Tag<'_>) -> Result<(), Self::Error>;

    fn empty_tag(&mut self, tag: &Tag<'_>) -> Result<(), Self::Error>;

    fn end_tag(&mut self, tag: &EndTag<'_>) -> Result<(), Self::Error>;

    fn text(&mut self, raw: &str, span: Range<usize>) -> Result<(), Self::Error>;

    /// A `<!...>` declaration such as a DOCTYPE. `decl` is the text between
    /// `<!` and `>`.
    fn declaration(&mut self, decl: &str, span: Range<usize>) -> Result<(), Self::Error>;

    fn comment(&mut self, raw: &str, span: Range<usize>) -> Result<(), Self::Error> {
        self.text(raw, span)
    }

    fn cdata(&mut self, raw: &str, span: Range<usize>) -> Result<(), Self::Error> {
        self.text(raw, span)
    }

    fn processing_instruction(&mut self, raw: &str, span: Range<usize>) -> Result<(), Self::Error> {
        self.text(raw, span)
    }
}

/// Why [`scan`] stopped.
#[derive(Debug)]
pub enum ScanError<E> {
    /// The input is not scannable markup
    Markup(MarkupError),
    /// The handler rejected an event
    Handler(E),
}

/// Scan `source`, dispatching every construct to `handler`.
pub fn scan<H: MarkupHandler>(source: &str, handler: &mut H) -> Result<(), ScanError<H::Error>> {
    let mut reader = Reader::from_str(source);
    let config = reader.config_mut();
    config.trim_text_start = false;
    config.trim_text_end = false;
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    loop {
        let start = reader.buffer_position() as usize;
        let event = reader.read_event().map_err(|e| {
            ScanError::Markup(MarkupError {
                message: e.to_string(),
                offset: reader.error_position() as usize,
            })
        })?;
        let end = reader.buffer_position() as usize;
        let span = start..end;
        let raw = source.get(span.clone()).unwrap_or_default();

        let dispatched = match event {
            Event::Start(e) => {
                let tag = make_tag(&e, raw, span).map_err(ScanError::Markup)?;
                handler.start_tag(&tag)
            }
            Event::Empty(e) => {
                let tag = make_tag(&e, raw, span).map_err(ScanError::Markup)?;
                handler.empty_tag(&tag)
            }
            Event::End(e) => {
                let tag = EndTag {
                    name: lower_name(e.name().as_ref()),
                    raw,
                    span,
                };
                handler.end_tag(&tag)
            }
            Event::Text(_) => handler.text(raw, span),
            Event::CData(_) => handler.cdata(raw, span),
            Event::Comment(_) => handler.comment(raw, span),
            Event::PI(_) | Event::Decl(_) => handler.processing_instruction(raw, span),
            Event::DocType(_) => {
                let decl = raw
                    .strip_prefix("<!")
                    .and_then(|r| r.strip_suffix('>'))
                    .unwrap_or(raw);
                handler.declaration(decl, span)
            }
            Event::Eof => return Ok(()),
        };
        dispatched.map_err(ScanError::Handler)?;
    }
}

fn lower_name(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).to_lowercase()
}

fn make_tag<'a>(
    e: &BytesStart<'_>,
    raw: &'a str,
    span: Range<usize>,
) -> Result<Tag<'a>, MarkupError> {
    let mut attributes = Vec::new();
    for attr in e.html_attributes() {
        let attr = attr.map_err(|err| MarkupError {
            message: format!("invalid attribute: {}", err),
            offset: span.start,
        })?;
        let value = match attr.unescape_value() {
            Ok(value) => value.into_owned(),
            Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
        };
        attributes.push(Attribute {
            name: lower_name(attr.key.as_ref()),
            value,
        });
    }

    Ok(Tag {
        name: lower_name(e.name().as_ref()),
        attributes,
        raw,
        span,
    })
}
