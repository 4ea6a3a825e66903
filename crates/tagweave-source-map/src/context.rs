//! Registry of source files

use crate::line_index::LineIndex;
use crate::source_info::SourceInfo;
use crate::types::{FileId, Location, Range};
use serde::{Deserialize, Serialize};

/// Context for managing source files
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceContext {
    files: Vec<SourceFile>,
}

/// A registered file: its name, its text and a line index over the text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    /// File path or display name
    pub path: String,
    /// Full text of the file
    pub content: String,
    /// Line starts of `content`
    pub index: LineIndex,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        let index = LineIndex::new(&content);
        SourceFile {
            path: path.into(),
            content,
            index,
        }
    }

    /// Convert a byte offset into a [`Location`].
    ///
    /// Columns count characters, not bytes. Offsets that do not fall on a
    /// character boundary are rejected.
    pub fn location(&self, offset: usize) -> Option<Location> {
        let row = self.index.row_of(offset)?;
        let line_start = self.index.line_start(row)?;
        let column = self.content.get(line_start..offset)?.chars().count();
        Some(Location {
            offset,
            row,
            column,
        })
    }

    /// The text of row `row`, without its line terminator.
    pub fn line_text(&self, row: usize) -> Option<&str> {
        let start = self.index.line_start(row)?;
        let end = self
            .index
            .line_start(row + 1)
            .map_or(self.content.len(), |next| next - 1);
        self.content
            .get(start..end)
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
    }
}

impl SourceContext {
    /// Create a new empty source context
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file and return its ID.
    pub fn add_file(&mut self, path: impl Into<String>, content: impl Into<String>) -> FileId {
        let id = FileId(self.files.len());
        self.files.push(SourceFile::new(path, content));
        id
    }

    pub fn get_file(&self, id: FileId) -> Option<&SourceFile> {
        self.files.get(id.0)
    }

    /// Build a [`SourceInfo`] for the byte range `start..end` of a file.
    pub fn source_info(&self, id: FileId, start: usize, end: usize) -> Option<SourceInfo> {
        let file = self.get_file(id)?;
        let range = Range {
            start: file.location(start)?,
            end: file.location(end)?,
        };
        Some(SourceInfo::new(id, range))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
