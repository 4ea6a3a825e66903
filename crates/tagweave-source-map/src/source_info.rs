//! Source information for diagnostics

use crate::types::{FileId, Range};
use serde::{Deserialize, Serialize};

/// A range inside one registered file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// File the range belongs to
    pub file_id: FileId,
    /// The range itself
    pub range: Range,
}

impl SourceInfo {
    pub fn new(file_id: FileId, range: Range) -> Self {
        SourceInfo { file_id, range }
    }

    pub fn start_offset(&self) -> usize {
        self.range.start.offset
    }

    pub fn end_offset(&self) -> usize {
        self.range.end.offset
    }

    /// 1-indexed line of the start of the range, as shown to users.
    pub fn start_line(&self) -> usize {
        self.range.start.row + 1
    }
}
