//! Line index for offset lookups

use serde::{Deserialize, Serialize};

/// Index of line starts in a piece of text.
///
/// Built once per document; every offset lookup is a binary search over the
/// recorded line starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineIndex {
    /// Byte offset at which each line begins. Always starts with 0.
    line_starts: Vec<usize>,

    /// Total length of the text in bytes
    total_length: usize,
}

impl LineIndex {
    /// Scan `content` once and record where every line starts.
    ///
    /// ```
    /// use tagweave_source_map::LineIndex;
    ///
    /// let index = LineIndex::new("one\ntwo\nthree");
    /// assert_eq!(index.line_count(), 3);
    /// assert_eq!(index.row_of(5), Some(1));
    /// ```
    pub fn new(content: &str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(
                content
                    .bytes()
                    .enumerate()
                    .filter(|(_, b)| *b == b'\n')
                    .map(|(idx, _)| idx + 1),
            )
            .collect();

        LineIndex {
            line_starts,
            total_length: content.len(),
        }
    }

    /// Row (0-indexed) containing `offset`, or `None` past the end of the text.
    ///
    /// A newline character belongs to the line it terminates.
    pub fn row_of(&self, offset: usize) -> Option<usize> {
        if offset > self.total_length {
            return None;
        }
        let row = match self.line_starts.binary_search(&offset) {
            Ok(row) => row,
            Err(next) => next - 1,
        };
        Some(row)
    }

    /// Byte offset at which `row` begins.
    pub fn line_start(&self, row: usize) -> Option<usize> {
        self.line_starts.get(row).copied()
    }

    pub fn total_length(&self) -> usize {
        self.total_length
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text() {
        let index = LineIndex::new("");
        assert_eq!(index.line_count(), 1);
        assert_eq!(index.row_of(0), Some(0));
        assert_eq!(index.row_of(1), None);
    }

    #[test]
    fn test_newline_belongs_to_its_line() {
        let index = LineIndex::new("ab\ncd\n");
        assert_eq!(index.row_of(2), Some(0));
        assert_eq!(index.row_of(3), Some(1));
        assert_eq!(index.row_of(5), Some(1));
        assert_eq!(index.row_of(6), Some(2));
        assert_eq!(index.line_count(), 3);
    }

    #[test]
    fn test_consecutive_newlines() {
        let index = LineIndex::new("a\n\n\nb");
        assert_eq!(index.row_of(2), Some(1));
        assert_eq!(index.row_of(3), Some(2));
        assert_eq!(index.row_of(4), Some(3));
        assert_eq!(index.line_start(3), Some(4));
        assert_eq!(index.line_start(4), None);
    }
}
