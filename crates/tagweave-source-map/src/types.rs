//! Core location types

use serde::{Deserialize, Serialize};

/// Identifier of a file registered in a [`crate::SourceContext`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId(pub usize);

/// A location in source text (0-indexed)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    /// Byte offset from start of source
    pub offset: usize,
    /// Row number (0-indexed)
    pub row: usize,
    /// Column number (0-indexed, in characters)
    pub column: usize,
}

/// A half-open range in source text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    /// Start location (inclusive)
    pub start: Location,
    /// End location (exclusive)
    pub end: Location,
}

impl Range {
    /// Length of the range in bytes.
    pub fn len(&self) -> usize {
        self.end.offset.saturating_sub(self.start.offset)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(offset: usize, row: usize, column: usize) -> Location {
        Location {
            offset,
            row,
            column,
        }
    }

    #[test]
    fn test_location_ordering() {
        assert!(loc(0, 0, 0) < loc(5, 0, 5));
        assert!(loc(5, 0, 5) < loc(10, 1, 0));
    }

    #[test]
    fn test_range_len() {
        let range = Range {
            start: loc(3, 0, 3),
            end: loc(10, 1, 2),
        };
        assert_eq!(range.len(), 7);
        assert!(!range.is_empty());
        assert!(Range::default().is_empty());
    }

    #[test]
    fn test_serialization_range() {
        let range = Range {
            start: loc(0, 0, 0),
            end: loc(50, 2, 10),
        };
        let json = serde_json::to_string(&range).unwrap();
        let deserialized: Range = serde_json::from_str(&json).unwrap();
        assert_eq!(range, deserialized);
    }
}
