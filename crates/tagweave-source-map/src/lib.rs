//! Source locations for tagweave
//!
//! This crate tracks where things live in a markup document so that compile
//! and runtime failures can be reported against the original text.
//!
//! # Overview
//!
//! The core types are:
//! - [`Location`] and [`Range`]: byte offset plus 0-indexed row and column
//! - [`LineIndex`]: converts byte offsets into [`Location`]s
//! - [`SourceInfo`]: a range inside a registered file
//! - [`SourceContext`]: the registry of files and their contents
//!
//! # Example
//!
//! ```rust
//! use tagweave_source_map::*;
//!
//! let mut ctx = SourceContext::new();
//! let file_id = ctx.add_file("page.html", "<p>\n<py expr=\"x\"/>\n</p>");
//!
//! let info = ctx.source_info(file_id, 4, 17).unwrap();
//! assert_eq!(info.start_line(), 2);
//! assert_eq!(info.range.start.column, 0);
//! ```

pub mod context;
pub mod line_index;
pub mod source_info;
pub mod types;

pub use context::{SourceContext, SourceFile};
pub use line_index::LineIndex;
pub use source_info::SourceInfo;
pub use types::{FileId, Location, Range};
