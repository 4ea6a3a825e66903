//! Error reporting and diagnostic messages for tagweave.
//!
//! Diagnostics follow a tidyverse-style structure: a short title, an optional
//! problem statement, bulleted details and hints ending in `?`. When a source
//! location and a [`tagweave_source_map::SourceContext`] are available, the
//! report is rendered with ariadne so the offending markup is shown in place.
//!
//! # Example
//!
//! ```
//! use tagweave_error_reporting::DiagnosticMessageBuilder;
//!
//! let msg = DiagnosticMessageBuilder::error("Forbidden Name")
//!     .with_code("T-3-1")
//!     .problem("Fragments cannot use `exec`")
//!     .add_hint("Remove the call?")
//!     .build();
//!
//! let text = msg.to_text(None);
//! assert!(text.contains("[T-3-1]"));
//! ```

pub mod builder;
pub mod catalog;
pub mod diagnostic;

pub use builder::DiagnosticMessageBuilder;
pub use catalog::{ERROR_CATALOG, ErrorCodeInfo, get_error_info, get_subsystem};
pub use diagnostic::{DetailItem, DetailKind, DiagnosticKind, DiagnosticMessage};
