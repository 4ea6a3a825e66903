/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Markup documents with embedded control tags.
//!
//! A document is ordinary HTML-like markup plus control tags:
//!
//! - Blocks: `<py code="for item in items:"> ... </py>`. Code that ends in
//!   `:` opens a block around the markup up to the matching `</py>`.
//! - Statements: `<py code="total = total + 1"/>`
//! - Expressions: `<py expr="item.upper()"/>` prints the value.
//! - Includes: `<py include="parts/nav.html"/>` renders another document in
//!   place.
//! - Dynamic attributes: `<input attrs="{'checked': done}">`
//!
//! # Architecture
//!
//! The [`Engine`] scans the markup, generates a [`Program`] with a line map
//! back into the document, and runs it with the [`interpreter`] against a
//! caller-supplied [`RenderContext`]. Fragment code is a small
//! Python-flavoured language (see [`fragment`]) screened by a denylist of
//! identifiers before it is compiled. Every failure is reported as a
//! [`RenderError`] naming the document, the line and the markup that
//! triggered it.
//!
//! # Example
//!
//! ```
//! use tagweave::{Engine, MemoryResolver, RenderContext};
//!
//! let engine = Engine::new(MemoryResolver::new());
//! let mut context = RenderContext::new();
//! context.insert("name", "World");
//!
//! let html = engine
//!     .render_str("hello.html", "<p>Hello, <py expr=\"name\"/>!</p>", &mut context)
//!     .unwrap();
//! assert_eq!(html, "<p>Hello, World!</p>");
//! ```

pub mod attrs;
pub mod codegen;
pub mod engine;
pub mod error;
pub mod fragment;
pub mod interpreter;
pub mod markup;
pub mod options;
pub mod program;
pub mod resolver;
pub mod security;
pub mod value;

// Re-export main types at crate root
pub use codegen::TagAction;
pub use engine::{Engine, render};
pub use error::{RenderError, TemplateError, TemplateResult};
pub use interpreter::{EvalError, Interpreter, OutputCapture, RunError};
pub use options::RenderOptions;
pub use program::{Instruction, LineEntry, LineMap, Program};
pub use resolver::{DocumentResolver, FileSystemResolver, MemoryResolver, resolve_include_path};
pub use security::{DEFAULT_DENYLIST, Denylist};
pub use value::{RenderContext, Value};
