/*
 * engine.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The rendering entry points.
//!
//! Rendering a document is two steps: compile it into a [`Program`], then
//! run the program against the caller's [`RenderContext`]. Includes are
//! rendered while their including document compiles, with the context as it
//! stands at that moment, and their output is inlined as literal text.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::codegen::CodeGenerator;
use crate::error::{RenderError, TemplateError, TemplateResult};
use crate::interpreter::{Interpreter, RunError};
use crate::options::RenderOptions;
use crate::program::Program;
use crate::resolver::{DocumentResolver, FileSystemResolver, normalize_path, resolve_include_path};
use crate::security::Denylist;
use crate::value::RenderContext;

/// Documents currently being rendered, outermost first.
#[derive(Debug, Default)]
struct RenderSession {
    stack: Vec<PathBuf>,
}

impl RenderSession {
    /// Check that `path` may be entered from the current document.
    fn check(&self, path: &Path, max_depth: usize) -> TemplateResult<()> {
        if let Some(start) = self.stack.iter().position(|p| p == path) {
            let mut chain: Vec<String> = self.stack[start..]
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            chain.push(path.display().to_string());
            return Err(TemplateError::IncludeCycle { chain });
        }
        if self.stack.len() > max_depth {
            return Err(TemplateError::IncludeTooDeep {
                path: path.display().to_string(),
                max_depth,
            });
        }
        Ok(())
    }
}

/// Compiles and renders documents loaded through a [`DocumentResolver`].
///
/// ```
/// use tagweave::{Engine, MemoryResolver, RenderContext};
///
/// let resolver = MemoryResolver::with_documents([(
///     "list.html",
///     "<ul><py code=\"for item in items:\"><li><py expr=\"item\"/></li></py></ul>",
/// )]);
/// let engine = Engine::new(resolver);
///
/// let mut context = RenderContext::new();
/// context.insert("items", vec!["a", "b"]);
/// let html = engine.render("list.html", &mut context).unwrap();
/// assert_eq!(html, "<ul><li>a</li><li>b</li></ul>");
/// ```
#[derive(Debug, Clone)]
pub struct Engine<R: DocumentResolver = FileSystemResolver> {
    resolver: R,
    options: RenderOptions,
    denylist: Denylist,
}

impl<R: DocumentResolver> Engine<R> {
    pub fn new(resolver: R) -> Self {
        Self::with_options(resolver, RenderOptions::default())
    }

    pub fn with_options(resolver: R, options: RenderOptions) -> Self {
        let denylist = options.denylist();
        Engine {
            resolver,
            options,
            denylist,
        }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Render the document at `path`.
    ///
    /// Assignments made by the document's fragments are left in `context`.
    /// On failure nothing of the output is returned.
    pub fn render(
        &self,
        path: impl AsRef<Path>,
        context: &mut RenderContext,
    ) -> Result<String, RenderError> {
        let path = path.as_ref();
        let source = self.load(path)?;
        self.render_source(path, &source, &mut RenderSession::default(), context)
    }

    /// Render `source` directly. `name` is used in reports and as the base
    /// for include paths.
    pub fn render_str(
        &self,
        name: &str,
        source: &str,
        context: &mut RenderContext,
    ) -> Result<String, RenderError> {
        self.render_source(
            Path::new(name),
            source,
            &mut RenderSession::default(),
            context,
        )
    }

    /// Compile the document at `path` without running it.
    ///
    /// Includes are still rendered, since their output is part of the
    /// program.
    pub fn compile(
        &self,
        path: impl AsRef<Path>,
        context: &mut RenderContext,
    ) -> Result<Program, RenderError> {
        let path = path.as_ref();
        let source: Arc<str> = Arc::from(self.load(path)?);
        let mut session = RenderSession::default();
        session.stack.push(normalize_path(path));
        self.compile_source(path, &source, &mut session, context)
    }

    fn load(&self, path: &Path) -> Result<String, RenderError> {
        self.resolver
            .load(path)
            .map_err(|e| RenderError::unpositioned(e, path.display().to_string()))
    }

    fn render_source(
        &self,
        path: &Path,
        source: &str,
        session: &mut RenderSession,
        context: &mut RenderContext,
    ) -> Result<String, RenderError> {
        let source: Arc<str> = Arc::from(source);
        session.stack.push(normalize_path(path));
        let result = self.compile_and_run(path, &source, session, context);
        session.stack.pop();

        if let Err(e) = &result {
            debug!(
                document = %path.display(),
                code = e.code(),
                line = ?e.line(),
                "render failed"
            );
        }
        result
    }

    fn compile_and_run(
        &self,
        path: &Path,
        source: &Arc<str>,
        session: &mut RenderSession,
        context: &mut RenderContext,
    ) -> Result<String, RenderError> {
        let program = self.compile_source(path, source, session, context)?;
        debug!(
            document = %path.display(),
            statements = program.statement_count(),
            "compiled document"
        );
        let output = Interpreter::run(&program, context)
            .map_err(|e| runtime_error(e, &program, path, source))?;
        debug!(document = %path.display(), bytes = output.len(), "rendered document");
        Ok(output)
    }

    fn compile_source(
        &self,
        path: &Path,
        source: &Arc<str>,
        session: &mut RenderSession,
        context: &mut RenderContext,
    ) -> Result<Program, RenderError> {
        let document = path.display().to_string();
        let include = |target: &str| self.include(path, target, session, context);
        let generator = CodeGenerator::new(
            &document,
            source,
            &self.options.control_tag,
            &self.denylist,
            include,
        );
        generator
            .generate(source)
            .map_err(|e| RenderError::new(e.error, document.as_str(), source.clone(), e.location, e.text))
    }

    /// Render an included document for `<py include="target"/>` in `base`.
    fn include(
        &self,
        base: &Path,
        target: &str,
        session: &mut RenderSession,
        context: &mut RenderContext,
    ) -> TemplateResult<String> {
        let path = resolve_include_path(base, target);
        trace!(
            from = %base.display(),
            path = %path.display(),
            depth = session.stack.len(),
            "include"
        );
        session.check(&path, self.options.max_include_depth)?;

        let nested = match self.load(&path) {
            Ok(source) => self.render_source(&path, &source, session, context),
            Err(e) => Err(e),
        };
        nested.map_err(|e| TemplateError::IncludeFailure {
            path: target.to_string(),
            source: Box::new(e),
        })
    }
}

/// Position a runtime failure at the markup whose statement raised it.
fn runtime_error(e: RunError, program: &Program, path: &Path, source: &Arc<str>) -> RenderError {
    let (location, text) = match program.line_map.lookup(e.line) {
        Some((_, entry)) => (Some(entry.location), entry.text.clone()),
        None => (None, String::new()),
    };
    RenderError::new(
        TemplateError::Execution {
            message: e.error.message,
        },
        path.display().to_string(),
        source.clone(),
        location,
        text,
    )
}

/// Render the file at `path` with default options.
pub fn render(path: impl AsRef<Path>, context: &mut RenderContext) -> Result<String, RenderError> {
    Engine::new(FileSystemResolver).render(path, context)
}
