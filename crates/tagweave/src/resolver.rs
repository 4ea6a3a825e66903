/*
 * resolver.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Document loading.
//!
//! This module provides the trait the engine loads documents through, with
//! filesystem and in-memory implementations, and the path rules for
//! `<py include="..."/>`.

use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::{TemplateError, TemplateResult};

/// Trait for loading document sources.
///
/// Paths handed to a resolver are already resolved: an include target has
/// been joined to the including document's directory and normalized.
pub trait DocumentResolver {
    /// Load the document at `path`.
    ///
    /// # Errors
    /// `DocumentNotFound` when there is no such document, `Io` when it
    /// exists but cannot be read.
    fn load(&self, path: &Path) -> TemplateResult<String>;
}

/// Resolver that reads UTF-8 files.
#[derive(Debug, Clone, Default)]
pub struct FileSystemResolver;

impl DocumentResolver for FileSystemResolver {
    fn load(&self, path: &Path) -> TemplateResult<String> {
        std::fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => TemplateError::DocumentNotFound {
                path: path.display().to_string(),
            },
            _ => TemplateError::Io(e),
        })
    }
}

/// Resolver that serves documents from an in-memory map.
///
/// Useful for testing and for scenarios where documents are bundled
/// into the application. Keys are normalized like include paths, so
/// `a/../b.html` and `b.html` name the same document.
#[derive(Debug, Clone, Default)]
pub struct MemoryResolver {
    documents: HashMap<PathBuf, String>,
}

impl MemoryResolver {
    /// Create a new empty memory resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document to the resolver.
    pub fn add(&mut self, path: impl AsRef<Path>, content: impl Into<String>) -> &mut Self {
        self.documents
            .insert(normalize_path(path.as_ref()), content.into());
        self
    }

    /// Create a resolver with the given documents.
    pub fn with_documents(
        documents: impl IntoIterator<Item = (impl AsRef<Path>, impl Into<String>)>,
    ) -> Self {
        let mut resolver = Self::new();
        for (path, content) in documents {
            resolver.add(path, content);
        }
        resolver
    }
}

impl DocumentResolver for MemoryResolver {
    fn load(&self, path: &Path) -> TemplateResult<String> {
        self.documents
            .get(&normalize_path(path))
            .cloned()
            .ok_or_else(|| TemplateError::DocumentNotFound {
                path: path.display().to_string(),
            })
    }
}

/// Resolve an include target against the including document.
///
/// Relative targets are joined to the directory of `base`; absolute targets
/// are used as they are. `.` and `..` are then removed lexically.
///
/// ```
/// use std::path::{Path, PathBuf};
/// use tagweave::resolve_include_path;
///
/// let path = resolve_include_path(Path::new("site/pages/index.html"), "../parts/nav.html");
/// assert_eq!(path, PathBuf::from("site/parts/nav.html"));
/// ```
pub fn resolve_include_path(base: &Path, target: &str) -> PathBuf {
    let base_dir = base.parent().unwrap_or(Path::new(""));
    normalize_path(&base_dir.join(target))
}

/// Remove `.` components and fold `..` into its parent without touching the
/// filesystem. `..` that would climb above a relative root is kept.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    parts.iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_include_path_sibling() {
        let base = Path::new("/site/index.html");
        let result = resolve_include_path(base, "header.html");
        assert_eq!(result, PathBuf::from("/site/header.html"));
    }

    #[test]
    fn test_resolve_include_path_parent() {
        let base = Path::new("/site/pages/about.html");
        let result = resolve_include_path(base, "../parts/./nav.html");
        assert_eq!(result, PathBuf::from("/site/parts/nav.html"));
    }

    #[test]
    fn test_resolve_include_path_absolute_target() {
        let base = Path::new("/site/index.html");
        let result = resolve_include_path(base, "/shared/footer.html");
        assert_eq!(result, PathBuf::from("/shared/footer.html"));
    }

    #[test]
    fn test_resolve_include_path_bare_document() {
        let base = Path::new("index.html");
        let result = resolve_include_path(base, "part.html");
        assert_eq!(result, PathBuf::from("part.html"));
    }

    #[test]
    fn test_normalize_keeps_leading_parent() {
        assert_eq!(
            normalize_path(Path::new("../a/../b.html")),
            PathBuf::from("../b.html")
        );
        assert_eq!(normalize_path(Path::new("/../a.html")), PathBuf::from("/a.html"));
    }

    #[test]
    fn test_memory_resolver() {
        let mut resolver = MemoryResolver::new();
        resolver.add("parts/header.html", "<h1>Title</h1>");

        assert_eq!(
            resolver.load(Path::new("parts/header.html")).unwrap(),
            "<h1>Title</h1>"
        );
        assert_eq!(
            resolver.load(Path::new("parts/x/../header.html")).unwrap(),
            "<h1>Title</h1>"
        );
        assert!(matches!(
            resolver.load(Path::new("missing.html")),
            Err(TemplateError::DocumentNotFound { path }) if path == "missing.html"
        ));
    }

    #[test]
    fn test_memory_resolver_with_documents() {
        let resolver = MemoryResolver::with_documents([("a.html", "content a"), ("b.html", "content b")]);
        assert_eq!(resolver.load(Path::new("a.html")).unwrap(), "content a");
        assert_eq!(resolver.load(Path::new("./b.html")).unwrap(), "content b");
    }

    #[test]
    fn test_file_system_resolver_missing_file() {
        let resolver = FileSystemResolver;
        let result = resolver.load(Path::new("/definitely/not/here.html"));
        assert!(matches!(result, Err(TemplateError::DocumentNotFound { .. })));
    }
}
