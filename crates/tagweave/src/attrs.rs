/*
 * attrs.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Dynamic attributes on ordinary tags.
//!
//! `<input type="checkbox" attrs="{'checked': is_on, 'name': field}">` keeps
//! its static attributes and expands the directive at run time:
//!
//! - a `True` value prints the bare key (` checked`);
//! - a `False` value prints nothing;
//! - anything else prints ` key="value"` with `"` escaped.
//!
//! The directive is the argument list of a `dict(...)` call, so both a
//! mapping (`{'class': 'x'}`) and keyword arguments (`class='x'`) work.

use crate::markup::Tag;

/// Name of the directive attribute.
pub const DIRECTIVE: &str = "attrs";

/// Escape a value for a double-quoted attribute.
pub(crate) fn escape_quotes(value: &str) -> String {
    value.replace('"', "&quot;")
}

/// The statements that expand one `attrs` directive.
///
/// `N` in the helper names `__attr_key_N` and `__attr_value_N` is the
/// generator's counter, so nested or repeated expansions never collide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AttrExpansion {
    /// `<name` plus the static attributes
    pub prefix: String,
    pub directive: String,
    key: String,
    value: String,
    /// `>` or `/>`
    pub suffix: &'static str,
}

impl AttrExpansion {
    pub(crate) fn new(tag: &Tag<'_>, directive: &str, self_closing: bool, counter: usize) -> Self {
        let mut prefix = format!("<{}", tag.name);
        for attr in tag.attributes.iter().filter(|a| a.name != DIRECTIVE) {
            prefix.push_str(&format!(" {}=\"{}\"", attr.name, escape_quotes(&attr.value)));
        }
        AttrExpansion {
            prefix,
            directive: directive.trim().to_string(),
            key: format!("__attr_key_{}", counter),
            value: format!("__attr_value_{}", counter),
            suffix: if self_closing { "/>" } else { ">" },
        }
    }

    /// Block statements in emission order. `None` closes the innermost
    /// block opened so far.
    pub(crate) fn statements(&self) -> Vec<Option<String>> {
        let (key, value) = (&self.key, &self.value);
        vec![
            Some(format!(
                "for {}, {} in dict({}).items():",
                key, value, self.directive
            )),
            Some(format!("if {} is True:", value)),
            Some(format!("print(' ' + {}, end=\"\")", key)),
            None,
            Some(format!("elif {} is not False:", value)),
            Some(format!(
                "print(' ' + {} + '=\"' + str({}).replace('\"', '&quot;') + '\"', end=\"\")",
                key, value
            )),
            None,
            None,
        ]
    }
}
