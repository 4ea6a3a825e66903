/*
 * options.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::security::Denylist;

/// Options controlling how documents are compiled.
///
/// Deserializes from YAML or JSON with kebab-case keys; every key is
/// optional:
///
/// ```yaml
/// control-tag: py
/// max-include-depth: 32
/// forbidden-names: [open]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RenderOptions {
    /// Name of the control tag (`py` in `<py code="..."/>`).
    pub control_tag: String,

    /// Deepest allowed include nesting.
    pub max_include_depth: usize,

    /// Extra identifiers rejected in fragments, on top of the default
    /// denylist.
    pub forbidden_names: Vec<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            control_tag: "py".to_string(),
            max_include_depth: 32,
            forbidden_names: Vec::new(),
        }
    }
}

impl RenderOptions {
    /// Parse options from a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// The denylist these options describe.
    pub fn denylist(&self) -> Denylist {
        Denylist::with_extra(self.forbidden_names.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = RenderOptions::default();
        assert_eq!(options.control_tag, "py");
        assert_eq!(options.max_include_depth, 32);
        assert!(options.forbidden_names.is_empty());
    }

    #[test]
    fn test_from_yaml() {
        let options = RenderOptions::from_yaml_str(
            "control-tag: tw\nmax-include-depth: 4\nforbidden-names:\n  - open\n",
        )
        .unwrap();
        assert_eq!(options.control_tag, "tw");
        assert_eq!(options.max_include_depth, 4);
        assert!(options.denylist().contains("open"));
        assert!(options.denylist().contains("exec"));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let options = RenderOptions::from_yaml_str("max-include-depth: 2").unwrap();
        assert_eq!(options.control_tag, "py");
        assert_eq!(options.max_include_depth, 2);
    }

    #[test]
    fn test_unknown_type_is_an_error() {
        assert!(RenderOptions::from_yaml_str("max-include-depth: deep").is_err());
    }

    #[test]
    fn test_from_json() {
        let options: RenderOptions =
            serde_json::from_str(r#"{"control-tag": "tpl"}"#).unwrap();
        assert_eq!(options.control_tag, "tpl");
    }
}
