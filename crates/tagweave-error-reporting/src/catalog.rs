//! Error code catalog and lookup.
//!
//! Maps error codes (like "T-2-6") to their subsystem, title and default
//! message.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metadata for an error code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorCodeInfo {
    /// Subsystem name (e.g., "control-tag", "include")
    pub subsystem: String,

    /// Short title for the error
    pub title: String,

    /// Default message
    pub message_template: String,

    /// When this error was introduced (version)
    pub since_version: String,
}

/// Global error catalog, embedded at compile time.
///
/// # Panics
///
/// Panics on first access if the embedded JSON is invalid, which can only
/// happen if `error_catalog.json` was edited by hand incorrectly.
pub static ERROR_CATALOG: Lazy<HashMap<String, ErrorCodeInfo>> = Lazy::new(|| {
    let json_data = include_str!("../error_catalog.json");
    serde_json::from_str(json_data).expect("Invalid error catalog JSON - this is a bug in tagweave")
});

/// Look up error code information.
///
/// ```
/// use tagweave_error_reporting::catalog::get_error_info;
///
/// let info = get_error_info("T-2-7").unwrap();
/// assert_eq!(info.title, "Unclosed Block");
/// ```
pub fn get_error_info(code: &str) -> Option<&ErrorCodeInfo> {
    ERROR_CATALOG.get(code)
}

/// Get the subsystem name for an error code.
pub fn get_subsystem(code: &str) -> Option<&str> {
    ERROR_CATALOG.get(code).map(|info| info.subsystem.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_loads() {
        assert!(!ERROR_CATALOG.is_empty());
    }

    #[test]
    fn test_codes_are_well_formed() {
        for code in ERROR_CATALOG.keys() {
            let parts: Vec<&str> = code.split('-').collect();
            assert_eq!(parts.len(), 3, "bad code {code}");
            assert_eq!(parts[0], "T");
            assert!(parts[1].parse::<u32>().is_ok());
            assert!(parts[2].parse::<u32>().is_ok());
        }
    }

    #[test]
    fn test_get_subsystem() {
        assert_eq!(get_subsystem("T-0-1"), Some("internal"));
        assert_eq!(get_subsystem("T-3-1"), Some("security"));
        assert_eq!(get_subsystem("T-99-99"), None);
    }
}
