//! Helpers for keeping document names out of log output.

use std::path::Path;

/// Returns only the last path component of a name.
///
/// Job names are often full source paths; logs should reveal which file a
/// job is about without exposing the directory layout.
pub fn redact_name(name: &str) -> String {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}
