//! Storage backend names for log fields.

use std::fmt;

use smol_str::SmolStr;

/// Name of a storage backend, as it appears in `backend = ..` log fields.
///
/// Built-in backends use the associated constants; custom ones pass any
/// string through `From`.
///
/// ```
/// use keepsake_core::BackendLabel;
///
/// assert_eq!(BackendLabel::FS.as_str(), "fs");
/// assert_eq!(BackendLabel::from("disk-a").to_string(), "disk-a");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BackendLabel(SmolStr);

impl BackendLabel {
    /// The file backend.
    pub const FS: Self = Self(SmolStr::new_static("fs"));
    /// The in-process backend.
    pub const MEMORY: Self = Self(SmolStr::new_static("memory"));
    /// Fallback for backends that do not name themselves.
    pub const UNNAMED: Self = Self(SmolStr::new_static("backend"));

    /// The name.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for BackendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for BackendLabel {
    fn from(name: &str) -> Self {
        Self(SmolStr::new(name))
    }
}

impl From<String> for BackendLabel {
    fn from(name: String) -> Self {
        Self(SmolStr::from(name))
    }
}
