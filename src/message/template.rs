//! Deterministic commit message templates.

use std::fmt;
use std::path::Path;

use chrono::NaiveDateTime;

/// Format of the timestamp appended to every message.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const CODE_EXTENSIONS: &[&str] = &[
    "py", "js", "jsx", "ts", "tsx", "rs", "go", "c", "h", "cc", "cpp", "cxx", "hpp", "hh",
    "java", "kt", "rb", "php", "cs", "swift", "scala", "sh", "lua",
];

const DOCUMENT_EXTENSIONS: &[&str] = &["md", "markdown", "txt", "rst", "adoc", "org", "tex"];

/// Coarse file category used to pick the template for a new file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionClass {
    Code,
    Document,
    Other,
}

impl ExtensionClass {
    /// Classify a path by its lower-cased extension.
    pub fn classify(path: &str) -> Self {
        let Some(ext) = Path::new(path).extension().and_then(|e| e.to_str()) else {
            return ExtensionClass::Other;
        };
        let ext = ext.to_ascii_lowercase();

        if CODE_EXTENSIONS.contains(&ext.as_str()) {
            ExtensionClass::Code
        } else if DOCUMENT_EXTENSIONS.contains(&ext.as_str()) {
            ExtensionClass::Document
        } else {
            ExtensionClass::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExtensionClass::Code => "code",
            ExtensionClass::Document => "document",
            ExtensionClass::Other => "other",
        }
    }
}

impl fmt::Display for ExtensionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final component of a repository-relative path.
pub fn file_name(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
}

pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

pub fn removed(name: &str, ts: &str) -> String {
    format!("Removed {name} - obsolete as of {ts}")
}

pub fn new_file(name: &str, class: ExtensionClass, ts: &str) -> String {
    match class {
        ExtensionClass::Code => format!("Added {name} with initial implementation ({ts})"),
        ExtensionClass::Document => format!("Created {name} with initial draft ({ts})"),
        ExtensionClass::Other => format!("Introduced {name} to the project ({ts})"),
    }
}

/// Used when a diff exists but text generation failed.
pub fn recent_changes(name: &str, ts: &str) -> String {
    format!("Updated {name} with recent changes ({ts})")
}

/// Used when a modified path has no textual diff.
pub fn minor_changes(name: &str, ts: &str) -> String {
    format!("Updated {name} with minor changes ({ts})")
}

pub fn generated(text: &str, ts: &str) -> String {
    format!("{text} ({ts})")
}
