//! Per-path diff extraction.

use tracing::{debug, warn};

use crate::git::cli::Vcs;

/// Maximum characters of diff text kept for the prompt.
pub const MAX_DIFF_LENGTH: usize = 30_000;

/// Where a diff came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffSource {
    Staged,
    Unstaged,
    /// Neither side had a diff for the path.
    None,
}

/// Unified diff text for one path. May be empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffRecord {
    pub path: String,
    pub text: String,
    pub source: DiffSource,
    pub truncated: bool,
}

impl DiffRecord {
    pub fn empty(path: &str) -> Self {
        Self {
            path: path.to_string(),
            text: String::new(),
            source: DiffSource::None,
            truncated: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Retrieve the diff for `path`: staged first, then unstaged.
///
/// Never fails. An empty record is a normal outcome (for example a
/// mode-only change), and a failing diff command is logged and treated as
/// empty.
pub fn extract_diff<V: Vcs + ?Sized>(vcs: &V, path: &str) -> DiffRecord {
    let staged = vcs.diff_staged(path).unwrap_or_else(|e| {
        warn!(path, "Failed to read staged diff: {e}");
        String::new()
    });
    if !staged.trim().is_empty() {
        return build_record(path, staged, DiffSource::Staged);
    }

    let unstaged = vcs.diff_unstaged(path).unwrap_or_else(|e| {
        warn!(path, "Failed to read unstaged diff: {e}");
        String::new()
    });
    if !unstaged.trim().is_empty() {
        return build_record(path, unstaged, DiffSource::Unstaged);
    }

    debug!(path, "No staged or unstaged diff found");
    DiffRecord::empty(path)
}

fn build_record(path: &str, mut text: String, source: DiffSource) -> DiffRecord {
    let truncated = text.len() > MAX_DIFF_LENGTH;
    if truncated {
        let mut end = MAX_DIFF_LENGTH;
        while end > 0 && !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
    }

    DiffRecord {
        path: path.to_string(),
        text,
        source,
        truncated,
    }
}
