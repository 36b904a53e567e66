//! Path exclusion for change detection.

/// Ordered list of path prefixes/names that are never committed.
///
/// An entry matches a path that equals it or lies beneath it, so `env`
/// excludes `env/bin/python` but not `environment.py`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathExclusionFilter {
    entries: Vec<String>,
}

impl PathExclusionFilter {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut filter = Self::default();
        for entry in entries {
            filter.push(entry.as_ref());
        }
        filter
    }

    /// Append an entry. Blank entries and duplicates are ignored.
    pub fn push(&mut self, entry: &str) {
        let normalized = normalize(entry);
        if normalized.is_empty() || self.entries.iter().any(|e| e == normalized) {
            return;
        }
        self.entries.push(normalized.to_string());
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        let path = normalize(path);
        self.entries.iter().any(|entry| {
            path == entry
                || path
                    .strip_prefix(entry.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    /// Keep only the paths that are not excluded, preserving order.
    pub fn retain(&self, paths: Vec<String>) -> Vec<String> {
        paths.into_iter().filter(|p| !self.is_excluded(p)).collect()
    }
}

fn normalize(path: &str) -> &str {
    let path = path.trim();
    let path = path.strip_prefix("./").unwrap_or(path);
    path.trim_end_matches('/')
}
