//! Change classification snapshot.

use std::collections::HashSet;
use std::fmt;

use serde::Deserialize;

use crate::error::ConfigError;

/// Kind of pending change for a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Untracked, or newly added to the index.
    Added,
    Modified,
    Deleted,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Added => "added",
            ChangeKind::Modified => "modified",
            ChangeKind::Deleted => "deleted",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order in which change kinds are processed. Lists every kind exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Vec<ChangeKind>")]
pub struct ProcessingOrder(Vec<ChangeKind>);

impl ProcessingOrder {
    pub fn new(kinds: Vec<ChangeKind>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for kind in &kinds {
            if !seen.insert(*kind) {
                return Err(ConfigError::InvalidOrder(format!("'{kind}' listed more than once")));
            }
        }
        for kind in [ChangeKind::Modified, ChangeKind::Added, ChangeKind::Deleted] {
            if !seen.contains(&kind) {
                return Err(ConfigError::InvalidOrder(format!("'{kind}' is missing")));
            }
        }
        Ok(Self(kinds))
    }

    pub fn kinds(&self) -> &[ChangeKind] {
        &self.0
    }
}

impl Default for ProcessingOrder {
    fn default() -> Self {
        Self(vec![ChangeKind::Modified, ChangeKind::Added, ChangeKind::Deleted])
    }
}

impl TryFrom<Vec<ChangeKind>> for ProcessingOrder {
    type Error = ConfigError;

    fn try_from(kinds: Vec<ChangeKind>) -> Result<Self, Self::Error> {
        Self::new(kinds)
    }
}

impl fmt::Display for ProcessingOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(ChangeKind::as_str).collect();
        f.write_str(&names.join(" -> "))
    }
}

/// Snapshot of pending changes, computed once per run.
///
/// The three lists are mutually exclusive and keep the order in which paths
/// were detected. There is no way to mutate a `ChangeSet` after construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    added: Vec<String>,
    modified: Vec<String>,
    deleted: Vec<String>,
}

impl ChangeSet {
    /// Build a snapshot from the three lists.
    ///
    /// A path that appears more than once keeps its first classification,
    /// checking `modified`, then `added`, then `deleted`.
    pub fn new(added: Vec<String>, modified: Vec<String>, deleted: Vec<String>) -> Self {
        let mut seen: HashSet<String> = HashSet::new();
        let mut keep = |paths: Vec<String>| -> Vec<String> {
            paths
                .into_iter()
                .filter(|p| seen.insert(p.clone()))
                .collect()
        };

        let modified = keep(modified);
        let added = keep(added);
        let deleted = keep(deleted);

        Self {
            added,
            modified,
            deleted,
        }
    }

    pub fn added(&self) -> &[String] {
        &self.added
    }

    pub fn modified(&self) -> &[String] {
        &self.modified
    }

    pub fn deleted(&self) -> &[String] {
        &self.deleted
    }

    pub fn paths(&self, kind: ChangeKind) -> &[String] {
        match kind {
            ChangeKind::Added => &self.added,
            ChangeKind::Modified => &self.modified,
            ChangeKind::Deleted => &self.deleted,
        }
    }

    pub fn contains(&self, kind: ChangeKind, path: &str) -> bool {
        self.paths(kind).iter().any(|p| p == path)
    }

    pub fn kind_of(&self, path: &str) -> Option<ChangeKind> {
        [ChangeKind::Modified, ChangeKind::Added, ChangeKind::Deleted]
            .into_iter()
            .find(|kind| self.contains(*kind, path))
    }

    pub fn len(&self) -> usize {
        self.added.len() + self.modified.len() + self.deleted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All paths in processing order, tagged with their kind.
    pub fn ordered<'a>(
        &'a self,
        order: &'a ProcessingOrder,
    ) -> impl Iterator<Item = (ChangeKind, &'a str)> + 'a {
        order.kinds().iter().flat_map(move |kind| {
            self.paths(*kind).iter().map(move |p| (*kind, p.as_str()))
        })
    }
}
