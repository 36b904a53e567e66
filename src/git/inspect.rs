//! Repository inspection: classify pending changes into a [`ChangeSet`].

use tracing::{debug, warn};

use crate::error::VcsError;
use crate::git::changes::{ChangeKind, ChangeSet};
use crate::git::cli::{StatusEntry, Vcs};
use crate::git::exclude::PathExclusionFilter;

/// Query git for untracked, modified and deleted paths.
///
/// The exclusion filter is applied to each query's results independently.
/// Read-only: running it twice on an unchanged tree yields the same snapshot.
pub fn inspect<V: Vcs + ?Sized>(
    vcs: &V,
    filter: &PathExclusionFilter,
) -> Result<ChangeSet, VcsError> {
    let untracked = filter.retain(vcs.list_untracked()?);

    let mut staged_new = Vec::new();
    let mut modified = Vec::new();
    let mut deleted = Vec::new();

    for entry in vcs.status()? {
        match classify(&entry) {
            Some(ChangeKind::Added) => staged_new.push(entry.path),
            Some(ChangeKind::Modified) => modified.push(entry.path),
            Some(ChangeKind::Deleted) => deleted.push(entry.path),
            None => {
                let code = format!("{}{}", entry.index, entry.worktree);
                warn!(
                    path = %entry.path,
                    status = %code,
                    "Skipping path with unsupported status (renames, copies and conflicts are not handled)"
                );
            }
        }
    }

    let mut added = untracked;
    added.extend(filter.retain(staged_new));
    let modified = filter.retain(modified);
    let deleted = filter.retain(deleted);

    let changes = ChangeSet::new(added, modified, deleted);
    debug!(
        added = changes.added().len(),
        modified = changes.modified().len(),
        deleted = changes.deleted().len(),
        "Inspected working tree"
    );
    Ok(changes)
}

/// Map a porcelain XY status pair to a change kind.
///
/// Any deletion wins; a path newly added to the index counts as added;
/// content or type changes on either side count as modified.
fn classify(entry: &StatusEntry) -> Option<ChangeKind> {
    let (x, y) = (entry.index, entry.worktree);

    if is_unmerged(x, y) || matches!(x, 'R' | 'C') {
        return None;
    }
    if x == 'D' || y == 'D' {
        return Some(ChangeKind::Deleted);
    }
    if x == 'A' {
        return Some(ChangeKind::Added);
    }
    if matches!(x, 'M' | 'T') || matches!(y, 'M' | 'T') {
        return Some(ChangeKind::Modified);
    }
    None
}

fn is_unmerged(x: char, y: char) -> bool {
    x == 'U' || y == 'U' || (x == 'A' && y == 'A') || (x == 'D' && y == 'D')
}
