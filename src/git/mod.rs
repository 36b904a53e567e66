//! Git access: the command layer, change detection, and diff extraction.

pub mod changes;
pub mod cli;
pub mod diff;
pub mod exclude;
pub mod inspect;

pub use changes::{ChangeKind, ChangeSet, ProcessingOrder};
pub use cli::{CommitOutcome, GitCli, StatusEntry, Vcs, parse_porcelain_z};
pub use diff::{DiffRecord, DiffSource, MAX_DIFF_LENGTH, extract_diff};
pub use exclude::PathExclusionFilter;
pub use inspect::inspect;
