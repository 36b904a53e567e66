//! Per-path results and the run summary.

use std::fmt;

use crate::git::ChangeKind;
use crate::message::CommitMessage;

/// Lifecycle position a path reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathState {
    /// Staged, but git found nothing to commit.
    Staged,
    Committed,
    Pushed,
    Failed,
}

/// Terminal result for one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathOutcome {
    Pushed,
    /// Committed with pushing disabled.
    CommittedLocally,
    /// The commit exists locally but the push was rejected or failed.
    PushFailed(String),
    /// git had nothing to commit for the path; no push was attempted.
    NothingToCommit,
    StageFailed(String),
    CommitFailed(String),
}

impl PathOutcome {
    pub fn state(&self) -> PathState {
        match self {
            PathOutcome::Pushed => PathState::Pushed,
            PathOutcome::CommittedLocally | PathOutcome::PushFailed(_) => PathState::Committed,
            PathOutcome::NothingToCommit => PathState::Staged,
            PathOutcome::StageFailed(_) | PathOutcome::CommitFailed(_) => PathState::Failed,
        }
    }

    /// True when something went wrong for this path.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            PathOutcome::PushFailed(_) | PathOutcome::StageFailed(_) | PathOutcome::CommitFailed(_)
        )
    }
}

impl fmt::Display for PathOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathOutcome::Pushed => f.write_str("committed and pushed"),
            PathOutcome::CommittedLocally => f.write_str("committed (push disabled)"),
            PathOutcome::PushFailed(e) => write!(f, "committed locally, push failed: {e}"),
            PathOutcome::NothingToCommit => f.write_str("nothing to commit"),
            PathOutcome::StageFailed(e) => write!(f, "failed to stage: {e}"),
            PathOutcome::CommitFailed(e) => write!(f, "failed to commit: {e}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathReport {
    pub kind: ChangeKind,
    pub path: String,
    /// Absent when staging failed before a message was produced.
    pub message: Option<CommitMessage>,
    pub outcome: PathOutcome,
}

/// Reports for every processed path, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub reports: Vec<PathReport>,
}

impl RunSummary {
    pub fn push(&mut self, report: PathReport) {
        self.reports.push(report);
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn total(&self) -> usize {
        self.reports.len()
    }

    fn count(&self, state: PathState) -> usize {
        self.reports
            .iter()
            .filter(|r| r.outcome.state() == state)
            .count()
    }

    pub fn pushed(&self) -> usize {
        self.count(PathState::Pushed)
    }

    /// Commits that exist locally but were not pushed.
    pub fn committed_only(&self) -> usize {
        self.count(PathState::Committed)
    }

    pub fn unchanged(&self) -> usize {
        self.count(PathState::Staged)
    }

    pub fn failed(&self) -> usize {
        self.reports.iter().filter(|r| r.outcome.is_failure()).count()
    }

    /// Number of messages that came from a fallback template.
    pub fn fallbacks(&self) -> usize {
        self.reports
            .iter()
            .filter_map(|r| r.message.as_ref())
            .filter(|m| m.strategy.is_fallback())
            .count()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Processed {} path(s): {} pushed, {} committed without push, {} unchanged, {} with errors ({} fallback message(s))",
            self.total(),
            self.pushed(),
            self.committed_only(),
            self.unchanged(),
            self.failed(),
            self.fallbacks()
        )
    }
}
