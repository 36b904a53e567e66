//! The commit sequencer: stage, commit, push and pace, one path at a time.

pub mod report;

use std::time::Duration;

use tracing::{debug, warn};

use crate::git::{ChangeKind, ChangeSet, CommitOutcome, ProcessingOrder, Vcs};
use crate::message::MessageGenerator;

pub use report::{PathOutcome, PathReport, PathState, RunSummary};

/// Settings that drive a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencerConfig {
    pub remote: String,
    pub branch: String,
    /// Pause between consecutive paths.
    pub pacing: Duration,
    pub order: ProcessingOrder,
    /// When false, commits stay local.
    pub push: bool,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            remote: "origin".to_string(),
            branch: "main".to_string(),
            pacing: Duration::from_secs(2),
            order: ProcessingOrder::default(),
            push: true,
        }
    }
}

/// Drives every path in a [`ChangeSet`] through stage, commit and push.
///
/// Strictly sequential: one path's cycle finishes before the next begins.
/// Per-path failures are recorded and the run moves on.
pub struct Sequencer<'a> {
    vcs: &'a dyn Vcs,
    messages: &'a MessageGenerator,
    config: SequencerConfig,
}

impl<'a> Sequencer<'a> {
    pub fn new(vcs: &'a dyn Vcs, messages: &'a MessageGenerator, config: SequencerConfig) -> Self {
        Self {
            vcs,
            messages,
            config,
        }
    }

    pub async fn run(&self, changes: &ChangeSet) -> RunSummary {
        let mut summary = RunSummary::default();
        let total = changes.len();

        if total == 0 {
            println!("Nothing to do.");
            return summary;
        }

        debug!(total, order = %self.config.order, "Starting commit sequence");

        for (index, (kind, path)) in changes.ordered(&self.config.order).enumerate() {
            println!("[{}/{}] {} {}", index + 1, total, kind, path);

            let report = self.process(kind, path, changes).await;
            println!("    {}", report.outcome);
            summary.push(report);

            if index + 1 < total && !self.config.pacing.is_zero() {
                tokio::time::sleep(self.config.pacing).await;
            }
        }

        summary
    }

    async fn process(&self, kind: ChangeKind, path: &str, changes: &ChangeSet) -> PathReport {
        let report = |message, outcome| PathReport {
            kind,
            path: path.to_string(),
            message,
            outcome,
        };

        let staged = match kind {
            ChangeKind::Deleted => self.vcs.remove(path),
            ChangeKind::Added | ChangeKind::Modified => self.vcs.add(path),
        };
        if let Err(e) = staged {
            warn!(path, operation = "stage", "Failed to stage path: {e}");
            return report(None, PathOutcome::StageFailed(e.to_string()));
        }

        let message = self.messages.generate(self.vcs, path, kind, changes).await;
        println!("    message ({}): {}", message.strategy, message.text);

        let outcome = match self.vcs.commit(&message.text, path) {
            Err(e) => {
                warn!(path, operation = "commit", "Failed to commit path: {e}");
                PathOutcome::CommitFailed(e.to_string())
            }
            Ok(CommitOutcome::NothingToCommit) => {
                debug!(path, "Nothing to commit, skipping push");
                PathOutcome::NothingToCommit
            }
            Ok(CommitOutcome::Created) => self.push(path),
        };

        report(Some(message), outcome)
    }

    fn push(&self, path: &str) -> PathOutcome {
        if !self.config.push {
            return PathOutcome::CommittedLocally;
        }
        match self.vcs.push(&self.config.remote, &self.config.branch) {
            Ok(()) => PathOutcome::Pushed,
            Err(e) => {
                warn!(
                    path,
                    operation = "push",
                    remote = %self.config.remote,
                    branch = %self.config.branch,
                    "Push failed, commit kept locally: {e}"
                );
                PathOutcome::PushFailed(e.to_string())
            }
        }
    }
}
