//! trickle - commit and push pending changes one file at a time.
//!
//! # Overview
//!
//! trickle inspects a git working tree for new, modified and deleted files,
//! then stages, commits and pushes each path separately. Commit messages for
//! modified files are written by a remote chat-completions model from the
//! file's diff; every other case, and any failed remote call, uses a
//! deterministic template. All messages carry a local timestamp.

pub mod config;
pub mod error;
pub mod git;
pub mod llm;
pub mod message;
pub mod sequencer;

// Re-export commonly used types
pub use config::{Config, LlmConfig};
pub use error::{ConfigError, GenerationError, VcsError};
pub use git::{ChangeKind, ChangeSet, GitCli, PathExclusionFilter, ProcessingOrder, Vcs};
pub use llm::{ChatCompletionsClient, TextGenerator};
pub use message::{CommitMessage, ExtensionClass, MessageGenerator, MessageStrategy};
pub use sequencer::{PathOutcome, PathReport, PathState, RunSummary, Sequencer, SequencerConfig};
