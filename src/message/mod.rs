//! Commit message generation.
//!
//! Messages come from the remote text generator when a modified file has a
//! diff, and from deterministic templates otherwise. Every message carries a
//! local timestamp and records the strategy that produced it.

pub mod clock;
pub mod generator;
pub mod template;

use std::fmt;

pub use clock::{Clock, FixedClock, SystemClock};
pub use generator::MessageGenerator;
pub use template::{ExtensionClass, TIMESTAMP_FORMAT};

/// How a commit message was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageStrategy {
    /// Text from the remote generator.
    Generated,
    /// The diff was non-empty but the remote call failed.
    GenerationFailed,
    /// Modified path with no textual diff.
    EmptyDiff,
    NewFile(ExtensionClass),
    Removed,
}

impl MessageStrategy {
    /// True for the strategies that stand in for a failed or skipped remote call.
    pub fn is_fallback(&self) -> bool {
        matches!(self, MessageStrategy::GenerationFailed | MessageStrategy::EmptyDiff)
    }
}

impl fmt::Display for MessageStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageStrategy::Generated => f.write_str("generated"),
            MessageStrategy::GenerationFailed => f.write_str("fallback: generation failed"),
            MessageStrategy::EmptyDiff => f.write_str("fallback: empty diff"),
            MessageStrategy::NewFile(class) => write!(f, "template: new {class} file"),
            MessageStrategy::Removed => f.write_str("template: removed"),
        }
    }
}

/// A timestamped commit message and the strategy behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMessage {
    pub text: String,
    pub strategy: MessageStrategy,
}

impl fmt::Display for CommitMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
