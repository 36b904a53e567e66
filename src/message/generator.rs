//! Per-path message selection.

use tracing::{debug, info, warn};

use crate::error::GenerationError;
use crate::git::{ChangeKind, ChangeSet, Vcs, extract_diff};
use crate::llm::{TextGenerator, build_commit_prompt, clean_message};
use crate::message::clock::{Clock, SystemClock};
use crate::message::template::{self, ExtensionClass, file_name, format_timestamp};
use crate::message::{CommitMessage, MessageStrategy};

/// Produces one commit message per path. Never fails.
pub struct MessageGenerator {
    text: Option<Box<dyn TextGenerator>>,
    clock: Box<dyn Clock>,
}

impl MessageGenerator {
    /// Create a generator. `None` disables the remote call, so every
    /// modified file with a diff gets the recent-changes fallback.
    pub fn new(text: Option<Box<dyn TextGenerator>>) -> Self {
        Self {
            text,
            clock: Box::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Choose and render the message for `path`.
    ///
    /// Deleted paths never reach the remote generator. Paths the snapshot
    /// lists as modified use their diff; everything else is a new file.
    pub async fn generate<V: Vcs + ?Sized>(
        &self,
        vcs: &V,
        path: &str,
        kind: ChangeKind,
        changes: &ChangeSet,
    ) -> CommitMessage {
        let ts = format_timestamp(self.clock.now());
        let name = file_name(path);

        let (text, strategy) = if kind == ChangeKind::Deleted {
            (template::removed(name, &ts), MessageStrategy::Removed)
        } else if changes.contains(ChangeKind::Modified, path) {
            self.for_modified(vcs, path, name, &ts).await
        } else {
            let class = ExtensionClass::classify(path);
            (
                template::new_file(name, class, &ts),
                MessageStrategy::NewFile(class),
            )
        };

        info!(path, strategy = %strategy, "Commit message ready");
        CommitMessage { text, strategy }
    }

    async fn for_modified<V: Vcs + ?Sized>(
        &self,
        vcs: &V,
        path: &str,
        name: &str,
        ts: &str,
    ) -> (String, MessageStrategy) {
        let diff = extract_diff(vcs, path);
        if diff.is_empty() {
            debug!(path, "Empty diff, using minor-changes template");
            return (template::minor_changes(name, ts), MessageStrategy::EmptyDiff);
        }

        match self.request(&build_commit_prompt(&diff)).await {
            Ok(text) => (template::generated(&text, ts), MessageStrategy::Generated),
            Err(e) => {
                warn!(path, "Text generation failed, using fallback message: {e}");
                (
                    template::recent_changes(name, ts),
                    MessageStrategy::GenerationFailed,
                )
            }
        }
    }

    async fn request(&self, prompt: &str) -> Result<String, GenerationError> {
        let generator = self
            .text
            .as_ref()
            .ok_or(GenerationError::MissingCredential)?;
        let text = clean_message(&generator.generate(prompt).await?);
        if text.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::cli::MockVcs;
    use crate::llm::MockTextGenerator;
    use crate::message::FixedClock;
    use chrono::NaiveDate;

    const TS: &str = "2024-05-17 09:30:00";

    fn clock() -> FixedClock {
        FixedClock(
            NaiveDate::from_ymd_opt(2024, 5, 17)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
        )
    }

    fn changes() -> ChangeSet {
        ChangeSet::new(
            vec![
                "src/main.rs".to_string(),
                "docs/guide.md".to_string(),
                "assets/logo.png".to_string(),
            ],
            vec!["app.py".to_string()],
            vec!["old.txt".to_string()],
        )
    }

    fn vcs_with_diff(staged: &'static str, unstaged: &'static str) -> MockVcs {
        let mut vcs = MockVcs::new();
        vcs.expect_diff_staged()
            .returning(move |_| Ok(staged.to_string()));
        vcs.expect_diff_unstaged()
            .returning(move |_| Ok(unstaged.to_string()));
        vcs
    }

    fn generator_with(mock: MockTextGenerator) -> MessageGenerator {
        MessageGenerator::new(Some(Box::new(mock))).with_clock(clock())
    }

    #[tokio::test]
    async fn test_deleted_path_never_calls_remote() {
        let mut text = MockTextGenerator::new();
        text.expect_generate().never();
        let vcs = MockVcs::new();

        let message = generator_with(text)
            .generate(&vcs, "old.txt", ChangeKind::Deleted, &changes())
            .await;

        assert_eq!(message.text, format!("Removed old.txt - obsolete as of {TS}"));
        assert_eq!(message.strategy, MessageStrategy::Removed);
    }

    #[tokio::test]
    async fn test_modified_path_uses_generated_text() {
        let mut text = MockTextGenerator::new();
        text.expect_generate()
            .times(1)
            .withf(|prompt| prompt.contains("+print('hello world')"))
            .returning(|_| Ok("\"Print a friendlier greeting\"".to_string()));
        let vcs = vcs_with_diff("", "-print('hi')\n+print('hello world')\n");

        let message = generator_with(text)
            .generate(&vcs, "app.py", ChangeKind::Modified, &changes())
            .await;

        assert_eq!(message.text, format!("Print a friendlier greeting ({TS})"));
        assert_eq!(message.strategy, MessageStrategy::Generated);
    }

    #[tokio::test]
    async fn test_generation_failure_falls_back() {
        let mut text = MockTextGenerator::new();
        text.expect_generate().times(1).returning(|_| {
            Err(GenerationError::Status {
                status: 500,
                body: "boom".to_string(),
            })
        });
        let vcs = vcs_with_diff("+changed\n", "");

        let message = generator_with(text)
            .generate(&vcs, "app.py", ChangeKind::Modified, &changes())
            .await;

        assert_eq!(
            message.text,
            format!("Updated app.py with recent changes ({TS})")
        );
        assert_eq!(message.strategy, MessageStrategy::GenerationFailed);
    }

    #[tokio::test]
    async fn test_generated_text_loses_only_one_quote_layer() {
        let mut text = MockTextGenerator::new();
        text.expect_generate()
            .times(1)
            .returning(|_| Ok("\"'Fix x'\"".to_string()));
        let vcs = vcs_with_diff("+changed\n", "");

        let message = generator_with(text)
            .generate(&vcs, "app.py", ChangeKind::Modified, &changes())
            .await;

        assert_eq!(message.text, format!("'Fix x' ({TS})"));
        assert_eq!(message.strategy, MessageStrategy::Generated);
    }

    #[tokio::test]
    async fn test_blank_generated_text_falls_back() {
        let mut text = MockTextGenerator::new();
        text.expect_generate()
            .times(1)
            .returning(|_| Ok("  \"\" ".to_string()));
        let vcs = vcs_with_diff("+changed\n", "");

        let message = generator_with(text)
            .generate(&vcs, "app.py", ChangeKind::Modified, &changes())
            .await;

        assert_eq!(message.strategy, MessageStrategy::GenerationFailed);
    }

    #[tokio::test]
    async fn test_offline_generator_falls_back() {
        let vcs = vcs_with_diff("+changed\n", "");
        let generator = MessageGenerator::new(None).with_clock(clock());

        let message = generator
            .generate(&vcs, "app.py", ChangeKind::Modified, &changes())
            .await;

        assert_eq!(
            message.text,
            format!("Updated app.py with recent changes ({TS})")
        );
        assert_eq!(message.strategy, MessageStrategy::GenerationFailed);
    }

    #[tokio::test]
    async fn test_empty_diff_skips_remote() {
        let mut text = MockTextGenerator::new();
        text.expect_generate().never();
        let vcs = vcs_with_diff("", "  \n");

        let message = generator_with(text)
            .generate(&vcs, "app.py", ChangeKind::Modified, &changes())
            .await;

        assert_eq!(
            message.text,
            format!("Updated app.py with minor changes ({TS})")
        );
        assert_eq!(message.strategy, MessageStrategy::EmptyDiff);
    }

    #[tokio::test]
    async fn test_added_paths_use_extension_templates() {
        let mut text = MockTextGenerator::new();
        text.expect_generate().never();
        let generator = generator_with(text);
        let vcs = MockVcs::new();
        let changes = changes();

        let code = generator
            .generate(&vcs, "src/main.rs", ChangeKind::Added, &changes)
            .await;
        assert_eq!(
            code.text,
            format!("Added main.rs with initial implementation ({TS})")
        );
        assert_eq!(code.strategy, MessageStrategy::NewFile(ExtensionClass::Code));

        let doc = generator
            .generate(&vcs, "docs/guide.md", ChangeKind::Added, &changes)
            .await;
        assert_eq!(doc.text, format!("Created guide.md with initial draft ({TS})"));

        let other = generator
            .generate(&vcs, "assets/logo.png", ChangeKind::Added, &changes)
            .await;
        assert_eq!(
            other.text,
            format!("Introduced logo.png to the project ({TS})")
        );
    }

    #[tokio::test]
    async fn test_kind_not_in_snapshot_as_modified_is_treated_as_new() {
        let mut text = MockTextGenerator::new();
        text.expect_generate().never();
        let vcs = MockVcs::new();

        // The snapshot decides, not the caller-supplied kind
        let message = generator_with(text)
            .generate(&vcs, "docs/guide.md", ChangeKind::Modified, &changes())
            .await;

        assert_eq!(
            message.strategy,
            MessageStrategy::NewFile(ExtensionClass::Document)
        );
    }
}
