//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::NaiveDate;
use git2::{Repository, RepositoryInitOptions, Signature};

use trickle::message::FixedClock;

/// The instant every test message is stamped with.
pub const TEST_TIMESTAMP: &str = "2024-06-01 10:00:00";

pub fn test_clock() -> FixedClock {
    FixedClock(
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap(),
    )
}

/// A test git repository builder for integration tests.
///
/// The repository starts on `main` with a local identity configured, so the
/// `git` CLI can commit without touching the user's global config.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
    /// Bare repository acting as `origin`, once added.
    pub origin: Option<tempfile::TempDir>,
}

impl TestRepo {
    /// Create a new empty git repository in a temp directory.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        let repo = Repository::init_opts(dir.path(), &opts).expect("Failed to init git repo");

        let mut config = repo.config().expect("Failed to open repo config");
        config.set_str("user.name", "Test User").unwrap();
        config.set_str("user.email", "test@example.com").unwrap();
        config.set_bool("commit.gpgsign", false).unwrap();

        Self {
            dir,
            repo,
            origin: None,
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    fn signature(&self) -> Signature<'_> {
        Signature::now("Test User", "test@example.com").expect("Failed to create signature")
    }

    /// Write a file relative to the repository root, creating parent directories.
    pub fn write(&self, relative: &str, content: &str) {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&path, content).expect("Failed to write test file");
    }

    pub fn delete(&self, relative: &str) {
        std::fs::remove_file(self.dir.path().join(relative)).expect("Failed to delete test file");
    }

    /// Write the given files and commit them all through git2.
    pub fn commit_files(&self, files: &[(&str, &str)], message: &str) {
        let mut index = self.repo.index().expect("Failed to get index");
        for (relative, content) in files {
            self.write(relative, content);
            index
                .add_path(Path::new(relative))
                .expect("Failed to add file");
        }
        index.write().expect("Failed to write index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        let sig = self.signature();
        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("Failed to create commit");
    }

    /// Stage a path via the git CLI (mirrors what a user would do by hand).
    pub fn stage(&self, relative: &str) {
        self.git(&["add", "--", relative]);
    }

    /// Add a bare `origin` remote and push the current branch to it.
    pub fn add_origin(&mut self) {
        let origin = tempfile::tempdir().expect("Failed to create origin directory");
        Repository::init_bare(origin.path()).expect("Failed to init bare origin");

        let url = origin.path().to_string_lossy().into_owned();
        self.git(&["remote", "add", "origin", &url]);
        self.git(&["push", "--quiet", "origin", "main"]);
        self.origin = Some(origin);
    }

    /// Run the git CLI in the working tree, panicking on failure.
    pub fn git(&self, args: &[&str]) -> String {
        let output = Command::new("git")
            .args(args)
            .current_dir(self.dir.path())
            .output()
            .expect("Failed to run git");
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    /// Commit subjects on HEAD, newest first.
    pub fn log_messages(&self) -> Vec<String> {
        self.git(&["log", "--format=%s"])
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Files touched by the HEAD commit.
    pub fn head_files(&self) -> Vec<String> {
        self.git(&["show", "--name-only", "--format=", "HEAD"])
            .lines()
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Commit subjects on `origin/main`, newest first.
    pub fn origin_messages(&self) -> Vec<String> {
        let origin = self.origin.as_ref().expect("origin not configured");
        let output = Command::new("git")
            .args(["log", "--format=%s", "main"])
            .current_dir(origin.path())
            .output()
            .expect("Failed to run git log in origin");
        String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }
}
