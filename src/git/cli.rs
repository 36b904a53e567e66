//! Git operations through the system `git` binary.
//!
//! All operations use `std::process::Command` to shell out to `git`, inheriting
//! the user's existing git config, SSH agent, and credential store. The
//! repository itself is validated up front with git2 so that a bad root fails
//! before any command runs.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use git2::Repository;
use tracing::debug;

use crate::error::VcsError;

/// Result of a commit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Created,
    /// git reported that there was nothing to commit for the path.
    NothingToCommit,
}

/// One entry from `git status --porcelain=v1 -z`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    /// Index (staged) status letter.
    pub index: char,
    /// Working tree status letter.
    pub worktree: char,
    pub path: String,
}

/// The version-control primitives the pipeline needs.
///
/// This abstraction allows mocking git in tests.
#[cfg_attr(test, mockall::automock)]
pub trait Vcs: Send + Sync {
    /// Untracked paths, honouring `.gitignore`.
    fn list_untracked(&self) -> Result<Vec<String>, VcsError>;

    /// Tracked changes (untracked files are not included).
    fn status(&self) -> Result<Vec<StatusEntry>, VcsError>;

    fn diff_staged(&self, path: &str) -> Result<String, VcsError>;

    fn diff_unstaged(&self, path: &str) -> Result<String, VcsError>;

    /// Stage a new or modified path.
    fn add(&self, path: &str) -> Result<(), VcsError>;

    /// Stage the removal of a path already deleted from the working tree.
    fn remove(&self, path: &str) -> Result<(), VcsError>;

    /// Commit only `path` with `message`.
    fn commit(&self, message: &str, path: &str) -> Result<CommitOutcome, VcsError>;

    fn push(&self, remote: &str, branch: &str) -> Result<(), VcsError>;
}

/// [`Vcs`] implementation backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCli {
    root: PathBuf,
}

impl GitCli {
    /// Open the working tree at `root`.
    ///
    /// `root` must be the top-level directory of a non-bare repository (the
    /// directory that holds `.git`); a subdirectory or the `.git` directory
    /// itself is rejected with [`VcsError::NotARepository`].
    pub fn open(root: impl AsRef<Path>) -> Result<Self, VcsError> {
        let root = root.as_ref();
        let not_a_repo = || VcsError::NotARepository(root.to_path_buf());

        if !root.is_dir() {
            return Err(not_a_repo());
        }

        let repo = Repository::open(root).map_err(|_| not_a_repo())?;
        if repo.is_bare() {
            return Err(not_a_repo());
        }

        let canonical_root = root.canonicalize().map_err(|_| not_a_repo())?;
        let workdir = repo
            .workdir()
            .and_then(|w| w.canonicalize().ok())
            .ok_or_else(not_a_repo)?;
        if workdir != canonical_root {
            return Err(not_a_repo());
        }

        if which::which("git").is_err() {
            return Err(VcsError::GitNotInstalled);
        }

        Ok(Self {
            root: canonical_root,
        })
    }

    /// Canonical path of the working tree root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run a git command in the working tree and return its output.
    ///
    /// Non-zero exit status is returned as the raw `Output` so callers can
    /// inspect it; spawn failures become [`VcsError::SpawnFailed`]. Paths are
    /// passed as literal pathspecs, so glob characters in a file name only
    /// ever match that file.
    fn run_raw(&self, args: &[&str], operation: &str) -> Result<Output, VcsError> {
        debug!(operation, ?args, "running git");
        Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .env("LC_ALL", "C")
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("GIT_LITERAL_PATHSPECS", "1")
            .output()
            .map_err(|source| VcsError::SpawnFailed {
                operation: operation.to_string(),
                source,
            })
    }

    /// Run a git command and return stdout, mapping non-zero exit to an error.
    fn run(&self, args: &[&str], operation: &str) -> Result<String, VcsError> {
        let output = self.run_raw(args, operation)?;
        if !output.status.success() {
            return Err(command_failed(operation, &output));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Vcs for GitCli {
    fn list_untracked(&self) -> Result<Vec<String>, VcsError> {
        let stdout = self.run(
            &["ls-files", "-z", "--others", "--exclude-standard"],
            "ls-files",
        )?;
        Ok(split_nul(&stdout).map(str::to_string).collect())
    }

    fn status(&self) -> Result<Vec<StatusEntry>, VcsError> {
        let stdout = self.run(
            &["status", "--porcelain=v1", "-z", "--untracked-files=no"],
            "status",
        )?;
        Ok(parse_porcelain_z(&stdout))
    }

    fn diff_staged(&self, path: &str) -> Result<String, VcsError> {
        self.run(&["diff", "--no-color", "--cached", "--", path], "diff --cached")
    }

    fn diff_unstaged(&self, path: &str) -> Result<String, VcsError> {
        self.run(&["diff", "--no-color", "--", path], "diff")
    }

    fn add(&self, path: &str) -> Result<(), VcsError> {
        self.run(&["add", "--", path], "add").map(|_| ())
    }

    fn remove(&self, path: &str) -> Result<(), VcsError> {
        self.run(
            &["rm", "--cached", "--quiet", "--ignore-unmatch", "--", path],
            "rm",
        )
        .map(|_| ())
    }

    fn commit(&self, message: &str, path: &str) -> Result<CommitOutcome, VcsError> {
        let output = self.run_raw(&["commit", "-m", message, "--", path], "commit")?;
        if output.status.success() {
            return Ok(CommitOutcome::Created);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if reports_nothing_to_commit(&stdout) || reports_nothing_to_commit(&stderr) {
            return Ok(CommitOutcome::NothingToCommit);
        }

        Err(command_failed("commit", &output))
    }

    fn push(&self, remote: &str, branch: &str) -> Result<(), VcsError> {
        self.run(&["push", "--quiet", remote, branch], "push").map(|_| ())
    }
}

fn command_failed(operation: &str, output: &Output) -> VcsError {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = if stderr.trim().is_empty() {
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    } else {
        stderr.trim().to_string()
    };
    VcsError::CommandFailed {
        operation: operation.to_string(),
        code: output.status.code(),
        stderr,
    }
}

fn reports_nothing_to_commit(text: &str) -> bool {
    text.contains("nothing to commit")
        || text.contains("nothing added to commit")
        || text.contains("no changes added to commit")
}

fn split_nul(text: &str) -> impl Iterator<Item = &str> {
    text.split('\0').filter(|s| !s.is_empty())
}

/// Parse `git status --porcelain=v1 -z` output.
///
/// Each record is `XY PATH`; rename and copy records are followed by an extra
/// NUL-terminated source path.
pub fn parse_porcelain_z(output: &str) -> Vec<StatusEntry> {
    let mut entries = Vec::new();
    let mut records = split_nul(output);

    while let Some(record) = records.next() {
        let mut chars = record.chars();
        let (Some(index), Some(worktree), Some(' ')) = (chars.next(), chars.next(), chars.next())
        else {
            debug!(record, "skipping unparseable status record");
            continue;
        };
        let path = chars.as_str().to_string();
        if path.is_empty() {
            continue;
        }

        // Renames and copies carry their source path as a second record
        if matches!(index, 'R' | 'C') {
            records.next();
        }

        entries.push(StatusEntry {
            index,
            worktree,
            path,
        });
    }

    entries
}
