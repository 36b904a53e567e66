//! Error types for trickle modules using thiserror.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors from git operations.
#[derive(Error, Debug)]
pub enum VcsError {
    #[error("{} is not a valid git repository (expected the top-level working tree)", .0.display())]
    NotARepository(PathBuf),

    #[error("git executable not found. Install git and make sure it is on PATH")]
    GitNotInstalled,

    #[error("Failed to run git {operation}: {source}")]
    SpawnFailed {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("git {operation} exited with {}: {stderr}",
            code.map_or("unknown status".to_string(), |c| format!("code {c}")))]
    CommandFailed {
        operation: String,
        code: Option<i32>,
        stderr: String,
    },
}

/// Errors from the remote text-generation call.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("No API key configured for the text-generation endpoint")]
    MissingCredential,

    #[error("Request to text-generation endpoint failed: {0}")]
    Http(#[source] reqwest::Error),

    #[error("Text-generation request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Text-generation endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Text-generation endpoint returned an empty message")]
    EmptyResponse,

    #[error("Text-generation endpoint returned a malformed response: {0}")]
    MalformedResponse(String),

    #[error("All retry attempts failed: {0}")]
    RetriesExhausted(#[source] Box<GenerationError>),
}

impl GenerationError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            GenerationError::Timeout(_) => true,
            GenerationError::Http(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            GenerationError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Errors from loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", path.display())]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid processing order: {0}")]
    InvalidOrder(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_failed_display_with_code() {
        let err = VcsError::CommandFailed {
            operation: "push".to_string(),
            code: Some(128),
            stderr: "fatal: no remote".to_string(),
        };
        assert_eq!(err.to_string(), "git push exited with code 128: fatal: no remote");
    }

    #[test]
    fn test_command_failed_display_without_code() {
        let err = VcsError::CommandFailed {
            operation: "add".to_string(),
            code: None,
            stderr: "killed".to_string(),
        };
        assert!(err.to_string().contains("unknown status"));
    }

    #[test]
    fn test_generation_error_transient() {
        assert!(GenerationError::Timeout(Duration::from_secs(30)).is_transient());
        assert!(GenerationError::Status { status: 503, body: String::new() }.is_transient());
        assert!(GenerationError::Status { status: 429, body: String::new() }.is_transient());
        assert!(!GenerationError::Status { status: 401, body: String::new() }.is_transient());
        assert!(!GenerationError::EmptyResponse.is_transient());
        assert!(!GenerationError::MissingCredential.is_transient());
    }
}
