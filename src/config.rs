//! Run configuration: defaults, an optional TOML file, and environment.
//!
//! CLI flags are applied on top by the binary before [`Config::validate`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;
use crate::git::{PathExclusionFilter, ProcessingOrder};
use crate::sequencer::SequencerConfig;

/// File looked up in the repository root when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = ".trickle.toml";

/// Environment variable holding the text-generation API key.
pub const API_KEY_ENV: &str = "TRICKLE_API_KEY";

pub const DEFAULT_ENDPOINT: &str = "https://api.together.xyz/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "meta-llama/Llama-3.3-70B-Instruct-Turbo-Free";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Repository root. The `--root` flag wins over this value.
    pub root: Option<PathBuf>,
    pub remote: String,
    pub branch: String,
    /// Path prefixes never committed.
    pub exclude: Vec<String>,
    /// Seconds to wait between consecutive paths.
    pub pacing_secs: u64,
    pub order: ProcessingOrder,
    pub push: bool,
    pub llm: LlmConfig,
    /// File this configuration was read from, if any.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: None,
            remote: "origin".to_string(),
            branch: "main".to_string(),
            exclude: Vec::new(),
            pacing_secs: 2,
            order: ProcessingOrder::default(),
            push: true,
            llm: LlmConfig::default(),
            source: None,
        }
    }
}

/// Settings for the chat-completions endpoint.
#[derive(Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LlmConfig {
    pub endpoint: String,
    pub model: String,
    /// Falls back to `TRICKLE_API_KEY` when unset.
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    /// Per-attempt request timeout.
    pub timeout_secs: u64,
    pub max_attempts: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            max_tokens: 100,
            temperature: 0.7,
            top_p: 0.9,
            timeout_secs: 30,
            max_attempts: 2,
        }
    }
}

// Hand-written so the key never reaches logs
impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist. Otherwise `<root>/.trickle.toml` is read
    /// when present, and defaults are used when it is not. The API key is
    /// taken from the environment when the file does not set one.
    pub fn load(explicit: Option<&Path>, root: &Path) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let candidate = root.join(CONFIG_FILE_NAME);
                if candidate.is_file() {
                    Self::from_file(&candidate)?
                } else {
                    debug!(path = %candidate.display(), "No config file, using defaults");
                    Self::default()
                }
            }
        };

        if config.llm.api_key.is_none() {
            config.llm.api_key = std::env::var(API_KEY_ENV)
                .ok()
                .filter(|k| !k.trim().is_empty());
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ParseFailed {
                path: path.to_path_buf(),
                source,
            })?;
        config.source = Some(path.to_path_buf());
        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Check value ranges. Processing order is checked while parsing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.remote.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "remote",
                reason: "must not be empty".to_string(),
            });
        }
        if self.branch.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "branch",
                reason: "must not be empty".to_string(),
            });
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::InvalidValue {
                field: "llm.temperature",
                reason: format!("{} is outside [0, 2]", self.llm.temperature),
            });
        }
        if !(self.llm.top_p > 0.0 && self.llm.top_p <= 1.0) {
            return Err(ConfigError::InvalidValue {
                field: "llm.top_p",
                reason: format!("{} is outside (0, 1]", self.llm.top_p),
            });
        }
        if self.llm.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "llm.max_attempts",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.llm.max_tokens == 0 {
            return Err(ConfigError::InvalidValue {
                field: "llm.max_tokens",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.llm.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "llm.timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Exclusion filter for `root`.
    ///
    /// The config file itself is excluded when it lives inside the working
    /// tree, so a stored API key is never committed.
    pub fn exclusion_filter(&self, root: &Path) -> PathExclusionFilter {
        let mut filter = PathExclusionFilter::new(&self.exclude);
        if let Some(relative) = self.source.as_deref().and_then(|s| relative_to(s, root)) {
            filter.push(&relative);
        }
        filter
    }

    pub fn sequencer(&self) -> SequencerConfig {
        SequencerConfig {
            remote: self.remote.clone(),
            branch: self.branch.clone(),
            pacing: Duration::from_secs(self.pacing_secs),
            order: self.order.clone(),
            push: self.push,
        }
    }
}

/// `path` relative to `root` with `/` separators, if it lies inside it.
fn relative_to(path: &Path, root: &Path) -> Option<String> {
    let path = path.canonicalize().ok()?;
    let root = root.canonicalize().ok()?;
    let relative = path.strip_prefix(&root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}
