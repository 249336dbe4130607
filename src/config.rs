//! # Configuration
//!
//! Where the committer cache lives, which repository is queried and how.
//! A config file is optional; every field has a default.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{LookupError, Result};

const CACHE_DIR_NAME: &str = "committers";
const CACHE_FILE_NAME: &str = "committers-cache.json";

/// Which log-range query collaborator to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Walk the history in-process with libgit2
    #[default]
    Git2,
    /// Run the `git log` command
    Cli,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "git2" => Ok(Backend::Git2),
            "cli" | "git" => Ok(Backend::Cli),
            other => Err(format!("unknown backend '{}' (expected git2 or cli)", other)),
        }
    }
}

/// Runtime configuration for a [`crate::CommitterLookup`]
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// File the committer cache is loaded from and stored to
    pub cache_path: PathBuf,
    /// Repository the revision ranges refer to
    pub repo_path: PathBuf,
    pub backend: Backend,
    /// Cache entries not accessed for this many days are pruned on close.
    /// `None` keeps entries forever.
    pub retention_days: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_path: default_cache_path(),
            repo_path: PathBuf::from("."),
            backend: Backend::default(),
            retention_days: None,
        }
    }
}

impl Config {
    /// Load a TOML config file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| LookupError::io(path, e))?;
        Self::from_toml(&text).map_err(|message| LookupError::Config {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn from_toml(text: &str) -> std::result::Result<Self, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }

    /// Retention window as a chrono duration
    pub fn retention(&self) -> Option<chrono::Duration> {
        self.retention_days
            .and_then(|days| i64::try_from(days).ok())
            .and_then(chrono::Duration::try_days)
    }
}

/// Default cache location under the user's cache directory
pub fn default_cache_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(CACHE_DIR_NAME)
        .join(CACHE_FILE_NAME)
}
