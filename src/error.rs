//! Error types for committer lookups.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving or caching committers
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to (de)serialize committer cache: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("git log exited with {status}: {stderr}")]
    LogQuery { status: String, stderr: String },

    #[error("Invalid revision: {0:?}")]
    InvalidRevision(String),

    #[error("Invalid configuration in {path}: {message}")]
    Config { path: PathBuf, message: String },
}

impl LookupError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, LookupError>;
