//! # Common Types
//!
//! This module contains the common types used throughout the crate for
//! representing the authors of a revision range and the cached results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Authors of a revision range, keyed by author name.
pub type CommitterMap = HashMap<String, AuthorRecord>;

/// A key used for caching committer results based on the two range boundaries.
///
/// The key is the plain concatenation of both revision identifiers. It is
/// opaque: neither half is validated as a real revision.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RangeKey(String);

impl RangeKey {
    /// Build the key for the range `hash1..hash2`
    pub fn new(hash1: &str, hash2: &str) -> Self {
        let mut key = String::with_capacity(hash1.len() + hash2.len());
        key.push_str(hash1);
        key.push_str(hash2);
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RangeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-author aggregate within a revision range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRecord {
    /// Number of commits by this author in the range (always at least 1)
    pub commit_count: usize,
    /// Author email. Parsed from the transcript but never stored, so this is
    /// always `None`.
    #[serde(default)]
    pub email: Option<String>,
}

impl AuthorRecord {
    /// A record for an author seen for the first time
    pub fn first_commit() -> Self {
        Self {
            commit_count: 1,
            email: None,
        }
    }
}

/// A cached range result together with its access records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Authors computed by the log query that created this entry
    pub authors: CommitterMap,
    /// When the entry was inserted
    pub created_at: DateTime<Utc>,
    /// When the entry was last returned from a lookup
    pub last_accessed: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(authors: CommitterMap, now: DateTime<Utc>) -> Self {
        Self {
            authors,
            created_at: now,
            last_accessed: now,
        }
    }

    /// Record a cache hit. The author set itself is never modified.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.last_accessed {
            self.last_accessed = now;
        }
    }
}

/// Author names ordered by commit count (descending), then by name.
pub fn ranked(authors: &CommitterMap) -> Vec<(&str, usize)> {
    let mut ranked: Vec<(&str, usize)> = authors
        .iter()
        .map(|(name, record)| (name.as_str(), record.commit_count))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
}
