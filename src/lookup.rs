//! # Committer Lookup
//!
//! Answers "who committed between these two revisions, and how often" for a
//! results page. Results are cached per range for the lifetime of the cache
//! file: the cache is loaded when the lookup is opened and written back
//! exactly once when it is closed (or dropped).

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::analysis::{committers_from_transcript, source_for, CommitterCache, LogSource};
use crate::config::Config;
use crate::error::Result;
use crate::types::{CommitterMap, RangeKey};

/// Placeholder used by the results page for revisions it could not resolve
const UNKNOWN_SENTINEL: &str = "unknown";

/// Cached committer lookups over one cache file
pub struct CommitterLookup<L: LogSource = Box<dyn LogSource>> {
    cache: CommitterCache,
    cache_path: PathBuf,
    source: L,
    retention: Option<chrono::Duration>,
    closed: bool,
}

impl CommitterLookup {
    /// Open a lookup using the backend and paths from `config`
    pub fn open(config: &Config) -> Self {
        Self::with_source(&config.cache_path, source_for(config), config.retention())
    }
}

impl<L: LogSource> CommitterLookup<L> {
    /// Open a lookup over `cache_path` that queries `source` on cache misses.
    ///
    /// A missing cache file starts an empty cache. So does an unreadable one,
    /// after logging a warning: the cache only saves work, so losing it is
    /// never fatal.
    pub fn with_source(
        cache_path: impl AsRef<Path>,
        source: L,
        retention: Option<chrono::Duration>,
    ) -> Self {
        let cache_path = cache_path.as_ref().to_path_buf();
        let cache = CommitterCache::load(&cache_path).unwrap_or_else(|e| {
            warn!("Ignoring committer cache {:?}: {}", cache_path, e);
            CommitterCache::new()
        });

        Self {
            cache,
            cache_path,
            source,
            retention,
            closed: false,
        }
    }

    /// Authors and commit counts for the range `hash1..hash2`.
    ///
    /// If either revision is the "Unknown" placeholder (case-insensitive,
    /// anywhere in the pair) the result is empty and nothing is queried.
    /// A failed log query is returned as an error and not cached.
    pub fn get_committers(&mut self, hash1: &str, hash2: &str) -> Result<CommitterMap> {
        let key = RangeKey::new(hash1, hash2);
        if key.as_str().to_lowercase().contains(UNKNOWN_SENTINEL) {
            debug!("Skipping placeholder range {}..{}", hash1, hash2);
            return Ok(CommitterMap::new());
        }

        let now = Utc::now();
        if let Some(authors) = self.cache.lookup(&key, now) {
            debug!("Committer cache hit for {}..{}", hash1, hash2);
            return Ok(authors.clone());
        }

        debug!("Committer cache miss for {}..{}", hash1, hash2);
        let transcript = self.source.log_range(hash1, hash2)?;
        let authors = committers_from_transcript(&transcript);
        Ok(self.cache.insert(key, authors, now).clone())
    }

    /// Like [`Self::get_committers`], but any failure degrades to an empty
    /// result so the page renders without committer information.
    pub fn get_committers_or_empty(&mut self, hash1: &str, hash2: &str) -> CommitterMap {
        self.get_committers(hash1, hash2).unwrap_or_else(|e| {
            warn!("No committer information for {}..{}: {}", hash1, hash2, e);
            CommitterMap::new()
        })
    }

    pub fn cache(&self) -> &CommitterCache {
        &self.cache
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// Drop entries not accessed within the retention window
    pub fn prune(&mut self) -> usize {
        self.prune_at(Utc::now())
    }

    pub fn prune_at(&mut self, now: DateTime<Utc>) -> usize {
        self.cache.prune(now, self.retention)
    }

    /// Prune and write the cache back to disk
    pub fn close(mut self) -> Result<()> {
        self.flush()
    }

    fn flush(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.prune();
        self.cache.store(&self.cache_path)
    }
}

impl<L: LogSource> Drop for CommitterLookup<L> {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            warn!("Failed to store committer cache {:?}: {}", self.cache_path, e);
        }
    }
}
