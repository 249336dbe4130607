use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::{LookupError, Result};
use crate::types::{CacheEntry, CommitterMap, RangeKey};

/// Version of the on-disk cache document
pub const CACHE_FORMAT_VERSION: u32 = 1;

#[derive(Deserialize)]
struct CacheDocument {
    version: u32,
    entries: HashMap<RangeKey, CacheEntry>,
}

#[derive(Serialize)]
struct CacheDocumentRef<'a> {
    version: u32,
    entries: &'a HashMap<RangeKey, CacheEntry>,
}

/// Committer results keyed by revision range
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommitterCache {
    entries: HashMap<RangeKey, CacheEntry>,
    // Keys pruned since load, so a store doesn't resurrect them from disk.
    pruned: HashSet<RangeKey>,
}

impl CommitterCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Retrieve an entry without recording an access
    pub fn get(&self, key: &RangeKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Retrieve the authors for a range, recording the access
    pub fn lookup(&mut self, key: &RangeKey, now: DateTime<Utc>) -> Option<&CommitterMap> {
        let entry = self.entries.get_mut(key)?;
        entry.touch(now);
        Some(&entry.authors)
    }

    /// Store the authors of a range. An existing entry is left untouched.
    pub fn insert(&mut self, key: RangeKey, authors: CommitterMap, now: DateTime<Utc>) -> &CommitterMap {
        self.pruned.remove(&key);
        &self
            .entries
            .entry(key)
            .or_insert_with(|| CacheEntry::new(authors, now))
            .authors
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RangeKey, &CacheEntry)> {
        self.entries.iter()
    }

    /// Remove entries not accessed within `retention` of `now`.
    ///
    /// Without a retention window nothing is removed. Returns the number of
    /// entries removed.
    pub fn prune(&mut self, now: DateTime<Utc>, retention: Option<chrono::Duration>) -> usize {
        let Some(retention) = retention else {
            return 0;
        };
        // A window reaching past chrono's range keeps everything.
        let Some(cutoff) = now.checked_sub_signed(retention) else {
            return 0;
        };
        let expired: Vec<RangeKey> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.last_accessed < cutoff)
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.entries.remove(key);
            self.pruned.insert(key.clone());
        }
        if !expired.is_empty() {
            debug!("Pruned {} committer cache entries older than {}", expired.len(), cutoff);
        }
        expired.len()
    }

    /// Load the cache from `path`. A missing file yields an empty cache.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No committer cache at {:?}, starting empty", path);
            return Ok(Self::new());
        }

        let _lock = match CacheLock::shared(path) {
            Ok(lock) => Some(lock),
            Err(e) => {
                warn!("Reading committer cache without lock: {}", e);
                None
            }
        };

        let entries = read_entries(path)?.unwrap_or_default();
        info!("Loaded {} committer cache entries from {:?}", entries.len(), path);
        Ok(Self {
            entries,
            pruned: HashSet::new(),
        })
    }

    /// Write the cache to `path`, replacing the file atomically.
    ///
    /// Entries another process stored since this cache was loaded are merged
    /// in first; on a key collision the in-memory author set is kept.
    pub fn store(&mut self, path: &Path) -> Result<()> {
        let dir = parent_dir(path);
        fs::create_dir_all(dir).map_err(|e| LookupError::io(dir, e))?;
        let _lock = CacheLock::exclusive(path)?;

        match read_entries(path) {
            Ok(Some(on_disk)) => self.absorb(on_disk),
            Ok(None) => {}
            Err(e) => warn!("Overwriting unreadable committer cache {:?}: {}", path, e),
        }

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| LookupError::io(dir, e))?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            let document = CacheDocumentRef {
                version: CACHE_FORMAT_VERSION,
                entries: &self.entries,
            };
            serde_json::to_writer_pretty(&mut writer, &document)?;
            writer.flush().map_err(|e| LookupError::io(path, e))?;
        }
        tmp.as_file().sync_all().map_err(|e| LookupError::io(path, e))?;
        tmp.persist(path).map_err(|e| LookupError::io(path, e.error))?;

        info!("Stored {} committer cache entries to {:?}", self.entries.len(), path);
        Ok(())
    }

    fn absorb(&mut self, on_disk: HashMap<RangeKey, CacheEntry>) {
        for (key, disk_entry) in on_disk {
            if self.pruned.contains(&key) {
                continue;
            }
            match self.entries.get_mut(&key) {
                Some(entry) => entry.touch(disk_entry.last_accessed),
                None => {
                    self.entries.insert(key, disk_entry);
                }
            }
        }
    }
}

fn read_entries(path: &Path) -> Result<Option<HashMap<RangeKey, CacheEntry>>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(LookupError::io(path, e)),
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    let document: CacheDocument = serde_json::from_slice(&bytes)?;
    if document.version != CACHE_FORMAT_VERSION {
        return Err(LookupError::Serialization(serde::de::Error::custom(format!(
            "unsupported cache format version {}",
            document.version
        ))));
    }
    Ok(Some(document.entries))
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

/// Advisory lock on a sidecar `<cache>.lock` file.
///
/// Released when dropped (or by the OS if the process dies).
struct CacheLock {
    _file: File,
}

impl CacheLock {
    fn lock_path(path: &Path) -> PathBuf {
        let mut name = OsString::from(path.as_os_str());
        name.push(".lock");
        PathBuf::from(name)
    }

    fn open(path: &Path) -> Result<File> {
        let lock_path = Self::lock_path(path);
        fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| LookupError::io(lock_path, e))
    }

    fn shared(path: &Path) -> Result<Self> {
        let file = Self::open(path)?;
        file.lock_shared().map_err(|e| LookupError::io(path, e))?;
        Ok(Self { _file: file })
    }

    fn exclusive(path: &Path) -> Result<Self> {
        let file = Self::open(path)?;
        file.lock_exclusive().map_err(|e| LookupError::io(path, e))?;
        Ok(Self { _file: file })
    }
}
