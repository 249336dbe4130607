//! # Committers
//!
//! `committers` resolves which authors committed within a Git revision range
//! and how many commits each of them made. Results are cached on disk per
//! range, so the history of a range is walked at most once.
//!
//! ## Features
//!
//! - Parse `git log` transcripts into per-author commit counts
//! - Query ranges in-process with libgit2 or through the `git` command
//! - Persistent JSON cache with atomic writes and cross-process locking
//! - Optional pruning of entries that have not been used for a while
//!
//! ## Example
//!
//! ```no_run
//! use committers::{CommitterLookup, Config};
//!
//! let config = Config::default();
//! let mut lookup = CommitterLookup::open(&config);
//! let authors = lookup.get_committers_or_empty("v1.0", "v1.1");
//! for (name, count) in committers::types::ranked(&authors) {
//!     println!("{:>5}  {}", count, name);
//! }
//! lookup.close().unwrap();
//! ```

pub mod analysis;
pub mod config;
pub mod error;
pub mod lookup;
pub mod types;

// Re-export main types for convenience
pub use config::{Backend, Config};
pub use error::{LookupError, Result};
pub use lookup::CommitterLookup;
pub use types::{AuthorRecord, CommitterMap, RangeKey};
