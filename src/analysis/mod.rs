mod cache;
pub mod git;
pub mod parse;


pub use cache::{CommitterCache, CACHE_FORMAT_VERSION};
pub use git::{source_for, Git2Log, GitCliLog, LogSource};
pub use parse::{committers_from_transcript, parse_author_line, parse_author_lines, tally_authors};
