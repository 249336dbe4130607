//! Parsing of `git log` transcripts into author counts.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{AuthorRecord, CommitterMap};

// `Author: <name>` optionally followed by ` <email>`. The name is matched
// lazily so a trailing email clause is never folded into it.
static AUTHOR_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*Author:\s*(\S.*?)(?:\s+<([^>]*)>)?\s*$").expect("author line pattern is valid")
});

/// Parse a single transcript line.
///
/// Returns the author name and, when present, the email clause.
pub fn parse_author_line(line: &str) -> Option<(&str, Option<&str>)> {
    let caps = AUTHOR_LINE.captures(line)?;
    let name = caps.get(1)?.as_str();
    let email = caps.get(2).map(|m| m.as_str());
    Some((name, email))
}

/// Extract the author name of every `Author:` line, in transcript order.
pub fn parse_author_lines(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(parse_author_line)
        .map(|(name, _email)| name.to_string())
        .collect()
}

/// Count commits per author
pub fn tally_authors<I, S>(names: I) -> CommitterMap
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut authors = CommitterMap::new();
    for name in names {
        authors
            .entry(name.into())
            .and_modify(|record| record.commit_count += 1)
            .or_insert_with(AuthorRecord::first_commit);
    }
    authors
}

/// Parse a whole transcript into its author counts
pub fn committers_from_transcript(text: &str) -> CommitterMap {
    tally_authors(parse_author_lines(text))
}
