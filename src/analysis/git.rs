use chrono::{DateTime, FixedOffset, Utc};
use git2::{Commit, Mailmap, Repository, Signature, Sort};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

use crate::config::{Backend, Config};
use crate::error::{LookupError, Result};

/// Produces the log transcript of a revision range.
///
/// The transcript lists the commits reachable from `hash2` but not from
/// `hash1`, one `Author:` line per commit, in the same text layout as
/// `git log`.
pub trait LogSource {
    fn log_range(&self, hash1: &str, hash2: &str) -> Result<String>;
}

impl<T: LogSource + ?Sized> LogSource for Box<T> {
    fn log_range(&self, hash1: &str, hash2: &str) -> Result<String> {
        (**self).log_range(hash1, hash2)
    }
}

/// Build the log source selected by the config
pub fn source_for(config: &Config) -> Box<dyn LogSource> {
    match config.backend {
        Backend::Git2 => Box::new(Git2Log::new(&config.repo_path)),
        Backend::Cli => Box::new(GitCliLog::new(&config.repo_path)),
    }
}

/// Reject revisions that could be read as command-line options
pub fn validate_revision(rev: &str) -> Result<()> {
    if rev.trim().is_empty() || rev.starts_with('-') {
        return Err(LookupError::InvalidRevision(rev.to_string()));
    }
    Ok(())
}

/// Walks the range in-process with libgit2
#[derive(Debug, Clone)]
pub struct Git2Log {
    repo_path: PathBuf,
}

impl Git2Log {
    pub fn new(repo_path: impl AsRef<Path>) -> Self {
        Self {
            repo_path: repo_path.as_ref().to_path_buf(),
        }
    }
}

impl LogSource for Git2Log {
    fn log_range(&self, hash1: &str, hash2: &str) -> Result<String> {
        validate_revision(hash1)?;
        validate_revision(hash2)?;

        let repo = Repository::open(&self.repo_path)?;
        let mut revwalk = repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push_range(&format!("{}..{}", hash1, hash2))?;
        let mailmap = repo.mailmap()?;

        let mut transcript = String::new();
        let mut commit_count = 0;
        for oid in revwalk {
            let commit = repo.find_commit(oid?)?;
            write_commit(&mut transcript, &commit, &mailmap)?;
            commit_count += 1;
        }

        debug!(
            "git2 walked {} commits for {}..{} in {:?}",
            commit_count, hash1, hash2, self.repo_path
        );
        Ok(transcript)
    }
}

/// Render a commit the way `git log` prints it by default, with the
/// repository's mailmap applied to the author
fn write_commit(out: &mut String, commit: &Commit<'_>, mailmap: &Mailmap) -> Result<()> {
    out.push_str(&format!("commit {}\n", commit.id()));
    if commit.parent_count() > 1 {
        let parents: Vec<String> = commit
            .parent_ids()
            .map(|id| id.to_string()[..7].to_string())
            .collect();
        out.push_str(&format!("Merge: {}\n", parents.join(" ")));
    }

    let author = commit.author_with_mailmap(mailmap)?;
    out.push_str(&format!("Author: {}\n", format_signature(&author)));
    if let Some(date) = signature_date(&author) {
        out.push_str(&format!("Date:   {}\n", date.format("%a %b %-d %H:%M:%S %Y %z")));
    }
    out.push('\n');

    let message = String::from_utf8_lossy(commit.message_bytes());
    for line in message.trim_end().lines() {
        out.push_str(&format!("    {}\n", line));
    }
    out.push('\n');
    Ok(())
}

fn format_signature(sig: &Signature<'_>) -> String {
    format!(
        "{} <{}>",
        String::from_utf8_lossy(sig.name_bytes()),
        String::from_utf8_lossy(sig.email_bytes())
    )
}

fn signature_date(sig: &Signature<'_>) -> Option<DateTime<FixedOffset>> {
    let when = sig.when();
    let offset = FixedOffset::east_opt(when.offset_minutes() * 60)?;
    DateTime::<Utc>::from_timestamp(when.seconds(), 0).map(|dt| dt.with_timezone(&offset))
}

/// Runs `git log` in the repository directory
#[derive(Debug, Clone)]
pub struct GitCliLog {
    repo_path: PathBuf,
    git: PathBuf,
}

impl GitCliLog {
    pub fn new(repo_path: impl AsRef<Path>) -> Self {
        Self {
            repo_path: repo_path.as_ref().to_path_buf(),
            git: PathBuf::from("git"),
        }
    }

    /// Use a specific git executable instead of the one on `PATH`
    pub fn with_git(mut self, git: impl Into<PathBuf>) -> Self {
        self.git = git.into();
        self
    }
}

impl LogSource for GitCliLog {
    fn log_range(&self, hash1: &str, hash2: &str) -> Result<String> {
        validate_revision(hash1)?;
        validate_revision(hash2)?;

        let range = format!("{}..{}", hash1, hash2);
        let output = Command::new(&self.git)
            .current_dir(&self.repo_path)
            .args(["log", "--no-color", range.as_str(), "--"])
            .output()
            .map_err(|e| LookupError::io(&self.git, e))?;

        if !output.status.success() {
            return Err(LookupError::LogQuery {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        debug!(
            "git log {} produced {} bytes in {:?}",
            range,
            output.stdout.len(),
            self.repo_path
        );
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
