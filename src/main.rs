//! Committers command-line tool
//!
//! Prints the authors who committed within a revision range, using the
//! on-disk committer cache.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use committers::types::ranked;
use committers::{Backend, CommitterLookup, Config};

#[derive(Parser, Debug)]
#[command(name = "committers", version, about = "Authors and commit counts for a Git revision range")]
struct Cli {
    /// TOML config file
    #[arg(short, long, env = "COMMITTERS_CONFIG")]
    config: Option<PathBuf>,

    /// Committer cache file
    #[arg(long, env = "COMMITTERS_CACHE")]
    cache: Option<PathBuf>,

    /// Repository to query
    #[arg(long, env = "COMMITTERS_REPO")]
    repo: Option<PathBuf>,

    /// Log backend: git2 or cli
    #[arg(long, env = "COMMITTERS_BACKEND")]
    backend: Option<Backend>,

    /// Prune cache entries unused for this many days
    #[arg(long, env = "COMMITTERS_RETENTION_DAYS")]
    retention_days: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the committers between two revisions
    Query {
        hash1: String,
        hash2: String,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// List cached ranges
    List,
    /// Remove cache entries outside the retention window
    Prune,
}

impl Cli {
    fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => Config::default(),
        };
        if let Some(cache) = &self.cache {
            config.cache_path = cache.clone();
        }
        if let Some(repo) = &self.repo {
            config.repo_path = repo.clone();
        }
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if self.retention_days.is_some() {
            config.retention_days = self.retention_days;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.load_config()?;
    let mut lookup = CommitterLookup::open(&config);

    match &cli.command {
        Command::Query { hash1, hash2, json } => {
            let authors = lookup
                .get_committers(hash1, hash2)
                .with_context(|| format!("Failed to resolve committers for {}..{}", hash1, hash2))?;
            if *json {
                let sorted: BTreeMap<_, _> = authors.iter().collect();
                println!("{}", serde_json::to_string_pretty(&sorted)?);
            } else {
                for (name, count) in ranked(&authors) {
                    println!("{:>6}  {}", count, name);
                }
            }
        }
        Command::List => {
            let mut entries: Vec<_> = lookup.cache().iter().collect();
            entries.sort_by(|a, b| b.1.last_accessed.cmp(&a.1.last_accessed));
            for (key, entry) in entries {
                println!(
                    "{}  {:>4} authors  last used {}",
                    key,
                    entry.authors.len(),
                    entry.last_accessed.format("%Y-%m-%d %H:%M:%S")
                );
            }
        }
        Command::Prune => {
            let removed = lookup.prune();
            println!("Pruned {} cache entries", removed);
        }
    }

    lookup
        .close()
        .with_context(|| format!("Failed to store committer cache {}", config.cache_path.display()))
}
