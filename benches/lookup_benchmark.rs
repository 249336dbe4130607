/// Benchmark module for committer lookups.
/// Measures transcript parsing, range queries and cache round trips.
use committers::analysis::{committers_from_transcript, CommitterCache, Git2Log, LogSource};
use committers::{CommitterLookup, RangeKey};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use git2::{Oid, Repository, Signature};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Set up a test repository for benchmarking
/// Creates a repository with 200 commits alternating between four authors
///
/// # Returns
/// * `(TempDir, Oid, Oid)` - Temporary directory, root commit and head commit
fn setup_large_test_repo() -> (TempDir, Oid, Oid) {
    let temp_dir = TempDir::new().unwrap();
    let repo = Repository::init(temp_dir.path()).unwrap();
    let authors = [
        ("Test User", "test@example.com"),
        ("Another User", "another@example.com"),
        ("Third User", "third@example.com"),
        ("Fourth User", "fourth@example.com"),
    ];

    let signature = Signature::now("Test User", "test@example.com").unwrap();
    let tree_id = {
        let mut index = repo.index().unwrap();
        index.write_tree().unwrap()
    };
    let root = {
        let tree = repo.find_tree(tree_id).unwrap();
        repo.commit(Some("HEAD"), &signature, &signature, "Initial commit", &tree, &[])
            .unwrap()
    };

    let mut head = root;
    for i in 0..200 {
        let file_name = format!("file_{}.txt", i);
        fs::write(temp_dir.path().join(&file_name), format!("Content for file {}\n", i)).unwrap();

        let mut index = repo.index().unwrap();
        index.add_path(Path::new(&file_name)).unwrap();
        index.write().unwrap();

        let (name, email) = authors[i % authors.len()];
        let author = Signature::now(name, email).unwrap();
        let tree_id = index.write_tree().unwrap();
        let parent = repo.find_commit(head).unwrap();
        {
            let tree = repo.find_tree(tree_id).unwrap();
            head = repo
                .commit(Some("HEAD"), &author, &author, &format!("Add {}", file_name), &tree, &[&parent])
                .unwrap();
        }
    }

    (temp_dir, root, head)
}

/// Benchmark parsing and querying
///
/// # Arguments
/// * `c` - Criterion benchmark configuration
fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("committer_lookup");
    let (temp_dir, root, head) = setup_large_test_repo();
    let (h1, h2) = (root.to_string(), head.to_string());
    let source = Git2Log::new(temp_dir.path());
    let transcript = source.log_range(&h1, &h2).unwrap();

    group.bench_function("parse_transcript", |b| {
        b.iter(|| committers_from_transcript(black_box(&transcript)))
    });

    group.bench_function("git2_log_range", |b| {
        b.iter(|| source.log_range(black_box(&h1), black_box(&h2)).unwrap())
    });

    group.bench_function("cached_lookup", |b| {
        let cache_dir = TempDir::new().unwrap();
        let mut lookup =
            CommitterLookup::with_source(cache_dir.path().join("cache.json"), Git2Log::new(temp_dir.path()), None);
        lookup.get_committers(&h1, &h2).unwrap();
        b.iter(|| lookup.get_committers(black_box(&h1), black_box(&h2)).unwrap())
    });

    group.finish();
}

/// Benchmark cache persistence
///
/// # Arguments
/// * `c` - Criterion benchmark configuration
fn bench_cache_io(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_io");
    let cache_dir = TempDir::new().unwrap();
    let path = cache_dir.path().join("cache.json");
    let now = chrono::Utc::now();

    let mut cache = CommitterCache::new();
    for i in 0..1000 {
        let authors = committers_from_transcript(&format!(
            "Author: User {} <u{}@example.com>\nAuthor: User {}\n",
            i % 37,
            i % 37,
            i % 11
        ));
        cache.insert(RangeKey::new(&format!("{:040x}", i), &format!("{:040x}", i + 1)), authors, now);
    }

    group.bench_function("store", |b| b.iter(|| cache.store(&path).unwrap()));
    group.bench_function("load", |b| b.iter(|| CommitterCache::load(&path).unwrap()));

    group.finish();
}

criterion_group!(benches, bench_lookup, bench_cache_io);
criterion_main!(benches);
