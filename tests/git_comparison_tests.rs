use committers::analysis::{committers_from_transcript, Git2Log, GitCliLog, LogSource};
use committers::LookupError;
use git2::{Oid, Repository, Signature};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

fn run_git_command(repo_path: &Path, args: &[&str]) -> String {
    Command::new("git")
        .current_dir(repo_path)
        .args(args)
        .output()
        .map(|output| String::from_utf8_lossy(&output.stdout).to_string())
        .unwrap_or_default()
}

fn commit_file(repo: &Repository, dir: &Path, file_name: &str, author: &Signature, parents: &[Oid]) -> Oid {
    fs::write(dir.join(file_name), format!("{}\n", file_name)).unwrap();
    let mut index = repo.index().unwrap();
    index.add_path(Path::new(file_name)).unwrap();
    index.write().unwrap();

    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let parents: Vec<_> = parents.iter().map(|oid| repo.find_commit(*oid).unwrap()).collect();
    let parent_refs: Vec<_> = parents.iter().collect();
    repo.commit(None, author, author, &format!("Add {}", file_name), &tree, &parent_refs)
        .unwrap()
}

/// History with a side branch merged back in:
///
/// ```text
/// root - a1 - b1 ------ merge
///           \          /
///            c1 - a2 -
/// ```
///
/// `a1` is committed under Alice's old identity, which the committed
/// `.mailmap` maps back to "Alice".
fn setup_merge_repo() -> (TempDir, Oid, Oid) {
    let temp_dir = TempDir::new().unwrap();
    let repo = Repository::init(temp_dir.path()).unwrap();
    let dir = temp_dir.path();

    let alice = Signature::now("Alice", "alice@example.com").unwrap();
    let old_alice = Signature::now("alice", "alice@old.example.com").unwrap();
    let bob = Signature::now("Bob", "bob@example.com").unwrap();
    let carol = Signature::now("Carol Jones", "carol@example.com").unwrap();

    fs::write(dir.join(".mailmap"), "Alice <alice@example.com> <alice@old.example.com>\n").unwrap();
    let mut index = repo.index().unwrap();
    index.add_path(Path::new(".mailmap")).unwrap();
    index.write().unwrap();

    let root = commit_file(&repo, dir, "root.txt", &alice, &[]);
    let a1 = commit_file(&repo, dir, "a1.txt", &old_alice, &[root]);
    let b1 = commit_file(&repo, dir, "b1.txt", &bob, &[a1]);
    let c1 = commit_file(&repo, dir, "c1.txt", &carol, &[a1]);
    let a2 = commit_file(&repo, dir, "a2.txt", &alice, &[c1]);
    let merge = commit_file(&repo, dir, "merge.txt", &bob, &[b1, a2]);

    repo.reference("refs/heads/main", merge, true, "test").unwrap();
    repo.set_head("refs/heads/main").unwrap();

    (temp_dir, root, merge)
}

#[test]
fn test_backends_agree_on_committers() {
    if !git_available() {
        eprintln!("git not installed, skipping");
        return;
    }
    let (temp_dir, root, merge) = setup_merge_repo();
    let (h1, h2) = (root.to_string(), merge.to_string());

    let from_git2 = Git2Log::new(temp_dir.path()).log_range(&h1, &h2).unwrap();
    let from_cli = GitCliLog::new(temp_dir.path()).log_range(&h1, &h2).unwrap();

    assert_eq!(
        committers_from_transcript(&from_git2),
        committers_from_transcript(&from_cli)
    );

    let authors = committers_from_transcript(&from_cli);
    assert!(!authors.contains_key("alice"));
    assert_eq!(authors["Alice"].commit_count, 2);
    assert_eq!(authors["Bob"].commit_count, 2);
    assert_eq!(authors["Carol Jones"].commit_count, 1);
}

#[test]
fn test_commit_count_matches_rev_list() {
    if !git_available() {
        eprintln!("git not installed, skipping");
        return;
    }
    let (temp_dir, root, merge) = setup_merge_repo();
    let range = format!("{}..{}", root, merge);
    let git_count: usize = run_git_command(temp_dir.path(), &["rev-list", "--count", &range])
        .trim()
        .parse()
        .unwrap();

    let transcript = Git2Log::new(temp_dir.path())
        .log_range(&root.to_string(), &merge.to_string())
        .unwrap();
    let ours: usize = committers_from_transcript(&transcript)
        .values()
        .map(|record| record.commit_count)
        .sum();

    assert_eq!(git_count, ours, "Commit counts don't match! Git: {}, Ours: {}", git_count, ours);
}

#[test]
fn test_git2_applies_mailmap() {
    let (temp_dir, root, merge) = setup_merge_repo();
    let transcript = Git2Log::new(temp_dir.path())
        .log_range(&root.to_string(), &merge.to_string())
        .unwrap();

    assert!(!transcript.contains("alice@old.example.com"));
    let authors = committers_from_transcript(&transcript);
    assert_eq!(authors["Alice"].commit_count, 2);
    assert!(!authors.contains_key("alice"));
}

#[test]
fn test_git2_merge_header() {
    let (temp_dir, root, merge) = setup_merge_repo();
    let transcript = Git2Log::new(temp_dir.path())
        .log_range(&root.to_string(), &merge.to_string())
        .unwrap();

    let merge_header = transcript
        .lines()
        .skip_while(|line| *line != format!("commit {}", merge))
        .nth(1)
        .unwrap();
    assert!(merge_header.starts_with("Merge: "));
    assert_eq!(merge_header.split_whitespace().count(), 3);
}

#[test]
fn test_cli_bad_revision_is_an_error() {
    if !git_available() {
        eprintln!("git not installed, skipping");
        return;
    }
    let (temp_dir, _root, merge) = setup_merge_repo();
    let result = GitCliLog::new(temp_dir.path()).log_range("does-not-exist", &merge.to_string());

    match result {
        Err(LookupError::LogQuery { stderr, .. }) => assert!(!stderr.is_empty()),
        other => panic!("expected a log query error, got {:?}", other),
    }
}

#[test]
fn test_cli_missing_executable() {
    let temp_dir = TempDir::new().unwrap();
    let result = GitCliLog::new(temp_dir.path())
        .with_git("/nonexistent/bin/git")
        .log_range("a", "b");

    assert!(matches!(result, Err(LookupError::Io { .. })));
}

#[test]
fn test_cli_rejects_option_like_revision() {
    let temp_dir = TempDir::new().unwrap();
    let result = GitCliLog::new(temp_dir.path()).log_range("abc", "--output=/tmp/pwned");

    assert!(matches!(result, Err(LookupError::InvalidRevision(_))));
}
