// Copyright 2026 Oxide Computer Company

//! Integration tests for git-blamer against a real git repository.

use anyhow::Result;
use atomicwrites::{AtomicFile, OverwriteBehavior};
use camino::{Utf8Path, Utf8PathBuf};
use camino_tempfile::Utf8TempDir;
use git_blamer::{
    BlameError, Blamer, CommitHash, FileEvent, Git, LocateError, Repository,
};
use std::{fs, io::Write, process::Command, sync::Arc};

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// Returns a `Command` for git, respecting the `$GIT` environment variable.
fn git_command() -> Command {
    let bin = std::env::var("GIT").unwrap_or_else(|_| "git".to_string());
    Command::new(bin)
}

/// Runs git with `args` in `repo_root`, returning trimmed stdout.
fn git(repo_root: &Utf8Path, args: &[&str]) -> Result<String> {
    let output = git_command().args(args).current_dir(repo_root).output()?;
    assert!(
        output.status.success(),
        "git {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stderr)
    );
    Ok(String::from_utf8(output.stdout)?.trim().to_string())
}

/// Writes content to a file atomically.
fn write_file(
    path: impl AsRef<Utf8Path>,
    content: impl AsRef<[u8]>,
) -> std::io::Result<()> {
    let path = path.as_ref();
    AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
        .write(|f| f.write_all(content.as_ref()))
        .map_err(|e| e.into())
}

// ---------------------------------------------------------------------------
// Repository setup helpers
// ---------------------------------------------------------------------------

/// Initializes a git repository and configures the user. Returns the temp
/// dir and the canonical repository root.
fn init_git_repo() -> Result<(Utf8TempDir, Utf8PathBuf)> {
    let temp = Utf8TempDir::with_prefix("git-blamer-")?;
    let repo_root = temp.path().canonicalize_utf8()?;

    git(&repo_root, &["init"])?;
    git(&repo_root, &["config", "user.email", "test@example.com"])?;
    git(&repo_root, &["config", "user.name", "Test User"])?;

    Ok((temp, repo_root))
}

/// Writes `contents` to `path` and commits it as `author`. Returns the
/// commit hash.
fn commit_file(
    repo_root: &Utf8Path,
    path: &str,
    contents: &str,
    author: &str,
    message: &str,
) -> Result<CommitHash> {
    let full_path = repo_root.join(path);
    if let Some(parent) = full_path.parent() {
        fs::create_dir_all(parent)?;
    }
    write_file(&full_path, contents)?;

    git(repo_root, &["add", path])?;
    git(
        repo_root,
        &["commit", "-m", message, &format!("--author={author}")],
    )?;
    Ok(git(repo_root, &["rev-parse", "HEAD"])?.parse()?)
}

/// Sets up a repository where `src/lib.rs` has two lines from Alice's
/// commit followed by one line from Bob's. Returns (temp_dir, repo_root,
/// alice_commit, bob_commit).
fn setup_two_authors() -> Result<(Utf8TempDir, Utf8PathBuf, CommitHash, CommitHash)>
{
    let (temp, repo_root) = init_git_repo()?;
    let alice = commit_file(
        &repo_root,
        "src/lib.rs",
        "line one\nline two\n",
        "Alice <alice@example.com>",
        "Fix bug",
    )?;
    let bob = commit_file(
        &repo_root,
        "src/lib.rs",
        "line one\nline two\nline three\n",
        "Bob <bob@example.com>",
        "Add feature",
    )?;
    Ok((temp, repo_root, alice, bob))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_line_info_and_lines_for_commit() -> Result<()> {
    let (_temp, repo_root, alice, bob) = setup_two_authors()?;
    let blamer = Blamer::open(&repo_root)?;

    let blame = blamer.line_info("src/lib.rs", 1).await?.expect("line 1");
    assert_eq!(blame.commit.hash, alice);
    assert_eq!(blame.commit.author.name, "Alice");
    assert_eq!(blame.commit.author.mail, "<alice@example.com>");
    assert_eq!(blame.commit.summary, "Fix bug");
    assert!(blame.commit.author.time.is_some(), "author-time is parsed");
    assert_eq!(
        blame.commit.filename.as_deref(),
        Some(Utf8Path::new("src/lib.rs"))
    );

    let blame = blamer.line_info("src/lib.rs", 3).await?.expect("line 3");
    assert_eq!(blame.commit.hash, bob);
    assert_eq!(blame.commit.author.name, "Bob");
    assert_eq!(blame.commit.summary, "Add feature");
    assert_eq!(
        blame.commit.previous.as_ref().map(|previous| previous.hash),
        Some(alice),
        "Bob's commit replaced lines from Alice's"
    );

    assert_eq!(blamer.line_info("src/lib.rs", 4).await?, None);

    assert_eq!(blamer.lines_for_commit("src/lib.rs", &alice).await?, [1, 2]);
    assert_eq!(blamer.lines_for_commit("src/lib.rs", &bob).await?, [3]);

    Ok(())
}

#[tokio::test]
async fn test_absolute_path_and_nested_start() -> Result<()> {
    let (_temp, repo_root, alice, _) = setup_two_authors()?;
    let blamer = Blamer::open(repo_root.join("src"))?;
    assert_eq!(blamer.repository().root(), repo_root);
    assert_eq!(blamer.repository().metadata(), repo_root.join(".git"));

    let record = blamer.record(repo_root.join("src").join("lib.rs")).await?;
    assert_eq!(record.lines_for_commit(&alice), vec![1, 2]);

    Ok(())
}

#[tokio::test]
async fn test_uncommitted_lines() -> Result<()> {
    let (_temp, repo_root, alice, _) = setup_two_authors()?;
    write_file(
        repo_root.join("src").join("lib.rs"),
        "line one\nline two\nline three\nline four\n",
    )?;
    let blamer = Blamer::open(&repo_root)?;

    let blame = blamer.line_info("src/lib.rs", 4).await?.expect("line 4");
    assert!(blame.commit.is_uncommitted(), "line 4 is not committed");
    assert_eq!(blame.commit.author.name, "", "sentinel has no metadata");
    assert_eq!(blamer.lines_for_commit("src/lib.rs", &alice).await?, [1, 2]);

    Ok(())
}

#[tokio::test]
async fn test_stale_until_invalidated() -> Result<()> {
    let (_temp, repo_root, _, bob) = setup_two_authors()?;
    let blamer = Blamer::open(&repo_root)?;
    assert_eq!(blamer.lines_for_commit("src/lib.rs", &bob).await?, [3]);

    let carol = commit_file(
        &repo_root,
        "src/lib.rs",
        "line one\nline two\nline 3\n",
        "Carol <carol@example.com>",
        "Rename line",
    )?;

    // No notification yet: the cached blame is served.
    assert_eq!(blamer.lines_for_commit("src/lib.rs", &bob).await?, [3]);

    blamer.handle_event(&FileEvent::Changed(repo_root.join("src/lib.rs")));
    assert_eq!(
        blamer.lines_for_commit("src/lib.rs", &bob).await?,
        Vec::<u32>::new()
    );
    assert_eq!(blamer.lines_for_commit("src/lib.rs", &carol).await?, [3]);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_queries() -> Result<()> {
    let (_temp, repo_root, alice, _) = setup_two_authors()?;
    let blamer = Arc::new(Blamer::open(&repo_root)?);

    let tasks: Vec<_> = (1..=3)
        .map(|line| {
            let blamer = Arc::clone(&blamer);
            tokio::spawn(async move { blamer.line_info("src/lib.rs", line).await })
        })
        .collect();

    let mut hashes = Vec::new();
    for task in tasks {
        hashes.push(task.await??.expect("line is attributed").commit.hash);
    }
    assert_eq!(hashes[0], alice);
    assert_eq!(hashes[1], alice);
    assert_ne!(hashes[2], alice);

    Ok(())
}

#[tokio::test]
async fn test_untracked_file() -> Result<()> {
    let (_temp, repo_root, _, _) = setup_two_authors()?;
    write_file(repo_root.join("untracked.txt"), "hello\n")?;
    let blamer = Blamer::open(&repo_root)?;

    let err = blamer.line_info("untracked.txt", 1).await.unwrap_err();
    assert!(
        matches!(err, BlameError::FileNotTracked { .. }),
        "unexpected error: {err:?}"
    );

    // Once the file is committed, invalidation makes it blameable.
    git(&repo_root, &["add", "untracked.txt"])?;
    git(&repo_root, &["commit", "-m", "Track file"])?;
    blamer.invalidate("untracked.txt");
    let blame = blamer.line_info("untracked.txt", 1).await?.expect("line 1");
    assert_eq!(blame.commit.summary, "Track file");

    Ok(())
}

#[tokio::test]
async fn test_no_commits() -> Result<()> {
    let (_temp, repo_root) = init_git_repo()?;
    write_file(repo_root.join("file.txt"), "hello\n")?;
    let blamer = Blamer::open(&repo_root)?;

    let err = blamer.line_info("file.txt", 1).await.unwrap_err();
    assert!(
        matches!(err, BlameError::NoCommits { .. }),
        "unexpected error: {err:?}"
    );

    Ok(())
}

#[tokio::test]
async fn test_not_a_repository() -> Result<()> {
    let temp = Utf8TempDir::with_prefix("git-blamer-")?;

    let err = Blamer::open(temp.path()).unwrap_err();
    assert!(
        matches!(
            err,
            BlameError::NotARepository(LocateError::NotARepository { .. })
        ),
        "unexpected error: {err:?}"
    );

    Ok(())
}

#[tokio::test]
async fn test_missing_git_binary() -> Result<()> {
    let (_temp, repo_root, _, _) = setup_two_authors()?;
    let blamer = Blamer::with_source(
        Repository::locate(&repo_root)?,
        Git::with_binary("/nonexistent/git-blamer-test-git"),
    );

    let err = blamer.line_info("src/lib.rs", 1).await.unwrap_err();
    assert!(
        matches!(err, BlameError::ToolNotFound { .. }),
        "unexpected error: {err:?}"
    );

    Ok(())
}

#[tokio::test]
async fn test_ignore_whitespace() -> Result<()> {
    let (_temp, repo_root, alice, _) = setup_two_authors()?;
    commit_file(
        &repo_root,
        "src/lib.rs",
        "line one\n    line two\nline three\n",
        "Dave <dave@example.com>",
        "Indent",
    )?;

    let plain = Blamer::with_source(
        Repository::locate(&repo_root)?,
        Git::from_env()?,
    );
    assert_eq!(plain.lines_for_commit("src/lib.rs", &alice).await?, [1]);

    let ignoring = Blamer::with_source(
        Repository::locate(&repo_root)?,
        Git::from_env()?.ignore_whitespace(true),
    );
    assert_eq!(ignoring.lines_for_commit("src/lib.rs", &alice).await?, [1, 2]);

    Ok(())
}

#[tokio::test]
async fn test_dispose() -> Result<()> {
    let (_temp, repo_root, _, _) = setup_two_authors()?;
    let blamer = Blamer::open(&repo_root)?;
    blamer.line_info("src/lib.rs", 1).await?;

    blamer.dispose();
    let err = blamer.line_info("src/lib.rs", 1).await.unwrap_err();
    assert!(matches!(err, BlameError::Disposed), "unexpected error: {err:?}");

    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn test_dispose_kills_running_blame() -> Result<()> {
    use std::{os::unix::fs::PermissionsExt, time::Duration};

    let (temp, repo_root, _, _) = setup_two_authors()?;

    // A stand-in for git that signals when it starts, then takes a while.
    // If it is killed, `finished` never appears.
    let started = temp.path().join("started");
    let finished = temp.path().join("finished");
    let script = temp.path().join("slow-git");
    write_file(
        &script,
        format!("#!/bin/sh\ntouch '{started}'\nsleep 1\ntouch '{finished}'\n"),
    )?;
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755))?;

    let blamer = Arc::new(Blamer::with_source(
        Repository::locate(&repo_root)?,
        Git::with_binary(script.as_str()),
    ));
    let query = tokio::spawn({
        let blamer = Arc::clone(&blamer);
        async move { blamer.line_info("src/lib.rs", 1).await }
    });

    tokio::time::timeout(Duration::from_secs(10), async {
        while !started.exists() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await?;

    blamer.dispose();
    let err = query.await?.unwrap_err();
    assert!(matches!(err, BlameError::Disposed), "unexpected error: {err:?}");

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(!finished.exists(), "the blame process was killed on dispose");

    Ok(())
}
