// Copyright 2026 Oxide Computer Company

//! Line and commit lookups for one repository.

use crate::{BlameCache, BlameError, BlameSource, Git, Repository};
use camino::{Utf8Path, Utf8PathBuf};
use git_blame_porcelain::{
    BlameRecord, CommitHash, CommitInfo, LineAttribution,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// The blame for a single line: where it came from, and the commit that
/// last touched it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineBlame {
    /// The attribution of the line.
    pub attribution: LineAttribution,
    /// The commit the line is attributed to.
    pub commit: CommitInfo,
}

/// A change to a file on disk, as reported by a file watcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileEvent {
    /// The file at this absolute path was created or modified.
    Changed(Utf8PathBuf),
    /// The file at this absolute path was deleted.
    Deleted(Utf8PathBuf),
}

impl FileEvent {
    /// Returns the absolute path the event refers to.
    pub fn path(&self) -> &Utf8Path {
        match self {
            FileEvent::Changed(path) | FileEvent::Deleted(path) => path,
        }
    }
}

/// Answers blame queries for the files of one repository.
///
/// Create one `Blamer` per repository and share it (e.g. through an
/// [`Arc`]) between everything that queries that repository. Blame output is
/// cached per file until the file is invalidated, either explicitly or by a
/// [`FileEvent`].
///
/// Paths passed to the query methods may be relative to the repository root
/// or absolute. They are normalized before use, so `./src/lib.rs`,
/// `src/../src/lib.rs` and `<root>/src/lib.rs` all share one cache entry.
///
/// Cached data is only refreshed in response to invalidation. A file that
/// changes without a notification reaching [`handle_event`](Self::handle_event)
/// keeps serving the old blame.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> Result<(), git_blamer::BlameError> {
/// use git_blamer::Blamer;
///
/// let blamer = Blamer::open("path/to/checkout")?;
/// if let Some(blame) = blamer.line_info("src/lib.rs", 10).await? {
///     println!("{} by {}", blame.commit.summary, blame.commit.author.name);
///     let same = blamer
///         .lines_for_commit("src/lib.rs", &blame.commit.hash)
///         .await?;
///     println!("also touched lines {same:?}");
/// }
/// blamer.dispose();
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Blamer<S = Git> {
    repository: Repository,
    cache: BlameCache<S>,
}

impl Blamer<Git> {
    /// Locates the repository containing `start` and creates a blamer for
    /// it that runs git from the `$GIT` environment variable (or `git`).
    pub fn open(start: impl AsRef<Utf8Path>) -> Result<Self, BlameError> {
        let repository = Repository::locate(start)?;
        let git = Git::from_env()?;
        Ok(Blamer::with_source(repository, git))
    }
}

impl<S: BlameSource> Blamer<S> {
    /// Creates a blamer for `repository` that reads blame output from
    /// `source`.
    pub fn with_source(repository: Repository, source: S) -> Self {
        let cache = BlameCache::new(repository.root(), source);
        Blamer { repository, cache }
    }

    /// Returns the repository this blamer is bound to.
    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    /// Returns the full blame record for `path`.
    pub async fn record(
        &self,
        path: impl AsRef<Utf8Path>,
    ) -> Result<Arc<BlameRecord>, BlameError> {
        let path = self.repo_relative(path.as_ref())?;
        self.cache.get(&path).await
    }

    /// Returns the blame for the 1-based `line` of `path`.
    ///
    /// Returns `Ok(None)` if the line has no attribution, for example
    /// because the file has fewer lines.
    pub async fn line_info(
        &self,
        path: impl AsRef<Utf8Path>,
        line: u32,
    ) -> Result<Option<LineBlame>, BlameError> {
        let record = self.record(path).await?;
        Ok(record.line(line).map(|(attribution, commit)| LineBlame {
            attribution: *attribution,
            commit: commit.clone(),
        }))
    }

    /// Returns the lines of `path` attributed to `hash`, in ascending order.
    ///
    /// Returns an empty list if no line matches.
    pub async fn lines_for_commit(
        &self,
        path: impl AsRef<Utf8Path>,
        hash: &CommitHash,
    ) -> Result<Vec<u32>, BlameError> {
        let record = self.record(path).await?;
        Ok(record.lines_for_commit(hash))
    }

    /// Drops cached blame for `path`, so the next query runs blame again.
    ///
    /// Paths outside the repository are ignored.
    pub fn invalidate(&self, path: impl AsRef<Utf8Path>) {
        match self.repo_relative(path.as_ref()) {
            Ok(path) => self.cache.invalidate(&path),
            Err(error) => debug!(%error, "ignoring invalidation"),
        }
    }

    /// Drops all cached blame.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Invalidates the file named by a file watcher event.
    pub fn handle_event(&self, event: &FileEvent) {
        self.invalidate(event.path());
    }

    /// Applies file watcher events from `events` until the channel closes.
    pub async fn watch_events(&self, mut events: mpsc::Receiver<FileEvent>) {
        while let Some(event) = events.recv().await {
            self.handle_event(&event);
        }
        debug!(repo_root = %self.repository.root(), "file event channel closed");
    }

    /// Stops all running blame processes and empties the cache.
    ///
    /// Queries waiting on a stopped process, and all later queries, fail with
    /// [`BlameError::Disposed`]. This also happens when the blamer is
    /// dropped.
    pub fn dispose(&self) {
        self.cache.dispose();
    }

    fn repo_relative(
        &self,
        path: &Utf8Path,
    ) -> Result<Utf8PathBuf, BlameError> {
        self.repository.resolve(path).ok_or_else(|| {
            BlameError::OutsideRepository {
                path: path.to_owned(),
                repo_root: self.repository.root().to_owned(),
            }
        })
    }
}
