// Copyright 2026 Oxide Computer Company

//! Per-file blame cache with single-flight fills.

use crate::{BlameError, BlameSource};
use camino::{Utf8Path, Utf8PathBuf};
use git_blame_porcelain::{BlameRecord, parse_porcelain};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tokio::{sync::watch, task::AbortHandle};
use tracing::{debug, error, trace};

type FillResult = Result<Arc<BlameRecord>, BlameError>;

/// Caches parsed blame records for the files of one repository.
///
/// Records are produced on demand by a [`BlameSource`] and kept until
/// [`invalidate`](Self::invalidate) is called for the file. At most one fill
/// runs per file at a time: concurrent [`get`](Self::get) calls for a file
/// that is not cached share a single `git blame` run and all receive its
/// result. Fills for different files run independently.
///
/// A failed fill is reported to everyone waiting on it and is not cached, so
/// the next call starts over.
///
/// Fills run as spawned tokio tasks, so [`get`](Self::get) must be called
/// from within a tokio runtime.
pub struct BlameCache<S> {
    repo_root: Utf8PathBuf,
    source: Arc<S>,
    state: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    entries: HashMap<Utf8PathBuf, Entry>,
    /// Fills that have not finished yet, including ones whose entry has been
    /// invalidated.
    fills: HashMap<u64, AbortHandle>,
    next_fill: u64,
    disposed: bool,
}

enum Entry {
    Ready(Arc<BlameRecord>),
    Pending { fill: u64, result: watch::Receiver<Option<FillResult>> },
}

impl<S: BlameSource> BlameCache<S> {
    /// Creates an empty cache for the repository rooted at `repo_root`.
    pub fn new(repo_root: impl Into<Utf8PathBuf>, source: S) -> Self {
        BlameCache {
            repo_root: repo_root.into(),
            source: Arc::new(source),
            state: Arc::default(),
        }
    }

    /// Returns the repository root this cache runs blame in.
    pub fn repo_root(&self) -> &Utf8Path {
        &self.repo_root
    }

    /// Returns the blame record for `path`, relative to the repository root,
    /// running blame if it is not cached.
    pub async fn get(
        &self,
        path: &Utf8Path,
    ) -> Result<Arc<BlameRecord>, BlameError> {
        let mut result = {
            let mut state = lock(&self.state);
            if state.disposed {
                return Err(BlameError::Disposed);
            }
            match state.entries.get(path) {
                Some(Entry::Ready(record)) => {
                    trace!(%path, "blame cache hit");
                    return Ok(Arc::clone(record));
                }
                Some(Entry::Pending { result, .. }) => {
                    trace!(%path, "waiting on in-flight blame");
                    result.clone()
                }
                None => self.start_fill(&mut state, path),
            }
        };

        // The sender is only dropped without a value when the fill task is
        // aborted, which happens on disposal.
        match result.wait_for(Option::is_some).await {
            Ok(outcome) => {
                (*outcome).clone().unwrap_or(Err(BlameError::Disposed))
            }
            Err(_) => Err(BlameError::Disposed),
        }
    }

    /// Returns true if a parsed record for `path` is cached.
    pub fn is_cached(&self, path: &Utf8Path) -> bool {
        matches!(lock(&self.state).entries.get(path), Some(Entry::Ready(_)))
    }

    /// Drops any cached record or in-flight fill for `path`.
    ///
    /// The next [`get`](Self::get) always runs blame again. Callers already
    /// waiting on an in-flight fill still receive its result, but that result
    /// is not cached.
    pub fn invalidate(&self, path: &Utf8Path) {
        match lock(&self.state).entries.remove(path) {
            Some(Entry::Ready(_)) => debug!(%path, "invalidated cached blame"),
            Some(Entry::Pending { .. }) => {
                debug!(%path, "invalidated in-flight blame")
            }
            None => trace!(%path, "nothing to invalidate"),
        }
    }

    /// Drops every cached record and in-flight fill.
    pub fn invalidate_all(&self) {
        let mut state = lock(&self.state);
        debug!(entries = state.entries.len(), "invalidated all cached blame");
        state.entries.clear();
    }

    /// Aborts all in-flight fills and empties the cache.
    ///
    /// Aborting a fill drops its child process, which kills it. Callers
    /// waiting on an aborted fill, and all later calls to
    /// [`get`](Self::get), fail with [`BlameError::Disposed`]. Calling this
    /// more than once is harmless.
    pub fn dispose(&self) {
        dispose(&self.state);
    }

    fn start_fill(
        &self,
        state: &mut State,
        path: &Utf8Path,
    ) -> watch::Receiver<Option<FillResult>> {
        let fill = state.next_fill;
        state.next_fill += 1;

        let (tx, rx) = watch::channel(None);
        state
            .entries
            .insert(path.to_owned(), Entry::Pending { fill, result: rx.clone() });

        // The task cannot finish before its abort handle is registered: it
        // needs the state lock, which the caller holds.
        let task = tokio::spawn(run_fill(
            Arc::clone(&self.source),
            Arc::clone(&self.state),
            self.repo_root.clone(),
            path.to_owned(),
            fill,
            tx,
        ));
        state.fills.insert(fill, task.abort_handle());
        rx
    }
}

impl<S> Drop for BlameCache<S> {
    fn drop(&mut self) {
        dispose(&self.state);
    }
}

impl<S> std::fmt::Debug for BlameCache<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlameCache")
            .field("repo_root", &self.repo_root)
            .finish_non_exhaustive()
    }
}

async fn run_fill<S: BlameSource>(
    source: Arc<S>,
    state: Arc<Mutex<State>>,
    repo_root: Utf8PathBuf,
    path: Utf8PathBuf,
    fill: u64,
    tx: watch::Sender<Option<FillResult>>,
) {
    debug!(%repo_root, %path, fill, "running git blame");

    let result = match source.blame(&repo_root, &path).await {
        Ok(output) => match parse_porcelain(&output) {
            Ok(record) => {
                debug!(%path, lines = record.len(), "parsed blame");
                Ok(Arc::new(record))
            }
            Err(error) => {
                error!(%path, %error, "git blame output could not be parsed");
                Err(BlameError::MalformedOutput { path: path.clone(), error })
            }
        },
        Err(error) => {
            debug!(%path, %error, "git blame failed");
            Err(error)
        }
    };

    {
        let mut state = lock(&state);
        state.fills.remove(&fill);
        let current = matches!(
            state.entries.get(&path),
            Some(Entry::Pending { fill: pending, .. }) if *pending == fill
        );
        if current {
            match &result {
                Ok(record) => {
                    state
                        .entries
                        .insert(path.clone(), Entry::Ready(Arc::clone(record)));
                }
                Err(_) => {
                    state.entries.remove(&path);
                }
            }
        } else {
            debug!(%path, fill, "blame invalidated while running, not caching");
        }
    }

    tx.send_replace(Some(result));
}

fn dispose(state: &Mutex<State>) {
    let mut state = lock(state);
    if !state.disposed {
        debug!(in_flight = state.fills.len(), "disposing blame cache");
    }
    state.disposed = true;
    for (_, handle) in state.fills.drain() {
        handle.abort();
    }
    state.entries.clear();
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
