// Copyright 2026 Oxide Computer Company

//! Error types for locating repositories and blaming files.

use camino::Utf8PathBuf;
use git_blame_porcelain::PorcelainParseError;
use std::{ffi::OsString, io, path::PathBuf, sync::Arc};
use thiserror::Error;

/// An error from reading the git binary path from the environment.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum GitEnvError {
    /// The environment variable is set but is not valid UTF-8.
    #[error(
        "${var} environment variable is not valid \
         UTF-8: {value:?}"
    )]
    NonUtf8 {
        /// The environment variable name.
        var: &'static str,
        /// The non-UTF-8 value.
        value: OsString,
    },
}

/// An error that occurs while locating the repository containing a path.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum LocateError {
    /// Neither the start directory nor any of its parents contains `.git`.
    #[error("{start} is not inside a git repository")]
    NotARepository {
        /// The canonicalized directory the search started from.
        start: Utf8PathBuf,
    },

    /// `.git` is a file, but does not contain a `gitdir:` line.
    #[error("{path} is not a valid gitfile (expected `gitdir: <path>`)")]
    InvalidGitFile {
        /// The path to the `.git` file.
        path: Utf8PathBuf,
    },

    /// A path involved in the search is not valid UTF-8.
    #[error("path is not valid UTF-8: {path:?}")]
    NonUtf8Path {
        /// The offending path.
        path: PathBuf,
    },

    /// An I/O error occurred while probing the filesystem.
    #[error("I/O error while locating repository at {path}")]
    Io {
        /// The path being checked when the error occurred.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },
}

/// An error that occurs while producing blame data for a file.
///
/// This type is `Clone`: a single failed fill is handed to every caller that
/// was waiting on it.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum BlameError {
    /// The repository could not be located.
    #[error("repository not found")]
    NotARepository(#[from] LocateError),

    /// The git binary could not be read from the environment.
    #[error("invalid git configuration")]
    GitEnv(#[from] GitEnvError),

    /// The git executable could not be found.
    #[error("git executable {binary:?} not found")]
    ToolNotFound {
        /// The binary that was run.
        binary: String,
        /// The underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },

    /// Failed to spawn the git process for a reason other than a missing
    /// executable.
    #[error("failed to run git at {binary:?} in {repo_root}")]
    SpawnFailed {
        /// The binary that was run.
        binary: String,
        /// The working directory where the command was run.
        repo_root: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },

    /// The file is not tracked by the repository, or lies outside it.
    #[error("{path} is not tracked by git: {stderr}")]
    FileNotTracked {
        /// The repository-relative path that was blamed.
        path: Utf8PathBuf,
        /// The stderr output from git.
        stderr: String,
    },

    /// The repository has no commits yet.
    #[error("repository at {repo_root} has no commits")]
    NoCommits {
        /// The repository root.
        repo_root: Utf8PathBuf,
    },

    /// git exited unsuccessfully for another reason.
    #[error("git blame failed for {path} ({exit_status}): {stderr}")]
    NonZeroExit {
        /// The repository-relative path that was blamed.
        path: Utf8PathBuf,
        /// A human-readable description of the exit status (e.g.,
        /// "exit status: 128" or "signal: 9").
        exit_status: String,
        /// The stderr output from git.
        stderr: String,
    },

    /// git exited successfully but printed nothing.
    #[error("git blame printed no output for {path}")]
    EmptyOutput {
        /// The repository-relative path that was blamed.
        path: Utf8PathBuf,
    },

    /// The blame output could not be parsed.
    #[error("malformed git blame output for {path}")]
    MalformedOutput {
        /// The repository-relative path that was blamed.
        path: Utf8PathBuf,
        /// Details about the parsing error.
        #[source]
        error: PorcelainParseError,
    },

    /// An absolute path was given that does not lie inside the repository.
    #[error("{path} is outside the repository at {repo_root}")]
    OutsideRepository {
        /// The path that was provided.
        path: Utf8PathBuf,
        /// The repository root.
        repo_root: Utf8PathBuf,
    },

    /// The blamer was disposed before the query could be answered.
    #[error("blamer has been disposed")]
    Disposed,
}
