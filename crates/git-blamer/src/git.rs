// Copyright 2026 Oxide Computer Company

//! Running `git blame`.

use crate::{BlameError, GitEnvError};
use camino::Utf8Path;
use std::{future::Future, io, process::Stdio, sync::Arc};
use tokio::process::Command;

/// Reads the git binary path from an environment variable, falling back to
/// `default` if the variable is unset or empty.
///
/// The value is trimmed of leading and trailing whitespace.
///
/// Returns an error if the variable is set but is not valid UTF-8.
fn read_git_env(
    var: &'static str,
    default: &str,
) -> Result<String, GitEnvError> {
    match std::env::var(var) {
        Ok(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Ok(default.to_string())
            } else {
                Ok(trimmed.to_string())
            }
        }
        Err(std::env::VarError::NotPresent) => Ok(default.to_string()),
        Err(std::env::VarError::NotUnicode(value)) => {
            Err(GitEnvError::NonUtf8 { var, value })
        }
    }
}

/// A source of raw `git blame --porcelain` output.
///
/// [`Git`] is the implementation used in practice. The trait exists so that
/// [`BlameCache`](crate::BlameCache) can be driven by something other than a
/// real git process.
pub trait BlameSource: Send + Sync + 'static {
    /// Produces porcelain blame output for `path`, relative to `repo_root`.
    ///
    /// Dropping the returned future must release any resources it holds,
    /// including child processes.
    fn blame(
        &self,
        repo_root: &Utf8Path,
        path: &Utf8Path,
    ) -> impl Future<Output = Result<String, BlameError>> + Send;
}

/// Runs `git blame --porcelain` as a child process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Git {
    binary: String,
    ignore_whitespace: bool,
}

impl Git {
    /// Uses the `$GIT` environment variable or `"git"`.
    ///
    /// Returns an error if the `$GIT` environment variable is set but is not
    /// valid UTF-8.
    pub fn from_env() -> Result<Self, GitEnvError> {
        let binary = read_git_env("GIT", "git")?;
        Ok(Git::with_binary(binary))
    }

    /// Uses the given git binary.
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Git { binary: binary.into(), ignore_whitespace: false }
    }

    /// Sets whether whitespace-only changes are ignored when attributing
    /// lines (`git blame -w`).
    pub fn ignore_whitespace(mut self, ignore: bool) -> Self {
        self.ignore_whitespace = ignore;
        self
    }

    /// Returns the path to the git binary.
    pub fn binary(&self) -> &str {
        &self.binary
    }

    fn command(&self, repo_root: &Utf8Path, path: &Utf8Path) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.current_dir(repo_root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .args(["blame", "--porcelain"]);
        if self.ignore_whitespace {
            cmd.arg("-w");
        }
        // `--` is required so filenames beginning with `-` are treated as
        // paths rather than options.
        cmd.arg("--").arg(path.as_str());
        cmd
    }
}

impl BlameSource for Git {
    /// Runs `git blame --porcelain [-w] -- <path>` in `repo_root`.
    fn blame(
        &self,
        repo_root: &Utf8Path,
        path: &Utf8Path,
    ) -> impl Future<Output = Result<String, BlameError>> + Send {
        let mut cmd = self.command(repo_root, path);
        async move {
            let output = cmd.output().await.map_err(|source| {
                spawn_error(&self.binary, repo_root, source)
            })?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(classify_failure(
                    repo_root,
                    path,
                    output.status.to_string(),
                    stderr.trim(),
                ));
            }

            if output.stdout.is_empty() {
                return Err(BlameError::EmptyOutput { path: path.to_owned() });
            }
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        }
    }
}

fn spawn_error(
    binary: &str,
    repo_root: &Utf8Path,
    source: io::Error,
) -> BlameError {
    if source.kind() == io::ErrorKind::NotFound {
        BlameError::ToolNotFound {
            binary: binary.to_owned(),
            source: Arc::new(source),
        }
    } else {
        BlameError::SpawnFailed {
            binary: binary.to_owned(),
            repo_root: repo_root.to_owned(),
            source: Arc::new(source),
        }
    }
}

/// Maps an unsuccessful `git blame` to an error based on its stderr.
fn classify_failure(
    repo_root: &Utf8Path,
    path: &Utf8Path,
    exit_status: String,
    stderr: &str,
) -> BlameError {
    if stderr.contains("no such path") || stderr.contains("is outside repository")
    {
        BlameError::FileNotTracked {
            path: path.to_owned(),
            stderr: stderr.to_owned(),
        }
    } else if stderr.contains("does not have any commits yet")
        || stderr.contains("bad revision 'HEAD'")
        || stderr.contains("no such ref: HEAD")
    {
        BlameError::NoCommits { repo_root: repo_root.to_owned() }
    } else {
        BlameError::NonZeroExit {
            path: path.to_owned(),
            exit_status,
            stderr: stderr.to_owned(),
        }
    }
}
