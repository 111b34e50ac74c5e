// Copyright 2026 Oxide Computer Company

//! Locating the repository that contains a path.

use crate::LocateError;
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use fs_err as fs;
use std::{io, sync::Arc};

/// A git repository: its working tree root and its metadata directory.
///
/// Both paths are absolute and canonical. Use [`Repository::locate`] to find
/// the repository containing a path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Repository {
    root: Utf8PathBuf,
    metadata: Utf8PathBuf,
}

impl Repository {
    /// Finds the repository containing `start`.
    ///
    /// `start` is canonicalized first, so symlinked working directories are
    /// resolved to their real location. If `start` is a file, the search
    /// begins at its parent directory. Each directory from there up to the
    /// filesystem root is checked for a `.git` entry, which may be:
    ///
    /// - a directory, which is then the metadata directory, or
    /// - a file containing `gitdir: <path>`, as used by worktrees and
    ///   submodules, in which case `<path>` is the metadata directory.
    ///
    /// Returns [`LocateError::NotARepository`] if no `.git` is found.
    pub fn locate(start: impl AsRef<Utf8Path>) -> Result<Self, LocateError> {
        let start = canonicalize(start.as_ref())?;
        let start_is_dir = fs::metadata(&start)
            .map_err(|source| io_error(&start, source))?
            .is_dir();
        let first = if start_is_dir {
            start.as_path()
        } else {
            // A canonical file path always has a parent.
            start.parent().unwrap_or(&start)
        };

        for dir in first.ancestors() {
            let git_path = dir.join(".git");
            let meta = match fs::metadata(&git_path) {
                Ok(meta) => meta,
                Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                Err(err) => return Err(io_error(&git_path, err)),
            };

            let metadata = if meta.is_dir() {
                git_path
            } else {
                read_git_file(dir, &git_path)?
            };
            return Ok(Repository { root: dir.to_owned(), metadata });
        }

        Err(LocateError::NotARepository { start })
    }

    /// Returns the root of the working tree.
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Returns the metadata directory (usually `<root>/.git`).
    pub fn metadata(&self) -> &Utf8Path {
        &self.metadata
    }

    /// Maps `path` to a normalized path relative to the root.
    ///
    /// Relative paths are taken to be relative to the root, and absolute
    /// paths go through [`relative_path`](Self::relative_path). Either way
    /// the result contains only plain file names, so every spelling of a
    /// file maps to the same path.
    ///
    /// Returns `None` for paths outside the repository and for the root
    /// itself.
    pub fn resolve(&self, path: &Utf8Path) -> Option<Utf8PathBuf> {
        if path.is_relative() {
            normalize(path)
        } else {
            self.relative_path(path)
        }
    }

    /// Maps an absolute path inside the working tree to a normalized path
    /// relative to the root.
    ///
    /// The path does not need to exist: file-delete notifications refer to
    /// paths that are already gone. The deepest existing ancestor is
    /// canonicalized so that paths through symlinks still map correctly.
    ///
    /// Returns `None` for paths outside the repository, for the root itself,
    /// and for paths containing `..` after the deepest existing ancestor.
    pub fn relative_path(&self, path: &Utf8Path) -> Option<Utf8PathBuf> {
        if let Ok(relative) = path.strip_prefix(&self.root) {
            return normalize(relative);
        }

        let mut missing = Vec::new();
        let mut current = path;
        let mut resolved = loop {
            match canonicalize(current) {
                Ok(resolved) => break resolved,
                Err(_) => {
                    missing.push(current.file_name()?);
                    current = current.parent()?;
                }
            }
        };
        for name in missing.iter().rev() {
            resolved.push(name);
        }

        let relative = resolved.strip_prefix(&self.root).ok()?;
        normalize(relative)
    }
}

/// Lexically normalizes a path relative to the root: `.` is dropped and `..`
/// removes the preceding name. Returns `None` if the path is absolute, climbs
/// above the root, or names the root itself.
fn normalize(path: &Utf8Path) -> Option<Utf8PathBuf> {
    let mut normalized = Utf8PathBuf::new();
    for component in path.components() {
        match component {
            Utf8Component::Normal(name) => normalized.push(name),
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                if !normalized.pop() {
                    return None;
                }
            }
            Utf8Component::RootDir | Utf8Component::Prefix(_) => return None,
        }
    }
    (!normalized.as_str().is_empty()).then_some(normalized)
}

fn canonicalize(path: &Utf8Path) -> Result<Utf8PathBuf, LocateError> {
    let canonical =
        fs::canonicalize(path).map_err(|source| io_error(path, source))?;
    Utf8PathBuf::from_path_buf(canonical)
        .map_err(|path| LocateError::NonUtf8Path { path })
}

fn io_error(path: &Utf8Path, source: io::Error) -> LocateError {
    LocateError::Io { path: path.to_owned(), source: Arc::new(source) }
}

/// Reads a `.git` file of the form `gitdir: <path>`, resolving a relative
/// `<path>` against `dir`.
fn read_git_file(
    dir: &Utf8Path,
    git_path: &Utf8Path,
) -> Result<Utf8PathBuf, LocateError> {
    let contents = fs::read_to_string(git_path)
        .map_err(|source| io_error(git_path, source))?;
    let target = contents
        .lines()
        .next()
        .and_then(|line| line.strip_prefix("gitdir:"))
        .map(str::trim)
        .filter(|target| !target.is_empty())
        .ok_or_else(|| LocateError::InvalidGitFile {
            path: git_path.to_owned(),
        })?;
    canonicalize(&dir.join(target))
}
