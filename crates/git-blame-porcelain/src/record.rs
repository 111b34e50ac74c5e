// Copyright 2026 Oxide Computer Company

//! Parsed blame records.

use crate::CommitHash;
use camino::Utf8PathBuf;
use std::collections::{BTreeMap, HashMap};

/// An author or committer identity as reported by `git blame`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Signature {
    /// The name, e.g. `Alice`.
    pub name: String,
    /// The mail address including angle brackets, e.g. `<alice@example.com>`.
    pub mail: String,
    /// Seconds since the Unix epoch, if reported.
    pub time: Option<i64>,
    /// The timezone offset as written by git, e.g. `+0200`.
    pub tz: String,
}

/// The commit and path a line came from before the blamed commit touched
/// it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Previous {
    /// The parent commit.
    pub hash: CommitHash,
    /// The path of the file in that commit.
    pub path: Utf8PathBuf,
}

/// Metadata for one commit referenced by a [`BlameRecord`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitInfo {
    /// The commit hash.
    pub hash: CommitHash,
    /// The author of the commit.
    pub author: Signature,
    /// The committer of the commit.
    pub committer: Signature,
    /// The first line of the commit message.
    pub summary: String,
    /// The path of the file in this commit, if reported.
    pub filename: Option<Utf8PathBuf>,
    /// The commit this one replaced the lines from, if any.
    pub previous: Option<Previous>,
    /// Whether the commit is a boundary commit (a root commit, or the edge of
    /// a revision range).
    pub boundary: bool,
}

impl CommitInfo {
    /// Creates an empty record for `hash`, to be filled in from metadata
    /// lines.
    pub fn new(hash: CommitHash) -> Self {
        CommitInfo {
            hash,
            author: Signature::default(),
            committer: Signature::default(),
            summary: String::new(),
            filename: None,
            previous: None,
            boundary: false,
        }
    }

    /// Creates the sentinel record for lines that are not committed yet.
    ///
    /// The sentinel carries no metadata: whatever git prints for it
    /// (`Not Committed Yet` and the current time) describes the working
    /// tree, not a commit.
    pub fn uncommitted(hash: CommitHash) -> Self {
        CommitInfo::new(hash)
    }

    /// Returns true if this is the sentinel for uncommitted lines.
    pub fn is_uncommitted(&self) -> bool {
        self.hash.is_uncommitted()
    }
}

/// The attribution of a single line of the blamed file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineAttribution {
    /// The 1-based line number in the current file.
    pub line: u32,
    /// The 1-based line number in the commit that introduced it.
    pub original_line: u32,
    /// The commit that last touched the line. Always a key of the owning
    /// record's commit map.
    pub hash: CommitHash,
}

/// One file's complete blame snapshot.
///
/// Produced by [`parse_porcelain`](crate::parse_porcelain). Every hash
/// referenced from [`lines`](Self::lines) is present in
/// [`commits`](Self::commits).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlameRecord {
    pub(crate) lines: BTreeMap<u32, LineAttribution>,
    pub(crate) commits: HashMap<CommitHash, CommitInfo>,
}

impl BlameRecord {
    /// Returns the line attributions, ordered by line number.
    pub fn lines(&self) -> &BTreeMap<u32, LineAttribution> {
        &self.lines
    }

    /// Returns the commits referenced by this record.
    pub fn commits(&self) -> &HashMap<CommitHash, CommitInfo> {
        &self.commits
    }

    /// Returns the number of attributed lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns true if no lines are attributed.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns the attribution for `line` together with its commit, or
    /// `None` if the line has no blame entry.
    pub fn line(&self, line: u32) -> Option<(&LineAttribution, &CommitInfo)> {
        let attribution = self.lines.get(&line)?;
        let commit = self.commits.get(&attribution.hash)?;
        Some((attribution, commit))
    }

    /// Returns the commit for `line`.
    pub fn commit_for_line(&self, line: u32) -> Option<&CommitInfo> {
        self.line(line).map(|(_, commit)| commit)
    }

    /// Returns the lines attributed to `hash` in ascending order.
    pub fn lines_for_commit(&self, hash: &CommitHash) -> Vec<u32> {
        self.lines
            .values()
            .filter(|attribution| attribution.hash == *hash)
            .map(|attribution| attribution.line)
            .collect()
    }
}
