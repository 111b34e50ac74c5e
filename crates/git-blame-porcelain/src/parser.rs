// Copyright 2026 Oxide Computer Company

//! Parser for `git blame --porcelain` output.

use crate::{
    BlameRecord, CommitHash, CommitInfo, LineAttribution, PorcelainParseError,
    Previous,
};
use camino::Utf8PathBuf;
use std::collections::btree_map::Entry;

/// Parses the output of `git blame --porcelain` (or `--line-porcelain`) into
/// a [`BlameRecord`].
///
/// The format consists of hunk headers of the form
/// `<hash> <original-line> <final-line> [<line-count>]`, each followed by
/// metadata lines (`author Alice`, `summary Fix bug`, ...) and the source
/// line itself prefixed with a tab. Metadata is only printed for the first
/// hunk of each commit, and only that first hunk is used to fill in the
/// commit's [`CommitInfo`].
///
/// Unknown metadata keywords and metadata values that cannot be interpreted
/// are skipped. A malformed hunk header fails the whole parse, as does a
/// header claiming more lines than the output has left to describe them.
///
/// Lines attributed to the all-zero hash (changes not committed yet) are kept,
/// and point at a sentinel [`CommitInfo::uncommitted`] entry.
///
/// # Examples
///
/// ```
/// use git_blame_porcelain::parse_porcelain;
///
/// let output = "\
/// 1111111111111111111111111111111111111111 1 1 1
/// author Alice
/// summary Initial commit
/// \tfn main() {}
/// ";
/// let record = parse_porcelain(output).unwrap();
/// let (_, commit) = record.line(1).unwrap();
/// assert_eq!(commit.author.name, "Alice");
/// assert_eq!(commit.summary, "Initial commit");
/// ```
pub fn parse_porcelain(
    output: &str,
) -> Result<BlameRecord, PorcelainParseError> {
    let mut record = BlameRecord::default();
    // The hash of the current hunk, and whether its metadata lines should be
    // recorded (true only for the first hunk of a commit).
    let mut current: Option<(CommitHash, bool)> = None;
    let total = output.lines().count();

    for (idx, line) in output.lines().enumerate() {
        let line_no = idx + 1;

        // Source line.
        if line.starts_with('\t') {
            continue;
        }

        let (keyword, value) = line.split_once(' ').unwrap_or((line, ""));

        if CommitHash::looks_like_hash(keyword) {
            let remaining = total - line_no;
            let header =
                HunkHeader::parse(line_no, line, keyword, value, remaining)?;
            current = Some(record.add_hunk(line_no, &header)?);
            continue;
        }

        let Some(field) = Field::from_keyword(keyword) else {
            continue;
        };
        let Some((hash, collect)) = current else {
            return Err(PorcelainParseError::MetadataOutsideHunk { line_no });
        };
        if !collect {
            continue;
        }
        if let Some(commit) = record.commits.get_mut(&hash) {
            field.apply(commit, value);
        }
    }

    Ok(record)
}

#[derive(Debug)]
struct HunkHeader {
    hash: CommitHash,
    original_line: u32,
    final_line: u32,
    count: u32,
}

impl HunkHeader {
    fn parse(
        line_no: usize,
        line: &str,
        hash: &str,
        rest: &str,
        remaining: usize,
    ) -> Result<Self, PorcelainParseError> {
        let invalid = || PorcelainParseError::InvalidHeader {
            line_no,
            line: line.to_owned(),
        };

        let hash: CommitHash = hash.parse().map_err(|error| {
            PorcelainParseError::InvalidHash { line_no, error }
        })?;

        let numbers = rest
            .split_ascii_whitespace()
            .map(|n| n.parse::<u32>().ok().filter(|n| *n > 0))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(invalid)?;

        let (original_line, final_line, count) = match numbers[..] {
            [original, fin] => (original, fin, 1),
            [original, fin, count] => (original, fin, count),
            _ => return Err(invalid()),
        };

        // The hunk must fit in the line number space on both sides.
        let last = count - 1;
        if final_line.checked_add(last).is_none()
            || original_line.checked_add(last).is_none()
        {
            return Err(invalid());
        }

        // Every line of the hunk is followed by its tab-prefixed content, so
        // a hunk can't cover more lines than the output has left.
        let fits =
            usize::try_from(count).is_ok_and(|count| count <= remaining);
        if !fits {
            return Err(invalid());
        }

        Ok(HunkHeader { hash, original_line, final_line, count })
    }
}

impl BlameRecord {
    /// Records the lines covered by `header`. Returns the hunk's hash and
    /// whether this is the first time the commit was seen.
    fn add_hunk(
        &mut self,
        line_no: usize,
        header: &HunkHeader,
    ) -> Result<(CommitHash, bool), PorcelainParseError> {
        let hash = header.hash;

        for offset in 0..header.count {
            let line = header.final_line + offset;
            match self.lines.entry(line) {
                Entry::Vacant(entry) => {
                    entry.insert(LineAttribution {
                        line,
                        original_line: header.original_line + offset,
                        hash,
                    });
                }
                // `--porcelain` repeats a short header for every line of a
                // group, so seeing the same line again is expected.
                Entry::Occupied(entry) if entry.get().hash == hash => {}
                Entry::Occupied(entry) => {
                    return Err(PorcelainParseError::ConflictingAttribution {
                        line,
                        first: entry.get().hash.to_string(),
                        second: hash.to_string(),
                        line_no,
                    });
                }
            }
        }

        let first_seen = !self.commits.contains_key(&hash);
        if first_seen {
            let info = if hash.is_uncommitted() {
                CommitInfo::uncommitted(hash)
            } else {
                CommitInfo::new(hash)
            };
            self.commits.insert(hash, info);
        }

        Ok((hash, first_seen && !hash.is_uncommitted()))
    }
}

/// A metadata keyword understood by the parser.
#[derive(Clone, Copy, Debug)]
enum Field {
    Author,
    AuthorMail,
    AuthorTime,
    AuthorTz,
    Committer,
    CommitterMail,
    CommitterTime,
    CommitterTz,
    Summary,
    Filename,
    Previous,
    Boundary,
}

impl Field {
    fn from_keyword(keyword: &str) -> Option<Self> {
        let field = match keyword {
            "author" => Field::Author,
            "author-mail" => Field::AuthorMail,
            "author-time" => Field::AuthorTime,
            "author-tz" => Field::AuthorTz,
            "committer" => Field::Committer,
            "committer-mail" => Field::CommitterMail,
            "committer-time" => Field::CommitterTime,
            "committer-tz" => Field::CommitterTz,
            "summary" => Field::Summary,
            "filename" => Field::Filename,
            "previous" => Field::Previous,
            "boundary" => Field::Boundary,
            _ => return None,
        };
        Some(field)
    }

    fn apply(self, commit: &mut CommitInfo, value: &str) {
        match self {
            Field::Author => commit.author.name = value.to_owned(),
            Field::AuthorMail => commit.author.mail = value.to_owned(),
            Field::AuthorTime => {
                if let Ok(time) = value.trim().parse() {
                    commit.author.time = Some(time);
                }
            }
            Field::AuthorTz => commit.author.tz = value.to_owned(),
            Field::Committer => commit.committer.name = value.to_owned(),
            Field::CommitterMail => commit.committer.mail = value.to_owned(),
            Field::CommitterTime => {
                if let Ok(time) = value.trim().parse() {
                    commit.committer.time = Some(time);
                }
            }
            Field::CommitterTz => commit.committer.tz = value.to_owned(),
            Field::Summary => commit.summary = value.to_owned(),
            Field::Filename => {
                commit.filename = Some(Utf8PathBuf::from(value));
            }
            Field::Previous => {
                // previous <hash> <path>
                let previous = value.split_once(' ').and_then(|(hash, path)| {
                    let hash = hash.parse().ok()?;
                    Some(Previous { hash, path: Utf8PathBuf::from(path) })
                });
                if previous.is_some() {
                    commit.previous = previous;
                }
            }
            Field::Boundary => commit.boundary = true,
        }
    }
}
