// Copyright 2026 Oxide Computer Company

//! Git commit hash types.

use crate::CommitHashParseError;
use std::{fmt, str::FromStr};

/// A Git commit hash, as it appears in blame hunk headers.
///
/// This type guarantees the contained value is either:
///
/// - 20 bytes (SHA-1, displayed as 40 lowercase hex characters)
/// - 32 bytes (SHA-256, displayed as 64 lowercase hex characters)
///
/// The all-zero hash is what `git blame` reports for lines that have not been
/// committed yet; see [`CommitHash::is_uncommitted`].
///
/// # Parsing
///
/// ```
/// use git_blame_porcelain::CommitHash;
///
/// let hash: CommitHash =
///     "0123456789abcdef0123456789abcdef01234567".parse().unwrap();
/// assert_eq!(hash.short(), "0123456");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CommitHash {
    /// A SHA-1 hash: the one traditionally used in Git.
    Sha1([u8; 20]),
    /// A SHA-256 hash, supported by newer versions of Git.
    Sha256([u8; 32]),
}

impl CommitHash {
    /// The hash `git blame` uses for working-tree changes in a SHA-1
    /// repository.
    pub const UNCOMMITTED_SHA1: CommitHash = CommitHash::Sha1([0; 20]);

    /// Returns true if this is the all-zero hash, i.e. the line has not been
    /// committed.
    pub fn is_uncommitted(&self) -> bool {
        self.as_bytes().iter().all(|b| *b == 0)
    }

    /// Returns the raw bytes of the hash.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            CommitHash::Sha1(bytes) => bytes,
            CommitHash::Sha256(bytes) => bytes,
        }
    }

    /// Returns the conventional 7-character abbreviation.
    pub fn short(&self) -> String {
        let mut s = self.to_string();
        s.truncate(7);
        s
    }

    /// Returns true if `s` has the shape of a full hash (40 or 64 ASCII hex
    /// digits), without allocating.
    pub(crate) fn looks_like_hash(s: &str) -> bool {
        matches!(s.len(), 40 | 64) && s.bytes().all(|b| b.is_ascii_hexdigit())
    }
}

impl FromStr for CommitHash {
    type Err = CommitHashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let len = s.len();
        match len {
            40 => {
                let mut bytes = [0; 20];
                hex::decode_to_slice(s, &mut bytes)
                    .map_err(CommitHashParseError::InvalidHex)?;
                Ok(CommitHash::Sha1(bytes))
            }
            64 => {
                let mut bytes = [0; 32];
                hex::decode_to_slice(s, &mut bytes)
                    .map_err(CommitHashParseError::InvalidHex)?;
                Ok(CommitHash::Sha256(bytes))
            }
            _ => Err(CommitHashParseError::InvalidLength(len)),
        }
    }
}

impl fmt::Display for CommitHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        hex::encode(self.as_bytes()).fmt(f)
    }
}
