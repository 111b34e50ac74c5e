// Copyright 2026 Oxide Computer Company

//! Error types for blame output parsing.

use thiserror::Error;

/// An error that occurs while parsing a
/// [`CommitHash`](crate::CommitHash).
#[derive(Clone, Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum CommitHashParseError {
    /// The commit hash has an invalid length.
    #[error(
        "invalid length: expected 40 (SHA-1) or 64 (SHA-256) hex characters, \
         got {0}"
    )]
    InvalidLength(usize),

    /// The commit hash is not valid hexadecimal.
    #[error("invalid hexadecimal")]
    InvalidHex(hex::FromHexError),
}

/// An error that occurs while parsing `git blame --porcelain` output.
///
/// These are structural failures: an index built from such output would
/// attribute lines to the wrong commits, so the whole parse is rejected.
/// Unknown metadata keywords are not errors.
#[derive(Clone, Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum PorcelainParseError {
    /// A hunk header started with a hash but the line numbers that follow
    /// it are missing, malformed, zero or overflow.
    #[error("invalid hunk header on line {line_no}: {line:?}")]
    InvalidHeader {
        /// The 1-based line number within the blame output.
        line_no: usize,
        /// The offending line.
        line: String,
    },

    /// A hunk header hash could not be decoded.
    #[error("invalid commit hash on line {line_no}")]
    InvalidHash {
        /// The 1-based line number within the blame output.
        line_no: usize,
        /// The underlying parse error.
        #[source]
        error: CommitHashParseError,
    },

    /// A source line was attributed to two different commits.
    #[error(
        "line {line} attributed to both {first} and {second} \
         (output line {line_no})"
    )]
    ConflictingAttribution {
        /// The 1-based line number within the blamed file.
        line: u32,
        /// The commit the line was first attributed to.
        first: String,
        /// The commit that later claimed the line.
        second: String,
        /// The 1-based line number within the blame output.
        line_no: usize,
    },

    /// A metadata line such as `author ...` appeared before any hunk
    /// header.
    #[error("metadata line {line_no} appears before any hunk header")]
    MetadataOutsideHunk {
        /// The 1-based line number within the blame output.
        line_no: usize,
    },
}
