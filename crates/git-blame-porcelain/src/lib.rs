// Copyright 2026 Oxide Computer Company

//! Parsing types for `git blame` output.
//!
//! `git blame --porcelain` attributes every line of a file to the commit
//! that last modified it. This crate turns that output into a
//! [`BlameRecord`]: a map from line number to [`LineAttribution`], and a map
//! from [`CommitHash`] to the [`CommitInfo`] describing that commit.
//!
//! The main entry point is [`parse_porcelain`].
//!
//! # Examples
//!
//! ```
//! use git_blame_porcelain::{CommitHash, parse_porcelain};
//!
//! let output = "\
//! aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa 1 1 2
//! author Alice
//! summary Fix bug
//! \tline one
//! aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa 2 2
//! \tline two
//! bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb 3 3 1
//! author Bob
//! summary Add feature
//! \tline three
//! ";
//! let record = parse_porcelain(output).unwrap();
//!
//! let a: CommitHash = "a".repeat(40).parse().unwrap();
//! assert_eq!(record.lines_for_commit(&a), vec![1, 2]);
//! assert_eq!(record.commit_for_line(3).unwrap().author.name, "Bob");
//! ```
//!
//! # Related crates
//!
//! For running `git blame` and caching the results per file, see
//! `git-blamer`.

#![deny(missing_docs)]

mod errors;
mod hash;
mod parser;
mod record;

pub use errors::{CommitHashParseError, PorcelainParseError};
pub use hash::CommitHash;
pub use parser::parse_porcelain;
pub use record::{
    BlameRecord, CommitInfo, LineAttribution, Previous, Signature,
};
