// Copyright 2026 Oxide Computer Company

//! Per-repository `git blame` cache.
//!
//! A [`Blamer`] is bound to one git repository. It answers two questions
//! about any tracked file:
//!
//! - which commit last touched line N ([`Blamer::line_info`]), and
//! - which other lines of the file that commit touched
//!   ([`Blamer::lines_for_commit`]).
//!
//! Answers come from `git blame --porcelain`, parsed by
//! [`git_blame_porcelain`] and cached per file until the file is
//! invalidated, typically in response to a [`FileEvent`] from a file watcher.
//! Concurrent queries for a file that is not cached share a single git
//! process.
//!
//! # Usage
//!
//! ```no_run
//! use git_blamer::{Blamer, FileEvent};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), git_blamer::BlameError> {
//! let blamer = Arc::new(Blamer::open("/path/to/checkout")?);
//!
//! match blamer.line_info("src/main.rs", 42).await? {
//!     Some(blame) => println!("{}", blame.commit.summary),
//!     None => println!("no blame for that line"),
//! }
//!
//! // Later, when a file watcher reports a change:
//! blamer.handle_event(&FileEvent::Changed(
//!     "/path/to/checkout/src/main.rs".into(),
//! ));
//! # Ok(())
//! # }
//! ```
//!
//! # Logging
//!
//! Diagnostics are emitted through [`tracing`]. No subscriber is installed;
//! that is left to the application.

#![deny(missing_docs)]

mod blamer;
mod cache;
mod errors;
mod git;
mod repository;

pub use blamer::{Blamer, FileEvent, LineBlame};
pub use cache::BlameCache;
pub use errors::{BlameError, GitEnvError, LocateError};
pub use git::{BlameSource, Git};
pub use repository::Repository;

pub use git_blame_porcelain::{
    BlameRecord, CommitHash, CommitInfo, LineAttribution, Previous, Signature,
};
