//! # trackit
//!
//! A minimal version tracker for a single file.
//!
//! Every snapshot of the tracked content is stored once in a
//! content-addressed object store, keyed by its SHA-256 digest. Commits
//! link snapshots into a linear history, and a `HEAD` reference points at
//! the latest commit.
//!
//! ## Features
//!
//! - Content-addressed, deduplicated object storage
//! - Linear commit history with lazy newest-first traversal
//! - Clean/dirty status and restoring any past snapshot
//! - Character- and line-level Myers diffs
//! - Filesystem and in-memory storage backends
//!
//! ## Quick Start
//!
//! ```
//! use trackit::backend::MemoryBackend;
//! use trackit::{Repository, Result, Status};
//!
//! fn main() -> Result<()> {
//!     let repo = Repository::initialize(MemoryBackend::new(), "notes.txt")?;
//!
//!     let first = repo.commit_content(b"hello", "first")?;
//!     assert_eq!(repo.status_of(b"hello world")?, Status::Dirty);
//!
//!     for commit in repo.log()? {
//!         let commit = commit?;
//!         println!("{} {}", commit.digest().short(), commit.summary());
//!     }
//!
//!     assert_eq!(repo.snapshot(&first)?, b"hello");
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`error`] - Error types and Result alias
//! - [`repository`] - Main `Repository` type
//! - [`backend`] - Storage backends (filesystem, in-memory)
//! - [`objects`] - Digests, the object store and commit records
//! - [`refs`] - HEAD and the named ref it points at
//! - [`log`] - History traversal
//! - [`status`] - Clean/dirty status
//! - [`diff`] - Content diffs
//! - [`config`] - Repository configuration

pub mod backend;
pub mod config;
pub mod diff;
pub mod error;
pub mod log;
pub mod objects;
pub mod refs;
pub mod repository;
pub mod status;

// Internal modules (not part of public API)
pub(crate) mod infra;

// Re-export primary types for convenient access
pub use config::Config;
pub use error::{Error, Result};
pub use repository::Repository;

// Re-export storage types
pub use backend::{Backend, FsBackend, MemoryBackend};

// Re-export object types
pub use objects::{Commit, Digest, ObjectStore};

// Re-export reference types
pub use refs::Head;

// Re-export status types
pub use status::Status;

// Re-export log types
pub use log::{History, LogOptions};

// Re-export diff types
pub use diff::{diff, diff_lines, Diff, DiffKind, DiffOp, DiffStats};
