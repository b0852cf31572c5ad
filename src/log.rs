//! Commit history traversal.
//!
//! History is a single chain: every commit names at most one parent, so
//! the walk is a loop from the tip back to the first commit.
//!
//! # Filtering
//!
//! Use [`LogOptions`] to limit or filter the walk:
//!
//! ```
//! use trackit::backend::MemoryBackend;
//! use trackit::log::LogOptions;
//! use trackit::Repository;
//!
//! let repo = Repository::initialize(MemoryBackend::new(), "notes.txt").unwrap();
//! repo.commit_at(b"one", "first", 100).unwrap();
//! repo.commit_at(b"two", "second", 200).unwrap();
//!
//! let recent: Vec<_> = repo
//!     .log_with_options(LogOptions::new().since_timestamp(150))
//!     .unwrap()
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(recent.len(), 1);
//! assert_eq!(recent[0].message(), "second");
//! ```

use std::collections::HashSet;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{trace, warn};

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::objects::{Commit, Digest, ObjectStore};

/// Options for filtering commit log output.
///
/// Use the builder pattern to construct filtering options.
///
/// # Example
///
/// ```
/// use trackit::log::LogOptions;
///
/// let options = LogOptions::new()
///     .max_count(10)
///     .since_timestamp(1_700_000_000);
/// ```
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Maximum number of commits to return.
    max_count: Option<usize>,
    /// Only include commits at or after this timestamp.
    since: Option<i64>,
    /// Only include commits at or before this timestamp.
    until: Option<i64>,
    /// Starting commit (defaults to the tip if not specified).
    from: Option<Digest>,
}

impl LogOptions {
    /// Creates a new `LogOptions` with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of commits to return.
    pub fn max_count(mut self, n: usize) -> Self {
        self.max_count = Some(n);
        self
    }

    /// Only include commits made at or after this Unix timestamp.
    pub fn since_timestamp(mut self, timestamp: i64) -> Self {
        self.since = Some(timestamp);
        self
    }

    /// Only include commits made at or before this Unix timestamp.
    pub fn until_timestamp(mut self, timestamp: i64) -> Self {
        self.until = Some(timestamp);
        self
    }

    /// Starts the walk at `digest` instead of the current tip.
    pub fn from(mut self, digest: Digest) -> Self {
        self.from = Some(digest);
        self
    }

    /// Returns the explicit starting commit, if one was set.
    pub fn get_from(&self) -> Option<&Digest> {
        self.from.as_ref()
    }

    fn accepts(&self, commit: &Commit) -> bool {
        let timestamp = commit.timestamp();
        self.since.map_or(true, |since| timestamp >= since)
            && self.until.map_or(true, |until| timestamp <= until)
    }
}

/// Parses a date string into a Unix timestamp.
///
/// Supported formats:
/// - Unix timestamp (numeric string)
/// - `YYYY-MM-DD` (midnight UTC)
/// - `YYYY-MM-DD HH:MM:SS` (UTC)
///
/// Returns `None` if the string matches none of them.
pub fn parse_date(s: &str) -> Option<i64> {
    let s = s.trim();

    if let Ok(ts) = s.parse::<i64>() {
        return Some(ts);
    }

    if let Ok(date_time) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(date_time.and_utc().timestamp());
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc().timestamp())
}

/// An iterator over commits from a starting commit back to the first one.
///
/// Commits are yielded newest first. A commit that is missing, corrupt or
/// not a commit record yields one `Error::BrokenHistory` and ends the walk.
///
/// # Example
///
/// ```
/// use trackit::backend::MemoryBackend;
/// use trackit::Repository;
///
/// let repo = Repository::initialize(MemoryBackend::new(), "notes.txt").unwrap();
/// repo.commit_at(b"a", "first", 1).unwrap();
///
/// for result in repo.log().unwrap() {
///     match result {
///         Ok(commit) => println!("{} {}", commit.digest().short(), commit.summary()),
///         Err(e) => eprintln!("Error: {}", e),
///     }
/// }
/// ```
#[derive(Debug)]
pub struct History<'a, B: Backend + ?Sized> {
    /// The object store commits are read from.
    store: ObjectStore<'a, B>,
    /// The next commit to visit.
    next: Option<Digest>,
    /// Commits already visited, to stop on a tampered cycle.
    visited: HashSet<Digest>,
    /// Filtering options.
    options: LogOptions,
    /// Number of commits yielded so far.
    count: usize,
}

impl<'a, B: Backend + ?Sized> History<'a, B> {
    /// Creates a walk starting at `start`; `None` yields nothing.
    pub fn new(store: ObjectStore<'a, B>, start: Option<Digest>) -> Self {
        Self::with_options(store, start, LogOptions::default())
    }

    /// Creates a walk with filtering options.
    ///
    /// An explicit `from` in `options` overrides `start`.
    pub fn with_options(store: ObjectStore<'a, B>, start: Option<Digest>, options: LogOptions) -> Self {
        let next = options.from.or(start);
        History {
            store,
            next,
            visited: HashSet::new(),
            options,
            count: 0,
        }
    }

    /// Reads and decodes one commit, classifying failures as broken history.
    fn load(&self, digest: &Digest) -> Result<Commit> {
        let broken = |reason: String| {
            warn!(digest = %digest, reason = %reason, "history is broken");
            Error::BrokenHistory {
                digest: digest.to_hex(),
                reason,
            }
        };

        let data = match self.store.get(digest) {
            Ok(data) => data,
            Err(Error::ObjectNotFound(_)) => return Err(broken("missing commit".to_string())),
            Err(e @ Error::CorruptObject { .. }) => return Err(broken(e.to_string())),
            Err(e) => return Err(e),
        };

        Commit::decode(*digest, &data).map_err(|e| broken(e.to_string()))
    }
}

impl<B: Backend + ?Sized> Iterator for History<'_, B> {
    type Item = Result<Commit>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(max) = self.options.max_count {
                if self.count >= max {
                    return None;
                }
            }

            let digest = self.next.take()?;

            if !self.visited.insert(digest) {
                return Some(Err(Error::BrokenHistory {
                    digest: digest.to_hex(),
                    reason: "parent chain loops".to_string(),
                }));
            }

            // `next` stays empty on error, which ends the walk
            let commit = match self.load(&digest) {
                Ok(commit) => commit,
                Err(e) => return Some(Err(e)),
            };
            trace!(digest = %digest.short(), "visited commit");
            self.next = commit.parent().copied();

            if self.options.accepts(&commit) {
                self.count += 1;
                return Some(Ok(commit));
            }
        }
    }
}
