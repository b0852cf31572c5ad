//! Tracked content status.
//!
//! Status compares the digest of the current content against the content
//! digest recorded by the tip commit.

use std::fmt;

use crate::objects::Digest;

/// Whether the current content matches the latest commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The content is byte-identical to the tip commit's content.
    Clean,
    /// The content differs, or nothing has been committed yet.
    Dirty,
}

impl Status {
    /// Returns true if the content matches the tip commit.
    pub fn is_clean(&self) -> bool {
        matches!(self, Status::Clean)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Clean => f.write_str("clean"),
            Status::Dirty => f.write_str("dirty"),
        }
    }
}

/// Computes the status of `content` against the tip commit's content digest.
///
/// # Arguments
///
/// * `committed` - The content digest of the tip commit, `None` without history.
/// * `content` - The current bytes of the tracked content.
pub fn compute_status(committed: Option<&Digest>, content: &[u8]) -> Status {
    match committed {
        Some(digest) if *digest == Digest::of(content) => Status::Clean,
        _ => Status::Dirty,
    }
}
