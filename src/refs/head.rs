//! HEAD reference representation.

use crate::objects::Digest;
use crate::refs::resolver::HEAD;

/// Represents the current HEAD state of a repository.
///
/// HEAD normally points to a named ref whose tip is the latest commit.
/// It can also hold a commit digest directly (detached state).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Head {
    /// HEAD points to a named ref (e.g., `refs/main`).
    Named {
        /// The full ref name.
        name: String,
        /// The commit the ref points to, `None` before the first commit.
        tip: Option<Digest>,
    },
    /// HEAD points directly to a commit (detached state).
    Detached {
        /// The commit that HEAD points to.
        tip: Digest,
    },
}

impl Head {
    /// Creates a new Head pointing to a named ref.
    ///
    /// # Arguments
    ///
    /// * `name` - The full ref name (e.g. `refs/main`).
    /// * `tip` - The commit the ref points to, if any.
    pub fn named(name: impl Into<String>, tip: Option<Digest>) -> Self {
        Head::Named {
            name: name.into(),
            tip,
        }
    }

    /// Creates a new detached Head.
    pub fn detached(tip: Digest) -> Self {
        Head::Detached { tip }
    }

    /// Returns the commit HEAD resolves to, if any.
    pub fn tip(&self) -> Option<&Digest> {
        match self {
            Head::Named { tip, .. } => tip.as_ref(),
            Head::Detached { tip } => Some(tip),
        }
    }

    /// Returns the ref name if HEAD points to a named ref.
    pub fn ref_name(&self) -> Option<&str> {
        match self {
            Head::Named { name, .. } => Some(name),
            Head::Detached { .. } => None,
        }
    }

    /// Returns `true` if HEAD is in detached state.
    pub fn is_detached(&self) -> bool {
        matches!(self, Head::Detached { .. })
    }

    /// Returns `true` if no commit has been made yet.
    pub fn is_unborn(&self) -> bool {
        self.tip().is_none()
    }

    /// Returns the name of the ref a new commit updates.
    ///
    /// This is the named ref, or `HEAD` itself when detached.
    pub fn reference_name(&self) -> String {
        match self {
            Head::Named { name, .. } => name.clone(),
            Head::Detached { .. } => HEAD.to_string(),
        }
    }
}
