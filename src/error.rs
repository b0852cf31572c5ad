//! Error types for trackit.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for trackit operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A repository already exists at the given location.
    #[error("repository already initialized: {0}")]
    AlreadyInitialized(String),

    /// No repository exists at the given location.
    #[error("not a trackit repository: {0}")]
    NotInitialized(String),

    /// The tracked content could not be read from its location.
    #[error("cannot read tracked file {}: {source}", path.display())]
    SourceUnreadable {
        /// The tracked file path.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The storage layer failed.
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// The requested object was not found.
    #[error("object not found: {0}")]
    ObjectNotFound(String),

    /// The requested commit was not found.
    #[error("commit not found: {0}")]
    CommitNotFound(String),

    /// A commit in the history chain could not be loaded.
    #[error("broken history at {digest}: {reason}")]
    BrokenHistory {
        /// The digest that could not be resolved.
        digest: String,
        /// Why the commit could not be loaded.
        reason: String,
    },

    /// The provided string is not a valid digest.
    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    /// A digest prefix matched more than one object.
    #[error("ambiguous digest prefix: {0}")]
    AmbiguousDigest(String),

    /// A stored object could not be decoded.
    #[error("invalid object {digest}: {reason}")]
    InvalidObject {
        /// The object digest.
        digest: String,
        /// The reason for invalidity.
        reason: String,
    },

    /// A stored object no longer hashes to its digest.
    #[error("corrupt object: expected {expected}, content hashes to {actual}")]
    CorruptObject {
        /// The digest the object was stored under.
        expected: String,
        /// The digest of the bytes actually read.
        actual: String,
    },

    /// A reference file is malformed.
    #[error("invalid reference {name}: {reason}")]
    InvalidRef {
        /// The reference name.
        name: String,
        /// The reason for invalidity.
        reason: String,
    },

    /// The reference moved between reading and updating it.
    #[error("reference {name} moved: expected {expected}, found {actual}")]
    RefConflict {
        /// The reference name.
        name: String,
        /// The value the caller expected.
        expected: String,
        /// The value actually found.
        actual: String,
    },

    /// Another writer holds the reference lock.
    #[error("reference {0} is locked by another writer")]
    RefLocked(String),

    /// The repository configuration is missing a value or malformed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid UTF-8 sequence encountered.
    #[error("invalid UTF-8 sequence")]
    InvalidUtf8,
}

/// Result type alias for trackit operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn test_error_from_io() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error: Error = io_error.into();
        assert!(matches!(error, Error::Storage(_)));
        assert!(error.to_string().contains("storage error"));
    }

    #[test]
    fn test_error_display() {
        let error = Error::ObjectNotFound("abc123".to_string());
        assert_eq!(error.to_string(), "object not found: abc123");

        let error = Error::BrokenHistory {
            digest: "abc123".to_string(),
            reason: "object not found".to_string(),
        };
        assert_eq!(error.to_string(), "broken history at abc123: object not found");

        let error = Error::SourceUnreadable {
            path: PathBuf::from("notes.txt"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(error.to_string(), "cannot read tracked file notes.txt: gone");
    }

    #[test]
    fn test_error_source() {
        let error: Error = std::io::Error::new(std::io::ErrorKind::Other, "disk full").into();
        assert!(StdError::source(&error).is_some());

        let error = Error::SourceUnreadable {
            path: PathBuf::from("a"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(StdError::source(&error).is_some());

        assert!(StdError::source(&Error::InvalidUtf8).is_none());
    }
}
