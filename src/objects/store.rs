//! Content-addressable object store.

use tracing::{trace, warn};

use super::digest::{Digest, DIGEST_HEX_LEN, SHARD_LEN};
use crate::backend::Backend;
use crate::error::{Error, Result};

/// The key prefix under which objects are stored.
pub const OBJECTS_DIR: &str = "objects";

/// A store for content-addressed objects.
///
/// Objects are stored under `objects/<first 2 hex>/<remaining hex>`,
/// keyed by the SHA-256 digest of their bytes. Blobs and commit records
/// share the store; nothing in an entry marks its kind.
#[derive(Debug)]
pub struct ObjectStore<'a, B: Backend + ?Sized> {
    backend: &'a B,
    verify: bool,
}

impl<'a, B: Backend + ?Sized> ObjectStore<'a, B> {
    /// Creates an ObjectStore over the given backend.
    ///
    /// Reads are verified against their digest by default.
    pub fn new(backend: &'a B) -> Self {
        ObjectStore {
            backend,
            verify: true,
        }
    }

    /// Enables or disables re-hashing objects on read.
    pub fn verify_reads(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Converts a Digest to the backend key of its entry.
    ///
    /// For example, `e3b0c442…` becomes `objects/e3/b0c442…`.
    pub fn key(digest: &Digest) -> String {
        let (shard, rest) = digest.shard();
        format!("{}/{}/{}", OBJECTS_DIR, shard, rest)
    }

    /// Stores content and returns its digest.
    ///
    /// If an entry with the same digest already exists the write is skipped.
    ///
    /// # Arguments
    ///
    /// * `content` - The bytes to store.
    pub fn put(&self, content: &[u8]) -> Result<Digest> {
        let digest = Digest::of(content);
        let key = Self::key(&digest);

        // Check if object already exists (idempotent)
        if self.backend.contains(&key)? {
            trace!(digest = %digest.short(), "object already stored");
            return Ok(digest);
        }

        self.backend.write(&key, content)?;
        trace!(digest = %digest.short(), size = content.len(), "stored object");
        Ok(digest)
    }

    /// Reads an object by its digest.
    ///
    /// # Returns
    ///
    /// The stored bytes, `Error::ObjectNotFound` if no entry exists, or
    /// `Error::CorruptObject` if verification is on and the bytes no longer
    /// hash to `digest`.
    pub fn get(&self, digest: &Digest) -> Result<Vec<u8>> {
        let content = self
            .backend
            .read(&Self::key(digest))?
            .ok_or_else(|| Error::ObjectNotFound(digest.to_hex()))?;

        if self.verify {
            let actual = Digest::of(&content);
            if actual != *digest {
                warn!(expected = %digest, actual = %actual, "object content does not match its digest");
                return Err(Error::CorruptObject {
                    expected: digest.to_hex(),
                    actual: actual.to_hex(),
                });
            }
        }

        Ok(content)
    }

    /// Checks if an object exists in the store.
    pub fn contains(&self, digest: &Digest) -> Result<bool> {
        self.backend.contains(&Self::key(digest))
    }

    /// Finds objects whose digest starts with the given prefix.
    ///
    /// This is used to resolve abbreviated digests.
    ///
    /// # Arguments
    ///
    /// * `prefix` - A hexadecimal prefix (at least 4 characters).
    ///
    /// # Returns
    ///
    /// A vector of matching digests, or an error if the prefix is invalid.
    pub fn find_by_prefix(&self, prefix: &str) -> Result<Vec<Digest>> {
        if prefix.len() < 4 || prefix.len() > DIGEST_HEX_LEN {
            return Err(Error::InvalidDigest(prefix.to_string()));
        }

        if !prefix.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidDigest(prefix.to_string()));
        }

        let prefix = prefix.to_lowercase();
        let (shard, rest_prefix) = prefix.split_at(SHARD_LEN);

        let mut matches = Vec::new();
        for name in self.backend.list(&format!("{}/{}", OBJECTS_DIR, shard))? {
            if !name.starts_with(rest_prefix) {
                continue;
            }
            // Skips in-flight temporary files and anything else that is not an entry
            if let Ok(digest) = Digest::from_hex(&format!("{}{}", shard, name)) {
                matches.push(digest);
            }
        }

        Ok(matches)
    }

    /// Resolves a full or abbreviated digest to exactly one stored object.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidDigest` if the prefix is too short or not hex.
    /// - `Error::ObjectNotFound` if nothing matches.
    /// - `Error::AmbiguousDigest` if several objects match.
    pub fn resolve_prefix(&self, prefix: &str) -> Result<Digest> {
        if prefix.len() == DIGEST_HEX_LEN {
            return Digest::from_hex(prefix);
        }

        let mut matches = self.find_by_prefix(prefix)?;
        match matches.len() {
            0 => Err(Error::ObjectNotFound(prefix.to_string())),
            1 => Ok(matches.remove(0)),
            _ => Err(Error::AmbiguousDigest(prefix.to_string())),
        }
    }
}
