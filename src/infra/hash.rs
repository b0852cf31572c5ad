//! SHA-256 hashing of raw content.

use sha2::{Digest as _, Sha256};

/// SHA-256 hash size in bytes.
pub const SHA256_SIZE: usize = 32;

/// Computes the SHA-256 hash of the given data.
///
/// Objects are hashed over their raw bytes with no type header, so a blob
/// and a commit record with identical bytes share one identity.
///
/// Usage: `let hash = sha256(b"hello world");`
pub fn sha256(data: &[u8]) -> [u8; SHA256_SIZE] {
    let mut out = [0u8; SHA256_SIZE];
    out.copy_from_slice(&Sha256::digest(data));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_empty() {
        let hash = sha256(b"");
        assert_eq!(
            hex::encode(hash),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_sha256_abc() {
        let hash = sha256(b"abc");
        assert_eq!(
            hex::encode(hash),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_sha256_hello() {
        let hash = sha256(b"hello");
        assert_eq!(
            hex::encode(hash),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_sha256_distinct_inputs() {
        assert_ne!(sha256(b"a"), sha256(b"b"));
        assert_eq!(sha256(b"same"), sha256(b"same"));
    }
}
