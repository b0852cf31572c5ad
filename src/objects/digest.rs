//! Content digest (SHA-256 hash) representation.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::infra::hash::{sha256, SHA256_SIZE};

/// The length of a digest as a hexadecimal string.
pub const DIGEST_HEX_LEN: usize = SHA256_SIZE * 2;

/// The number of leading hex characters used as the shard directory.
pub const SHARD_LEN: usize = 2;

/// A content digest identifying a stored object.
///
/// Blobs and commit records are both identified by the SHA-256 hash of
/// their raw bytes, rendered as 64 lowercase hex characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest {
    bytes: [u8; SHA256_SIZE],
}

impl Digest {
    /// Computes the digest of the given content.
    ///
    /// # Examples
    ///
    /// ```
    /// use trackit::objects::Digest;
    ///
    /// let digest = Digest::of(b"hello");
    /// assert!(digest.to_hex().starts_with("2cf24dba"));
    /// ```
    pub fn of(content: &[u8]) -> Self {
        Digest {
            bytes: sha256(content),
        }
    }

    /// Creates a Digest from a 64-character hexadecimal string.
    ///
    /// Uppercase input is accepted and normalized.
    ///
    /// # Returns
    ///
    /// The Digest on success, or `Error::InvalidDigest` if the string is invalid.
    pub fn from_hex(hex: &str) -> Result<Self> {
        if hex.len() != DIGEST_HEX_LEN {
            return Err(Error::InvalidDigest(hex.to_string()));
        }

        let mut bytes = [0u8; SHA256_SIZE];
        hex::decode_to_slice(hex, &mut bytes).map_err(|_| Error::InvalidDigest(hex.to_string()))?;
        Ok(Digest { bytes })
    }

    /// Creates a Digest from raw hash bytes.
    pub fn from_bytes(bytes: [u8; SHA256_SIZE]) -> Self {
        Digest { bytes }
    }

    /// Returns the lowercase hexadecimal representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Returns a short (10-character) hexadecimal representation.
    pub fn short(&self) -> String {
        self.to_hex()[..10].to_string()
    }

    /// Splits the hex form into its shard directory and entry name.
    pub fn shard(&self) -> (String, String) {
        let hex = self.to_hex();
        let (shard, rest) = hex.split_at(SHARD_LEN);
        (shard.to_string(), rest.to_string())
    }

    /// Returns a reference to the raw hash bytes.
    pub fn as_bytes(&self) -> &[u8; SHA256_SIZE] {
        &self.bytes
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.short())
    }
}

impl FromStr for Digest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Digest::from_hex(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn test_of_matches_known_hash() {
        assert_eq!(Digest::of(b"").to_hex(), EMPTY_SHA256);
    }

    #[test]
    fn test_from_hex_roundtrip_and_uppercase() {
        let digest = Digest::from_hex(EMPTY_SHA256).unwrap();
        assert_eq!(digest.to_hex(), EMPTY_SHA256);

        let upper = Digest::from_hex(&EMPTY_SHA256.to_uppercase()).unwrap();
        assert_eq!(upper, digest);
    }

    #[test]
    fn test_from_hex_invalid_length() {
        assert!(matches!(
            Digest::from_hex(&EMPTY_SHA256[..63]),
            Err(Error::InvalidDigest(_))
        ));
        assert!(matches!(Digest::from_hex(""), Err(Error::InvalidDigest(_))));
    }

    #[test]
    fn test_from_hex_invalid_chars() {
        let bad = format!("g{}", &EMPTY_SHA256[1..]);
        assert!(matches!(Digest::from_hex(&bad), Err(Error::InvalidDigest(_))));
    }

    #[test]
    fn test_shard_split() {
        let digest = Digest::from_hex(EMPTY_SHA256).unwrap();
        let (shard, rest) = digest.shard();
        assert_eq!(shard, "e3");
        assert_eq!(rest.len(), DIGEST_HEX_LEN - SHARD_LEN);
        assert_eq!(format!("{}{}", shard, rest), EMPTY_SHA256);
    }

    #[test]
    fn test_display_debug_short() {
        let digest = Digest::from_hex(EMPTY_SHA256).unwrap();
        assert_eq!(format!("{}", digest), EMPTY_SHA256);
        assert_eq!(format!("{:?}", digest), "Digest(e3b0c44298)");
        assert_eq!(digest.short(), "e3b0c44298");
    }

    #[test]
    fn test_from_str() {
        let digest: Digest = EMPTY_SHA256.parse().unwrap();
        assert_eq!(digest, Digest::of(b""));
        assert!("invalid".parse::<Digest>().is_err());
    }
}
