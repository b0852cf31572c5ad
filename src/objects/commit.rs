//! Commit record and its serialized form.
//!
//! A commit record is stored as plain bytes in the object store:
//!
//! ```text
//! content <digest>
//! parent <digest>        (absent for the first commit)
//! timestamp <unix seconds>
//! message <byte length>
//! <message bytes>
//! ```
//!
//! Headers are fixed in order and the message is length-prefixed and last,
//! so no message text can be read back as a header.

use chrono::{DateTime, Utc};

use super::digest::Digest;
use crate::error::{Error, Result};

/// A commit: one snapshot of the tracked content plus its place in history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// The digest of this commit's encoded record.
    digest: Digest,
    /// The digest of the committed content blob.
    content: Digest,
    /// The previous commit. `None` for the first commit.
    parent: Option<Digest>,
    /// Unix timestamp (seconds since epoch).
    timestamp: i64,
    /// The commit message.
    message: String,
}

impl Commit {
    /// Builds a commit record and computes its digest.
    pub fn new(
        content: Digest,
        parent: Option<Digest>,
        timestamp: i64,
        message: impl Into<String>,
    ) -> Self {
        let message = message.into();
        let digest = Digest::of(&encode(&content, parent.as_ref(), timestamp, &message));
        Commit {
            digest,
            content,
            parent,
            timestamp,
            message,
        }
    }

    /// Encodes this commit into its canonical byte form.
    pub fn encode(&self) -> Vec<u8> {
        encode(
            &self.content,
            self.parent.as_ref(),
            self.timestamp,
            &self.message,
        )
    }

    /// Decodes a commit record read from the store under `digest`.
    ///
    /// Decoding is strict: headers must appear in order, the message length
    /// must match exactly, and nothing may follow the message.
    ///
    /// # Returns
    ///
    /// The commit, or `Error::InvalidObject` if the bytes are not a
    /// well-formed commit record.
    pub fn decode(digest: Digest, data: &[u8]) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidObject {
            digest: digest.to_hex(),
            reason: reason.to_string(),
        };

        let mut rest = data;

        let content = header(&mut rest, "content").ok_or_else(|| invalid("missing content"))?;
        let content = Digest::from_hex(content).map_err(|_| invalid("bad content digest"))?;

        let mut line = next_line(&mut rest).ok_or_else(|| invalid("missing timestamp"))?;
        let parent = match line.strip_prefix("parent ") {
            Some(hex) => {
                let parent = Digest::from_hex(hex).map_err(|_| invalid("bad parent digest"))?;
                line = next_line(&mut rest).ok_or_else(|| invalid("missing timestamp"))?;
                Some(parent)
            }
            None => None,
        };

        let timestamp: i64 = line
            .strip_prefix("timestamp ")
            .ok_or_else(|| invalid("missing timestamp"))?
            .parse()
            .map_err(|_| invalid("bad timestamp"))?;

        let length: usize = header(&mut rest, "message")
            .ok_or_else(|| invalid("missing message"))?
            .parse()
            .map_err(|_| invalid("bad message length"))?;

        if rest.len() != length {
            return Err(invalid("message length mismatch"));
        }
        let message = String::from_utf8(rest.to_vec()).map_err(|_| invalid("message is not UTF-8"))?;

        let commit = Commit {
            digest,
            content,
            parent,
            timestamp,
            message,
        };

        // Non-canonical spellings (leading zeros, "+1") would decode but not re-encode
        if commit.encode() != data {
            return Err(invalid("non-canonical encoding"));
        }

        Ok(commit)
    }

    /// Returns the digest of this commit.
    pub fn digest(&self) -> &Digest {
        &self.digest
    }

    /// Returns the digest of the committed content.
    pub fn content(&self) -> &Digest {
        &self.content
    }

    /// Returns the parent commit, if any.
    pub fn parent(&self) -> Option<&Digest> {
        self.parent.as_ref()
    }

    /// Returns the Unix timestamp.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Returns the timestamp as a UTC date-time, if representable.
    pub fn time(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp(self.timestamp, 0)
    }

    /// Returns the full commit message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the first line of the commit message (the summary).
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    /// Returns true if this is the first commit (no parent).
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

fn encode(content: &Digest, parent: Option<&Digest>, timestamp: i64, message: &str) -> Vec<u8> {
    let mut out = String::new();

    out.push_str(&format!("content {}\n", content.to_hex()));
    if let Some(parent) = parent {
        out.push_str(&format!("parent {}\n", parent.to_hex()));
    }
    out.push_str(&format!("timestamp {}\n", timestamp));
    out.push_str(&format!("message {}\n", message.len()));
    out.push_str(message);

    out.into_bytes()
}

/// Splits off the next `\n`-terminated line, which must be ASCII.
fn next_line<'a>(rest: &mut &'a [u8]) -> Option<&'a str> {
    let end = rest.iter().position(|&b| b == b'\n')?;
    let line = std::str::from_utf8(&rest[..end]).ok()?;
    if !line.is_ascii() {
        return None;
    }
    *rest = &rest[end + 1..];
    Some(line)
}

fn header<'a>(rest: &mut &'a [u8], name: &str) -> Option<&'a str> {
    let line = next_line(rest)?;
    line.strip_prefix(name)?.strip_prefix(' ')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content() -> Digest {
        Digest::of(b"hello")
    }

    fn parent() -> Digest {
        Digest::of(b"parent record")
    }

    #[test]
    fn test_encode_layout_root() {
        let commit = Commit::new(content(), None, 1_700_000_000, "first");
        let expected = format!(
            "content {}\ntimestamp 1700000000\nmessage 5\nfirst",
            content().to_hex()
        );
        assert_eq!(commit.encode(), expected.into_bytes());
        assert!(commit.is_root());
    }

    #[test]
    fn test_encode_layout_with_parent() {
        let commit = Commit::new(content(), Some(parent()), 42, "second");
        let text = String::from_utf8(commit.encode()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], format!("content {}", content().to_hex()));
        assert_eq!(lines[1], format!("parent {}", parent().to_hex()));
        assert_eq!(lines[2], "timestamp 42");
        assert_eq!(lines[3], "message 6");
        assert_eq!(lines[4], "second");
    }

    #[test]
    fn test_digest_is_hash_of_encoding() {
        let commit = Commit::new(content(), Some(parent()), 42, "msg");
        assert_eq!(*commit.digest(), Digest::of(&commit.encode()));
    }

    #[test]
    fn test_same_fields_same_digest() {
        let a = Commit::new(content(), None, 42, "msg");
        let b = Commit::new(content(), None, 42, "msg");
        let c = Commit::new(content(), None, 43, "msg");
        assert_eq!(a.digest(), b.digest());
        assert_ne!(a.digest(), c.digest());
    }

    #[test]
    fn test_decode_roundtrip() {
        let commit = Commit::new(content(), Some(parent()), -5, "multi\nline\n\nmessage");
        let decoded = Commit::decode(*commit.digest(), &commit.encode()).unwrap();
        assert_eq!(decoded, commit);
        assert_eq!(decoded.summary(), "multi");
    }

    #[test]
    fn test_message_cannot_forge_parent() {
        let forged = format!("x\nparent {}\n", parent().to_hex());
        let commit = Commit::new(content(), None, 1, forged.clone());
        let decoded = Commit::decode(*commit.digest(), &commit.encode()).unwrap();

        assert!(decoded.parent().is_none());
        assert_eq!(decoded.message(), forged);
    }

    #[test]
    fn test_decode_empty_message() {
        let commit = Commit::new(content(), None, 1, "");
        let decoded = Commit::decode(*commit.digest(), &commit.encode()).unwrap();
        assert_eq!(decoded.message(), "");
        assert_eq!(decoded.summary(), "");
    }

    #[test]
    fn test_decode_rejects_malformed() {
        let digest = Digest::of(b"whatever");
        let c = content().to_hex();

        let cases: Vec<Vec<u8>> = vec![
            b"hello".to_vec(),
            b"".to_vec(),
            format!("content {}\nmessage 0\n", c).into_bytes(),
            format!("content {}\ntimestamp x\nmessage 0\n", c).into_bytes(),
            format!("content {}\ntimestamp 1\nmessage 5\nabc", c).into_bytes(),
            format!("content {}\ntimestamp 1\nmessage 1\nabc", c).into_bytes(),
            format!("content {}\ntimestamp 01\nmessage 0\n", c).into_bytes(),
            format!("content zz\ntimestamp 1\nmessage 0\n").into_bytes(),
            format!("timestamp 1\ncontent {}\nmessage 0\n", c).into_bytes(),
            format!("content {}\nparent nope\ntimestamp 1\nmessage 0\n", c).into_bytes(),
        ];

        for data in cases {
            let result = Commit::decode(digest, &data);
            assert!(
                matches!(result, Err(Error::InvalidObject { .. })),
                "should reject {:?}",
                String::from_utf8_lossy(&data)
            );
        }
    }

    #[test]
    fn test_decode_rejects_invalid_utf8_message() {
        let mut data = format!("content {}\ntimestamp 1\nmessage 2\n", content().to_hex()).into_bytes();
        data.extend_from_slice(&[0xff, 0xfe]);
        assert!(matches!(
            Commit::decode(Digest::of(&data), &data),
            Err(Error::InvalidObject { .. })
        ));
    }

    #[test]
    fn test_time() {
        let commit = Commit::new(content(), None, 0, "epoch");
        assert_eq!(commit.time().unwrap().to_rfc3339(), "1970-01-01T00:00:00+00:00");
    }
}
