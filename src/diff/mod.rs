//! Content diff implementation.
//!
//! This module computes the difference between two versions of the tracked
//! content as an ordered list of equal, inserted and deleted spans. Replaying
//! the spans reconstructs either side exactly.
//!
//! # Example
//!
//! ```
//! use trackit::diff::{diff, DiffKind};
//!
//! let d = diff(b"abc", b"abd");
//! let kinds: Vec<_> = d.ops().iter().map(|op| (op.kind(), op.text().into_owned())).collect();
//! assert_eq!(kinds, vec![
//!     (DiffKind::Equal, "ab".to_string()),
//!     (DiffKind::Delete, "c".to_string()),
//!     (DiffKind::Insert, "d".to_string()),
//! ]);
//! assert_eq!(d.to_string(), "ab[-c-]{+d+}");
//! ```

mod myers;

use std::borrow::Cow;
use std::fmt;

/// The kind of a diff operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiffKind {
    /// The span is present in both inputs.
    Equal,
    /// The span is only present in the new input.
    Insert,
    /// The span is only present in the old input.
    Delete,
}

impl DiffKind {
    /// Returns a single character representing the kind.
    pub fn as_char(&self) -> char {
        match self {
            DiffKind::Equal => ' ',
            DiffKind::Insert => '+',
            DiffKind::Delete => '-',
        }
    }
}

/// The unit a diff compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// Unicode scalar values; used when both inputs are UTF-8.
    Char,
    /// Raw bytes.
    Byte,
    /// Lines, each including its trailing newline.
    Line,
}

/// Statistics about a diff, counted in tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffStats {
    /// Number of tokens present in both inputs.
    pub equal: usize,
    /// Number of inserted tokens.
    pub inserted: usize,
    /// Number of deleted tokens.
    pub deleted: usize,
}

impl DiffStats {
    /// Returns the total number of changed tokens.
    pub fn changes(&self) -> usize {
        self.inserted + self.deleted
    }
}

/// A run of consecutive tokens sharing one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffOp {
    kind: DiffKind,
    data: Vec<u8>,
    tokens: usize,
}

impl DiffOp {
    /// Returns the kind of this operation.
    pub fn kind(&self) -> DiffKind {
        self.kind
    }

    /// Returns the raw bytes of the span.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns the span as text, replacing invalid UTF-8.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }

    /// Returns the number of tokens in the span.
    pub fn tokens(&self) -> usize {
        self.tokens
    }
}

/// The difference between two byte sequences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diff {
    granularity: Granularity,
    ops: Vec<DiffOp>,
}

impl Diff {
    /// Returns the operations in order.
    pub fn ops(&self) -> &[DiffOp] {
        &self.ops
    }

    /// Returns the unit this diff compared.
    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Returns `true` if both inputs were identical.
    pub fn is_identical(&self) -> bool {
        self.ops.iter().all(|op| op.kind == DiffKind::Equal)
    }

    /// Reconstructs the old input from the equal and deleted spans.
    pub fn old_content(&self) -> Vec<u8> {
        self.replay(DiffKind::Delete)
    }

    /// Reconstructs the new input from the equal and inserted spans.
    pub fn new_content(&self) -> Vec<u8> {
        self.replay(DiffKind::Insert)
    }

    /// Returns token counts per kind.
    pub fn stats(&self) -> DiffStats {
        let mut stats = DiffStats::default();
        for op in &self.ops {
            match op.kind {
                DiffKind::Equal => stats.equal += op.tokens,
                DiffKind::Insert => stats.inserted += op.tokens,
                DiffKind::Delete => stats.deleted += op.tokens,
            }
        }
        stats
    }

    fn replay(&self, side: DiffKind) -> Vec<u8> {
        self.ops
            .iter()
            .filter(|op| op.kind == DiffKind::Equal || op.kind == side)
            .flat_map(|op| op.data.iter().copied())
            .collect()
    }
}

impl<'a> IntoIterator for &'a Diff {
    type Item = &'a DiffOp;
    type IntoIter = std::slice::Iter<'a, DiffOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}

impl fmt::Display for Diff {
    /// Renders inline markup: `[-deleted-]` and `{+inserted+}`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for op in &self.ops {
            match op.kind {
                DiffKind::Equal => write!(f, "{}", op.text())?,
                DiffKind::Delete => write!(f, "[-{}-]", op.text())?,
                DiffKind::Insert => write!(f, "{{+{}+}}", op.text())?,
            }
        }
        Ok(())
    }
}

/// Computes the difference between `old` and `new`.
///
/// Compares Unicode scalar values when both inputs are valid UTF-8 and
/// bytes otherwise.
///
/// # Arguments
///
/// * `old` - The original content.
/// * `new` - The changed content.
pub fn diff(old: &[u8], new: &[u8]) -> Diff {
    match (std::str::from_utf8(old), std::str::from_utf8(new)) {
        (Ok(a), Ok(b)) => build(Granularity::Char, &char_tokens(a), &char_tokens(b)),
        _ => build(Granularity::Byte, &byte_tokens(old), &byte_tokens(new)),
    }
}

/// Computes a line-by-line difference between `old` and `new`.
///
/// Each line keeps its trailing newline; a final line without one is a
/// distinct token from the same line with one.
pub fn diff_lines(old: &[u8], new: &[u8]) -> Diff {
    build(Granularity::Line, &line_tokens(old), &line_tokens(new))
}

fn char_tokens(s: &str) -> Vec<&[u8]> {
    let bytes = s.as_bytes();
    s.char_indices()
        .map(|(i, c)| &bytes[i..i + c.len_utf8()])
        .collect()
}

fn byte_tokens(data: &[u8]) -> Vec<&[u8]> {
    data.chunks(1).collect()
}

fn line_tokens(data: &[u8]) -> Vec<&[u8]> {
    data.split_inclusive(|&b| b == b'\n').collect()
}

fn build(granularity: Granularity, old: &[&[u8]], new: &[&[u8]]) -> Diff {
    let script = myers::diff(old, new);

    let mut ops: Vec<DiffOp> = Vec::new();
    let (mut i, mut j) = (0, 0);

    for kind in script {
        let token = match kind {
            DiffKind::Equal => {
                i += 1;
                j += 1;
                old[i - 1]
            }
            DiffKind::Delete => {
                i += 1;
                old[i - 1]
            }
            DiffKind::Insert => {
                j += 1;
                new[j - 1]
            }
        };

        match ops.last_mut() {
            Some(last) if last.kind == kind => {
                last.data.extend_from_slice(token);
                last.tokens += 1;
            }
            _ => ops.push(DiffOp {
                kind,
                data: token.to_vec(),
                tokens: 1,
            }),
        }
    }

    Diff { granularity, ops }
}
