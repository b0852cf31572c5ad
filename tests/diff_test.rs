//! Integration tests for content diffs.

use proptest::prelude::*;
use trackit::diff::{diff, diff_lines, DiffKind, Granularity};

// DF-001: a single changed character
#[test]
fn test_df001_abc_abd() {
    let d = diff(b"abc", b"abd");
    let ops: Vec<(DiffKind, &[u8])> = d.ops().iter().map(|op| (op.kind(), op.as_bytes())).collect();

    assert_eq!(
        ops,
        vec![
            (DiffKind::Equal, &b"ab"[..]),
            (DiffKind::Delete, &b"c"[..]),
            (DiffKind::Insert, &b"d"[..]),
        ]
    );
    assert_eq!(d.old_content(), b"abc");
    assert_eq!(d.new_content(), b"abd");
}

// DF-002: adjacent operations never share a kind
#[test]
fn test_df002_ops_are_coalesced() {
    let d = diff(b"the cat sat", b"the hat sat on");
    for pair in d.ops().windows(2) {
        assert_ne!(pair[0].kind(), pair[1].kind());
    }
    assert!(d.ops().iter().all(|op| !op.as_bytes().is_empty()));
}

// DF-003: line diffs keep whole lines
#[test]
fn test_df003_lines() {
    let old = "alpha\nbeta\ngamma\n";
    let new = "alpha\nBETA\ngamma\ndelta\n";
    let d = diff_lines(old.as_bytes(), new.as_bytes());

    assert_eq!(d.granularity(), Granularity::Line);
    let stats = d.stats();
    assert_eq!(stats.equal, 2);
    assert_eq!(stats.deleted, 1);
    assert_eq!(stats.inserted, 2);
}

// DF-004: a change in the middle of a long shared text stays minimal
#[test]
fn test_df004_minimal_change() {
    let old = "a".repeat(500) + "X" + &"b".repeat(500);
    let new = "a".repeat(500) + "Y" + &"b".repeat(500);
    let d = diff(old.as_bytes(), new.as_bytes());

    assert_eq!(d.stats().changes(), 2);
    assert_eq!(d.to_string(), format!("{}[-X-]{{+Y+}}{}", "a".repeat(500), "b".repeat(500)));
}

proptest! {
    // Replaying the operations reconstructs both inputs
    #[test]
    fn prop_diff_replays_bytes(a in prop::collection::vec(any::<u8>(), 0..64), b in prop::collection::vec(any::<u8>(), 0..64)) {
        let d = diff(&a, &b);
        prop_assert_eq!(d.old_content(), a);
        prop_assert_eq!(d.new_content(), b);
    }

    #[test]
    fn prop_diff_replays_text(a in "[a-c\u{e9}\n]{0,40}", b in "[a-c\u{e9}\n]{0,40}") {
        let d = diff(a.as_bytes(), b.as_bytes());
        prop_assert_eq!(d.granularity(), Granularity::Char);
        prop_assert_eq!(d.old_content(), a.as_bytes().to_vec());
        prop_assert_eq!(d.new_content(), b.as_bytes().to_vec());

        let stats = d.stats();
        prop_assert_eq!(stats.equal + stats.deleted, a.chars().count());
        prop_assert_eq!(stats.equal + stats.inserted, b.chars().count());

        let lines = diff_lines(a.as_bytes(), b.as_bytes());
        prop_assert_eq!(lines.old_content(), a.as_bytes().to_vec());
        prop_assert_eq!(lines.new_content(), b.as_bytes().to_vec());
    }

    // Diffing a text against itself yields no changes
    #[test]
    fn prop_diff_identity(a in ".{0,40}") {
        let d = diff(a.as_bytes(), a.as_bytes());
        prop_assert!(d.is_identical());
        prop_assert_eq!(d.stats().changes(), 0);
    }
}
