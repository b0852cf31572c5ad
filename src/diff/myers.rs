//! Myers shortest edit script in linear space.
//!
//! Each step finds the middle snake of the remaining region by running the
//! forward and reverse searches until they overlap, then recurses on the
//! two halves on either side of it. Only two `V` arrays are kept, so memory
//! stays O(N + M) however far apart the inputs are.

use std::collections::HashSet;
use std::hash::Hash;
use std::ops::{Index, IndexMut, Range};

use super::DiffKind;

/// Computes a shortest edit script turning `a` into `b`.
///
/// Returns one [`DiffKind`] per step: `Equal` consumes a token from both
/// sides, `Delete` one from `a`, `Insert` one from `b`. Within each run of
/// changes, deletions come before insertions.
pub(crate) fn diff<T: Eq + Hash>(a: &[T], b: &[T]) -> Vec<DiffKind> {
    let max_d = max_d(a.len(), b.len());
    let mut vf = V::new(max_d);
    let mut vb = V::new(max_d);

    let mut script = Vec::with_capacity(a.len().max(b.len()));
    conquer(a, 0..a.len(), b, 0..b.len(), &mut vf, &mut vb, &mut script);
    deletions_first(&mut script);
    script
}

fn max_d(n: usize, m: usize) -> usize {
    (n + m + 1) / 2 + 1
}

/// Furthest-reaching `x` per diagonal `k`, indexed from `-max_d` to `max_d`.
struct V {
    offset: isize,
    v: Vec<usize>,
}

impl V {
    fn new(max_d: usize) -> Self {
        Self {
            offset: max_d as isize,
            v: vec![0; 2 * max_d + 2],
        }
    }
}

impl Index<isize> for V {
    type Output = usize;

    fn index(&self, k: isize) -> &usize {
        &self.v[(k + self.offset) as usize]
    }
}

impl IndexMut<isize> for V {
    fn index_mut(&mut self, k: isize) -> &mut usize {
        &mut self.v[(k + self.offset) as usize]
    }
}

fn common_prefix<T: PartialEq>(
    a: &[T],
    a_range: Range<usize>,
    b: &[T],
    b_range: Range<usize>,
) -> usize {
    a[a_range]
        .iter()
        .zip(&b[b_range])
        .take_while(|(x, y)| x == y)
        .count()
}

fn common_suffix<T: PartialEq>(
    a: &[T],
    a_range: Range<usize>,
    b: &[T],
    b_range: Range<usize>,
) -> usize {
    a[a_range]
        .iter()
        .rev()
        .zip(b[b_range].iter().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

/// Returns `true` if no token of `b` appears in `a`.
fn disjoint<T: Eq + Hash>(a: &[T], b: &[T]) -> bool {
    let seen: HashSet<&T> = a.iter().collect();
    !b.iter().any(|t| seen.contains(t))
}

/// Finds a point on a shortest path through the middle of the region.
fn middle_snake<T: PartialEq>(
    a: &[T],
    a_range: Range<usize>,
    b: &[T],
    b_range: Range<usize>,
    vf: &mut V,
    vb: &mut V,
) -> Option<(usize, usize)> {
    let n = a_range.len() as isize;
    let m = b_range.len() as isize;
    let delta = n - m;
    let odd = delta & 1 == 1;

    vf[1] = 0;
    vb[1] = 0;

    for d in 0..max_d(a_range.len(), b_range.len()) as isize {
        let mut k = d;
        while k >= -d {
            let mut x = if k == -d || (k != d && vf[k - 1] < vf[k + 1]) {
                vf[k + 1] as isize
            } else {
                vf[k - 1] as isize + 1
            };
            let y = x - k;
            let (x0, y0) = (x, y);
            if x < n && y < m {
                x += common_prefix(
                    a,
                    a_range.start + x as usize..a_range.end,
                    b,
                    b_range.start + y as usize..b_range.end,
                ) as isize;
            }
            vf[k] = x as usize;

            if odd && (k - delta).abs() < d && x + vb[delta - k] as isize >= n {
                return Some((a_range.start + x0 as usize, b_range.start + y0 as usize));
            }
            k -= 2;
        }

        let mut k = d;
        while k >= -d {
            let mut x = if k == -d || (k != d && vb[k - 1] < vb[k + 1]) {
                vb[k + 1] as isize
            } else {
                vb[k - 1] as isize + 1
            };
            let mut y = x - k;
            if x < n && y < m {
                let run = common_suffix(
                    a,
                    a_range.start..a_range.end - x as usize,
                    b,
                    b_range.start..b_range.end - y as usize,
                ) as isize;
                x += run;
                y += run;
            }
            vb[k] = x as usize;

            if !odd && (k - delta).abs() <= d && x + vf[delta - k] as isize >= n {
                return Some((
                    a_range.start + (n - x) as usize,
                    b_range.start + (m - y) as usize,
                ));
            }
            k -= 2;
        }
    }

    None
}

fn conquer<T: Eq + Hash>(
    a: &[T],
    mut a_range: Range<usize>,
    b: &[T],
    mut b_range: Range<usize>,
    vf: &mut V,
    vb: &mut V,
    script: &mut Vec<DiffKind>,
) {
    let prefix = common_prefix(a, a_range.clone(), b, b_range.clone());
    script.extend(std::iter::repeat(DiffKind::Equal).take(prefix));
    a_range.start += prefix;
    b_range.start += prefix;

    let suffix = common_suffix(a, a_range.clone(), b, b_range.clone());
    a_range.end -= suffix;
    b_range.end -= suffix;

    if a_range.is_empty()
        || b_range.is_empty()
        || disjoint(&a[a_range.clone()], &b[b_range.clone()])
    {
        script.extend(std::iter::repeat(DiffKind::Delete).take(a_range.len()));
        script.extend(std::iter::repeat(DiffKind::Insert).take(b_range.len()));
    } else if let Some((x, y)) = middle_snake(a, a_range.clone(), b, b_range.clone(), vf, vb) {
        conquer(a, a_range.start..x, b, b_range.start..y, vf, vb, script);
        conquer(a, x..a_range.end, b, y..b_range.end, vf, vb, script);
    } else {
        script.extend(std::iter::repeat(DiffKind::Delete).take(a_range.len()));
        script.extend(std::iter::repeat(DiffKind::Insert).take(b_range.len()));
    }

    script.extend(std::iter::repeat(DiffKind::Equal).take(suffix));
}

/// Moves deletions ahead of insertions inside every run of changes.
fn deletions_first(script: &mut [DiffKind]) {
    for run in script.split_mut(|kind| *kind == DiffKind::Equal) {
        run.sort_by_key(|kind| *kind != DiffKind::Delete);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use DiffKind::{Delete, Equal, Insert};

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn edit_count(script: &[DiffKind]) -> usize {
        script.iter().filter(|k| **k != Equal).count()
    }

    #[test]
    fn test_single_substitution() {
        assert_eq!(
            diff(&chars("abc"), &chars("abd")),
            vec![Equal, Equal, Delete, Insert]
        );
    }

    #[test]
    fn test_empty_sides() {
        assert!(diff::<char>(&[], &[]).is_empty());
        assert_eq!(diff(&[], &chars("ab")), vec![Insert, Insert]);
        assert_eq!(diff(&chars("ab"), &[]), vec![Delete, Delete]);
    }

    #[test]
    fn test_identical() {
        assert_eq!(diff(&chars("same"), &chars("same")), vec![Equal; 4]);
    }

    #[test]
    fn test_classic_example_is_minimal() {
        // The example from Myers' paper has edit distance 5
        let script = diff(&chars("ABCABBA"), &chars("CBABAC"));
        assert_eq!(edit_count(&script), 5);
    }

    #[test]
    fn test_middle_without_shared_affixes() {
        let script = diff(&chars("xaby"), &chars("zabw"));
        assert_eq!(
            script,
            vec![Delete, Insert, Equal, Equal, Delete, Insert]
        );
    }

    #[test]
    fn test_script_consumes_both_sides() {
        let a = chars("the quick brown fox");
        let b = chars("a quick brown dog jumps");
        let script = diff(&a, &b);

        let from_a = script.iter().filter(|k| **k != Insert).count();
        let from_b = script.iter().filter(|k| **k != Delete).count();
        assert_eq!(from_a, a.len());
        assert_eq!(from_b, b.len());
    }

    #[test]
    fn test_disjoint_inputs_stay_small() {
        let a = vec!['a'; 20_000];
        let b = vec!['b'; 20_000];
        let script = diff(&a, &b);

        assert_eq!(script.len(), 40_000);
        assert!(script[..20_000].iter().all(|k| *k == Delete));
        assert!(script[20_000..].iter().all(|k| *k == Insert));
    }

    #[test]
    fn test_large_inputs_with_scattered_matches() {
        let a: Vec<u8> = (0..3_000u32).map(|i| (i % 7) as u8).collect();
        let b: Vec<u8> = (0..3_000u32).map(|i| (i % 5) as u8).collect();
        let script = diff(&a, &b);

        let from_a = script.iter().filter(|k| **k != Insert).count();
        let from_b = script.iter().filter(|k| **k != Delete).count();
        assert_eq!(from_a, a.len());
        assert_eq!(from_b, b.len());
    }

    fn lcs_len(a: &[u8], b: &[u8]) -> usize {
        let mut row = vec![0usize; b.len() + 1];
        for x in a {
            let mut diag = 0;
            for (j, y) in b.iter().enumerate() {
                let up = row[j + 1];
                row[j + 1] = if x == y { diag + 1 } else { up.max(row[j]) };
                diag = up;
            }
        }
        row[b.len()]
    }

    proptest! {
        #[test]
        fn prop_script_is_shortest(
            a in prop::collection::vec(0u8..4, 0..40),
            b in prop::collection::vec(0u8..4, 0..40),
        ) {
            let script = diff(&a, &b);
            prop_assert_eq!(edit_count(&script), a.len() + b.len() - 2 * lcs_len(&a, &b));

            let mut i = 0;
            let mut j = 0;
            for kind in &script {
                match kind {
                    Equal => {
                        prop_assert_eq!(a[i], b[j]);
                        i += 1;
                        j += 1;
                    }
                    Delete => i += 1,
                    Insert => j += 1,
                }
            }
            prop_assert_eq!((i, j), (a.len(), b.len()));
        }
    }
}
