// Distance-only alignment with two rolling rows

use super::CallEquality;

/// Edit distance between the suffixes `new[offset..]` and `old[offset..]`.
///
/// Insert, delete and substitute cost 1; a match costs 0. Memory is
/// proportional to the shorter suffix. An offset past the end of a sequence
/// leaves an empty suffix on that side.
///
/// # Example
/// ```
/// use rastro::alignment::{quick_distance, CallEquality};
///
/// let old = [1, 2, 3, -1, 4];
/// let new = [1, 2, 3, 4];
/// assert_eq!(quick_distance(&new, &old, 0, &CallEquality::Any), 1);
/// assert_eq!(quick_distance(&new, &old, 3, &CallEquality::Any), 1);
/// ```
pub fn quick_distance(new: &[i64], old: &[i64], offset: usize, calls: &CallEquality<'_>) -> usize {
    let new = new.get(offset..).unwrap_or(&[]);
    let old = old.get(offset..).unwrap_or(&[]);

    if new.len() >= old.len() {
        rolling_distance(new, old, |n, o| calls.entries_match(n, o))
    } else {
        rolling_distance(old, new, |o, n| calls.entries_match(n, o))
    }
}

/// Standard two-row recurrence with the row sized by `inner`.
fn rolling_distance<F>(outer: &[i64], inner: &[i64], matches: F) -> usize
where
    F: Fn(i64, i64) -> bool,
{
    let mut prev: Vec<usize> = (0..=inner.len()).collect();
    let mut curr = vec![0usize; inner.len() + 1];

    for (i, &a) in outer.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &b) in inner.iter().enumerate() {
            let substitute = prev[j] + usize::from(!matches(a, b));
            let delete = prev[j + 1] + 1;
            let insert = curr[j] + 1;
            curr[j + 1] = substitute.min(delete).min(insert);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[inner.len()]
}

/// O(length) check that two traces are identical position by position.
///
/// Any two call markers count as equal. Used as a fast path before the full
/// alignment: a `true` result means the distance is zero.
pub fn equal_length_match(new: &[i64], old: &[i64]) -> bool {
    new.len() == old.len()
        && new
            .iter()
            .zip(old)
            .all(|(&n, &o)| CallEquality::Any.entries_match(n, o))
}
