// Trace alignment: edit-distance variants over instruction and call sequences
//
// Three alignments share one recurrence:
// - quick: distance only, two rolling rows, O(min(n, m)) memory
// - full: whole cost matrix kept, backtracked into divergent spans
// - calls: insertion/deletion only over called-method identifiers
//
// Scientific Foundation:
// [1] Levenshtein, V. I. (1966). Binary codes capable of correcting deletions,
//     insertions, and reversals. Soviet Physics Doklady, 10(8).
//
// [2] Wagner, R. A., & Fischer, M. J. (1974). The string-to-string correction
//     problem. Journal of the ACM, 21(1). O(n*m) dynamic program + traceback.
//
// Instruction sequences hold signed indices. Negative values are call markers
// (`-(k + 1)` for child `k`); how two markers compare is decided by
// `CallEquality`.

mod calls;
mod full;
mod quick;

pub use calls::{match_calls, CallMatching};
pub use full::{full_alignment, Alignment, DivergentSpan};
pub use quick::{equal_length_match, quick_distance};

use crate::invocation::marker_child;

/// How two call markers are compared.
#[derive(Debug, Clone, Copy)]
pub enum CallEquality<'a> {
    /// Any call marker equals any other call marker.
    Any,
    /// Markers are equal iff the methods they call are equal.
    ///
    /// Offered to callers aligning traces against their own child identifier
    /// lists. `DivergenceDetector` always aligns with [`CallEquality::Any`].
    ByMethod {
        new_calls: &'a [&'a str],
        old_calls: &'a [&'a str],
    },
}

impl CallEquality<'_> {
    /// Equality rule for one new-side entry against one old-side entry.
    pub fn entries_match(&self, new: i64, old: i64) -> bool {
        match (new < 0, old < 0) {
            (false, false) => new == old,
            (true, true) => match self {
                CallEquality::Any => true,
                CallEquality::ByMethod {
                    new_calls,
                    old_calls,
                } => {
                    let new_method = marker_child(new).and_then(|k| new_calls.get(k));
                    let old_method = marker_child(old).and_then(|k| old_calls.get(k));
                    matches!((new_method, old_method), (Some(a), Some(b)) if a == b)
                }
            },
            _ => false,
        }
    }
}
