//! Comprehensive property-based tests for pre-commit hook
//!
//! Algebraic properties of the alignment engine and the call graph oracle,
//! checked with proptest. Designed to run in a few seconds as a quality gate.
//!
//! Core properties tested:
//! 1. Quick distance is symmetric and zero on identical input
//! 2. Full alignment agrees with the quick distance
//! 3. Divergent spans account for every unmatched entry
//! 4. Call matching never matches different identifiers
//! 5. Batched call-graph distances equal single queries
//! 6. Comparing a tree with itself finds nothing

mod utils;

use proptest::prelude::*;
use rastro::alignment::{full_alignment, match_calls, quick_distance, CallEquality};
use rastro::call_graph::CallGraph;
use rastro::divergence::{compare_trees, ComparisonMode, DetectorConfig};
use rastro::invocation::InvocationTree;
use utils::*;

/// Short traces over a small alphabet, so matches and call markers are common.
fn trace() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(-3i64..6, 0..24)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_quick_distance_symmetric(a in trace(), b in trace()) {
        let ab = quick_distance(&a, &b, 0, &CallEquality::Any);
        let ba = quick_distance(&b, &a, 0, &CallEquality::Any);
        prop_assert_eq!(ab, ba);
    }

    #[test]
    fn prop_quick_distance_identity(a in trace()) {
        prop_assert_eq!(quick_distance(&a, &a, 0, &CallEquality::Any), 0);
    }

    #[test]
    fn prop_quick_distance_bounded_by_longer_side(a in trace(), b in trace()) {
        let distance = quick_distance(&a, &b, 0, &CallEquality::Any);
        prop_assert!(distance <= a.len().max(b.len()));
        prop_assert!(distance >= a.len().abs_diff(b.len()));
    }

    #[test]
    fn prop_full_matches_quick(a in trace(), b in trace()) {
        let full = full_alignment(&a, &b, &CallEquality::Any).unwrap();
        prop_assert_eq!(full.distance, quick_distance(&a, &b, 0, &CallEquality::Any));
    }

    #[test]
    fn prop_spans_cover_unmatched_entries(a in trace(), b in trace()) {
        let full = full_alignment(&a, &b, &CallEquality::Any).unwrap();

        let new_in_spans: usize = full.spans.values().map(|s| s.new_entries.len()).sum();
        let old_in_spans: usize = full.spans.values().map(|s| s.old_entries.len()).sum();

        // What is not in a span was matched one-to-one.
        prop_assert_eq!(a.len() - new_in_spans, b.len() - old_in_spans);
        prop_assert_eq!(full.distance == 0, full.spans.is_empty());
        for (end, span) in &full.spans {
            prop_assert!(*end <= a.len());
            prop_assert!(!(span.new_entries.is_empty() && span.old_entries.is_empty()));
        }
    }

    #[test]
    fn prop_offset_past_both_ends_is_zero(a in trace(), b in trace()) {
        let offset = a.len().max(b.len());
        prop_assert_eq!(quick_distance(&a, &b, offset, &CallEquality::Any), 0);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_call_matching_pairs_equal_identifiers(
        new in prop::collection::vec("[a-d]", 0..10),
        old in prop::collection::vec("[a-d]", 0..10),
    ) {
        let matching = match_calls(&new, &old).unwrap();

        let pairs: Vec<_> = matching.matched_pairs().collect();
        for &(n, o) in &pairs {
            prop_assert_eq!(&new[n], &old[o]);
        }
        // Pairs never cross
        for window in pairs.windows(2) {
            prop_assert!(window[0].0 < window[1].0 && window[0].1 < window[1].1);
        }
        prop_assert_eq!(
            matching.cost,
            matching.unmatched_new().count() + matching.unmatched_old.len()
        );
    }

    #[test]
    fn prop_call_matching_identity(calls in prop::collection::vec("[a-d]", 0..10)) {
        let matching = match_calls(&calls, &calls).unwrap();
        prop_assert!(matching.is_identical());
        prop_assert_eq!(matching.matched_pairs().count(), calls.len());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_batched_distance_equals_single(
        edges in prop::collection::vec((0u8..8, 0u8..8), 0..20),
        source in 0u8..8,
    ) {
        let graph = CallGraph::from_edges(
            edges.iter().map(|(a, b)| (format!("m{}", a), format!("m{}", b))),
        );
        let names: Vec<String> = (0..8).map(|i| format!("m{}", i)).collect();
        let source = format!("m{}", source);

        let batched = graph.distance_to(&source, names.iter().map(String::as_str));
        for name in &names {
            prop_assert_eq!(batched[name.as_str()], graph.distance_to_caller(name, &source));
        }
    }

    #[test]
    fn prop_tree_equals_itself(price in 0i64..1000, discount in any::<bool>()) {
        let tree: InvocationTree = checkout_tree("v", price, discount);
        for mode in [ComparisonMode::Coverage, ComparisonMode::Distance, ComparisonMode::Full] {
            let divergences = compare_trees(&tree, &tree, &DetectorConfig::with_mode(mode)).unwrap();
            prop_assert!(divergences.is_empty());
        }
    }
}
