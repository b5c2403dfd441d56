#![no_main]

use libfuzzer_sys::fuzz_target;
use rastro::alignment::{full_alignment, quick_distance, CallEquality};

fuzz_target!(|data: &[u8]| {
    // First half is the new trace, second half the old one; bytes above 200
    // become call markers.
    let to_trace = |bytes: &[u8]| -> Vec<i64> {
        bytes
            .iter()
            .map(|&b| if b > 200 { -i64::from(b - 200) } else { i64::from(b) })
            .collect()
    };
    let (new, old) = data.split_at(data.len() / 2);
    let (new, old) = (to_trace(new), to_trace(old));

    // Backtracking must never fail and both variants must agree
    let full = full_alignment(&new, &old, &CallEquality::Any).expect("backtrack failed");
    assert_eq!(full.distance, quick_distance(&new, &old, 0, &CallEquality::Any));
});
