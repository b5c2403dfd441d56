// Divergence detection between two recorded invocation trees
//
// Compares an invocation from the newer version's trace with its counterpart
// in the older version's trace and reports every behavioral difference as a
// typed `Divergence`:
// - which methods were called (added, missing, replaced)
// - returned values and parameters
// - control flow (coverage counts, edit distance, divergent sections)
//
// Scientific Foundation:
// [3] Jin, W., Orso, A., & Xie, T. (2010). Automated behavioral regression
//     testing. ICST. Behavioral differences between versions expose
//     regressions that textual diffs alone cannot.
//
// The comparison mode is an explicit `DetectorConfig` value handed to the
// detector, never process-wide state.

mod config;
mod detector;
mod types;

pub use config::{ComparisonMode, DetectorConfig};
pub use detector::{compare_trees, DivergenceDetector};
pub use types::{
    Attribution, CoverageDivergence, Divergence, DivergenceSummary, MethodCallDivergence,
    MethodCallKind, MetricDivergence, MetricKind, ObjectValueDivergence, ValueKind,
};
