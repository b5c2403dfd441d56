// Impact attribution and testing-target assembly
//
// Turns raw divergences into a ranked list of code locations to re-test:
// 1. Attribution: a divergence inside a syntactically changed method (or a
//    brand-new class) is a direct impact; otherwise the static call graph is
//    searched for changed ancestors and the divergence becomes an indirect
//    impact of each (or only the nearest); with no ancestor it is
//    unattributable.
// 2. Assembly: one target per changed method/class, even without
//    divergences, plus one per method in the unattributable bucket.
// 3. Scoring: weighted sum of local and non-local signals, sorted
//    descending with the target key as tie-break.
//
// Scientific Foundation:
// [4] Rothermel, G., & Harrold, M. J. (1997). A safe, efficient regression
//     test selection technique. ACM TOSEM, 6(2).
//
// [5] Santelices, R., Chittimalli, P. K., Apiwattanapong, T., Orso, A., &
//     Harrold, M. J. (2008). Test-suite augmentation for evolving software.
//     ASE. Changes matter where their effects propagate, not only where the
//     text differs.

mod attribution;
mod config;
mod scoring;
mod target;

pub use attribution::{Attributor, Classification, ImpactBuckets, IndirectImpact};
pub use config::{AttributionConfig, ImpactConfig, ReportMode};
pub use scoring::{score_target, ScoringWeights, SignalWeights};
pub use target::{assemble_targets, sort_targets, TargetKey, TargetOrigin, TestingTarget};
