// Per-version change-impact analysis
//
// Drives the whole pipeline for one program version:
// 1. Compare every (newer trace, older trace) pair with the divergence detector
// 2. Attribute the divergences to syntax changes through the static call graph
// 3. Assemble, score and rank the testing targets
//
// Trace pairs are independent; callers may run `compare_pair` on several
// threads and feed the results to `assemble_report`, since the syntax changes
// and call graph are only read.

mod report;

pub use report::{analyze_version, assemble_report, compare_pair, PairDivergences, TracePair, VersionReport};
