//! Rastro - Behavioral change-impact analysis for regression test selection
//!
//! This library compares recorded execution traces of two program versions,
//! reports every behavioral divergence between them, attributes each one to
//! the syntax changes that most plausibly caused it, and ranks the changed
//! code into prioritized testing targets.
//!
//! Pipeline for one version:
//! 1. [`invocation`]: recorded call trees with instruction traces
//! 2. [`alignment`]: edit distance, divergent spans and call matching
//! 3. [`divergence`]: recursive comparison of paired invocations
//! 4. [`call_graph`]: shortest call-chain distances to changed ancestors
//! 5. [`impact`]: attribution, scoring and target assembly
//! 6. [`analysis`]: end-to-end orchestration and text report

pub mod alignment;
pub mod analysis;
pub mod call_graph;
pub mod divergence;
pub mod error;
pub mod impact;
pub mod invocation;
pub mod syntax;

pub use error::ImpactError;
