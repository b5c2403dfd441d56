//! Error types for the alignment, detection and assembly core.

use thiserror::Error;

/// Errors raised by the analysis core.
///
/// Upstream data problems (unparsable trace files, missing versions) belong to
/// the ingestion layer; the variants here cover malformed trees handed to the
/// core and internal invariant violations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ImpactError {
    /// Backtracking through a cost matrix reached a cell with no optimal predecessor.
    ///
    /// The edit-distance recurrence guarantees this cannot happen for
    /// well-formed input, so it indicates a bug in the alignment engine.
    #[error("alignment backtrack reached an unreachable cell at row {row}, column {column}")]
    Backtrack { row: usize, column: usize },

    /// A negative trace entry references a child that does not exist.
    #[error("call marker {marker} in {method} does not resolve to a child invocation")]
    DanglingCallMarker { method: String, marker: i64 },

    /// The number of call markers differs from the number of children.
    #[error("{method} has {markers} call markers but {children} child invocations")]
    CallMarkerCount {
        method: String,
        markers: usize,
        children: usize,
    },

    /// A tree without an entry-point invocation.
    #[error("invocation tree for version {version} has no entry point")]
    EmptyTree { version: String },

    /// A child's caller link does not point back at its parent.
    #[error("caller link of {method} does not match its position in the tree")]
    InconsistentCaller { method: String },

    /// Configuration values failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
