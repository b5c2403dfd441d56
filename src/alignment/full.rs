// Full alignment: cost matrix plus backtracking into divergent spans

use super::CallEquality;
use crate::error::ImpactError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A maximal run of non-matching alignment moves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DivergentSpan {
    /// New-side entries covered by the span, in sequence order.
    pub new_entries: Vec<i64>,
    /// Old-side entries covered by the span, in sequence order.
    pub old_entries: Vec<i64>,
}

/// Result of a full alignment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alignment {
    pub distance: usize,
    /// Divergent spans keyed by their end column in the new sequence
    /// (exclusive end offset), in index order.
    pub spans: BTreeMap<usize, DivergentSpan>,
}

impl Alignment {
    pub fn section_count(&self) -> usize {
        self.spans.len()
    }
}

/// Row-major `(rows x cols)` cost matrix.
struct CostMatrix {
    cols: usize,
    cells: Vec<usize>,
}

impl CostMatrix {
    fn get(&self, row: usize, col: usize) -> usize {
        self.cells[row * self.cols + col]
    }

    fn set(&mut self, row: usize, col: usize, value: usize) {
        self.cells[row * self.cols + col] = value;
    }
}

/// Open/closed accumulator for divergent spans while walking backwards.
#[derive(Default)]
struct SpanAccumulator {
    open: Option<(usize, DivergentSpan)>,
    closed: BTreeMap<usize, DivergentSpan>,
}

impl SpanAccumulator {
    /// Extend the open span (opening it at `column` if needed).
    ///
    /// Entries arrive in reverse order; `close` restores sequence order.
    fn extend(&mut self, column: usize, new: Option<i64>, old: Option<i64>) {
        let (_, span) = self.open.get_or_insert_with(|| (column, DivergentSpan::default()));
        span.new_entries.extend(new);
        span.old_entries.extend(old);
    }

    fn close(&mut self) {
        if let Some((end, mut span)) = self.open.take() {
            span.new_entries.reverse();
            span.old_entries.reverse();
            self.closed.insert(end, span);
        }
    }
}

/// Edit distance with traceback into divergent spans.
///
/// Rows index the old sequence, columns the new one. Backtracking starts at
/// the bottom-right cell and prefers, in order: the diagonal move when it is
/// optimal, an insertion (move left), a deletion (move up). Each diagonal
/// match closes the open span, which is recorded under its end column.
///
/// Memory is O(n * m); callers should bound trace length before calling.
///
/// # Errors
/// [`ImpactError::Backtrack`] if no optimal predecessor exists for a cell,
/// which the recurrence rules out for well-formed input.
pub fn full_alignment(
    new: &[i64],
    old: &[i64],
    calls: &CallEquality<'_>,
) -> Result<Alignment, ImpactError> {
    let rows = old.len() + 1;
    let cols = new.len() + 1;
    let mut matrix = CostMatrix {
        cols,
        cells: vec![0; rows * cols],
    };

    for col in 0..cols {
        matrix.set(0, col, col);
    }
    for row in 1..rows {
        matrix.set(row, 0, row);
        for col in 1..cols {
            let cost = usize::from(!calls.entries_match(new[col - 1], old[row - 1]));
            let best = (matrix.get(row - 1, col - 1) + cost)
                .min(matrix.get(row, col - 1) + 1)
                .min(matrix.get(row - 1, col) + 1);
            matrix.set(row, col, best);
        }
    }

    let distance = matrix.get(rows - 1, cols - 1);
    let mut spans = SpanAccumulator::default();
    let (mut row, mut col) = (rows - 1, cols - 1);

    while row > 0 || col > 0 {
        let here = matrix.get(row, col);

        if row > 0 && col > 0 {
            let is_match = calls.entries_match(new[col - 1], old[row - 1]);
            let cost = usize::from(!is_match);
            if matrix.get(row - 1, col - 1) + cost == here {
                if is_match {
                    spans.close();
                } else {
                    spans.extend(col, Some(new[col - 1]), Some(old[row - 1]));
                }
                row -= 1;
                col -= 1;
                continue;
            }
        }

        if col > 0 && matrix.get(row, col - 1) + 1 == here {
            spans.extend(col, Some(new[col - 1]), None);
            col -= 1;
        } else if row > 0 && matrix.get(row - 1, col) + 1 == here {
            spans.extend(col, None, Some(old[row - 1]));
            row -= 1;
        } else {
            return Err(ImpactError::Backtrack { row, column: col });
        }
    }
    spans.close();

    Ok(Alignment {
        distance,
        spans: spans.closed,
    })
}
