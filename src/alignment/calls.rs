// Method-call matching: insertion/deletion-only alignment of call sequences

use crate::error::ImpactError;

/// Pairing between the new and old child-call sequences of two invocations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallMatching {
    /// Number of insertions plus deletions.
    pub cost: usize,
    /// For each new-side position, the matched old-side position.
    pub new_to_old: Vec<Option<usize>>,
    /// Old-side positions left without a partner, ascending.
    pub unmatched_old: Vec<usize>,
}

impl CallMatching {
    fn identity(len: usize) -> Self {
        Self {
            cost: 0,
            new_to_old: (0..len).map(Some).collect(),
            unmatched_old: Vec::new(),
        }
    }

    pub fn is_identical(&self) -> bool {
        self.cost == 0
    }

    /// New-side positions without a partner, ascending.
    pub fn unmatched_new(&self) -> impl Iterator<Item = usize> + '_ {
        self.new_to_old
            .iter()
            .enumerate()
            .filter(|(_, old)| old.is_none())
            .map(|(new, _)| new)
    }

    /// Matched `(new, old)` position pairs, ascending.
    pub fn matched_pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.new_to_old
            .iter()
            .enumerate()
            .filter_map(|(new, old)| old.map(|old| (new, old)))
    }
}

/// Align two call sequences using only insertions and deletions.
///
/// Two different identifiers are never equal, so substitution is not an
/// allowed move. A zero-cost alignment means the sequences are identical and
/// the identity mapping is returned without building the matrix.
///
/// # Example
/// ```
/// use rastro::alignment::match_calls;
///
/// let matching = match_calls(&["a", "c", "b"], &["a", "b"]).unwrap();
/// assert_eq!(matching.cost, 1);
/// assert_eq!(matching.new_to_old, vec![Some(0), None, Some(1)]);
/// ```
pub fn match_calls<T: PartialEq>(new: &[T], old: &[T]) -> Result<CallMatching, ImpactError> {
    if new == old {
        return Ok(CallMatching::identity(new.len()));
    }

    let rows = old.len() + 1;
    let cols = new.len() + 1;
    let mut cost = vec![0usize; rows * cols];
    let at = |row: usize, col: usize| row * cols + col;

    for col in 0..cols {
        cost[at(0, col)] = col;
    }
    for row in 1..rows {
        cost[at(row, 0)] = row;
        for col in 1..cols {
            let mut best = (cost[at(row, col - 1)] + 1).min(cost[at(row - 1, col)] + 1);
            if new[col - 1] == old[row - 1] {
                best = best.min(cost[at(row - 1, col - 1)]);
            }
            cost[at(row, col)] = best;
        }
    }

    let mut new_to_old = vec![None; new.len()];
    let mut unmatched_old = Vec::new();
    let (mut row, mut col) = (rows - 1, cols - 1);

    while row > 0 || col > 0 {
        let here = cost[at(row, col)];
        if row > 0
            && col > 0
            && new[col - 1] == old[row - 1]
            && cost[at(row - 1, col - 1)] == here
        {
            new_to_old[col - 1] = Some(row - 1);
            row -= 1;
            col -= 1;
        } else if col > 0 && cost[at(row, col - 1)] + 1 == here {
            col -= 1;
        } else if row > 0 && cost[at(row - 1, col)] + 1 == here {
            unmatched_old.push(row - 1);
            row -= 1;
        } else {
            return Err(ImpactError::Backtrack { row, column: col });
        }
    }
    unmatched_old.reverse();

    Ok(CallMatching {
        cost: cost[at(rows - 1, cols - 1)],
        new_to_old,
        unmatched_old,
    })
}
