//! Edit-distance alignment between two assembled regions.
//!
//! The distance-only path keeps two DP rows. Traceback needs the full
//! `(len(A)+1) × (len(B)+1)` table, stored row-major in one allocation.

use serde::{Deserialize, Serialize};
use std::cmp::min;

/// Gap character used in traceback output.
pub const GAP: u8 = b'-';

/// Levenshtein distance with unit costs.
pub fn edit_distance(a: &[u8], b: &[u8]) -> usize {
    // Keep the shorter sequence along the row.
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    if short.is_empty() {
        return long.len();
    }

    let mut prev: Vec<usize> = (0..=short.len()).collect();
    let mut curr = vec![0usize; short.len() + 1];

    for (i, &la) in long.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &sb) in short.iter().enumerate() {
            let substitution = prev[j] + usize::from(la != sb);
            curr[j + 1] = min(min(prev[j + 1] + 1, curr[j] + 1), substitution);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[short.len()]
}

/// Percentage similarity over the compared length, `None` when nothing was
/// compared.
pub fn similarity_percent(distance: u64, compared_len: u64) -> Option<f64> {
    if compared_len == 0 {
        return None;
    }
    Some(100.0 * (1.0 - distance as f64 / compared_len as f64))
}

/// Two gapped strings of equal length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairwiseAlignment {
    pub first: String,
    pub second: String,
}

impl PairwiseAlignment {
    pub fn len(&self) -> usize {
        self.first.len()
    }

    pub fn is_empty(&self) -> bool {
        self.first.is_empty()
    }

    /// Columns where both strings carry the same base.
    pub fn matches(&self) -> usize {
        self.first
            .bytes()
            .zip(self.second.bytes())
            .filter(|(x, y)| x == y && *x != GAP)
            .count()
    }
}

/// Full edit-distance DP table.
#[derive(Debug, Clone)]
pub struct EditTable {
    cols: usize,
    cells: Vec<usize>,
}

impl EditTable {
    pub fn build(a: &[u8], b: &[u8]) -> Self {
        let rows = a.len() + 1;
        let cols = b.len() + 1;
        let mut cells = vec![0usize; rows * cols];

        for (i, cell) in cells.iter_mut().step_by(cols).enumerate() {
            *cell = i;
        }
        for (j, cell) in cells[..cols].iter_mut().enumerate() {
            *cell = j;
        }

        for i in 1..rows {
            for j in 1..cols {
                let up = cells[(i - 1) * cols + j] + 1;
                let left = cells[i * cols + j - 1] + 1;
                let diag = cells[(i - 1) * cols + j - 1] + usize::from(a[i - 1] != b[j - 1]);
                cells[i * cols + j] = min(min(up, left), diag);
            }
        }

        Self { cols, cells }
    }

    pub fn get(&self, i: usize, j: usize) -> usize {
        self.cells[i * self.cols + j]
    }

    pub fn distance(&self) -> usize {
        self.cells[self.cells.len() - 1]
    }

    /// Recovers one optimal alignment of `a` and `b`, the sequences the
    /// table was built from.
    ///
    /// Walking back from the bottom-right cell, a diagonal step is taken
    /// whenever it satisfies the recurrence, then a step that consumes `a`
    /// alone, then one that consumes `b` alone.
    pub fn traceback(&self, a: &[u8], b: &[u8]) -> PairwiseAlignment {
        let mut first = Vec::with_capacity(a.len() + b.len());
        let mut second = Vec::with_capacity(a.len() + b.len());
        let (mut i, mut j) = (a.len(), b.len());

        while i > 0 && j > 0 {
            let score = self.get(i, j);
            if score == self.get(i - 1, j - 1) + usize::from(a[i - 1] != b[j - 1]) {
                first.push(a[i - 1]);
                second.push(b[j - 1]);
                i -= 1;
                j -= 1;
            } else if score == self.get(i - 1, j) + 1 {
                first.push(a[i - 1]);
                second.push(GAP);
                i -= 1;
            } else {
                first.push(GAP);
                second.push(b[j - 1]);
                j -= 1;
            }
        }
        while i > 0 {
            first.push(a[i - 1]);
            second.push(GAP);
            i -= 1;
        }
        while j > 0 {
            first.push(GAP);
            second.push(b[j - 1]);
            j -= 1;
        }

        first.reverse();
        second.reverse();
        PairwiseAlignment {
            first: String::from_utf8_lossy(&first).into_owned(),
            second: String::from_utf8_lossy(&second).into_owned(),
        }
    }
}

/// Distance plus traceback in one call.
pub fn align(a: &[u8], b: &[u8]) -> (usize, PairwiseAlignment) {
    let table = EditTable::build(a, b);
    (table.distance(), table.traceback(a, b))
}
