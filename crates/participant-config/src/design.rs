//! Latin-square design for task counterbalancing.
//!
//! Row `i` of the cyclic square is the base sequence `0..n` rotated by `i`
//! positions, so every symbol appears once per row and once per column.
//! The transpose is also a Latin square and contributes `n` further orderings,
//! giving `2n` task orders in total.

use std::fmt;

use crate::assignment::TaskSetting;

/// An n x n Latin square of task indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatinSquare {
    n: usize,
    rows: Vec<Vec<usize>>,
}

impl LatinSquare {
    /// Build the cyclic square: `rows[i][j] = (j - i) mod n`.
    ///
    /// For n = 3 this gives `[0, 1, 2]`, `[2, 0, 1]`, `[1, 2, 0]`.
    /// Rows rotate right: the left-rotated square is symmetric, so its
    /// transpose would repeat the same n orderings.
    pub fn cyclic(n: usize) -> Self {
        let rows = (0..n)
            .map(|row| (0..n).map(|col| (col + n - row) % n).collect())
            .collect();
        Self { n, rows }
    }

    pub fn rows(&self) -> &[Vec<usize>] {
        &self.rows
    }

    /// Swap rows and columns.
    pub fn transpose(&self) -> Self {
        let rows = (0..self.n)
            .map(|col| (0..self.n).map(|row| self.rows[row][col]).collect())
            .collect();
        Self { n: self.n, rows }
    }

    /// Check that each symbol `0..n` occurs exactly once per row and column.
    pub fn is_latin(&self) -> bool {
        if self.rows.len() != self.n || self.rows.iter().any(|row| row.len() != self.n) {
            return false;
        }

        let line_ok = |cells: &mut dyn Iterator<Item = usize>| {
            let mut seen = vec![false; self.n];
            for v in cells {
                if v >= self.n || seen[v] {
                    return false;
                }
                seen[v] = true;
            }
            true
        };

        let rows_ok = self.rows.iter().all(|row| line_ok(&mut row.iter().copied()));
        let cols_ok =
            (0..self.n).all(|col| line_ok(&mut self.rows.iter().map(|row| row[col])));

        rows_ok && cols_ok
    }
}

impl fmt::Display for LatinSquare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Latin Square {}x{}", self.n, self.n)?;
        for (i, row) in self.rows.iter().enumerate() {
            write!(f, "  Row {}:", i)?;
            for v in row {
                write!(f, " {}", v)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Rows of the cyclic square followed by rows of its transpose.
pub fn task_orderings(n: usize) -> Vec<Vec<usize>> {
    let square = LatinSquare::cyclic(n);
    let transposed = square.transpose();
    square
        .rows
        .into_iter()
        .chain(transposed.rows)
        .collect()
}

/// The study's six task orders, mapped onto task settings.
pub fn study_task_orders() -> Vec<Vec<TaskSetting>> {
    task_orderings(TaskSetting::ALL.len())
        .into_iter()
        .map(|order| order.into_iter().filter_map(TaskSetting::from_index).collect())
        .collect()
}
