use serde::{Deserialize, Serialize};

use crate::{Cell, CellUpdate};

/// Fully populated N×N matrix of cells, indexed `[row][col]`.
///
/// Serializes as a plain nested array so clients can index it directly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grid {
    rows: Vec<Vec<Cell>>,
}

impl Grid {
    /// N×N grid of empty cells (no value, no owner, `last_write_at = 0`).
    pub fn new(size: usize) -> Self {
        Self {
            rows: vec![vec![Cell::default(); size]; size],
        }
    }

    pub fn size(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Map signed wire coordinates to an in-bounds index pair.
    pub fn checked_index(&self, row: i64, col: i64) -> Option<(usize, usize)> {
        let n = self.size();
        let r = usize::try_from(row).ok().filter(|r| *r < n)?;
        let c = usize::try_from(col).ok().filter(|c| *c < n)?;
        Some((r, c))
    }

    /// Unconditional overwrite. Bounds are the caller's job; an out-of-range
    /// index is ignored rather than growing the grid.
    pub fn set(&mut self, row: usize, col: usize, cell: Cell) {
        debug_assert!(row < self.size() && col < self.size());
        if let Some(slot) = self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            *slot = cell;
        }
    }

    pub fn apply(&mut self, update: &CellUpdate) {
        self.set(update.row, update.col, update.to_cell());
    }
}
