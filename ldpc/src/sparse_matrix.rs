use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SparseError {
    #[error("Invalid matrix dimensions")]
    InvalidDimensions,
    #[error("Row or column index out of bounds")]
    IndexOutOfBounds,
    #[error("Row and column lists disagree")]
    InconsistentEntries,
}

/// Sparse matrix over GF(2), holding only the positions of its ones.
///
/// Row and column lists are kept sorted so iteration is always in index order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMod2Sparse")]
pub struct Mod2Sparse {
    n_rows: usize,
    n_cols: usize,
    row_entries: Vec<Vec<usize>>, // For each row, list of column indices
    col_entries: Vec<Vec<usize>>, // For each col, list of row indices
}

/// Persisted form of [`Mod2Sparse`], checked before use.
#[derive(Deserialize)]
struct RawMod2Sparse {
    n_rows: usize,
    n_cols: usize,
    row_entries: Vec<Vec<usize>>,
    col_entries: Vec<Vec<usize>>,
}

fn sorted_below(entries: &[usize], bound: usize) -> bool {
    entries.windows(2).all(|pair| pair[0] < pair[1])
        && entries.last().map_or(true, |&last| last < bound)
}

impl TryFrom<RawMod2Sparse> for Mod2Sparse {
    type Error = SparseError;

    fn try_from(raw: RawMod2Sparse) -> Result<Self, Self::Error> {
        if raw.row_entries.len() != raw.n_rows || raw.col_entries.len() != raw.n_cols {
            return Err(SparseError::InvalidDimensions);
        }
        if !raw.row_entries.iter().all(|cols| sorted_below(cols, raw.n_cols))
            || !raw.col_entries.iter().all(|rows| sorted_below(rows, raw.n_rows))
        {
            return Err(SparseError::IndexOutOfBounds);
        }

        // rebuild the column lists from the rows; they must match exactly
        let mut matrix = Mod2Sparse::new(raw.n_rows, raw.n_cols);
        for (row, cols) in raw.row_entries.iter().enumerate() {
            for &col in cols {
                matrix.insert(row, col)?;
            }
        }
        if matrix.col_entries != raw.col_entries {
            return Err(SparseError::InconsistentEntries);
        }

        Ok(matrix)
    }
}

impl Mod2Sparse {
    /// Allocate an all-zero sparse matrix. Either dimension may be zero.
    pub fn new(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            row_entries: vec![Vec::new(); n_rows],
            col_entries: vec![Vec::new(); n_cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.n_rows
    }
    pub fn cols(&self) -> usize {
        self.n_cols
    }

    /// Whether the entry at (row, col) is a one
    pub fn find(&self, row: usize, col: usize) -> bool {
        row < self.n_rows && self.row_entries[row].binary_search(&col).is_ok()
    }

    /// Set (row, col) to one. Inserting an existing entry is a no-op.
    pub fn insert(&mut self, row: usize, col: usize) -> Result<(), SparseError> {
        if row >= self.n_rows || col >= self.n_cols {
            return Err(SparseError::IndexOutOfBounds);
        }

        let Err(row_pos) = self.row_entries[row].binary_search(&col) else {
            return Ok(()); // Already exists
        };
        self.row_entries[row].insert(row_pos, col);

        let col_pos = self.col_entries[col]
            .binary_search(&row)
            .unwrap_or_else(|x| x);
        self.col_entries[col].insert(col_pos, row);

        Ok(())
    }

    /// Column indices of the ones in a row, ascending
    pub fn entries_in_row(&self, row: usize) -> impl Iterator<Item = usize> + '_ {
        self.row_entries[row].iter().copied()
    }

    /// Row indices of the ones in a column, ascending
    pub fn entries_in_col(&self, col: usize) -> impl Iterator<Item = usize> + '_ {
        self.col_entries[col].iter().copied()
    }

    /// All ones as (row, col) pairs in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.row_entries
            .iter()
            .enumerate()
            .flat_map(|(row, cols)| cols.iter().map(move |&col| (row, col)))
    }

    /// Get weight (number of 1s) in a row
    pub fn row_weight(&self, row: usize) -> usize {
        self.row_entries[row].len()
    }

    /// Get weight (number of 1s) in a column
    pub fn col_weight(&self, col: usize) -> usize {
        self.col_entries[col].len()
    }

    /// Reorder columns so that column `i` of the result is column `order[i]` of `self`.
    pub fn permute_columns(&self, order: &[usize]) -> Result<Mod2Sparse, SparseError> {
        if order.len() != self.n_cols {
            return Err(SparseError::InvalidDimensions);
        }

        let mut result = Mod2Sparse::new(self.n_rows, self.n_cols);
        for (new_col, &old_col) in order.iter().enumerate() {
            if old_col >= self.n_cols {
                return Err(SparseError::IndexOutOfBounds);
            }
            for row in self.entries_in_col(old_col) {
                result.insert(row, new_col)?;
            }
        }
        Ok(result)
    }
}
