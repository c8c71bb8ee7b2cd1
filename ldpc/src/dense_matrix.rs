use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenseError {
    #[error("Invalid matrix dimensions")]
    InvalidDimensions,
    #[error("Index out of bounds")]
    IndexOutOfBounds,
    #[error("Matrix is singular")]
    SingularMatrix,
}

const WORD_BITS: usize = 32;

/// Dense matrix over GF(2)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMod2Dense")]
pub struct Mod2Dense {
    n_rows: usize,
    n_cols: usize,
    /// Data stored as bits packed into u32s
    /// Each row is stored in consecutive u32s
    data: Vec<u32>,
    /// Number of u32s needed per row
    words_per_row: usize,
}

/// Persisted form of [`Mod2Dense`], checked before use.
#[derive(Deserialize)]
struct RawMod2Dense {
    n_rows: usize,
    n_cols: usize,
    data: Vec<u32>,
    words_per_row: usize,
}

impl TryFrom<RawMod2Dense> for Mod2Dense {
    type Error = DenseError;

    fn try_from(raw: RawMod2Dense) -> Result<Self, Self::Error> {
        let words_per_row = (raw.n_cols + WORD_BITS - 1) / WORD_BITS;
        let expected_len = raw.n_rows.checked_mul(words_per_row);
        if raw.words_per_row != words_per_row || expected_len != Some(raw.data.len()) {
            return Err(DenseError::InvalidDimensions);
        }

        // bits past the last column must stay clear
        let tail_bits = raw.n_cols % WORD_BITS;
        if tail_bits != 0 {
            let tail_mask = !0u32 << tail_bits;
            let dirty = raw
                .data
                .chunks(words_per_row)
                .any(|row| row[words_per_row - 1] & tail_mask != 0);
            if dirty {
                return Err(DenseError::IndexOutOfBounds);
            }
        }

        Ok(Self {
            n_rows: raw.n_rows,
            n_cols: raw.n_cols,
            data: raw.data,
            words_per_row,
        })
    }
}

impl Mod2Dense {
    /// Allocate an all-zero matrix. Either dimension may be zero.
    pub fn zeros(n_rows: usize, n_cols: usize) -> Self {
        let words_per_row = (n_cols + WORD_BITS - 1) / WORD_BITS;
        Self {
            n_rows,
            n_cols,
            data: vec![0u32; n_rows * words_per_row],
            words_per_row,
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut matrix = Self::zeros(n, n);
        for i in 0..n {
            matrix.set_bit(i, i);
        }
        matrix
    }

    /// Build a matrix from rows of 0/1 symbols. Any nonzero symbol is a one.
    pub fn from_rows<R: AsRef<[u8]>>(rows: &[R]) -> Result<Self, DenseError> {
        let n_cols = rows.first().map_or(0, |row| row.as_ref().len());
        let mut matrix = Self::zeros(rows.len(), n_cols);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != n_cols {
                return Err(DenseError::InvalidDimensions);
            }
            for (j, &bit) in row.iter().enumerate() {
                if bit != 0 {
                    matrix.set_bit(i, j);
                }
            }
        }
        Ok(matrix)
    }

    pub fn rows(&self) -> usize {
        self.n_rows
    }
    pub fn cols(&self) -> usize {
        self.n_cols
    }

    /// Out-of-range positions read as zero.
    pub fn get(&self, row: usize, col: usize) -> bool {
        if row >= self.n_rows || col >= self.n_cols {
            return false;
        }

        let word_index = row * self.words_per_row + col / WORD_BITS;
        let bit_index = col % WORD_BITS;

        (self.data[word_index] & (1u32 << bit_index)) != 0
    }

    pub fn set(&mut self, row: usize, col: usize, value: bool) -> Result<(), DenseError> {
        if row >= self.n_rows || col >= self.n_cols {
            return Err(DenseError::IndexOutOfBounds);
        }

        let word_index = row * self.words_per_row + col / WORD_BITS;
        let mask = 1u32 << (col % WORD_BITS);

        if value {
            self.data[word_index] |= mask;
        } else {
            self.data[word_index] &= !mask;
        }

        Ok(())
    }

    // caller guarantees bounds
    pub(crate) fn set_bit(&mut self, row: usize, col: usize) {
        let word_index = row * self.words_per_row + col / WORD_BITS;
        self.data[word_index] |= 1u32 << (col % WORD_BITS);
    }

    pub fn is_zero(&self) -> bool {
        self.data.iter().all(|&word| word == 0)
    }

    pub fn transpose(&self) -> Mod2Dense {
        let mut result = Mod2Dense::zeros(self.n_cols, self.n_rows);
        for i in 0..self.n_rows {
            for j in self.ones_in_row(i) {
                result.set_bit(j, i);
            }
        }
        result
    }

    /// Extract the submatrix at the given row and column indices, in the order given.
    pub fn submatrix(&self, rows: &[usize], cols: &[usize]) -> Result<Mod2Dense, DenseError> {
        if rows.iter().any(|&r| r >= self.n_rows) || cols.iter().any(|&c| c >= self.n_cols) {
            return Err(DenseError::IndexOutOfBounds);
        }

        let mut result = Mod2Dense::zeros(rows.len(), cols.len());
        for (i, &row) in rows.iter().enumerate() {
            for (j, &col) in cols.iter().enumerate() {
                if self.get(row, col) {
                    result.set_bit(i, j);
                }
            }
        }
        Ok(result)
    }

    /// Entry-wise XOR of two matrices of equal shape
    pub fn add(a: &Mod2Dense, b: &Mod2Dense) -> Result<Mod2Dense, DenseError> {
        if a.n_rows != b.n_rows || a.n_cols != b.n_cols {
            return Err(DenseError::InvalidDimensions);
        }

        let mut result = a.clone();
        for (dst, src) in result.data.iter_mut().zip(&b.data) {
            *dst ^= src;
        }
        Ok(result)
    }

    pub fn multiply(a: &Mod2Dense, b: &Mod2Dense) -> Result<Mod2Dense, DenseError> {
        if a.n_cols != b.n_rows {
            return Err(DenseError::InvalidDimensions);
        }

        let mut result = Mod2Dense::zeros(a.n_rows, b.n_cols);

        // Row i of the product is the XOR of the rows of b selected by row i of a
        for i in 0..a.n_rows {
            for k in a.ones_in_row(i) {
                let src = k * b.words_per_row;
                let dst = i * result.words_per_row;
                for w in 0..b.words_per_row {
                    result.data[dst + w] ^= b.data[src + w];
                }
            }
        }

        Ok(result)
    }

    /// Invert a square matrix by Gauss-Jordan elimination, using only row
    /// swaps and row additions.
    pub fn inverse(&self) -> Result<Mod2Dense, DenseError> {
        if self.n_rows != self.n_cols {
            return Err(DenseError::InvalidDimensions);
        }

        let n = self.n_rows;
        let mut a = self.clone();
        let mut inv = Mod2Dense::identity(n);

        for col in 0..n {
            let pivot_row = (col..n)
                .find(|&row| a.get(row, col))
                .ok_or(DenseError::SingularMatrix)?;

            a.swap_rows(col, pivot_row);
            inv.swap_rows(col, pivot_row);

            for row in 0..n {
                if row != col && a.get(row, col) {
                    a.add_row(row, col);
                    inv.add_row(row, col);
                }
            }
        }

        Ok(inv)
    }

    /// Bring the matrix to reduced row echelon form in place and return the
    /// pivot column of each nonzero row, in row order.
    pub fn reduce_row_echelon(&mut self) -> Vec<usize> {
        let mut pivots = Vec::new();
        let mut next_row = 0;

        for col in 0..self.n_cols {
            if next_row == self.n_rows {
                break;
            }
            let Some(pivot_row) = (next_row..self.n_rows).find(|&row| self.get(row, col)) else {
                continue;
            };

            self.swap_rows(next_row, pivot_row);
            for row in 0..self.n_rows {
                if row != next_row && self.get(row, col) {
                    self.add_row(row, next_row);
                }
            }

            pivots.push(col);
            next_row += 1;
        }

        pivots
    }

    /// Place `right` to the right of `left`
    pub fn hconcat(left: &Mod2Dense, right: &Mod2Dense) -> Result<Mod2Dense, DenseError> {
        if left.n_rows != right.n_rows {
            return Err(DenseError::InvalidDimensions);
        }

        let mut result = Mod2Dense::zeros(left.n_rows, left.n_cols + right.n_cols);
        for i in 0..left.n_rows {
            for j in left.ones_in_row(i) {
                result.set_bit(i, j);
            }
            for j in right.ones_in_row(i) {
                result.set_bit(i, left.n_cols + j);
            }
        }
        Ok(result)
    }

    /// Stack `bottom` below `top`
    pub fn vconcat(top: &Mod2Dense, bottom: &Mod2Dense) -> Result<Mod2Dense, DenseError> {
        if top.n_cols != bottom.n_cols {
            return Err(DenseError::InvalidDimensions);
        }

        let mut data = Vec::with_capacity(top.data.len() + bottom.data.len());
        data.extend_from_slice(&top.data);
        data.extend_from_slice(&bottom.data);

        Ok(Mod2Dense {
            n_rows: top.n_rows + bottom.n_rows,
            n_cols: top.n_cols,
            data,
            words_per_row: top.words_per_row,
        })
    }

    pub fn swap_rows(&mut self, row1: usize, row2: usize) {
        if row1 == row2 {
            return;
        }

        for word_offset in 0..self.words_per_row {
            let idx1 = row1 * self.words_per_row + word_offset;
            let idx2 = row2 * self.words_per_row + word_offset;
            self.data.swap(idx1, idx2);
        }
    }

    /// Add row2 to row1 (XOR in GF(2))
    fn add_row(&mut self, row1: usize, row2: usize) {
        for word_offset in 0..self.words_per_row {
            let idx1 = row1 * self.words_per_row + word_offset;
            let idx2 = row2 * self.words_per_row + word_offset;
            self.data[idx1] ^= self.data[idx2];
        }
    }

    /// Column indices of the ones in a row, ascending
    pub fn ones_in_row(&self, row: usize) -> impl Iterator<Item = usize> + '_ {
        let start = row * self.words_per_row;
        let words = &self.data[start..start + self.words_per_row];
        words.iter().enumerate().flat_map(|(w, &word)| {
            (0..WORD_BITS)
                .filter(move |bit| word & (1u32 << bit) != 0)
                .map(move |bit| w * WORD_BITS + bit)
        })
    }

    /// Get a row as a 0/1 vector
    pub fn get_row(&self, row: usize) -> Vec<u8> {
        (0..self.n_cols).map(|col| self.get(row, col) as u8).collect()
    }

    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        (0..self.n_rows).map(|row| self.get_row(row)).collect()
    }
}
