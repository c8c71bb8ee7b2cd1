use crate::{mod2convert, DenseError, LdpcError, Mod2Dense, Mod2Sparse};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// How the generator is derived from a parity-check matrix `H = [D | E]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Derivation {
    /// Use the columns as given; fails if `E` is singular.
    #[default]
    Fixed,
    /// Move a set of independent columns of `H` to the end first, so only a
    /// rank-deficient `H` fails.
    Pivoted,
}

impl Derivation {
    pub fn apply(self, parity: Mod2Sparse) -> Result<SystematicCode, LdpcError> {
        let (parity, column_order) = match self {
            Derivation::Fixed => {
                let order = (0..parity.cols()).collect();
                (parity, order)
            }
            Derivation::Pivoted => {
                let order = systematic_column_order(&parity)?;
                (parity.permute_columns(&order)?, order)
            }
        };
        let generator = GeneratorMatrix::from_parity_check(&parity)?;

        Ok(SystematicCode {
            parity,
            generator,
            column_order,
        })
    }
}

/// A parity-check matrix together with its systematic generator.
#[derive(Debug, Clone)]
pub struct SystematicCode {
    pub parity: Mod2Sparse,
    pub generator: GeneratorMatrix,
    /// Column `i` of `parity` is column `column_order[i]` of the matrix the
    /// derivation started from.
    pub column_order: Vec<usize>,
}

/// Systematic generator matrix `G = [I_k | F^T]` with `F = E^-1 D`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorMatrix {
    dense_gen: Mod2Dense,
    n_bits: usize,
    n_checks: usize,
}

impl GeneratorMatrix {
    /// Derive the generator from a `j x n` parity-check matrix split as
    /// `[D | E]`, `D` the first `n - j` columns and `E` the last `j`.
    pub fn from_parity_check(parity_check: &Mod2Sparse) -> Result<Self, LdpcError> {
        let m = parity_check.rows(); // number of checks
        let n = parity_check.cols(); // number of bits

        if m > n {
            return Err(DenseError::InvalidDimensions.into());
        }
        let k = n - m;

        let h = mod2convert::sparse_to_dense(parity_check)?;
        let rows: Vec<usize> = (0..m).collect();
        let d_cols: Vec<usize> = (0..k).collect();
        let e_cols: Vec<usize> = (k..n).collect();

        let d = h.submatrix(&rows, &d_cols)?;
        let e = h.submatrix(&rows, &e_cols)?;

        let e_inv = e.inverse().map_err(|err| {
            warn!("parity columns {}..{} are not invertible: {}", k, n, err);
            err
        })?;
        let f = Mod2Dense::multiply(&e_inv, &d)?;
        let dense_gen = Mod2Dense::hconcat(&Mod2Dense::identity(k), &f.transpose())?;

        debug!("derived {}x{} generator from {}x{} parity matrix", k, n, m, n);
        Ok(Self {
            dense_gen,
            n_bits: n,
            n_checks: m,
        })
    }

    pub fn matrix(&self) -> &Mod2Dense {
        &self.dense_gen
    }

    pub fn n_bits(&self) -> usize {
        self.n_bits
    }

    pub fn k_message_bits(&self) -> usize {
        self.n_bits - self.n_checks
    }

    /// Encode a message as `message * G`; any nonzero symbol is a 1.
    pub fn encode(&self, message: &[u8]) -> Result<Vec<u8>, LdpcError> {
        let k = self.k_message_bits();

        if message.len() != k {
            return Err(LdpcError::LengthMismatch {
                expected: k,
                actual: message.len(),
            });
        }

        let mut codeword = vec![0u8; self.n_bits];

        for (i, _) in message.iter().enumerate().filter(|&(_, &bit)| bit != 0) {
            // Add row i of generator matrix to codeword
            for col in self.dense_gen.ones_in_row(i) {
                codeword[col] ^= 1;
            }
        }

        Ok(codeword)
    }
}

/// Column order that puts the non-pivot columns of `parity` first and its
/// pivot columns (one per row, found by Gaussian elimination) last.
pub fn systematic_column_order(parity: &Mod2Sparse) -> Result<Vec<usize>, LdpcError> {
    let mut reduced = mod2convert::sparse_to_dense(parity)?;
    let pivots = reduced.reduce_row_echelon();

    if pivots.len() < parity.rows() {
        warn!(
            "parity matrix has rank {} but {} rows",
            pivots.len(),
            parity.rows()
        );
        return Err(LdpcError::SingularMatrix);
    }

    let mut is_pivot = vec![false; parity.cols()];
    for &col in &pivots {
        is_pivot[col] = true;
    }

    Ok((0..parity.cols())
        .filter(|&col| !is_pivot[col])
        .chain(pivots)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construction::{array_code_parity_with_prime, gallager_parity};
    use crate::mod2convert::{dense_to_sparse, sparse_to_dense};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn sparse(rows: &[&[u8]]) -> Mod2Sparse {
        dense_to_sparse(&Mod2Dense::from_rows(rows).unwrap()).unwrap()
    }

    fn assert_codewords_valid(parity: &Mod2Sparse, generator: &GeneratorMatrix) {
        let h = sparse_to_dense(parity).unwrap();
        let product = Mod2Dense::multiply(&h, &generator.matrix().transpose()).unwrap();
        assert!(product.is_zero());
    }

    #[test]
    fn test_generator_creation() {
        let h = array_code_parity_with_prime(6, 2, 2).unwrap();
        let gen = GeneratorMatrix::from_parity_check(&h).unwrap();

        assert_eq!(gen.n_bits(), 6);
        assert_eq!(gen.k_message_bits(), 2);
        assert_eq!(gen.matrix().rows(), 2);

        let rows: Vec<usize> = (0..2).collect();
        let identity = gen.matrix().submatrix(&rows, &rows).unwrap();
        assert_eq!(identity, Mod2Dense::identity(2));
        assert_codewords_valid(&h, &gen);
    }

    #[test]
    fn test_repetition_code_generator() {
        let h = sparse(&[&[1, 1, 0], &[0, 1, 1]]);
        let gen = GeneratorMatrix::from_parity_check(&h).unwrap();
        assert_eq!(gen.matrix().to_rows(), vec![vec![1, 1, 1]]);
        assert_eq!(gen.encode(&[1]).unwrap(), vec![1, 1, 1]);
        assert_eq!(gen.encode(&[0]).unwrap(), vec![0, 0, 0]);
    }

    #[test]
    fn test_gallager_fixed_partition_is_singular() {
        // base row 0 lies entirely in D, leaving a zero row in E
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let h = gallager_parity(10, 2, &mut rng).unwrap();
        assert!(matches!(
            GeneratorMatrix::from_parity_check(&h),
            Err(LdpcError::SingularMatrix)
        ));
    }

    #[test]
    fn test_pivoted_derivation_reorders_columns() {
        let h = sparse(&[&[1, 1, 0], &[1, 0, 0]]);
        assert!(matches!(
            Derivation::Fixed.apply(h.clone()),
            Err(LdpcError::SingularMatrix)
        ));

        let code = Derivation::Pivoted.apply(h).unwrap();
        assert_eq!(code.column_order, vec![2, 0, 1]);
        assert_eq!(
            sparse_to_dense(&code.parity).unwrap().to_rows(),
            vec![vec![0, 1, 1], vec![0, 1, 0]]
        );
        assert_eq!(code.generator.matrix().to_rows(), vec![vec![1, 0, 0]]);
        assert_codewords_valid(&code.parity, &code.generator);
    }

    #[test]
    fn test_pivoted_derivation_rank_deficient() {
        let h = sparse(&[&[1, 1, 0], &[1, 1, 0]]);
        assert!(matches!(
            Derivation::Pivoted.apply(h),
            Err(LdpcError::SingularMatrix)
        ));
    }

    #[test]
    fn test_encode_linearity() {
        let h = array_code_parity_with_prime(15, 6, 3).unwrap();
        let gen = GeneratorMatrix::from_parity_check(&h).unwrap();

        let message1 = [1u8, 0, 1, 0, 0, 1];
        let message2 = [0u8, 1, 1, 1, 0, 0];
        let combined: Vec<u8> = message1.iter().zip(&message2).map(|(a, b)| a ^ b).collect();

        let c1 = gen.encode(&message1).unwrap();
        let c2 = gen.encode(&message2).unwrap();
        let xor: Vec<u8> = c1.iter().zip(&c2).map(|(a, b)| a ^ b).collect();

        assert_eq!(gen.encode(&combined).unwrap(), xor);
        assert_eq!(&c1[..6], &message1);
    }

    #[test]
    fn test_encode_length_mismatch() {
        let h = array_code_parity_with_prime(6, 2, 2).unwrap();
        let gen = GeneratorMatrix::from_parity_check(&h).unwrap();
        assert!(matches!(
            gen.encode(&[1, 0, 1]),
            Err(LdpcError::LengthMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_more_checks_than_bits() {
        let h = Mod2Sparse::new(4, 3);
        assert!(matches!(
            GeneratorMatrix::from_parity_check(&h),
            Err(LdpcError::DenseMatrix(DenseError::InvalidDimensions))
        ));
    }

    #[test]
    fn test_no_checks_gives_identity() {
        let h = Mod2Sparse::new(0, 4);
        let gen = GeneratorMatrix::from_parity_check(&h).unwrap();
        assert_eq!(gen.matrix(), &Mod2Dense::identity(4));
    }
}
