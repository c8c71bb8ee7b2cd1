//! LDPC code library
//!
//! Builds sparse parity-check matrices over GF(2), derives a systematic
//! generator matrix from them, encodes messages into codewords and decodes
//! noisy codewords with sum-product belief propagation.

pub mod channel;
pub mod config;
pub mod construction;
pub mod decoder;
pub mod dense_matrix;
pub mod generator;
pub mod ldpc;
pub mod mod2convert;
pub mod sparse_matrix;
pub mod tanner;

// Re-export main types
pub use channel::{hamming_distance, BinarySymmetricChannel};
pub use config::CodecConfig;
pub use construction::{array_code_parity, gallager_parity, ParityStrategy};
pub use decoder::{normalized_combine, parity_combine, BeliefPropagation, DecodeState};
pub use dense_matrix::{DenseError, Mod2Dense};
pub use generator::{Derivation, GeneratorMatrix, SystematicCode};
pub use ldpc::{CodeParameters, LdpcCode, ParitySource};
pub use sparse_matrix::{Mod2Sparse, SparseError};
pub use tanner::{EdgeBeliefs, TannerGraph};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LdpcError {
    #[error("Invalid code dimensions: n = {n}, k = {k}")]
    InvalidDimensions { n: usize, k: usize },
    #[error("n = {n} and k = {k} share no prime factor")]
    NoCommonPrimeFactor { n: usize, k: usize },
    #[error("Matrix is singular over GF(2)")]
    SingularMatrix,
    #[error("Expected {expected} symbols, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("Error probability {0} is outside [0, 1]")]
    InvalidProbability(f64),
    #[error("Sparse matrix error: {0}")]
    SparseMatrix(#[from] sparse_matrix::SparseError),
    #[error("Dense matrix error: {0}")]
    DenseMatrix(dense_matrix::DenseError),
    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

impl From<DenseError> for LdpcError {
    fn from(err: DenseError) -> Self {
        match err {
            DenseError::SingularMatrix => LdpcError::SingularMatrix,
            other => LdpcError::DenseMatrix(other),
        }
    }
}
