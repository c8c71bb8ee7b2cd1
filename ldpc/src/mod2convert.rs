use crate::{LdpcError, Mod2Dense, Mod2Sparse};

/// Convert a GF(2) matrix from sparse to dense form
pub fn sparse_to_dense(sparse: &Mod2Sparse) -> Result<Mod2Dense, LdpcError> {
    let mut dense = Mod2Dense::zeros(sparse.rows(), sparse.cols());

    for (row, col) in sparse.iter() {
        dense.set(row, col, true)?;
    }

    Ok(dense)
}

/// Convert a GF(2) matrix from dense to sparse form
pub fn dense_to_sparse(dense: &Mod2Dense) -> Result<Mod2Sparse, LdpcError> {
    let mut sparse = Mod2Sparse::new(dense.rows(), dense.cols());

    for row in 0..dense.rows() {
        for col in dense.ones_in_row(row) {
            sparse.insert(row, col)?;
        }
    }

    Ok(sparse)
}
