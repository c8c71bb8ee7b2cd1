//! Parity-check matrix constructions.
//!
//! Two independent ways to build a `(n - k) x n` parity-check matrix:
//!
//! * [`gallager_parity`]: `floor(n / k)` base rows of `k` contiguous ones,
//!   followed by batches of the same base rows under random column
//!   permutations.
//! * [`array_code_parity`]: a quasi-cyclic array code made of `p x p` blocks
//!   that are powers of the cyclic shift matrix, for a prime `p` dividing both
//!   `n` and `k`. Its last `n - k` columns always form an invertible block.

use crate::{mod2convert, LdpcError, Mod2Dense, Mod2Sparse};
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParityStrategy {
    /// Randomized block construction
    Gallager,
    /// Algebraic quasi-cyclic construction
    ArrayCode,
}

impl ParityStrategy {
    pub fn build<R: Rng + ?Sized>(
        self,
        n: usize,
        k: usize,
        rng: &mut R,
    ) -> Result<Mod2Sparse, LdpcError> {
        match self {
            ParityStrategy::Gallager => gallager_parity(n, k, rng),
            ParityStrategy::ArrayCode => array_code_parity(n, k, rng),
        }
    }
}

/// Randomized block construction.
///
/// Row `i < floor(n / k)` holds ones at columns `i*k .. (i+1)*k`. Further rows
/// are the base rows with their columns moved by a fresh uniformly random
/// permutation per batch, the last batch truncated at `n - k` rows.
pub fn gallager_parity<R: Rng + ?Sized>(
    n: usize,
    k: usize,
    rng: &mut R,
) -> Result<Mod2Sparse, LdpcError> {
    if k == 0 || k > n {
        return Err(LdpcError::InvalidDimensions { n, k });
    }

    let j = n - k;
    let chunk = n / k;
    let mut h = Mod2Sparse::new(j, n);

    let base_rows = chunk.min(j);
    for i in 0..base_rows {
        for col in i * k..(i + 1) * k {
            h.insert(i, col)?;
        }
    }

    let mut row = base_rows;
    let mut batches = 0;
    while row < j {
        let mut perm: Vec<usize> = (0..n).collect();
        perm.shuffle(rng);

        for base in 0..chunk {
            if row == j {
                break;
            }
            // Column c of the base row lands at column perm[c]
            for col in base * k..(base + 1) * k {
                h.insert(row, perm[col])?;
            }
            row += 1;
        }
        batches += 1;
    }

    debug!(
        "gallager parity matrix {}x{}: {} base rows, {} permuted batches",
        j, n, base_rows, batches
    );
    Ok(h)
}

/// Quasi-cyclic array code construction for a uniformly chosen prime factor
/// common to `n` and `k`.
pub fn array_code_parity<R: Rng + ?Sized>(
    n: usize,
    k: usize,
    rng: &mut R,
) -> Result<Mod2Sparse, LdpcError> {
    if k > n {
        return Err(LdpcError::InvalidDimensions { n, k });
    }

    let primes = common_prime_factors(n, k);
    let &p = primes
        .choose(rng)
        .ok_or(LdpcError::NoCommonPrimeFactor { n, k })?;

    debug!(
        "array code n = {}, k = {}: prime {} chosen from {:?}",
        n, k, p, primes
    );
    array_code_parity_with_prime(n, k, p)
}

/// Quasi-cyclic array code construction for a given prime `p` dividing `n` and `k`.
///
/// With `ic = n / p` block columns, `kc = k / p` message block columns and
/// `jc = (n - k) / p` block rows, block `(r, c)` is:
///
/// * `alpha^(r*c mod p)` for a message block column `c < kc`,
/// * `I` on the diagonal of the parity part (`c - kc == r`),
/// * `alpha^r` just left of that diagonal (`c - kc == r - 1`),
/// * `Z` elsewhere.
///
/// Block row 0 forms the first group (all identities in the message part),
/// block rows `1..jc` the second. The parity part is block lower bidiagonal
/// with identity diagonal, so it is invertible for every `p`.
pub fn array_code_parity_with_prime(
    n: usize,
    k: usize,
    p: usize,
) -> Result<Mod2Sparse, LdpcError> {
    if k > n {
        return Err(LdpcError::InvalidDimensions { n, k });
    }
    if !is_prime(p) || n % p != 0 || k % p != 0 {
        return Err(LdpcError::NoCommonPrimeFactor { n, k });
    }

    let ic = n / p;
    let jc = (n - k) / p;
    let kc = k / p;

    let zero = Mod2Dense::zeros(p, p);
    let alpha = cyclic_shift(p);

    // alpha^0 .. alpha^(p-1); alpha^p is the identity again
    let mut powers = vec![Mod2Dense::identity(p)];
    for e in 1..p {
        powers.push(Mod2Dense::multiply(&powers[e - 1], &alpha)?);
    }

    // power of alpha at block (r, c), None for the zero block
    let exponent = |r: usize, c: usize| -> Option<usize> {
        if c < kc {
            return Some((r * c) % p);
        }
        let s = c - kc;
        if s == r {
            Some(0)
        } else if s + 1 == r {
            Some(r % p)
        } else {
            None
        }
    };

    let block_row = |r: usize| -> Result<Mod2Dense, LdpcError> {
        let mut row = Mod2Dense::zeros(p, 0);
        for c in 0..ic {
            let block = match exponent(r, c) {
                Some(e) => &powers[e],
                None => &zero,
            };
            row = Mod2Dense::hconcat(&row, block)?;
        }
        Ok(row)
    };

    let first_group = if jc > 0 {
        block_row(0)?
    } else {
        Mod2Dense::zeros(0, n)
    };
    let mut second_group = Mod2Dense::zeros(0, n);
    for r in 1..jc {
        second_group = Mod2Dense::vconcat(&second_group, &block_row(r)?)?;
    }

    let h = Mod2Dense::vconcat(&first_group, &second_group)?;
    debug!(
        "array code parity matrix {}x{} with {}x{} blocks of size {}",
        h.rows(),
        h.cols(),
        jc,
        ic,
        p
    );
    mod2convert::dense_to_sparse(&h)
}

/// The `p x p` permutation matrix moving basis vector `i + 1` to `i`, wrapping around.
pub fn cyclic_shift(p: usize) -> Mod2Dense {
    let mut alpha = Mod2Dense::zeros(p, p);
    for i in 0..p {
        alpha.set_bit(i, (i + 1) % p);
    }
    alpha
}

/// Distinct primes dividing both `n` and `k`, ascending.
pub fn common_prime_factors(n: usize, k: usize) -> Vec<usize> {
    prime_factors(gcd(n, k))
}

fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

fn prime_factors(mut value: usize) -> Vec<usize> {
    let mut factors = Vec::new();
    let mut candidate = 2;
    while candidate * candidate <= value {
        if value % candidate == 0 {
            factors.push(candidate);
            while value % candidate == 0 {
                value /= candidate;
            }
        }
        candidate += 1;
    }
    if value > 1 {
        factors.push(value);
    }
    factors
}

fn is_prime(value: usize) -> bool {
    value >= 2 && (2..).take_while(|d| d * d <= value).all(|d| value % d != 0)
}
