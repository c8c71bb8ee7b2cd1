use crate::decoder::{BeliefPropagation, DecodeState};
use crate::generator::{Derivation, GeneratorMatrix};
use crate::tanner::{EdgeBeliefs, TannerGraph};
use crate::{CodecConfig, LdpcError, Mod2Sparse, ParityStrategy};
use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Dimensions of a code and the channel it is decoded for
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CodeParameters {
    /// codeword length
    pub n: usize,
    /// message length
    pub k: usize,
    pub error_probability: f64,
}

impl CodeParameters {
    pub fn new(n: usize, k: usize, error_probability: f64) -> Result<Self, LdpcError> {
        if k > n {
            return Err(LdpcError::InvalidDimensions { n, k });
        }
        if !(0.0..=1.0).contains(&error_probability) {
            return Err(LdpcError::InvalidProbability(error_probability));
        }
        Ok(Self {
            n,
            k,
            error_probability,
        })
    }

    /// Number of parity checks
    pub fn j(&self) -> usize {
        self.n - self.k
    }
}

/// Where the parity-check matrix of a code comes from
#[derive(Debug, Clone)]
pub enum ParitySource {
    /// A caller-provided `(n - k) x n` matrix
    Supplied(Mod2Sparse),
    /// Built with one of the construction strategies
    Generated(ParityStrategy),
}

/// Main LDPC code structure: parity-check and generator matrices plus a
/// belief propagation decoder, all fixed at construction.
#[derive(Debug, Clone)]
pub struct LdpcCode {
    params: CodeParameters,
    parity_check_matrix: Mod2Sparse,
    generator_matrix: GeneratorMatrix,
    column_order: Vec<usize>,
    decoder: BeliefPropagation,
    iterations: usize,
}

impl LdpcCode {
    /// Build a code from configuration, drawing construction randomness from
    /// a ChaCha8 generator seeded with `config.seed`.
    pub fn from_config(config: &CodecConfig) -> Result<Self, LdpcError> {
        let params = CodeParameters::new(config.n, config.k, config.error_probability)?;
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

        let mut code = Self::construct(
            params,
            ParitySource::Generated(config.strategy),
            config.derivation,
            &mut rng,
        )?;
        code.iterations = config.iterations;
        Ok(code)
    }

    /// Build a code around an existing parity-check matrix
    pub fn from_matrix(
        params: CodeParameters,
        parity_check_matrix: Mod2Sparse,
        derivation: Derivation,
    ) -> Result<Self, LdpcError> {
        // a supplied matrix needs no randomness
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        Self::construct(
            params,
            ParitySource::Supplied(parity_check_matrix),
            derivation,
            &mut rng,
        )
    }

    pub fn construct<R: Rng + ?Sized>(
        params: CodeParameters,
        source: ParitySource,
        derivation: Derivation,
        rng: &mut R,
    ) -> Result<Self, LdpcError> {
        let CodeParameters { n, k, .. } = params;

        let parity = match source {
            ParitySource::Supplied(matrix) => {
                if matrix.rows() != params.j() || matrix.cols() != n {
                    return Err(LdpcError::InvalidDimensions { n, k });
                }
                matrix
            }
            ParitySource::Generated(strategy) => strategy.build(n, k, rng)?,
        };

        let systematic = derivation.apply(parity)?;
        let graph = TannerGraph::new(&systematic.parity);
        debug!(
            "LDPC({}, {}) code ready: {} checks, {} edges",
            n,
            k,
            graph.checks(),
            graph.edge_count()
        );
        let decoder = BeliefPropagation::new(graph, params.error_probability)?;

        Ok(Self {
            params,
            parity_check_matrix: systematic.parity,
            generator_matrix: systematic.generator,
            column_order: systematic.column_order,
            decoder,
            iterations: crate::config::DEFAULT_ITERATIONS,
        })
    }

    /// Get code parameters
    pub fn params(&self) -> &CodeParameters {
        &self.params
    }
    pub fn n_bits(&self) -> usize {
        self.params.n
    }
    pub fn m_checks(&self) -> usize {
        self.params.j()
    }
    pub fn k_message_bits(&self) -> usize {
        self.params.k
    }
    pub fn rate(&self) -> f64 {
        if self.params.n == 0 {
            return 0.0;
        }
        (self.params.k as f64) / (self.params.n as f64)
    }
    pub fn error_probability(&self) -> f64 {
        self.params.error_probability
    }
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn parity_check_matrix(&self) -> &Mod2Sparse {
        &self.parity_check_matrix
    }

    pub fn generator_matrix(&self) -> &GeneratorMatrix {
        &self.generator_matrix
    }

    /// Column `i` of the code's parity matrix is column `column_order()[i]`
    /// of the matrix it was derived from; the identity unless pivoted.
    pub fn column_order(&self) -> &[usize] {
        &self.column_order
    }

    pub fn tanner_graph(&self) -> &TannerGraph {
        self.decoder.graph()
    }

    /// Encode `k` message bits to an `n` bit codeword
    pub fn encode(&self, message: &[u8]) -> Result<Vec<u8>, LdpcError> {
        self.generator_matrix.encode(message)
    }

    /// Posterior probability that each digit is 1 after `iterations` rounds
    pub fn decode(&self, received: &[u8], iterations: usize) -> Result<Vec<f64>, LdpcError> {
        self.decoder.decode(received, iterations)
    }

    /// [`decode`](Self::decode) with the configured iteration count
    pub fn try_correct(&self, received: &[u8]) -> Result<Vec<f64>, LdpcError> {
        self.decoder.decode(received, self.iterations)
    }

    pub fn init_beliefs(&self, received: &[u8]) -> Result<DecodeState, LdpcError> {
        self.decoder.init_beliefs(received)
    }

    pub fn step_variable_to_check(&self, state: &mut DecodeState) -> Result<(), LdpcError> {
        self.decoder.step_variable_to_check(state)
    }

    pub fn step_check_to_variable(&self, state: &mut DecodeState) -> Result<(), LdpcError> {
        self.decoder.step_check_to_variable(state)
    }

    pub fn marginalize(&self, state: &DecodeState) -> Result<Vec<f64>, LdpcError> {
        self.decoder.marginalize(state)
    }

    /// Edge beliefs laid out like the parity-check matrix
    pub fn belief_rows(&self, beliefs: &EdgeBeliefs) -> Vec<Vec<Option<f64>>> {
        beliefs.to_rows(self.decoder.graph())
    }

    /// Threshold posteriors at 0.5
    pub fn hard_decision(marginals: &[f64]) -> Vec<u8> {
        marginals.iter().map(|&p| (p > 0.5) as u8).collect()
    }

    /// Message bits of a codeword, which sit in its first `k` digits
    pub fn extract_message(&self, codeword: &[u8]) -> Result<Vec<u8>, LdpcError> {
        self.check_length(codeword)?;
        Ok(codeword[..self.params.k].to_vec())
    }

    /// Parity of each check over a word
    pub fn syndrome(&self, codeword: &[u8]) -> Result<Vec<u8>, LdpcError> {
        self.check_length(codeword)?;

        Ok((0..self.m_checks())
            .map(|check_row| {
                self.parity_check_matrix
                    .entries_in_row(check_row)
                    .fold(0u8, |sum, col| sum ^ (codeword[col] != 0) as u8)
            })
            .collect())
    }

    /// Number of parity checks a word violates
    pub fn verify_codeword(&self, codeword: &[u8]) -> Result<usize, LdpcError> {
        Ok(self
            .syndrome(codeword)?
            .into_iter()
            .filter(|&bit| bit != 0)
            .count())
    }

    fn check_length(&self, codeword: &[u8]) -> Result<(), LdpcError> {
        if codeword.len() != self.params.n {
            return Err(LdpcError::LengthMismatch {
                expected: self.params.n,
                actual: codeword.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mod2convert::{dense_to_sparse, sparse_to_dense};
    use crate::Mod2Dense;

    fn all_messages(k: usize) -> impl Iterator<Item = Vec<u8>> {
        (0..1usize << k).map(move |bits| (0..k).map(|i| ((bits >> i) & 1) as u8).collect())
    }

    #[test]
    fn test_ldpc_code_creation() {
        let code = LdpcCode::from_config(&CodecConfig::new(12, 6)).unwrap();

        assert_eq!(code.n_bits(), 12);
        assert_eq!(code.m_checks(), 6);
        assert_eq!(code.k_message_bits(), 6);
        assert_eq!(code.rate(), 0.5);
        assert_eq!(code.iterations(), 100);
        assert_eq!(code.parity_check_matrix().rows(), 6);
        assert_eq!(code.column_order(), (0..12).collect::<Vec<_>>().as_slice());
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(matches!(
            LdpcCode::from_config(&CodecConfig::new(5, 6)),
            Err(LdpcError::InvalidDimensions { n: 5, k: 6 })
        ));
        assert!(matches!(
            LdpcCode::from_config(&CodecConfig::new(10, 3)),
            Err(LdpcError::NoCommonPrimeFactor { n: 10, k: 3 })
        ));
        assert!(matches!(
            LdpcCode::from_config(&CodecConfig::new(10, 2).with_error_probability(1.5)),
            Err(LdpcError::InvalidProbability(_))
        ));
        assert!(matches!(
            LdpcCode::from_config(
                &CodecConfig::new(10, 2).with_strategy(ParityStrategy::Gallager)
            ),
            Err(LdpcError::SingularMatrix)
        ));
    }

    #[test]
    fn test_supplied_matrix_shape() {
        let params = CodeParameters::new(6, 2, 0.1).unwrap();
        let wrong = Mod2Sparse::new(3, 6);
        assert!(matches!(
            LdpcCode::from_matrix(params, wrong, Derivation::Fixed),
            Err(LdpcError::InvalidDimensions { n: 6, k: 2 })
        ));
    }

    #[test]
    fn test_verify_codeword() {
        let code = LdpcCode::from_config(&CodecConfig::new(15, 6)).unwrap();

        let zero_codeword = vec![0u8; 15];
        assert_eq!(code.verify_codeword(&zero_codeword).unwrap(), 0);

        assert!(matches!(
            code.verify_codeword(&[0u8; 14]),
            Err(LdpcError::LengthMismatch {
                expected: 15,
                actual: 14
            })
        ));

        // every column takes part in some check, so one flip is always seen
        for flipped in 0..15 {
            let mut word = code.encode(&[1, 0, 1, 1, 0, 0]).unwrap();
            word[flipped] ^= 1;
            assert!(code.verify_codeword(&word).unwrap() > 0);
        }
    }

    #[test]
    fn test_reproducibility() {
        let config = CodecConfig::new(30, 12).with_seed(7777);
        let code1 = LdpcCode::from_config(&config).unwrap();
        let code2 = LdpcCode::from_config(&config).unwrap();

        assert_eq!(code1.parity_check_matrix(), code2.parity_check_matrix());
        assert_eq!(code1.generator_matrix(), code2.generator_matrix());
    }

    #[test]
    fn test_encoding() {
        let code = LdpcCode::from_config(&CodecConfig::new(12, 6).with_seed(1)).unwrap();

        for message in all_messages(6) {
            let codeword = code.encode(&message).unwrap();
            assert_eq!(codeword.len(), 12);
            assert_eq!(code.verify_codeword(&codeword).unwrap(), 0);
            assert_eq!(code.extract_message(&codeword).unwrap(), message);
        }

        assert!(matches!(
            code.encode(&[1, 0]),
            Err(LdpcError::LengthMismatch { expected: 6, .. })
        ));
    }

    #[test]
    fn test_decomposed_steps_match_decode() {
        let code = LdpcCode::from_config(&CodecConfig::new(12, 6).with_error_probability(0.1))
            .unwrap();
        let mut received = code.encode(&[0, 1, 1, 0, 1, 0]).unwrap();
        received[3] ^= 1;

        let mut state = code.init_beliefs(&received).unwrap();
        for _ in 0..5 {
            code.step_variable_to_check(&mut state).unwrap();
            code.step_check_to_variable(&mut state).unwrap();
        }

        assert_eq!(
            code.marginalize(&state).unwrap(),
            code.decode(&received, 5).unwrap()
        );
        assert_eq!(state.iterations(), 5);

        // belief layout follows the parity matrix
        let rows = code.belief_rows(state.check_messages());
        let h = sparse_to_dense(code.parity_check_matrix()).unwrap();
        for (check, row) in rows.iter().enumerate() {
            for (digit, belief) in row.iter().enumerate() {
                assert_eq!(belief.is_some(), h.get(check, digit));
                if let Some(p) = belief {
                    assert!((0.0..=1.0).contains(p));
                }
            }
        }
    }

    #[test]
    fn test_try_correct_uses_configured_iterations() {
        let config = CodecConfig::new(12, 6).with_iterations(3);
        let code = LdpcCode::from_config(&config).unwrap();
        let mut received = code.encode(&[1, 1, 0, 0, 1, 0]).unwrap();
        received[0] ^= 1;

        assert_eq!(
            code.try_correct(&received).unwrap(),
            code.decode(&received, 3).unwrap()
        );
    }

    #[test]
    fn test_supplied_repetition_code() {
        let h = Mod2Dense::from_rows(&[[1u8, 1, 0], [0, 1, 1]]).unwrap();
        let params = CodeParameters::new(3, 1, 0.1).unwrap();
        let code =
            LdpcCode::from_matrix(params, dense_to_sparse(&h).unwrap(), Derivation::Fixed).unwrap();

        assert_eq!(code.encode(&[1]).unwrap(), vec![1, 1, 1]);
        let marginals = code.decode(&[1, 0, 1], 10).unwrap();
        assert_eq!(LdpcCode::hard_decision(&marginals), vec![1, 1, 1]);
        assert_eq!(code.syndrome(&[1, 0, 1]).unwrap(), vec![1, 1]);
    }

    #[test]
    fn test_hard_decision_threshold() {
        assert_eq!(
            LdpcCode::hard_decision(&[0.0, 0.5, 0.500001, 1.0]),
            vec![0, 0, 1, 1]
        );
    }
}
