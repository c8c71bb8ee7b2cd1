use crate::{Derivation, LdpcError, ParityStrategy};
use serde::{Deserialize, Serialize};

pub const DEFAULT_ERROR_PROBABILITY: f64 = 0.01;
pub const DEFAULT_ITERATIONS: usize = 100;

/// Options for building an [`LdpcCode`](crate::LdpcCode).
///
/// Only `n` and `k` are required when deserializing:
///
/// ```
/// use ldpc_codec::{CodecConfig, ParityStrategy};
///
/// let config = CodecConfig::from_json(r#"{ "n": 12, "k": 6, "strategy": "array_code" }"#).unwrap();
/// assert_eq!(config.strategy, ParityStrategy::ArrayCode);
/// assert_eq!(config.iterations, 100);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// codeword length
    pub n: usize,
    /// message length
    pub k: usize,
    #[serde(default = "default_error_probability")]
    pub error_probability: f64,
    /// rounds run by `try_correct`
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    /// seed for construction randomness
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_strategy")]
    pub strategy: ParityStrategy,
    #[serde(default)]
    pub derivation: Derivation,
}

fn default_error_probability() -> f64 {
    DEFAULT_ERROR_PROBABILITY
}

fn default_iterations() -> usize {
    DEFAULT_ITERATIONS
}

fn default_strategy() -> ParityStrategy {
    ParityStrategy::ArrayCode
}

impl CodecConfig {
    pub fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            k,
            error_probability: DEFAULT_ERROR_PROBABILITY,
            iterations: DEFAULT_ITERATIONS,
            seed: 0,
            strategy: default_strategy(),
            derivation: Derivation::default(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, LdpcError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_error_probability(mut self, error_probability: f64) -> Self {
        self.error_probability = error_probability;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_strategy(mut self, strategy: ParityStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_derivation(mut self, derivation: Derivation) -> Self {
        self.derivation = derivation;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_defaults() {
        let config = CodecConfig::from_json(r#"{ "n": 10, "k": 2 }"#).unwrap();
        assert_eq!(config, CodecConfig::new(10, 2));
    }

    #[test]
    fn test_json_full() {
        let config = CodecConfig::from_json(
            r#"{
                "n": 20,
                "k": 4,
                "error_probability": 0.05,
                "iterations": 12,
                "seed": 7,
                "strategy": "gallager",
                "derivation": "pivoted"
            }"#,
        )
        .unwrap();

        assert_eq!(
            config,
            CodecConfig::new(20, 4)
                .with_error_probability(0.05)
                .with_iterations(12)
                .with_seed(7)
                .with_strategy(ParityStrategy::Gallager)
                .with_derivation(Derivation::Pivoted)
        );
    }

    #[test]
    fn test_json_errors() {
        assert!(matches!(
            CodecConfig::from_json(r#"{ "k": 2 }"#),
            Err(LdpcError::Config(_))
        ));
        assert!(CodecConfig::from_json(r#"{ "n": 4, "k": 2, "strategy": "turbo" }"#).is_err());
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = CodecConfig::new(12, 6).with_seed(3);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(CodecConfig::from_json(&json).unwrap(), config);
    }
}
