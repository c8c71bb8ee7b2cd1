use crate::LdpcError;
use rand::Rng;

/// Memoryless channel flipping each bit independently with a fixed probability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinarySymmetricChannel {
    error_probability: f64,
}

impl BinarySymmetricChannel {
    pub fn new(error_probability: f64) -> Result<Self, LdpcError> {
        if !(0.0..=1.0).contains(&error_probability) {
            return Err(LdpcError::InvalidProbability(error_probability));
        }
        Ok(Self { error_probability })
    }

    pub fn error_probability(&self) -> f64 {
        self.error_probability
    }

    /// Send a codeword through the channel. Symbols come out as 0 or 1.
    pub fn transmit<R: Rng + ?Sized>(&self, codeword: &[u8], rng: &mut R) -> Vec<u8> {
        codeword
            .iter()
            .map(|&bit| {
                let bit = (bit != 0) as u8;
                if rng.gen_bool(self.error_probability) {
                    bit ^ 1
                } else {
                    bit
                }
            })
            .collect()
    }
}

/// Number of positions where two words differ
pub fn hamming_distance(a: &[u8], b: &[u8]) -> usize {
    a.iter()
        .zip(b)
        .filter(|&(&x, &y)| (x != 0) != (y != 0))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_extreme_probabilities() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let word = [1u8, 0, 0, 1, 1];

        let clean = BinarySymmetricChannel::new(0.0).unwrap();
        assert_eq!(clean.transmit(&word, &mut rng), word.to_vec());

        let inverting = BinarySymmetricChannel::new(1.0).unwrap();
        assert_eq!(inverting.transmit(&word, &mut rng), vec![0, 1, 1, 0, 0]);
    }

    #[test]
    fn test_flip_rate() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let channel = BinarySymmetricChannel::new(0.2).unwrap();
        let word = vec![0u8; 10_000];

        let flips = hamming_distance(&word, &channel.transmit(&word, &mut rng));
        assert!((1_700..2_300).contains(&flips));
    }

    #[test]
    fn test_invalid_probability() {
        assert!(BinarySymmetricChannel::new(-0.1).is_err());
        assert!(BinarySymmetricChannel::new(f64::NAN).is_err());
    }
}
