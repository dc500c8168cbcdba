//! Categorical sampling shared by every weighted choice in the simulation.

use crate::{Error, Result};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

/// Maximum distance of a distribution's total from 1.0
pub const ROW_SUM_TOLERANCE: f64 = 1e-6;

/// A validated probability distribution over `0..len` with a pre-built sampler.
///
/// Zero-weight entries are never drawn, so rows like `[1, 0, 0, 0]` are
/// deterministic.
#[derive(Debug, Clone)]
pub struct Categorical {
    weights: Vec<f64>,
    index: WeightedIndex<f64>,
}

impl Categorical {
    /// Build from weights that must already form a distribution
    pub fn new(weights: Vec<f64>) -> Result<Self> {
        if weights.is_empty() {
            return Err(Error::Validation("Distribution has no outcomes".to_string()));
        }
        if let Some(bad) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(Error::Validation(format!(
                "Distribution weight {} is not a finite non-negative number",
                bad
            )));
        }

        let total: f64 = weights.iter().sum();
        if (total - 1.0).abs() > ROW_SUM_TOLERANCE {
            return Err(Error::Validation(format!(
                "Distribution {:?} sums to {}, expected 1",
                weights, total
            )));
        }

        let index = WeightedIndex::new(&weights)
            .map_err(|e| Error::Validation(format!("Invalid distribution {:?}: {}", weights, e)))?;

        Ok(Self { weights, index })
    }

    /// Rescale arbitrary non-negative weights to sum to 1 and build from them
    pub fn normalized(weights: Vec<f64>) -> Result<Self> {
        let total: f64 = weights.iter().filter(|w| w.is_finite()).sum();
        if total <= 0.0 || !total.is_finite() {
            return Err(Error::Validation(format!(
                "Cannot normalize weights {:?} with total {}",
                weights, total
            )));
        }
        Self::new(weights.into_iter().map(|w| w / total).collect())
    }

    pub fn uniform(len: usize) -> Result<Self> {
        Self::normalized(vec![1.0; len])
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        self.index.sample(rng)
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

impl PartialEq for Categorical {
    fn eq(&self, other: &Self) -> bool {
        self.weights == other.weights
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_deterministic_row_always_picks_certain_outcome() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let dist = Categorical::new(vec![0.0, 0.0, 1.0, 0.0]).unwrap();
        for _ in 0..1000 {
            assert_eq!(dist.sample(&mut rng), 2);
        }
    }

    #[test]
    fn test_rejects_unnormalized_weights() {
        assert!(Categorical::new(vec![0.5, 0.4]).is_err());
        assert!(Categorical::new(vec![1.5, -0.5]).is_err());
        assert!(Categorical::new(vec![f64::NAN, 1.0]).is_err());
        assert!(Categorical::new(vec![]).is_err());
        assert!(Categorical::new(vec![0.3, 0.7 + 1e-9]).is_ok());
    }

    #[test]
    fn test_normalized_rescales() {
        let dist = Categorical::normalized(vec![2.0, 6.0]).unwrap();
        assert_eq!(dist.weights(), &[0.25, 0.75]);
        assert!(Categorical::normalized(vec![0.0, 0.0]).is_err());
    }

    #[test]
    fn test_frequencies_follow_weights() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let dist = Categorical::new(vec![0.9, 0.1, 0.0]).unwrap();
        let mut counts = [0usize; 3];
        for _ in 0..10_000 {
            counts[dist.sample(&mut rng)] += 1;
        }
        assert_eq!(counts[2], 0);
        assert!(counts[0] > 8_500 && counts[0] < 9_500, "counts: {:?}", counts);
    }

    #[test]
    fn test_same_seed_same_draws() {
        let dist = Categorical::uniform(4).unwrap();
        let mut a = ChaCha8Rng::seed_from_u64(3);
        let mut b = ChaCha8Rng::seed_from_u64(3);
        let draws_a: Vec<usize> = (0..50).map(|_| dist.sample(&mut a)).collect();
        let draws_b: Vec<usize> = (0..50).map(|_| dist.sample(&mut b)).collect();
        assert_eq!(draws_a, draws_b);
    }
}
