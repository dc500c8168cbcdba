//! Reference transition-matrix rules.

use crate::MatrixRule;
use marchent_core::{Categorical, Direction, Error, MoveMatrix, Result, TransitionMatrix};
use rand::{Rng, RngCore};

/// Entropy blending: each entry moves toward uniform noise,
/// `w' = (1 - strength) * w + strength * u` with `u ~ U[0, 1)`, and each row
/// is renormalized. Works for both move and state matrices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Relax {
    strength: f64,
}

impl Relax {
    pub fn new(strength: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&strength) {
            return Err(Error::Validation(format!(
                "Relax strength must lie in [0, 1], got {}",
                strength
            )));
        }
        Ok(Self { strength })
    }
}

impl<const N: usize> MatrixRule<N> for Relax {
    fn derive(
        &self,
        matrix: &TransitionMatrix<N>,
        rng: &mut dyn RngCore,
    ) -> Result<TransitionMatrix<N>> {
        let rows = matrix
            .to_rows()
            .into_iter()
            .map(|row| {
                let blended = row.map(|w| (1.0 - self.strength) * w + self.strength * rng.gen::<f64>());
                // all-zero noise at full strength has nothing to normalize
                if blended.iter().sum::<f64>() > 0.0 {
                    blended
                } else {
                    row
                }
            })
            .collect();
        TransitionMatrix::normalized(rows)
    }

    fn name(&self) -> &str {
        "relax"
    }
}

/// Turns a lineage by a quarter: the probability mass of every direction moves
/// to the direction a quarter turn away, left or right with equal chance per
/// split. A non-zero `jitter` then perturbs each entry by up to `±jitter`,
/// clips to `[0, 1]` and renormalizes.
#[derive(Debug, Clone, PartialEq)]
pub struct OrthoRotate {
    jitter: f64,
    turn: Categorical,
}

impl OrthoRotate {
    pub fn new() -> Result<Self> {
        Self::with_jitter(0.0)
    }

    pub fn with_jitter(jitter: f64) -> Result<Self> {
        // entries are clipped to [0, 1], so larger jitter adds nothing
        if !(0.0..=1.0).contains(&jitter) {
            return Err(Error::Validation(format!(
                "Rotation jitter must lie in [0, 1], got {}",
                jitter
            )));
        }
        Ok(Self {
            jitter,
            turn: Categorical::uniform(2)?,
        })
    }

    /// Column permutation for a single quarter turn
    pub fn rotate(row: [f64; 4], turn: fn(Direction) -> Direction) -> [f64; 4] {
        let mut rotated = [0.0; 4];
        for direction in Direction::ALL {
            rotated[turn(direction).index()] = row[direction.index()];
        }
        rotated
    }
}

impl MatrixRule<4> for OrthoRotate {
    fn derive(&self, matrix: &MoveMatrix, rng: &mut dyn RngCore) -> Result<MoveMatrix> {
        let turn: fn(Direction) -> Direction = match self.turn.sample(rng) {
            0 => Direction::rotate_left,
            _ => Direction::rotate_right,
        };

        let rows = matrix
            .to_rows()
            .into_iter()
            .map(|row| {
                let rotated = Self::rotate(row, turn);
                if self.jitter == 0.0 {
                    return rotated;
                }
                let jittered =
                    rotated.map(|w| (w + rng.gen_range(-self.jitter..=self.jitter)).clamp(0.0, 1.0));
                if jittered.iter().sum::<f64>() > 0.0 {
                    jittered
                } else {
                    rotated
                }
            })
            .collect();

        TransitionMatrix::normalized(rows)
    }

    fn name(&self) -> &str {
        "ortho_rotate"
    }
}
