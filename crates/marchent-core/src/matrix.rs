//! Row-stochastic transition matrices indexed by global state.

use crate::sampling::Categorical;
use crate::{Error, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A `num_global_states x N` matrix whose every row is a probability
/// distribution. The column count is fixed by the type; rows are validated
/// when the matrix is built and keep their sampler alongside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct TransitionMatrix<const N: usize> {
    rows: Vec<Categorical>,
}

/// Direction distribution per global state, columns `[+x, -x, +y, -y]`
pub type MoveMatrix = TransitionMatrix<4>;

/// Outcome distribution per global state, columns `[running, splitting, stopping]`
pub type StateMatrix = TransitionMatrix<3>;

impl<const N: usize> TransitionMatrix<N> {
    pub fn new(rows: Vec<[f64; N]>) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::Validation(
                "Transition matrix needs at least one global state".to_string(),
            ));
        }

        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(state, row)| {
                Categorical::new(row.to_vec()).map_err(|e| {
                    Error::Validation(format!("Row {} of {}-column matrix: {}", state, N, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { rows })
    }

    /// A single-state matrix
    pub fn single(row: [f64; N]) -> Result<Self> {
        Self::new(vec![row])
    }

    /// Every row uniform over the `N` columns
    pub fn uniform(num_states: usize) -> Result<Self> {
        Self::new(vec![[1.0 / N as f64; N]; num_states])
    }

    /// Build from rows of arbitrary non-negative weights, rescaling each row
    pub fn normalized(rows: Vec<[f64; N]>) -> Result<Self> {
        let rescaled = rows
            .into_iter()
            .map(|row| {
                let dist = Categorical::normalized(row.to_vec())?;
                let mut out = [0.0; N];
                out.copy_from_slice(dist.weights());
                Ok(out)
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(rescaled)
    }

    pub fn num_states(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, state: usize) -> Result<&Categorical> {
        self.rows.get(state).ok_or(Error::StateOutOfRange {
            state,
            rows: self.rows.len(),
        })
    }

    /// Draw a column index from the row selected by `state`
    pub fn sample<R: Rng + ?Sized>(&self, state: usize, rng: &mut R) -> Result<usize> {
        Ok(self.row(state)?.sample(rng))
    }

    /// Copy of the probabilities, one array per global state
    pub fn to_rows(&self) -> Vec<[f64; N]> {
        self.rows
            .iter()
            .map(|row| {
                let mut out = [0.0; N];
                out.copy_from_slice(row.weights());
                out
            })
            .collect()
    }
}

impl<const N: usize> TryFrom<Vec<Vec<f64>>> for TransitionMatrix<N> {
    type Error = Error;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self> {
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(state, row)| {
                <[f64; N]>::try_from(row.as_slice()).map_err(|_| {
                    Error::Validation(format!(
                        "Row {} has {} columns, expected {}",
                        state,
                        row.len(),
                        N
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(rows)
    }
}

impl<const N: usize> From<TransitionMatrix<N>> for Vec<Vec<f64>> {
    fn from(matrix: TransitionMatrix<N>) -> Self {
        matrix
            .rows
            .iter()
            .map(|row| row.weights().to_vec())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_rejects_non_normalized_row() {
        let result = MoveMatrix::new(vec![[0.25; 4], [0.5, 0.5, 0.5, 0.0]]);
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_rejects_empty_matrix() {
        assert!(StateMatrix::new(vec![]).is_err());
    }

    #[test]
    fn test_row_out_of_range() {
        let matrix = StateMatrix::single([0.9, 0.1, 0.0]).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(matches!(
            matrix.sample(1, &mut rng),
            Err(Error::StateOutOfRange { state: 1, rows: 1 })
        ));
    }

    #[test]
    fn test_json_shape_is_checked() {
        let ok: MoveMatrix = serde_json::from_str("[[1, 0, 0, 0], [0.5, 0, 0.5, 0]]").unwrap();
        assert_eq!(ok.num_states(), 2);
        assert_eq!(ok.to_rows()[1], [0.5, 0.0, 0.5, 0.0]);

        let wrong_width: std::result::Result<StateMatrix, _> =
            serde_json::from_str("[[1, 0, 0, 0]]");
        assert!(wrong_width.is_err());

        let json = serde_json::to_string(&ok).unwrap();
        assert_eq!(json, "[[1.0,0.0,0.0,0.0],[0.5,0.0,0.5,0.0]]");
    }

    #[test]
    fn test_normalized_rows() {
        let matrix = StateMatrix::normalized(vec![[9.0, 1.0, 0.0]]).unwrap();
        assert_eq!(matrix.to_rows(), vec![[0.9, 0.1, 0.0]]);
    }

    proptest! {
        #[test]
        fn prop_normalized_rows_sum_to_one(
            rows in prop::collection::vec(prop::array::uniform4(0.0f64..10.0), 1..8)
        ) {
            prop_assume!(rows.iter().all(|row| row.iter().sum::<f64>() > 1e-3));
            let matrix = MoveMatrix::normalized(rows).unwrap();
            for row in matrix.to_rows() {
                prop_assert!((row.iter().sum::<f64>() - 1.0).abs() <= crate::ROW_SUM_TOLERANCE);
            }
        }

        #[test]
        fn prop_arbitrary_rows_validate_iff_normalized(
            row in prop::array::uniform3(0.0f64..1.0)
        ) {
            let total: f64 = row.iter().sum();
            let built = StateMatrix::single(row);
            prop_assert_eq!(built.is_ok(), (total - 1.0).abs() <= crate::ROW_SUM_TOLERANCE);
        }
    }
}
