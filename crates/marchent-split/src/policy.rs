//! The split-policy contract.

use crate::{ColorCycle, Darken, HueShift, Identity, Lighten, OrthoRotate, RandomColor, Relax};
use marchent_core::{
    Color, ColorRuleConfig, MoveMatrix, MoveRuleConfig, Result, SplitConfig, StateMatrix,
    StateRuleConfig, TransitionMatrix,
};
use rand::RngCore;
use std::fmt;
use std::sync::Arc;

/// Derives a child's colour from its parent's
pub trait ColorRule: Send + Sync {
    fn derive(&self, color: Color, rng: &mut dyn RngCore) -> Color;

    fn name(&self) -> &str {
        "custom"
    }
}

/// Derives a child's `N`-column transition matrix from its parent's.
///
/// The result must keep the parent's row count; `Marcher` construction
/// rejects anything else.
pub trait MatrixRule<const N: usize>: Send + Sync {
    fn derive(
        &self,
        matrix: &TransitionMatrix<N>,
        rng: &mut dyn RngCore,
    ) -> Result<TransitionMatrix<N>>;

    fn name(&self) -> &str {
        "custom"
    }
}

impl<F> ColorRule for F
where
    F: Fn(Color, &mut dyn RngCore) -> Color + Send + Sync,
{
    fn derive(&self, color: Color, rng: &mut dyn RngCore) -> Color {
        self(color, rng)
    }
}

impl<const N: usize, F> MatrixRule<N> for F
where
    F: Fn(&TransitionMatrix<N>, &mut dyn RngCore) -> Result<TransitionMatrix<N>> + Send + Sync,
{
    fn derive(
        &self,
        matrix: &TransitionMatrix<N>,
        rng: &mut dyn RngCore,
    ) -> Result<TransitionMatrix<N>> {
        self(matrix, rng)
    }
}

impl ColorRule for Identity {
    fn derive(&self, color: Color, _rng: &mut dyn RngCore) -> Color {
        color
    }

    fn name(&self) -> &str {
        "identity"
    }
}

impl<const N: usize> MatrixRule<N> for Identity {
    fn derive(
        &self,
        matrix: &TransitionMatrix<N>,
        _rng: &mut dyn RngCore,
    ) -> Result<TransitionMatrix<N>> {
        Ok(matrix.clone())
    }

    fn name(&self) -> &str {
        "identity"
    }
}

/// The full policy a marcher hands down to its children. Cloning shares the
/// rules, so a whole lineage runs on one set of rule instances.
#[derive(Clone)]
pub struct SplitPolicy {
    color: Arc<dyn ColorRule>,
    moves: Arc<dyn MatrixRule<4>>,
    states: Arc<dyn MatrixRule<3>>,
}

impl SplitPolicy {
    /// Children are exact copies of their parent
    pub fn identity() -> Self {
        Self {
            color: Arc::new(Identity),
            moves: Arc::new(Identity),
            states: Arc::new(Identity),
        }
    }

    pub fn with_color(mut self, rule: impl ColorRule + 'static) -> Self {
        self.color = Arc::new(rule);
        self
    }

    pub fn with_moves(mut self, rule: impl MatrixRule<4> + 'static) -> Self {
        self.moves = Arc::new(rule);
        self
    }

    pub fn with_states(mut self, rule: impl MatrixRule<3> + 'static) -> Self {
        self.states = Arc::new(rule);
        self
    }

    /// Build the rules a scene file asks for, checking their parameters
    pub fn from_config(config: &SplitConfig) -> Result<Self> {
        let mut policy = Self::identity();

        policy = match &config.color {
            ColorRuleConfig::Identity => policy,
            ColorRuleConfig::Darken { factor } => policy.with_color(Darken::new(*factor)?),
            ColorRuleConfig::HueShift { degrees } => policy.with_color(HueShift::new(*degrees)?),
            ColorRuleConfig::Lighten { step } => policy.with_color(Lighten::new(*step)?),
            ColorRuleConfig::Cycle { palette } => {
                policy.with_color(ColorCycle::new(palette.clone())?)
            }
            ColorRuleConfig::Random => policy.with_color(RandomColor),
        };

        policy = match &config.moves {
            MoveRuleConfig::Identity => policy,
            MoveRuleConfig::Relax { strength } => policy.with_moves(Relax::new(*strength)?),
            MoveRuleConfig::OrthoRotate { jitter } => {
                policy.with_moves(OrthoRotate::with_jitter(*jitter)?)
            }
        };

        policy = match &config.states {
            StateRuleConfig::Identity => policy,
            StateRuleConfig::Relax { strength } => policy.with_states(Relax::new(*strength)?),
        };

        tracing::debug!(
            color = policy.color.name(),
            moves = policy.moves.name(),
            states = policy.states.name(),
            "Split policy configured"
        );
        Ok(policy)
    }

    pub fn derive_color(&self, color: Color, rng: &mut dyn RngCore) -> Color {
        self.color.derive(color, rng)
    }

    pub fn derive_moves(&self, moves: &MoveMatrix, rng: &mut dyn RngCore) -> Result<MoveMatrix> {
        self.moves.derive(moves, rng)
    }

    pub fn derive_states(
        &self,
        states: &StateMatrix,
        rng: &mut dyn RngCore,
    ) -> Result<StateMatrix> {
        self.states.derive(states, rng)
    }
}

impl Default for SplitPolicy {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Debug for SplitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SplitPolicy")
            .field("color", &self.color.name())
            .field("moves", &self.moves.name())
            .field("states", &self.states.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marchent_core::Error;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn moves() -> MoveMatrix {
        MoveMatrix::new(vec![[0.5, 0.0, 0.5, 0.0], [0.1, 0.2, 0.3, 0.4]]).unwrap()
    }

    fn states() -> StateMatrix {
        StateMatrix::new(vec![[0.9, 0.1, 0.0], [0.0, 0.0, 1.0]]).unwrap()
    }

    #[test]
    fn test_identity_policy_copies_exactly() {
        let policy = SplitPolicy::identity();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        assert_eq!(policy.derive_color(Color::rgb(1, 2, 3), &mut rng), Color::rgb(1, 2, 3));
        assert_eq!(policy.derive_moves(&moves(), &mut rng).unwrap(), moves());
        assert_eq!(policy.derive_states(&states(), &mut rng).unwrap(), states());
    }

    #[test]
    fn test_closures_plug_in() {
        let policy = SplitPolicy::identity()
            .with_color(|color: Color, _rng: &mut dyn RngCore| {
                let [r, g, b] = color.channels();
                Color::rgb(g, b, r)
            })
            .with_states(|_m: &StateMatrix, _rng: &mut dyn RngCore| {
                StateMatrix::new(vec![[1.0, 0.0, 0.0]; 2])
            });
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        assert_eq!(policy.derive_color(Color::rgb(1, 2, 3), &mut rng), Color::rgb(2, 3, 1));
        assert_eq!(
            policy.derive_states(&states(), &mut rng).unwrap().to_rows(),
            vec![[1.0, 0.0, 0.0]; 2]
        );
        assert_eq!(
            format!("{:?}", policy),
            "SplitPolicy { color: \"custom\", moves: \"identity\", states: \"custom\" }"
        );
    }

    #[test]
    fn test_from_config_builds_named_rules() {
        let config = SplitConfig {
            color: ColorRuleConfig::HueShift { degrees: 30.0 },
            moves: MoveRuleConfig::OrthoRotate { jitter: 0.0 },
            states: StateRuleConfig::Relax { strength: 0.1 },
        };
        let policy = SplitPolicy::from_config(&config).unwrap();
        let debug = format!("{:?}", policy);
        assert!(debug.contains("hue_shift"));
        assert!(debug.contains("ortho_rotate"));
        assert!(debug.contains("relax"));
    }

    #[test]
    fn test_from_config_rejects_bad_parameters() {
        let config = SplitConfig {
            color: ColorRuleConfig::Cycle { palette: vec![] },
            ..Default::default()
        };
        assert!(matches!(
            SplitPolicy::from_config(&config),
            Err(Error::Validation(_))
        ));

        let config = SplitConfig {
            moves: MoveRuleConfig::Relax { strength: 1.5 },
            ..Default::default()
        };
        assert!(SplitPolicy::from_config(&config).is_err());

        let config = SplitConfig {
            moves: MoveRuleConfig::OrthoRotate { jitter: 1e308 },
            ..Default::default()
        };
        assert!(matches!(
            SplitPolicy::from_config(&config),
            Err(Error::Validation(_))
        ));
    }
}
