//! Marcher state and its single-step transition.

use marchent_core::{
    Color, Direction, Error, MarcherConfig, MoveMatrix, Outcome, Position, Result, StateMatrix,
};
use marchent_split::SplitPolicy;
use rand::{Rng, RngCore};

/// One agent: a biased random walk with probabilistic splitting and stopping,
/// both conditioned on the current global state.
#[derive(Debug, Clone)]
pub struct Marcher {
    pub position: Position,
    move_transitions: MoveMatrix,
    state_transitions: StateMatrix,
    color: Color,
    policy: SplitPolicy,
    generation: u32,
}

impl Marcher {
    /// Checks the invariants every marcher must hold: both matrices cover the
    /// same global states and the colour is visible on the grid.
    pub fn new(
        position: Position,
        move_transitions: MoveMatrix,
        state_transitions: StateMatrix,
        color: Color,
        policy: SplitPolicy,
    ) -> Result<Self> {
        if move_transitions.num_states() != state_transitions.num_states() {
            return Err(Error::Validation(format!(
                "Move transitions cover {} global states but state transitions cover {}",
                move_transitions.num_states(),
                state_transitions.num_states()
            )));
        }
        if color.is_empty() {
            return Err(Error::Validation(format!(
                "Marcher at {} has the empty colour and would be invisible",
                position
            )));
        }

        Ok(Self {
            position,
            move_transitions,
            state_transitions,
            color,
            policy,
            generation: 0,
        })
    }

    pub fn from_config(config: &MarcherConfig) -> Result<Self> {
        Self::new(
            Position::new(config.x, config.y),
            config.move_transitions.clone(),
            config.state_transitions.clone(),
            config.color,
            SplitPolicy::from_config(&config.split)?,
        )
    }

    /// Advance one step under `global_state`.
    ///
    /// The move is drawn and applied first, then the outcome is drawn
    /// independently. The move is committed even when the outcome is
    /// `Stopping`. Bounds and collisions are the board's business.
    pub fn step<R: Rng + ?Sized>(&mut self, global_state: usize, rng: &mut R) -> Result<Outcome> {
        let moves = self.move_transitions.row(global_state)?;
        let outcomes = self.state_transitions.row(global_state)?;

        let direction = Direction::try_from(moves.sample(rng))?;
        self.position = self.position.step(direction);

        Outcome::try_from(outcomes.sample(rng))
    }

    /// A child at this marcher's current position, with parameters derived by
    /// the split policy. The child inherits the policy.
    pub fn split(&self, rng: &mut dyn RngCore) -> Result<Marcher> {
        let color = self.policy.derive_color(self.color, rng);
        let move_transitions = self.policy.derive_moves(&self.move_transitions, rng)?;
        let state_transitions = self.policy.derive_states(&self.state_transitions, rng)?;

        if move_transitions.num_states() != self.num_states() {
            return Err(Error::Validation(format!(
                "Split policy {:?} changed the move matrix from {} to {} global states",
                self.policy,
                self.num_states(),
                move_transitions.num_states()
            )));
        }

        let mut child = Marcher::new(
            self.position,
            move_transitions,
            state_transitions,
            color,
            self.policy.clone(),
        )?;
        child.generation = self.generation + 1;
        Ok(child)
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn move_transitions(&self) -> &MoveMatrix {
        &self.move_transitions
    }

    pub fn state_transitions(&self) -> &StateMatrix {
        &self.state_transitions
    }

    pub fn policy(&self) -> &SplitPolicy {
        &self.policy
    }

    /// Number of splits between this marcher and its initial ancestor
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Number of global states both matrices cover
    pub fn num_states(&self) -> usize {
        self.move_transitions.num_states()
    }
}
