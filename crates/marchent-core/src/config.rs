//! Configuration types for a simulation scene.

use crate::{Color, MoveMatrix, StateMatrix};
use serde::{Deserialize, Serialize};

/// Everything needed to build a board and run it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Scene name, used for logs and output file names
    pub name: String,
    /// Width of the board
    pub width: i32,
    /// Height of the board
    pub height: i32,
    /// Random seed for reproducibility
    pub seed: u64,
    /// Global-state schedule, expanded segment by segment
    pub schedule: Vec<ScheduleSegment>,
    /// Initial marchers, processed in this order
    pub marchers: Vec<MarcherConfig>,
    /// Log a progress event every this many steps (0 disables)
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u64,
}

fn default_progress_interval() -> u64 {
    1000
}

impl SceneConfig {
    /// The flat schedule: one global-state index per step
    pub fn expand_schedule(&self) -> Vec<usize> {
        self.schedule
            .iter()
            .flat_map(|segment| std::iter::repeat(segment.state).take(segment.steps))
            .collect()
    }

    pub fn total_steps(&self) -> usize {
        self.schedule.iter().map(|segment| segment.steps).sum()
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            width: 256,
            height: 256,
            seed: 0,
            schedule: vec![ScheduleSegment::new(0, 10_000)],
            marchers: Vec::new(),
            progress_interval: default_progress_interval(),
        }
    }
}

/// `steps` consecutive schedule entries holding global state `state`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSegment {
    pub state: usize,
    pub steps: usize,
}

impl ScheduleSegment {
    pub fn new(state: usize, steps: usize) -> Self {
        Self { state, steps }
    }
}

/// Initial parameters of one marcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarcherConfig {
    pub x: i32,
    pub y: i32,
    pub color: Color,
    pub move_transitions: MoveMatrix,
    pub state_transitions: StateMatrix,
    /// How children derive their parameters
    #[serde(default)]
    pub split: SplitConfig,
}

/// Split policy selection, one rule per derived field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SplitConfig {
    #[serde(default)]
    pub color: ColorRuleConfig,
    #[serde(default)]
    pub moves: MoveRuleConfig,
    #[serde(default)]
    pub states: StateRuleConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ColorRuleConfig {
    #[default]
    Identity,
    /// Scale every lit channel by `factor`, never below 1
    Darken { factor: f64 },
    /// Rotate hue by `degrees`
    HueShift { degrees: f32 },
    /// Raise HSV value by `step`, saturating at full brightness
    Lighten { step: f32 },
    /// Move to the next colour of `palette`
    Cycle { palette: Vec<Color> },
    /// Any visible colour, uniformly at random
    Random,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum MoveRuleConfig {
    #[default]
    Identity,
    /// Blend rows toward uniform noise by `strength` and renormalize
    Relax { strength: f64 },
    /// Quarter-turn the direction columns, then jitter each entry by up to `jitter`
    OrthoRotate {
        #[serde(default)]
        jitter: f64,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum StateRuleConfig {
    #[default]
    Identity,
    /// Blend rows toward uniform noise by `strength` and renormalize
    Relax { strength: f64 },
}
