//! Built-in scenes.

use marchent_core::{
    Color, ColorRuleConfig, Error, MarcherConfig, MoveMatrix, MoveRuleConfig, Result,
    ScheduleSegment, SceneConfig, SplitConfig, StateMatrix, StateRuleConfig,
};
use marchent_split::RandomColor;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const RUN_SPLIT: [f64; 3] = [0.9, 0.1, 0.0];
const SCHEDULE_STEPS: usize = 100_000;
const RAINBOW_DEGREES: f32 = 10.0;

pub struct SceneEntry {
    pub name: &'static str,
    pub description: &'static str,
    build: fn(u64) -> Result<SceneConfig>,
}

pub const SCENES: &[SceneEntry] = &[
    SceneEntry {
        name: "ortho_color",
        description: "500x500, one rightward marcher, every child turns a quarter and takes a random colour",
        build: ortho_color,
    },
    SceneEntry {
        name: "ortho_rainbow",
        description: "500x500, red rightward marcher, children turn a quarter and shift hue",
        build: ortho_rainbow,
    },
    SceneEntry {
        name: "bacteria_rainbow",
        description: "1000x1000, green marcher drifting right and down, children turn a quarter and shift hue",
        build: bacteria_rainbow,
    },
    SceneEntry {
        name: "darkening_bloom",
        description: "300x300, white random walker whose lineages darken and loosen their moves",
        build: darkening_bloom,
    },
];

/// Build the named scene with `seed`
pub fn lookup(name: &str, seed: u64) -> Result<SceneConfig> {
    let entry = SCENES
        .iter()
        .find(|entry| entry.name == name)
        .ok_or_else(|| {
            Error::NotFound(format!(
                "Scene '{}' (available: {})",
                name,
                SCENES.iter().map(|e| e.name).collect::<Vec<_>>().join(", ")
            ))
        })?;
    (entry.build)(seed)
}

fn centred(
    name: &str,
    size: i32,
    seed: u64,
    color: Color,
    moves: [f64; 4],
    split: SplitConfig,
) -> Result<SceneConfig> {
    Ok(SceneConfig {
        name: name.to_string(),
        width: size,
        height: size,
        seed,
        schedule: vec![ScheduleSegment::new(0, SCHEDULE_STEPS)],
        marchers: vec![MarcherConfig {
            x: size / 2,
            y: size / 2,
            color,
            move_transitions: MoveMatrix::single(moves)?,
            state_transitions: StateMatrix::single(RUN_SPLIT)?,
            split,
        }],
        progress_interval: 1000,
    })
}

fn rainbow_split() -> SplitConfig {
    SplitConfig {
        color: ColorRuleConfig::HueShift {
            degrees: RAINBOW_DEGREES,
        },
        moves: MoveRuleConfig::OrthoRotate { jitter: 0.0 },
        states: StateRuleConfig::Identity,
    }
}

fn ortho_color(seed: u64) -> Result<SceneConfig> {
    // the first colour comes from the scene seed so reruns match
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let split = SplitConfig {
        color: ColorRuleConfig::Random,
        moves: MoveRuleConfig::OrthoRotate { jitter: 0.0 },
        states: StateRuleConfig::Identity,
    };
    centred(
        "ortho_color",
        500,
        seed,
        RandomColor::sample(&mut rng),
        [1.0, 0.0, 0.0, 0.0],
        split,
    )
}

fn ortho_rainbow(seed: u64) -> Result<SceneConfig> {
    centred(
        "ortho_rainbow",
        500,
        seed,
        Color::rgb(255, 0, 0),
        [1.0, 0.0, 0.0, 0.0],
        rainbow_split(),
    )
}

fn bacteria_rainbow(seed: u64) -> Result<SceneConfig> {
    centred(
        "bacteria_rainbow",
        1000,
        seed,
        Color::rgb(0, 128, 0),
        [0.5, 0.0, 0.5, 0.0],
        rainbow_split(),
    )
}

fn darkening_bloom(seed: u64) -> Result<SceneConfig> {
    let mut scene = centred(
        "darkening_bloom",
        300,
        seed,
        Color::gray(255),
        [0.25; 4],
        SplitConfig {
            color: ColorRuleConfig::Darken { factor: 0.9 },
            moves: MoveRuleConfig::Relax { strength: 0.2 },
            states: StateRuleConfig::Identity,
        },
    )?;
    scene.schedule = vec![ScheduleSegment::new(0, 20_000)];
    scene.marchers[0].state_transitions = StateMatrix::single([0.85, 0.14, 0.01])?;
    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;
    use marchent_world::Board;

    #[test]
    fn test_every_scene_builds_a_board() {
        for entry in SCENES {
            let scene = lookup(entry.name, 3).unwrap();
            assert_eq!(scene.name, entry.name);
            let board = Board::from_config(&scene).unwrap();
            assert_eq!(board.agents().len(), 1);
            assert_eq!(board.grid().occupied_count(), 1);
        }
    }

    #[test]
    fn test_bacteria_scene_shape() {
        let scene = lookup("bacteria_rainbow", 0).unwrap();
        assert_eq!((scene.width, scene.height), (1000, 1000));
        assert_eq!(scene.total_steps(), 100_000);
        let marcher = &scene.marchers[0];
        assert_eq!((marcher.x, marcher.y), (500, 500));
        assert_eq!(marcher.color, Color::rgb(0, 128, 0));
        assert_eq!(marcher.move_transitions.to_rows(), vec![[0.5, 0.0, 0.5, 0.0]]);
        assert_eq!(marcher.state_transitions.to_rows(), vec![[0.9, 0.1, 0.0]]);
    }

    #[test]
    fn test_random_start_colour_follows_seed() {
        let a = lookup("ortho_color", 9).unwrap();
        let b = lookup("ortho_color", 9).unwrap();
        assert_eq!(a.marchers[0].color, b.marchers[0].color);
        assert!(!a.marchers[0].color.is_empty());
    }

    #[test]
    fn test_unknown_scene() {
        assert!(matches!(lookup("nope", 0), Err(Error::NotFound(_))));
    }
}
