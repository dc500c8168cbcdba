//! Command-line runner for marcher scenes.

mod scenes;
mod sink;
mod telemetry;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use marchent_core::{ScheduleSegment, SceneConfig};
use marchent_world::Board;
use sink::{BincodeSink, EveryNth, FrameSink, GifSink, JsonLinesSink, PpmSink};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "marchent")]
#[command(about = "Stochastic marchers drawing trails on a grid")]
struct Cli {
    /// Log one JSON object per event
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scene and write its frames
    Run {
        /// Built-in scene name
        #[arg(required_unless_present = "scene_file", conflicts_with = "scene_file")]
        scene: Option<String>,
        /// Scene JSON file
        #[arg(long)]
        scene_file: Option<PathBuf>,
        #[arg(long)]
        seed: Option<u64>,
        /// Cap the schedule at this many steps
        #[arg(long)]
        steps: Option<usize>,
        #[arg(long, value_enum, default_value_t = Format::Gif)]
        format: Format,
        #[arg(long, default_value = "outputs")]
        out: PathBuf,
        /// Image pixels per cell (gif and ppm)
        #[arg(long, default_value_t = 1)]
        upsample: u32,
        /// Write every Nth frame, plus the last
        #[arg(long, default_value_t = 1)]
        every: usize,
    },
    /// List the built-in scenes
    Scenes,
    /// Print a built-in scene as JSON
    Dump {
        scene: String,
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    /// One looping animation
    Gif,
    Json,
    Bincode,
    Ppm,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init_telemetry(cli.log_json)?;

    match cli.command {
        Commands::Run {
            scene,
            scene_file,
            seed,
            steps,
            format,
            out,
            upsample,
            every,
        } => {
            let mut config = load_scene(scene.as_deref(), scene_file, seed)?;
            if let Some(steps) = steps {
                truncate_schedule(&mut config, steps);
            }
            run_scene(&config, format, &out, upsample, every)
        }
        Commands::Scenes => {
            for entry in scenes::SCENES {
                println!("{:<18} {}", entry.name, entry.description);
            }
            Ok(())
        }
        Commands::Dump { scene, seed } => {
            let config = scenes::lookup(&scene, seed)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn load_scene(name: Option<&str>, file: Option<PathBuf>, seed: Option<u64>) -> Result<SceneConfig> {
    match (name, file) {
        (_, Some(path)) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read scene file {:?}", path))?;
            let mut config: SceneConfig = serde_json::from_str(&text)
                .with_context(|| format!("Invalid scene file {:?}", path))?;
            if let Some(seed) = seed {
                config.seed = seed;
            }
            Ok(config)
        }
        (Some(name), None) => Ok(scenes::lookup(name, seed.unwrap_or(0))?),
        (None, None) => bail!("Give a scene name or --scene-file"),
    }
}

/// Keep only the first `steps` schedule entries
fn truncate_schedule(config: &mut SceneConfig, steps: usize) {
    let mut remaining = steps;
    let mut segments = Vec::new();
    for segment in &config.schedule {
        if remaining == 0 {
            break;
        }
        let take = segment.steps.min(remaining);
        segments.push(ScheduleSegment::new(segment.state, take));
        remaining -= take;
    }
    config.schedule = segments;
}

fn open_sink(
    config: &SceneConfig,
    format: Format,
    out: &Path,
    upsample: u32,
) -> Result<Box<dyn FrameSink>> {
    std::fs::create_dir_all(out).with_context(|| format!("Failed to create {:?}", out))?;
    let sink: Box<dyn FrameSink> = match format {
        Format::Gif => Box::new(GifSink::create(
            &out.join(format!("{}.gif", config.name)),
            upsample,
        )?),
        Format::Json => Box::new(JsonLinesSink::create(
            &out.join(format!("{}.jsonl", config.name)),
        )?),
        Format::Bincode => Box::new(BincodeSink::create(
            &out.join(format!("{}.frames", config.name)),
        )?),
        Format::Ppm => Box::new(PpmSink::new(out.join(&config.name), config.name.clone(), upsample)?),
    };
    Ok(sink)
}

fn run_scene(
    config: &SceneConfig,
    format: Format,
    out: &Path,
    upsample: u32,
    every: usize,
) -> Result<()> {
    let board = Board::from_config(config)
        .with_context(|| format!("Scene '{}' is invalid", config.name))?;
    let mut sink = EveryNth::new(open_sink(config, format, out, upsample)?, every)?;

    let mut run = board.run();
    for (index, snapshot) in run.by_ref().enumerate() {
        let snapshot = snapshot.with_context(|| format!("Step {} failed", index + 1))?;
        sink.write_frame(index + 1, &snapshot)?;
    }
    sink.finish()?;

    let stats = run.stats();
    info!(
        scene = %config.name,
        steps = stats.steps,
        population = stats.population,
        occupied_cells = stats.occupied_cells,
        "Frames written to {:?}",
        out
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_schedule_across_segments() {
        let mut config = SceneConfig {
            schedule: vec![ScheduleSegment::new(0, 3), ScheduleSegment::new(1, 5)],
            ..Default::default()
        };
        truncate_schedule(&mut config, 4);
        assert_eq!(config.expand_schedule(), vec![0, 0, 0, 1]);

        truncate_schedule(&mut config, 100);
        assert_eq!(config.total_steps(), 4);
    }

    #[test]
    fn test_cli_parses_run() {
        let cli = Cli::try_parse_from([
            "marchent", "run", "ortho_rainbow", "--seed", "4", "--steps", "10", "--format", "ppm",
            "--upsample", "3", "--every", "5",
        ])
        .unwrap();
        match cli.command {
            Commands::Run {
                scene, seed, steps, format, upsample, every, ..
            } => {
                assert_eq!(scene.as_deref(), Some("ortho_rainbow"));
                assert_eq!(seed, Some(4));
                assert_eq!(steps, Some(10));
                assert!(matches!(format, Format::Ppm));
                assert_eq!((upsample, every), (3, 5));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_cli_defaults_to_gif() {
        let cli = Cli::try_parse_from(["marchent", "run", "ortho_color"]).unwrap();
        match cli.command {
            Commands::Run { format, upsample, every, .. } => {
                assert!(matches!(format, Format::Gif));
                assert_eq!((upsample, every), (1, 1));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_cli_requires_a_scene() {
        assert!(Cli::try_parse_from(["marchent", "run"]).is_err());
    }

    #[test]
    fn test_short_run_writes_json_lines() {
        let out = std::env::temp_dir().join(format!("marchent-test-{}", std::process::id()));
        let mut config = scenes::lookup("ortho_rainbow", 1).unwrap();
        truncate_schedule(&mut config, 25);

        run_scene(&config, Format::Json, &out, 1, 10).unwrap();

        let text = std::fs::read_to_string(out.join("ortho_rainbow.jsonl")).unwrap();
        let frames = text.lines().count();
        // every tenth step plus the last one executed
        assert!((1..=3).contains(&frames));
        std::fs::remove_dir_all(&out).unwrap();
    }
}
