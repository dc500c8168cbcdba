//! The board: occupancy grid plus the live marcher population.

use crate::grid::{Grid, Snapshot};
use crate::marcher::Marcher;
use marchent_core::{Color, Error, Outcome, Position, Result, SceneConfig};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace};

pub struct Board {
    name: String,
    grid: Grid,
    agents: Vec<Marcher>,
    schedule: Vec<usize>,
    rng: ChaCha8Rng,
    stats: RunStats,
    progress_interval: u64,
}

/// Why a marcher left the population
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Elimination {
    Stopped,
    OutOfBounds,
    Collision,
}

/// One grid write made during a step, with the cell's state just before it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellWrite {
    pub position: Position,
    pub color: Color,
    pub was_empty: bool,
}

/// Counters for a single step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    pub global_state: usize,
    /// Parents drawing each outcome, before elimination
    pub running: usize,
    pub splitting: usize,
    pub stopped: usize,
    /// Parents lost to the bounds or to a trail
    pub out_of_bounds: usize,
    pub collisions: usize,
    pub children_admitted: usize,
    pub children_eliminated: usize,
    /// Live marchers once the step is done
    pub population: usize,
}

impl StepReport {
    fn new(global_state: usize) -> Self {
        Self {
            global_state,
            ..Default::default()
        }
    }

    fn record_outcome(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Running => self.running += 1,
            Outcome::Splitting => self.splitting += 1,
            Outcome::Stopping => self.stopped += 1,
        }
    }

    fn record_elimination(&mut self, reason: Elimination) {
        match reason {
            Elimination::Stopped => {}
            Elimination::OutOfBounds => self.out_of_bounds += 1,
            Elimination::Collision => self.collisions += 1,
        }
    }
}

/// Counters accumulated over a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub steps: u64,
    pub stopped: u64,
    pub out_of_bounds: u64,
    pub collisions: u64,
    pub children_admitted: u64,
    pub children_eliminated: u64,
    pub peak_population: usize,
    pub population: usize,
    pub occupied_cells: usize,
    pub max_generation: u32,
}

impl RunStats {
    fn accumulate(&mut self, report: &StepReport, occupied_cells: usize) {
        self.steps += 1;
        self.stopped += report.stopped as u64;
        self.out_of_bounds += report.out_of_bounds as u64;
        self.collisions += report.collisions as u64;
        self.children_admitted += report.children_admitted as u64;
        self.children_eliminated += report.children_eliminated as u64;
        self.population = report.population;
        self.peak_population = self.peak_population.max(report.population);
        self.occupied_cells = occupied_cells;
    }
}

impl Board {
    /// Validates the initial population against the grid and the schedule,
    /// then draws every marcher at its starting cell.
    pub fn new(
        width: i32,
        height: i32,
        agents: Vec<Marcher>,
        schedule: Vec<usize>,
        seed: u64,
    ) -> Result<Self> {
        let mut grid = Grid::new(width, height)?;

        if let Some(rows) = agents.iter().map(Marcher::num_states).min() {
            if let Some((step, state)) = schedule
                .iter()
                .enumerate()
                .find(|(_, state)| **state >= rows)
            {
                return Err(Error::InvalidSchedule(format!(
                    "Step {} uses global state {} but some marcher only covers {}",
                    step, state, rows
                )));
            }
        }

        for agent in &agents {
            if !grid.in_bounds(agent.position) {
                return Err(Error::Validation(format!(
                    "Marcher starts at {} outside the {}x{} board",
                    agent.position, width, height
                )));
            }
            if grid.is_occupied(agent.position) {
                return Err(Error::Validation(format!(
                    "Two marchers start at {}",
                    agent.position
                )));
            }
            grid.paint(agent.position, agent.color())?;
        }

        let stats = RunStats {
            population: agents.len(),
            peak_population: agents.len(),
            occupied_cells: grid.occupied_count(),
            ..Default::default()
        };

        Ok(Self {
            name: "board".to_string(),
            grid,
            agents,
            schedule,
            rng: ChaCha8Rng::seed_from_u64(seed),
            stats,
            progress_interval: 1000,
        })
    }

    #[instrument(skip(config), fields(scene = %config.name))]
    pub fn from_config(config: &SceneConfig) -> Result<Self> {
        let agents = config
            .marchers
            .iter()
            .map(Marcher::from_config)
            .collect::<Result<Vec<_>>>()?;

        let board = Self::new(
            config.width,
            config.height,
            agents,
            config.expand_schedule(),
            config.seed,
        )?
        .with_name(config.name.clone())
        .with_progress_interval(config.progress_interval);
        debug!(
            marchers = board.agents.len(),
            steps = board.schedule.len(),
            "Board built from scene"
        );
        Ok(board)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Log a progress event every `interval` steps; 0 turns it off
    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Advance every live marcher once under `global_state`
    pub fn step(&mut self, global_state: usize) -> Result<StepReport> {
        self.advance(global_state, None)
    }

    /// Like [`Board::step`], also returning every grid write in the order made
    pub fn step_traced(&mut self, global_state: usize) -> Result<(StepReport, Vec<CellWrite>)> {
        let mut writes = Vec::new();
        let report = self.advance(global_state, Some(&mut writes))?;
        Ok((report, writes))
    }

    /// Runs one step. On error the population is restored (no marcher is
    /// lost) and the stats are left as they were; cells drawn before the
    /// failure stay drawn.
    #[instrument(level = "trace", skip(self, writes))]
    fn advance(
        &mut self,
        global_state: usize,
        mut writes: Option<&mut Vec<CellWrite>>,
    ) -> Result<StepReport> {
        if let Some(rows) = self.agents.iter().map(Marcher::num_states).min() {
            if global_state >= rows {
                return Err(Error::StateOutOfRange {
                    state: global_state,
                    rows,
                });
            }
        }

        let mut report = StepReport::new(global_state);
        let mut pending = std::mem::take(&mut self.agents).into_iter();
        let mut next = Vec::with_capacity(pending.len());

        while let Some(agent) = pending.next() {
            let resolved = self.advance_one(
                agent,
                global_state,
                &mut next,
                &mut report,
                writes.as_deref_mut(),
            );
            if let Err(e) = resolved {
                next.extend(pending);
                self.agents = next;
                return Err(e);
            }
        }

        self.agents = next;
        report.population = self.agents.len();
        self.stats.accumulate(&report, self.grid.occupied_count());

        Ok(report)
    }

    /// Resolve one marcher and, on a split, its child. Whatever survives is
    /// pushed to `next`, including a parent whose split failed.
    fn advance_one(
        &mut self,
        mut agent: Marcher,
        global_state: usize,
        next: &mut Vec<Marcher>,
        report: &mut StepReport,
        mut writes: Option<&mut Vec<CellWrite>>,
    ) -> Result<()> {
        let outcome = match agent.step(global_state, &mut self.rng) {
            Ok(outcome) => outcome,
            Err(e) => {
                next.push(agent);
                return Err(e);
            }
        };
        report.record_outcome(outcome);

        if let Some(reason) = self.elimination(outcome, agent.position) {
            trace!(position = %agent.position, ?reason, "Marcher eliminated");
            report.record_elimination(reason);
            return Ok(());
        }
        self.draw(&agent, writes.as_deref_mut())?;

        let splitting = outcome == Outcome::Splitting;
        next.push(agent);
        if !splitting {
            return Ok(());
        }

        let Some(parent) = next.last() else {
            return Ok(());
        };
        let mut child = parent.split(&mut self.rng)?;

        // the child catches up with its parent within the same step
        let child_outcome = child.step(global_state, &mut self.rng)?;
        match self.elimination(child_outcome, child.position) {
            Some(reason) => {
                trace!(position = %child.position, ?reason, "Child eliminated on arrival");
                report.children_eliminated += 1;
            }
            None => {
                self.draw(&child, writes)?;
                self.stats.max_generation = self.stats.max_generation.max(child.generation());
                report.children_admitted += 1;
                next.push(child);
            }
        }
        Ok(())
    }

    fn elimination(&self, outcome: Outcome, position: Position) -> Option<Elimination> {
        if outcome == Outcome::Stopping {
            Some(Elimination::Stopped)
        } else if !self.grid.in_bounds(position) {
            Some(Elimination::OutOfBounds)
        } else if self.grid.is_occupied(position) {
            Some(Elimination::Collision)
        } else {
            None
        }
    }

    fn draw(&mut self, agent: &Marcher, writes: Option<&mut Vec<CellWrite>>) -> Result<()> {
        if let Some(writes) = writes {
            writes.push(CellWrite {
                position: agent.position,
                color: agent.color(),
                was_empty: !self.grid.is_occupied(agent.position),
            });
        }
        self.grid.paint(agent.position, agent.color())
    }

    /// Consume the board into a lazy stream of one snapshot per executed step
    #[instrument(skip_all, fields(scene = %self.name))]
    pub fn run(self) -> Run {
        info!(
            event = "run_started",
            scene = %self.name,
            width = self.grid.width,
            height = self.grid.height,
            marchers = self.agents.len(),
            "Starting run of {} scheduled steps",
            self.schedule.len()
        );

        Run {
            board: self,
            cursor: 0,
            end: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> i32 {
        self.grid.width
    }

    pub fn height(&self) -> i32 {
        self.grid.height
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn agents(&self) -> &[Marcher] {
        &self.agents
    }

    pub fn schedule(&self) -> &[usize] {
        &self.schedule
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }
}

/// Why a run stopped producing snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    ScheduleExhausted,
    PopulationExhausted,
    Failed,
}

/// Snapshot stream returned by [`Board::run`]. Yields `Ok(snapshot)` after
/// every executed step; a fatal step error is yielded once and ends the stream.
pub struct Run {
    board: Board,
    cursor: usize,
    end: Option<EndReason>,
}

impl Run {
    /// Steps executed so far
    pub fn steps_done(&self) -> usize {
        self.cursor
    }

    pub fn end_reason(&self) -> Option<EndReason> {
        self.end
    }

    pub fn stats(&self) -> &RunStats {
        self.board.stats()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn into_board(self) -> Board {
        self.board
    }

    fn finish(&mut self, reason: EndReason) {
        self.end = Some(reason);
        let stats = &self.board.stats;
        info!(
            event = "run_complete",
            scene = %self.board.name,
            reason = ?reason,
            steps = stats.steps,
            scheduled_steps = self.board.schedule.len(),
            population = stats.population,
            peak_population = stats.peak_population,
            occupied_cells = stats.occupied_cells,
            children_admitted = stats.children_admitted,
            children_eliminated = stats.children_eliminated,
            stopped = stats.stopped,
            out_of_bounds = stats.out_of_bounds,
            collisions = stats.collisions,
            max_generation = stats.max_generation,
            "Run finished"
        );
    }
}

impl Iterator for Run {
    type Item = Result<Snapshot>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.end.is_some() {
            return None;
        }

        let Some(&global_state) = self.board.schedule.get(self.cursor) else {
            self.finish(EndReason::ScheduleExhausted);
            return None;
        };
        if self.board.agents.is_empty() {
            self.finish(EndReason::PopulationExhausted);
            return None;
        }

        match self.board.step(global_state) {
            Ok(report) => {
                self.cursor += 1;
                debug!(
                    step = self.cursor,
                    global_state,
                    population = report.population,
                    children = report.children_admitted,
                    lost = report.stopped + report.out_of_bounds + report.collisions,
                    "Step complete"
                );

                let interval = self.board.progress_interval;
                if interval > 0 && self.cursor as u64 % interval == 0 {
                    info!(
                        "Step {}/{}: {} marchers alive, {} cells painted",
                        self.cursor,
                        self.board.schedule.len(),
                        report.population,
                        self.board.grid.occupied_count()
                    );
                }

                Some(Ok(self.board.grid.snapshot()))
            }
            Err(e) => {
                error!(step = self.cursor + 1, global_state, "Run aborted: {}", e);
                self.finish(EndReason::Failed);
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.end.is_some() {
            (0, Some(0))
        } else {
            (0, Some(self.board.schedule.len() - self.cursor))
        }
    }
}
