//! Marcher simulation engine.
//!
//! This crate owns the occupancy grid, the marcher state machine and the board
//! that advances a population of marchers through a global-state schedule.

pub mod grid;
pub mod marcher;
pub mod board;

pub use grid::{Grid, Snapshot};
pub use marcher::Marcher;
pub use board::{Board, CellWrite, Elimination, EndReason, Run, RunStats, StepReport};
