//! Core types and utilities for the marchent trail simulation.

pub mod types;
pub mod color;
pub mod matrix;
pub mod sampling;
pub mod config;
pub mod error;

pub use error::{Error, Result};
pub use types::*;
pub use color::Color;
pub use matrix::{MoveMatrix, StateMatrix, TransitionMatrix};
pub use sampling::{Categorical, ROW_SUM_TOLERANCE};
pub use config::*;
