//! Core type definitions for the simulation.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 2D position on the board. Not wrapped: leaving the board is a legal move
/// that the board resolves by eliminating the marcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn add(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Position after a unit move in `direction`
    pub fn step(&self, direction: Direction) -> Self {
        let (dx, dy) = direction.offset();
        self.add(dx, dy)
    }

    /// Whether this position lies in `[0, width) x [0, height)`
    pub fn in_bounds(&self, width: i32, height: i32) -> bool {
        self.x >= 0 && self.x < width && self.y >= 0 && self.y < height
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Move direction, in transition-matrix column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// +x
    Right = 0,
    /// -x
    Left = 1,
    /// +y
    Down = 2,
    /// -y
    Up = 3,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Right,
        Direction::Left,
        Direction::Down,
        Direction::Up,
    ];

    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::Right => (1, 0),
            Direction::Left => (-1, 0),
            Direction::Down => (0, 1),
            Direction::Up => (0, -1),
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Quarter turn, counter-clockwise as drawn on screen (y grows downward)
    pub fn rotate_left(self) -> Self {
        match self {
            Direction::Right => Direction::Up,
            Direction::Up => Direction::Left,
            Direction::Left => Direction::Down,
            Direction::Down => Direction::Right,
        }
    }

    /// Quarter turn, clockwise as drawn on screen
    pub fn rotate_right(self) -> Self {
        match self {
            Direction::Right => Direction::Down,
            Direction::Down => Direction::Left,
            Direction::Left => Direction::Up,
            Direction::Up => Direction::Right,
        }
    }
}

impl TryFrom<usize> for Direction {
    type Error = Error;

    fn try_from(index: usize) -> Result<Self> {
        Direction::ALL
            .get(index)
            .copied()
            .ok_or_else(|| Error::Validation(format!("Invalid direction index: {}", index)))
    }
}

/// Per-step outcome of a marcher, in transition-matrix column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Running = 0,
    Splitting = 1,
    Stopping = 2,
}

impl Outcome {
    pub const ALL: [Outcome; 3] = [Outcome::Running, Outcome::Splitting, Outcome::Stopping];
}

impl TryFrom<usize> for Outcome {
    type Error = Error;

    fn try_from(index: usize) -> Result<Self> {
        Outcome::ALL
            .get(index)
            .copied()
            .ok_or(Error::InvalidOutcome(index))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Outcome::Running => "running",
            Outcome::Splitting => "splitting",
            Outcome::Stopping => "stopping",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_offsets() {
        let origin = Position::new(5, 5);
        assert_eq!(origin.step(Direction::Right), Position::new(6, 5));
        assert_eq!(origin.step(Direction::Left), Position::new(4, 5));
        assert_eq!(origin.step(Direction::Down), Position::new(5, 6));
        assert_eq!(origin.step(Direction::Up), Position::new(5, 4));
    }

    #[test]
    fn test_rotations_are_orthogonal_and_inverse() {
        for direction in Direction::ALL {
            let left = direction.rotate_left();
            let right = direction.rotate_right();

            let (dx, dy) = direction.offset();
            let (lx, ly) = left.offset();
            let (rx, ry) = right.offset();
            assert_eq!(dx * lx + dy * ly, 0);
            assert_eq!(dx * rx + dy * ry, 0);

            assert_eq!(left.rotate_right(), direction);
            assert_eq!(direction.rotate_left().rotate_left().rotate_left().rotate_left(), direction);
        }
    }

    #[test]
    fn test_bounds() {
        assert!(Position::new(0, 0).in_bounds(3, 2));
        assert!(Position::new(2, 1).in_bounds(3, 2));
        assert!(!Position::new(3, 1).in_bounds(3, 2));
        assert!(!Position::new(-1, 0).in_bounds(3, 2));
        assert!(!Position::new(0, 2).in_bounds(3, 2));
    }

    #[test]
    fn test_outcome_from_index() {
        assert_eq!(Outcome::try_from(0).unwrap(), Outcome::Running);
        assert_eq!(Outcome::try_from(1).unwrap(), Outcome::Splitting);
        assert_eq!(Outcome::try_from(2).unwrap(), Outcome::Stopping);
        assert!(matches!(Outcome::try_from(3), Err(Error::InvalidOutcome(3))));
    }
}
