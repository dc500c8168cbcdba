//! 2D occupancy grid for the board.

use marchent_core::{Color, Error, Position, Result};
use serde::{Deserialize, Serialize};

/// A bounded, write-once grid of trail colours. `Color::EMPTY` marks a free
/// cell; a painted cell is never cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    pub width: i32,
    pub height: i32,
    cells: Vec<Color>,
    occupied: usize,
}

impl Grid {
    pub fn new(width: i32, height: i32) -> Result<Self> {
        if width <= 0 || height <= 0 {
            return Err(Error::Validation(format!(
                "Board dimensions must be positive, got {}x{}",
                width, height
            )));
        }

        let size = width as usize * height as usize;
        Ok(Self {
            width,
            height,
            cells: vec![Color::EMPTY; size],
            occupied: 0,
        })
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.in_bounds(self.width, self.height)
    }

    /// Colour at `pos`, `None` outside the grid
    pub fn get(&self, pos: Position) -> Option<Color> {
        self.index(pos).map(|index| self.cells[index])
    }

    /// Whether a trail already covers `pos`. Positions off the grid are not occupied.
    pub fn is_occupied(&self, pos: Position) -> bool {
        self.get(pos).is_some_and(|color| !color.is_empty())
    }

    /// Paint a free cell. Painting off the grid, over a trail, or with the
    /// empty colour breaks the board's invariants and is rejected.
    pub fn paint(&mut self, pos: Position, color: Color) -> Result<()> {
        if color.is_empty() {
            return Err(Error::Validation(format!(
                "Cannot paint {} with the empty colour",
                pos
            )));
        }
        let index = self
            .index(pos)
            .ok_or_else(|| Error::Validation(format!("Cannot paint {} outside the grid", pos)))?;
        if !self.cells[index].is_empty() {
            return Err(Error::Validation(format!("Cell {} is already occupied", pos)));
        }

        self.cells[index] = color;
        self.occupied += 1;
        Ok(())
    }

    /// Number of painted cells
    pub fn occupied_count(&self) -> usize {
        self.occupied
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Immutable copy of the current cells
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            width: self.width,
            height: self.height,
            cells: self.cells.clone(),
        }
    }

    fn index(&self, pos: Position) -> Option<usize> {
        self.in_bounds(pos)
            .then(|| (pos.y * self.width + pos.x) as usize)
    }

    /// Get position from index
    pub fn index_to_pos(&self, index: usize) -> Position {
        let x = (index as i32) % self.width;
        let y = (index as i32) / self.width;
        Position::new(x, y)
    }

    /// Iterator over all cells with positions
    pub fn iter(&self) -> impl Iterator<Item = (Position, Color)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, color)| (self.index_to_pos(i), *color))
    }
}

/// The grid as it stood after one step: row-major, `width * height` cells
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub width: i32,
    pub height: i32,
    pub cells: Vec<Color>,
}

impl Snapshot {
    pub fn get(&self, x: i32, y: i32) -> Option<Color> {
        Position::new(x, y)
            .in_bounds(self.width, self.height)
            .then(|| self.cells[(y * self.width + x) as usize])
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_empty()).count()
    }

    /// Rows from top (`y = 0`) to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[Color]> + '_ {
        self.cells.chunks(self.width as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_creation() {
        let grid = Grid::new(10, 4).unwrap();
        assert_eq!(grid.width, 10);
        assert_eq!(grid.height, 4);
        assert_eq!(grid.len(), 40);
        assert_eq!(grid.occupied_count(), 0);
        assert!(grid.iter().all(|(_, color)| color.is_empty()));
    }

    #[test]
    fn test_rejects_degenerate_dimensions() {
        assert!(Grid::new(0, 10).is_err());
        assert!(Grid::new(10, -1).is_err());
    }

    #[test]
    fn test_out_of_bounds_is_not_wrapped() {
        let grid = Grid::new(10, 10).unwrap();
        assert_eq!(grid.get(Position::new(-1, 0)), None);
        assert_eq!(grid.get(Position::new(10, 3)), None);
        assert!(!grid.is_occupied(Position::new(10, 10)));
    }

    #[test]
    fn test_paint_is_write_once() {
        let mut grid = Grid::new(5, 5).unwrap();
        let pos = Position::new(2, 3);

        grid.paint(pos, Color::gray(9)).unwrap();
        assert!(grid.is_occupied(pos));
        assert_eq!(grid.get(pos), Some(Color::gray(9)));
        assert_eq!(grid.occupied_count(), 1);

        assert!(grid.paint(pos, Color::gray(10)).is_err());
        assert_eq!(grid.get(pos), Some(Color::gray(9)));
        assert!(grid.paint(Position::new(5, 0), Color::gray(1)).is_err());
        assert!(grid.paint(Position::new(0, 0), Color::EMPTY).is_err());
        assert_eq!(grid.occupied_count(), 1);
    }

    #[test]
    fn test_snapshot_layout() {
        let mut grid = Grid::new(3, 2).unwrap();
        grid.paint(Position::new(2, 1), Color::rgb(1, 2, 3)).unwrap();

        let snapshot = grid.snapshot();
        assert_eq!(snapshot.cells.len(), 6);
        assert_eq!(snapshot.cells[5], Color::rgb(1, 2, 3));
        assert_eq!(snapshot.get(2, 1), Some(Color::rgb(1, 2, 3)));
        assert_eq!(snapshot.get(3, 1), None);
        assert_eq!(snapshot.occupied_count(), 1);

        let rows: Vec<_> = snapshot.rows().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][2], Color::rgb(1, 2, 3));

        // later writes never reach an earlier snapshot
        grid.paint(Position::new(0, 0), Color::gray(4)).unwrap();
        assert_eq!(snapshot.occupied_count(), 1);
    }

    #[test]
    fn test_index_roundtrip() {
        let grid = Grid::new(7, 3).unwrap();
        assert_eq!(grid.index_to_pos(0), Position::new(0, 0));
        assert_eq!(grid.index_to_pos(8), Position::new(1, 1));
        assert_eq!(grid.index(Position::new(1, 1)), Some(8));
    }
}
