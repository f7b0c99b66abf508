//! Grid primitives shared by the simulation and the world oracle.
//!
//! The grid uses screen orientation: `x` grows east, `y` grows south. A
//! building's origin is the top-left cell of its footprint.

use glam::Vec2;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// GridPosition
// ---------------------------------------------------------------------------

/// A cell on the 2D grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: i32,
    pub y: i32,
}

impl GridPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The adjacent cell in the given direction.
    pub fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.offset();
        Self::new(self.x + dx, self.y + dy)
    }

    /// Manhattan distance to another position.
    pub fn manhattan_distance(&self, other: &GridPosition) -> u32 {
        (self.x - other.x).unsigned_abs() + (self.y - other.y).unsigned_abs()
    }

    /// Center of this cell in continuous world space.
    pub fn center(self) -> Vec2 {
        Vec2::new(self.x as f32 + 0.5, self.y as f32 + 0.5)
    }
}

// ---------------------------------------------------------------------------
// Direction / Rotation
// ---------------------------------------------------------------------------

/// Cardinal directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// All four cardinal directions, clockwise from north.
    pub fn all() -> [Direction; 4] {
        [
            Direction::North,
            Direction::East,
            Direction::South,
            Direction::West,
        ]
    }

    /// Cell offset for this direction.
    pub fn offset(&self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
        }
    }

    pub fn opposite(self) -> Self {
        self.clockwise().clockwise()
    }

    /// The direction 90 degrees clockwise (a mover's right hand).
    pub fn clockwise(self) -> Self {
        match self {
            Direction::North => Direction::East,
            Direction::East => Direction::South,
            Direction::South => Direction::West,
            Direction::West => Direction::North,
        }
    }

    /// The direction 90 degrees counter-clockwise (a mover's left hand).
    pub fn counter_clockwise(self) -> Self {
        match self {
            Direction::North => Direction::West,
            Direction::East => Direction::North,
            Direction::South => Direction::East,
            Direction::West => Direction::South,
        }
    }
}

/// Rotation applied to a building. `None` faces north.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    None,
    Cw90,
    Cw180,
    Cw270,
}

impl Rotation {
    pub fn all() -> [Rotation; 4] {
        [
            Rotation::None,
            Rotation::Cw90,
            Rotation::Cw180,
            Rotation::Cw270,
        ]
    }

    /// Rotation from a quarter-turn count (0-3). Larger values wrap.
    pub fn from_quarter_turns(turns: u8) -> Self {
        match turns % 4 {
            0 => Rotation::None,
            1 => Rotation::Cw90,
            2 => Rotation::Cw180,
            _ => Rotation::Cw270,
        }
    }

    pub fn quarter_turns(self) -> u8 {
        match self {
            Rotation::None => 0,
            Rotation::Cw90 => 1,
            Rotation::Cw180 => 2,
            Rotation::Cw270 => 3,
        }
    }

    pub fn rotate_cw(self) -> Self {
        Self::from_quarter_turns(self.quarter_turns() + 1)
    }

    pub fn rotate_ccw(self) -> Self {
        Self::from_quarter_turns(self.quarter_turns() + 3)
    }

    /// The direction a building with this rotation faces.
    pub fn facing(self) -> Direction {
        match self {
            Rotation::None => Direction::North,
            Rotation::Cw90 => Direction::East,
            Rotation::Cw180 => Direction::South,
            Rotation::Cw270 => Direction::West,
        }
    }
}

// ---------------------------------------------------------------------------
// Footprint
// ---------------------------------------------------------------------------

/// The square footprint of a building on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Footprint {
    pub size: u32,
}

impl Footprint {
    /// An NxN footprint. A size of 0 is clamped to 1.
    pub fn square(size: u32) -> Self {
        Self {
            size: size.max(1),
        }
    }

    pub fn single() -> Self {
        Self::square(1)
    }

    /// Iterate over all cells covered by this footprint at the given origin,
    /// row by row.
    pub fn tiles(&self, origin: GridPosition) -> impl Iterator<Item = GridPosition> {
        let n = self.size as i32;
        (0..n).flat_map(move |dy| (0..n).map(move |dx| GridPosition::new(origin.x + dx, origin.y + dy)))
    }

    pub fn contains(&self, origin: GridPosition, pos: GridPosition) -> bool {
        let n = self.size as i32;
        pos.x >= origin.x && pos.x < origin.x + n && pos.y >= origin.y && pos.y < origin.y + n
    }

    /// Cells just outside the footprint, grouped by side: north row, east
    /// column, south row, west column.
    pub fn perimeter(&self, origin: GridPosition) -> Vec<(Direction, GridPosition)> {
        let n = self.size as i32;
        let mut cells = Vec::with_capacity(4 * self.size as usize);
        for dir in Direction::all() {
            for i in 0..n {
                let pos = match dir {
                    Direction::North => GridPosition::new(origin.x + i, origin.y - 1),
                    Direction::East => GridPosition::new(origin.x + n, origin.y + i),
                    Direction::South => GridPosition::new(origin.x + i, origin.y + n),
                    Direction::West => GridPosition::new(origin.x - 1, origin.y + i),
                };
                cells.push((dir, pos));
            }
        }
        cells
    }

    /// The cell just outside the footprint on side `dir`, centered on that
    /// side (rounding toward the origin for even sizes).
    pub fn side_cell(&self, origin: GridPosition, dir: Direction) -> GridPosition {
        let n = self.size as i32;
        let mid = (n - 1) / 2;
        match dir {
            Direction::North => GridPosition::new(origin.x + mid, origin.y - 1),
            Direction::East => GridPosition::new(origin.x + n, origin.y + mid),
            Direction::South => GridPosition::new(origin.x + mid, origin.y + n),
            Direction::West => GridPosition::new(origin.x - 1, origin.y + mid),
        }
    }

    /// Center of the footprint in continuous world space.
    pub fn center(&self, origin: GridPosition) -> Vec2 {
        let half = self.size as f32 * 0.5;
        Vec2::new(origin.x as f32 + half, origin.y as f32 + half)
    }
}
