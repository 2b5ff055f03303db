//! Core type definitions for the simulation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Simulation time, in ticks. Signed because seed bunnies are born before tick 0.
pub type Tick = i64;

/// Unique identifier for a bunny. Assigned in creation order and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BunnyId(pub u64);

impl fmt::Display for BunnyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 2D position in the meadow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
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

    /// Apply toroidal wrapping for given meadow dimensions
    pub fn wrap(&self, width: i32, height: i32) -> Self {
        Self {
            x: self.x.rem_euclid(width),
            y: self.y.rem_euclid(height),
        }
    }

    pub fn in_bounds(&self, width: i32, height: i32) -> bool {
        (0..width).contains(&self.x) && (0..height).contains(&self.y)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One of the eight Moore directions. North decreases `y`, east increases `x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    pub fn to_delta(&self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::NorthEast => (1, -1),
            Direction::East => (1, 0),
            Direction::SouthEast => (1, 1),
            Direction::South => (0, 1),
            Direction::SouthWest => (-1, 1),
            Direction::West => (-1, 0),
            Direction::NorthWest => (-1, -1),
        }
    }

    /// All directions, clockwise from north. Hop candidates are listed in this
    /// order, so changing it changes which patch a given random draw selects.
    pub fn all() -> [Direction; 8] {
        [
            Direction::North,
            Direction::NorthEast,
            Direction::East,
            Direction::SouthEast,
            Direction::South,
            Direction::SouthWest,
            Direction::West,
            Direction::NorthWest,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn opposite(&self) -> Sex {
        match self {
            Sex::Male => Sex::Female,
            Sex::Female => Sex::Male,
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Male => write!(f, "male"),
            Sex::Female => write!(f, "female"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_wrap() {
        let pos = Position::new(5, 5);
        assert_eq!(pos.wrap(10, 10), Position::new(5, 5));

        let pos = Position::new(-1, -1);
        assert_eq!(pos.wrap(10, 10), Position::new(9, 9));

        let pos = Position::new(10, 10);
        assert_eq!(pos.wrap(10, 10), Position::new(0, 0));
    }

    #[test]
    fn test_in_bounds() {
        assert!(Position::new(0, 0).in_bounds(3, 2));
        assert!(Position::new(2, 1).in_bounds(3, 2));
        assert!(!Position::new(3, 1).in_bounds(3, 2));
        assert!(!Position::new(0, -1).in_bounds(3, 2));
    }

    #[test]
    fn test_direction_delta() {
        assert_eq!(Direction::North.to_delta(), (0, -1));
        assert_eq!(Direction::South.to_delta(), (0, 1));
        assert_eq!(Direction::East.to_delta(), (1, 0));
        assert_eq!(Direction::West.to_delta(), (-1, 0));
        assert_eq!(Direction::NorthEast.to_delta(), (1, -1));
        assert_eq!(Direction::SouthWest.to_delta(), (-1, 1));
    }

    #[test]
    fn test_directions_are_distinct() {
        let deltas: std::collections::HashSet<_> =
            Direction::all().iter().map(|d| d.to_delta()).collect();
        assert_eq!(deltas.len(), 8);
        assert!(!deltas.contains(&(0, 0)));
    }

    #[test]
    fn test_sex_opposite() {
        assert_eq!(Sex::Male.opposite(), Sex::Female);
        assert_eq!(Sex::Female.opposite(), Sex::Male);
        assert_eq!(serde_json::to_string(&Sex::Female).unwrap(), "\"female\"");
    }
}
