//! Unit identifiers and grid coordinates.
//!
//! ## Usage
//!
//! ```
//! use tactics_ai::core::{Position, UnitId};
//!
//! let a = Position::new(0, 0);
//! let b = Position::new(3, 4);
//!
//! assert_eq!(a.euclidean(b), 5.0);
//! assert_eq!(a.manhattan(b), 7);
//! assert_eq!(UnitId(12).to_string(), "Unit 12");
//! ```

use serde::{Deserialize, Serialize};

/// Stable identifier the host game assigns to every unit, structures included.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl UnitId {
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Unit {}", self.0)
    }
}

/// Offset coordinate of a grid cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Straight-line distance, used by the positional heuristics.
    #[must_use]
    pub fn euclidean(self, other: Position) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        (dx * dx + dy * dy).sqrt()
    }

    /// Taxicab distance.
    #[must_use]
    pub fn manhattan(self, other: Position) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distances() {
        let a = Position::new(1, 1);
        let b = Position::new(4, 5);

        assert_eq!(a.manhattan(b), 7);
        assert!((a.euclidean(b) - 5.0).abs() < 1e-12);
        assert_eq!(a.manhattan(a), 0);
    }

    #[test]
    fn test_negative_coordinates() {
        let a = Position::new(-2, 0);
        let b = Position::new(2, 0);
        assert_eq!(a.manhattan(b), 4);
    }

    #[test]
    fn test_serialization() {
        let p = Position::new(3, -1);
        let json = serde_json::to_string(&p).unwrap();
        let back: Position = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);

        let id = UnitId(7);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "7");
    }
}
