//! Rectangular grid with 4-neighbour movement.

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::core::Position;
use crate::driver::{GridService, PathResult};

/// A `width × height` board. Blocked cells are not part of the grid.
#[derive(Clone, Debug)]
pub struct SquareGrid {
    width: i32,
    height: i32,
    cells: Vec<Position>,
    blocked: FxHashSet<Position>,
}

impl SquareGrid {
    /// Cells are listed row by row (y, then x).
    pub fn new(width: i32, height: i32) -> Self {
        let cells = (0..height)
            .flat_map(|y| (0..width).map(move |x| Position::new(x, y)))
            .collect();
        Self {
            width,
            height,
            cells,
            blocked: FxHashSet::default(),
        }
    }

    /// Remove impassable cells from the grid.
    pub fn with_blocked(mut self, blocked: impl IntoIterator<Item = Position>) -> Self {
        self.blocked.extend(blocked);
        self.cells.retain(|c| !self.blocked.contains(c));
        self
    }

    #[must_use]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> i32 {
        self.height
    }

    #[must_use]
    pub fn contains(&self, p: Position) -> bool {
        (0..self.width).contains(&p.x) && (0..self.height).contains(&p.y) && !self.blocked.contains(&p)
    }

    fn neighbours(&self, p: Position) -> impl Iterator<Item = Position> + '_ {
        [(1, 0), (-1, 0), (0, 1), (0, -1)]
            .into_iter()
            .map(move |(dx, dy)| Position::new(p.x + dx, p.y + dy))
            .filter(|n| self.contains(*n))
    }
}

impl GridService for SquareGrid {
    fn cells(&self) -> &[Position] {
        &self.cells
    }

    /// Breadth-first search, one movement point per step.
    fn find_path(&self, from: Position, to: Position) -> Option<PathResult> {
        if !self.contains(from) || !self.contains(to) {
            return None;
        }
        if from == to {
            return Some(PathResult {
                cells: Vec::new(),
                cost: 0,
            });
        }

        let mut came_from: FxHashMap<Position, Position> = FxHashMap::default();
        let mut frontier = VecDeque::from([from]);
        came_from.insert(from, from);

        while let Some(current) = frontier.pop_front() {
            if current == to {
                break;
            }
            for next in self.neighbours(current) {
                if !came_from.contains_key(&next) {
                    came_from.insert(next, current);
                    frontier.push_back(next);
                }
            }
        }

        if !came_from.contains_key(&to) {
            return None;
        }
        let mut cells = vec![to];
        let mut at = to;
        while let Some(&prev) = came_from.get(&at) {
            if prev == from {
                break;
            }
            cells.push(prev);
            at = prev;
        }
        cells.reverse();
        Some(PathResult {
            cost: cells.len() as i32,
            cells,
        })
    }

    fn distance(&self, a: Position, b: Position) -> u32 {
        a.manhattan(b)
    }
}
