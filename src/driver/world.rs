//! Narrow interfaces to the host game.
//!
//! The engine never reaches into the host's objects. Everything it reads or
//! changes goes through these traits, injected at construction:
//!
//! - `GridService`: cells, paths, distances
//! - `ResourceLedger`: per-player resource totals
//! - `LiveWorld`: units, turn bookkeeping, and action execution

use crate::actions::{ActionRecord, Capabilities};
use crate::core::{PlayerId, Position, UnitId};
use crate::error::WorldError;

/// A path returned by the grid service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathResult {
    /// Cells from the first step to the destination, start excluded.
    pub cells: Vec<Position>,
    /// Movement points the path costs.
    pub cost: i32,
}

/// Grid topology and path queries.
pub trait GridService {
    /// Every cell, in a stable order.
    fn cells(&self) -> &[Position];

    /// Cheapest path from `from` to `to`, or `None` when unreachable.
    fn find_path(&self, from: Position, to: Position) -> Option<PathResult>;

    /// Grid distance between two cells.
    fn distance(&self, a: Position, b: Position) -> u32;
}

/// Per-player resource totals.
pub trait ResourceLedger {
    fn get_value(&self, player: PlayerId) -> i64;

    fn update_value(&mut self, player: PlayerId, delta: i64);
}

/// What the host reports about one unit.
#[derive(Clone, Debug, PartialEq)]
pub struct UnitView {
    pub id: UnitId,
    pub owner: PlayerId,
    pub position: Position,
    pub hp: i32,
    pub total_hp: i32,
    pub attack: i32,
    pub defence: i32,
    pub movement: i32,
    pub total_movement: i32,
    pub attack_range: i32,
    pub action_points: i32,
    pub total_action_points: i32,
    pub is_structure: bool,
    /// Host type name, e.g. `"Knight"` or `"RedBase"`.
    pub type_name: String,
    /// Owner at game start, for structures.
    pub original_owner: Option<PlayerId>,
    pub capabilities: Capabilities,
}

/// The live game the agent plays in.
pub trait LiveWorld {
    fn player_count(&self) -> usize;

    fn current_player(&self) -> PlayerId;

    fn turn_number(&self) -> u32;

    /// All units, structures included.
    fn units(&self) -> Vec<UnitView>;

    /// Consecutive turns `player` has held the Objective.
    fn objective_control_turns(&self, player: PlayerId) -> u32;

    fn is_game_finished(&self) -> bool;

    /// Winner once the game is finished.
    fn winner(&self) -> Option<PlayerId>;

    /// Perform an action for real.
    fn execute(&mut self, record: &ActionRecord) -> Result<(), WorldError>;
}
