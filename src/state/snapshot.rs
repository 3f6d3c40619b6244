//! Snapshot, unit and structure records.
//!
//! ## Lifecycle
//!
//! 1. `StateSnapshot::capture` reads the live world once per decision.
//! 2. The search clones the snapshot per node and applies simulated actions.
//! 3. The cached winner is only re-derived by `refresh_winner`.
//!
//! ## Example
//!
//! ```
//! use tactics_ai::core::{PlayerId, Position, UnitId};
//! use tactics_ai::state::{StateSnapshot, UnitRecord};
//!
//! let mut state = StateSnapshot::new(2, PlayerId::new(0));
//! state.add_unit(UnitRecord::new(UnitId(1), PlayerId::new(0), Position::new(0, 0)));
//!
//! let mut branch = state.clone();
//! branch.unit_mut(UnitId(1)).unwrap().hp = 1;
//!
//! assert_eq!(state.unit(UnitId(1)).unwrap().hp, 10);
//! assert_ne!(state.fingerprint(), branch.fingerprint());
//! ```

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use im::Vector;
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};

use crate::actions::{Capabilities, Capability};
use crate::core::{PlayerId, PlayerMap, Position, UnitId};
use crate::driver::{GridService, LiveWorld, ResourceLedger, UnitView};

/// Consecutive objective-control turns that win the game.
pub const DEFAULT_OBJECTIVE_WIN_TURNS: u32 = 5;

/// Kind of capturable structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StructureType {
    Base,
    Outpost,
    Objective,
}

impl StructureType {
    /// Code used by the state encoder.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            StructureType::Outpost => 1,
            StructureType::Base => 2,
            StructureType::Objective => 3,
        }
    }
}

/// Classify a structure unit by its type name.
#[must_use]
pub fn structure_kind(type_name: &str) -> Option<StructureType> {
    if type_name.contains("Base") {
        Some(StructureType::Base)
    } else if type_name.contains("Outpost") {
        Some(StructureType::Outpost)
    } else if type_name.contains("Objective") {
        Some(StructureType::Objective)
    } else {
        None
    }
}

/// Numeric type code of a unit type name, 0 when unknown.
///
/// ```
/// use tactics_ai::state::unit_type_code;
///
/// assert_eq!(unit_type_code("Archer"), 2);
/// assert_eq!(unit_type_code("ASSASSIN"), 8);
/// assert_eq!(unit_type_code("Outpost"), 0);
/// ```
#[must_use]
pub fn unit_type_code(type_name: &str) -> u8 {
    match type_name.to_ascii_lowercase().as_str() {
        "swordman" => 1,
        "archer" => 2,
        "knight" => 3,
        "spearman" => 4,
        "musketeer" => 5,
        "axeman" => 6,
        "wizard" => 7,
        "assassin" => 8,
        _ => 0,
    }
}

/// A capturable structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Structure {
    pub kind: StructureType,
    pub owner: PlayerId,
    pub original_owner: PlayerId,
    pub position: Position,
}

impl Structure {
    #[must_use]
    pub fn new(kind: StructureType, owner: PlayerId, position: Position) -> Self {
        Self {
            kind,
            owner,
            original_owner: owner,
            position,
        }
    }

    #[must_use]
    pub fn with_original_owner(mut self, original_owner: PlayerId) -> Self {
        self.original_owner = original_owner;
        self
    }
}

/// Everything the search needs to know about one unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitRecord {
    pub id: UnitId,
    pub owner: PlayerId,
    pub position: Position,
    pub hp: i32,
    pub total_hp: i32,
    pub attack: i32,
    pub defence: i32,
    /// Remaining movement points this turn.
    pub movement: i32,
    pub total_movement: i32,
    pub attack_range: i32,
    pub action_points: i32,
    pub total_action_points: i32,
    pub is_structure: bool,
    /// 0 for structures and unknown types, 1..=8 for the soldier types.
    pub unit_type: u8,
    pub capabilities: Capabilities,
}

impl UnitRecord {
    /// A 10 hp unit with no stats and no capabilities.
    #[must_use]
    pub fn new(id: UnitId, owner: PlayerId, position: Position) -> Self {
        Self {
            id,
            owner,
            position,
            hp: 10,
            total_hp: 10,
            attack: 0,
            defence: 0,
            movement: 0,
            total_movement: 0,
            attack_range: 1,
            action_points: 1,
            total_action_points: 1,
            is_structure: false,
            unit_type: 0,
            capabilities: Capabilities::new(),
        }
    }

    /// Convert the live-world view of a unit.
    #[must_use]
    pub fn from_view(view: &UnitView) -> Self {
        Self {
            id: view.id,
            owner: view.owner,
            position: view.position,
            hp: view.hp,
            total_hp: view.total_hp,
            attack: view.attack,
            defence: view.defence,
            movement: view.movement,
            total_movement: view.total_movement,
            attack_range: view.attack_range,
            action_points: view.action_points,
            total_action_points: view.total_action_points,
            is_structure: view.is_structure,
            unit_type: if view.is_structure {
                0
            } else {
                unit_type_code(&view.type_name)
            },
            capabilities: view.capabilities.clone(),
        }
    }

    pub fn with_health(mut self, hp: i32, total_hp: i32) -> Self {
        self.hp = hp;
        self.total_hp = total_hp;
        self
    }

    pub fn with_combat(mut self, attack: i32, defence: i32, attack_range: i32) -> Self {
        self.attack = attack;
        self.defence = defence;
        self.attack_range = attack_range;
        self
    }

    pub fn with_movement(mut self, movement: i32) -> Self {
        self.movement = movement;
        self.total_movement = movement;
        self
    }

    pub fn with_action_points(mut self, action_points: i32) -> Self {
        self.action_points = action_points;
        self.total_action_points = action_points;
        self
    }

    pub fn with_unit_type(mut self, unit_type: u8) -> Self {
        self.unit_type = unit_type;
        self
    }

    pub fn with_capabilities(mut self, capabilities: impl IntoIterator<Item = Capability>) -> Self {
        self.capabilities = capabilities.into_iter().collect();
        self
    }

    /// Mark as an immobile structure unit.
    pub fn as_structure(mut self) -> Self {
        self.is_structure = true;
        self.unit_type = 0;
        self.movement = 0;
        self.total_movement = 0;
        self
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    #[must_use]
    pub fn has_capability(&self, kind: crate::actions::ActionKind) -> bool {
        self.capabilities.iter().any(|c| c.kind() == kind)
    }

    fn hash_content<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.owner.hash(state);
        self.position.hash(state);
        self.hp.hash(state);
        self.total_hp.hash(state);
        self.attack.hash(state);
        self.defence.hash(state);
        self.movement.hash(state);
        self.attack_range.hash(state);
        self.action_points.hash(state);
        self.is_structure.hash(state);
        self.unit_type.hash(state);
    }
}

/// Cloneable world state used only for simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    current_player: PlayerId,
    turn_number: u32,
    units: Vector<UnitRecord>,
    structures: Vector<Structure>,
    resources: PlayerMap<i64>,
    control_turns: PlayerMap<u32>,
    winner: Option<PlayerId>,
    objective_win_turns: u32,
    /// Grid cells in the grid service's order. Never mutated by simulation.
    cells: Arc<[Position]>,
}

impl StateSnapshot {
    /// Empty snapshot with zero resources and no grid.
    #[must_use]
    pub fn new(player_count: usize, current_player: PlayerId) -> Self {
        Self {
            current_player,
            turn_number: 1,
            units: Vector::new(),
            structures: Vector::new(),
            resources: PlayerMap::with_default(player_count),
            control_turns: PlayerMap::with_default(player_count),
            winner: None,
            objective_win_turns: DEFAULT_OBJECTIVE_WIN_TURNS,
            cells: Arc::from(Vec::new()),
        }
    }

    /// Capture the live world from `player`'s point of view.
    ///
    /// Dead units are dropped. Structure units also produce a `Structure`
    /// record, classified by type name.
    pub fn capture(
        world: &dyn LiveWorld,
        ledger: &dyn ResourceLedger,
        grid: &dyn GridService,
        player: PlayerId,
    ) -> Self {
        let player_count = world.player_count();
        let mut units = Vector::new();
        let mut structures = Vector::new();

        for view in world.units() {
            if view.hp <= 0 {
                continue;
            }
            if view.is_structure {
                if let Some(kind) = structure_kind(&view.type_name) {
                    structures.push_back(Structure {
                        kind,
                        owner: view.owner,
                        original_owner: view.original_owner.unwrap_or(view.owner),
                        position: view.position,
                    });
                }
            }
            units.push_back(UnitRecord::from_view(&view));
        }

        let mut snapshot = Self {
            current_player: player,
            turn_number: world.turn_number(),
            units,
            structures,
            resources: PlayerMap::new(player_count, |p| ledger.get_value(p)),
            control_turns: PlayerMap::new(player_count, |p| world.objective_control_turns(p)),
            winner: None,
            objective_win_turns: DEFAULT_OBJECTIVE_WIN_TURNS,
            cells: Arc::from(grid.cells()),
        };
        snapshot.refresh_winner();
        snapshot
    }

    /// Change the win threshold and re-derive the winner.
    pub fn with_objective_win_turns(mut self, turns: u32) -> Self {
        self.objective_win_turns = turns;
        self.refresh_winner();
        self
    }

    pub fn with_cells(mut self, cells: Vec<Position>) -> Self {
        self.cells = Arc::from(cells);
        self
    }

    pub fn with_turn_number(mut self, turn_number: u32) -> Self {
        self.turn_number = turn_number;
        self
    }

    // === Accessors ===

    #[must_use]
    pub fn current_player(&self) -> PlayerId {
        self.current_player
    }

    #[must_use]
    pub fn turn_number(&self) -> u32 {
        self.turn_number
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.resources.player_count()
    }

    #[must_use]
    pub fn cells(&self) -> &[Position] {
        &self.cells
    }

    /// All units in capture order, dead ones included until removed.
    pub fn units(&self) -> impl Iterator<Item = &UnitRecord> {
        self.units.iter()
    }

    /// Live units owned by `player`, in capture order.
    pub fn units_of(&self, player: PlayerId) -> impl Iterator<Item = &UnitRecord> {
        self.units
            .iter()
            .filter(move |u| u.owner == player && u.is_alive())
    }

    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&UnitRecord> {
        self.units.iter().find(|u| u.id == id)
    }

    /// Mutable access; copies the unit's chunk if it is shared with a clone.
    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut UnitRecord> {
        let index = self.units.iter().position(|u| u.id == id)?;
        self.units.get_mut(index)
    }

    /// Live non-structure unit standing on `position`.
    #[must_use]
    pub fn unit_at(&self, position: Position) -> Option<&UnitRecord> {
        self.units
            .iter()
            .find(|u| u.position == position && u.is_alive() && !u.is_structure)
    }

    pub fn structures(&self) -> impl Iterator<Item = &Structure> {
        self.structures.iter()
    }

    #[must_use]
    pub fn structure_at(&self, position: Position) -> Option<&Structure> {
        self.structures.iter().find(|s| s.position == position)
    }

    pub fn structure_at_mut(&mut self, position: Position) -> Option<&mut Structure> {
        let index = self.structures.iter().position(|s| s.position == position)?;
        self.structures.get_mut(index)
    }

    /// Position of the Objective, or `(n / 2, n / 2)` for `n` cells when
    /// there is none.
    ///
    /// `n` is the cell count, not the grid width, so on square grids wider
    /// than one cell the fallback lies off the board. Unit proximity then
    /// favors the far corner; maps without an Objective keep that behavior.
    #[must_use]
    pub fn objective_position(&self) -> Position {
        self.structures
            .iter()
            .find(|s| s.kind == StructureType::Objective)
            .map(|s| s.position)
            .unwrap_or_else(|| {
                let half = (self.cells.len() / 2) as i32;
                Position::new(half, half)
            })
    }

    /// First other player in player order.
    #[must_use]
    pub fn opponent_of(&self, player: PlayerId) -> PlayerId {
        PlayerId::all(self.player_count())
            .find(|p| *p != player)
            .unwrap_or(player)
    }

    #[must_use]
    pub fn resources(&self, player: PlayerId) -> i64 {
        self.resources.value(player)
    }

    #[must_use]
    pub fn control_turns(&self, player: PlayerId) -> u32 {
        self.control_turns.value(player)
    }

    #[must_use]
    pub fn objective_win_turns(&self) -> u32 {
        self.objective_win_turns
    }

    // === Mutation ===

    pub fn add_unit(&mut self, unit: UnitRecord) {
        self.units.push_back(unit);
    }

    /// Remove a unit. Returns the removed record.
    pub fn remove_unit(&mut self, id: UnitId) -> Option<UnitRecord> {
        let index = self.units.iter().position(|u| u.id == id)?;
        Some(self.units.remove(index))
    }

    pub fn add_structure(&mut self, structure: Structure) {
        self.structures.push_back(structure);
    }

    pub fn set_resources(&mut self, player: PlayerId, amount: i64) {
        if let Some(v) = self.resources.get_mut(player) {
            *v = amount;
        }
    }

    pub fn add_resources(&mut self, player: PlayerId, delta: i64) {
        if let Some(v) = self.resources.get_mut(player) {
            *v += delta;
        }
    }

    pub fn set_control_turns(&mut self, player: PlayerId, turns: u32) {
        if let Some(v) = self.control_turns.get_mut(player) {
            *v = turns;
        }
    }

    // === Outcome ===

    /// Cached winner. Stale after mutation until `refresh_winner`.
    #[must_use]
    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.winner.is_some()
    }

    /// Derive the winner from the current content.
    ///
    /// A player wins by holding the Objective for `objective_win_turns`
    /// turns, or by owning a Base that started out as someone else's.
    #[must_use]
    pub fn determine_winner(&self) -> Option<PlayerId> {
        if let Some((player, _)) = self
            .control_turns
            .iter()
            .find(|(_, turns)| **turns >= self.objective_win_turns)
        {
            return Some(player);
        }

        self.structures
            .iter()
            .find(|s| s.kind == StructureType::Base && s.owner != s.original_owner)
            .map(|s| s.owner)
    }

    pub fn refresh_winner(&mut self) {
        self.winner = self.determine_winner();
    }

    /// Content hash over everything simulation can change.
    ///
    /// Two snapshots with equal content have equal fingerprints regardless of
    /// how they were produced.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.current_player.hash(&mut hasher);
        self.turn_number.hash(&mut hasher);
        self.units.len().hash(&mut hasher);
        for unit in &self.units {
            unit.hash_content(&mut hasher);
        }
        self.structures.hash(&mut hasher);
        self.resources.hash(&mut hasher);
        self.control_turns.hash(&mut hasher);
        self.winner.hash(&mut hasher);
        hasher.finish()
    }
}
