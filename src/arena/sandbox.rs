//! A headless game that plays by the same numeric rules the search simulates.
//!
//! Differences from simulation: damage rolls come from the world's own RNG,
//! spawning places a real unit next to the spawner, and upgrades also raise
//! the owner's per-turn income.

use std::sync::Arc;

use tracing::trace;

use crate::actions::{
    damage, Action, ActionKind, ActionRecord, Capability, SpawnOption, SpawnRoster,
};
use crate::core::{GameRng, PlayerId, PlayerMap, Position, UnitId};
use crate::driver::{GridService, LiveWorld, ResourceLedger, UnitView};
use crate::error::WorldError;
use crate::state::{structure_kind, StructureType, DEFAULT_OBJECTIVE_WIN_TURNS};

use super::grid::SquareGrid;

/// Owner of structures nobody holds yet.
pub const NEUTRAL: PlayerId = PlayerId(u8::MAX);

const UNIT_NAMES: [&str; 8] = [
    "Swordman", "Archer", "Knight", "Spearman", "Musketeer", "Axeman", "Wizard", "Assassin",
];

/// Host type name for a unit type code.
#[must_use]
pub fn unit_type_name(code: u8) -> &'static str {
    code.checked_sub(1)
        .and_then(|i| UNIT_NAMES.get(usize::from(i)))
        .copied()
        .unwrap_or("Unit")
}

/// In-memory `LiveWorld` and `ResourceLedger`.
#[derive(Clone, Debug)]
pub struct SandboxWorld {
    grid: SquareGrid,
    player_count: usize,
    current: PlayerId,
    turn: u32,
    units: Vec<UnitView>,
    resources: PlayerMap<i64>,
    income: PlayerMap<i64>,
    control_turns: PlayerMap<u32>,
    objective_win_turns: u32,
    winner: Option<PlayerId>,
    finished: bool,
    next_id: u32,
    rng: GameRng,
}

impl SandboxWorld {
    pub fn new(grid: SquareGrid, player_count: usize, seed: u64) -> Self {
        Self {
            grid,
            player_count,
            current: PlayerId::new(0),
            turn: 1,
            units: Vec::new(),
            resources: PlayerMap::with_default(player_count),
            income: PlayerMap::with_default(player_count),
            control_turns: PlayerMap::with_default(player_count),
            objective_win_turns: DEFAULT_OBJECTIVE_WIN_TURNS,
            winner: None,
            finished: false,
            next_id: 1,
            rng: GameRng::new(seed).for_context("sandbox"),
        }
    }

    pub fn with_objective_win_turns(mut self, turns: u32) -> Self {
        self.objective_win_turns = turns;
        self
    }

    #[must_use]
    pub fn grid(&self) -> &SquareGrid {
        &self.grid
    }

    /// Add a unit, assigning its id. Returns the id.
    pub fn add_unit(&mut self, mut view: UnitView) -> UnitId {
        let id = UnitId(self.next_id);
        self.next_id += 1;
        view.id = id;
        self.units.push(view);
        id
    }

    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&UnitView> {
        self.units.iter().find(|u| u.id == id)
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut UnitView> {
        self.units.iter_mut().find(|u| u.id == id)
    }

    pub fn set_income(&mut self, player: PlayerId, income: i64) {
        if let Some(v) = self.income.get_mut(player) {
            *v = income;
        }
    }

    #[must_use]
    pub fn income(&self, player: PlayerId) -> i64 {
        self.income.value(player)
    }

    /// Finish the current player's turn and hand over to the next one.
    ///
    /// The finishing player's Objective streak grows while they hold it and
    /// resets otherwise. The next player collects income and refreshes their
    /// units' movement and action points.
    pub fn end_turn(&mut self) {
        if self.finished {
            return;
        }
        let player = self.current;
        let holds = self
            .units
            .iter()
            .any(|u| structure_kind(&u.type_name) == Some(StructureType::Objective) && u.owner == player);
        if let Some(turns) = self.control_turns.get_mut(player) {
            *turns = if holds { *turns + 1 } else { 0 };
        }
        self.check_winner();
        if self.finished {
            return;
        }

        let next = (player.index() + 1) % self.player_count;
        if next == 0 {
            self.turn += 1;
        }
        self.current = PlayerId(next as u8);

        let income = self.income.value(self.current);
        self.update_value(self.current, income);
        for unit in self.units.iter_mut().filter(|u| u.owner == self.current) {
            unit.movement = unit.total_movement;
            unit.action_points = unit.total_action_points;
        }
    }

    fn check_winner(&mut self) {
        if let Some((player, _)) = self
            .control_turns
            .iter()
            .find(|(_, turns)| **turns >= self.objective_win_turns)
        {
            self.winner = Some(player);
        } else {
            self.winner = self
                .units
                .iter()
                .find(|u| {
                    u.is_structure
                        && structure_kind(&u.type_name) == Some(StructureType::Base)
                        && u.original_owner.is_some_and(|o| o != u.owner)
                })
                .map(|u| u.owner);
        }
        self.finished = self.winner.is_some();
    }

    fn index_of(&self, id: UnitId) -> Result<usize, WorldError> {
        self.units
            .iter()
            .position(|u| u.id == id && u.hp > 0)
            .ok_or(WorldError::UnknownUnit(id))
    }

    fn occupied(&self, at: Position) -> bool {
        self.units
            .iter()
            .any(|u| u.hp > 0 && !u.is_structure && u.position == at)
    }

    /// Hand the structure on `at` to `player`; the Objective restarts their streak.
    fn take_structure(&mut self, at: Position, player: PlayerId) {
        let Some(structure) = self
            .units
            .iter_mut()
            .find(|u| u.is_structure && u.position == at && structure_kind(&u.type_name).is_some())
        else {
            return;
        };
        if structure.owner == player {
            return;
        }
        structure.owner = player;
        if structure_kind(&structure.type_name) == Some(StructureType::Objective) {
            if let Some(turns) = self.control_turns.get_mut(player) {
                *turns = 0;
            }
        }
    }

    fn spawn_cell(&self, near: Position) -> Option<Position> {
        self.grid
            .cells()
            .iter()
            .copied()
            .find(|c| self.grid.distance(near, *c) == 1 && !self.occupied(*c))
    }

    fn spawn(&mut self, spawner: usize, option: SpawnOption) -> Result<(), WorldError> {
        let unit = &self.units[spawner];
        let (id, owner, position) = (unit.id, unit.owner, unit.position);
        let illegal = |reason: &str| WorldError::IllegalAction {
            unit: id,
            kind: ActionKind::Spawn,
            reason: reason.to_string(),
        };

        let roster: Arc<SpawnRoster> = unit
            .capabilities
            .iter()
            .find_map(|c| match c {
                Capability::Spawn(roster) => Some(Arc::clone(roster)),
                _ => None,
            })
            .ok_or_else(|| illegal("no spawn capability"))?;
        if !roster.options.contains(&option) {
            return Err(illegal("option not offered"));
        }
        if self.get_value(owner) < option.price {
            return Err(illegal("not enough resources"));
        }
        let fielded = self
            .units
            .iter()
            .filter(|u| u.owner == owner && u.hp > 0 && !u.is_structure)
            .count();
        if fielded >= roster.unit_limit {
            return Err(illegal("unit limit reached"));
        }
        let cell = self.spawn_cell(position).ok_or_else(|| illegal("no free cell"))?;

        self.update_value(owner, -option.price);
        let spawned = self.add_unit(UnitView {
            id: UnitId(0),
            owner,
            position: cell,
            hp: option.hit_points,
            total_hp: option.hit_points,
            attack: option.attack,
            defence: option.defence,
            movement: 0,
            total_movement: option.movement,
            attack_range: option.attack_range,
            action_points: 0,
            total_action_points: 1,
            is_structure: false,
            type_name: unit_type_name(option.unit_type).to_string(),
            original_owner: None,
            capabilities: Capability::soldier(),
        });
        trace!(unit = spawned.0, cell = %cell, "spawned unit");
        Ok(())
    }
}

impl ResourceLedger for SandboxWorld {
    fn get_value(&self, player: PlayerId) -> i64 {
        self.resources.value(player)
    }

    fn update_value(&mut self, player: PlayerId, delta: i64) {
        if let Some(v) = self.resources.get_mut(player) {
            *v += delta;
        }
    }
}

impl LiveWorld for SandboxWorld {
    fn player_count(&self) -> usize {
        self.player_count
    }

    fn current_player(&self) -> PlayerId {
        self.current
    }

    fn turn_number(&self) -> u32 {
        self.turn
    }

    fn units(&self) -> Vec<UnitView> {
        self.units.iter().filter(|u| u.hp > 0).cloned().collect()
    }

    fn objective_control_turns(&self, player: PlayerId) -> u32 {
        self.control_turns.value(player)
    }

    fn is_game_finished(&self) -> bool {
        self.finished
    }

    fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    fn execute(&mut self, record: &ActionRecord) -> Result<(), WorldError> {
        let index = self.index_of(record.unit)?;
        let actor = self.units[index].clone();
        let kind = record.action.kind();
        let illegal = |reason: &str| WorldError::IllegalAction {
            unit: actor.id,
            kind,
            reason: reason.to_string(),
        };

        if self.finished {
            return Err(illegal("game is over"));
        }
        if actor.owner != self.current {
            return Err(illegal("not this player's turn"));
        }
        if kind != ActionKind::Skip && !actor.capabilities.iter().any(|c| c.kind() == kind) {
            return Err(illegal("missing capability"));
        }

        match record.action {
            Action::Skip => {}

            Action::Move { to } => {
                if actor.action_points <= 0 || actor.movement <= 0 {
                    return Err(illegal("exhausted"));
                }
                if self.occupied(to) {
                    return Err(illegal("destination occupied"));
                }
                let path = self
                    .grid
                    .find_path(actor.position, to)
                    .filter(|p| p.cost <= actor.movement)
                    .ok_or_else(|| illegal("destination out of reach"))?;
                let unit = &mut self.units[index];
                unit.position = to;
                unit.movement = 0;
                unit.action_points -= 1;
                trace!(unit = actor.id.0, steps = path.cost, "moved");
                self.take_structure(to, actor.owner);
            }

            Action::Attack { target } => {
                let t = self.index_of(target)?;
                if actor.action_points <= 0 {
                    return Err(illegal("exhausted"));
                }
                let defender = &self.units[t];
                if defender.owner == actor.owner || defender.is_structure {
                    return Err(illegal("invalid target"));
                }
                if self.grid.distance(actor.position, defender.position) as i32 > actor.attack_range {
                    return Err(illegal("target out of range"));
                }
                let dealt = damage(
                    actor.attack,
                    defender.defence,
                    self.rng.gen_range_f64(0.9..1.1),
                );
                self.units[t].hp -= dealt;
                if self.units[t].hp <= 0 {
                    self.units.remove(t);
                }
                if let Some(unit) = self.unit_mut(actor.id) {
                    unit.action_points -= 1;
                }
            }

            Action::Capture { at } => {
                if actor.action_points <= 0 {
                    return Err(illegal("exhausted"));
                }
                if at != actor.position {
                    return Err(illegal("not standing on the structure"));
                }
                self.take_structure(at, actor.owner);
                self.units[index].action_points -= 1;
            }

            Action::Spawn { option } => self.spawn(index, option)?,

            Action::UpgradeBase { cost, income_delta } => {
                if self.get_value(actor.owner) < cost {
                    return Err(illegal("not enough resources"));
                }
                self.update_value(actor.owner, income_delta - cost);
                if let Some(v) = self.income.get_mut(actor.owner) {
                    *v += income_delta;
                }
            }
        }

        self.check_winner();
        Ok(())
    }
}
