//! Per-unit legal action enumeration.
//!
//! For every capability a unit carries, the catalog runs two steps:
//!
//! 1. `should_execute`: a cheap gate (action points, a target in range,
//!    affordable spawn options)
//! 2. `precalculate`: target or destination selection by a small scoring
//!    function, producing one fully-parameterized `Action`
//!
//! Results are memoized per (snapshot fingerprint, unit), so revisiting a
//! transposition in the search costs a hash lookup.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::trace;

use crate::core::{PlayerId, Position, UnitId};
use crate::driver::GridService;
use crate::state::{StateSnapshot, StructureType, UnitRecord};

use super::action::Action;
use super::capability::{Capability, SpawnOption, SpawnRoster};

/// Legal actions of one unit, in capability order.
pub type UnitActions = SmallVec<[Action; 4]>;

/// Enumerates and memoizes per-unit actions over snapshots.
pub struct ActionCatalog<'g> {
    grid: &'g dyn GridService,
    memo: FxHashMap<(u64, UnitId), UnitActions>,
}

impl<'g> ActionCatalog<'g> {
    pub fn new(grid: &'g dyn GridService) -> Self {
        Self {
            grid,
            memo: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn grid(&self) -> &'g dyn GridService {
        self.grid
    }

    /// Number of memoized (state, unit) entries.
    #[must_use]
    pub fn memo_len(&self) -> usize {
        self.memo.len()
    }

    pub fn clear(&mut self) {
        self.memo.clear();
    }

    /// Legal actions for `unit` in `state`.
    pub fn legal_actions(&mut self, state: &StateSnapshot, unit: UnitId) -> UnitActions {
        self.legal_actions_keyed(state, state.fingerprint(), unit)
    }

    /// Same as `legal_actions` with a precomputed fingerprint of `state`.
    pub fn legal_actions_keyed(
        &mut self,
        state: &StateSnapshot,
        state_key: u64,
        unit: UnitId,
    ) -> UnitActions {
        if let Some(cached) = self.memo.get(&(state_key, unit)) {
            return cached.clone();
        }

        let mut actions = UnitActions::new();
        if let Some(record) = state.unit(unit).filter(|u| u.is_alive()) {
            for capability in &record.capabilities {
                if !self.should_execute(record, capability, state) {
                    continue;
                }
                if let Some(action) = self.precalculate(record, capability, state) {
                    actions.push(action);
                }
            }
        }

        trace!(unit = unit.0, count = actions.len(), "legal actions");
        self.memo.insert((state_key, unit), actions.clone());
        actions
    }

    /// Cheap precondition for a capability.
    #[must_use]
    pub fn should_execute(
        &self,
        unit: &UnitRecord,
        capability: &Capability,
        state: &StateSnapshot,
    ) -> bool {
        if !unit.is_alive() {
            return false;
        }
        match capability {
            Capability::Move => {
                !unit.is_structure && unit.movement > 0 && unit.action_points > 0
            }
            Capability::Attack => {
                unit.action_points > 0 && self.enemies_in_range(unit, state).next().is_some()
            }
            Capability::Capture => {
                unit.action_points > 0
                    && state
                        .structure_at(unit.position)
                        .is_some_and(|s| s.owner != unit.owner)
            }
            Capability::Spawn(roster) => {
                let money = state.resources(unit.owner);
                field_count(state, unit.owner) < roster.unit_limit
                    && roster.options.iter().any(|o| o.price <= money)
            }
            Capability::UpgradeBase { cost, .. } => state.resources(unit.owner) >= *cost,
        }
    }

    /// Choose the concrete action for a gated capability.
    ///
    /// Returns `None` when no choice is worth taking (no destination better
    /// than staying put, an upgrade with poor return).
    pub fn precalculate(
        &self,
        unit: &UnitRecord,
        capability: &Capability,
        state: &StateSnapshot,
    ) -> Option<Action> {
        match capability {
            Capability::Move => self.best_destination(unit, state).map(|to| Action::Move { to }),
            Capability::Attack => self.best_target(unit, state).map(|target| Action::Attack { target }),
            Capability::Capture => Some(Action::Capture { at: unit.position }),
            Capability::Spawn(roster) => {
                best_spawn_option(unit.owner, roster, state).map(|option| Action::Spawn { option })
            }
            Capability::UpgradeBase { cost, income_delta } => {
                upgrade_worthwhile(*cost, *income_delta, state.resources(unit.owner), state.turn_number())
                    .then_some(Action::UpgradeBase {
                        cost: *cost,
                        income_delta: *income_delta,
                    })
            }
        }
    }

    // === Attack ===

    fn enemies_in_range<'s>(
        &'s self,
        unit: &'s UnitRecord,
        state: &'s StateSnapshot,
    ) -> impl Iterator<Item = &'s UnitRecord> + 's {
        state.units().filter(move |e| {
            e.owner != unit.owner
                && e.is_alive()
                && !e.is_structure
                && self.grid.distance(unit.position, e.position) as i32 <= unit.attack_range
        })
    }

    fn best_target(&self, unit: &UnitRecord, state: &StateSnapshot) -> Option<UnitId> {
        let mut best: Option<(UnitId, f64)> = None;
        for enemy in self.enemies_in_range(unit, state) {
            let score = kill_potential(unit, enemy);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((enemy.id, score));
            }
        }
        best.map(|(id, _)| id)
    }

    // === Move ===

    fn best_destination(&self, unit: &UnitRecord, state: &StateSnapshot) -> Option<Position> {
        let objective = state.objective_position();
        let stay = self.cell_score(unit, unit.position, objective, state);

        let mut best: Option<(Position, f64)> = None;
        for &cell in state.cells() {
            if cell == unit.position
                || self.grid.distance(unit.position, cell) as i32 > unit.movement
                || state.unit_at(cell).is_some()
            {
                continue;
            }
            let reachable = self
                .grid
                .find_path(unit.position, cell)
                .is_some_and(|path| path.cost <= unit.movement);
            if !reachable {
                continue;
            }

            let score = self.cell_score(unit, cell, objective, state);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((cell, score));
            }
        }

        best.filter(|(_, score)| *score > stay).map(|(cell, _)| cell)
    }

    fn cell_score(
        &self,
        unit: &UnitRecord,
        cell: Position,
        objective: Position,
        state: &StateSnapshot,
    ) -> f64 {
        let capture = match state.structure_at(cell) {
            Some(s) if s.owner != unit.owner => match s.kind {
                StructureType::Objective | StructureType::Base => 3.0,
                StructureType::Outpost => 2.0,
            },
            _ => 0.0,
        };

        let proximity = 10.0 / (f64::from(self.grid.distance(cell, objective)) + 1.0);

        let enemies = move || {
            state
                .units()
                .filter(move |e| e.owner != unit.owner && e.is_alive() && !e.is_structure)
        };

        let opportunity = if enemies()
            .any(|e| self.grid.distance(cell, e.position) as i32 <= unit.attack_range)
        {
            1.0
        } else {
            0.0
        };

        let threat: i32 = enemies()
            .filter(|e| self.grid.distance(e.position, cell) as i32 <= e.total_movement + e.attack_range)
            .map(|e| e.attack)
            .sum();
        let danger = f64::from(threat.clamp(0, 10)) / 10.0;

        capture + proximity + opportunity - danger
    }
}

/// Kill-potential score of attacking `target`.
fn kill_potential(attacker: &UnitRecord, target: &UnitRecord) -> f64 {
    let damage = (f64::from(attacker.attack) - 0.5 * f64::from(target.defence)).max(1.0);
    let hp = f64::from(target.hp.max(1));
    let mut score = damage / hp;
    if damage >= hp {
        score += 3.0;
    }
    if target.total_hp > 0 {
        score += 2.0 * (1.0 - hp / f64::from(target.total_hp));
    }
    if target.attack_range > 1 {
        score += 1.5;
    }
    if target.attack > 15 {
        score += 1.0;
    }
    score
}

/// Non-structure units a player fields.
fn field_count(state: &StateSnapshot, player: PlayerId) -> usize {
    state.units_of(player).filter(|u| !u.is_structure).count()
}

fn best_spawn_option(
    owner: PlayerId,
    roster: &SpawnRoster,
    state: &StateSnapshot,
) -> Option<SpawnOption> {
    let money = state.resources(owner);
    if field_count(state, owner) >= roster.unit_limit {
        return None;
    }

    let mut best: Option<(SpawnOption, f64)> = None;
    for option in roster.options.iter().filter(|o| o.price <= money) {
        let mut score = 0.5 * f64::from(option.attack)
            + 0.4 * f64::from(option.defence)
            + 0.1 * f64::from(option.hit_points)
            + 0.5 * f64::from(option.movement);
        if option.attack_range > 1 {
            score += f64::from(option.attack_range);
        }
        let ratio = if money > 0 {
            option.price as f64 / money as f64
        } else {
            0.0
        };
        if ratio > 0.7 {
            score -= (ratio - 0.7) * 10.0;
        }
        if !state
            .units_of(owner)
            .any(|u| !u.is_structure && u.unit_type == option.unit_type)
        {
            score += 2.0;
        }

        if best.map_or(true, |(_, s)| score > s) {
            best = Some((*option, score));
        }
    }
    best.map(|(option, _)| option)
}

/// Return-on-investment check for a base upgrade.
#[must_use]
pub fn upgrade_worthwhile(cost: i64, income_delta: i64, money: i64, turn: u32) -> bool {
    if money < cost || cost as f64 > money as f64 * 0.7 || income_delta <= 0 {
        return false;
    }
    let break_even = cost as f64 / income_delta as f64;
    if break_even > 15.0 || (break_even > 10.0 && turn < 5) {
        return false;
    }

    if turn < 3 {
        break_even <= 7.0
    } else if turn < 10 {
        break_even <= 5.0 && money as f64 > cost as f64 * 1.5
    } else {
        break_even <= 3.0 || money as f64 > cost as f64 * 3.0
    }
}
