//! Numeric effects of actions on a snapshot.
//!
//! Simulation never touches the live world. Units that disappeared earlier in
//! the same plan (killed, or never captured) are skipped.
//!
//! Damage is `max(1, attack - 0.5 * defence)` times a multiplier in
//! `[0.9, 1.1)`. The multiplier comes from a stream keyed on the attacker,
//! the target and the target's current hit points, so the same attack in the
//! same situation rolls the same value on every search branch.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use crate::core::{GameRng, PlayerId, Position};
use crate::state::{StateSnapshot, StructureType, UnitRecord};

use super::action::{Action, ActionRecord, Plan};

/// Base damage before the random multiplier.
#[must_use]
pub fn base_damage(attack: i32, defence: i32) -> f64 {
    (f64::from(attack) - 0.5 * f64::from(defence)).max(1.0)
}

/// Final damage for a given multiplier, truncated like the host does.
#[must_use]
pub fn damage(attack: i32, defence: i32, multiplier: f64) -> i32 {
    (base_damage(attack, defence) * multiplier) as i32
}

/// Order-independent damage multiplier for `attacker` hitting `target`.
#[must_use]
pub fn damage_multiplier(rolls: &GameRng, attacker: &UnitRecord, target: &UnitRecord) -> f64 {
    let mut hasher = FxHasher::default();
    attacker.id.hash(&mut hasher);
    target.id.hash(&mut hasher);
    target.hp.hash(&mut hasher);
    attacker.attack.hash(&mut hasher);
    rolls.keyed(hasher.finish()).gen_range_f64(0.9..1.1)
}

/// Apply every action of `plan`, in order.
pub fn apply_plan(plan: &Plan, state: &mut StateSnapshot, rolls: &GameRng) {
    for record in plan {
        simulate(record, state, rolls);
    }
}

/// Apply one action's numeric effect to `state`.
pub fn simulate(record: &ActionRecord, state: &mut StateSnapshot, rolls: &GameRng) {
    let Some(actor) = state.unit(record.unit).filter(|u| u.is_alive()) else {
        return;
    };
    let owner = actor.owner;

    match record.action {
        Action::Skip => {}

        Action::Move { to } => {
            if let Some(unit) = state.unit_mut(record.unit) {
                unit.position = to;
                unit.movement = 0;
                unit.action_points = (unit.action_points - 1).max(0);
            }
            take_structure(state, to, owner);
        }

        Action::Attack { target } => {
            let Some(defender) = state.unit(target).filter(|u| u.is_alive()) else {
                return;
            };
            let dealt = damage(
                actor.attack,
                defender.defence,
                damage_multiplier(rolls, actor, defender),
            );

            let killed = match state.unit_mut(target) {
                Some(defender) => {
                    defender.hp -= dealt;
                    defender.hp <= 0
                }
                None => false,
            };
            if killed {
                state.remove_unit(target);
            }
            spend_action_point(state, record);
        }

        Action::Capture { .. } => {
            let at = actor.position;
            take_structure(state, at, owner);
            spend_action_point(state, record);
        }

        Action::Spawn { option } => {
            state.add_resources(owner, -option.price);
        }

        Action::UpgradeBase { cost, income_delta } => {
            state.add_resources(owner, income_delta - cost);
        }
    }
}

fn spend_action_point(state: &mut StateSnapshot, record: &ActionRecord) {
    if let Some(unit) = state.unit_mut(record.unit) {
        unit.action_points = (unit.action_points - 1).max(0);
    }
}

/// Flip an enemy or neutral structure on `at` to `player`.
///
/// Taking the Objective restarts the taker's control count.
fn take_structure(state: &mut StateSnapshot, at: Position, player: PlayerId) {
    let taken = match state.structure_at_mut(at) {
        Some(structure) if structure.owner != player => {
            structure.owner = player;
            Some(structure.kind)
        }
        _ => None,
    };
    if taken == Some(StructureType::Objective) {
        state.set_control_turns(player, 0);
    }
}
