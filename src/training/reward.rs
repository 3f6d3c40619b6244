//! Shaped rewards for actions executed against the live world.

use rustc_hash::FxHashSet;

use crate::actions::{Action, ActionRecord, SpawnOption};
use crate::core::{PlayerId, Position, RewardWeights};
use crate::state::{StateSnapshot, StructureType};

/// Scores one executed action by diffing the snapshots around it.
///
/// Each structure pays its capture reward at most once per game; call
/// `reset` between games.
#[derive(Clone, Debug)]
pub struct RewardShaper {
    weights: RewardWeights,
    captured: FxHashSet<Position>,
}

impl RewardShaper {
    pub fn new(weights: RewardWeights) -> Self {
        Self {
            weights,
            captured: FxHashSet::default(),
        }
    }

    #[must_use]
    pub fn weights(&self) -> &RewardWeights {
        &self.weights
    }

    /// Structures captured this game.
    #[must_use]
    pub fn structures_captured(&self) -> u32 {
        self.captured.len() as u32
    }

    pub fn reset(&mut self) {
        self.captured.clear();
    }

    /// Reward for `record`, executed by `player`, that turned `before` into `after`.
    pub fn action_reward(
        &mut self,
        record: &ActionRecord,
        before: &StateSnapshot,
        after: &StateSnapshot,
        player: PlayerId,
    ) -> f32 {
        let mut reward = 0.0;

        match record.action {
            Action::Attack { target } => {
                if let Some(hp_before) = before.unit(target).map(|u| u.hp) {
                    let hp_after = after.unit(target).map_or(0, |u| u.hp.max(0));
                    let dealt = hp_before - hp_after;
                    if dealt > 0 {
                        reward += dealt as f32 * self.weights.damage_dealt;
                        if hp_after <= 0 {
                            reward += self.weights.unit_kill;
                        }
                    }
                }
            }
            Action::Move { to } => reward += self.capture_reward(to, before, after, player),
            Action::Capture { at } => reward += self.capture_reward(at, before, after, player),
            Action::Spawn { option } => reward += spawn_value(&option) * self.weights.unit_production,
            Action::UpgradeBase { .. } => reward += self.weights.base_upgrade,
            Action::Skip => {}
        }

        let w = &self.weights;
        let held_before = holds_objective(before, player);
        let held_after = holds_objective(after, player);
        if held_after && !held_before {
            reward += w.objective_capture;
        } else if held_after {
            reward += w.objective_control_turn;
        }

        if let Some(winner) = after.winner() {
            reward += if winner == player { w.win } else { w.lose };
        }

        reward
    }

    /// Reward for the end of a game.
    #[must_use]
    pub fn terminal_reward(&self, won: bool) -> f32 {
        if won {
            self.weights.win
        } else {
            self.weights.lose
        }
    }

    fn capture_reward(
        &mut self,
        at: Position,
        before: &StateSnapshot,
        after: &StateSnapshot,
        player: PlayerId,
    ) -> f32 {
        let was_ours = before.structure_at(at).is_some_and(|s| s.owner == player);
        let Some(structure) = after.structure_at(at).filter(|s| s.owner == player) else {
            return 0.0;
        };
        if was_ours || !self.captured.insert(at) {
            return 0.0;
        }
        match structure.kind {
            StructureType::Outpost => self.weights.outpost_capture,
            StructureType::Base => self.weights.base_capture,
            StructureType::Objective => self.weights.objective_capture,
        }
    }
}

/// Quality of a spawned unit.
#[must_use]
pub fn spawn_value(option: &SpawnOption) -> f32 {
    let mut value = option.attack as f32
        + option.defence as f32
        + option.hit_points as f32 / 5.0
        + option.movement as f32 / 2.0;
    if option.attack_range > 1 {
        value += option.attack_range as f32;
    }
    value
}

fn holds_objective(state: &StateSnapshot, player: PlayerId) -> bool {
    state
        .structures()
        .any(|s| s.kind == StructureType::Objective && s.owner == player)
}
