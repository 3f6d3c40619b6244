//! Weighted heuristic score of a snapshot from one player's point of view.
//!
//! ## Terms
//!
//! - health: hit points of every live unit, ally minus enemy
//! - resources: ally minus enemy resource totals
//! - structures: outposts held, enemy base captured, objective held plus
//!   control turns
//! - position: `10 / (distance to objective + 1)` per non-structure unit
//!
//! A decided game scores `f64::MAX` (won) or `f64::MIN` (lost). Every other
//! score is clamped to `±SCORE_BOUND` so no non-terminal state can reach the
//! terminal values.

use serde::{Deserialize, Serialize};

use crate::core::{EvalWeights, PlayerId};
use crate::state::{StateSnapshot, StructureType};

/// Magnitude limit for non-terminal scores.
pub const SCORE_BOUND: f64 = 1e300;

/// Individual weighted terms of a non-terminal evaluation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub health: f64,
    pub resources: f64,
    pub structures: f64,
    pub position: f64,
}

impl ScoreBreakdown {
    #[must_use]
    pub fn total(&self) -> f64 {
        (self.health + self.resources + self.structures + self.position)
            .clamp(-SCORE_BOUND, SCORE_BOUND)
    }
}

/// Scores snapshots for `player` against `enemy`.
#[derive(Clone, Debug)]
pub struct HeuristicEvaluator {
    weights: EvalWeights,
    player: PlayerId,
    enemy: PlayerId,
}

impl HeuristicEvaluator {
    pub fn new(weights: EvalWeights, player: PlayerId, enemy: PlayerId) -> Self {
        Self {
            weights,
            player,
            enemy,
        }
    }

    #[must_use]
    pub fn player(&self) -> PlayerId {
        self.player
    }

    #[must_use]
    pub fn enemy(&self) -> PlayerId {
        self.enemy
    }

    #[must_use]
    pub fn weights(&self) -> &EvalWeights {
        &self.weights
    }

    /// Score `state`; higher is better for `player`.
    #[must_use]
    pub fn evaluate(&self, state: &StateSnapshot) -> f64 {
        match state.winner() {
            Some(w) if w == self.player => f64::MAX,
            Some(w) if w == self.enemy => f64::MIN,
            _ => self.breakdown(state).total(),
        }
    }

    /// The weighted terms, ignoring any winner.
    #[must_use]
    pub fn breakdown(&self, state: &StateSnapshot) -> ScoreBreakdown {
        let w = &self.weights;
        let side = |owner: PlayerId| -> f64 {
            if owner == self.player {
                1.0
            } else if owner == self.enemy {
                -1.0
            } else {
                0.0
            }
        };

        let health: f64 = state
            .units()
            .filter(|u| u.is_alive() && !u.is_structure)
            .map(|u| side(u.owner) * f64::from(u.hp) * w.unit_health)
            .sum();

        let resources = state
            .resources(self.player)
            .saturating_sub(state.resources(self.enemy)) as f64;

        let mut structures = 0.0;
        for s in state.structures() {
            match s.kind {
                StructureType::Outpost => structures += side(s.owner) * w.structure_control,
                StructureType::Base => {
                    if s.original_owner == self.enemy && s.owner == self.player {
                        structures += w.structure_control * w.base_capture_multiplier;
                    }
                }
                StructureType::Objective => {
                    let sign = side(s.owner);
                    if sign != 0.0 {
                        let turns = f64::from(state.control_turns(s.owner));
                        structures += sign * (w.objective_control + turns * w.objective_control);
                    }
                }
            }
        }

        let objective = state.objective_position();
        let position: f64 = state
            .units()
            .filter(|u| u.is_alive() && !u.is_structure)
            .map(|u| side(u.owner) * 10.0 / (u.position.euclidean(objective) + 1.0))
            .sum();

        ScoreBreakdown {
            health: health * w.unit_count,
            resources: resources * w.resources,
            structures,
            position: position * w.unit_position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Position, UnitId};
    use crate::state::{Structure, UnitRecord};

    fn p(n: u8) -> PlayerId {
        PlayerId::new(n)
    }

    fn evaluator() -> HeuristicEvaluator {
        HeuristicEvaluator::new(EvalWeights::default(), p(0), p(1))
    }

    fn base_state() -> StateSnapshot {
        let mut state = StateSnapshot::new(2, p(0));
        state.add_structure(Structure::new(StructureType::Objective, p(1), Position::new(5, 5)));
        state.add_unit(UnitRecord::new(UnitId(1), p(0), Position::new(5, 5)).with_health(10, 10));
        state.add_unit(UnitRecord::new(UnitId(2), p(1), Position::new(5, 5)).with_health(10, 10));
        state
    }

    #[test]
    fn test_symmetric_state_scores_objective_only() {
        let state = base_state();
        let b = evaluator().breakdown(&state);
        assert_eq!(b.health, 0.0);
        assert_eq!(b.position, 0.0);
        assert_eq!(b.resources, 0.0);
        assert_eq!(b.structures, -20.0);
    }

    #[test]
    fn test_health_term() {
        let mut state = base_state();
        state.unit_mut(UnitId(2)).unwrap().hp = 4;
        let b = evaluator().breakdown(&state);
        // (10 - 4) hp * 2 per hp * 5
        assert_eq!(b.health, 60.0);
    }

    #[test]
    fn test_structure_terms() {
        let mut state = StateSnapshot::new(2, p(0));
        state.add_structure(Structure::new(StructureType::Outpost, p(0), Position::new(0, 0)));
        state.add_structure(Structure::new(StructureType::Outpost, p(1), Position::new(1, 0)));
        state.add_structure(
            Structure::new(StructureType::Base, p(0), Position::new(2, 0)).with_original_owner(p(1)),
        );
        state.add_structure(Structure::new(StructureType::Objective, p(0), Position::new(3, 0)));
        state.set_control_turns(p(0), 2);

        let b = evaluator().breakdown(&state);
        assert_eq!(b.structures, 10.0 - 10.0 + 50.0 + 20.0 + 40.0);
    }

    #[test]
    fn test_terminal_values_dominate() {
        let mut state = base_state();
        state.set_control_turns(p(0), 5);
        state.refresh_winner();
        assert_eq!(evaluator().evaluate(&state), f64::MAX);

        let mut state = base_state();
        state.set_control_turns(p(1), 5);
        state.refresh_winner();
        assert_eq!(evaluator().evaluate(&state), f64::MIN);
    }

    #[test]
    fn test_non_terminal_is_clamped() {
        let mut state = base_state();
        state.set_resources(p(0), i64::MAX / 2);
        let weights = EvalWeights {
            resources: 1e300,
            ..EvalWeights::default()
        };
        let score = HeuristicEvaluator::new(weights, p(0), p(1)).evaluate(&state);
        assert!(score < f64::MAX);
        assert_eq!(score, SCORE_BOUND);
    }

    #[test]
    fn test_dead_units_ignored() {
        let mut state = base_state();
        state.unit_mut(UnitId(2)).unwrap().hp = -3;
        let b = evaluator().breakdown(&state);
        assert_eq!(b.health, 100.0);
        assert!((b.position - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_structure_units_carry_no_health() {
        let mut state = StateSnapshot::new(2, p(0));
        state.add_unit(
            UnitRecord::new(UnitId(9), p(1), Position::new(0, 0))
                .with_health(100, 100)
                .as_structure(),
        );
        let b = evaluator().breakdown(&state);
        assert_eq!(b.health, 0.0);
        assert_eq!(b.position, 0.0);
    }

    #[test]
    fn test_extreme_resources_saturate() {
        let mut state = base_state();
        state.add_resources(p(0), i64::MAX - 100);
        state.add_resources(p(1), i64::MIN + 100);
        let b = evaluator().breakdown(&state);
        assert_eq!(b.resources, i64::MAX as f64 * EvalWeights::default().resources);
    }
}
