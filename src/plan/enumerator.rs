//! Bounded enumeration of one player's turn plans.
//!
//! Plans are built by backtracking over the player's units: for each unit,
//! first every legal action, then the "skip" branch. Two bounds keep this
//! tractable:
//!
//! - only the `max_units` most important units take part
//! - generation stops after `max_plans` plans
//!
//! The output is deterministic: units are visited in snapshot order (or a
//! stable importance order) and actions in capability order.

use tracing::debug;

use crate::actions::{ActionCatalog, ActionRecord, Plan, UnitActions};
use crate::core::{PlayerId, Position, SearchConfig, UnitId};
use crate::state::{StateSnapshot, UnitRecord};

/// Generates candidate plans for the player to move.
#[derive(Clone, Debug)]
pub struct PlanEnumerator {
    max_units: usize,
    max_plans: usize,
}

impl Default for PlanEnumerator {
    fn default() -> Self {
        Self::new(3, 100)
    }
}

impl PlanEnumerator {
    pub fn new(max_units: usize, max_plans: usize) -> Self {
        Self {
            max_units,
            max_plans,
        }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(config.max_units, config.max_plans)
    }

    #[must_use]
    pub fn max_units(&self) -> usize {
        self.max_units
    }

    #[must_use]
    pub fn max_plans(&self) -> usize {
        self.max_plans
    }

    /// All candidate plans for `player`, never empty.
    pub fn enumerate(
        &self,
        state: &StateSnapshot,
        player: PlayerId,
        catalog: &mut ActionCatalog<'_>,
    ) -> Vec<Plan> {
        let units = self.select_units(state, player, catalog);

        let mut plans = Vec::new();
        let mut current = Plan::empty();
        self.backtrack(&units, 0, &mut current, &mut plans);

        if plans.is_empty() {
            plans.push(Plan::empty());
        }

        debug!(
            player = player.0,
            units = units.len(),
            plans = plans.len(),
            "enumerated plans"
        );
        plans
    }

    /// Units taking part in this turn's plans, with their legal actions.
    ///
    /// When the player has more than `max_units` live units, they are ranked
    /// by `unit_importance` (stable, so equal scores keep snapshot order).
    pub fn select_units(
        &self,
        state: &StateSnapshot,
        player: PlayerId,
        catalog: &mut ActionCatalog<'_>,
    ) -> Vec<(UnitId, UnitActions)> {
        let key = state.fingerprint();
        let mut units: Vec<(UnitId, UnitActions)> = state
            .units_of(player)
            .map(|u| (u.id, catalog.legal_actions_keyed(state, key, u.id)))
            .collect();

        if units.len() > self.max_units {
            let objective = state.objective_position();
            let mut ranked: Vec<(f64, (UnitId, UnitActions))> = units
                .into_iter()
                .map(|(id, actions)| {
                    let score = state
                        .unit(id)
                        .map_or(0.0, |u| unit_importance(u, objective, !actions.is_empty()));
                    (score, (id, actions))
                })
                .collect();
            ranked.sort_by(|a, b| b.0.total_cmp(&a.0));
            units = ranked
                .into_iter()
                .take(self.max_units)
                .map(|(_, entry)| entry)
                .collect();
        }

        units
    }

    fn backtrack(
        &self,
        units: &[(UnitId, UnitActions)],
        index: usize,
        current: &mut Plan,
        plans: &mut Vec<Plan>,
    ) {
        if plans.len() >= self.max_plans {
            return;
        }
        let Some((unit, actions)) = units.get(index) else {
            plans.push(current.clone());
            return;
        };

        for action in actions {
            current.push(ActionRecord::new(*unit, *action));
            self.backtrack(units, index + 1, current, plans);
            current.pop();
            if plans.len() >= self.max_plans {
                return;
            }
        }

        // Skip branch. A unit with no legal action only has this one.
        self.backtrack(units, index + 1, current, plans);
    }
}

/// How much a unit matters when the unit cap forces a choice.
///
/// Combines damage sustained, raw power, proximity to the objective, and
/// whether it can act at all. Structures only score the last term.
#[must_use]
pub fn unit_importance(unit: &UnitRecord, objective: Position, has_action: bool) -> f64 {
    let action_bonus = if has_action { 5.0 } else { 0.0 };
    if unit.is_structure {
        return action_bonus;
    }

    let damage_taken = if unit.total_hp > 0 {
        (1.0 - f64::from(unit.hp) / f64::from(unit.total_hp)) * 20.0
    } else {
        0.0
    };
    let power = f64::from(unit.attack + unit.defence) * 0.5;
    let proximity = 10.0 / (unit.position.euclidean(objective) + 1.0);

    damage_taken + power + proximity + action_bonus
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{Action, ActionKind, Capability};
    use crate::arena::SquareGrid;
    use crate::driver::GridService;

    fn p(n: u8) -> PlayerId {
        PlayerId::new(n)
    }

    fn fighter(id: u32, owner: PlayerId, x: i32, y: i32) -> UnitRecord {
        UnitRecord::new(UnitId(id), owner, Position::new(x, y))
            .with_health(20, 20)
            .with_combat(8, 2, 1)
            .with_action_points(1)
            .with_capabilities([Capability::Attack])
    }

    /// Player 0 has `count` attackers each adjacent to one enemy.
    fn skirmish(grid: &SquareGrid, count: u32) -> StateSnapshot {
        let mut state = StateSnapshot::new(2, p(0)).with_cells(grid.cells().to_vec());
        for i in 0..count {
            state.add_unit(fighter(i + 1, p(0), i as i32 * 2, 0));
            state.add_unit(fighter(100 + i, p(1), i as i32 * 2, 1));
        }
        state
    }

    #[test]
    fn test_plan_count_is_product_of_choices() {
        let grid = SquareGrid::new(8, 3);
        let state = skirmish(&grid, 2);
        let mut catalog = ActionCatalog::new(&grid);

        // Each unit: attack or skip.
        let plans = PlanEnumerator::default().enumerate(&state, p(0), &mut catalog);
        assert_eq!(plans.len(), 4);
        assert_eq!(plans[0].len(), 2);
        assert!(plans[3].is_empty());
    }

    #[test]
    fn test_action_branch_precedes_skip() {
        let grid = SquareGrid::new(8, 3);
        let state = skirmish(&grid, 1);
        let mut catalog = ActionCatalog::new(&grid);

        let plans = PlanEnumerator::default().enumerate(&state, p(0), &mut catalog);
        assert_eq!(plans.len(), 2);
        assert_eq!(
            plans[0].records()[0].action,
            Action::Attack { target: UnitId(100) }
        );
        assert!(plans[1].is_empty());
    }

    #[test]
    fn test_plan_ceiling() {
        let grid = SquareGrid::new(8, 3);
        let state = skirmish(&grid, 3);
        let mut catalog = ActionCatalog::new(&grid);

        let plans = PlanEnumerator::new(3, 5).enumerate(&state, p(0), &mut catalog);
        assert_eq!(plans.len(), 5);
    }

    #[test]
    fn test_unit_cap_keeps_most_important() {
        let grid = SquareGrid::new(8, 3);
        let mut state = skirmish(&grid, 3);
        state.unit_mut(UnitId(3)).unwrap().hp = 5;

        let mut catalog = ActionCatalog::new(&grid);
        let enumerator = PlanEnumerator::new(1, 100);
        let units = enumerator.select_units(&state, p(0), &mut catalog);

        assert_eq!(units.len(), 1);
        assert_eq!(units[0].0, UnitId(3));
    }

    #[test]
    fn test_no_actions_yields_empty_plan() {
        let grid = SquareGrid::new(4, 4);
        let state = StateSnapshot::new(2, p(0)).with_cells(grid.cells().to_vec());
        let mut catalog = ActionCatalog::new(&grid);

        let plans = PlanEnumerator::default().enumerate(&state, p(0), &mut catalog);
        assert_eq!(plans, vec![Plan::empty()]);
    }

    #[test]
    fn test_enumeration_is_deterministic() {
        let grid = SquareGrid::new(8, 3);
        let state = skirmish(&grid, 3);

        let first = PlanEnumerator::default().enumerate(&state, p(0), &mut ActionCatalog::new(&grid));
        let second = PlanEnumerator::default().enumerate(&state, p(0), &mut ActionCatalog::new(&grid));
        assert_eq!(first, second);
        assert!(first
            .iter()
            .flat_map(|plan| plan.iter())
            .all(|r| r.action.kind() == ActionKind::Attack));
    }

    #[test]
    fn test_importance_terms() {
        let objective = Position::new(0, 0);
        let healthy = fighter(1, p(0), 3, 4);
        let hurt = fighter(2, p(0), 3, 4).with_health(10, 20);

        let base = unit_importance(&healthy, objective, false);
        assert!((base - (5.0 + 10.0 / 6.0)).abs() < 1e-9);
        assert!((unit_importance(&hurt, objective, false) - base - 10.0).abs() < 1e-9);
        assert!((unit_importance(&healthy, objective, true) - base - 5.0).abs() < 1e-9);

        let tower = UnitRecord::new(UnitId(3), p(0), objective).as_structure();
        assert_eq!(unit_importance(&tower, objective, true), 5.0);
    }
}
