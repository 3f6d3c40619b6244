//! Depth-limited minimax and alpha-beta over turn plans.
//!
//! Each ply is one player's whole turn: the player to move enumerates its
//! plans, every plan is applied to a clone of the snapshot, and the search
//! recurses with the other player to move.
//!
//! ## Determinism
//!
//! - plans come out of the enumerator in a fixed order
//! - ties keep the first plan that reached the best score
//! - damage rolls are keyed on content, not on traversal order
//!
//! so plain minimax and alpha-beta always select the same plan; alpha-beta
//! only visits fewer nodes.
//!
//! ## Caching
//!
//! Leaf evaluations are memoized per call, keyed by the snapshot's content
//! fingerprint.

use std::time::Instant;

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::actions::{apply_plan, ActionCatalog, Plan};
use crate::core::{EvalWeights, GameRng, PlayerId, SearchConfig};
use crate::driver::GridService;
use crate::eval::{HeuristicEvaluator, SCORE_BOUND};
use crate::nn::{ActionValueModel, StateEncoder};
use crate::plan::PlanEnumerator;
use crate::state::StateSnapshot;

use super::stats::SearchStats;

/// Value-network hooks into the search.
pub struct Guidance<'a> {
    pub model: &'a dyn ActionValueModel,
    pub encoder: &'a dyn StateEncoder,
    /// Order root plans by summed Q-values and keep the best few.
    pub order_root: bool,
    /// Add the mean Q-value to leaf scores.
    pub leaf_bootstrap: bool,
}

impl<'a> Guidance<'a> {
    pub fn new(model: &'a dyn ActionValueModel, encoder: &'a dyn StateEncoder) -> Self {
        Self {
            model,
            encoder,
            order_root: true,
            leaf_bootstrap: false,
        }
    }

    pub fn with_leaf_bootstrap(mut self, enabled: bool) -> Self {
        self.leaf_bootstrap = enabled;
        self
    }

    /// Q-values of `state` seen by `player`.
    #[must_use]
    pub fn q_values(&self, state: &StateSnapshot, player: PlayerId) -> Vec<f32> {
        self.model.predict(&self.encoder.encode(state, player))
    }
}

/// Result of a root search.
#[derive(Clone, Debug)]
pub struct SearchOutcome {
    pub plan: Plan,
    pub score: f64,
    pub stats: SearchStats,
}

/// Per-call context threaded through the recursion.
struct Frame<'a, 'b> {
    player: PlayerId,
    enemy: PlayerId,
    evaluator: HeuristicEvaluator,
    guidance: Option<&'a Guidance<'b>>,
    root_depth: u32,
    deadline: Option<Instant>,
}

/// Minimax / alpha-beta plan search.
pub struct SearchEngine<'g> {
    config: SearchConfig,
    weights: EvalWeights,
    catalog: ActionCatalog<'g>,
    enumerator: PlanEnumerator,
    rolls: GameRng,
    cache: FxHashMap<u64, f64>,
    stats: SearchStats,
}

impl<'g> SearchEngine<'g> {
    pub fn new(grid: &'g dyn GridService, config: SearchConfig, weights: EvalWeights) -> Self {
        Self {
            enumerator: PlanEnumerator::from_config(&config),
            rolls: GameRng::new(config.seed).for_context("damage"),
            catalog: ActionCatalog::new(grid),
            cache: FxHashMap::default(),
            stats: SearchStats::default(),
            config,
            weights,
        }
    }

    #[must_use]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Statistics of the last search.
    #[must_use]
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// Damage-roll stream used by simulation.
    #[must_use]
    pub fn rolls(&self) -> &GameRng {
        &self.rolls
    }

    pub fn catalog_mut(&mut self) -> &mut ActionCatalog<'g> {
        &mut self.catalog
    }

    /// Candidate plans for `player` in `state`.
    pub fn enumerate(&mut self, state: &StateSnapshot, player: PlayerId) -> Vec<Plan> {
        self.enumerator.enumerate(state, player, &mut self.catalog)
    }

    /// Best plan for `player` searching `depth` plies.
    ///
    /// Depth 0 or a decided game returns the empty plan.
    pub fn select_best_plan(
        &mut self,
        state: &StateSnapshot,
        player: PlayerId,
        depth: u32,
    ) -> SearchOutcome {
        self.run(state, player, depth, None)
    }

    /// Same as `select_best_plan` with value-network guidance.
    pub fn select_guided(
        &mut self,
        state: &StateSnapshot,
        player: PlayerId,
        depth: u32,
        guidance: &Guidance<'_>,
    ) -> SearchOutcome {
        self.run(state, player, depth, Some(guidance))
    }

    fn run(
        &mut self,
        state: &StateSnapshot,
        player: PlayerId,
        depth: u32,
        guidance: Option<&Guidance<'_>>,
    ) -> SearchOutcome {
        let start = Instant::now();
        self.stats.reset();
        self.cache.clear();
        self.catalog.clear();

        let enemy = state.opponent_of(player);
        let frame = Frame {
            player,
            enemy,
            evaluator: HeuristicEvaluator::new(self.weights.clone(), player, enemy),
            guidance,
            root_depth: depth,
            deadline: self.config.time_budget.map(|budget| start + budget),
        };
        self.stats.nodes = 1;

        if depth == 0 || state.is_terminal() {
            let score = frame.evaluator.evaluate(state);
            self.stats.time_us = start.elapsed().as_micros() as u64;
            return SearchOutcome {
                plan: Plan::empty(),
                score,
                stats: self.stats.clone(),
            };
        }

        let mut plans = self.enumerate(state, player);
        if let Some(g) = guidance.filter(|g| g.order_root) {
            plans = order_by_q(plans, &g.q_values(state, player), self.config.guided_plan_limit);
        }
        self.stats.root_plans = plans.len();

        let mut best_plan = plans.first().cloned().unwrap_or_default();
        let mut best = f64::NEG_INFINITY;
        let mut alpha = f64::NEG_INFINITY;

        for plan in &plans {
            let mut child = state.clone();
            apply_plan(plan, &mut child, &self.rolls);
            child.refresh_winner();

            let value = if self.config.use_alpha_beta {
                self.alpha_beta(&child, depth - 1, alpha, f64::INFINITY, false, &frame)
            } else {
                self.minimax(&child, depth - 1, false, &frame)
            };

            if value > best {
                best = value;
                best_plan = plan.clone();
            }
            alpha = alpha.max(best);
        }

        self.stats.time_us = start.elapsed().as_micros() as u64;
        debug!(
            player = player.0,
            actions = best_plan.len(),
            score = best,
            nodes = self.stats.nodes,
            prunes = self.stats.prunes,
            "selected plan"
        );

        SearchOutcome {
            plan: best_plan,
            score: best,
            stats: self.stats.clone(),
        }
    }

    /// Plain minimax. `maximizing` means the searching player moves.
    fn minimax(
        &mut self,
        state: &StateSnapshot,
        depth: u32,
        maximizing: bool,
        frame: &Frame<'_, '_>,
    ) -> f64 {
        self.visit(depth, frame);
        if depth == 0 || state.is_terminal() || self.out_of_budget(frame) {
            return self.leaf(state, frame);
        }

        let mover = if maximizing { frame.player } else { frame.enemy };
        let plans = self.enumerate(state, mover);

        let mut best = if maximizing {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
        for plan in &plans {
            let child = self.child(state, plan);
            let value = self.minimax(&child, depth - 1, !maximizing, frame);
            best = if maximizing {
                best.max(value)
            } else {
                best.min(value)
            };
        }
        best
    }

    /// Fail-soft alpha-beta.
    fn alpha_beta(
        &mut self,
        state: &StateSnapshot,
        depth: u32,
        mut alpha: f64,
        mut beta: f64,
        maximizing: bool,
        frame: &Frame<'_, '_>,
    ) -> f64 {
        self.visit(depth, frame);
        if depth == 0 || state.is_terminal() || self.out_of_budget(frame) {
            return self.leaf(state, frame);
        }

        let mover = if maximizing { frame.player } else { frame.enemy };
        let plans = self.enumerate(state, mover);
        let total = plans.len();

        if maximizing {
            let mut value = f64::NEG_INFINITY;
            for (i, plan) in plans.iter().enumerate() {
                let child = self.child(state, plan);
                value = value.max(self.alpha_beta(&child, depth - 1, alpha, beta, false, frame));
                alpha = alpha.max(value);
                if beta <= alpha {
                    self.cut(i, total, depth);
                    break;
                }
            }
            value
        } else {
            let mut value = f64::INFINITY;
            for (i, plan) in plans.iter().enumerate() {
                let child = self.child(state, plan);
                value = value.min(self.alpha_beta(&child, depth - 1, alpha, beta, true, frame));
                beta = beta.min(value);
                if beta <= alpha {
                    self.cut(i, total, depth);
                    break;
                }
            }
            value
        }
    }

    fn child(&self, state: &StateSnapshot, plan: &Plan) -> StateSnapshot {
        let mut child = state.clone();
        apply_plan(plan, &mut child, &self.rolls);
        child.refresh_winner();
        child
    }

    fn visit(&mut self, depth: u32, frame: &Frame<'_, '_>) {
        self.stats.nodes += 1;
        self.stats.max_depth = self.stats.max_depth.max(frame.root_depth - depth);
    }

    fn cut(&mut self, index: usize, total: usize, depth: u32) {
        if index + 1 < total {
            self.stats.prunes += 1;
            trace!(depth, skipped = total - index - 1, "alpha-beta cut-off");
        }
    }

    fn out_of_budget(&mut self, frame: &Frame<'_, '_>) -> bool {
        let over_nodes = self
            .config
            .node_budget
            .is_some_and(|limit| self.stats.nodes >= limit);
        let over_time = frame.deadline.is_some_and(|d| Instant::now() >= d);
        if over_nodes || over_time {
            self.stats.budget_exhausted = true;
        }
        over_nodes || over_time
    }

    fn leaf(&mut self, state: &StateSnapshot, frame: &Frame<'_, '_>) -> f64 {
        self.stats.leaf_evals += 1;
        let key = state.fingerprint();
        if let Some(&cached) = self.cache.get(&key) {
            self.stats.cache_hits += 1;
            trace!(key, "evaluation cache hit");
            return cached;
        }

        let mut score = frame.evaluator.evaluate(state);
        if let Some(g) = frame.guidance.filter(|g| g.leaf_bootstrap) {
            if !state.is_terminal() {
                let q = g.q_values(state, frame.player);
                if !q.is_empty() {
                    let mean = q.iter().map(|v| f64::from(*v)).sum::<f64>() / q.len() as f64;
                    score = (score + self.config.leaf_value_weight * mean)
                        .clamp(-SCORE_BOUND, SCORE_BOUND);
                }
            }
        }

        self.cache.insert(key, score);
        score
    }
}

/// Stable-sort plans by summed Q-value of their actions, best first, and
/// keep at most `limit`.
#[must_use]
pub fn order_by_q(plans: Vec<Plan>, q: &[f32], limit: usize) -> Vec<Plan> {
    let mut scored: Vec<(f64, Plan)> = plans
        .into_iter()
        .map(|plan| {
            let score = plan
                .action_indices()
                .fold(0.0_f64, |acc, i| acc + q.get(i).map_or(0.0, |v| f64::from(*v)));
            (score, plan)
        })
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.truncate(limit.max(1));
    scored.into_iter().map(|(_, plan)| plan).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{Action, ActionRecord, Capability};
    use crate::arena::SquareGrid;
    use crate::core::{Position, UnitId};
    use crate::driver::GridService;
    use crate::state::UnitRecord;

    fn p(n: u8) -> PlayerId {
        PlayerId::new(n)
    }

    fn duel(grid: &SquareGrid) -> StateSnapshot {
        let mut state = StateSnapshot::new(2, p(0)).with_cells(grid.cells().to_vec());
        state.add_unit(
            UnitRecord::new(UnitId(1), p(0), Position::new(1, 1))
                .with_health(20, 20)
                .with_combat(10, 2, 1)
                .with_capabilities([Capability::Attack]),
        );
        state.add_unit(
            UnitRecord::new(UnitId(2), p(1), Position::new(1, 2))
                .with_health(20, 20)
                .with_combat(10, 2, 1)
                .with_capabilities([Capability::Attack]),
        );
        state
    }

    #[test]
    fn test_depth_zero_returns_empty_plan() {
        let grid = SquareGrid::new(4, 4);
        let state = duel(&grid);
        let mut engine = SearchEngine::new(&grid, SearchConfig::default(), EvalWeights::default());

        let outcome = engine.select_best_plan(&state, p(0), 0);
        assert!(outcome.plan.is_empty());
    }

    #[test]
    fn test_terminal_root_returns_empty_plan() {
        let grid = SquareGrid::new(4, 4);
        let mut state = duel(&grid);
        state.set_control_turns(p(1), 5);
        state.refresh_winner();

        let mut engine = SearchEngine::new(&grid, SearchConfig::default(), EvalWeights::default());
        let outcome = engine.select_best_plan(&state, p(0), 3);
        assert!(outcome.plan.is_empty());
        assert_eq!(outcome.score, f64::MIN);
    }

    #[test]
    fn test_attack_beats_skip() {
        let grid = SquareGrid::new(4, 4);
        let state = duel(&grid);
        let mut engine = SearchEngine::new(&grid, SearchConfig::default(), EvalWeights::default());

        let outcome = engine.select_best_plan(&state, p(0), 1);
        assert_eq!(
            outcome.plan.records(),
            &[ActionRecord::new(UnitId(1), Action::Attack { target: UnitId(2) })]
        );
    }

    #[test]
    fn test_minimax_and_alpha_beta_agree() {
        let grid = SquareGrid::new(4, 4);
        let state = duel(&grid);

        let config = SearchConfig::default().with_alpha_beta(false);
        let mut plain = SearchEngine::new(&grid, config.clone(), EvalWeights::default());
        let mut pruned =
            SearchEngine::new(&grid, config.with_alpha_beta(true), EvalWeights::default());

        for depth in 1..=3 {
            let a = plain.select_best_plan(&state, p(0), depth);
            let b = pruned.select_best_plan(&state, p(0), depth);
            assert_eq!(a.plan, b.plan);
            assert_eq!(a.score, b.score);
            assert!(b.stats.nodes <= a.stats.nodes);
        }
    }

    #[test]
    fn test_node_budget_stops_early() {
        let grid = SquareGrid::new(4, 4);
        let state = duel(&grid);
        let config = SearchConfig::default().with_node_budget(3);
        let mut engine = SearchEngine::new(&grid, config, EvalWeights::default());

        let outcome = engine.select_best_plan(&state, p(0), 4);
        assert!(outcome.stats.budget_exhausted);
        assert_eq!(outcome.stats.root_plans, 2);
        assert!(outcome.stats.nodes < 10);
    }

    #[test]
    fn test_order_by_q_is_stable_and_truncates() {
        let attack = Plan::from_records(vec![ActionRecord::new(
            UnitId(1),
            Action::Attack { target: UnitId(2) },
        )]);
        let skip = Plan::from_records(vec![ActionRecord::new(UnitId(1), Action::Skip)]);
        let empty = Plan::empty();

        let q = [0.0, 0.0, 1.0, 0.0, 0.0, 0.0];
        let ordered = order_by_q(vec![empty.clone(), skip.clone(), attack.clone()], &q, 2);
        assert_eq!(ordered, vec![attack, empty]);
    }

    #[test]
    fn test_order_by_q_keeps_ties_in_enumeration_order() {
        let skip = Plan::from_records(vec![ActionRecord::new(UnitId(1), Action::Skip)]);
        let empty = Plan::empty();

        // The empty plan scores zero, same as Skip, so it must stay first.
        let q = [0.0; 6];
        let ordered = order_by_q(vec![empty.clone(), skip.clone()], &q, 5);
        assert_eq!(ordered, vec![empty.clone(), skip.clone()]);

        let ordered = order_by_q(vec![skip.clone(), empty.clone()], &q, 5);
        assert_eq!(ordered, vec![skip, empty]);
    }
}
