//! The playing agent: search, learning, and game lifecycle hooks.
//!
//! ## Lifecycle
//!
//! ```text
//! on_level_loaded ─► begin_turn ─► TurnExecution::advance … Complete
//!                         ▲                                    │
//!                         └──────────── on_turn_ended ◄────────┘
//!                                            │
//!                                      on_game_ended
//! ```

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::actions::{ActionRecord, Plan, ACTION_COUNT};
use crate::core::{AgentConfig, PlayerId};
use crate::error::WorldError;
use crate::nn::{GridStateEncoder, StateEncoder, ValueNetwork};
use crate::search::{Guidance, SearchEngine, SearchStats};
use crate::state::{StateSnapshot, StructureType};
use crate::training::{
    export_weight_stats, Experience, QLearner, RewardShaper, StrategicSample, TrainingMetrics,
};

use super::turn::TurnExecution;
use super::world::{GridService, LiveWorld, ResourceLedger};

/// How a finished game went for the agent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GameReport {
    pub won: bool,
    pub turns: u32,
    /// Reward earned this game, terminal reward included.
    pub reward: f32,
}

/// Minimax player with an optional online-trained value network.
pub struct MinimaxAgent<'g> {
    player: PlayerId,
    enemy: PlayerId,
    grid: &'g dyn GridService,
    config: AgentConfig,
    engine: SearchEngine<'g>,
    encoder: GridStateEncoder,
    learner: Option<QLearner>,
    shaper: RewardShaper,
    metrics: TrainingMetrics,
    total_reward: f32,
    game_reward: f32,
    objective_turns: u32,
    last_stats: SearchStats,
}

impl<'g> MinimaxAgent<'g> {
    pub fn new(grid: &'g dyn GridService, player: PlayerId, config: AgentConfig) -> Self {
        Self {
            player,
            enemy: player,
            grid,
            engine: SearchEngine::new(grid, config.search.clone(), config.eval.clone()),
            encoder: GridStateEncoder::new(grid.cells().len()),
            learner: None,
            shaper: RewardShaper::new(config.rewards.clone()),
            metrics: TrainingMetrics::new(),
            total_reward: 0.0,
            game_reward: 0.0,
            objective_turns: 0,
            last_stats: SearchStats::default(),
            config,
        }
    }

    #[must_use]
    pub fn player(&self) -> PlayerId {
        self.player
    }

    /// Opponent resolved by `on_level_loaded`.
    #[must_use]
    pub fn enemy(&self) -> PlayerId {
        self.enemy
    }

    #[must_use]
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    #[must_use]
    pub fn learner(&self) -> Option<&QLearner> {
        self.learner.as_ref()
    }

    #[must_use]
    pub fn metrics(&self) -> &TrainingMetrics {
        &self.metrics
    }

    /// Reward accumulated over every game.
    #[must_use]
    pub fn total_reward(&self) -> f32 {
        self.total_reward
    }

    #[must_use]
    pub fn game_reward(&self) -> f32 {
        self.game_reward
    }

    /// Turns this game ended while holding the Objective.
    #[must_use]
    pub fn objective_turns(&self) -> u32 {
        self.objective_turns
    }

    /// Statistics of the most recent search.
    #[must_use]
    pub fn last_stats(&self) -> &SearchStats {
        &self.last_stats
    }

    /// Capture the live world from this agent's point of view.
    pub fn observe<W: LiveWorld + ResourceLedger>(&self, world: &W) -> StateSnapshot {
        StateSnapshot::capture(world, world, self.grid, self.player)
            .with_objective_win_turns(self.config.objective_win_turns)
    }

    /// Prepare for a new game on the current level.
    ///
    /// The network is sized from the grid and kept across games while its
    /// shape still fits. With `load_model_on_start` a saved model replaces it;
    /// a missing or mismatched file falls back to a fresh network.
    pub fn on_level_loaded(&mut self, world: &dyn LiveWorld) {
        self.enemy = PlayerId::all(world.player_count())
            .find(|p| *p != self.player)
            .unwrap_or(self.player);
        self.encoder = GridStateEncoder::new(self.grid.cells().len());
        let input_size = self.encoder.input_size();
        let learning = &self.config.learning;

        let keep = self
            .learner
            .as_ref()
            .is_some_and(|l| l.network().input_size() == input_size);
        if !keep {
            let network = ValueNetwork::with_seed(
                input_size,
                learning.hidden_size,
                ACTION_COUNT,
                learning.seed,
            );
            self.learner = Some(QLearner::new(network, learning.clone()));
        }

        if learning.load_model_on_start {
            match ValueNetwork::load(&learning.model_path) {
                Ok(network)
                    if network.input_size() == input_size && network.output_size() == ACTION_COUNT =>
                {
                    info!(
                        path = %learning.model_path.display(),
                        steps = network.training_steps(),
                        "loaded value network"
                    );
                    if let Some(learner) = self.learner.as_mut() {
                        learner.replace_network(network);
                    }
                }
                Ok(network) => warn!(
                    expected = input_size,
                    found = network.input_size(),
                    "saved model does not fit this grid, using a fresh network"
                ),
                Err(err) => warn!(%err, "could not load model, using a fresh network"),
            }
        }

        self.shaper.reset();
        self.game_reward = 0.0;
        self.objective_turns = 0;
        debug!(player = self.player.0, enemy = self.enemy.0, input_size, "level loaded");
    }

    /// Search for `player`'s best plan in `state`.
    ///
    /// With a network attached, the search is guided by it, except on
    /// exploration turns while training.
    pub fn select_best_plan(&mut self, state: &StateSnapshot, player: PlayerId, depth: u32) -> Plan {
        let training = self.config.learning.training;
        let explore = training && self.learner.as_mut().is_some_and(QLearner::should_explore);

        let outcome = match self.learner.as_ref().filter(|_| !explore) {
            Some(learner) => {
                let guidance =
                    Guidance::new(learner.network(), &self.encoder).with_leaf_bootstrap(training);
                self.engine.select_guided(state, player, depth, &guidance)
            }
            None => self.engine.select_best_plan(state, player, depth),
        };

        debug!(
            player = player.0,
            actions = outcome.plan.len(),
            score = outcome.score,
            nodes = outcome.stats.nodes,
            explore,
            "selected plan"
        );
        self.last_stats = outcome.stats;
        outcome.plan
    }

    /// Search this turn's plan and return the step machine that plays it.
    pub fn begin_turn<W: LiveWorld + ResourceLedger>(&mut self, world: &W) -> TurnExecution {
        let state = self.observe(world);
        let encoded = self.encoder.encode(&state, self.player);
        let plan = self.select_best_plan(&state, self.player, self.config.search.max_depth);
        TurnExecution::new(self.player, plan, encoded)
    }

    /// Play a whole turn.
    pub fn play_turn<W: LiveWorld + ResourceLedger>(
        &mut self,
        world: &mut W,
    ) -> super::turn::TurnSummary {
        let mut turn = self.begin_turn(world);
        turn.run(self, world)
    }

    /// Execute one record for real, reward it, and learn from it.
    ///
    /// `encoded` is the network input before the action; it is replaced by the
    /// input after it.
    pub(crate) fn execute<W: LiveWorld + ResourceLedger>(
        &mut self,
        world: &mut W,
        record: &ActionRecord,
        encoded: &mut Vec<f32>,
    ) -> Result<f32, WorldError> {
        let before = self.observe(world);
        world.execute(record)?;
        let after = self.observe(world);

        let reward = self.shaper.action_reward(record, &before, &after, self.player);
        self.total_reward += reward;
        self.game_reward += reward;
        if self.config.learning.collect_metrics {
            self.metrics.record_action(record.action.index(), reward);
        }

        let next = self.encoder.encode(&after, self.player);
        if self.config.learning.training {
            if let Some(learner) = self.learner.as_mut() {
                let experience = Experience::new(
                    std::mem::take(encoded),
                    record.action.index(),
                    reward,
                    next.clone(),
                    world.is_game_finished(),
                );
                let metrics = self.config.learning.collect_metrics.then_some(&mut self.metrics);
                learner.record(experience, metrics);
            }
        }
        *encoded = next;

        debug!(
            unit = record.unit.0,
            action = record.action.kind().name(),
            reward,
            "executed action"
        );
        Ok(reward)
    }

    /// A fresh snapshot of `world` and the catalog to query it with.
    pub(crate) fn live_catalog<W: LiveWorld + ResourceLedger>(
        &mut self,
        world: &W,
    ) -> (StateSnapshot, &mut crate::actions::ActionCatalog<'g>) {
        (self.observe(world), self.engine.catalog_mut())
    }

    /// Record the end of one of this agent's turns.
    pub(crate) fn record_turn(&mut self, turn_reward: f32) {
        if self.config.learning.collect_metrics {
            let exploration = self.learner.as_ref().map_or(0.0, QLearner::exploration);
            self.metrics
                .record_episode(turn_reward, self.total_reward, exploration);
        }
    }

    /// Bookkeeping after any turn ends.
    pub fn on_turn_ended<W: LiveWorld + ResourceLedger>(&mut self, world: &W) {
        let state = self.observe(world);
        let holds_objective = state
            .structures()
            .any(|s| s.kind == StructureType::Objective && s.owner == self.player);
        if holds_objective {
            self.objective_turns += 1;
        }

        if self.config.learning.collect_metrics {
            let own_units = state.units_of(self.player).filter(|u| !u.is_structure).count();
            let enemy_units = state.units_of(self.enemy).filter(|u| !u.is_structure).count();
            self.metrics.record_strategic(StrategicSample {
                objective_control: self.objective_turns,
                unit_count_diff: own_units as i32 - enemy_units as i32,
                resource_diff: state.resources(self.player) - state.resources(self.enemy),
                structures_captured: self.shaper.structures_captured(),
            });
        }
    }

    /// Close out a finished game: terminal reward, metrics, model.
    pub fn on_game_ended(&mut self, world: &dyn LiveWorld) -> GameReport {
        let won = world.winner() == Some(self.player);
        let terminal = self.shaper.terminal_reward(won);
        self.total_reward += terminal;
        self.game_reward += terminal;
        let report = GameReport {
            won,
            turns: world.turn_number(),
            reward: self.game_reward,
        };
        info!(
            player = self.player.0,
            won,
            turns = report.turns,
            reward = report.reward,
            total = self.total_reward,
            "game ended"
        );

        let learning = self.config.learning.clone();
        if learning.collect_metrics {
            self.metrics.record_game(won, report.turns);
            let games = self.metrics.games_played();
            let interval = learning.save_metrics_interval.max(1) as usize;
            if games % interval == 0 {
                self.export_metrics(games);
            }
        }

        if learning.training {
            if let Some(learner) = &self.learner {
                if let Err(err) = learner.network().save(&learning.model_path) {
                    warn!(%err, path = %learning.model_path.display(), "could not save model");
                }
            }
            if learning.collect_metrics {
                let path = self.metrics_dir().join(format!("training_metrics_{}.json", self.player.0));
                if let Err(err) = self.metrics.save_json(&path) {
                    warn!(%err, "could not save metrics");
                }
            }
        }

        self.shaper.reset();
        self.game_reward = 0.0;
        self.objective_turns = 0;
        report
    }

    fn metrics_dir(&self) -> PathBuf {
        self.config
            .learning
            .metrics_dir
            .join(format!("player_{}", self.player.0))
    }

    fn export_metrics(&mut self, games: usize) {
        let dir = self.metrics_dir();
        if let Err(err) = self.metrics.save_csv(&dir) {
            warn!(%err, dir = %dir.display(), "could not export metrics");
        }
        let Some(learner) = &self.learner else {
            return;
        };
        let replay = dir.join(format!("experiences_game{games}.csv"));
        if let Err(err) = learner.buffer().export_sample_csv(&replay, 100) {
            warn!(%err, "could not export replay sample");
        }
        if self.config.learning.export_weight_stats {
            let network = learner.network();
            let path = dir.join(format!("weights_game{games}.csv"));
            if let Err(err) = export_weight_stats(
                &path,
                &network.weight_stats(),
                learner.exploration(),
                network.average_loss(),
                network.recent_average_loss(),
            ) {
                warn!(%err, "could not export weight statistics");
            }
        }
    }
}
