//! Agent configuration.
//!
//! ## Sections
//!
//! - `SearchConfig`: depth, pruning, enumeration bounds, budgets
//! - `EvalWeights`: heuristic term weights
//! - `LearningConfig`: Q-learning, replay, persistence, metrics
//! - `RewardWeights`: reward shaping for executed actions
//! - `AgentConfig`: everything a `MinimaxAgent` needs
//!
//! All sections implement `Default` with the tuned values and expose
//! `with_*` builders. Every struct is serde-serializable so a host can keep
//! its tuning in a JSON file.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// =============================================================================
// Search
// =============================================================================

/// Minimax search parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Plies searched from the root (our plan is ply 1).
    pub max_depth: u32,

    /// Use alpha-beta pruning instead of plain minimax.
    pub use_alpha_beta: bool,

    /// Units considered per plan; extra units are ranked by importance.
    pub max_units: usize,

    /// Ceiling on generated plans per enumeration.
    pub max_plans: usize,

    /// Root plans kept after value-network ordering.
    pub guided_plan_limit: usize,

    /// Weight of the mean Q-value added to leaf scores while training.
    pub leaf_value_weight: f64,

    /// Stop expanding after this many visited nodes (None = unbounded).
    pub node_budget: Option<u64>,

    /// Stop expanding after this much wall-clock time (None = unbounded).
    pub time_budget: Option<Duration>,

    /// Seed for simulated damage rolls.
    pub seed: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            use_alpha_beta: true,
            max_units: 3,
            max_plans: 100,
            guided_plan_limit: 5,
            leaf_value_weight: 5.0,
            node_budget: None,
            time_budget: None,
            seed: 42,
        }
    }
}

impl SearchConfig {
    pub fn with_max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_alpha_beta(mut self, enabled: bool) -> Self {
        self.use_alpha_beta = enabled;
        self
    }

    pub fn with_max_units(mut self, units: usize) -> Self {
        self.max_units = units;
        self
    }

    pub fn with_max_plans(mut self, plans: usize) -> Self {
        self.max_plans = plans;
        self
    }

    pub fn with_node_budget(mut self, nodes: u64) -> Self {
        self.node_budget = Some(nodes);
        self
    }

    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

// =============================================================================
// Evaluation
// =============================================================================

/// Weights of the heuristic evaluation terms.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvalWeights {
    /// Value of one hit point.
    pub unit_health: f64,
    /// Multiplier on the ally-minus-enemy hit point value.
    pub unit_count: f64,
    /// Multiplier on the objective proximity term.
    pub unit_position: f64,
    /// Multiplier on the resource difference.
    pub resources: f64,
    /// Per-outpost bonus/penalty.
    pub structure_control: f64,
    /// Objective held bonus, also applied per control turn.
    pub objective_control: f64,
    /// Enemy base captured is worth `structure_control` times this.
    pub base_capture_multiplier: f64,
}

impl Default for EvalWeights {
    fn default() -> Self {
        Self {
            unit_health: 2.0,
            unit_count: 5.0,
            unit_position: 1.0,
            resources: 0.5,
            structure_control: 10.0,
            objective_control: 20.0,
            base_capture_multiplier: 5.0,
        }
    }
}

// =============================================================================
// Learning
// =============================================================================

/// Q-learning, replay, and persistence parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LearningConfig {
    pub learning_rate: f32,
    /// Discount factor (gamma).
    pub discount: f32,
    /// Initial probability of skipping value-network guidance.
    pub exploration_rate: f64,
    pub exploration_decay: f64,
    pub min_exploration: f64,
    pub batch_size: usize,
    pub replay_capacity: usize,
    pub hidden_size: usize,
    /// Record experiences and train online.
    pub training: bool,
    pub load_model_on_start: bool,
    pub model_path: PathBuf,
    pub collect_metrics: bool,
    /// Export CSV metrics every N games.
    pub save_metrics_interval: u32,
    pub export_weight_stats: bool,
    pub metrics_dir: PathBuf,
    pub seed: u64,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.001,
            discount: 0.99,
            exploration_rate: 0.1,
            exploration_decay: 0.999,
            min_exploration: 0.05,
            batch_size: 32,
            replay_capacity: 10_000,
            hidden_size: 256,
            training: true,
            load_model_on_start: false,
            model_path: PathBuf::from("rl_minimax_model.json"),
            collect_metrics: true,
            save_metrics_interval: 10,
            export_weight_stats: true,
            metrics_dir: PathBuf::from("rl_training_data"),
            seed: 7,
        }
    }
}

impl LearningConfig {
    pub fn with_training(mut self, training: bool) -> Self {
        self.training = training;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_hidden_size(mut self, hidden_size: usize) -> Self {
        self.hidden_size = hidden_size;
        self
    }

    pub fn with_exploration(mut self, rate: f64) -> Self {
        self.exploration_rate = rate;
        self
    }

    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = path.into();
        self
    }

    pub fn with_metrics_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.metrics_dir = dir.into();
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

// =============================================================================
// Rewards
// =============================================================================

/// Reward shaping weights for executed actions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RewardWeights {
    pub damage_dealt: f32,
    pub unit_kill: f32,
    pub outpost_capture: f32,
    pub objective_capture: f32,
    pub base_capture: f32,
    pub objective_control_turn: f32,
    pub base_upgrade: f32,
    pub unit_production: f32,
    pub win: f32,
    pub lose: f32,
}

impl Default for RewardWeights {
    fn default() -> Self {
        Self {
            damage_dealt: 0.5,
            unit_kill: 3.0,
            outpost_capture: 5.0,
            objective_capture: 10.0,
            base_capture: 50.0,
            objective_control_turn: 2.0,
            base_upgrade: 15.0,
            unit_production: 2.0,
            win: 100.0,
            lose: -100.0,
        }
    }
}

// =============================================================================
// Agent
// =============================================================================

/// Complete configuration of a `MinimaxAgent`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub search: SearchConfig,
    pub eval: EvalWeights,
    pub learning: LearningConfig,
    pub rewards: RewardWeights,
    /// Consecutive objective-control turns that win the game.
    pub objective_win_turns: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            eval: EvalWeights::default(),
            learning: LearningConfig::default(),
            rewards: RewardWeights::default(),
            objective_win_turns: crate::state::DEFAULT_OBJECTIVE_WIN_TURNS,
        }
    }
}

impl AgentConfig {
    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    pub fn with_learning(mut self, learning: LearningConfig) -> Self {
        self.learning = learning;
        self
    }

    pub fn with_eval(mut self, eval: EvalWeights) -> Self {
        self.eval = eval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.max_depth, 3);
        assert!(config.use_alpha_beta);
        assert_eq!(config.max_units, 3);
        assert_eq!(config.max_plans, 100);
        assert!(config.node_budget.is_none());
    }

    #[test]
    fn test_learning_defaults() {
        let config = LearningConfig::default();
        assert!((config.learning_rate - 0.001).abs() < 1e-9);
        assert!((config.discount - 0.99).abs() < 1e-6);
        assert_eq!(config.batch_size, 32);
        assert_eq!(config.replay_capacity, 10_000);
        assert_eq!(config.hidden_size, 256);
    }

    #[test]
    fn test_builder_pattern() {
        let config = SearchConfig::default()
            .with_max_depth(2)
            .with_alpha_beta(false)
            .with_node_budget(500)
            .with_seed(9);

        assert_eq!(config.max_depth, 2);
        assert!(!config.use_alpha_beta);
        assert_eq!(config.node_budget, Some(500));
        assert_eq!(config.seed, 9);
    }

    #[test]
    fn test_reward_defaults() {
        let weights = RewardWeights::default();
        assert_eq!(weights.base_capture, 50.0);
        assert_eq!(weights.lose, -100.0);
        assert_eq!(AgentConfig::default().objective_win_turns, 5);
    }

    #[test]
    fn test_serialization() {
        let config = AgentConfig::default().with_search(
            SearchConfig::default().with_time_budget(Duration::from_millis(250)),
        );
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: AgentConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }
}
