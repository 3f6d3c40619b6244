//! Online reinforcement learning around the search.
//!
//! ## Overview
//!
//! - **ReplayBuffer**: bounded FIFO of `Experience` transitions, uniform sampling
//! - **QLearner**: Q-learning updates of a `ValueNetwork` from replayed batches
//! - **RewardShaper**: rewards for executed actions
//! - **TrainingMetrics**: session telemetry with CSV/JSON export

pub mod metrics;
pub mod qlearning;
pub mod replay;
pub mod reward;

pub use metrics::{export_weight_stats, StrategicSample, TrainingMetrics};
pub use qlearning::{LearnSummary, QLearner};
pub use replay::{Experience, ReplayBuffer, ReplayStats};
pub use reward::{spawn_value, RewardShaper};
