//! Core engine types: unit ids, players, positions, RNG, configuration.
//!
//! These are shared by every other module and know nothing about search or
//! learning.

pub mod entity;
pub mod player;
pub mod rng;
pub mod config;

pub use entity::{Position, UnitId};
pub use player::{PlayerId, PlayerMap};
pub use rng::GameRng;
pub use config::{AgentConfig, EvalWeights, LearningConfig, RewardWeights, SearchConfig};
