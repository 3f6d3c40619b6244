//! # tactics-ai
//!
//! A turn planner for grid tactics games: minimax / alpha-beta search over
//! whole-turn plans, guided by a small Q-network trained online.
//!
//! ## Design Principles
//!
//! 1. **Snapshots, not live objects**: The search only ever sees
//!    `StateSnapshot`s captured through narrow host traits. Nothing in the
//!    search mutates the live game.
//!
//! 2. **Deterministic search**: Plans are enumerated in a fixed order and
//!    damage rolls are keyed on content, so minimax and alpha-beta pick the
//!    same plan and a seed reproduces a game.
//!
//! 3. **Infallible core**: Enumeration, search and evaluation return values.
//!    Errors only come from model files, metric exports, and the live world.
//!
//! ## Architecture
//!
//! ```text
//! LiveWorld ──capture──► StateSnapshot ──► PlanEnumerator ──► SearchEngine
//!                                                  ▲               │
//!                                          ValueNetwork ◄─ QLearner ◄─ ReplayBuffer
//!                                                                  │
//!                          TurnExecution ◄── best plan ◄───────────┘
//! ```
//!
//! - **Persistent Data Structures**: O(1) snapshot cloning via `im` for the
//!   search tree.
//!
//! ## Modules
//!
//! - `core`: Players, positions, RNG, configuration
//! - `state`: Snapshots, unit records, structures, win detection
//! - `actions`: Action kinds, capabilities, the action catalog, simulation
//! - `plan`: Per-turn plan enumeration
//! - `eval`: Heuristic evaluation
//! - `search`: Minimax / alpha-beta with value-network guidance
//! - `nn`: Value network, state encoding, model traits
//! - `training`: Replay buffer, Q-learning, reward shaping, metrics
//! - `driver`: Host traits, the agent, turn execution
//! - `arena`: Square-grid sandbox implementing the host traits

pub mod actions;
pub mod arena;
pub mod core;
pub mod driver;
pub mod error;
pub mod eval;
pub mod nn;
pub mod plan;
pub mod search;
pub mod state;
pub mod training;

// Re-export commonly used types
pub use crate::core::{
    AgentConfig, EvalWeights, GameRng, LearningConfig, PlayerId, PlayerMap,
    Position, RewardWeights, SearchConfig, UnitId,
};

pub use crate::state::{StateSnapshot, Structure, StructureType, UnitRecord};

pub use crate::actions::{
    Action, ActionCatalog, ActionKind, ActionRecord, Capability, Plan, SpawnOption,
    ACTION_COUNT,
};

pub use crate::plan::PlanEnumerator;

pub use crate::eval::HeuristicEvaluator;

pub use crate::search::{Guidance, SearchEngine, SearchOutcome, SearchStats};

pub use crate::nn::{ActionValueModel, GridStateEncoder, StateEncoder, ValueNetwork};

pub use crate::training::{Experience, QLearner, ReplayBuffer, RewardShaper, TrainingMetrics};

pub use crate::driver::{
    GridService, LiveWorld, MinimaxAgent, ResourceLedger, TurnExecution, TurnStep, UnitView,
};

pub use crate::error::{ExportError, ModelError, WorldError};
