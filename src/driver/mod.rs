//! Playing real games.
//!
//! ## Overview
//!
//! - **world**: the host-facing traits (`GridService`, `ResourceLedger`, `LiveWorld`)
//! - **agent**: `MinimaxAgent`, search plus online learning with lifecycle hooks
//! - **turn**: `TurnExecution`, the per-turn step machine
//!
//! ## Usage
//!
//! ```
//! use tactics_ai::arena::ArenaBuilder;
//! use tactics_ai::core::{AgentConfig, LearningConfig, PlayerId};
//! use tactics_ai::driver::MinimaxAgent;
//!
//! let (grid, mut world) = ArenaBuilder::skirmish(5).build();
//! let config = AgentConfig::default()
//!     .with_learning(LearningConfig::default().with_training(false));
//! let mut agent = MinimaxAgent::new(&grid, PlayerId::new(0), config);
//!
//! agent.on_level_loaded(&world);
//! let summary = agent.play_turn(&mut world);
//! assert_eq!(summary.player, Some(PlayerId::new(0)));
//! ```

pub mod agent;
pub mod turn;
pub mod world;

pub use agent::{GameReport, MinimaxAgent};
pub use turn::{TurnExecution, TurnStep, TurnSummary};
pub use world::{GridService, LiveWorld, PathResult, ResourceLedger, UnitView};
