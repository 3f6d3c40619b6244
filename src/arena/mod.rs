//! A reference host for headless play.
//!
//! - `SquareGrid`: 4-neighbour `GridService` with BFS paths and Manhattan distance
//! - `SandboxWorld`: in-memory `LiveWorld` + `ResourceLedger`
//! - `ArenaBuilder`: fluent setup of both

pub mod builder;
pub mod grid;
pub mod sandbox;

pub use builder::{ArenaBuilder, DEFAULT_UNIT_LIMIT};
pub use grid::SquareGrid;
pub use sandbox::{unit_type_name, SandboxWorld, NEUTRAL};
