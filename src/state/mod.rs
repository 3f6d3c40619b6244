//! Simulation-only copies of the game world.
//!
//! A `StateSnapshot` is captured once per search from the live world and then
//! cloned once per explored node. Units and structures live in persistent
//! vectors, so a clone is O(1) and a mutation copies only the touched chunk.

pub mod snapshot;

pub use snapshot::{
    structure_kind, unit_type_code, StateSnapshot, Structure, StructureType, UnitRecord,
    DEFAULT_OBJECTIVE_WIN_TURNS,
};
