//! Actions, the capability registry, and per-unit action enumeration.
//!
//! ## Contract
//!
//! Every action kind offers the same four steps:
//!
//! - gate: `ActionCatalog::should_execute`
//! - choose: `ActionCatalog::precalculate` (target or destination)
//! - simulate: `simulate` on a `StateSnapshot`
//! - execute: `LiveWorld::execute` on the real game
//!
//! `Action::index` is the stable action key used by the value network and
//! the replay buffer.

pub mod action;
pub mod capability;
pub mod catalog;
pub mod simulate;

pub use action::{action_name, Action, ActionKind, ActionRecord, Plan, ACTION_COUNT};
pub use capability::{Capabilities, Capability, SpawnOption, SpawnRoster};
pub use catalog::{upgrade_worthwhile, ActionCatalog, UnitActions};
pub use simulate::{apply_plan, base_damage, damage, damage_multiplier, simulate};
