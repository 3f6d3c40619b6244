//! Capability registry.
//!
//! Each unit carries the list of actions it can ever perform, resolved once
//! when the unit is captured from the live world. The search only consults
//! this list; it never asks the host which components a unit has.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};

use super::action::ActionKind;

/// Inline capacity covers every unit archetype without spilling.
pub type Capabilities = SmallVec<[Capability; 4]>;

/// Something a unit is able to do.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Capability {
    Move,
    Attack,
    Capture,
    /// Buy units from a roster. Shared because every base of a faction
    /// offers the same roster.
    Spawn(Arc<SpawnRoster>),
    UpgradeBase { cost: i64, income_delta: i64 },
}

impl Capability {
    #[must_use]
    pub fn kind(&self) -> ActionKind {
        match self {
            Capability::Move => ActionKind::Move,
            Capability::Attack => ActionKind::Attack,
            Capability::Capture => ActionKind::Capture,
            Capability::Spawn(_) => ActionKind::Spawn,
            Capability::UpgradeBase { .. } => ActionKind::UpgradeBase,
        }
    }

    /// Convenience constructor for a spawn capability.
    #[must_use]
    pub fn spawn(options: Vec<SpawnOption>, unit_limit: usize) -> Self {
        Capability::Spawn(Arc::new(SpawnRoster { options, unit_limit }))
    }

    /// Standard loadout of a mobile fighting unit.
    #[must_use]
    pub fn soldier() -> Capabilities {
        smallvec![Capability::Move, Capability::Attack, Capability::Capture]
    }
}

/// A unit that can be bought, with the stats it arrives with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpawnOption {
    /// Unit type code (see `state::unit_type_code`).
    pub unit_type: u8,
    pub price: i64,
    pub attack: i32,
    pub defence: i32,
    pub hit_points: i32,
    pub movement: i32,
    pub attack_range: i32,
}

/// The units a spawner offers and how many units its owner may field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnRoster {
    pub options: Vec<SpawnOption>,
    /// Maximum number of non-structure units the owner may have.
    pub unit_limit: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_kinds() {
        assert_eq!(Capability::Move.kind(), ActionKind::Move);
        assert_eq!(Capability::spawn(vec![], 4).kind(), ActionKind::Spawn);
        assert_eq!(
            Capability::UpgradeBase { cost: 50, income_delta: 10 }.kind(),
            ActionKind::UpgradeBase
        );
    }

    #[test]
    fn test_soldier_loadout_is_inline() {
        let caps = Capability::soldier();
        assert_eq!(caps.len(), 3);
        assert!(!caps.spilled());
    }

    #[test]
    fn test_spawn_roster_shared() {
        let cap = Capability::spawn(vec![], 6);
        let copy = cap.clone();
        match (cap, copy) {
            (Capability::Spawn(a), Capability::Spawn(b)) => assert!(Arc::ptr_eq(&a, &b)),
            _ => panic!("expected spawn capabilities"),
        }
    }
}
