//! Action representation: what one unit does on one turn.
//!
//! An action is a kind (the "verb") plus kind-specific parameters
//! (destination, target, spawn option). A plan is the ordered list of
//! (unit, action) pairs one player performs in a turn.
//!
//! ## Example
//!
//! ```
//! use tactics_ai::actions::{Action, ActionKind, ActionRecord, Plan};
//! use tactics_ai::core::{Position, UnitId};
//!
//! let mut plan = Plan::empty();
//! plan.push(ActionRecord::new(UnitId(1), Action::Move { to: Position::new(2, 3) }));
//! plan.push(ActionRecord::new(UnitId(2), Action::Attack { target: UnitId(9) }));
//!
//! assert_eq!(plan.len(), 2);
//! assert_eq!(plan.records()[1].action.kind(), ActionKind::Attack);
//! assert_eq!(ActionKind::Attack.index(), 2);
//! ```

use serde::{Deserialize, Serialize};

use crate::core::{Position, UnitId};

use super::capability::SpawnOption;

/// Number of action kinds, and the network's output size.
pub const ACTION_COUNT: usize = 6;

/// Action category.
///
/// The discriminant is stable: it is the value network's output neuron and
/// the replay buffer's action key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Skip = 0,
    Move = 1,
    Attack = 2,
    Capture = 3,
    Spawn = 4,
    UpgradeBase = 5,
}

impl ActionKind {
    pub const ALL: [ActionKind; ACTION_COUNT] = [
        ActionKind::Skip,
        ActionKind::Move,
        ActionKind::Attack,
        ActionKind::Capture,
        ActionKind::Spawn,
        ActionKind::UpgradeBase,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Display name used in metrics exports.
    #[must_use]
    pub fn name(self) -> &'static str {
        action_name(self.index()).unwrap_or("Unknown")
    }
}

/// Name of an action index as written to metrics files.
///
/// Returns `None` for indices outside the known kinds; callers format those
/// as `Action{n}`.
#[must_use]
pub fn action_name(index: usize) -> Option<&'static str> {
    match index {
        0 => Some("Skip/NoAction"),
        1 => Some("Move"),
        2 => Some("Attack"),
        3 => Some("Capture"),
        4 => Some("SpawnUnit"),
        5 => Some("UpgradeBase"),
        _ => None,
    }
}

/// A concrete, fully-parameterized action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Do nothing.
    Skip,
    /// Relocate to a cell.
    Move { to: Position },
    /// Damage an enemy unit.
    Attack { target: UnitId },
    /// Take ownership of the structure on the given cell.
    Capture { at: Position },
    /// Buy a unit.
    Spawn { option: SpawnOption },
    /// Upgrade the owning base.
    UpgradeBase { cost: i64, income_delta: i64 },
}

impl Action {
    #[must_use]
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Skip => ActionKind::Skip,
            Action::Move { .. } => ActionKind::Move,
            Action::Attack { .. } => ActionKind::Attack,
            Action::Capture { .. } => ActionKind::Capture,
            Action::Spawn { .. } => ActionKind::Spawn,
            Action::UpgradeBase { .. } => ActionKind::UpgradeBase,
        }
    }

    /// Shorthand for `self.kind().index()`.
    #[must_use]
    pub fn index(&self) -> usize {
        self.kind().index()
    }
}

/// One (unit, action) pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionRecord {
    /// The acting unit.
    pub unit: UnitId,

    /// What it does.
    pub action: Action,
}

impl ActionRecord {
    #[must_use]
    pub fn new(unit: UnitId, action: Action) -> Self {
        Self { unit, action }
    }
}

/// One player's full set of moves for a turn, in execution order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Plan {
    records: Vec<ActionRecord>,
}

impl Plan {
    /// The "do nothing" plan.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_records(records: Vec<ActionRecord>) -> Self {
        Self { records }
    }

    pub fn push(&mut self, record: ActionRecord) {
        self.records.push(record);
    }

    pub fn pop(&mut self) -> Option<ActionRecord> {
        self.records.pop()
    }

    #[must_use]
    pub fn records(&self) -> &[ActionRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ActionRecord> {
        self.records.iter()
    }

    /// Action-kind indices in plan order.
    pub fn action_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.records.iter().map(|r| r.action.index())
    }
}

impl<'a> IntoIterator for &'a Plan {
    type Item = &'a ActionRecord;
    type IntoIter = std::slice::Iter<'a, ActionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl IntoIterator for Plan {
    type Item = ActionRecord;
    type IntoIter = std::vec::IntoIter<ActionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}
