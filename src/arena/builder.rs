//! Fluent construction of sandbox games.

use std::sync::Arc;

use crate::actions::{Capabilities, Capability, SpawnOption, SpawnRoster};
use crate::core::{PlayerId, Position, UnitId};
use crate::driver::UnitView;

use super::grid::SquareGrid;
use super::sandbox::{SandboxWorld, NEUTRAL};

/// Units a base may field at once.
pub const DEFAULT_UNIT_LIMIT: usize = 6;

/// Builds a `SquareGrid` and a `SandboxWorld` on it.
///
/// ```
/// use tactics_ai::arena::{ArenaBuilder, NEUTRAL};
/// use tactics_ai::core::{PlayerId, Position};
/// use tactics_ai::driver::LiveWorld;
///
/// let (_grid, world) = ArenaBuilder::new(6, 6)
///     .with_resources(120)
///     .base(PlayerId::new(0), Position::new(0, 0))
///     .base(PlayerId::new(1), Position::new(5, 5))
///     .objective(NEUTRAL, Position::new(3, 3))
///     .swordman(PlayerId::new(0), Position::new(1, 0))
///     .build();
///
/// assert_eq!(world.units().len(), 4);
/// ```
#[derive(Clone, Debug)]
pub struct ArenaBuilder {
    width: i32,
    height: i32,
    players: usize,
    resources: i64,
    income: i64,
    objective_win_turns: Option<u32>,
    seed: u64,
    blocked: Vec<Position>,
    units: Vec<UnitView>,
}

impl ArenaBuilder {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            players: 2,
            resources: 0,
            income: 0,
            objective_win_turns: None,
            seed: 0,
            blocked: Vec::new(),
            units: Vec::new(),
        }
    }

    /// Two bases in opposite corners, a neutral Objective in the middle,
    /// neutral outposts in the other corners, and a swordman and an archer
    /// per side.
    pub fn skirmish(size: i32) -> Self {
        let far = size - 1;
        let mid = size / 2;
        let (p0, p1) = (PlayerId::new(0), PlayerId::new(1));
        Self::new(size, size)
            .with_resources(100)
            .with_income(10)
            .base(p0, Position::new(0, 0))
            .base(p1, Position::new(far, far))
            .objective(NEUTRAL, Position::new(mid, mid))
            .outpost(NEUTRAL, Position::new(far, 0))
            .outpost(NEUTRAL, Position::new(0, far))
            .swordman(p0, Position::new(1, 0))
            .archer(p0, Position::new(0, 1))
            .swordman(p1, Position::new(far - 1, far))
            .archer(p1, Position::new(far, far - 1))
    }

    /// What every base offers.
    #[must_use]
    pub fn roster() -> Vec<SpawnOption> {
        vec![
            SpawnOption {
                unit_type: 1,
                price: 40,
                attack: 8,
                defence: 4,
                hit_points: 20,
                movement: 3,
                attack_range: 1,
            },
            SpawnOption {
                unit_type: 2,
                price: 50,
                attack: 7,
                defence: 2,
                hit_points: 15,
                movement: 2,
                attack_range: 3,
            },
            SpawnOption {
                unit_type: 3,
                price: 70,
                attack: 10,
                defence: 6,
                hit_points: 25,
                movement: 4,
                attack_range: 1,
            },
        ]
    }

    pub fn with_players(mut self, players: usize) -> Self {
        self.players = players;
        self
    }

    /// Starting resources of every player.
    pub fn with_resources(mut self, resources: i64) -> Self {
        self.resources = resources;
        self
    }

    /// Per-turn income of every player.
    pub fn with_income(mut self, income: i64) -> Self {
        self.income = income;
        self
    }

    pub fn with_objective_win_turns(mut self, turns: u32) -> Self {
        self.objective_win_turns = Some(turns);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_blocked(mut self, cells: impl IntoIterator<Item = Position>) -> Self {
        self.blocked.extend(cells);
        self
    }

    /// Add any unit.
    pub fn unit(mut self, view: UnitView) -> Self {
        self.units.push(view);
        self
    }

    pub fn swordman(self, owner: PlayerId, at: Position) -> Self {
        self.fighter(owner, at, "Swordman", 20, 8, 4, 3, 1)
    }

    pub fn archer(self, owner: PlayerId, at: Position) -> Self {
        self.fighter(owner, at, "Archer", 15, 7, 2, 2, 3)
    }

    pub fn knight(self, owner: PlayerId, at: Position) -> Self {
        self.fighter(owner, at, "Knight", 25, 10, 6, 4, 1)
    }

    /// A base that can spawn from `roster()` and upgrade its income.
    pub fn base(self, owner: PlayerId, at: Position) -> Self {
        let roster = Arc::new(SpawnRoster {
            options: Self::roster(),
            unit_limit: DEFAULT_UNIT_LIMIT,
        });
        let capabilities = Capabilities::from_iter([
            Capability::Spawn(roster),
            Capability::UpgradeBase {
                cost: 50,
                income_delta: 10,
            },
        ]);
        self.structure(owner, at, format!("Player{}Base", owner.0), 50, capabilities)
    }

    pub fn outpost(self, owner: PlayerId, at: Position) -> Self {
        self.structure(owner, at, "Outpost".to_string(), 20, Capabilities::new())
    }

    pub fn objective(self, owner: PlayerId, at: Position) -> Self {
        self.structure(owner, at, "Objective".to_string(), 30, Capabilities::new())
    }

    #[allow(clippy::too_many_arguments)]
    fn fighter(
        self,
        owner: PlayerId,
        at: Position,
        name: &str,
        hp: i32,
        attack: i32,
        defence: i32,
        movement: i32,
        attack_range: i32,
    ) -> Self {
        self.unit(UnitView {
            id: UnitId(0),
            owner,
            position: at,
            hp,
            total_hp: hp,
            attack,
            defence,
            movement,
            total_movement: movement,
            attack_range,
            action_points: 1,
            total_action_points: 1,
            is_structure: false,
            type_name: name.to_string(),
            original_owner: None,
            capabilities: Capability::soldier(),
        })
    }

    fn structure(
        self,
        owner: PlayerId,
        at: Position,
        name: String,
        hp: i32,
        capabilities: Capabilities,
    ) -> Self {
        self.unit(UnitView {
            id: UnitId(0),
            owner,
            position: at,
            hp,
            total_hp: hp,
            attack: 0,
            defence: 0,
            movement: 0,
            total_movement: 0,
            attack_range: 0,
            action_points: 1,
            total_action_points: 1,
            is_structure: true,
            type_name: name,
            original_owner: Some(owner),
            capabilities,
        })
    }

    /// Finish construction. Units get ids in the order they were added.
    pub fn build(self) -> (SquareGrid, SandboxWorld) {
        let grid = SquareGrid::new(self.width, self.height).with_blocked(self.blocked);
        let mut world = SandboxWorld::new(grid.clone(), self.players, self.seed);
        if let Some(turns) = self.objective_win_turns {
            world = world.with_objective_win_turns(turns);
        }
        for player in PlayerId::all(self.players) {
            crate::driver::ResourceLedger::update_value(&mut world, player, self.resources);
            world.set_income(player, self.income);
        }
        for view in self.units {
            world.add_unit(view);
        }
        (grid, world)
    }
}
