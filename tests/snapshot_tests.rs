//! Snapshot integration tests: capture from a live world, copy-on-write
//! independence, and simulation against the captured state.

use proptest::prelude::*;

use tactics_ai::actions::{apply_plan, Action, ActionRecord, Plan};
use tactics_ai::arena::{ArenaBuilder, NEUTRAL};
use tactics_ai::core::{GameRng, PlayerId, Position, UnitId};
use tactics_ai::driver::{GridService, LiveWorld};
use tactics_ai::state::{StateSnapshot, StructureType};

fn p(n: u8) -> PlayerId {
    PlayerId::new(n)
}

fn skirmish_state() -> StateSnapshot {
    let (grid, world) = ArenaBuilder::skirmish(5).build();
    StateSnapshot::capture(&world, &world, &grid, p(0))
}

// =============================================================================
// Capture
// =============================================================================

#[test]
fn test_capture_reads_units_structures_and_resources() {
    let (grid, world) = ArenaBuilder::skirmish(5).build();
    let state = StateSnapshot::capture(&world, &world, &grid, p(0));

    assert_eq!(state.units().count(), world.units().len());
    assert_eq!(state.structures().count(), 5);
    assert_eq!(state.cells().len(), grid.cells().len());
    assert_eq!(state.resources(p(0)), 100);
    assert_eq!(state.resources(p(1)), 100);
    assert_eq!(state.current_player(), p(0));
    assert_eq!(state.objective_position(), Position::new(2, 2));
    assert!(state.winner().is_none());

    let objective = state.structure_at(Position::new(2, 2)).unwrap();
    assert_eq!(objective.kind, StructureType::Objective);
    assert_eq!(objective.owner, NEUTRAL);
}

#[test]
fn test_capture_classifies_unit_types() {
    let state = skirmish_state();

    let swordman = state.unit_at(Position::new(1, 0)).unwrap();
    assert_eq!(swordman.unit_type, 1);
    assert!(!swordman.is_structure);

    let archer = state.unit_at(Position::new(0, 1)).unwrap();
    assert_eq!(archer.unit_type, 2);
    assert_eq!(archer.attack_range, 3);
}

#[test]
fn test_capture_skips_dead_units() {
    let (grid, mut world) = ArenaBuilder::skirmish(5).build();
    let victim = world.units()[5].id;
    world.unit_mut(victim).unwrap().hp = 0;

    let state = StateSnapshot::capture(&world, &world, &grid, p(0));
    assert!(state.unit(victim).is_none());
}

#[test]
fn test_capture_derives_winner() {
    let (grid, mut world) = ArenaBuilder::skirmish(5).build();
    let enemy_base = world
        .units()
        .into_iter()
        .find(|u| u.type_name == "Player1Base")
        .unwrap()
        .id;
    world.unit_mut(enemy_base).unwrap().owner = p(0);

    let state = StateSnapshot::capture(&world, &world, &grid, p(0));
    assert_eq!(state.winner(), Some(p(0)));
    assert!(state.is_terminal());
}

// =============================================================================
// Clone Independence
// =============================================================================

#[derive(Clone, Debug)]
enum Mutation {
    Damage(usize, i32),
    Relocate(usize, i32, i32),
    Remove(usize),
    Resources(u8, i64),
    Control(u8, u32),
    Flip(usize, u8),
}

fn mutation() -> impl Strategy<Value = Mutation> {
    prop_oneof![
        (0usize..16, 1i32..40).prop_map(|(i, d)| Mutation::Damage(i, d)),
        (0usize..16, 0i32..5, 0i32..5).prop_map(|(i, x, y)| Mutation::Relocate(i, x, y)),
        (0usize..16).prop_map(Mutation::Remove),
        (0u8..2, -200i64..200).prop_map(|(pl, d)| Mutation::Resources(pl, d)),
        (0u8..2, 0u32..6).prop_map(|(pl, t)| Mutation::Control(pl, t)),
        (0usize..8, 0u8..2).prop_map(|(i, pl)| Mutation::Flip(i, pl)),
    ]
}

fn apply(state: &mut StateSnapshot, m: &Mutation) {
    let ids: Vec<UnitId> = state.units().map(|u| u.id).collect();
    let structures: Vec<Position> = state.structures().map(|s| s.position).collect();
    match *m {
        Mutation::Damage(i, d) => {
            if let Some(unit) = ids.get(i).and_then(|id| state.unit_mut(*id)) {
                unit.hp -= d;
            }
        }
        Mutation::Relocate(i, x, y) => {
            if let Some(unit) = ids.get(i).and_then(|id| state.unit_mut(*id)) {
                unit.position = Position::new(x, y);
            }
        }
        Mutation::Remove(i) => {
            if let Some(id) = ids.get(i) {
                state.remove_unit(*id);
            }
        }
        Mutation::Resources(pl, d) => state.add_resources(p(pl), d),
        Mutation::Control(pl, t) => state.set_control_turns(p(pl), t),
        Mutation::Flip(i, pl) => {
            if let Some(s) = structures.get(i).and_then(|at| state.structure_at_mut(*at)) {
                s.owner = p(pl);
            }
        }
    }
    state.refresh_winner();
}

proptest! {
    #[test]
    fn prop_mutating_clone_leaves_original(mutations in proptest::collection::vec(mutation(), 1..20)) {
        let original = skirmish_state();
        let before = serde_json::to_string(&original).unwrap();
        let fingerprint = original.fingerprint();

        let mut copy = original.clone();
        for m in &mutations {
            apply(&mut copy, m);
        }

        prop_assert_eq!(serde_json::to_string(&original).unwrap(), before);
        prop_assert_eq!(original.fingerprint(), fingerprint);
    }
}

#[test]
fn test_simulated_plan_leaves_original() {
    let original = skirmish_state();
    let before = original.clone();
    let swordman = original.unit_at(Position::new(1, 0)).unwrap().id;

    let plan = Plan::from_records(vec![ActionRecord::new(
        swordman,
        Action::Move { to: Position::new(2, 2) },
    )]);
    let mut child = original.clone();
    apply_plan(&plan, &mut child, &GameRng::new(1));
    child.refresh_winner();

    assert_eq!(original, before);
    assert_eq!(child.unit(swordman).unwrap().position, Position::new(2, 2));
    assert_eq!(child.structure_at(Position::new(2, 2)).unwrap().owner, p(0));
    assert_ne!(child.fingerprint(), original.fingerprint());
}

#[test]
fn test_equal_content_equal_fingerprint() {
    let a = skirmish_state();
    let b = skirmish_state();
    assert_eq!(a.fingerprint(), b.fingerprint());

    let mut c = a.clone();
    c.add_resources(p(1), 1);
    assert_ne!(a.fingerprint(), c.fingerprint());
}
