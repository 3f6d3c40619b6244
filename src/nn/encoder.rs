//! Flat feature encoding of a grid snapshot.
//!
//! Layout, from the perspective player's point of view:
//!
//! | section | features |
//! |---------|----------|
//! | header  | current player, turn, own control turns, own resources, mean enemy resources |
//! | per cell | x, y, structure code, structure owner, unit owner, unit type, hp, action points, attack, defence, movement |
//! | tail    | ally unit count, enemy unit count, own unit counts for type codes 0..5 |
//!
//! Cells come from the snapshot in grid order. Missing cells (a snapshot from
//! a smaller grid) are zero-filled, extra cells are dropped, so the length is
//! always `input_size()`.

use rustc_hash::FxHashMap;

use crate::actions::ACTION_COUNT;
use crate::core::{PlayerId, Position};
use crate::state::{StateSnapshot, UnitRecord};

use super::traits::StateEncoder;

const HEADER_FEATURES: usize = 5;
const CELL_FEATURES: usize = 11;
const TYPE_COUNT_FEATURES: usize = 5;
const TAIL_FEATURES: usize = 2 + TYPE_COUNT_FEATURES;

/// Encoder for a grid with a fixed number of cells.
#[derive(Clone, Debug)]
pub struct GridStateEncoder {
    cell_count: usize,
}

impl GridStateEncoder {
    pub fn new(cell_count: usize) -> Self {
        Self { cell_count }
    }

    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cell_count
    }

    /// Input size for a grid of `cell_count` cells.
    #[must_use]
    pub const fn size_for(cell_count: usize) -> usize {
        HEADER_FEATURES + cell_count * CELL_FEATURES + TAIL_FEATURES
    }
}

impl StateEncoder for GridStateEncoder {
    fn encode(&self, state: &StateSnapshot, perspective: PlayerId) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.input_size());

        let enemies: Vec<PlayerId> = PlayerId::all(state.player_count())
            .filter(|p| *p != perspective)
            .collect();
        let enemy_resources = if enemies.is_empty() {
            0.0
        } else {
            enemies.iter().map(|p| state.resources(*p) as f32).sum::<f32>() / enemies.len() as f32
        };

        out.push(f32::from(state.current_player().0));
        out.push(state.turn_number() as f32);
        out.push(state.control_turns(perspective) as f32);
        out.push(state.resources(perspective) as f32);
        out.push(enemy_resources);

        let occupants: FxHashMap<Position, &UnitRecord> = state
            .units()
            .filter(|u| u.is_alive() && !u.is_structure)
            .map(|u| (u.position, u))
            .collect();

        for cell in state.cells().iter().take(self.cell_count) {
            out.push(cell.x as f32);
            out.push(cell.y as f32);
            match state.structure_at(*cell) {
                Some(s) => {
                    out.push(f32::from(s.kind.code()));
                    out.push(f32::from(s.owner.0));
                }
                None => out.extend([0.0, 0.0]),
            }
            match occupants.get(cell) {
                Some(u) => out.extend([
                    f32::from(u.owner.0),
                    f32::from(u.unit_type),
                    u.hp as f32,
                    u.action_points as f32,
                    u.attack as f32,
                    u.defence as f32,
                    u.movement as f32,
                ]),
                None => out.extend([0.0; 7]),
            }
        }
        let filled = state.cells().len().min(self.cell_count);
        out.extend(std::iter::repeat(0.0).take((self.cell_count - filled) * CELL_FEATURES));

        let fighters = |owner_is_us: bool| {
            state
                .units()
                .filter(|u| u.is_alive() && !u.is_structure)
                .filter(|u| (u.owner == perspective) == owner_is_us)
                .count() as f32
        };
        out.push(fighters(true));
        out.push(fighters(false));

        let mut type_counts = [0.0_f32; TYPE_COUNT_FEATURES];
        for unit in state.units_of(perspective) {
            if let Some(slot) = type_counts.get_mut(usize::from(unit.unit_type)) {
                *slot += 1.0;
            }
        }
        out.extend(type_counts);

        out
    }

    fn input_size(&self) -> usize {
        Self::size_for(self.cell_count)
    }

    fn action_space_size(&self) -> usize {
        ACTION_COUNT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::UnitId;
    use crate::state::{Structure, StructureType};

    fn p(n: u8) -> PlayerId {
        PlayerId::new(n)
    }

    fn grid_cells(w: i32, h: i32) -> Vec<Position> {
        (0..h).flat_map(|y| (0..w).map(move |x| Position::new(x, y))).collect()
    }

    fn sample() -> StateSnapshot {
        let mut state = StateSnapshot::new(2, p(0))
            .with_cells(grid_cells(2, 2))
            .with_turn_number(4);
        state.set_resources(p(0), 120);
        state.set_resources(p(1), 60);
        state.set_control_turns(p(0), 2);
        state.add_structure(Structure::new(StructureType::Base, p(1), Position::new(1, 0)));
        state.add_unit(
            UnitRecord::new(UnitId(1), p(0), Position::new(0, 0))
                .with_health(15, 20)
                .with_combat(7, 3, 1)
                .with_movement(2)
                .with_unit_type(3),
        );
        state.add_unit(UnitRecord::new(UnitId(2), p(1), Position::new(1, 1)));
        state
    }

    #[test]
    fn test_size() {
        let encoder = GridStateEncoder::new(4);
        assert_eq!(encoder.input_size(), 5 + 4 * 11 + 7);
        assert_eq!(encoder.encode(&sample(), p(0)).len(), encoder.input_size());
        assert_eq!(encoder.action_space_size(), 6);
    }

    #[test]
    fn test_header_and_cells() {
        let x = GridStateEncoder::new(4).encode(&sample(), p(0));

        assert_eq!(&x[..5], &[0.0, 4.0, 2.0, 120.0, 60.0]);
        // Cell (0, 0): own knight.
        assert_eq!(&x[5..16], &[0.0, 0.0, 0.0, 0.0, 0.0, 3.0, 15.0, 1.0, 7.0, 3.0, 2.0]);
        // Cell (1, 0): enemy base, no unit.
        assert_eq!(&x[16..20], &[1.0, 0.0, 2.0, 1.0]);
    }

    #[test]
    fn test_tail_counts() {
        let x = GridStateEncoder::new(4).encode(&sample(), p(0));
        let tail = &x[x.len() - 7..];
        assert_eq!(tail, &[1.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_size_mismatch_is_padded() {
        let small = GridStateEncoder::new(9);
        let x = small.encode(&sample(), p(1));
        assert_eq!(x.len(), small.input_size());

        let tiny = GridStateEncoder::new(1);
        assert_eq!(tiny.encode(&sample(), p(1)).len(), tiny.input_size());
    }
}
