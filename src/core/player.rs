//! Player identification and per-player ledgers.
//!
//! ## PlayerId
//!
//! Type-safe player number. The framework numbers players from 0.
//!
//! ## PlayerMap
//!
//! Per-player values (resources, objective-control turns) backed by a `Vec`.
//! Iteration is always in player order, so anything derived from a
//! `PlayerMap` (fingerprints, encodings) is deterministic.

use serde::{Deserialize, Serialize};

/// Player number as used by the host game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

impl PlayerId {
    /// Create a new player ID.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Get the raw player index (0-based).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Iterate over all player IDs for a game with `player_count` players.
    ///
    /// ```
    /// use tactics_ai::core::PlayerId;
    ///
    /// let players: Vec<_> = PlayerId::all(2).collect();
    /// assert_eq!(players, vec![PlayerId::new(0), PlayerId::new(1)]);
    /// ```
    pub fn all(player_count: usize) -> impl Iterator<Item = PlayerId> {
        (0..player_count as u8).map(PlayerId)
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Player {}", self.0)
    }
}

/// Per-player values, one slot per player in player order.
///
/// ```
/// use tactics_ai::core::{PlayerId, PlayerMap};
///
/// let mut gold: PlayerMap<i64> = PlayerMap::new(2, |p| 100 * (p.index() as i64 + 1));
/// if let Some(g) = gold.get_mut(PlayerId::new(1)) {
///     *g -= 40;
/// }
///
/// assert_eq!(gold.value(PlayerId::new(0)), 100);
/// assert_eq!(gold.value(PlayerId::new(1)), 160);
/// assert_eq!(gold.value(PlayerId::new(7)), 0);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerMap<T> {
    slots: Vec<T>,
}

impl<T> PlayerMap<T> {
    /// Build a ledger for `player_count` players from a per-player factory.
    ///
    /// Panics when `player_count` is 0 or above 255.
    pub fn new(player_count: usize, factory: impl Fn(PlayerId) -> T) -> Self {
        assert!(player_count > 0, "Must have at least 1 player");
        assert!(player_count <= 255, "At most 255 players supported");

        Self {
            slots: PlayerId::all(player_count).map(factory).collect(),
        }
    }

    pub fn with_default(player_count: usize) -> Self
    where
        T: Default,
    {
        Self::new(player_count, |_| T::default())
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.slots.len()
    }

    /// A player's slot, or `None` for a player outside this ledger.
    #[must_use]
    pub fn get(&self, player: PlayerId) -> Option<&T> {
        self.slots.get(player.index())
    }

    pub fn get_mut(&mut self, player: PlayerId) -> Option<&mut T> {
        self.slots.get_mut(player.index())
    }

    /// Iterate over `(PlayerId, &T)` pairs in player order.
    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, &T)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, v)| (PlayerId(i as u8), v))
    }
}

impl<T: Copy + Default> PlayerMap<T> {
    /// Copy out a player's value, defaulting for unknown players.
    #[must_use]
    pub fn value(&self, player: PlayerId) -> T {
        self.get(player).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_basics() {
        let p0 = PlayerId::new(0);
        let p1 = PlayerId::new(1);

        assert_eq!(p0.index(), 0);
        assert_eq!(p1.index(), 1);
        assert_eq!(format!("{}", p1), "Player 1");
        assert!(p0 < p1);
    }

    #[test]
    fn test_ledger_built_from_factory() {
        let ledger: PlayerMap<i64> = PlayerMap::new(3, |p| p.index() as i64 * 10);

        assert_eq!(ledger.value(PlayerId::new(0)), 0);
        assert_eq!(ledger.value(PlayerId::new(2)), 20);
        assert_eq!(ledger.player_count(), 3);
    }

    #[test]
    fn test_unknown_player_reads_default() {
        let mut ledger: PlayerMap<u32> = PlayerMap::new(2, |_| 7);

        assert_eq!(ledger.value(PlayerId::new(1)), 7);
        assert_eq!(ledger.value(PlayerId::new(9)), 0);
        assert!(ledger.get(PlayerId::new(9)).is_none());
        assert!(ledger.get_mut(PlayerId::new(9)).is_none());
    }

    #[test]
    fn test_slot_mutation() {
        let mut ledger: PlayerMap<i64> = PlayerMap::with_default(2);
        if let Some(v) = ledger.get_mut(PlayerId::new(1)) {
            *v -= 5;
        }

        assert_eq!(ledger.value(PlayerId::new(0)), 0);
        assert_eq!(ledger.value(PlayerId::new(1)), -5);
    }

    #[test]
    fn test_ledger_json_round_trip() {
        let ledger: PlayerMap<i64> = PlayerMap::new(2, |p| p.index() as i64 + 1);
        let json = serde_json::to_string(&ledger).unwrap();
        assert_eq!(json, r#"{"slots":[1,2]}"#);
        let back: PlayerMap<i64> = serde_json::from_str(&json).unwrap();
        assert_eq!(ledger, back);
    }

    #[test]
    #[should_panic(expected = "Must have at least 1 player")]
    fn test_zero_players_panics() {
        let _: PlayerMap<i64> = PlayerMap::with_default(0);
    }
}
