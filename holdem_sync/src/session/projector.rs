//! Holds the latest authoritative snapshot and answers reads about it.

use std::sync::Arc;

use super::view;
use crate::entities::{Card, GameSnapshot, Phase, Player};

/// Sole owner of the game snapshot and the local identity.
///
/// Snapshots are swapped whole; no field is ever patched in place. The
/// auto-play flag and the server-reported player count are separate
/// projections because they are also fed by notices and status polls.
#[derive(Clone, Debug, Default)]
pub struct StateProjector {
    identity: Option<String>,
    snapshot: Arc<GameSnapshot>,
    snapshot_timestamp: Option<i64>,
    auto_game_running: bool,
    reported_player_count: Option<usize>,
}

impl StateProjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot wholesale.
    ///
    /// Applying the same snapshot twice leaves every derived value
    /// unchanged.
    pub fn apply_snapshot(&mut self, snapshot: GameSnapshot) {
        if let Some(running) = snapshot.auto_game_running {
            self.auto_game_running = running;
        }
        self.reported_player_count = None;
        self.snapshot = Arc::new(snapshot);
    }

    /// Replace the snapshot unless it is older than the one already applied.
    ///
    /// `timestamp` is the server clock from the frame envelope. Snapshots
    /// without one are always applied. Returns whether the snapshot was
    /// applied.
    pub fn apply_snapshot_at(&mut self, snapshot: GameSnapshot, timestamp: Option<i64>) -> bool {
        if let (Some(incoming), Some(applied)) = (timestamp, self.snapshot_timestamp)
            && incoming < applied
        {
            return false;
        }
        if timestamp.is_some() {
            self.snapshot_timestamp = timestamp;
        }
        self.apply_snapshot(snapshot);
        true
    }

    pub fn snapshot(&self) -> &Arc<GameSnapshot> {
        &self.snapshot
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Record the identity acknowledged by the server.
    ///
    /// The identity is set once per session. Returns `false` and keeps the
    /// current value if one is already set.
    pub fn set_identity(&mut self, id: impl Into<String>) -> bool {
        if self.identity.is_some() {
            return false;
        }
        self.identity = Some(id.into());
        true
    }

    pub fn pot(&self) -> i64 {
        self.snapshot.pot
    }

    pub fn phase(&self) -> Phase {
        self.snapshot.phase
    }

    pub fn players(&self) -> &[Player] {
        &self.snapshot.players
    }

    pub fn community_cards(&self) -> &[Card] {
        &self.snapshot.community_cards
    }

    pub fn current_bet(&self) -> i64 {
        self.snapshot.current_bet
    }

    pub fn acting_player(&self) -> Option<&Player> {
        self.snapshot.current_player.as_ref()
    }

    pub fn my_player(&self) -> Option<&Player> {
        view::my_player(&self.snapshot, self.identity())
    }

    pub fn my_hole_cards(&self) -> &[Card] {
        view::my_hole_cards(&self.snapshot, self.identity())
    }

    pub fn is_my_turn(&self) -> bool {
        view::is_my_turn(&self.snapshot, self.identity())
    }

    pub fn auto_game_running(&self) -> bool {
        self.auto_game_running
    }

    /// Returns whether the flag changed.
    pub fn set_auto_game_running(&mut self, running: bool) -> bool {
        let changed = self.auto_game_running != running;
        self.auto_game_running = running;
        changed
    }

    /// Seated players, or the server's total when a status poll reported a
    /// different number since the last snapshot.
    pub fn player_count(&self) -> usize {
        self.reported_player_count
            .unwrap_or(self.snapshot.players.len())
    }

    /// Record the server's player total. Returns whether the projected count
    /// changed.
    pub fn set_reported_player_count(&mut self, count: usize) -> bool {
        if count == self.player_count() {
            return false;
        }
        self.reported_player_count = Some(count);
        true
    }

    /// Forget everything, as a page reload would.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seat(id: &str, has_folded: bool) -> Player {
        Player {
            id: id.to_string(),
            name: id.to_string(),
            has_folded,
            ..Default::default()
        }
    }

    fn acting(id: &str, has_folded: bool) -> GameSnapshot {
        GameSnapshot {
            pot: 30,
            phase: Phase::PreFlop,
            players: vec![seat(id, has_folded)],
            current_player: Some(seat(id, false)),
            ..Default::default()
        }
    }

    #[test]
    fn test_initial_state() {
        let projector = StateProjector::new();
        assert_eq!(projector.identity(), None);
        assert_eq!(projector.pot(), 0);
        assert_eq!(projector.phase(), Phase::Waiting);
        assert!(projector.players().is_empty());
        assert!(!projector.is_my_turn());
        assert!(!projector.auto_game_running());
    }

    #[test]
    fn test_identity_set_once() {
        let mut projector = StateProjector::new();
        assert!(projector.set_identity("p1"));
        assert!(!projector.set_identity("p2"));
        assert_eq!(projector.identity(), Some("p1"));
    }

    #[test]
    fn test_fold_flip_clears_turn() {
        let mut projector = StateProjector::new();
        projector.set_identity("p1");

        projector.apply_snapshot(acting("p1", false));
        assert!(projector.is_my_turn());

        projector.apply_snapshot(acting("p1", true));
        assert!(!projector.is_my_turn());
        assert_eq!(projector.acting_player().unwrap().id, "p1");
    }

    #[test]
    fn test_apply_snapshot_is_total_replacement() {
        let mut projector = StateProjector::new();
        projector.apply_snapshot(GameSnapshot {
            pot: 500,
            community_cards: vec![Card::default(); 3],
            ..Default::default()
        });
        projector.apply_snapshot(GameSnapshot::default());
        assert_eq!(projector.pot(), 0);
        assert!(projector.community_cards().is_empty());
    }

    #[test]
    fn test_apply_snapshot_twice_is_idempotent() {
        let mut projector = StateProjector::new();
        projector.set_identity("p1");
        projector.apply_snapshot(acting("p1", false));
        let first = (projector.pot(), projector.phase(), projector.is_my_turn());
        projector.apply_snapshot(acting("p1", false));
        assert_eq!(first, (projector.pot(), projector.phase(), projector.is_my_turn()));
    }

    #[test]
    fn test_stale_snapshot_is_dropped() {
        let mut projector = StateProjector::new();
        let newer = GameSnapshot {
            pot: 200,
            ..Default::default()
        };
        let older = GameSnapshot {
            pot: 100,
            ..Default::default()
        };

        assert!(projector.apply_snapshot_at(newer, Some(2_000)));
        assert!(!projector.apply_snapshot_at(older.clone(), Some(1_000)));
        assert_eq!(projector.pot(), 200);

        // Same timestamp and untimed snapshots are applied.
        assert!(projector.apply_snapshot_at(older.clone(), Some(2_000)));
        assert_eq!(projector.pot(), 100);
        assert!(projector.apply_snapshot_at(GameSnapshot::default(), None));
        assert_eq!(projector.pot(), 0);
    }

    #[test]
    fn test_auto_flag_follows_snapshot_only_when_present() {
        let mut projector = StateProjector::new();
        assert!(projector.set_auto_game_running(true));
        assert!(!projector.set_auto_game_running(true));

        projector.apply_snapshot(GameSnapshot::default());
        assert!(projector.auto_game_running());

        projector.apply_snapshot(GameSnapshot {
            auto_game_running: Some(false),
            ..Default::default()
        });
        assert!(!projector.auto_game_running());
    }

    #[test]
    fn test_reported_player_count_until_next_snapshot() {
        let mut projector = StateProjector::new();
        projector.apply_snapshot(acting("p1", false));
        assert_eq!(projector.player_count(), 1);

        assert!(!projector.set_reported_player_count(1));
        assert!(projector.set_reported_player_count(6));
        assert_eq!(projector.player_count(), 6);

        projector.apply_snapshot(acting("p1", false));
        assert_eq!(projector.player_count(), 1);
    }

    #[test]
    fn test_reset() {
        let mut projector = StateProjector::new();
        projector.set_identity("p1");
        projector.apply_snapshot_at(acting("p1", false), Some(5));
        projector.set_auto_game_running(true);

        projector.reset();
        assert_eq!(projector.identity(), None);
        assert_eq!(projector.pot(), 0);
        assert!(!projector.auto_game_running());
        // The staleness watermark is forgotten too.
        assert!(projector.apply_snapshot_at(GameSnapshot::default(), Some(1)));
        assert!(projector.set_identity("p2"));
    }
}
