//! Values derived from a snapshot and the local identity.
//!
//! Everything here is a pure function of its inputs. Nothing is cached
//! between snapshots, so derived values cannot drift from the snapshot they
//! were computed from.

use std::sync::Arc;

use super::log_buffer::LogEntry;
use crate::{
    entities::{Card, GameSnapshot, Player},
    net::connection::ConnectionState,
};

/// The local player's seat, if the identity is set and seated.
pub fn my_player<'a>(snapshot: &'a GameSnapshot, identity: Option<&str>) -> Option<&'a Player> {
    identity.and_then(|id| snapshot.player(id))
}

/// The local player's hole cards, or an empty slice.
pub fn my_hole_cards<'a>(snapshot: &'a GameSnapshot, identity: Option<&str>) -> &'a [Card] {
    my_player(snapshot, identity).map_or(&[], |player| player.hole_cards.as_slice())
}

/// Whether the local participant may act now.
///
/// Requires a set identity, the snapshot naming us as the acting player, and
/// our seat not being folded. A player who is not seated is never on turn.
pub fn is_my_turn(snapshot: &GameSnapshot, identity: Option<&str>) -> bool {
    let Some(id) = identity else {
        return false;
    };
    snapshot.acting_player_id() == Some(id)
        && my_player(snapshot, Some(id)).is_some_and(|player| !player.has_folded)
}

/// One consistent observation of the session, published after every event.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SessionView {
    pub connection: ConnectionState,
    pub identity: Option<String>,
    pub snapshot: Arc<GameSnapshot>,
    pub auto_game_running: bool,
    pub player_count: usize,
    pub is_my_turn: bool,
    /// Activity log, oldest first.
    pub log: Vec<LogEntry>,
}

impl SessionView {
    pub fn my_player(&self) -> Option<&Player> {
        my_player(&self.snapshot, self.identity.as_deref())
    }

    pub fn my_hole_cards(&self) -> &[Card] {
        my_hole_cards(&self.snapshot, self.identity.as_deref())
    }
}
