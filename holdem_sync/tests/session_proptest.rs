/// Property-based tests for snapshot projection and the activity log
///
/// These tests verify the projector and log buffer invariants across
/// randomly generated snapshots and append sequences.
use holdem_sync::{
    GameSnapshot, Phase, Player,
    session::{
        log_buffer::LogBuffer, notifier::Severity, projector::StateProjector, view::is_my_turn,
    },
};
use proptest::prelude::*;

// Strategy to generate a phase
fn phase_strategy() -> impl Strategy<Value = Phase> {
    prop_oneof![
        Just(Phase::Waiting),
        Just(Phase::PreFlop),
        Just(Phase::Flop),
        Just(Phase::Turn),
        Just(Phase::River),
        Just(Phase::Showdown),
        Just(Phase::Finished),
    ]
}

// Strategy to generate a player with an id from a small pool so identities collide
fn player_strategy() -> impl Strategy<Value = Player> {
    (0u8..6, 0i64..5_000, any::<bool>()).prop_map(|(id, chips, has_folded)| Player {
        id: format!("p{id}"),
        name: format!("Player {id}"),
        chips,
        has_folded,
        ..Default::default()
    })
}

fn snapshot_strategy() -> impl Strategy<Value = GameSnapshot> {
    (
        0i64..10_000,
        phase_strategy(),
        prop::collection::vec(player_strategy(), 0..=6),
        prop::option::of(player_strategy()),
        0i64..1_000,
        prop::option::of(any::<bool>()),
    )
        .prop_map(
            |(pot, phase, players, current_player, current_bet, auto_game_running)| GameSnapshot {
                pot,
                phase,
                players,
                community_cards: Vec::new(),
                current_player,
                current_bet,
                auto_game_running,
            },
        )
}

// Everything a reader can observe through the projector
fn observe(projector: &StateProjector) -> (i64, Phase, usize, i64, bool, bool, usize) {
    (
        projector.pot(),
        projector.phase(),
        projector.players().len(),
        projector.current_bet(),
        projector.is_my_turn(),
        projector.auto_game_running(),
        projector.my_hole_cards().len(),
    )
}

proptest! {
    #[test]
    fn test_apply_snapshot_is_idempotent(
        snapshot in snapshot_strategy(),
        identity in prop::option::of(0u8..6),
    ) {
        let mut projector = StateProjector::new();
        if let Some(id) = identity {
            projector.set_identity(format!("p{id}"));
        }

        projector.apply_snapshot(snapshot.clone());
        let once = observe(&projector);
        projector.apply_snapshot(snapshot);
        prop_assert_eq!(once, observe(&projector));
    }

    #[test]
    fn test_latest_snapshot_wins(
        first in snapshot_strategy(),
        second in snapshot_strategy(),
    ) {
        let mut projector = StateProjector::new();
        projector.apply_snapshot(first);
        projector.apply_snapshot(second.clone());
        prop_assert_eq!(projector.snapshot().as_ref(), &second);
    }

    #[test]
    fn test_is_my_turn_matches_definition(
        snapshot in snapshot_strategy(),
        identity in prop::option::of(0u8..6),
    ) {
        let identity = identity.map(|id| format!("p{id}"));
        let expected = match &identity {
            None => false,
            Some(id) => {
                snapshot.acting_player_id() == Some(id.as_str())
                    && snapshot.player(id).is_some_and(|p| !p.has_folded)
            }
        };
        prop_assert_eq!(is_my_turn(&snapshot, identity.as_deref()), expected);
    }

    #[test]
    fn test_log_keeps_newest_in_arrival_order(
        capacity in 1usize..20,
        count in 0usize..100,
    ) {
        let mut log = LogBuffer::new(capacity);
        for i in 0..count {
            log.push(Severity::Info, i.to_string());
        }

        let kept: Vec<usize> = log
            .iter()
            .map(|entry| entry.message.parse().unwrap())
            .collect();
        let expected: Vec<usize> = (count.saturating_sub(capacity)..count).collect();
        prop_assert_eq!(kept, expected);
    }
}
