use super::{
    SessionContext,
    notifier::{Notice, Severity},
};
use crate::{
    errors::SyncError,
    net::messages::{self, AutoGameCreated, InboundFrame, JoinResult, ServerMessage},
};

/// Handle one raw frame.
///
/// Frames must be passed in arrival order. A frame that cannot be decoded is
/// logged and dropped; it never affects session state.
pub fn dispatch(text: &str, ctx: &mut SessionContext) {
    match messages::decode(text) {
        Ok(frame) => dispatch_frame(frame, ctx),
        Err(e) => log::warn!("Dropping frame: {e}"),
    }
}

/// Route a decoded frame by kind.
pub fn dispatch_frame(frame: InboundFrame, ctx: &mut SessionContext) {
    let InboundFrame {
        kind,
        timestamp,
        message,
    } = frame;

    match message {
        ServerMessage::Connection { message } => ctx.log.push(Severity::Info, message),
        ServerMessage::JoinResult(result) => on_join_result(result, ctx),
        ServerMessage::GameState(snapshot) => {
            if !ctx.projector.apply_snapshot_at(snapshot, timestamp) {
                log::debug!("Dropping stale game state stamped {timestamp:?}");
            }
        }
        ServerMessage::GameStarted => ctx.log.push(Severity::Success, "Game started!"),
        ServerMessage::PlayerJoined(data) => {
            let name = data
                .player
                .map(|player| player.name)
                .unwrap_or_else(|| "unknown".to_string());
            ctx.log
                .push(Severity::Info, format!("Player {name} joined the game"));
        }
        ServerMessage::PlayerDisconnected(data) => ctx.log.push(
            Severity::Warning,
            format!("Player {} left the game", data.player_id),
        ),
        ServerMessage::AutoGameCreated(data) => on_auto_game_created(data, ctx),
        ServerMessage::AutoGameStarted => {
            ctx.projector.set_auto_game_running(true);
            ctx.notifier
                .notify(Notice::new(Severity::Success, "Auto game started!"));
            ctx.log.push(
                Severity::Success,
                "Auto game started, AI players will play automatically",
            );
        }
        ServerMessage::AutoGameStopped => {
            ctx.projector.set_auto_game_running(false);
            ctx.notifier
                .notify(Notice::new(Severity::Info, "Auto game stopped"));
            ctx.log.push(Severity::Info, "Auto game stopped");
        }
        ServerMessage::Error { message } => {
            let error = SyncError::Protocol(message);
            ctx.log
                .push(Severity::Error, format!("Error: {}", error.client_message()));
            ctx.notifier
                .notify(Notice::new(Severity::Error, error.client_message()));
        }
        ServerMessage::Unknown(_) => log::debug!("Ignoring unknown message kind '{kind}'"),
    }
}

fn on_join_result(result: JoinResult, ctx: &mut SessionContext) {
    let player = match (result.success, result.player) {
        (true, Some(player)) => player,
        (true, None) => {
            log::warn!("Join acknowledged without player data");
            return;
        }
        (false, _) => {
            ctx.notifier
                .notify(Notice::new(Severity::Error, "Failed to join the game"));
            ctx.log.push(Severity::Error, "Failed to join the game");
            return;
        }
    };

    if !ctx.projector.set_identity(player.id.clone()) {
        log::warn!(
            "Ignoring join result for {}: already joined as {}",
            player.id,
            ctx.projector.identity().unwrap_or_default()
        );
        return;
    }
    ctx.notifier
        .notify(Notice::new(Severity::Success, "Joined the game!"));
    ctx.log.push(
        Severity::Success,
        format!("Joined the game as {}", player.name),
    );
}

fn on_auto_game_created(data: AutoGameCreated, ctx: &mut SessionContext) {
    if data.success {
        ctx.notifier
            .notify(Notice::new(Severity::Success, "Auto game created!"));
        let count = data
            .players_count
            .map_or_else(|| "unknown".to_string(), |n| n.to_string());
        ctx.log.push(
            Severity::Success,
            format!("Auto game created, players: {count}"),
        );
    } else {
        ctx.notifier
            .notify(Notice::new(Severity::Error, "Failed to create auto game"));
        ctx.log.push(Severity::Error, "Failed to create auto game");
    }
}
