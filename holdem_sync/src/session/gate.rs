use super::{
    SessionContext,
    notifier::{Notice, Severity},
};
use crate::{
    entities::{ActionKind, DEFAULT_CHIPS},
    errors::{PreconditionError, Result, SyncError},
    net::{
        connection::{ConnectionState, Outbound},
        messages::ClientMessage,
    },
};

/// Parse a user-entered raise amount.
///
/// Only strictly positive whole numbers are accepted.
pub fn parse_amount(input: &str) -> std::result::Result<i64, PreconditionError> {
    match input.trim().parse::<i64>() {
        Ok(amount) if amount > 0 => Ok(amount),
        _ => Err(PreconditionError::InvalidAmount(input.trim().to_string())),
    }
}

/// Checks local intents against the projected state before sending them.
///
/// The checks are optimistic. The server stays authoritative and may still
/// reject anything that passes here.
#[derive(Clone, Copy, Debug)]
pub struct ActionGate {
    local_turn_gating: bool,
}

impl Default for ActionGate {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ActionGate {
    /// With `local_turn_gating` off, out-of-turn actions are left for the
    /// server to reject.
    pub fn new(local_turn_gating: bool) -> Self {
        Self { local_turn_gating }
    }

    /// Send a betting action.
    ///
    /// `amount` is only used for raises; every other kind is sent with 0.
    pub fn submit_action(
        &self,
        kind: ActionKind,
        amount: i64,
        ctx: &mut SessionContext,
        out: &mut impl Outbound,
    ) -> Result<()> {
        require_connected(ctx, out)?;
        if ctx.projector.identity().is_none() {
            return Err(reject(ctx, PreconditionError::NotJoined));
        }
        if kind.requires_amount() && amount <= 0 {
            return Err(reject(
                ctx,
                PreconditionError::InvalidAmount(amount.to_string()),
            ));
        }
        if self.local_turn_gating && !ctx.projector.is_my_turn() {
            return Err(reject(ctx, PreconditionError::NotYourTurn));
        }

        let amount = if kind.requires_amount() { amount } else { 0 };
        let message = ClientMessage::PlayerAction {
            action_type: kind,
            amount,
        };
        transmit(&message, ctx, out)?;
        let entry = if kind.requires_amount() {
            format!("Action: {kind} {amount}")
        } else {
            format!("Action: {kind}")
        };
        ctx.log.push(Severity::Info, entry);
        Ok(())
    }

    /// Ask for a seat. `chips` defaults to [`DEFAULT_CHIPS`].
    pub fn join(
        &self,
        player_name: &str,
        chips: Option<i64>,
        ctx: &mut SessionContext,
        out: &mut impl Outbound,
    ) -> Result<()> {
        let player_name = player_name.trim();
        if player_name.is_empty() {
            return Err(reject(ctx, PreconditionError::MissingPlayerName));
        }
        require_connected(ctx, out)?;
        if ctx.projector.identity().is_some() {
            return Err(reject(ctx, PreconditionError::AlreadyJoined));
        }
        let chips = chips.unwrap_or(DEFAULT_CHIPS);
        if chips <= 0 {
            return Err(reject(
                ctx,
                PreconditionError::InvalidAmount(chips.to_string()),
            ));
        }

        let message = ClientMessage::Join {
            player_name: player_name.to_string(),
            chips,
            is_ai: false,
        };
        transmit(&message, ctx, out)?;
        ctx.log.push(
            Severity::Info,
            format!("Joining as {player_name} with {chips} chips..."),
        );
        Ok(())
    }

    pub fn start_game(&self, ctx: &mut SessionContext, out: &mut impl Outbound) -> Result<()> {
        require_connected(ctx, out)?;
        transmit(&ClientMessage::StartGame, ctx, out)
    }

    pub fn create_auto_game(
        &self,
        ctx: &mut SessionContext,
        out: &mut impl Outbound,
    ) -> Result<()> {
        lobby_request(
            ClientMessage::CreateAutoGame,
            "Creating auto game...",
            ctx,
            out,
        )
    }

    pub fn start_auto_game(&self, ctx: &mut SessionContext, out: &mut impl Outbound) -> Result<()> {
        lobby_request(
            ClientMessage::StartAutoGame,
            "Starting auto game...",
            ctx,
            out,
        )
    }

    pub fn stop_auto_game(&self, ctx: &mut SessionContext, out: &mut impl Outbound) -> Result<()> {
        lobby_request(
            ClientMessage::StopAutoGame,
            "Stopping auto game...",
            ctx,
            out,
        )
    }
}

fn lobby_request(
    message: ClientMessage,
    entry: &str,
    ctx: &mut SessionContext,
    out: &mut impl Outbound,
) -> Result<()> {
    require_connected(ctx, out)?;
    transmit(&message, ctx, out)?;
    ctx.log.push(Severity::Info, entry);
    Ok(())
}

fn require_connected(ctx: &SessionContext, out: &impl Outbound) -> Result<()> {
    if out.state() == ConnectionState::Connected {
        Ok(())
    } else {
        Err(reject(ctx, PreconditionError::NotConnected))
    }
}

/// Tell the user why nothing was sent.
fn reject(ctx: &SessionContext, error: PreconditionError) -> SyncError {
    let error = SyncError::from(error);
    ctx.notifier
        .notify(Notice::new(Severity::Error, error.client_message()));
    error
}

fn transmit(message: &ClientMessage, ctx: &SessionContext, out: &mut impl Outbound) -> Result<()> {
    out.send(message).inspect_err(|e| {
        // Precondition failures are reported by the connection itself.
        if !e.is_precondition() {
            log::error!("Failed to send {message}: {e}");
            ctx.notifier
                .notify(Notice::new(Severity::Error, e.client_message()));
        }
    })
}
