use holdem_sync::{ActionKind, session::gate::parse_amount};
use std::fmt;

/// Help text listing every command.
pub const HELP_TEXT: &str = "\
Available commands:
  Game actions: fold, check, call, raise <amount>, allin
  Table: join <name> [chips], start
  Auto game: auto create, auto start, auto stop
  Connection: state, reconnect, close, reset
  Other: help, quit
";

/// A parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// A betting action. `amount` is zero for everything but raises.
    Action { kind: ActionKind, amount: i64 },
    Join { name: String, chips: Option<i64> },
    Start,
    CreateAutoGame,
    StartAutoGame,
    StopAutoGame,
    /// Ask the server for a fresh snapshot.
    State,
    Reconnect,
    Close,
    Reset,
    Help,
    Quit,
}

/// Errors that can occur during command parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Invalid raise amount (not a positive whole number).
    InvalidRaiseAmount(String),
    /// Raise without an amount.
    RaiseMissingAmount,
    /// Join without a player name.
    JoinMissingName,
    /// Invalid starting chips for join.
    InvalidChips(String),
    /// Invalid auto game command format.
    InvalidAutoCommand,
    /// Unrecognized command.
    UnrecognizedCommand(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRaiseAmount(value) => write!(
                f,
                "Invalid raise amount '{value}'. Must be a positive number (e.g., 'raise 100')"
            ),
            Self::RaiseMissingAmount => write!(f, "Raise requires an amount (e.g., 'raise 100')"),
            Self::JoinMissingName => write!(f, "Join requires a name (e.g., 'join alice 1000')"),
            Self::InvalidChips(value) => {
                write!(f, "Invalid chips '{value}'. Must be a positive number")
            }
            Self::InvalidAutoCommand => {
                write!(f, "Invalid auto command. Use 'auto create', 'auto start' or 'auto stop'")
            }
            Self::UnrecognizedCommand(cmd) => write!(
                f,
                "Unrecognized command '{cmd}'. Type 'help' to see available commands"
            ),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse a command string into a [`Command`].
///
/// # Examples
///
/// ```
/// use holdem_sync::ActionKind;
/// use hs_client::commands::{Command, parse_command};
///
/// assert_eq!(
///     parse_command("fold"),
///     Ok(Command::Action { kind: ActionKind::Fold, amount: 0 })
/// );
/// assert_eq!(
///     parse_command("raise 100"),
///     Ok(Command::Action { kind: ActionKind::Raise, amount: 100 })
/// );
/// ```
pub fn parse_command(input: &str) -> Result<Command, ParseError> {
    let trimmed = input.trim();

    // Try single-word commands first
    let action = |kind| Ok(Command::Action { kind, amount: 0 });
    match trimmed {
        "allin" | "all-in" => return action(ActionKind::AllIn),
        "call" => return action(ActionKind::Call),
        "check" => return action(ActionKind::Check),
        "fold" => return action(ActionKind::Fold),
        "start" => return Ok(Command::Start),
        "state" | "refresh" => return Ok(Command::State),
        "reconnect" | "connect" => return Ok(Command::Reconnect),
        "close" | "disconnect" => return Ok(Command::Close),
        "reset" => return Ok(Command::Reset),
        "help" | "?" => return Ok(Command::Help),
        "quit" | "exit" => return Ok(Command::Quit),
        _ => {}
    }

    // Parse multi-word commands
    let parts: Vec<&str> = trimmed.split_ascii_whitespace().collect();
    match parts.first() {
        Some(&"raise") => parse_raise_command(&parts),
        Some(&"join") => parse_join_command(&parts),
        Some(&"auto") => parse_auto_command(&parts),
        _ => Err(ParseError::UnrecognizedCommand(trimmed.to_string())),
    }
}

/// Parse a raise command: "raise AMOUNT"
fn parse_raise_command(parts: &[&str]) -> Result<Command, ParseError> {
    let value = parts.get(1).ok_or(ParseError::RaiseMissingAmount)?;
    let amount =
        parse_amount(value).map_err(|_| ParseError::InvalidRaiseAmount(value.to_string()))?;
    Ok(Command::Action {
        kind: ActionKind::Raise,
        amount,
    })
}

/// Parse a join command: "join NAME [CHIPS]"
fn parse_join_command(parts: &[&str]) -> Result<Command, ParseError> {
    let name = parts.get(1).ok_or(ParseError::JoinMissingName)?;
    let chips = match parts.get(2) {
        Some(value) => Some(
            value
                .parse::<i64>()
                .ok()
                .filter(|chips| *chips > 0)
                .ok_or_else(|| ParseError::InvalidChips(value.to_string()))?,
        ),
        None => None,
    };
    Ok(Command::Join {
        name: name.to_string(),
        chips,
    })
}

/// Parse an auto game command: "auto create|start|stop"
fn parse_auto_command(parts: &[&str]) -> Result<Command, ParseError> {
    match parts.get(1) {
        Some(&"create") => Ok(Command::CreateAutoGame),
        Some(&"start") => Ok(Command::StartAutoGame),
        Some(&"stop") => Ok(Command::StopAutoGame),
        _ => Err(ParseError::InvalidAutoCommand),
    }
}
