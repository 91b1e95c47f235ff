use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::fmt;

use crate::{
    entities::{ActionKind, GameSnapshot, Player},
    errors::SyncError,
};

/// Payload of a `joinResult` message.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct JoinResult {
    pub success: bool,
    pub player: Option<Player>,
}

/// Payload of a `playerJoined` message.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerJoined {
    pub player: Option<Player>,
}

/// Payload of a `playerDisconnected` message.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerDisconnected {
    pub player_id: String,
}

/// Payload of an `autoGameCreated` message.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AutoGameCreated {
    pub success: bool,
    pub players_count: Option<u32>,
}

/// A message pushed by the game server.
///
/// The set of kinds is closed; anything the client does not know about
/// decodes to [`ServerMessage::Unknown`] so newer servers never break older
/// clients.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ServerMessage {
    /// Greeting sent right after the socket opens.
    Connection { message: String },
    /// Answer to a `join` request.
    JoinResult(JoinResult),
    /// A full replacement of the game state.
    GameState(GameSnapshot),
    GameStarted,
    PlayerJoined(PlayerJoined),
    PlayerDisconnected(PlayerDisconnected),
    AutoGameCreated(AutoGameCreated),
    AutoGameStarted,
    AutoGameStopped,
    /// The server rejected something we sent.
    Error { message: String },
    /// A kind this client does not understand, carrying its name.
    Unknown(String),
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match &self {
            Self::Connection { message } => format!("connection: {message}"),
            Self::JoinResult(result) => format!("join result (success: {})", result.success),
            Self::GameState(_) => "game state".to_string(),
            Self::GameStarted => "game started".to_string(),
            Self::PlayerJoined(_) => "player joined".to_string(),
            Self::PlayerDisconnected(data) => format!("player {} disconnected", data.player_id),
            Self::AutoGameCreated(_) => "auto game created".to_string(),
            Self::AutoGameStarted => "auto game started".to_string(),
            Self::AutoGameStopped => "auto game stopped".to_string(),
            Self::Error { message } => format!("error: {message}"),
            Self::Unknown(kind) => format!("unknown message kind '{kind}'"),
        };
        write!(f, "{repr}")
    }
}

/// A decoded inbound frame together with its envelope metadata.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InboundFrame {
    /// The raw `type` discriminator.
    pub kind: String,
    /// Server clock in milliseconds when the frame was built, if sent.
    pub timestamp: Option<i64>,
    pub message: ServerMessage,
}

/// Every server frame shares this envelope; `data` depends on `type`.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    timestamp: Option<i64>,
    #[serde(default)]
    data: Option<Value>,
}

/// Decode one UTF-8 text frame.
///
/// # Errors
///
/// Returns [`SyncError::Decode`] if the frame is not a JSON object, lacks the
/// `type` discriminator, or carries a payload that does not match its kind.
/// Unknown kinds are not an error.
pub fn decode(text: &str) -> Result<InboundFrame, SyncError> {
    let envelope: Envelope =
        serde_json::from_str(text).map_err(|e| SyncError::Decode(e.to_string()))?;
    let kind = envelope
        .kind
        .ok_or_else(|| SyncError::Decode("missing 'type' field".to_string()))?;

    let message = match kind.as_str() {
        "connection" => ServerMessage::Connection {
            message: envelope.message.unwrap_or_default(),
        },
        "joinResult" => ServerMessage::JoinResult(optional_data(envelope.data)?),
        "gameState" => ServerMessage::GameState(required_data(&kind, envelope.data)?),
        "gameStarted" => ServerMessage::GameStarted,
        "playerJoined" => ServerMessage::PlayerJoined(optional_data(envelope.data)?),
        "playerDisconnected" => ServerMessage::PlayerDisconnected(optional_data(envelope.data)?),
        "autoGameCreated" => ServerMessage::AutoGameCreated(optional_data(envelope.data)?),
        "autoGameStarted" => ServerMessage::AutoGameStarted,
        "autoGameStopped" => ServerMessage::AutoGameStopped,
        "error" => ServerMessage::Error {
            message: envelope
                .message
                .unwrap_or_else(|| "unknown server error".to_string()),
        },
        other => ServerMessage::Unknown(other.to_string()),
    };

    Ok(InboundFrame {
        kind,
        timestamp: envelope.timestamp,
        message,
    })
}

/// Missing or null payloads decode to the payload's default.
fn optional_data<T: DeserializeOwned + Default>(data: Option<Value>) -> Result<T, SyncError> {
    match data {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => serde_json::from_value(value).map_err(|e| SyncError::Decode(e.to_string())),
    }
}

fn required_data<T: DeserializeOwned>(kind: &str, data: Option<Value>) -> Result<T, SyncError> {
    match data {
        None | Some(Value::Null) => Err(SyncError::Decode(format!("'{kind}' without data"))),
        Some(value) => serde_json::from_value(value).map_err(|e| SyncError::Decode(e.to_string())),
    }
}

/// A request from this client to the game server.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Take a seat at the table.
    Join {
        player_name: String,
        chips: i64,
        is_ai: bool,
    },
    StartGame,
    /// A betting action. `amount` is only meaningful for raises and is zero
    /// otherwise.
    PlayerAction { action_type: ActionKind, amount: i64 },
    CreateAutoGame,
    StartAutoGame,
    StopAutoGame,
    /// Ask the server to push a fresh `gameState` to this connection.
    GetGameState,
}

impl ClientMessage {
    /// Serialize to the JSON text sent over the socket.
    pub fn encode(&self) -> Result<String, SyncError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl fmt::Display for ClientMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match &self {
            Self::Join {
                player_name, chips, ..
            } => format!("join as {player_name} with {chips} chips"),
            Self::StartGame => "start game".to_string(),
            Self::PlayerAction {
                action_type: ActionKind::Raise,
                amount,
            } => format!("raise {amount}"),
            Self::PlayerAction { action_type, .. } => action_type.to_string(),
            Self::CreateAutoGame => "create auto game".to_string(),
            Self::StartAutoGame => "start auto game".to_string(),
            Self::StopAutoGame => "stop auto game".to_string(),
            Self::GetGameState => "request game state".to_string(),
        };
        write!(f, "{repr}")
    }
}
