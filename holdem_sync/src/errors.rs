//! Error types for the synchronization layer.
//!
//! None of these ever terminate a session. Transport errors are recovered by
//! reconnecting; everything else is downgraded to a notice or a log line.

use thiserror::Error;

/// A local precondition that rejected an outbound request before anything
/// was transmitted.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum PreconditionError {
    #[error("not connected to the game server")]
    NotConnected,

    #[error("join the game first")]
    NotJoined,

    #[error("already joined the game")]
    AlreadyJoined,

    #[error("it is not your turn")]
    NotYourTurn,

    #[error("invalid raise amount '{0}': must be a positive whole number")]
    InvalidAmount(String),

    #[error("enter a player name")]
    MissingPlayerName,
}

/// Errors surfaced by the synchronization layer.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The connection dropped or could not be established
    #[error("transport error: {0}")]
    Transport(String),

    /// An inbound frame could not be decoded
    #[error("malformed server message: {0}")]
    Decode(String),

    /// The server reported an error
    #[error("server error: {0}")]
    Protocol(String),

    /// An outbound request was rejected locally
    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    /// A status reconciliation request failed
    #[error("status poll failed: {0}")]
    Poll(String),

    /// An outbound message could not be encoded
    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),

    /// The session task is no longer running
    #[error("session is closed")]
    SessionClosed,
}

impl SyncError {
    /// Text suitable for a user-facing notice.
    ///
    /// Local rejections already read as instructions; transport and decode
    /// details are kept out of the notice and go to the log instead.
    pub fn client_message(&self) -> String {
        match self {
            SyncError::Precondition(error) => error.to_string(),
            SyncError::Protocol(message) => message.clone(),
            SyncError::Transport(_) => "Connection error".to_string(),
            SyncError::Decode(_) => "Received an unreadable message".to_string(),
            SyncError::Poll(_) => "Status check failed".to_string(),
            SyncError::Encode(_) => "Failed to send message".to_string(),
            SyncError::SessionClosed => "Session is closed".to_string(),
        }
    }

    /// Whether this error came from a local precondition check.
    pub fn is_precondition(&self) -> bool {
        matches!(self, SyncError::Precondition(_))
    }
}

/// Result type for synchronization operations
pub type Result<T> = std::result::Result<T, SyncError>;
