//! # Holdem Sync
//!
//! Client-side synchronization layer for a server-authoritative Texas Hold'em
//! table.
//!
//! The server owns the game. This crate keeps a local mirror of it: it holds
//! the game channel open (reconnecting after unexpected drops), applies the
//! full-state snapshots the server pushes, and answers questions such as
//! "is it my turn?" from the latest snapshot alone. Local intents are checked
//! against that mirror before they are sent, but the server always has the
//! final word.
//!
//! ## Architecture
//!
//! One tokio task owns all session state and reacts to four event sources:
//!
//! - **Commands** from any number of [`SessionHandle`] clones
//! - **Transport events** from the WebSocket task (open, frame, error, close)
//! - **The reconnect timer**, armed after a non-explicit disconnect
//! - **The status poll**, an HTTP reconciliation every few seconds
//!
//! After every event the session publishes a fresh [`SessionView`] through a
//! watch channel.
//!
//! ## Core Modules
//!
//! - [`net`]: connection lifecycle, wire messages, transport and status client
//! - [`session`]: dispatcher, projector, action gate, log buffer and runtime
//! - [`entities`]: cards, players and game snapshots
//!
//! ## Example
//!
//! ```no_run
//! use holdem_sync::{ActionKind, ClientConfig, LogNotifier, Session};
//! use std::sync::Arc;
//!
//! # async fn run() -> holdem_sync::errors::Result<()> {
//! let session = Session::spawn(ClientConfig::default(), Arc::new(LogNotifier))?;
//! session.join("alice", None).await?;
//! if session.view().is_my_turn {
//!     session.submit_action(ActionKind::Call, 0).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub use config::{ClientConfig, ConfigError, ReconnectPolicy};

/// Cards, players and game snapshots as the server describes them.
pub mod entities;
pub use entities::{ActionKind, Card, GameSnapshot, Phase, Player};

pub mod errors;
pub use errors::{PreconditionError, SyncError};

/// Networking components (connection, messages, transport, status).
pub mod net;
pub use net::connection::ConnectionState;

/// Session state and the event loop that owns it.
pub mod session;
pub use session::{
    Session, SessionHandle, SessionView,
    notifier::{ChannelNotifier, LogNotifier, Notice, Notifier, Severity},
};
