//! Networking layer for the game channel and the status endpoint.
//!
//! The game channel is a WebSocket carrying JSON text frames. Inbound frames
//! share an envelope discriminated by `type`; outbound requests are
//! discriminated by `action`.

/// Connection lifecycle, reconnect policy and the transport seam.
pub mod connection;

/// Message types for the game channel protocol.
pub mod messages;

/// HTTP status client and poll reconciliation.
pub mod status;

/// WebSocket transport task built on tokio-tungstenite.
pub mod transport;
