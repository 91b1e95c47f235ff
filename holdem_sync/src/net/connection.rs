//! Connection lifecycle and reconnect policy.
//!
//! [`ConnectionManager`] is the only owner of the live transport. The socket
//! itself runs in a separate task created by a [`Connector`]; that task
//! reports back through [`LinkEvent`]s tagged with the epoch of the transport
//! that produced them, so events from a transport that has since been
//! replaced are recognized and ignored.

use std::{fmt, sync::Arc};
use tokio::{sync::mpsc, time::Instant};

use super::messages::ClientMessage;
use crate::{
    config::ReconnectPolicy,
    errors::{PreconditionError, Result, SyncError},
    session::{
        log_buffer::LogBuffer,
        notifier::{Notice, Notifier, Severity},
    },
};

/// Lifecycle of the game channel.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        };
        write!(f, "{repr}")
    }
}

/// Something that happened on a transport.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TransportEvent {
    /// Handshake completed.
    Opened,
    /// One UTF-8 text frame.
    Frame(String),
    /// The transport failed. Always followed by [`TransportEvent::Closed`].
    Error(String),
    /// The transport is gone, whether it ever opened or not.
    Closed,
}

/// A transport event and the epoch of the transport that produced it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LinkEvent {
    pub epoch: u64,
    pub event: TransportEvent,
}

/// Sending half of a live transport.
///
/// Dropping the link tells the transport task to close the socket.
#[derive(Debug)]
pub struct Link {
    outbound: mpsc::UnboundedSender<String>,
}

impl Link {
    pub fn new(outbound: mpsc::UnboundedSender<String>) -> Self {
        Self { outbound }
    }

    pub(crate) fn send(&self, text: String) -> Result<()> {
        self.outbound
            .send(text)
            .map_err(|_| SyncError::Transport("transport task has stopped".to_string()))
    }
}

/// Opens transports.
///
/// Implementations must return immediately and report progress through
/// `events`, tagging every event with `epoch`.
pub trait Connector: Send + Sync {
    fn open(&self, url: &str, epoch: u64, events: mpsc::UnboundedSender<LinkEvent>) -> Link;
}

/// What the session should do after a transport event.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Inbound {
    /// A frame to dispatch.
    Frame(String),
    /// The channel came back after a loss; state must be fetched again.
    Resync,
}

/// The outbound path as seen by the action gate.
pub trait Outbound {
    fn state(&self) -> ConnectionState;

    fn send(&mut self, message: &ClientMessage) -> Result<()>;
}

/// Owns the transport, tracks its state and schedules reconnects.
pub struct ConnectionManager {
    url: String,
    policy: ReconnectPolicy,
    connector: Arc<dyn Connector>,
    notifier: Arc<dyn Notifier>,
    events: mpsc::UnboundedSender<LinkEvent>,
    state: ConnectionState,
    epoch: u64,
    link: Option<Link>,
    reconnect_at: Option<Instant>,
    failed_attempts: u32,
    has_connected: bool,
}

impl ConnectionManager {
    pub fn new(
        url: impl Into<String>,
        policy: ReconnectPolicy,
        connector: Arc<dyn Connector>,
        notifier: Arc<dyn Notifier>,
        events: mpsc::UnboundedSender<LinkEvent>,
    ) -> Self {
        Self {
            url: url.into(),
            policy,
            connector,
            notifier,
            events,
            state: ConnectionState::Disconnected,
            epoch: 0,
            link: None,
            reconnect_at: None,
            failed_attempts: 0,
            has_connected: false,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Epoch that current transport events must carry.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// When the pending reconnect fires, if one is armed.
    pub fn reconnect_deadline(&self) -> Option<Instant> {
        self.reconnect_at
    }

    /// Open a transport. Does nothing unless disconnected.
    pub fn connect(&mut self, log: &mut LogBuffer) {
        if self.state != ConnectionState::Disconnected {
            return;
        }
        self.reconnect_at = None;
        self.epoch += 1;
        log.push(Severity::Info, format!("Connecting to {}", self.url));
        self.link = Some(self.connector.open(&self.url, self.epoch, self.events.clone()));
        self.state = ConnectionState::Connecting;
    }

    /// Close on request. No reconnect follows.
    pub fn close(&mut self, log: &mut LogBuffer) {
        let was_idle = self.state == ConnectionState::Disconnected && self.reconnect_at.is_none();
        self.reconnect_at = None;
        self.failed_attempts = 0;
        self.link = None;
        self.epoch += 1;
        self.state = ConnectionState::Disconnected;
        if !was_idle {
            log.push(Severity::Info, "Connection closed");
        }
    }

    /// Fire the pending reconnect.
    pub fn on_reconnect_timer(&mut self, log: &mut LogBuffer) {
        if self.reconnect_at.take().is_none() {
            return;
        }
        log.push(Severity::Info, "Reconnecting...");
        self.connect(log);
    }

    /// Apply one event from a transport task.
    pub fn on_event(&mut self, event: LinkEvent, log: &mut LogBuffer) -> Option<Inbound> {
        if event.epoch != self.epoch {
            log::debug!(
                "Ignoring {:?} from stale transport {} (current {})",
                event.event,
                event.epoch,
                self.epoch
            );
            return None;
        }

        match event.event {
            TransportEvent::Opened => {
                if self.state != ConnectionState::Connecting {
                    return None;
                }
                self.state = ConnectionState::Connected;
                self.failed_attempts = 0;
                log.push(Severity::Success, "Connected to game server");
                self.notifier
                    .notify(Notice::new(Severity::Success, "Connected to game server"));
                let resync = self.has_connected;
                self.has_connected = true;
                resync.then_some(Inbound::Resync)
            }
            TransportEvent::Frame(text) => {
                (self.state == ConnectionState::Connected).then_some(Inbound::Frame(text))
            }
            TransportEvent::Error(reason) => {
                self.link = None;
                log.push(Severity::Error, format!("Connection error: {reason}"));
                self.notifier
                    .notify(Notice::new(Severity::Error, "Connection error"));
                None
            }
            TransportEvent::Closed => {
                let previous = self.state;
                self.link = None;
                self.state = ConnectionState::Disconnected;
                match previous {
                    ConnectionState::Connected => {
                        log.push(Severity::Warning, "Disconnected from game server");
                        self.notifier.notify(Notice::new(
                            Severity::Warning,
                            "Disconnected from game server",
                        ));
                    }
                    ConnectionState::Connecting => {
                        self.failed_attempts += 1;
                        log.push(
                            Severity::Warning,
                            format!("Connection attempt {} failed", self.failed_attempts),
                        );
                    }
                    ConnectionState::Disconnected => {}
                }
                self.schedule_reconnect(log);
                None
            }
        }
    }

    fn schedule_reconnect(&mut self, log: &mut LogBuffer) {
        if self.reconnect_at.is_some() {
            return;
        }
        if let Some(max) = self.policy.max_attempts
            && self.failed_attempts >= max
        {
            log.push(
                Severity::Error,
                format!("Giving up after {max} failed connection attempts"),
            );
            self.notifier.notify(Notice::new(
                Severity::Error,
                "Unable to reach the game server",
            ));
            return;
        }
        self.reconnect_at = Some(Instant::now() + self.policy.delay);
        log.push(
            Severity::Info,
            format!("Reconnecting in {} ms", self.policy.delay.as_millis()),
        );
    }
}

impl Outbound for ConnectionManager {
    fn state(&self) -> ConnectionState {
        self.state
    }

    /// Transmit only while connected.
    fn send(&mut self, message: &ClientMessage) -> Result<()> {
        let link = match (&self.link, self.state) {
            (Some(link), ConnectionState::Connected) => link,
            _ => {
                let error = SyncError::from(PreconditionError::NotConnected);
                self.notifier
                    .notify(Notice::new(Severity::Error, error.client_message()));
                return Err(error);
            }
        };
        let text = message.encode()?;
        log::debug!("Sending {message}");
        link.send(text)
    }
}
