//! Boundary for transient user-facing alerts.
//!
//! The session decides *when* the user should be told something; how the
//! notice is shown (toast, status line, sound) belongs to whoever implements
//! [`Notifier`].

use std::fmt;
use tokio::sync::mpsc;

/// How a notice or log entry should be presented.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    /// Matching level on the `log` facade.
    pub fn level(self) -> log::Level {
        match self {
            Self::Info | Self::Success => log::Level::Info,
            Self::Warning => log::Level::Warn,
            Self::Error => log::Level::Error,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Info => "INFO",
            Self::Success => "OK",
            Self::Warning => "WARN",
            Self::Error => "ERROR",
        };
        write!(f, "{repr}")
    }
}

/// A transient alert for the user.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

impl Notice {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)
    }
}

/// Receives notices from the session.
///
/// Implementations must not block; the session calls `notify` from its
/// event loop.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Writes notices to the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        log::log!(target: "holdem_sync::notice", notice.severity.level(), "{}", notice.message);
    }
}

/// Forwards notices over an unbounded channel.
///
/// Notices sent after the receiver is dropped are discarded.
#[derive(Clone, Debug)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<Notice>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notice: Notice) {
        let _ = self.sender.send(notice);
    }
}
