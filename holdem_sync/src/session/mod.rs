//! Client-side session: the state owned by the event loop and the pieces
//! that read and change it.

use std::sync::Arc;

/// Decodes inbound frames and routes them by kind.
pub mod dispatcher;

/// Validates local intents before they reach the wire.
pub mod gate;

pub mod log_buffer;

pub mod notifier;

pub mod projector;

/// The event loop task and its handle.
pub mod runtime;

pub mod view;

use log_buffer::LogBuffer;
use notifier::Notifier;
use projector::StateProjector;

pub use runtime::{Session, SessionHandle};
pub use view::SessionView;

/// Mutable state shared by the dispatcher, the gate and the poller.
///
/// Owned by exactly one event loop; nothing here is synchronized.
pub struct SessionContext {
    pub projector: StateProjector,
    pub log: LogBuffer,
    pub notifier: Arc<dyn Notifier>,
}

impl SessionContext {
    pub fn new(notifier: Arc<dyn Notifier>, log_capacity: usize) -> Self {
        Self {
            projector: StateProjector::new(),
            log: LogBuffer::new(log_capacity),
            notifier,
        }
    }
}
