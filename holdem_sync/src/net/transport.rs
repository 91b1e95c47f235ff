//! WebSocket transport task.

use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::{sync::mpsc, time::timeout};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::connection::{Connector, Link, LinkEvent, TransportEvent};

/// Opens game channels over tokio-tungstenite.
///
/// Each call to [`Connector::open`] spawns one task that owns the socket
/// until it closes. Must be used from within a tokio runtime.
#[derive(Clone, Copy, Debug)]
pub struct WsConnector {
    connect_timeout: Duration,
}

impl WsConnector {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Connector for WsConnector {
    fn open(&self, url: &str, epoch: u64, events: mpsc::UnboundedSender<LinkEvent>) -> Link {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_socket(
            url.to_string(),
            self.connect_timeout,
            epoch,
            outbound_rx,
            events,
        ));
        Link::new(outbound_tx)
    }
}

/// Drive one socket from handshake to close.
///
/// Every exit path ends with exactly one `Closed` event. The socket is
/// closed when the outbound channel's sender is dropped.
async fn run_socket(
    url: String,
    connect_timeout: Duration,
    epoch: u64,
    mut outbound: mpsc::UnboundedReceiver<String>,
    events: mpsc::UnboundedSender<LinkEvent>,
) {
    let emit = |event: TransportEvent| {
        let _ = events.send(LinkEvent { epoch, event });
    };

    let stream = match timeout(connect_timeout, connect_async(url.as_str())).await {
        Ok(Ok((stream, _))) => stream,
        Ok(Err(e)) => {
            emit(TransportEvent::Error(e.to_string()));
            emit(TransportEvent::Closed);
            return;
        }
        Err(_) => {
            emit(TransportEvent::Error(format!(
                "handshake timed out after {} ms",
                connect_timeout.as_millis()
            )));
            emit(TransportEvent::Closed);
            return;
        }
    };

    log::debug!("Transport {epoch} open to {url}");
    emit(TransportEvent::Opened);
    let (mut write, mut read) = stream.split();

    loop {
        tokio::select! {
            outgoing = outbound.recv() => match outgoing {
                Some(text) => {
                    if let Err(e) = write.send(Message::Text(text.into())).await {
                        emit(TransportEvent::Error(e.to_string()));
                        break;
                    }
                }
                None => {
                    let _ = write.close().await;
                    break;
                }
            },

            incoming = read.next() => match incoming {
                Some(Ok(Message::Text(text))) => emit(TransportEvent::Frame(text.as_str().to_owned())),
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    emit(TransportEvent::Error(e.to_string()));
                    break;
                }
            },
        }
    }

    log::debug!("Transport {epoch} closed");
    emit(TransportEvent::Closed);
}
