//! End-to-end tests for the session runtime.
//!
//! These tests run a real session against an in-process WebSocket server
//! (or a scripted connector) and observe it only through its handle.

use futures_util::{SinkExt, StreamExt};
use holdem_sync::{
    ActionKind, ChannelNotifier, ClientConfig, ConnectionState, Notice, PreconditionError,
    ReconnectPolicy, Session, SessionHandle, SessionView, Severity, SyncError,
    net::connection::{Connector, Link, LinkEvent, TransportEvent},
};
use serde_json::{Value, json};
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::{
    net::{TcpListener, TcpStream},
    sync::mpsc,
    time::timeout,
};
use tokio_tungstenite::{WebSocketStream, tungstenite::Message};

const WAIT: Duration = Duration::from_secs(5);

type ServerSocket = WebSocketStream<TcpStream>;

fn test_config(addr: &str, reconnect_delay: Duration) -> ClientConfig {
    ClientConfig {
        reconnect: ReconnectPolicy {
            delay: reconnect_delay,
            max_attempts: None,
        },
        // Keep the status poll from hitting the WebSocket listener.
        poll_interval: Duration::from_secs(3600),
        connect_timeout: Duration::from_secs(2),
        ..ClientConfig::new(format!("http://{addr}"))
    }
}

async fn wait_for(
    handle: &SessionHandle,
    predicate: impl Fn(&SessionView) -> bool,
) -> Arc<SessionView> {
    let mut rx = handle.subscribe();
    let view = timeout(WAIT, rx.wait_for(|view| predicate(view.as_ref())))
        .await
        .expect("timed out waiting for view")
        .expect("session stopped");
    Arc::clone(&*view)
}

async fn accept(listener: &TcpListener) -> ServerSocket {
    let (stream, _) = timeout(WAIT, listener.accept())
        .await
        .expect("client never connected")
        .unwrap();
    tokio_tungstenite::accept_async(stream).await.unwrap()
}

async fn push(ws: &mut ServerSocket, frame: Value) {
    ws.send(Message::Text(frame.to_string().into())).await.unwrap();
}

async fn next_request(ws: &mut ServerSocket) -> Value {
    loop {
        let message = timeout(WAIT, ws.next())
            .await
            .expect("no request from client")
            .expect("socket closed")
            .unwrap();
        if let Message::Text(text) = message {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

fn join_result(id: &str, name: &str) -> Value {
    json!({
        "type": "joinResult",
        "message": "joined",
        "timestamp": 1,
        "data": {"success": true, "player": {"id": id, "name": name, "chips": 1000}}
    })
}

fn game_state(timestamp: i64, acting: &str, me_folded: bool) -> Value {
    json!({
        "type": "gameState",
        "timestamp": timestamp,
        "data": {
            "pot": 30,
            "currentBetAmount": 20,
            "currentPhase": "PRE_FLOP",
            "communityCards": [],
            "players": [
                {"id": "p1", "name": "Alice", "chips": 990, "hasFolded": me_folded,
                 "holeCards": [
                    {"suit": 1, "rank": 14, "suitName": "红桃", "rankName": "A", "display": "A♥"},
                    {"suit": 0, "rank": 13, "suitName": "黑桃", "rankName": "K", "display": "K♠"}
                 ]},
                {"id": "p2", "name": "Bob", "chips": 980, "isAi": true}
            ],
            "currentPlayer": {"id": acting},
            "isAutoGameRunning": false
        }
    })
}

#[tokio::test]
async fn test_join_and_act_against_live_server() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let (notifier, _notices) = ChannelNotifier::new();
    let session = Session::spawn(test_config(&addr, Duration::from_secs(3)), Arc::new(notifier)).unwrap();

    let mut ws = accept(&listener).await;
    push(&mut ws, json!({"type": "connection", "message": "Welcome", "timestamp": 0})).await;
    wait_for(&session, |v| v.connection == ConnectionState::Connected).await;

    session.join("Alice", None).await.unwrap();
    let request = next_request(&mut ws).await;
    assert_eq!(
        request,
        json!({"action": "join", "playerName": "Alice", "chips": 1000, "isAi": false})
    );

    push(&mut ws, join_result("p1", "Alice")).await;
    push(&mut ws, game_state(2, "p1", false)).await;
    let view = wait_for(&session, |v| v.is_my_turn).await;
    assert_eq!(view.identity.as_deref(), Some("p1"));
    assert_eq!(view.my_hole_cards().len(), 2);
    assert!(view.my_hole_cards()[0].is_red());
    assert_eq!(view.player_count, 2);
    assert!(view.log.iter().any(|entry| entry.message == "Welcome"));

    session.submit_action(ActionKind::Raise, 200).await.unwrap();
    assert_eq!(
        next_request(&mut ws).await,
        json!({"action": "playerAction", "actionType": "raise", "amount": 200})
    );

    // The server reports our fold; acting again is rejected locally.
    push(&mut ws, game_state(3, "p1", true)).await;
    wait_for(&session, |v| !v.is_my_turn).await;
    let result = session.submit_action(ActionKind::Check, 0).await;
    assert!(matches!(
        result,
        Err(SyncError::Precondition(PreconditionError::NotYourTurn))
    ));

    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_server_drop_reconnects_and_resyncs() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let (notifier, _notices) = ChannelNotifier::new();
    let session = Session::spawn(
        test_config(&addr, Duration::from_millis(100)),
        Arc::new(notifier),
    )
    .unwrap();

    let mut ws = accept(&listener).await;
    wait_for(&session, |v| v.connection == ConnectionState::Connected).await;
    push(&mut ws, join_result("p1", "Alice")).await;
    wait_for(&session, |v| v.identity.is_some()).await;

    drop(ws);

    // The client comes back on its own and asks for a fresh snapshot.
    let mut ws = accept(&listener).await;
    assert_eq!(next_request(&mut ws).await, json!({"action": "getGameState"}));

    push(&mut ws, game_state(5, "p1", false)).await;
    let view = wait_for(&session, |v| v.is_my_turn).await;
    assert_eq!(view.connection, ConnectionState::Connected);
    assert_eq!(view.identity.as_deref(), Some("p1"));

    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_explicit_close_does_not_reconnect() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let (notifier, _notices) = ChannelNotifier::new();
    let session = Session::spawn(
        test_config(&addr, Duration::from_millis(50)),
        Arc::new(notifier),
    )
    .unwrap();

    let _ws = accept(&listener).await;
    wait_for(&session, |v| v.connection == ConnectionState::Connected).await;

    session.close().await.unwrap();
    wait_for(&session, |v| v.connection == ConnectionState::Disconnected).await;

    let reconnect = timeout(Duration::from_millis(500), listener.accept()).await;
    assert!(reconnect.is_err(), "explicit close must not reconnect");

    // An explicit connect brings it back.
    session.connect().await.unwrap();
    let _ws = accept(&listener).await;
    wait_for(&session, |v| v.connection == ConnectionState::Connected).await;

    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_actions_rejected_while_disconnected() {
    // Nothing listens here; the session stays offline.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);

    let (notifier, mut notices) = ChannelNotifier::new();
    let session = Session::spawn(
        test_config(&addr, Duration::from_secs(60)),
        Arc::new(notifier),
    )
    .unwrap();

    let result = session.submit_action(ActionKind::Fold, 0).await;
    assert!(matches!(
        result,
        Err(SyncError::Precondition(PreconditionError::NotConnected))
    ));

    let notice: Notice = timeout(WAIT, async {
        loop {
            let notice = notices.recv().await.unwrap();
            if notice.message == PreconditionError::NotConnected.to_string() {
                return notice;
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(notice.severity, Severity::Error);

    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_handle_fails_after_shutdown() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let (notifier, _notices) = ChannelNotifier::new();
    let session = Session::spawn(test_config(&addr, Duration::from_secs(3)), Arc::new(notifier)).unwrap();
    let other = session.clone();

    session.shutdown().await.unwrap();
    assert!(matches!(other.start_game().await, Err(SyncError::SessionClosed)));
    assert!(matches!(other.reset().await, Err(SyncError::SessionClosed)));
}

/// A connector whose transports are driven by the test.
#[derive(Default)]
struct ScriptedConnector {
    opened: Mutex<Vec<(u64, mpsc::UnboundedSender<LinkEvent>, mpsc::UnboundedReceiver<String>)>>,
}

impl ScriptedConnector {
    fn emit(&self, index: usize, event: TransportEvent) {
        let opened = self.opened.lock().unwrap();
        let (epoch, events, _) = &opened[index];
        events
            .send(LinkEvent {
                epoch: *epoch,
                event,
            })
            .unwrap();
    }

    fn opened(&self) -> usize {
        self.opened.lock().unwrap().len()
    }
}

impl Connector for ScriptedConnector {
    fn open(&self, _url: &str, epoch: u64, events: mpsc::UnboundedSender<LinkEvent>) -> Link {
        let (tx, rx) = mpsc::unbounded_channel();
        self.opened.lock().unwrap().push((epoch, events, rx));
        Link::new(tx)
    }
}

#[tokio::test]
async fn test_reconnect_state_sequence() {
    let connector = Arc::new(ScriptedConnector::default());
    let (notifier, _notices) = ChannelNotifier::new();
    let session = Session::with_connector(
        test_config("127.0.0.1:9", Duration::from_millis(300)),
        Arc::new(notifier),
        connector.clone(),
    )
    .unwrap();

    wait_for(&session, |v| v.connection == ConnectionState::Connecting).await;
    connector.emit(0, TransportEvent::Opened);
    wait_for(&session, |v| v.connection == ConnectionState::Connected).await;

    connector.emit(0, TransportEvent::Error("connection reset".to_string()));
    connector.emit(0, TransportEvent::Closed);
    wait_for(&session, |v| v.connection == ConnectionState::Disconnected).await;
    wait_for(&session, |v| v.connection == ConnectionState::Connecting).await;
    assert_eq!(connector.opened(), 2);

    // Late events from the first transport change nothing.
    connector.emit(0, TransportEvent::Opened);
    connector.emit(1, TransportEvent::Opened);
    let view = wait_for(&session, |v| v.connection == ConnectionState::Connected).await;
    assert!(view.log.iter().any(|e| e.message.contains("Reconnecting")));

    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_reset_clears_identity_and_log() {
    let connector = Arc::new(ScriptedConnector::default());
    let (notifier, _notices) = ChannelNotifier::new();
    let session = Session::with_connector(
        test_config("127.0.0.1:9", Duration::from_secs(3)),
        Arc::new(notifier),
        connector.clone(),
    )
    .unwrap();

    wait_for(&session, |v| v.connection == ConnectionState::Connecting).await;
    connector.emit(0, TransportEvent::Opened);
    connector.emit(0, TransportEvent::Frame(join_result("p1", "Alice").to_string()));
    wait_for(&session, |v| v.identity.is_some()).await;

    // A second join is refused once seated.
    let result = session.join("Alice", Some(500)).await;
    assert!(matches!(
        result,
        Err(SyncError::Precondition(PreconditionError::AlreadyJoined))
    ));

    session.reset().await.unwrap();
    let view = wait_for(&session, |v| v.identity.is_none()).await;
    assert!(view.log.is_empty());
    assert_eq!(view.connection, ConnectionState::Connected);

    session.join("Alice", Some(500)).await.unwrap();
    session.shutdown().await.unwrap();
}
