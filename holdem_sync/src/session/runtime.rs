use std::{sync::Arc, time::Duration};
use tokio::{
    sync::{mpsc, oneshot, watch},
    time::{Instant, MissedTickBehavior, interval, sleep_until},
};

use super::{
    SessionContext, dispatcher,
    gate::ActionGate,
    notifier::Notifier,
    view::SessionView,
};
use crate::{
    config::ClientConfig,
    entities::ActionKind,
    errors::{Result, SyncError},
    net::{
        connection::{ConnectionManager, ConnectionState, Connector, Inbound, LinkEvent, Outbound},
        messages::ClientMessage,
        status::{StatusClient, StatusPoller, StatusReport},
        transport::WsConnector,
    },
};

const COMMAND_BUFFER: usize = 64;

/// A finished status request and the poll generation it belongs to.
type PollResult = (u64, Result<StatusReport>);

/// Requests a [`SessionHandle`] can make of the running session.
#[derive(Debug)]
enum Request {
    Join {
        player_name: String,
        chips: Option<i64>,
    },
    StartGame,
    SubmitAction {
        kind: ActionKind,
        amount: i64,
    },
    CreateAutoGame,
    StartAutoGame,
    StopAutoGame,
    RequestState,
    Connect,
    Close,
    Reset,
    Shutdown,
}

#[derive(Debug)]
struct SessionCommand {
    request: Request,
    response: oneshot::Sender<Result<()>>,
}

/// Entry point for starting a session.
pub struct Session;

impl Session {
    /// Start a session against the configured server and begin connecting.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(config: ClientConfig, notifier: Arc<dyn Notifier>) -> Result<SessionHandle> {
        let connector = Arc::new(WsConnector::new(config.connect_timeout));
        Self::with_connector(config, notifier, connector)
    }

    /// Start a session that opens transports through `connector`.
    pub fn with_connector(
        config: ClientConfig,
        notifier: Arc<dyn Notifier>,
        connector: Arc<dyn Connector>,
    ) -> Result<SessionHandle> {
        let status = StatusClient::new(config.status_url(), config.connect_timeout)
            .map_err(|e| SyncError::Transport(format!("{e:#}")))?;

        let (sender, inbox) = mpsc::channel(COMMAND_BUFFER);
        let (events_tx, events) = mpsc::unbounded_channel();
        let (poll_tx, poll_results) = mpsc::unbounded_channel();
        let (view_tx, view) = watch::channel(Arc::new(SessionView::default()));

        let connection = ConnectionManager::new(
            config.game_channel_url(),
            config.reconnect,
            connector,
            notifier.clone(),
            events_tx,
        );

        let actor = SessionActor {
            ctx: SessionContext::new(notifier, config.log_capacity),
            connection,
            gate: ActionGate::new(config.local_turn_gating),
            poller: StatusPoller::new(),
            status,
            poll_interval: config.poll_interval,
            inbox,
            events,
            poll_tx,
            poll_results,
            view_tx,
        };
        tokio::spawn(actor.run());

        Ok(SessionHandle { sender, view })
    }
}

/// Cloneable handle to a running session.
///
/// Every method fails with [`SyncError::SessionClosed`] once the session has
/// shut down.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    sender: mpsc::Sender<SessionCommand>,
    view: watch::Receiver<Arc<SessionView>>,
}

impl SessionHandle {
    async fn request(&self, request: Request) -> Result<()> {
        let (response, rx) = oneshot::channel();
        self.sender
            .send(SessionCommand { request, response })
            .await
            .map_err(|_| SyncError::SessionClosed)?;
        rx.await.map_err(|_| SyncError::SessionClosed)?
    }

    /// Ask for a seat. `chips` defaults to 1000.
    pub async fn join(&self, player_name: impl Into<String>, chips: Option<i64>) -> Result<()> {
        self.request(Request::Join {
            player_name: player_name.into(),
            chips,
        })
        .await
    }

    pub async fn start_game(&self) -> Result<()> {
        self.request(Request::StartGame).await
    }

    /// Send a betting action. `amount` only matters for raises.
    pub async fn submit_action(&self, kind: ActionKind, amount: i64) -> Result<()> {
        self.request(Request::SubmitAction { kind, amount }).await
    }

    pub async fn create_auto_game(&self) -> Result<()> {
        self.request(Request::CreateAutoGame).await
    }

    pub async fn start_auto_game(&self) -> Result<()> {
        self.request(Request::StartAutoGame).await
    }

    pub async fn stop_auto_game(&self) -> Result<()> {
        self.request(Request::StopAutoGame).await
    }

    /// Ask the server to push a fresh snapshot.
    pub async fn request_state(&self) -> Result<()> {
        self.request(Request::RequestState).await
    }

    /// Open the game channel if it is not open or opening.
    pub async fn connect(&self) -> Result<()> {
        self.request(Request::Connect).await
    }

    /// Close the game channel without reconnecting.
    pub async fn close(&self) -> Result<()> {
        self.request(Request::Close).await
    }

    /// Forget identity, snapshot and log.
    pub async fn reset(&self) -> Result<()> {
        self.request(Request::Reset).await
    }

    /// Stop the session. The channel is closed and every handle becomes
    /// unusable.
    pub async fn shutdown(&self) -> Result<()> {
        self.request(Request::Shutdown).await
    }

    /// The most recently published view.
    pub fn view(&self) -> Arc<SessionView> {
        self.view.borrow().clone()
    }

    /// A receiver notified whenever the published view changes.
    pub fn subscribe(&self) -> watch::Receiver<Arc<SessionView>> {
        self.view.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Owns every piece of session state. Runs as a single task.
struct SessionActor {
    ctx: SessionContext,
    connection: ConnectionManager,
    gate: ActionGate,
    poller: StatusPoller,
    status: StatusClient,
    poll_interval: Duration,
    inbox: mpsc::Receiver<SessionCommand>,
    events: mpsc::UnboundedReceiver<LinkEvent>,
    poll_tx: mpsc::UnboundedSender<PollResult>,
    poll_results: mpsc::UnboundedReceiver<PollResult>,
    view_tx: watch::Sender<Arc<SessionView>>,
}

impl SessionActor {
    async fn run(mut self) {
        log::info!("Session starting for {}", self.connection.url());
        self.connection.connect(&mut self.ctx.log);
        self.publish();

        let mut poll_interval = interval(self.poll_interval);
        poll_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let reconnect_at = self.connection.reconnect_deadline();

            tokio::select! {
                command = self.inbox.recv() => match command {
                    Some(command) => {
                        if !self.handle_command(command) {
                            break;
                        }
                    }
                    None => break,
                },

                Some(event) = self.events.recv() => self.handle_event(event),

                _ = reconnect_timer(reconnect_at) => {
                    self.connection.on_reconnect_timer(&mut self.ctx.log);
                }

                _ = poll_interval.tick() => self.start_poll(),

                Some((generation, result)) = self.poll_results.recv() => match result {
                    Ok(report) => self.poller.reconcile(generation, report, &mut self.ctx),
                    Err(e) => self.poller.poll_failed(generation, &e),
                },
            }

            self.publish();
        }

        self.connection.close(&mut self.ctx.log);
        self.publish();
        log::info!("Session stopped");
    }

    /// Returns `false` when the session should stop.
    fn handle_command(&mut self, command: SessionCommand) -> bool {
        let SessionCommand { request, response } = command;
        let ctx = &mut self.ctx;
        let out = &mut self.connection;

        let result = match request {
            Request::Join { player_name, chips } => self.gate.join(&player_name, chips, ctx, out),
            Request::StartGame => self.gate.start_game(ctx, out),
            Request::SubmitAction { kind, amount } => {
                self.gate.submit_action(kind, amount, ctx, out)
            }
            Request::CreateAutoGame => self.gate.create_auto_game(ctx, out),
            Request::StartAutoGame => self.gate.start_auto_game(ctx, out),
            Request::StopAutoGame => self.gate.stop_auto_game(ctx, out),
            Request::RequestState => out.send(&ClientMessage::GetGameState),
            Request::Connect => {
                out.connect(&mut ctx.log);
                Ok(())
            }
            Request::Close => {
                out.close(&mut ctx.log);
                self.poller.cancel();
                Ok(())
            }
            Request::Reset => {
                ctx.projector.reset();
                ctx.log.clear();
                self.poller.reset();
                Ok(())
            }
            Request::Shutdown => {
                let _ = response.send(Ok(()));
                return false;
            }
        };

        let _ = response.send(result);
        true
    }

    fn handle_event(&mut self, event: LinkEvent) {
        match self.connection.on_event(event, &mut self.ctx.log) {
            Some(Inbound::Frame(text)) => dispatcher::dispatch(&text, &mut self.ctx),
            Some(Inbound::Resync) => {
                if let Err(e) = self.connection.send(&ClientMessage::GetGameState) {
                    log::warn!("Failed to request game state after reconnect: {e}");
                }
            }
            None => {}
        }
    }

    /// Fire a status request unless one is outstanding or we are offline.
    fn start_poll(&mut self) {
        if self.connection.state() != ConnectionState::Connected {
            return;
        }
        let Some(generation) = self.poller.begin() else {
            return;
        };
        let status = self.status.clone();
        let results = self.poll_tx.clone();
        tokio::spawn(async move {
            let result = status
                .fetch()
                .await
                .map_err(|e| SyncError::Poll(format!("{e:#}")));
            let _ = results.send((generation, result));
        });
    }

    fn publish(&self) {
        let projector = &self.ctx.projector;
        let view = SessionView {
            connection: self.connection.state(),
            identity: projector.identity().map(str::to_string),
            snapshot: Arc::clone(projector.snapshot()),
            auto_game_running: projector.auto_game_running(),
            player_count: projector.player_count(),
            is_my_turn: projector.is_my_turn(),
            log: self.ctx.log.to_vec(),
        };
        self.view_tx.send_if_modified(|current| {
            if **current == view {
                return false;
            }
            *current = Arc::new(view);
            true
        });
    }
}

async fn reconnect_timer(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
