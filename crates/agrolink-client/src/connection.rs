//! Connection supervisor — owns the single logical connection.
//!
//! One spawned task owns the physical WebSocket stream, the retry timer,
//! and the heartbeat. Every socket, timer, and control event is serialized
//! through the supervisor's `select!` loops, so no two state transitions
//! can race and there is never a second socket or a second pending retry:
//! the loop tears the previous handle down before it opens the next one.

use std::sync::Arc;
use std::time::Duration;

use agrolink_core::{ClientError, ConnectionState, ConnectionStatus};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};

use crate::config::ClientConfig;
use crate::events::ClientEvent;
use crate::gateway::CommandGateway;
use crate::heartbeat::HeartbeatTicker;
use crate::router::route_frame;
use crate::shared::ClientShared;
use crate::store::AgentResultStore;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Requests from the owning session to the supervisor.
#[derive(Debug)]
enum Control {
    /// Manual reconnect from a terminal state.
    Reconnect,
}

/// Why a connected session ended.
#[derive(Debug)]
enum SessionEnd {
    /// The owner tore the client down.
    Shutdown,
    /// The peer closed deliberately (normal close code 1000).
    Deliberate(String),
    /// Anything else: transport error, write failure, abnormal close.
    Abnormal(String),
}

/// Outcome of waiting out a backoff delay.
#[derive(Debug)]
enum BackoffOutcome {
    Fired,
    ManualReset,
    Cancelled,
}

/// Outcome of waiting in a terminal state.
#[derive(Debug)]
enum TerminalWait {
    Reconnect,
    Cancelled,
}

/// Spawns and owns the connection supervisor task.
pub struct ConnectionManager;

impl ConnectionManager {
    /// Spawn the supervisor. It immediately starts its first open attempt.
    ///
    /// Returns the caller-facing handle and the event stream consumed by
    /// the front end's dispatch loop.
    pub fn spawn(
        config: ClientConfig,
        store: AgentResultStore,
    ) -> (ClientHandle, mpsc::UnboundedReceiver<ClientEvent>) {
        let shared = Arc::new(ClientShared::new());
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::channel(config.outbound_buffer.max(1));
        let (control_tx, control_rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();

        let gateway = CommandGateway::new(shared.clone(), store.clone(), outbound_tx);
        let supervisor = Supervisor {
            config,
            shared: shared.clone(),
            store,
            events: events_tx,
            outbound_rx,
            control_rx,
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(supervisor.run());

        let handle = ClientHandle {
            shared,
            gateway,
            control_tx,
            cancel,
            task,
        };
        (handle, events_rx)
    }
}

/// Caller-facing handle to the logical connection.
pub struct ClientHandle {
    shared: Arc<ClientShared>,
    gateway: CommandGateway,
    control_tx: mpsc::Sender<Control>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ClientHandle {
    /// Snapshot of the current connection state.
    pub fn state(&self) -> ConnectionState {
        self.shared.snapshot()
    }

    /// Current status.
    pub fn status(&self) -> ConnectionStatus {
        self.shared.status()
    }

    /// Whether an analysis request is currently in flight.
    pub fn is_analyzing(&self) -> bool {
        self.shared.is_analyzing()
    }

    /// The status-gated path for outbound commands.
    pub fn gateway(&self) -> &CommandGateway {
        &self.gateway
    }

    /// Request a manual reconnect.
    ///
    /// Only meaningful while status is `Failed` or `Disconnected`; the
    /// supervisor resets the attempt counter and reopens immediately.
    /// Returns `false` if the request could not be delivered.
    pub fn reconnect(&self) -> bool {
        self.control_tx.try_send(Control::Reconnect).is_ok()
    }

    /// Tear the connection down.
    ///
    /// Cancels any pending retry timer, stops the heartbeat, closes the
    /// transport with the deliberate close code, and waits for the
    /// supervisor task to finish. No reconnect fires after this returns.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }
}

/// The supervisor task state.
struct Supervisor {
    config: ClientConfig,
    shared: Arc<ClientShared>,
    store: AgentResultStore,
    events: mpsc::UnboundedSender<ClientEvent>,
    outbound_rx: mpsc::Receiver<String>,
    control_rx: mpsc::Receiver<Control>,
    cancel: CancellationToken,
}

impl Supervisor {
    #[instrument(skip_all, fields(url = %self.config.ws_url))]
    async fn run(mut self) {
        self.publish_state();

        loop {
            // Status here is Connecting or Reconnecting; either way the
            // attempt fires now.
            let failure = match self.open().await {
                Ok(stream) => {
                    self.shared.opened();
                    self.publish_state();
                    info!("connected");

                    let end = self.run_session(stream).await;
                    self.drain_outbound();

                    match end {
                        SessionEnd::Shutdown => {
                            self.finish();
                            return;
                        }
                        SessionEnd::Deliberate(reason) => {
                            info!(reason, "deliberate close, reconnect suppressed");
                            self.shared.set_status(ConnectionStatus::Disconnected);
                            self.publish_state();
                            match self.wait_terminal().await {
                                TerminalWait::Reconnect => {
                                    self.shared.manual_reset();
                                    self.publish_state();
                                    continue;
                                }
                                TerminalWait::Cancelled => return,
                            }
                        }
                        SessionEnd::Abnormal(reason) => reason,
                    }
                }
                Err(e) => e.to_string(),
            };

            // Retry branch: transient connectivity failure.
            let attempts = self.shared.attempts();
            if self.config.backoff.is_exhausted(attempts) {
                let err = ClientError::RetriesExhausted {
                    attempts,
                    last_error: failure,
                };
                warn!(attempts, "retry ceiling reached, giving up");
                self.shared
                    .set_status_with_error(ConnectionStatus::Failed, err.to_string());
                self.publish_state();
                match self.wait_terminal().await {
                    TerminalWait::Reconnect => {
                        self.shared.manual_reset();
                        self.publish_state();
                    }
                    TerminalWait::Cancelled => return,
                }
            } else {
                let delay = self.config.backoff.delay(attempts);
                debug!(attempts, ?delay, failure, "scheduling reconnect");
                self.shared
                    .set_status_with_error(ConnectionStatus::Reconnecting, failure);
                self.publish_state();
                match self.backoff_wait(delay).await {
                    BackoffOutcome::Fired => {
                        // Count exactly here, never at schedule time.
                        self.shared.count_retry();
                        self.publish_state();
                    }
                    BackoffOutcome::ManualReset => {
                        self.shared.manual_reset();
                        self.publish_state();
                    }
                    BackoffOutcome::Cancelled => {
                        self.finish();
                        return;
                    }
                }
            }
        }
    }

    /// One physical open attempt, bounded by the connect timeout.
    async fn open(&self) -> Result<WsStream, ClientError> {
        let timeout = Duration::from_millis(self.config.connect_timeout_ms);
        match time::timeout(timeout, connect_async(self.config.ws_url.as_str())).await {
            Ok(Ok((stream, _response))) => Ok(stream),
            Ok(Err(e)) => Err(ClientError::Connect(e.to_string())),
            Err(_) => Err(ClientError::ConnectTimeout(self.config.connect_timeout_ms)),
        }
    }

    /// Drive one open connection until it ends.
    async fn run_session(&mut self, stream: WsStream) -> SessionEnd {
        let (mut ws_tx, mut ws_rx) = stream.split();
        let mut heartbeat =
            HeartbeatTicker::new(Duration::from_secs(self.config.heartbeat_interval_secs));

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    let close = Message::Close(Some(CloseFrame {
                        code: CloseCode::Normal,
                        reason: "client shutdown".into(),
                    }));
                    let _ = ws_tx.send(close).await;
                    return SessionEnd::Shutdown;
                }

                control = self.control_rx.recv() => match control {
                    Some(Control::Reconnect) => {
                        debug!("ignoring reconnect request while connected");
                    }
                    None => return SessionEnd::Shutdown,
                },

                frame = ws_rx.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        route_frame(
                            text.as_str(),
                            &self.shared,
                            &self.store,
                            &self.events,
                            &self.config.completion_marker,
                        );
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        let _ = ws_tx.send(Message::Pong(payload)).await;
                    }
                    Some(Ok(Message::Pong(_))) => {
                        trace!("transport-level pong");
                    }
                    Some(Ok(Message::Close(close))) => {
                        let deliberate =
                            close.as_ref().is_some_and(|f| f.code == CloseCode::Normal);
                        let reason = close.map_or_else(
                            || "close without frame".to_owned(),
                            |f| format!("close code {}", u16::from(f.code)),
                        );
                        return if deliberate {
                            SessionEnd::Deliberate(reason)
                        } else {
                            SessionEnd::Abnormal(reason)
                        };
                    }
                    Some(Ok(_)) => {
                        // Binary and raw frames are not part of the protocol.
                    }
                    Some(Err(e)) => {
                        return SessionEnd::Abnormal(format!("transport error: {e}"));
                    }
                    None => {
                        return SessionEnd::Abnormal(
                            "transport closed without close frame".to_owned(),
                        );
                    }
                },

                command = self.outbound_rx.recv() => match command {
                    Some(frame) => {
                        if let Err(e) = ws_tx.send(Message::Text(frame.into())).await {
                            return SessionEnd::Abnormal(format!("write failed: {e}"));
                        }
                    }
                    None => return SessionEnd::Shutdown,
                },

                () = heartbeat.tick() => {
                    let probe = HeartbeatTicker::probe_frame();
                    if let Err(e) = ws_tx.send(Message::Text(probe.into())).await {
                        return SessionEnd::Abnormal(format!("heartbeat write failed: {e}"));
                    }
                    trace!("heartbeat probe sent");
                }
            }
        }
    }

    /// Wait out a scheduled retry delay.
    async fn backoff_wait(&mut self, delay: Duration) -> BackoffOutcome {
        tokio::select! {
            () = time::sleep(delay) => BackoffOutcome::Fired,
            () = self.cancel.cancelled() => BackoffOutcome::Cancelled,
            control = self.control_rx.recv() => match control {
                Some(Control::Reconnect) => BackoffOutcome::ManualReset,
                None => BackoffOutcome::Cancelled,
            },
        }
    }

    /// Park in a terminal state (`Failed` or `Disconnected`) until the
    /// caller asks for a manual reconnect or tears the client down. No
    /// timer is armed here: terminal means no automatic retry.
    async fn wait_terminal(&mut self) -> TerminalWait {
        tokio::select! {
            () = self.cancel.cancelled() => TerminalWait::Cancelled,
            control = self.control_rx.recv() => match control {
                Some(Control::Reconnect) => TerminalWait::Reconnect,
                None => TerminalWait::Cancelled,
            },
        }
    }

    /// Drop frames the gateway accepted before the session ended; they
    /// must not leak into the next connection.
    fn drain_outbound(&mut self) {
        let mut dropped = 0u32;
        while self.outbound_rx.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            debug!(dropped, "discarded outbound frames from closed session");
        }
    }

    /// Terminal teardown: the session owner is gone.
    fn finish(&self) {
        self.shared.set_status(ConnectionStatus::Disconnected);
        self.publish_state();
        info!("connection torn down");
    }

    fn publish_state(&self) {
        let _ = self
            .events
            .send(ClientEvent::StatusChanged(self.shared.snapshot()));
    }
}
