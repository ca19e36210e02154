use super::connection::ConnectionManager;
use super::machine::{ConnectionEvent, ConnectionMachine, ConnectionState, Effect};
use crate::endpoint::{Endpoint, EndpointConfig, LocationSource, resolve_candidates};
use crate::infrastructure::{HeartbeatManager, RetryTimer, TaskManager};
use crate::messaging::MessageDispatcher;
use crate::types::{AuthIdentity, OutboundMessage, Result};
use crate::websocket::{WebSocketFactory, WsStream};
use futures::StreamExt;
use futures::stream::SplitStream;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_tungstenite::tungstenite::Message;

/// Requests processed by the driver task.
pub(crate) enum Command {
    Transition {
        event: ConnectionEvent,
        ack: Option<oneshot::Sender<ConnectionState>>,
    },
    Shutdown {
        ack: Option<oneshot::Sender<ConnectionState>>,
    },
}

impl Command {
    pub(crate) fn event(event: ConnectionEvent) -> Self {
        Self::Transition { event, ack: None }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct TransportSettings {
    pub connect_timeout: Option<Duration>,
    pub heartbeat_interval: Option<Duration>,
}

/// Owns the state machine and performs its effects.
///
/// Runs as a single task; every transition is processed here in order,
/// so the machine never sees concurrent events.
pub(crate) struct ConnectionDriver {
    pub machine: ConnectionMachine,
    pub endpoints: EndpointConfig,
    pub location: Arc<dyn LocationSource>,
    pub identity: Option<AuthIdentity>,
    pub settings: TransportSettings,
    pub connection: Arc<ConnectionManager>,
    pub dispatcher: Arc<MessageDispatcher>,
    pub tasks: TaskManager,
    pub retry_timer: RetryTimer,
    /// Weak so the channel closes once every client handle is dropped
    pub commands: mpsc::WeakUnboundedSender<Command>,
    pub state_tx: watch::Sender<ConnectionState>,
}

impl ConnectionDriver {
    pub(crate) async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        tracing::debug!("Connection driver started");

        loop {
            match commands.recv().await {
                Some(Command::Transition { event, ack }) => {
                    self.apply(event).await;
                    acknowledge(ack, self.machine.state());
                }
                Some(Command::Shutdown { ack }) => {
                    self.apply(ConnectionEvent::DisconnectRequested).await;
                    acknowledge(ack, self.machine.state());
                    break;
                }
                None => {
                    tracing::info!("All client handles dropped, disconnecting");
                    self.apply(ConnectionEvent::DisconnectRequested).await;
                    break;
                }
            }
        }

        tracing::info!("Connection driver finished");
    }

    async fn apply(&mut self, event: ConnectionEvent) {
        let mut queue = VecDeque::from([event]);

        while let Some(event) = queue.pop_front() {
            let effects = self.machine.handle(event);
            self.publish_state();

            for effect in effects {
                if let Some(follow_up) = self.perform(effect).await {
                    queue.push_back(follow_up);
                }
            }
        }
    }

    async fn perform(&mut self, effect: Effect) -> Option<ConnectionEvent> {
        match effect {
            Effect::ResolveEndpoints => {
                let location = self.location.location();
                let candidates = resolve_candidates(&self.endpoints, &location);
                return Some(ConnectionEvent::Resolved(candidates));
            }
            Effect::OpenTransport {
                endpoint,
                generation,
            } => {
                // The previous transport must be gone before the next one starts
                self.close_transport().await;
                self.spawn_transport(endpoint, generation);
            }
            Effect::SendAuth => self.send_auth().await,
            Effect::ScheduleRetry { delay, generation } => {
                let commands = self.commands.clone();
                self.retry_timer.schedule(delay, move || {
                    if !post(&commands, ConnectionEvent::RetryTimerFired { generation }) {
                        tracing::debug!("Driver gone, dropping retry timer");
                    }
                });
            }
            Effect::CancelRetry => {
                self.retry_timer.cancel();
            }
            Effect::CloseTransport => self.close_transport().await,
            Effect::NotifyFailure => {
                self.dispatcher.notifier().notify_failure();
            }
        }
        None
    }

    fn spawn_transport(&mut self, endpoint: Endpoint, generation: u64) {
        let commands = self.commands.clone();
        let connection = Arc::clone(&self.connection);
        let dispatcher = Arc::clone(&self.dispatcher);
        let settings = self.settings;

        tracing::info!(
            "Connecting to {} ({})",
            endpoint,
            if endpoint.is_secure() { "tls" } else { "plain" }
        );
        self.tasks.spawn("transport", async move {
            let event = run_transport(
                &endpoint,
                generation,
                settings,
                &connection,
                &dispatcher,
                &commands,
            )
            .await;
            if !post(&commands, event) {
                tracing::debug!("Driver gone, dropping transport event");
            }
        });
    }

    async fn close_transport(&mut self) {
        self.tasks.abort_all().await;
        if let Err(e) = self.connection.close().await {
            tracing::debug!("Error while closing transport: {}", e);
        }
    }

    async fn send_auth(&self) {
        let Some(identity) = &self.identity else {
            tracing::debug!("No identity configured, skipping auth frame");
            return;
        };

        match self
            .connection
            .send_json(&OutboundMessage::from(identity))
            .await
        {
            Ok(()) => tracing::debug!("Sent auth frame for tenant {}", identity.tenant_id),
            Err(e) => tracing::warn!("Failed to send auth frame: {}", e),
        }
    }

    fn publish_state(&self) {
        let state = self.machine.state();
        self.state_tx.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            *current = state;
            true
        });
    }
}

/// Sends `event` to the driver if it is still running
fn post(commands: &mpsc::WeakUnboundedSender<Command>, event: ConnectionEvent) -> bool {
    commands
        .upgrade()
        .is_some_and(|tx| tx.send(Command::event(event)).is_ok())
}

fn acknowledge(ack: Option<oneshot::Sender<ConnectionState>>, state: ConnectionState) {
    if let Some(ack) = ack
        && ack.send(state).is_err()
    {
        tracing::trace!("Caller stopped waiting for acknowledgement");
    }
}

/// Connects, reads until the transport ends, and reports how it ended.
async fn run_transport(
    endpoint: &Endpoint,
    generation: u64,
    settings: TransportSettings,
    connection: &Arc<ConnectionManager>,
    dispatcher: &MessageDispatcher,
    commands: &mpsc::WeakUnboundedSender<Command>,
) -> ConnectionEvent {
    let stream = match WebSocketFactory::create(endpoint.as_str(), settings.connect_timeout).await {
        Ok(stream) => stream,
        Err(e) => {
            return ConnectionEvent::Errored {
                generation,
                reason: e.to_string(),
            };
        }
    };

    let (write_half, read_half) = stream.split();
    connection.set_writer(write_half).await;
    if !post(commands, ConnectionEvent::Opened { generation }) {
        tracing::debug!("Driver gone before transport opened");
    }

    let heartbeat = HeartbeatManager::new(Arc::downgrade(connection))
        .with_interval(settings.heartbeat_interval);

    let result = tokio::select! {
        result = read_frames(read_half, dispatcher, &heartbeat) => result,
        error = heartbeat.run() => Err(error),
    };
    connection.clear_writer().await;

    match result {
        Ok(()) => ConnectionEvent::Closed { generation },
        Err(e) => ConnectionEvent::Errored {
            generation,
            reason: e.to_string(),
        },
    }
}

/// Dispatches frames in arrival order until the server closes the socket.
async fn read_frames(
    mut read_half: SplitStream<WsStream>,
    dispatcher: &MessageDispatcher,
    heartbeat: &HeartbeatManager,
) -> Result<()> {
    while let Some(msg_result) = read_half.next().await {
        let msg = msg_result?;
        heartbeat.acknowledge();

        match msg {
            Message::Text(text) => {
                tracing::trace!("Received text message: {}", text.as_str());
                dispatcher.dispatch(text.as_str());
            }
            Message::Close(frame) => {
                if let Some(close_frame) = frame {
                    tracing::info!(
                        "Server closed connection: code={:?}, reason='{}'",
                        close_frame.code,
                        close_frame.reason
                    );
                } else {
                    tracing::info!("Server closed connection without close frame");
                }
                return Ok(());
            }
            Message::Ping(data) => {
                tracing::trace!("Received ping ({} bytes)", data.len());
            }
            Message::Pong(data) => {
                tracing::trace!("Received pong ({} bytes)", data.len());
            }
            Message::Binary(data) => {
                tracing::warn!(
                    "Received unexpected binary message ({} bytes)",
                    data.len()
                );
            }
            Message::Frame(_) => {
                tracing::trace!("Received raw frame (internal)");
            }
        }
    }

    tracing::info!("Server stream ended");
    Ok(())
}
