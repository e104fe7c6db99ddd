//! Reconnecting websocket channel to the controller.
//!
//! A background task owns the socket and walks the [`ConnectionMachine`]; the
//! [`TransportHandle`] exposes the current [`ConnectionState`] and a
//! non-blocking `send` usable from the UI thread. Commands offered while the
//! connection is not open are dropped, never queued.

use std::{sync::Arc, time::Duration};

use futures::{SinkExt, StreamExt};
use shared::{
    domain::ConnectionState,
    protocol::{decode_controller_message, Command, ControllerEvent},
};
use tokio::{
    net::TcpStream,
    runtime::Handle,
    sync::{broadcast, mpsc, watch},
    task::JoinHandle,
};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use url::Url;

use crate::{error::TransportError, retry::RetryPolicy};

pub mod machine;

pub use machine::{ConnectionMachine, NextStep};

pub const DEFAULT_CONTROLLER_PORT: u16 = 81;
const EVENT_CAPACITY: usize = 256;

type ControllerSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Builds `ws://{host}:{port}/`.
pub fn controller_endpoint(host: &str, port: u16) -> Result<Url, TransportError> {
    let host = host.trim();
    let url = if host.contains(':') && !host.starts_with('[') {
        format!("ws://[{host}]:{port}/")
    } else {
        format!("ws://{host}:{port}/")
    };
    Ok(Url::parse(&url)?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    /// Connection was not open; the command was discarded.
    Dropped,
}

/// Outbound seam used by the control session. Implementations must never
/// block and must drop, not queue, commands while not open.
pub trait CommandSink {
    fn connection_state(&self) -> ConnectionState;
    fn send(&self, command: &Command) -> Result<SendOutcome, TransportError>;
}

impl<T: CommandSink + ?Sized> CommandSink for &T {
    fn connection_state(&self) -> ConnectionState {
        (**self).connection_state()
    }

    fn send(&self, command: &Command) -> Result<SendOutcome, TransportError> {
        (**self).send(command)
    }
}

impl<T: CommandSink + ?Sized> CommandSink for Arc<T> {
    fn connection_state(&self) -> ConnectionState {
        (**self).connection_state()
    }

    fn send(&self, command: &Command) -> Result<SendOutcome, TransportError> {
        (**self).send(command)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    StateChanged(ConnectionState),
    Inbound(ControllerEvent),
    ReconnectScheduled(Duration),
    RetriesExhausted,
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub endpoint: Url,
    pub retry: RetryPolicy,
}

pub struct TransportHandle {
    endpoint: Url,
    state: watch::Receiver<ConnectionState>,
    outbound: mpsc::UnboundedSender<String>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl TransportHandle {
    /// Spawns the worker on the current tokio runtime. The returned receiver
    /// is subscribed before the first connect attempt.
    pub fn spawn(config: TransportConfig) -> (Self, broadcast::Receiver<TransportEvent>) {
        Self::spawn_on(&Handle::current(), config)
    }

    pub fn spawn_on(
        runtime: &Handle,
        config: TransportConfig,
    ) -> (Self, broadcast::Receiver<TransportEvent>) {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (events, events_rx) = broadcast::channel(EVENT_CAPACITY);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let endpoint = config.endpoint.clone();
        let task = runtime.spawn(run_worker(
            config,
            state_tx,
            outbound_rx,
            events,
            shutdown_rx,
        ));

        (
            Self {
                endpoint,
                state: state_rx,
                outbound: outbound_tx,
                shutdown: shutdown_tx,
                task,
            },
            events_rx,
        )
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub async fn wait_until_open(&self, timeout: Duration) -> bool {
        let mut state = self.state.clone();
        let open = matches!(
            tokio::time::timeout(timeout, state.wait_for(|s| s.is_open())).await,
            Ok(Ok(_))
        );
        open
    }

    /// Flushes accepted frames, closes the socket and stops retrying.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.task.await {
            warn!(%err, "transport worker ended abnormally");
        }
    }
}

impl CommandSink for TransportHandle {
    fn connection_state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    fn send(&self, command: &Command) -> Result<SendOutcome, TransportError> {
        if !self.connection_state().is_open() {
            debug!(kind = command.kind(), "controller not connected; dropping command");
            return Ok(SendOutcome::Dropped);
        }
        let text = command.to_wire()?;
        self.outbound
            .send(text)
            .map_err(|_| TransportError::WorkerStopped)?;
        debug!(kind = command.kind(), "queued command for controller");
        Ok(SendOutcome::Sent)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PumpEnd {
    Closed,
    Shutdown,
}

fn publish(
    state_tx: &watch::Sender<ConnectionState>,
    events: &broadcast::Sender<TransportEvent>,
    state: ConnectionState,
) {
    state_tx.send_replace(state);
    let _ = events.send(TransportEvent::StateChanged(state));
}

async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

async fn run_worker(
    config: TransportConfig,
    state_tx: watch::Sender<ConnectionState>,
    mut outbound_rx: mpsc::UnboundedReceiver<String>,
    events: broadcast::Sender<TransportEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    let endpoint = config.endpoint.to_string();
    let mut machine = ConnectionMachine::new(config.retry);

    loop {
        publish(&state_tx, &events, machine.state());
        let connected = tokio::select! {
            result = connect_async(endpoint.as_str()) => result,
            _ = shutdown_requested(&mut shutdown) => break,
        };

        match connected {
            Ok((socket, _)) => {
                // Anything accepted during a previous connection is stale.
                while outbound_rx.try_recv().is_ok() {}
                publish(&state_tx, &events, machine.opened());
                info!(%endpoint, "controller connection open");

                let ended = pump(socket, &mut outbound_rx, &events, &mut shutdown).await;
                if ended == PumpEnd::Shutdown {
                    break;
                }
                info!(%endpoint, "controller connection closed");
            }
            Err(err) => {
                warn!(%endpoint, %err, "controller connect failed");
            }
        }

        let next = machine.closed();
        publish(&state_tx, &events, machine.state());
        match next {
            NextStep::RetryAfter(delay) => {
                debug!(?delay, "scheduling controller reconnect");
                let _ = events.send(TransportEvent::ReconnectScheduled(delay));
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = shutdown_requested(&mut shutdown) => break,
                }
                machine.retrying();
            }
            NextStep::GiveUp => {
                warn!(
                    %endpoint,
                    attempts = machine.failed_attempts(),
                    "giving up on controller reconnects"
                );
                let _ = events.send(TransportEvent::RetriesExhausted);
                break;
            }
        }
    }

    if *state_tx.borrow() != ConnectionState::Closed {
        publish(&state_tx, &events, ConnectionState::Closed);
    }
}

async fn pump(
    socket: ControllerSocket,
    outbound_rx: &mut mpsc::UnboundedReceiver<String>,
    events: &broadcast::Sender<TransportEvent>,
    shutdown: &mut watch::Receiver<bool>,
) -> PumpEnd {
    let (mut writer, mut reader) = socket.split();

    loop {
        tokio::select! {
            incoming = reader.next() => match incoming {
                Some(Ok(Message::Text(text))) => handle_inbound(&text, events),
                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "controller sent close frame");
                    return PumpEnd::Closed;
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    warn!(%err, "websocket receive failed");
                    return PumpEnd::Closed;
                }
                None => return PumpEnd::Closed,
            },
            outgoing = outbound_rx.recv() => match outgoing {
                Some(text) => {
                    if let Err(err) = writer.send(Message::Text(text)).await {
                        warn!(%err, "websocket send failed");
                        return PumpEnd::Closed;
                    }
                }
                None => {
                    let _ = writer.send(Message::Close(None)).await;
                    return PumpEnd::Shutdown;
                }
            },
            _ = shutdown_requested(shutdown) => {
                while let Ok(text) = outbound_rx.try_recv() {
                    if writer.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                let _ = writer.send(Message::Close(None)).await;
                return PumpEnd::Shutdown;
            }
        }
    }
}

fn handle_inbound(text: &str, events: &broadcast::Sender<TransportEvent>) {
    match decode_controller_message(text) {
        Ok(event) => {
            let _ = events.send(TransportEvent::Inbound(event));
        }
        Err(err) => warn!(%err, "discarding controller payload"),
    }
}

#[cfg(test)]
#[path = "../tests/transport_tests.rs"]
mod tests;
