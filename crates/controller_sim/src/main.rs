//! Stand-in for the servo/stepper controller: accepts the panel's websocket on
//! `/`, applies commands to simulated actuators and echoes servo moves.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use futures::{SinkExt, StreamExt};
use shared::protocol::Command;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

mod actuator;
mod config;

use actuator::ActuatorState;
use config::load_settings;

struct AppState {
    actuators: Mutex<ActuatorState>,
    echoes: broadcast::Sender<String>,
}

impl AppState {
    fn new() -> Self {
        let (echoes, _) = broadcast::channel(256);
        Self {
            actuators: Mutex::new(ActuatorState::default()),
            echoes,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings();
    let app = build_router(Arc::new(AppState::new()));

    let addr: SocketAddr = settings.bind_addr.parse()?;
    info!(%addr, "controller simulator listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(ws_handler))
        .route("/healthz", get(healthz))
        .route("/state", get(actuator_state))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn actuator_state(State(state): State<Arc<AppState>>) -> Json<ActuatorState> {
    Json(state.actuators.lock().await.clone())
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws_connection(state, socket))
}

async fn ws_connection(state: Arc<AppState>, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let mut echoes_rx = state.echoes.subscribe();
    info!("panel connected");

    let send_task = tokio::spawn(async move {
        while let Ok(text) = echoes_rx.recv().await {
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => handle_frame(&state, &text).await,
            Message::Close(_) => break,
            _ => {}
        }
    }

    send_task.abort();
    info!("panel disconnected");
}

async fn handle_frame(state: &AppState, text: &str) {
    let command = match serde_json::from_str::<Command>(text) {
        Ok(command) => command,
        Err(err) => {
            warn!(%err, payload = text, "ignoring unrecognised frame");
            return;
        }
    };

    let echo = {
        let mut actuators = state.actuators.lock().await;
        let echo = actuators.apply(&command);
        debug!(
            kind = command.kind(),
            running = actuators.is_running(),
            "applied command"
        );
        echo
    };
    if let Some(echo) = echo {
        let _ = state.echoes.send(echo);
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
