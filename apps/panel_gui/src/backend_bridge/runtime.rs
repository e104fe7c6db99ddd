//! Runtime bridge: transport events in, `UiEvent`s out.

use std::thread;

use client_core::{TransportConfig, TransportEvent, TransportHandle};
use crossbeam_channel::{bounded, Sender, TrySendError};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::controller::events::{UiError, UiErrorContext, UiEvent};

/// Starts the backend thread and returns the transport handle once the
/// worker is running. The handle is used directly from the UI thread.
pub fn start_backend_bridge(
    config: TransportConfig,
    ui_tx: Sender<UiEvent>,
) -> Result<TransportHandle, UiError> {
    let (handle_tx, handle_rx) = bounded::<Result<TransportHandle, UiError>>(1);

    thread::Builder::new()
        .name("panel-backend".into())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_multi_thread()
                .worker_threads(1)
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(err) => {
                    tracing::error!("failed to build backend runtime: {err}");
                    let _ = handle_tx.send(Err(UiError::from_message(
                        UiErrorContext::BackendStartup,
                        format!("backend worker startup failure: failed to build runtime: {err}"),
                    )));
                    return;
                }
            };

            runtime.block_on(async move {
                let (transport, events) = TransportHandle::spawn(config);
                let _ = ui_tx.try_send(UiEvent::Info(format!(
                    "Connecting to {}",
                    transport.endpoint()
                )));
                if handle_tx.send(Ok(transport)).is_err() {
                    return;
                }
                forward_events(events, &ui_tx).await;
            });
        })
        .map_err(|err| {
            UiError::from_message(
                UiErrorContext::BackendStartup,
                format!("backend worker startup failure: could not spawn thread: {err}"),
            )
        })?;

    handle_rx.recv().unwrap_or_else(|_| {
        Err(UiError::from_message(
            UiErrorContext::BackendStartup,
            "backend worker startup failure: runtime thread exited early",
        ))
    })
}

/// Runs until the transport is dropped or the UI goes away.
async fn forward_events(mut events: broadcast::Receiver<TransportEvent>, ui_tx: &Sender<UiEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => match ui_tx.try_send(UiEvent::Transport(event)) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    tracing::warn!("ui event queue full; dropping transport event")
                }
                Err(TrySendError::Disconnected(_)) => return,
            },
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "backend bridge fell behind transport events");
                let err = UiError::from_message(
                    UiErrorContext::General,
                    format!("missed {skipped} transport events; connection status may be stale"),
                );
                if let Err(TrySendError::Disconnected(_)) = ui_tx.try_send(UiEvent::Error(err)) {
                    return;
                }
            }
            Err(RecvError::Closed) => return,
        }
    }
}
