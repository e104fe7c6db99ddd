use client_core::{CommandSink, SendOutcome, TransportError, TransportHandle};
use shared::{domain::ConnectionState, protocol::Command};

/// Outbound side of the panel. `Offline` keeps the panel usable when the
/// backend could not start; every command is dropped.
pub enum PanelSink {
    Live(TransportHandle),
    Offline,
}

impl CommandSink for PanelSink {
    fn connection_state(&self) -> ConnectionState {
        match self {
            Self::Live(transport) => transport.connection_state(),
            Self::Offline => ConnectionState::Closed,
        }
    }

    fn send(&self, command: &Command) -> Result<SendOutcome, TransportError> {
        match self {
            Self::Live(transport) => transport.send(command),
            Self::Offline => Ok(SendOutcome::Dropped),
        }
    }
}
