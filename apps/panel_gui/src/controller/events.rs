//! Backend-to-UI events and error classification for the status banner.

use client_core::TransportEvent;

pub enum UiEvent {
    Transport(TransportEvent),
    Info(String),
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    Protocol,
    Config,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Connection,
    Config,
    General,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_ascii_lowercase();
        let category = if context == UiErrorContext::Config
            || lower.contains("config")
            || lower.contains("panel__")
        {
            UiErrorCategory::Config
        } else if lower.contains("malformed")
            || lower.contains("json")
            || lower.contains("encode")
            || lower.contains("protocol")
        {
            UiErrorCategory::Protocol
        } else if lower.contains("unreachable")
            || lower.contains("connection")
            || lower.contains("reconnect")
            || lower.contains("timed out")
            || lower.contains("transport")
            || lower.contains("runtime")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Cleared automatically once the controller connection comes back.
    pub fn clears_on_reconnect(&self) -> bool {
        self.category == UiErrorCategory::Transport && self.context == UiErrorContext::Connection
    }
}
