use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid controller endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
    #[error("failed to encode command: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("transport worker stopped")]
    WorkerStopped,
}
