use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed controller payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("controller payload is not a JSON object")]
    NotAnObject,
    #[error("controller payload has no string `type` field")]
    MissingType,
}
