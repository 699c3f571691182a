//! Protocol-level errors.

use thiserror::Error;

/// Errors raised while interpreting a background response.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The persistence collaborator answered `{ ok: false }`.
    #[error("Persistence failed: {0}")]
    Persistence(String),

    /// An ok response did not carry the state the caller needed.
    #[error("Response carried no state")]
    MissingState,

    /// Payload could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
