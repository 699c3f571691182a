//! Runtime error types.

use gemini_projects_dom::DomError;
use gemini_projects_protocols::ProtocolError;
use gemini_projects_store::StoreError;
use thiserror::Error;

/// Errors surfaced by user actions and sync passes.
///
/// Anchors that are not found are never errors; they surface as `NotReady`
/// only when an explicit user action cannot proceed without them.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The persistence collaborator rejected or failed the request. The
    /// in-memory projection is left as it was.
    #[error("Persistence failed: {0}")]
    Persistence(String),

    /// An anchor the action needs has not been resolved yet.
    #[error("Not ready: {0}")]
    NotReady(&'static str),

    /// A project name was blank after trimming.
    #[error("Project name must not be empty")]
    InvalidName,

    /// No saved prompt has this id.
    #[error("Prompt not found: {0}")]
    PromptNotFound(String),

    /// An impossible tree edit was requested.
    #[error("DOM error: {0}")]
    Dom(#[from] DomError),
}

impl From<ProtocolError> for SyncError {
    fn from(e: ProtocolError) -> Self {
        match e {
            ProtocolError::Persistence(message) => Self::Persistence(message),
            other => Self::Persistence(other.to_string()),
        }
    }
}

impl From<StoreError> for SyncError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::PromptNotFound(id) => Self::PromptNotFound(id),
            other => Self::Persistence(other.to_string()),
        }
    }
}
