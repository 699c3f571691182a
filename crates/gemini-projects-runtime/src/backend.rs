//! Message-passing seam to the persistence collaborator.

use async_trait::async_trait;
use gemini_projects_protocols::{BackgroundRequest, BackgroundResponse};
use gemini_projects_store::StateService;

/// Sends one request to the background context and waits for its answer.
///
/// Implementations never fail at the transport level; failures come back as
/// `{ ok: false, error }` responses.
#[async_trait]
pub trait StateBackend: Send + Sync {
    async fn send(&self, request: BackgroundRequest) -> BackgroundResponse;
}

/// In-process background: the service answers directly.
#[async_trait]
impl StateBackend for StateService {
    async fn send(&self, request: BackgroundRequest) -> BackgroundResponse {
        self.handle(request).await
    }
}
