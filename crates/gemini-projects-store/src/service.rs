//! Request handler over the cached state document.

use std::sync::Arc;

use gemini_projects_protocols::{BackgroundRequest, BackgroundResponse, StoredState};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::migrate::migrate_state;
use crate::reducers;
use crate::store::StateStore;

/// Answers [`BackgroundRequest`]s against one persisted state document.
///
/// The document is loaded on first use and cached. All requests serialise
/// on the cache lock, so concurrent first callers share a single load and a
/// mutation is saved before anyone can read it.
pub struct StateService {
    store: Arc<dyn StateStore>,
    cache: Mutex<Option<StoredState>>,
}

impl StateService {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self {
            store,
            cache: Mutex::new(None),
        }
    }

    /// Handle a request. Failures become `{ ok: false, error }`.
    pub async fn handle(&self, request: BackgroundRequest) -> BackgroundResponse {
        let kind = request.kind();
        match self.dispatch(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(request = kind, error = %e, "state request failed");
                BackgroundResponse::failure(e.to_string())
            }
        }
    }

    /// Current cached state, loading it if needed.
    pub async fn state(&self) -> StoredState {
        let mut cache = self.cache.lock().await;
        if cache.is_none() {
            *cache = Some(self.load().await);
        }
        cache.get_or_insert_with(StoredState::default).clone()
    }

    async fn dispatch(&self, request: BackgroundRequest) -> Result<BackgroundResponse, StoreError> {
        let mut cache = self.cache.lock().await;

        if matches!(request, BackgroundRequest::RefreshStateCache) {
            let state = self.load().await;
            *cache = Some(state.clone());
            return Ok(BackgroundResponse::with_state(state));
        }

        if cache.is_none() {
            *cache = Some(self.load().await);
        }
        let current = cache.get_or_insert_with(StoredState::default);

        match request {
            BackgroundRequest::GetState => Ok(BackgroundResponse::with_state(current.clone())),
            BackgroundRequest::ExportProject { project_id } => Ok(BackgroundResponse::export(
                reducers::export_project(current, &project_id)?,
            )),
            request => {
                let kind = request.kind();
                let mut next = current.clone();
                reducers::apply(&mut next, request)?;
                // Commit only after the write succeeded.
                self.store.save(&next).await?;
                debug!(request = kind, "state saved");
                *cache = Some(next.clone());
                Ok(BackgroundResponse::with_state(next))
            }
        }
    }

    /// Load and migrate. An unreadable store starts empty.
    async fn load(&self) -> StoredState {
        match self.store.load_raw().await {
            Ok(raw) => {
                let state = migrate_state(raw);
                info!(
                    projects = state.projects.len(),
                    chats = state.chat_index.len(),
                    "state loaded"
                );
                state
            }
            Err(e) => {
                warn!(error = %e, "failed to load state, starting empty");
                StoredState::default()
            }
        }
    }
}

impl std::fmt::Debug for StateService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateService").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
