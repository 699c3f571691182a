//! Shared handles for one activation.

use std::sync::Arc;
use std::time::Duration;

use gemini_projects_config::Config;
use gemini_projects_dom::{AnchorResolver, Matcher, Page};
use gemini_projects_protocols::{BackgroundRequest, BackgroundResponse, StoredState};
use parking_lot::Mutex;
use tracing::debug;

use crate::backend::StateBackend;
use crate::error::SyncError;
use crate::session::SessionState;

/// Everything the content script's parts need, cheap to clone into tasks.
///
/// The session lock is never held across an await, and never taken while a
/// page lock is held by the same caller.
#[derive(Clone)]
pub struct ContentContext {
    page: Page,
    config: Arc<Config>,
    resolver: Arc<AnchorResolver>,
    backend: Arc<dyn StateBackend>,
    session: Arc<Mutex<SessionState>>,
}

impl ContentContext {
    /// Detects the page locale once and binds the resolver to it.
    pub fn new(page: Page, config: Config, backend: Arc<dyn StateBackend>) -> Self {
        let matcher = {
            let doc = page.read();
            Matcher::detect(&doc, &config.locale)
        };
        debug!(locale = ?matcher.locale(), "content context created");
        let resolver = AnchorResolver::new(&config, matcher);
        Self {
            page,
            config: Arc::new(config),
            resolver: Arc::new(resolver),
            backend,
            session: Arc::new(Mutex::new(SessionState::default())),
        }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn resolver(&self) -> &AnchorResolver {
        &self.resolver
    }

    /// Run `f` with the session locked.
    pub fn session<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        f(&mut self.session.lock())
    }

    /// Snapshot of the current projection.
    pub fn projection(&self) -> StoredState {
        self.session.lock().projection.clone()
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.config.injection.frame_interval_ms)
    }

    /// Send a request; a `{ ok: false }` answer becomes an error.
    pub async fn request(&self, request: BackgroundRequest) -> Result<BackgroundResponse, SyncError> {
        let kind = request.kind();
        let response = self.backend.send(request).await;
        debug!(request = kind, ok = response.ok, "background response");
        Ok(response.into_result()?)
    }

    /// Send a request and adopt the returned state as the projection.
    pub async fn request_state(&self, request: BackgroundRequest) -> Result<StoredState, SyncError> {
        let state = self.request(request).await?.into_state()?;
        self.session(|s| s.replace_projection(state.clone()));
        Ok(state)
    }
}

impl std::fmt::Debug for ContentContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentContext")
            .field("page", &self.page)
            .field("locale", &self.resolver.matcher().locale())
            .finish_non_exhaustive()
    }
}
