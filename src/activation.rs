//! Wiring a page into a running content script.

use std::sync::Arc;

use gemini_projects_config::{Config, ConfigError, ConfigValidator};
use gemini_projects_dom::Page;
use gemini_projects_runtime::{ContentContext, ContentScript, ExtensionUi, HostEvent, NoopUi, PromptPickerHandle, StateBackend};
use gemini_projects_store::{FilePromptStore, FileStateStore, PromptService, StateService, StoreError};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Errors raised before the content script starts.
#[derive(Debug, Error)]
pub enum ActivationError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Optional parts of an activation.
#[derive(Default)]
pub struct ActivationOptions {
    pub ui: Option<Arc<dyn ExtensionUi>>,
    pub prompt_picker: Option<PromptPickerHandle>,
    pub prompt_library: Option<Arc<PromptService>>,
}

/// A content script running on its own task.
#[derive(Debug)]
pub struct Activation {
    ctx: ContentContext,
    prompts: Option<Arc<PromptService>>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl Activation {
    pub fn context(&self) -> &ContentContext {
        &self.ctx
    }

    /// The saved prompt library, when one was opened.
    pub fn prompt_library(&self) -> Option<&Arc<PromptService>> {
        self.prompts.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the script and wait for it to tear down its menus.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "content script task failed");
        }
    }

    /// Wait until the page unloads or the event channel closes.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            warn!(error = %e, "content script task failed");
        }
    }
}

/// Validate `config`, open the file stores it names and start the content
/// script for `page`.
pub async fn activate(
    config: Config,
    page: Page,
    events: mpsc::Receiver<HostEvent>,
    mut options: ActivationOptions,
) -> Result<Activation, ActivationError> {
    let validation = ConfigValidator::validate(&config)?;
    for warning in &validation.warnings {
        warn!(path = %warning.path, "{}", warning.message);
    }
    if !validation.is_valid() {
        let errors: Vec<_> = validation
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.path, e.message))
            .collect();
        return Err(ActivationError::InvalidConfig(errors.join("; ")));
    }

    let store = FileStateStore::from_config(&config.storage).await?;
    info!(path = ?store.path(), "state store opened");
    let service = Arc::new(StateService::new(Arc::new(store)));

    if options.prompt_library.is_none() {
        let prompts = FilePromptStore::from_config(&config.storage).await?;
        info!(path = ?prompts.path(), "prompt library opened");
        options.prompt_library = Some(Arc::new(PromptService::new(Arc::new(prompts))));
    }
    Ok(activate_with_backend(config, page, events, service, options))
}

/// Start the content script against an existing background.
///
/// Must be called inside a tokio runtime.
pub fn activate_with_backend(
    config: Config,
    page: Page,
    events: mpsc::Receiver<HostEvent>,
    backend: Arc<dyn StateBackend>,
    options: ActivationOptions,
) -> Activation {
    let ctx = ContentContext::new(page, config, backend);
    let ui: Arc<dyn ExtensionUi> = match options.ui {
        Some(ui) => ui,
        None => Arc::new(NoopUi),
    };
    let mut script = ContentScript::new(ctx.clone(), ui);
    if let Some(picker) = options.prompt_picker {
        script = script.with_prompt_picker(picker);
    }
    let cancel = script.cancellation_token();
    let task = tokio::spawn(script.run(events));
    Activation {
        ctx,
        prompts: options.prompt_library,
        cancel,
        task,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gemini_projects_dom::fixtures::FixtureBuilder;

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let mut config = Config::default();
        config.host.origin = String::new();
        let page = Page::new(FixtureBuilder::new().build().doc);
        let (_tx, rx) = mpsc::channel(1);

        let err = activate(config, page, rx, ActivationOptions::default()).await.unwrap_err();
        match err {
            ActivationError::InvalidConfig(message) => assert!(message.contains("host.origin")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
