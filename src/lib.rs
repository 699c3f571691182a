//! # Gemini Projects
//!
//! Projects and prompt shortcuts layered onto a Gemini-style chat sidebar.
//!
//! The member crates do the work; this crate re-exports them and provides
//! [`activate`], which wires configuration, the file-backed state store, the
//! prompt library and a host page into a running [`ContentScript`].
//!
//! ```no_run
//! # async fn run(page: gemini_projects::dom::Page) -> Result<(), gemini_projects::ActivationError> {
//! use gemini_projects::{activate, ActivationOptions, Config};
//!
//! let (_events, rx) = tokio::sync::mpsc::channel(64);
//! let activation = activate(Config::default(), page, rx, ActivationOptions::default()).await?;
//! activation.join().await;
//! # Ok(())
//! # }
//! ```

mod activation;
pub mod logging;

pub use activation::{activate, activate_with_backend, Activation, ActivationError, ActivationOptions};

pub use gemini_projects_config as config;
pub use gemini_projects_dom as dom;
pub use gemini_projects_protocols as protocols;
pub use gemini_projects_runtime as runtime;
pub use gemini_projects_store as store;

pub use gemini_projects_config::{Config, ConfigLoader};
pub use gemini_projects_protocols::{ChatRef, Project, ProjectIcon, Prompt, PromptDraft, PromptLibrary, StoredState};
pub use gemini_projects_runtime::{
    insert_saved_prompt, ContentContext, ContentScript, ExtensionUi, HostEvent, NoopUi, PromptPickerHandle,
};
pub use gemini_projects_store::{
    FilePromptStore, FileStateStore, MemoryPromptStore, MemoryStateStore, PromptService, StateService,
};
