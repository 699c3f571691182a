//! # Gemini Projects Runtime
//!
//! The content-script side of the extension.
//!
//! ## Components
//!
//! - [`ContentContext`] - page, config, resolver, persistence backend and the
//!   per-page [`SessionState`]
//! - [`sync`] - DOM scans, user actions and the hide pass
//! - [`sidebar::tick`] - attaches the projects section after host re-renders
//! - [`panel`] - the projects panel and its floating menus
//! - [`menu`] - the "Move to Project" enhancement of the host's chat menu
//! - [`prompts`] - composer button, prompt insertion and saved prompt use
//! - [`ContentScript`] - the event loop tying them together

pub mod backend;
pub mod content;
pub mod context;
pub mod error;
pub mod event;
pub mod menu;
pub mod panel;
pub mod prompts;
pub mod session;
pub mod sidebar;
pub mod sync;
pub mod ui;

#[cfg(test)]
mod testing;

pub use backend::StateBackend;
pub use content::ContentScript;
pub use context::ContentContext;
pub use error::SyncError;
pub use event::HostEvent;
pub use menu::{ClickOutcome, MenuCommand, MenuEnhancer, MenuTheme};
pub use panel::{ChatNavigation, PanelAction};
pub use prompts::{insert_prompt, insert_saved_prompt, PromptPickerHandle};
pub use session::SessionState;
pub use sidebar::SidebarStatus;
pub use sync::ProjectDraft;
pub use ui::{ExtensionUi, NoopUi};
