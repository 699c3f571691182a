//! Dialogs and navigation the content script delegates to the embedder.

use async_trait::async_trait;
use gemini_projects_protocols::{Project, ProjectExport};

use crate::panel::ChatNavigation;
use crate::sync::ProjectDraft;

/// User-facing surfaces outside the sidebar: modals, downloads and page
/// navigation. Every method has a do-nothing default.
#[async_trait]
pub trait ExtensionUi: Send + Sync {
    /// Ask for a new project. `None` means the user cancelled.
    async fn ask_new_project(&self) -> Option<ProjectDraft> {
        None
    }

    /// Ask for a new name. `None` means the user cancelled.
    async fn ask_rename(&self, _project: &Project) -> Option<String> {
        None
    }

    /// Confirm a delete. Confirms unless overridden.
    async fn confirm_delete(&self, _project: &Project) -> bool {
        true
    }

    async fn save_export(&self, _export: ProjectExport) {}

    async fn navigate(&self, _to: ChatNavigation) {}
}

/// Declines to create or rename, confirms deletes and drops exports and
/// navigation.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopUi;

#[async_trait]
impl ExtensionUi for NoopUi {}
