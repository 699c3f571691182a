//! The content script: one event loop per page.
//!
//! Host events arrive over a channel, host mutations over a page observer.
//! Both are handled on the same task, so menu state, panel state and the
//! projection never race each other.

use std::sync::Arc;

use gemini_projects_dom::{ensure_overlay_host, Document, DomError, MutationRecord, NodeId};
use gemini_projects_protocols::Project;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::context::ContentContext;
use crate::error::SyncError;
use crate::event::HostEvent;
use crate::menu::{ClickOutcome, MenuCommand, MenuEnhancer, MenuTheme};
use crate::panel::{chat_navigation, close_panel_menu, open_chat_menu, open_project_menu, panel_action, PanelAction};
use crate::prompts::{ensure_prompt_button, is_prompt_button, PromptPickerHandle};
use crate::sidebar::{tick, SidebarStatus};
use crate::sync;
use crate::ui::ExtensionUi;

/// Owns the menu enhancer and dispatches host events to the right part.
pub struct ContentScript {
    ctx: ContentContext,
    menus: MenuEnhancer,
    ui: Arc<dyn ExtensionUi>,
    picker: Option<PromptPickerHandle>,
    cancel: CancellationToken,
}

impl ContentScript {
    pub fn new(ctx: ContentContext, ui: Arc<dyn ExtensionUi>) -> Self {
        let cancel = CancellationToken::new();
        Self {
            menus: MenuEnhancer::new(ctx.clone(), cancel.clone()),
            ctx,
            ui,
            picker: None,
            cancel,
        }
    }

    pub fn with_prompt_picker(mut self, picker: PromptPickerHandle) -> Self {
        self.picker = Some(picker);
        self
    }

    pub fn context(&self) -> &ContentContext {
        &self.ctx
    }

    /// Cancelling this token stops [`ContentScript::run`] and every task the
    /// script spawned.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Load state and make the first attach pass.
    pub async fn activate(&mut self) -> Result<SidebarStatus, SyncError> {
        sync::bootstrap(&self.ctx).await;
        let status = tick(&self.ctx, &[]).await?;
        self.ensure_prompt_button();
        info!(attached = status.is_attached(), "content script active");
        Ok(status)
    }

    /// Handle one host event. Returns false once the page is unloading.
    pub async fn handle_event(&mut self, event: HostEvent) -> bool {
        debug!(event = event.kind(), "host event");
        match event {
            HostEvent::PointerDown { target } => {
                self.close_panel_menu_outside(target);
                self.menus.on_pointer_down(target);
            }
            HostEvent::PointerEnter { target } => self.menus.on_pointer_enter(target),
            HostEvent::PointerLeave { target } => self.menus.on_pointer_leave(target),
            HostEvent::Click { target } => {
                if let Err(e) = self.on_click(target).await {
                    warn!(error = %e, "click handling failed");
                }
            }
            HostEvent::Scroll => self.dismiss("scroll"),
            event @ HostEvent::KeyDown { .. } => {
                if event.is_escape() {
                    self.dismiss("escape");
                }
            }
            HostEvent::Navigate { url } => {
                debug!(%url, "host navigated");
                self.dismiss("navigation");
                self.ctx.session(|s| s.clear_anchors());
                if let Err(e) = tick(&self.ctx, &[]).await {
                    warn!(error = %e, "attach after navigation failed");
                }
            }
            HostEvent::Unload => {
                self.dismiss("unload");
                self.cancel.cancel();
                return false;
            }
        }
        true
    }

    /// React to a host mutation batch.
    pub async fn on_mutations(&mut self, records: &[MutationRecord]) {
        self.menus.check_menu_closed();
        if let Err(e) = tick(&self.ctx, records).await {
            warn!(error = %e, "sidebar pass failed");
        }
        self.ensure_prompt_button();
    }

    /// Drive the script until the page unloads, the channel closes or the
    /// token is cancelled.
    pub async fn run(mut self, mut events: mpsc::Receiver<HostEvent>) {
        let mut observer = self.ctx.page().observe();
        if let Err(e) = self.activate().await {
            warn!(error = %e, "activation failed");
        }
        let cancel = self.cancel.clone();
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                event = events.recv() => match event {
                    Some(event) => {
                        if !self.handle_event(event).await {
                            break;
                        }
                    }
                    None => break,
                },
                records = observer.changed() => match records {
                    Some(records) => self.on_mutations(&records).await,
                    None => break,
                },
            }
        }
        self.dismiss("shutdown");
        info!("content script stopped");
    }

    async fn on_click(&mut self, target: NodeId) -> Result<(), SyncError> {
        match self.menus.on_click(target) {
            ClickOutcome::Command(command) => return self.run_command(command).await,
            ClickOutcome::Consumed => return Ok(()),
            ClickOutcome::Ignored => {}
        }

        let (prompt, action) = {
            let doc = self.ctx.page().read();
            (is_prompt_button(&doc, target), panel_action(&doc, target))
        };
        if prompt {
            if let Some(picker) = &self.picker {
                picker.open();
            }
            return Ok(());
        }
        if let Some(action) = action {
            return self.run_panel_action(target, action).await;
        }
        sync::track_click(&self.ctx, target).await?;
        Ok(())
    }

    async fn run_command(&mut self, command: MenuCommand) -> Result<(), SyncError> {
        match command {
            MenuCommand::CreateProject { conversation_id } => {
                let Some(draft) = self.ui.ask_new_project().await else {
                    return Ok(());
                };
                let project = sync::create_project(&self.ctx, draft).await?;
                sync::move_chat(&self.ctx, &conversation_id, Some(&project.id)).await
            }
            MenuCommand::Move {
                conversation_id,
                project_id,
            } => sync::move_chat(&self.ctx, &conversation_id, project_id.as_deref()).await,
        }
    }

    async fn run_panel_action(&mut self, target: NodeId, action: PanelAction) -> Result<(), SyncError> {
        debug!(?action, "panel action");
        if !matches!(action, PanelAction::ProjectMenu(_) | PanelAction::ChatMenu { .. }) {
            self.close_panel_menu();
        }
        match action {
            PanelAction::ToggleSection => {
                let collapsed = self.ctx.session(|s| s.projection.ui_prefs.projects_collapsed);
                sync::set_projects_collapsed(&self.ctx, !collapsed).await
            }
            PanelAction::NewProject => {
                if let Some(draft) = self.ui.ask_new_project().await {
                    sync::create_project(&self.ctx, draft).await?;
                }
                Ok(())
            }
            PanelAction::ToggleProject(project_id) => {
                sync::toggle_project_expanded(&self.ctx, &project_id);
                Ok(())
            }
            PanelAction::ProjectMenu(project_id) => self.open_project_menu(target, &project_id),
            PanelAction::ChatMenu {
                conversation_id,
                project_id,
            } => self.open_chat_menu(target, &conversation_id, &project_id),
            PanelAction::OpenChat { conversation_id, href } => {
                let sidebar = self.ctx.session(|s| s.sidebar_root);
                let navigation = {
                    let doc = self.ctx.page().read();
                    chat_navigation(&doc, self.ctx.resolver(), sidebar, &conversation_id, &href)
                };
                self.ui.navigate(navigation).await;
                Ok(())
            }
            PanelAction::RenameProject(project_id) => {
                let project = self.project(&project_id)?;
                match self.ui.ask_rename(&project).await {
                    Some(name) => sync::rename_project(&self.ctx, &project_id, &name).await,
                    None => Ok(()),
                }
            }
            PanelAction::ExportProject(project_id) => {
                let export = sync::export_project(&self.ctx, &project_id).await?;
                self.ui.save_export(export).await;
                Ok(())
            }
            PanelAction::DeleteProject(project_id) => {
                let project = self.project(&project_id)?;
                if self.ui.confirm_delete(&project).await {
                    sync::delete_project(&self.ctx, &project_id).await?;
                }
                Ok(())
            }
            PanelAction::RemoveChat(conversation_id) => sync::remove_from_project(&self.ctx, &conversation_id).await,
            PanelAction::MoveChat {
                conversation_id,
                project_id,
            } => sync::move_chat(&self.ctx, &conversation_id, Some(&project_id)).await,
        }
    }

    fn project(&self, project_id: &str) -> Result<Project, SyncError> {
        self.ctx
            .session(|s| s.projection.project(project_id).cloned())
            .ok_or_else(|| SyncError::Persistence(format!("Project not found: {project_id}")))
    }

    fn open_project_menu(&self, anchor: NodeId, project_id: &str) -> Result<(), SyncError> {
        let project = self.project(project_id)?;
        self.open_panel_menu(anchor, |doc, layer, theme| {
            let anchor_box = doc.bounding_box(anchor);
            open_project_menu(doc, layer, &anchor_box, &project, theme)
        })
    }

    fn open_chat_menu(&self, anchor: NodeId, conversation_id: &str, project_id: &str) -> Result<(), SyncError> {
        let project = self.project(project_id)?;
        let others: Vec<_> = self.ctx.session(|s| {
            s.projection
                .sorted_projects()
                .into_iter()
                .filter(|p| p.id != project_id)
                .cloned()
                .collect()
        });
        let others: Vec<_> = others.iter().collect();
        self.open_panel_menu(anchor, |doc, layer, theme| {
            let anchor_box = doc.bounding_box(anchor);
            open_chat_menu(doc, layer, &anchor_box, conversation_id, &project, &others, theme)
        })
    }

    fn open_panel_menu(
        &self,
        anchor: NodeId,
        build: impl FnOnce(&mut Document, NodeId, &MenuTheme) -> Result<NodeId, DomError>,
    ) -> Result<(), SyncError> {
        // The panel may have re-rendered between pointer-down and click.
        if !self.ctx.page().read().is_connected(anchor) {
            return Err(SyncError::NotReady("panel menu anchor"));
        }
        let captured = self.ctx.session(|s| s.menu_theme.clone());
        let menu = self.ctx.page().extension(|doc| {
            let (_, layer) = ensure_overlay_host(doc)?;
            let theme = MenuTheme::effective(doc, captured.as_ref());
            build(doc, layer, &theme)
        })?;
        self.ctx.session(|s| s.panel_menu = Some(menu));
        Ok(())
    }

    fn close_panel_menu(&self) {
        if self.ctx.session(|s| s.panel_menu.take()).is_some() {
            self.ctx.page().extension(close_panel_menu);
        }
    }

    fn close_panel_menu_outside(&self, target: NodeId) {
        let Some(menu) = self.ctx.session(|s| s.panel_menu) else {
            return;
        };
        let inside = self.ctx.page().read().contains(menu, target);
        if !inside {
            self.close_panel_menu();
        }
    }

    /// Close every floating menu.
    fn dismiss(&mut self, reason: &'static str) {
        if self.menus.has_open_ui() {
            self.menus.teardown(reason);
        }
        self.close_panel_menu();
    }

    fn ensure_prompt_button(&self) {
        let result = self
            .ctx
            .page()
            .extension(|doc| ensure_prompt_button(doc, self.ctx.resolver()));
        match result {
            Ok(button) => self.ctx.session(|s| s.prompt_button = button),
            Err(e) => warn!(error = %e, "prompt button injection failed"),
        }
    }
}

impl std::fmt::Debug for ContentScript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentScript")
            .field("ctx", &self.ctx)
            .field("picker", &self.picker)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "content_tests.rs"]
mod tests;
