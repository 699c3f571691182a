//! State synchronization.
//!
//! Two write paths feed the projection. DOM scans and link clicks upsert
//! chat observations, which never carry a project assignment. User actions
//! go to the persistence collaborator and adopt the state it returns. After
//! every successful write the panel and the hide pass run again in the same
//! call, so an assigned chat never shows up in both places.

use std::collections::BTreeSet;

use gemini_projects_dom::markers::is_extension_node;
use gemini_projects_dom::{AnchorResolver, Document, NodeId, Selector};
use gemini_projects_protocols::{
    BackgroundRequest, ChatRefPatch, Project, ProjectExport, ProjectIcon, StoredState, UiPrefsPatch,
};
use gemini_projects_store::normalize_stored_title;
use tracing::{debug, info, warn};

use crate::context::ContentContext;
use crate::error::SyncError;
use crate::panel::render_panel;

/// Fields the user fills in when creating a project.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProjectDraft {
    pub name: String,
    pub icon: ProjectIcon,
    pub color: Option<String>,
}

impl ProjectDraft {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Load the persisted state into the session. A failed load leaves the
/// empty projection in place.
pub async fn bootstrap(ctx: &ContentContext) -> StoredState {
    match ctx.request_state(BackgroundRequest::GetState).await {
        Ok(state) => {
            info!(
                projects = state.projects.len(),
                chats = state.chat_index.len(),
                "state loaded"
            );
            state
        }
        Err(e) => {
            warn!(error = %e, "state load failed, starting empty");
            ctx.projection()
        }
    }
}

/// Row to show or hide for a chat link: the enclosing row unless it holds
/// other links too.
fn row_for_link(doc: &Document, link: NodeId) -> NodeId {
    doc.parent_element(link)
        .and_then(|p| doc.closest(p, &Selector::chat_row()))
        .filter(|row| doc.query_all(*row, &Selector::link()).len() == 1)
        .unwrap_or(link)
}

fn link_conversation_id(
    doc: &Document,
    resolver: &AnchorResolver,
    link: NodeId,
    sidebar: Option<NodeId>,
) -> Option<String> {
    let row = row_for_link(doc, link);
    resolver
        .ids()
        .from_row(doc, row, sidebar)
        .or_else(|| resolver.ids().from_url(doc.node(link).href().unwrap_or_default()))
}

/// Native chat links in `list`, skipping anything the extension rendered.
fn native_links(doc: &Document, list: NodeId) -> Vec<NodeId> {
    doc.query_all(list, &Selector::link())
        .into_iter()
        .filter(|link| !is_extension_node(doc, *link))
        .collect()
}

/// Observations for every titled chat link in `list`, one per conversation.
pub fn scan_chats(
    doc: &Document,
    resolver: &AnchorResolver,
    list: NodeId,
    sidebar: Option<NodeId>,
) -> Vec<ChatRefPatch> {
    let mut seen = BTreeSet::new();
    let mut patches = Vec::new();
    for link in native_links(doc, list) {
        let Some(id) = link_conversation_id(doc, resolver, link, sidebar) else {
            continue;
        };
        let (title, pinned) = normalize_stored_title(&doc.text_content(link));
        if title.is_empty() || !seen.insert(id.clone()) {
            continue;
        }
        let href = doc.node(link).href().map(str::to_string);
        let mut patch = ChatRefPatch::observed(id, title, href);
        if pinned {
            patch.is_pinned = Some(true);
        }
        patches.push(patch);
    }
    patches
}

/// Scan the cached chats list and upsert what it shows. Returns the number
/// of chats sent; zero when the list is not resolved yet.
pub async fn sync_chats_from_dom(ctx: &ContentContext) -> Result<usize, SyncError> {
    let (list, sidebar) = ctx.session(|s| (s.chats_list, s.sidebar_root));
    let Some(list) = list else {
        return Ok(0);
    };
    let patches = {
        let doc = ctx.page().read();
        if !doc.is_connected(list) {
            return Ok(0);
        }
        scan_chats(&doc, ctx.resolver(), list, sidebar)
    };
    if patches.is_empty() {
        return Ok(0);
    }
    let count = patches.len();
    ctx.request_state(BackgroundRequest::UpsertChatRefs { chats: patches })
        .await
        .inspect_err(|e| warn!(error = %e, "chat sync failed"))?;
    debug!(count, "synced chats from sidebar");
    Ok(count)
}

/// Record the conversation behind a clicked link. Returns whether the
/// target was a conversation link.
pub async fn track_click(ctx: &ContentContext, target: NodeId) -> Result<bool, SyncError> {
    let patch = {
        let doc = ctx.page().read();
        let Some(link) = doc.closest(target, &Selector::link()) else {
            return Ok(false);
        };
        if is_extension_node(&doc, link) {
            return Ok(false);
        }
        let href = doc.node(link).href().unwrap_or_default().to_string();
        let Some(id) = ctx.resolver().ids().from_url(&href) else {
            return Ok(false);
        };
        let (title, _) = normalize_stored_title(&doc.text_content(link));
        ChatRefPatch::observed(id, title, Some(href))
    };
    debug!(conversation = %patch.conversation_id, "chat link clicked");
    apply(ctx, BackgroundRequest::UpsertChatRefs { chats: vec![patch] }).await?;
    Ok(true)
}

/// Hide native rows of chats that belong to a project and restore the rest.
/// Returns how many rows are hidden.
pub fn hide_assigned_chats(
    doc: &mut Document,
    resolver: &AnchorResolver,
    list: NodeId,
    state: &StoredState,
    sidebar: Option<NodeId>,
) -> usize {
    let rows: Vec<(NodeId, bool)> = native_links(doc, list)
        .into_iter()
        .map(|link| {
            let assigned = link_conversation_id(doc, resolver, link, sidebar)
                .is_some_and(|id| state.chat_project_id(&id).is_some());
            (row_for_link(doc, link), assigned)
        })
        .collect();

    let mut hidden = 0;
    for (row, assigned) in rows {
        if assigned {
            doc.set_style(row, "display", "none");
            hidden += 1;
        } else if doc.node(row).inline_style("display") == Some("none") {
            doc.remove_style(row, "display");
        }
    }
    hidden
}

/// Re-render the panel and re-run the hide pass from the current session.
/// Returns how many native rows are hidden.
pub fn refresh_views(ctx: &ContentContext) -> usize {
    let (state, expanded, hosts, list, sidebar) = ctx.session(|s| {
        (
            s.projection.clone(),
            s.expanded_project_ids.clone(),
            s.hosts,
            s.chats_list,
            s.sidebar_root,
        )
    });
    let app_segment = ctx.config().host.app_segment.as_str();
    ctx.page().extension(|doc| {
        if let Some(hosts) = hosts.filter(|h| doc.is_connected(h.panel_root)) {
            if let Err(e) = render_panel(doc, hosts.panel_root, &state, &expanded, app_segment) {
                warn!(error = %e, "panel render failed");
            }
        }
        list.filter(|l| doc.is_connected(*l))
            .map(|l| hide_assigned_chats(doc, ctx.resolver(), l, &state, sidebar))
            .unwrap_or(0)
    })
}

async fn apply(ctx: &ContentContext, request: BackgroundRequest) -> Result<StoredState, SyncError> {
    let kind = request.kind();
    let state = ctx
        .request_state(request)
        .await
        .inspect_err(|e| warn!(request = kind, error = %e, "state update failed"))?;
    refresh_views(ctx);
    Ok(state)
}

/// Create a project from a draft. Blank names are rejected before any
/// request is made.
pub async fn create_project(ctx: &ContentContext, draft: ProjectDraft) -> Result<Project, SyncError> {
    let name = draft.name.trim();
    if name.is_empty() {
        return Err(SyncError::InvalidName);
    }
    let sort_index = ctx.session(|s| s.projection.next_sort_index());
    let project = Project::new(name, draft.icon, draft.color, sort_index);
    apply(ctx, BackgroundRequest::UpsertProject {
        project: project.clone(),
    })
    .await?;
    info!(project = %project.id, name = %project.name, "project created");
    Ok(project)
}

pub async fn rename_project(ctx: &ContentContext, project_id: &str, name: &str) -> Result<(), SyncError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(SyncError::InvalidName);
    }
    apply(ctx, BackgroundRequest::RenameProject {
        project_id: project_id.to_string(),
        name: name.to_string(),
    })
    .await?;
    Ok(())
}

/// Delete a project; its chats return to the native list.
pub async fn delete_project(ctx: &ContentContext, project_id: &str) -> Result<(), SyncError> {
    apply(ctx, BackgroundRequest::DeleteProject {
        project_id: project_id.to_string(),
    })
    .await?;
    info!(project = %project_id, "project deleted");
    Ok(())
}

/// Assign a chat to a project, or unassign it with `None`.
pub async fn move_chat(
    ctx: &ContentContext,
    conversation_id: &str,
    project_id: Option<&str>,
) -> Result<(), SyncError> {
    apply(ctx, BackgroundRequest::MoveChat {
        conversation_id: conversation_id.to_string(),
        project_id: project_id.map(str::to_string),
    })
    .await?;
    debug!(conversation = %conversation_id, project = ?project_id, "chat moved");
    Ok(())
}

pub async fn remove_from_project(ctx: &ContentContext, conversation_id: &str) -> Result<(), SyncError> {
    move_chat(ctx, conversation_id, None).await
}

/// Persist the panel's collapsed state.
pub async fn set_projects_collapsed(ctx: &ContentContext, collapsed: bool) -> Result<(), SyncError> {
    apply(ctx, BackgroundRequest::UpdateUiPrefs {
        prefs: UiPrefsPatch {
            projects_collapsed: Some(collapsed),
        },
    })
    .await?;
    Ok(())
}

/// Expand or collapse one project in the panel. Session-only.
pub fn toggle_project_expanded(ctx: &ContentContext, project_id: &str) -> bool {
    let expanded = ctx.session(|s| s.toggle_expanded(project_id));
    refresh_views(ctx);
    expanded
}

pub async fn export_project(ctx: &ContentContext, project_id: &str) -> Result<ProjectExport, SyncError> {
    let export = ctx
        .request(BackgroundRequest::ExportProject {
            project_id: project_id.to_string(),
        })
        .await?
        .into_export()?;
    debug!(file = %export.filename, "project exported");
    Ok(export)
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
