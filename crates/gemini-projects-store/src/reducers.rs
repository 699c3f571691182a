//! Pure state transitions behind each mutating request.

use gemini_projects_protocols::{
    now_millis, BackgroundRequest, ChatRef, ChatRefPatch, Project, ProjectExport, StoredState,
    UiPrefsPatch,
};
use serde_json::json;

use crate::error::StoreError;

/// Insert a project, or merge into the one with the same id.
pub fn upsert_project(state: &mut StoredState, project: Project) {
    match state.projects.iter_mut().find(|p| p.id == project.id) {
        Some(existing) => *existing = project,
        None => state.projects.push(project),
    }
}

pub fn rename_project(state: &mut StoredState, project_id: &str, name: &str) -> Result<(), StoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StoreError::InvalidRequest("project name is empty".to_string()));
    }
    let project = state
        .projects
        .iter_mut()
        .find(|p| p.id == project_id)
        .ok_or_else(|| StoreError::ProjectNotFound(project_id.to_string()))?;
    project.name = name.to_string();
    project.updated_at = now_millis();
    Ok(())
}

/// Remove a project and unassign its chats. Deleting an unknown id is a
/// no-op. Returns how many chats were unassigned.
pub fn delete_project(state: &mut StoredState, project_id: &str) -> usize {
    state.projects.retain(|p| p.id != project_id);
    let mut unassigned = 0;
    for chat in state.chat_index.values_mut() {
        if chat.project_id.as_deref() == Some(project_id) {
            chat.project_id = None;
            unassigned += 1;
        }
    }
    unassigned
}

/// Assign a chat to a project (`None` unassigns), creating the record when
/// the chat was never observed.
pub fn move_chat(
    state: &mut StoredState,
    conversation_id: &str,
    project_id: Option<&str>,
) -> Result<(), StoreError> {
    if conversation_id.trim().is_empty() {
        return Err(StoreError::InvalidRequest("conversation id is empty".to_string()));
    }
    if let Some(id) = project_id {
        if state.project(id).is_none() {
            return Err(StoreError::ProjectNotFound(id.to_string()));
        }
    }
    let existing = state.chat_index.get(conversation_id);
    let chat = ChatRef {
        conversation_id: conversation_id.to_string(),
        title: existing.map(|c| c.title.clone()).unwrap_or_default(),
        is_pinned: Some(existing.and_then(|c| c.is_pinned).unwrap_or(false)),
        project_id: project_id.map(str::to_string),
        updated_at: now_millis(),
        last_url: existing.and_then(|c| c.last_url.clone()),
    };
    state.chat_index.insert(conversation_id.to_string(), chat);
    Ok(())
}

/// Merge DOM observations. Assignment is never touched.
pub fn upsert_chat_refs(state: &mut StoredState, chats: &[ChatRefPatch]) {
    for patch in chats.iter().filter(|p| !p.conversation_id.is_empty()) {
        let merged = ChatRef::merge(state.chat_index.get(&patch.conversation_id), patch);
        state.chat_index.insert(patch.conversation_id.clone(), merged);
    }
}

pub fn update_ui_prefs(state: &mut StoredState, prefs: &UiPrefsPatch) {
    state.ui_prefs.apply(prefs);
}

/// Apply a mutating request.
pub fn apply(state: &mut StoredState, request: BackgroundRequest) -> Result<(), StoreError> {
    match request {
        BackgroundRequest::UpsertProject { project } => upsert_project(state, project),
        BackgroundRequest::RenameProject { project_id, name } => {
            rename_project(state, &project_id, &name)?
        }
        BackgroundRequest::DeleteProject { project_id } => {
            delete_project(state, &project_id);
        }
        BackgroundRequest::MoveChat {
            conversation_id,
            project_id,
        } => move_chat(state, &conversation_id, project_id.as_deref())?,
        BackgroundRequest::UpsertChatRefs { chats } => upsert_chat_refs(state, &chats),
        BackgroundRequest::UpdateUiPrefs { prefs } => update_ui_prefs(state, &prefs),
        other => {
            return Err(StoreError::InvalidRequest(format!(
                "{} does not modify state",
                other.kind()
            )));
        }
    }
    Ok(())
}

/// Backup payload for one project and the chats assigned to it.
pub fn export_project(state: &StoredState, project_id: &str) -> Result<ProjectExport, StoreError> {
    let project = state
        .project(project_id)
        .ok_or_else(|| StoreError::ProjectNotFound(project_id.to_string()))?;
    let chats: Vec<_> = state
        .chat_index
        .values()
        .filter(|c| c.project_id.as_deref() == Some(project_id))
        .map(|c| json!({ "conversationId": c.conversation_id, "title": c.title }))
        .collect();
    let payload = json!({
        "project": {
            "id": project.id,
            "name": project.name,
            "icon": project.icon,
            "color": project.color,
            "createdAt": project.created_at,
            "updatedAt": project.updated_at,
            "sortIndex": project.sort_index,
        },
        "chats": chats,
    });
    Ok(ProjectExport {
        filename: format!("{}.json", sanitize_filename(&project.name)),
        json: serde_json::to_string_pretty(&payload)?,
    })
}

/// Runs of characters outside `[A-Za-z0-9_-]` become one `_`; edges are
/// trimmed; an empty result becomes `project`.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_run = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "project".to_string()
    } else {
        trimmed.to_string()
    }
}
