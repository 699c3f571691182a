//! Schema migration for stored documents.

use std::collections::BTreeMap;

use gemini_projects_protocols::{
    now_millis, ChatRef, Project, StoredState, UiPrefs, CURRENT_SCHEMA_VERSION,
};
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

/// Bring a raw stored document up to the current schema.
///
/// Anything unrecognisable (not an object, another schema version) starts
/// over with an empty state.
pub fn migrate_state(raw: Option<Value>) -> StoredState {
    let Some(Value::Object(doc)) = raw else {
        return StoredState::default();
    };
    let version = doc.get("schemaVersion").and_then(Value::as_u64);
    if version != Some(u64::from(CURRENT_SCHEMA_VERSION)) {
        warn!(?version, "unsupported schema version, starting empty");
        return StoredState::default();
    }

    let projects: Vec<Project> = match doc.get("projects") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|p| serde_json::from_value(p.clone()).ok())
            .collect(),
        _ => Vec::new(),
    };

    let mut chat_index = BTreeMap::new();
    if let Some(Value::Object(entries)) = doc.get("chatIndex") {
        for (key, value) in entries {
            if let Some(chat) = migrate_chat(key, value) {
                chat_index.insert(chat.conversation_id.clone(), chat);
            }
        }
    }

    let ui_prefs: UiPrefs = doc
        .get("uiPrefs")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default();

    debug!(projects = projects.len(), chats = chat_index.len(), "migrated state");
    StoredState {
        schema_version: CURRENT_SCHEMA_VERSION,
        projects,
        chat_index,
        ui_prefs,
    }
}

fn migrate_chat(key: &str, value: &Value) -> Option<ChatRef> {
    let entry = value.as_object()?;
    let conversation_id = entry
        .get("conversationId")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(key)
        .to_string();
    let (title, pinned_marker) =
        normalize_stored_title(entry.get("title").and_then(Value::as_str).unwrap_or(""));
    let updated_at = entry
        .get("updatedAt")
        .and_then(Value::as_i64)
        .or_else(|| entry.get("lastSeenAt").and_then(Value::as_i64))
        .unwrap_or_else(now_millis);

    Some(ChatRef {
        conversation_id,
        title,
        is_pinned: Some(
            entry
                .get("isPinned")
                .and_then(Value::as_bool)
                .unwrap_or(pinned_marker),
        ),
        project_id: entry
            .get("projectId")
            .and_then(Value::as_str)
            .map(str::to_string),
        updated_at,
        last_url: entry
            .get("lastUrl")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

/// Split a trailing "Pinned" marker older versions scraped into the title.
///
/// Returns the cleaned title and whether a marker was present.
pub fn normalize_stored_title(title: &str) -> (String, bool) {
    let source = title.trim();
    if source.is_empty() {
        return (String::new(), false);
    }
    match split_pinned(source) {
        Ok(split) => split,
        Err(e) => {
            warn!(error = %e, "pinned marker pattern rejected");
            (source.to_string(), false)
        }
    }
}

fn split_pinned(source: &str) -> Result<(String, bool), regex::Error> {
    let token = Regex::new(r"(?i)(?:\bpinned\b|已置顶|置顶)")?;
    let suffixes = [
        Regex::new(r"(?i)\s*(?:[-–—|·•]?\s*)?pinned(?:\.{3}|…)?\s*$")?,
        Regex::new(r"\s*(?:[-–—|·•]?\s*)?(?:已置顶|置顶)(?:\.{3}|…)?\s*$")?,
    ];
    let pinned = token.is_match(source);

    let mut cleaned = source.to_string();
    for suffix in &suffixes {
        cleaned = suffix.replace(&cleaned, "").into_owned();
    }
    let cleaned = cleaned.trim();
    let title = if cleaned.is_empty() { source } else { cleaned };
    Ok((title.to_string(), pinned))
}
