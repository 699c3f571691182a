//! Prompt library: tag normalisation, migration of stored libraries and the
//! pure transitions behind each library operation.

use std::collections::{BTreeMap, HashSet};

use gemini_projects_protocols::{
    now_millis, Prompt, PromptDraft, PromptLibrary, TagColor, TagMeta, PROMPT_LIBRARY_VERSION,
};
use regex::{Captures, Regex};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::StoreError;

/// Prompts a fresh library starts with: title, content, tags.
pub const SEED_PROMPTS: [(&str, &str, &[&str]); 4] = [
    (
        "Summarize",
        "Please summarize the following text into bullet points, capturing the key insights and main arguments:",
        &["writing", "summary"],
    ),
    (
        "Code Review",
        "Review the following code for bugs, performance issues, and best practices. Suggest improvements with code examples:",
        &["coding", "review"],
    ),
    (
        "Bug Fix",
        "I am encountering a bug. Here is the error message: \"{{error}}\". Here is the relevant code snippet: \"{{code}}\". Please analyze the root cause and provide a fix.",
        &["coding", "debug"],
    ),
    (
        "Email Polish",
        "Rewrite the following email to be more professional and concise, while maintaining a friendly tone:",
        &["writing", "email"],
    ),
];

/// Clean a tag name typed by the user or left behind by older versions:
/// HTML entities are decoded, stray `<span>` markup dropped and whitespace
/// collapsed. An empty result means the tag is unusable.
pub fn normalize_tag_name(raw: &str) -> String {
    match clean_tag(raw) {
        Ok(clean) => clean,
        Err(e) => {
            warn!(error = %e, "tag pattern rejected");
            collapse_whitespace(raw)
        }
    }
}

fn clean_tag(raw: &str) -> Result<String, regex::Error> {
    let entity = Regex::new(r"(?i)&(lt|gt|nbsp|amp|quot|#39);")?;
    let decoded = entity.replace_all(raw, |caps: &Captures| {
        match caps[1].to_ascii_lowercase().as_str() {
            "lt" => "<",
            "gt" => ">",
            "nbsp" => " ",
            "amp" => "&",
            "quot" => "\"",
            _ => "'",
        }
        .to_string()
    });
    let span = Regex::new(r"(?i)<\s*/?\s*span[^>]*>")?;
    Ok(collapse_whitespace(&span.replace_all(&decoded, " ")))
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalise every tag, dropping empties and repeats. Order is kept.
pub fn normalize_tags<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.iter()
        .map(|t| normalize_tag_name(t.as_ref()))
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect()
}

/// Add the seed prompts when the library has none.
pub fn seed(library: &mut PromptLibrary) {
    if !library.prompts.is_empty() {
        return;
    }
    for (title, content, tags) in SEED_PROMPTS {
        let prompt = Prompt::new(title, content, tags.iter().map(|t| t.to_string()).collect());
        register_tags(library, &prompt.tags);
        library.prompts.insert(prompt.id.clone(), prompt);
    }
    debug!(count = SEED_PROMPTS.len(), "prompt library seeded");
}

/// Give every tag without metadata the gray colour.
fn register_tags(library: &mut PromptLibrary, tags: &[String]) {
    for tag in tags {
        library
            .tag_meta
            .entry(tag.clone())
            .or_insert_with(|| TagMeta::new(tag.clone(), TagColor::Gray));
    }
}

/// Bring a raw stored library up to date.
///
/// Nothing stored yields a seeded library. Otherwise prompts are kept with
/// their tags normalised, malformed prompts are dropped, tag metadata is
/// rekeyed by normalised name and every tag in use gets metadata. The flag
/// reports whether the result differs from what was stored.
pub fn migrate_library(raw: Option<Value>) -> (PromptLibrary, bool) {
    let Some(raw) = raw.filter(|v| !v.is_null()) else {
        let mut library = PromptLibrary::default();
        seed(&mut library);
        return (library, true);
    };

    let mut dirty = false;
    let mut library = PromptLibrary::default();

    match raw.get("prompts").and_then(Value::as_object) {
        Some(prompts) => {
            for (key, entry) in prompts {
                match migrate_prompt(entry) {
                    Some((prompt, changed)) => {
                        dirty |= changed || prompt.id != *key;
                        library.prompts.insert(prompt.id.clone(), prompt);
                    }
                    None => {
                        warn!(prompt = %key, "dropping malformed stored prompt");
                        dirty = true;
                    }
                }
            }
        }
        None => dirty = true,
    }

    match raw.get("tagMeta").and_then(Value::as_object) {
        Some(meta) => {
            for (raw_name, entry) in meta {
                dirty |= merge_tag_meta(&mut library.tag_meta, raw_name, entry);
            }
        }
        None => dirty = true,
    }

    let in_use: Vec<String> = library
        .prompts
        .values()
        .flat_map(|p| p.tags.iter().cloned())
        .collect();
    let known = library.tag_meta.len();
    register_tags(&mut library, &in_use);
    dirty |= library.tag_meta.len() != known;

    if raw.get("version").and_then(Value::as_u64) != Some(u64::from(PROMPT_LIBRARY_VERSION)) {
        dirty = true;
    }
    (library, dirty)
}

fn migrate_prompt(entry: &Value) -> Option<(Prompt, bool)> {
    let mut entry = entry.as_object()?.clone();
    let stored_tags: Vec<String> = match entry.remove("tags") {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|t| match t {
                Value::String(s) => Some(s),
                Value::Number(n) => Some(n.to_string()),
                Value::Bool(b) => Some(b.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };
    let mut prompt: Prompt = serde_json::from_value(Value::Object(entry)).ok()?;
    prompt.tags = normalize_tags(&stored_tags);
    let changed = prompt.tags != stored_tags;
    Some((prompt, changed))
}

/// Fold one stored metadata entry in. Returns whether anything was cleaned.
fn merge_tag_meta(tag_meta: &mut BTreeMap<String, TagMeta>, raw_name: &str, entry: &Value) -> bool {
    let name = normalize_tag_name(raw_name);
    if name.is_empty() {
        return true;
    }
    let stored_color = entry.get("color").and_then(Value::as_str).and_then(TagColor::parse);
    let color = stored_color.unwrap_or_default();
    let mut dirty = name != raw_name
        || stored_color.is_none()
        || entry.get("name").and_then(Value::as_str) != Some(name.as_str());

    match tag_meta.get_mut(&name) {
        None => {
            tag_meta.insert(name.clone(), TagMeta::new(name, color));
        }
        Some(existing) => {
            if existing.color == TagColor::Gray && color != TagColor::Gray {
                existing.color = color;
            }
            dirty = true;
        }
    }
    dirty
}

/// Create a prompt, or update the one the draft names. Returns the saved
/// prompt.
pub fn save_prompt(library: &mut PromptLibrary, draft: PromptDraft) -> Result<Prompt, StoreError> {
    let title = draft.title.trim();
    if title.is_empty() {
        return Err(StoreError::InvalidRequest("prompt title is empty".to_string()));
    }
    let tags = normalize_tags(&draft.tags);
    let existing = draft.id.as_deref().and_then(|id| library.prompts.get(id));

    let prompt = match existing {
        Some(existing) => Prompt {
            title: title.to_string(),
            content: draft.content,
            tags,
            updated_at: now_millis(),
            is_favorite: draft.is_favorite.unwrap_or(existing.is_favorite),
            ..existing.clone()
        },
        None => Prompt {
            is_favorite: draft.is_favorite.unwrap_or(false),
            ..Prompt::new(title, draft.content, tags)
        },
    };
    register_tags(library, &prompt.tags);
    library.prompts.insert(prompt.id.clone(), prompt.clone());
    Ok(prompt)
}

/// Remove a prompt. Returns whether it existed.
pub fn delete_prompt(library: &mut PromptLibrary, prompt_id: &str) -> bool {
    library.prompts.remove(prompt_id).is_some()
}

/// Record one use of a prompt.
pub fn touch_prompt(library: &mut PromptLibrary, prompt_id: &str) -> Result<Prompt, StoreError> {
    let prompt = library
        .prompts
        .get_mut(prompt_id)
        .ok_or_else(|| StoreError::PromptNotFound(prompt_id.to_string()))?;
    prompt.usage_count += 1;
    prompt.last_used_at = now_millis();
    Ok(prompt.clone())
}

/// Flip the favourite flag. Returns the new value.
pub fn toggle_favorite(library: &mut PromptLibrary, prompt_id: &str) -> Result<bool, StoreError> {
    let prompt = library
        .prompts
        .get_mut(prompt_id)
        .ok_or_else(|| StoreError::PromptNotFound(prompt_id.to_string()))?;
    prompt.is_favorite = !prompt.is_favorite;
    Ok(prompt.is_favorite)
}

/// Colour of a tag, assigning a random one the first time it is asked for.
/// Unusable names are gray and never stored.
pub fn ensure_tag_color(library: &mut PromptLibrary, name: &str) -> TagColor {
    let name = normalize_tag_name(name);
    if name.is_empty() {
        return TagColor::Gray;
    }
    library
        .tag_meta
        .entry(name.clone())
        .or_insert_with(|| TagMeta::new(name, TagColor::random()))
        .color
}

/// Returns false when the name is unusable.
pub fn set_tag_color(library: &mut PromptLibrary, name: &str, color: TagColor) -> bool {
    let name = normalize_tag_name(name);
    if name.is_empty() {
        return false;
    }
    library.tag_meta.insert(name.clone(), TagMeta::new(name, color));
    true
}

/// Rename a tag on every prompt, carrying its colour over unless the new
/// name already has one. Returns false when nothing was renamed.
pub fn rename_tag(library: &mut PromptLibrary, old_name: &str, new_name: &str) -> bool {
    let old = normalize_tag_name(old_name);
    let new = normalize_tag_name(new_name);
    if old.is_empty() || new.is_empty() || old == new {
        return false;
    }
    for prompt in library.prompts.values_mut() {
        if prompt.tags.contains(&old) {
            let renamed: Vec<String> = prompt
                .tags
                .iter()
                .map(|t| if *t == old { new.clone() } else { t.clone() })
                .collect();
            prompt.tags = normalize_tags(&renamed);
        }
    }
    let color = library.tag_meta.remove(&old).map(|m| m.color).unwrap_or_default();
    library
        .tag_meta
        .entry(new.clone())
        .or_insert_with(|| TagMeta::new(new, color));
    true
}

/// Remove a tag from every prompt and forget its colour. Returns how many
/// prompts carried it.
pub fn delete_tag(library: &mut PromptLibrary, name: &str) -> usize {
    let name = normalize_tag_name(name);
    if name.is_empty() {
        return 0;
    }
    let mut touched = 0;
    for prompt in library.prompts.values_mut() {
        let before = prompt.tags.len();
        prompt.tags.retain(|t| *t != name);
        if prompt.tags.len() != before {
            touched += 1;
        }
    }
    library.tag_meta.remove(&name);
    touched
}

#[cfg(test)]
#[path = "library_tests.rs"]
mod tests;
