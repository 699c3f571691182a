//! Prompt library records: saved prompts and per-tag metadata.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::now_millis;

/// Version written into every stored prompt library.
pub const PROMPT_LIBRARY_VERSION: u32 = 1;

/// Named colour a tag chip is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagColor {
    #[default]
    Gray,
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
    Pink,
}

impl TagColor {
    pub const ALL: [TagColor; 8] = [
        Self::Gray,
        Self::Red,
        Self::Orange,
        Self::Yellow,
        Self::Green,
        Self::Blue,
        Self::Purple,
        Self::Pink,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gray => "gray",
            Self::Red => "red",
            Self::Orange => "orange",
            Self::Yellow => "yellow",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Purple => "purple",
            Self::Pink => "pink",
        }
    }

    /// Exact colour name, as stored.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }

    /// Chip background and foreground.
    pub fn palette(self) -> (&'static str, &'static str) {
        match self {
            Self::Gray => ("rgba(31,31,31,0.14)", "#1f1f1f"),
            Self::Red => ("rgba(232,92,92,0.15)", "#E85C5C"),
            Self::Orange => ("rgba(249,115,22,0.15)", "#F97316"),
            Self::Yellow => ("rgba(245,158,11,0.15)", "#F59E0B"),
            Self::Green => ("rgba(34,197,94,0.15)", "#22C55E"),
            Self::Blue => ("rgba(59,130,246,0.15)", "#3B82F6"),
            Self::Purple => ("rgba(139,92,246,0.15)", "#8B5CF6"),
            Self::Pink => ("rgba(236,72,153,0.15)", "#EC4899"),
        }
    }

    /// Any colour of the palette.
    pub fn random() -> Self {
        let byte = uuid::Uuid::new_v4().as_bytes()[0];
        Self::ALL[byte as usize % Self::ALL.len()]
    }
}

/// A saved prompt.
///
/// `last_used_at == 0` means never used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default)]
    pub usage_count: u64,
    #[serde(default)]
    pub last_used_at: i64,
    #[serde(default)]
    pub is_favorite: bool,
}

impl Prompt {
    /// Create an unused prompt with a fresh id.
    pub fn new(title: impl Into<String>, content: impl Into<String>, tags: Vec<String>) -> Self {
        let now = now_millis();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            content: content.into(),
            tags,
            created_at: now,
            updated_at: now,
            usage_count: 0,
            last_used_at: 0,
            is_favorite: false,
        }
    }
}

/// Colour assigned to one tag name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagMeta {
    pub name: String,
    pub color: TagColor,
}

impl TagMeta {
    pub fn new(name: impl Into<String>, color: TagColor) -> Self {
        Self {
            name: name.into(),
            color,
        }
    }
}

/// A tag with how many prompts carry it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSummary {
    pub name: String,
    pub count: usize,
    pub color: TagColor,
}

/// Fields of a prompt the editor submits.
///
/// With `id` naming an existing prompt the draft updates it; otherwise a new
/// prompt is created. `is_favorite: None` keeps the current flag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptDraft {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_favorite: Option<bool>,
}

impl PromptDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Draft that edits the prompt with `id`.
    pub fn editing(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// The stored prompt library document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptLibrary {
    #[serde(default)]
    pub prompts: BTreeMap<String, Prompt>,
    #[serde(default)]
    pub tag_meta: BTreeMap<String, TagMeta>,
    #[serde(default = "default_version")]
    pub version: u32,
}

fn default_version() -> u32 {
    PROMPT_LIBRARY_VERSION
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self {
            prompts: BTreeMap::new(),
            tag_meta: BTreeMap::new(),
            version: PROMPT_LIBRARY_VERSION,
        }
    }
}

impl PromptLibrary {
    pub fn get(&self, id: &str) -> Option<&Prompt> {
        self.prompts.get(id)
    }

    /// Favourites first, then most recently used. Ties keep id order.
    pub fn sorted(&self) -> Vec<&Prompt> {
        let mut prompts: Vec<&Prompt> = self.prompts.values().collect();
        prompts.sort_by(|a, b| {
            b.is_favorite
                .cmp(&a.is_favorite)
                .then(b.last_used_at.cmp(&a.last_used_at))
        });
        prompts
    }

    /// Colour of an already normalised tag name. Unknown tags are gray.
    pub fn tag_color(&self, name: &str) -> TagColor {
        self.tag_meta.get(name).map(|m| m.color).unwrap_or_default()
    }

    /// Every tag in use or with metadata, most used first, then by name.
    pub fn tag_summaries(&self) -> Vec<TagSummary> {
        let mut counts: BTreeMap<&str, usize> = self.tag_meta.keys().map(|k| (k.as_str(), 0)).collect();
        for prompt in self.prompts.values() {
            for tag in &prompt.tags {
                *counts.entry(tag.as_str()).or_insert(0) += 1;
            }
        }
        let mut tags: Vec<TagSummary> = counts
            .into_iter()
            .map(|(name, count)| TagSummary {
                name: name.to_string(),
                count,
                color: self.tag_color(name),
            })
            .collect();
        tags.sort_by(|a, b| b.count.cmp(&a.count));
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn prompt(id: &str, favorite: bool, last_used_at: i64) -> Prompt {
        Prompt {
            id: id.to_string(),
            is_favorite: favorite,
            last_used_at,
            ..Prompt::new(id, "", Vec::new())
        }
    }

    fn library(prompts: Vec<Prompt>) -> PromptLibrary {
        PromptLibrary {
            prompts: prompts.into_iter().map(|p| (p.id.clone(), p)).collect(),
            ..PromptLibrary::default()
        }
    }

    #[test]
    fn test_sorted_favourites_then_recent() {
        let lib = library(vec![
            prompt("a", false, 0),
            prompt("b", false, 30),
            prompt("c", true, 10),
            prompt("d", true, 20),
            prompt("e", false, 0),
        ]);
        let ids: Vec<_> = lib.sorted().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["d", "c", "b", "a", "e"]);
    }

    #[test]
    fn test_tag_summaries_count_and_include_unused_meta() {
        let mut a = prompt("a", false, 0);
        a.tags = vec!["coding".into(), "debug".into()];
        let mut b = prompt("b", false, 0);
        b.tags = vec!["coding".into()];
        let mut lib = library(vec![a, b]);
        lib.tag_meta.insert("coding".into(), TagMeta::new("coding", TagColor::Blue));
        lib.tag_meta.insert("unused".into(), TagMeta::new("unused", TagColor::Red));

        let tags = lib.tag_summaries();
        assert_eq!(tags[0].name, "coding");
        assert_eq!(tags[0].count, 2);
        assert_eq!(tags[0].color, TagColor::Blue);
        assert_eq!(tags[1].name, "debug");
        assert_eq!(tags[1].color, TagColor::Gray);
        assert_eq!(tags[2].name, "unused");
        assert_eq!(tags[2].count, 0);
    }

    #[test]
    fn test_library_wire_shape() {
        let mut p = prompt("p1", true, 5);
        p.usage_count = 2;
        let mut lib = library(vec![p]);
        lib.tag_meta.insert("email".into(), TagMeta::new("email", TagColor::Pink));

        let value = serde_json::to_value(&lib).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["prompts"]["p1"]["usageCount"], 2);
        assert_eq!(value["prompts"]["p1"]["lastUsedAt"], 5);
        assert_eq!(value["prompts"]["p1"]["isFavorite"], true);
        assert_eq!(value["tagMeta"]["email"], json!({ "name": "email", "color": "pink" }));
    }

    #[test]
    fn test_tag_color_parse_and_palette() {
        assert_eq!(TagColor::parse("purple"), Some(TagColor::Purple));
        assert_eq!(TagColor::parse("Purple"), None);
        assert_eq!(TagColor::Blue.palette().1, "#3B82F6");
        assert!(TagColor::ALL.contains(&TagColor::random()));
    }
}
