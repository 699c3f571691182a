//! Persisted records: projects, chat references and UI preferences.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Schema version written into every stored document.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Icon tag for a project. Rendering the glyph is the icon catalog's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectIcon {
    Investing,
    Homework,
    Writing,
    Travel,
    Health,
    Coding,
    Research,
    #[default]
    Default,
    Phone,
    Pen,
    Terminal,
    Music,
    Popcorn,
    Palette,
    Flower,
    Lotus,
    Briefcase,
    Chart,
    Apple,
    Dumbbell,
    Notebook,
    Scale,
    Globe,
    Airplane,
    World,
    Paw,
    People,
    Beaker,
    Clover,
    Heart,
}

impl ProjectIcon {
    /// Tag as written to storage and to `data-gp-icon` attributes.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Investing => "investing",
            Self::Homework => "homework",
            Self::Writing => "writing",
            Self::Travel => "travel",
            Self::Health => "health",
            Self::Coding => "coding",
            Self::Research => "research",
            Self::Default => "default",
            Self::Phone => "phone",
            Self::Pen => "pen",
            Self::Terminal => "terminal",
            Self::Music => "music",
            Self::Popcorn => "popcorn",
            Self::Palette => "palette",
            Self::Flower => "flower",
            Self::Lotus => "lotus",
            Self::Briefcase => "briefcase",
            Self::Chart => "chart",
            Self::Apple => "apple",
            Self::Dumbbell => "dumbbell",
            Self::Notebook => "notebook",
            Self::Scale => "scale",
            Self::Globe => "globe",
            Self::Airplane => "airplane",
            Self::World => "world",
            Self::Paw => "paw",
            Self::People => "people",
            Self::Beaker => "beaker",
            Self::Clover => "clover",
            Self::Heart => "heart",
        }
    }
}

/// A user-created project. Owned by the extension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Opaque identifier, unique across all projects.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: ProjectIcon,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default)]
    pub sort_index: i64,
}

impl Project {
    /// Create a project with a fresh id.
    pub fn new(name: impl Into<String>, icon: ProjectIcon, color: Option<String>, sort_index: i64) -> Self {
        let now = now_millis();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            icon,
            color,
            created_at: now,
            updated_at: now,
            sort_index,
        }
    }
}

/// One conversation the host has revealed.
///
/// `project_id == None` means unassigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRef {
    pub conversation_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_pinned: Option<bool>,
    #[serde(default)]
    pub project_id: Option<String>,
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_url: Option<String>,
}

/// A chat observation scraped from the host DOM or a link click.
///
/// Deliberately has no project field: DOM scans can never change assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRefPatch {
    pub conversation_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_pinned: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_url: Option<String>,
}

impl ChatRefPatch {
    /// Observation stamped with the current time.
    pub fn observed(conversation_id: impl Into<String>, title: impl Into<String>, last_url: Option<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            title: title.into(),
            is_pinned: None,
            updated_at: Some(now_millis()),
            last_url,
        }
    }
}

impl ChatRef {
    /// Last-write-wins merge of an observation into an existing record.
    ///
    /// Assignment and pin state survive; an empty observed title keeps the
    /// stored one.
    pub fn merge(existing: Option<&ChatRef>, patch: &ChatRefPatch) -> ChatRef {
        let title = if patch.title.trim().is_empty() {
            existing.map(|c| c.title.clone()).unwrap_or_default()
        } else {
            patch.title.clone()
        };
        ChatRef {
            conversation_id: patch.conversation_id.clone(),
            title,
            is_pinned: patch
                .is_pinned
                .or_else(|| existing.and_then(|c| c.is_pinned))
                .or(Some(false)),
            project_id: existing.and_then(|c| c.project_id.clone()),
            updated_at: patch
                .updated_at
                .or_else(|| existing.map(|c| c.updated_at))
                .unwrap_or_else(now_millis),
            last_url: patch
                .last_url
                .clone()
                .or_else(|| existing.and_then(|c| c.last_url.clone())),
        }
    }
}

/// Small persisted UI preference set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiPrefs {
    #[serde(default)]
    pub projects_collapsed: bool,
}

/// Partial update for [`UiPrefs`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiPrefsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projects_collapsed: Option<bool>,
}

impl UiPrefs {
    pub fn apply(&mut self, patch: &UiPrefsPatch) {
        if let Some(collapsed) = patch.projects_collapsed {
            self.projects_collapsed = collapsed;
        }
    }
}

/// The single logical document persisted per installation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredState {
    pub schema_version: u32,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub chat_index: BTreeMap<String, ChatRef>,
    #[serde(default)]
    pub ui_prefs: UiPrefs,
}

impl Default for StoredState {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            projects: Vec::new(),
            chat_index: BTreeMap::new(),
            ui_prefs: UiPrefs::default(),
        }
    }
}

impl StoredState {
    /// Look up a project by id.
    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    /// Effective assignment of a chat. References to deleted projects read as
    /// unassigned.
    pub fn chat_project_id(&self, conversation_id: &str) -> Option<&str> {
        let project_id = self.chat_index.get(conversation_id)?.project_id.as_deref()?;
        self.project(project_id).map(|p| p.id.as_str())
    }

    /// Chats assigned to a project, newest first.
    pub fn chats_in_project(&self, project_id: &str) -> Vec<&ChatRef> {
        let mut chats: Vec<_> = self
            .chat_index
            .values()
            .filter(|c| c.project_id.as_deref() == Some(project_id))
            .collect();
        chats.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        chats
    }

    /// Projects ordered for display.
    pub fn sorted_projects(&self) -> Vec<&Project> {
        let mut projects: Vec<_> = self.projects.iter().collect();
        projects.sort_by_key(|p| p.sort_index);
        projects
    }

    /// Sort index for a newly created project (appended last).
    pub fn next_sort_index(&self) -> i64 {
        self.projects
            .iter()
            .map(|p| p.sort_index + 1)
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
