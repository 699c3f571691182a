//! Request/response protocol between the content side and the persistence
//! collaborator.
//!
//! Requests are tagged by `type` in camelCase so they read the same on the
//! wire as the messages exchanged with a background context.

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::model::{ChatRefPatch, Project, StoredState, UiPrefsPatch};

/// A request to the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum BackgroundRequest {
    GetState,
    UpsertProject { project: Project },
    RenameProject { project_id: String, name: String },
    DeleteProject { project_id: String },
    /// `project_id: None` removes the chat from its project.
    MoveChat {
        conversation_id: String,
        project_id: Option<String>,
    },
    UpsertChatRefs { chats: Vec<ChatRefPatch> },
    ExportProject { project_id: String },
    UpdateUiPrefs { prefs: UiPrefsPatch },
    RefreshStateCache,
}

impl BackgroundRequest {
    /// Wire name of the request, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::GetState => "getState",
            Self::UpsertProject { .. } => "upsertProject",
            Self::RenameProject { .. } => "renameProject",
            Self::DeleteProject { .. } => "deleteProject",
            Self::MoveChat { .. } => "moveChat",
            Self::UpsertChatRefs { .. } => "upsertChatRefs",
            Self::ExportProject { .. } => "exportProject",
            Self::UpdateUiPrefs { .. } => "updateUiPrefs",
            Self::RefreshStateCache => "refreshStateCache",
        }
    }

    /// Whether handling the request writes the stored document.
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            Self::GetState | Self::ExportProject { .. } | Self::RefreshStateCache
        )
    }
}

/// A project serialized for backup, plus the suggested file name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectExport {
    pub filename: String,
    pub json: String,
}

/// `{ ok: true, state?, ... } | { ok: false, error }`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<StoredState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BackgroundResponse {
    pub fn with_state(state: StoredState) -> Self {
        Self {
            ok: true,
            state: Some(state),
            ..Default::default()
        }
    }

    pub fn ok() -> Self {
        Self {
            ok: true,
            ..Default::default()
        }
    }

    pub fn export(export: ProjectExport) -> Self {
        Self {
            ok: true,
            json: Some(export.json),
            filename: Some(export.filename),
            ..Default::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// Check the `ok` flag, turning a failure into an error.
    pub fn into_result(self) -> Result<Self, ProtocolError> {
        if self.ok {
            Ok(self)
        } else {
            Err(ProtocolError::Persistence(
                self.error.unwrap_or_else(|| "unknown error".to_string()),
            ))
        }
    }

    /// The authoritative state carried by an ok response.
    pub fn into_state(self) -> Result<StoredState, ProtocolError> {
        self.into_result()?.state.ok_or(ProtocolError::MissingState)
    }

    /// The export payload carried by an ok `exportProject` response.
    pub fn into_export(self) -> Result<ProjectExport, ProtocolError> {
        let response = self.into_result()?;
        match (response.json, response.filename) {
            (Some(json), Some(filename)) => Ok(ProjectExport { filename, json }),
            _ => Err(ProtocolError::MissingState),
        }
    }
}
