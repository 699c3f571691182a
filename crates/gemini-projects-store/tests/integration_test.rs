//! File-backed state service across restarts.

use std::sync::Arc;

use gemini_projects_config::StorageConfig;
use gemini_projects_protocols::{BackgroundRequest, ChatRefPatch, Project, ProjectIcon};
use gemini_projects_store::{FileStateStore, StateService};
use tempfile::TempDir;

async fn open(dir: &TempDir) -> StateService {
    let config = StorageConfig {
        dir: dir.path().to_path_buf(),
        ..StorageConfig::default()
    };
    let store = FileStateStore::from_config(&config).await.unwrap();
    StateService::new(Arc::new(store))
}

#[tokio::test]
async fn test_state_survives_restart() {
    let dir = TempDir::new().unwrap();
    let project = Project::new("Travel", ProjectIcon::Travel, None, 0);
    let project_id = project.id.clone();

    {
        let service = open(&dir).await;
        service.handle(BackgroundRequest::UpsertProject { project }).await;
        service
            .handle(BackgroundRequest::UpsertChatRefs {
                chats: ["aaa11111", "bbb22222", "ccc33333"]
                    .iter()
                    .map(|id| ChatRefPatch::observed(*id, format!("Chat {id}"), Some(format!("/app/{id}"))))
                    .collect(),
            })
            .await;
        let response = service
            .handle(BackgroundRequest::MoveChat {
                conversation_id: "aaa11111".to_string(),
                project_id: Some(project_id.clone()),
            })
            .await;
        assert!(response.ok);
    }

    let service = open(&dir).await;
    let state = service.state().await;
    assert_eq!(state.projects.len(), 1);
    assert_eq!(state.chat_index.len(), 3);
    assert_eq!(state.chat_project_id("aaa11111"), Some(project_id.as_str()));
    assert_eq!(state.chat_project_id("bbb22222"), None);

    // Deleting the project after a restart unassigns its chats on disk too.
    service
        .handle(BackgroundRequest::DeleteProject {
            project_id: project_id.clone(),
        })
        .await;
    let reopened = open(&dir).await.state().await;
    assert!(reopened.projects.is_empty());
    assert!(reopened.chat_index["aaa11111"].project_id.is_none());
}

#[tokio::test]
async fn test_legacy_document_migrated_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(StorageConfig::default().state_file);
    std::fs::write(
        &path,
        r#"{
            "schemaVersion": 1,
            "projects": [],
            "chatIndex": {
                "aaa11111": { "title": "Trip planning Pinned", "lastSeenAt": 1700000000000 }
            }
        }"#,
    )
    .unwrap();

    let state = open(&dir).await.state().await;
    let chat = &state.chat_index["aaa11111"];
    assert_eq!(chat.title, "Trip planning");
    assert_eq!(chat.is_pinned, Some(true));
    assert_eq!(chat.updated_at, 1_700_000_000_000);
}
