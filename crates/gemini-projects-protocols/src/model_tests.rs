use super::*;

fn chat(id: &str, project: Option<&str>, updated_at: i64) -> ChatRef {
    ChatRef {
        conversation_id: id.to_string(),
        title: format!("Chat {}", id),
        is_pinned: Some(false),
        project_id: project.map(String::from),
        updated_at,
        last_url: None,
    }
}

fn project(id: &str, sort_index: i64) -> Project {
    Project {
        id: id.to_string(),
        name: id.to_uppercase(),
        icon: ProjectIcon::Coding,
        color: None,
        created_at: 1,
        updated_at: 1,
        sort_index,
    }
}

#[test]
fn test_merge_keeps_project_assignment() {
    let existing = chat("aaa11111", Some("p1"), 10);
    let patch = ChatRefPatch::observed("aaa11111", "Renamed in host", None);

    let merged = ChatRef::merge(Some(&existing), &patch);
    assert_eq!(merged.project_id.as_deref(), Some("p1"));
    assert_eq!(merged.title, "Renamed in host");
    assert!(merged.updated_at >= 10);
}

#[test]
fn test_merge_keeps_pin_and_title_when_absent() {
    let mut existing = chat("aaa11111", None, 10);
    existing.is_pinned = Some(true);
    existing.last_url = Some("https://gemini.google.com/app/aaa11111".to_string());
    let patch = ChatRefPatch {
        conversation_id: "aaa11111".to_string(),
        title: "   ".to_string(),
        is_pinned: None,
        updated_at: None,
        last_url: None,
    };

    let merged = ChatRef::merge(Some(&existing), &patch);
    assert_eq!(merged.title, "Chat aaa11111");
    assert_eq!(merged.is_pinned, Some(true));
    assert_eq!(merged.updated_at, 10);
    assert_eq!(merged.last_url, existing.last_url);
}

#[test]
fn test_merge_new_record_is_unassigned() {
    let patch = ChatRefPatch::observed("bbb22222", "Fresh", Some("/app/bbb22222".to_string()));
    let merged = ChatRef::merge(None, &patch);
    assert_eq!(merged.project_id, None);
    assert_eq!(merged.is_pinned, Some(false));
    assert_eq!(merged.last_url.as_deref(), Some("/app/bbb22222"));
}

#[test]
fn test_broken_reference_reads_as_unassigned() {
    let mut state = StoredState::default();
    state.projects.push(project("p1", 0));
    state.chat_index.insert("a".into(), chat("a", Some("p1"), 1));
    state.chat_index.insert("b".into(), chat("b", Some("gone"), 1));

    assert_eq!(state.chat_project_id("a"), Some("p1"));
    assert_eq!(state.chat_project_id("b"), None);
    assert_eq!(state.chat_project_id("missing"), None);
}

#[test]
fn test_chats_in_project_newest_first() {
    let mut state = StoredState::default();
    state.projects.push(project("p1", 0));
    state.chat_index.insert("a".into(), chat("a", Some("p1"), 5));
    state.chat_index.insert("b".into(), chat("b", Some("p1"), 50));
    state.chat_index.insert("c".into(), chat("c", None, 100));

    let ids: Vec<_> = state
        .chats_in_project("p1")
        .iter()
        .map(|c| c.conversation_id.as_str())
        .collect();
    assert_eq!(ids, vec!["b", "a"]);
}

#[test]
fn test_sorted_projects_and_next_index() {
    let mut state = StoredState::default();
    assert_eq!(state.next_sort_index(), 0);
    state.projects.push(project("second", 4));
    state.projects.push(project("first", 1));

    let order: Vec<_> = state.sorted_projects().iter().map(|p| p.id.as_str()).collect();
    assert_eq!(order, vec!["first", "second"]);
    assert_eq!(state.next_sort_index(), 5);
}

#[test]
fn test_stored_state_json_shape() {
    let mut state = StoredState::default();
    state.projects.push(project("p1", 0));
    state.chat_index.insert("a".into(), chat("a", Some("p1"), 1));

    let json = serde_json::to_value(&state).unwrap();
    assert_eq!(json["schemaVersion"], 1);
    assert_eq!(json["projects"][0]["sortIndex"], 0);
    assert_eq!(json["projects"][0]["icon"], "coding");
    assert_eq!(json["chatIndex"]["a"]["conversationId"], "a");
    assert_eq!(json["chatIndex"]["a"]["projectId"], "p1");
    assert_eq!(json["uiPrefs"]["projectsCollapsed"], false);
}

#[test]
fn test_unassigned_chat_serializes_null_project() {
    let json = serde_json::to_value(chat("a", None, 1)).unwrap();
    assert!(json["projectId"].is_null());
}

#[test]
fn test_ui_prefs_patch() {
    let mut prefs = UiPrefs::default();
    prefs.apply(&UiPrefsPatch { projects_collapsed: Some(true) });
    assert!(prefs.projects_collapsed);
    prefs.apply(&UiPrefsPatch::default());
    assert!(prefs.projects_collapsed);
}

#[test]
fn test_project_new_has_unique_ids() {
    let a = Project::new("A", ProjectIcon::default(), None, 0);
    let b = Project::new("B", ProjectIcon::default(), None, 1);
    assert_ne!(a.id, b.id);
    assert_eq!(a.icon, ProjectIcon::Default);
    assert_eq!(a.created_at, a.updated_at);
}

#[test]
fn test_icon_tag_matches_serde() {
    for icon in [ProjectIcon::Airplane, ProjectIcon::Default, ProjectIcon::Heart] {
        let json = serde_json::to_value(icon).unwrap();
        assert_eq!(json, icon.as_str());
    }
}
