use super::*;
use crate::testing::{harness, Harness};
use gemini_projects_dom::fixtures::{close_menu, open_menu, populate_menu, FixtureBuilder, MenuNodes, DEFAULT_MENU_ITEMS};
use gemini_projects_dom::markers::MOVE_ATTR;
use gemini_projects_dom::Selector;
use gemini_projects_protocols::{BackgroundRequest, Project, ProjectIcon};

fn setup() -> (Harness, MenuEnhancer) {
    let h = harness(FixtureBuilder::new().with_default_chats());
    let enhancer = MenuEnhancer::new(h.ctx.clone(), CancellationToken::new());
    (h, enhancer)
}

async fn settle(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

/// Press the first row's kebab and let the host open its menu 30ms later.
async fn open_first_row_menu(h: &Harness, enhancer: &mut MenuEnhancer) -> MenuNodes {
    let kebab = h.sidebar().rows[0].kebab;
    assert!(enhancer.on_pointer_down(kebab));
    settle(30).await;
    let menu = h.page().host(|doc| open_menu(doc, kebab, &DEFAULT_MENU_ITEMS));
    settle(70).await;
    menu
}

fn injected_items(h: &Harness) -> Vec<NodeId> {
    h.page().read().query_all_in_roots(&move_item())
}

#[tokio::test(start_paused = true)]
async fn test_kebab_interaction_injects_item() {
    let (h, mut enhancer) = setup();
    let menu = open_first_row_menu(&h, &mut enhancer).await;

    let items = injected_items(&h);
    assert_eq!(items.len(), 1);
    assert!(h.page().read().contains(menu.root, items[0]));
    assert_eq!(
        h.ctx.session(|s| s.menu.clone()),
        Some(OpenMenu {
            root: menu.root,
            conversation_id: "aaa11111".to_string(),
        })
    );
    assert!(enhancer.has_open_ui());
}

#[tokio::test(start_paused = true)]
async fn test_no_menu_means_no_item() {
    let (h, mut enhancer) = setup();
    let kebab = h.sidebar().rows[0].kebab;
    assert!(enhancer.on_pointer_down(kebab));
    enhancer.join_interaction().await;

    assert!(injected_items(&h).is_empty());
    assert!(!enhancer.has_open_ui());
}

#[tokio::test(start_paused = true)]
async fn test_non_kebab_pointer_down_is_ignored() {
    let (h, mut enhancer) = setup();
    let link = h.sidebar().rows[0].link;
    assert!(!enhancer.on_pointer_down(link));
    assert!(h.ctx.session(|s| s.active_row.is_none()));
}

#[tokio::test(start_paused = true)]
async fn test_reinjects_after_host_rerender() {
    let (h, mut enhancer) = setup();
    let mut menu = open_first_row_menu(&h, &mut enhancer).await;

    h.page().host(|doc| populate_menu(doc, &mut menu, &DEFAULT_MENU_ITEMS));
    assert!(injected_items(&h).is_empty());
    settle(20).await;

    let items = injected_items(&h);
    assert_eq!(items.len(), 1);
    assert!(h.page().read().contains(menu.root, items[0]));
}

#[tokio::test(start_paused = true)]
async fn test_host_closing_menu_cleans_up() {
    let (h, mut enhancer) = setup();
    let menu = open_first_row_menu(&h, &mut enhancer).await;

    h.page().host(|doc| close_menu(doc, &menu));
    settle(20).await;

    assert!(h.ctx.session(|s| s.menu.is_none()));
    assert!(!enhancer.check_menu_closed());
}

#[tokio::test(start_paused = true)]
async fn test_closed_after_watch_window_is_caught_by_check() {
    let (h, mut enhancer) = setup();
    let menu = open_first_row_menu(&h, &mut enhancer).await;
    settle(1000).await;

    assert!(!enhancer.check_menu_closed());
    h.page().host(|doc| close_menu(doc, &menu));
    assert!(enhancer.check_menu_closed());
    assert!(h.ctx.session(|s| s.menu.is_none()));
}

#[tokio::test(start_paused = true)]
async fn test_outside_pointer_down_tears_down() {
    let (h, mut enhancer) = setup();
    let menu = open_first_row_menu(&h, &mut enhancer).await;

    // Inside the menu keeps it.
    assert!(!enhancer.on_pointer_down(menu.items[0]));
    assert_eq!(injected_items(&h).len(), 1);

    let body = h.page().read().body();
    assert!(!enhancer.on_pointer_down(body));
    assert!(injected_items(&h).is_empty());
    assert!(h.ctx.session(|s| s.menu.is_none() && s.active_row.is_none()));
}

#[tokio::test(start_paused = true)]
async fn test_submenu_choice_becomes_move_command() {
    let (h, mut enhancer) = setup();
    let project = Project::new("Work", ProjectIcon::Briefcase, None, 0);
    h.ctx
        .request_state(BackgroundRequest::UpsertProject {
            project: project.clone(),
        })
        .await
        .unwrap();
    open_first_row_menu(&h, &mut enhancer).await;

    let item = injected_items(&h)[0];
    enhancer.on_pointer_enter(item);
    let submenu = h.ctx.session(|s| s.submenu).expect("submenu opened");
    let entries = h.page().read().query_all(submenu, &Selector::has_attr(MOVE_ATTR));
    // New Project, Work; unassigned so no remove entry.
    assert_eq!(entries.len(), 2);

    let outcome = enhancer.on_click(entries[1]);
    assert_eq!(
        outcome,
        ClickOutcome::Command(MenuCommand::Move {
            conversation_id: "aaa11111".to_string(),
            project_id: Some(project.id.clone()),
        })
    );
    assert!(injected_items(&h).is_empty());
    assert!(h.page().read().element_by_id(SUBMENU_ID).is_none());
    assert!(!enhancer.has_open_ui());
}

#[tokio::test(start_paused = true)]
async fn test_new_project_choice() {
    let (h, mut enhancer) = setup();
    open_first_row_menu(&h, &mut enhancer).await;

    let item = injected_items(&h)[0];
    assert_eq!(enhancer.on_click(item), ClickOutcome::Consumed);
    let submenu = h.ctx.session(|s| s.submenu).expect("click opens the submenu");
    let new_entry = h.page().read().query(submenu, &Selector::attr_eq(MOVE_ATTR, "new")).unwrap();

    assert_eq!(
        enhancer.on_click(new_entry),
        ClickOutcome::Command(MenuCommand::CreateProject {
            conversation_id: "aaa11111".to_string(),
        })
    );
}

#[tokio::test(start_paused = true)]
async fn test_submenu_close_grace() {
    let (h, mut enhancer) = setup();
    open_first_row_menu(&h, &mut enhancer).await;
    let item = injected_items(&h)[0];
    enhancer.on_pointer_enter(item);
    let submenu = h.ctx.session(|s| s.submenu).unwrap();

    // Moving from the item into the submenu keeps it open.
    enhancer.on_pointer_leave(item);
    settle(100).await;
    enhancer.on_pointer_enter(submenu);
    settle(300).await;
    assert!(h.page().read().is_connected(submenu));

    enhancer.on_pointer_leave(submenu);
    settle(250).await;
    assert!(!h.page().read().is_connected(submenu));
    assert!(h.ctx.session(|s| s.submenu.is_none()));
}

#[tokio::test(start_paused = true)]
async fn test_new_kebab_replaces_interaction() {
    let (h, mut enhancer) = setup();
    let first = open_first_row_menu(&h, &mut enhancer).await;
    h.page().host(|doc| close_menu(doc, &first));

    let second = h.sidebar().rows[1].kebab;
    assert!(enhancer.on_pointer_down(second));
    assert!(injected_items(&h).is_empty());
    let menu = h.page().host(|doc| open_menu(doc, second, &DEFAULT_MENU_ITEMS));
    settle(50).await;

    let items = injected_items(&h);
    assert_eq!(items.len(), 1);
    assert!(h.page().read().contains(menu.root, items[0]));
    assert_eq!(
        h.ctx.session(|s| s.menu.as_ref().map(|m| m.conversation_id.clone())),
        Some("bbb22222".to_string())
    );
}

#[tokio::test(start_paused = true)]
async fn test_cancel_between_injection_and_commit_removes_item() {
    let (h, _enhancer) = setup();
    let kebab = h.sidebar().rows[0].kebab;
    let menu = h.page().host(|doc| open_menu(doc, kebab, &DEFAULT_MENU_ITEMS));
    let injected = inject_with_retries(&h.ctx, menu.root, Some(kebab))
        .await
        .expect("item injected");
    assert_eq!(injected_items(&h).len(), 1);

    let cancel = CancellationToken::new();
    cancel.cancel();
    assert!(!commit_menu(&h.ctx, injected, "aaa11111".to_string(), &cancel));

    assert!(injected_items(&h).is_empty());
    assert!(h.ctx.session(|s| s.menu.is_none()));
}

#[tokio::test(start_paused = true)]
async fn test_committed_menu_is_cleaned_by_teardown() {
    let (h, _enhancer) = setup();
    let kebab = h.sidebar().rows[0].kebab;
    let menu = h.page().host(|doc| open_menu(doc, kebab, &DEFAULT_MENU_ITEMS));
    let injected = inject_with_retries(&h.ctx, menu.root, Some(kebab))
        .await
        .expect("item injected");

    let cancel = CancellationToken::new();
    assert!(commit_menu(&h.ctx, injected, "aaa11111".to_string(), &cancel));
    assert!(h.ctx.session(|s| s.menu.is_some()));

    cancel.cancel();
    assert_eq!(cleanup_menu_artifacts(&h.ctx, "test"), 1);
    assert!(injected_items(&h).is_empty());
    assert!(h.ctx.session(|s| s.menu.is_none()));
}
