//! Page-level scenarios: resolver, isolation hosts and observers together.

use gemini_projects_config::Config;
use gemini_projects_dom::fixtures::{DEFAULT_MENU_ITEMS, FixtureBuilder, close_menu, open_menu};
use gemini_projects_dom::markers::{self, PROJECTS_HOST_ID};
use gemini_projects_dom::{
    AnchorKind, AnchorResolver, ConversationSource, Matcher, MutationOrigin, Page, ResolveContext,
    inject_projects_section,
};

fn resolver(page: &Page) -> AnchorResolver {
    let config = Config::default();
    let matcher = Matcher::detect(&page.read(), &config.locale);
    AnchorResolver::new(&config, matcher)
}

#[tokio::test]
async fn test_sidebar_rows_resolve_to_conversation_ids() {
    let fx = FixtureBuilder::new().with_default_chats().build();
    let page = Page::new(fx.doc);
    let r = resolver(&page);

    let doc = page.read();
    let list = r
        .resolve(&doc, AnchorKind::ChatsList, &ResolveContext::default())
        .unwrap();
    let ids: Vec<String> = doc
        .query_all(list.node, &gemini_projects_dom::Selector::link())
        .into_iter()
        .filter_map(|link| r.ids().resolve(&doc, ConversationSource::Element(link)))
        .collect();
    assert_eq!(ids, vec!["aaa11111", "bbb22222", "ccc33333"]);
}

#[tokio::test]
async fn test_projects_section_injection_is_quiet_when_repeated() {
    let fx = FixtureBuilder::new().with_default_chats().build();
    let sidebar = fx.sidebar.clone().unwrap();
    let page = Page::new(fx.doc);
    let mut observer = page.observe().include_extension_origin();

    let first = page
        .extension(|doc| {
            inject_projects_section(doc, sidebar.nav, Some(sidebar.gems_header), Some(sidebar.chats_section))
        })
        .unwrap();
    assert!(observer.changed().await.is_some());

    let second = page
        .extension(|doc| {
            inject_projects_section(doc, sidebar.nav, Some(sidebar.gems_header), Some(sidebar.chats_section))
        })
        .unwrap();
    assert_eq!(first, second);

    // Only one host ever exists; a follow-up host edit is the next batch seen.
    page.host(|doc| {
        let body = doc.body();
        doc.add_class(body, "dark");
    });
    let records = observer.changed().await.unwrap();
    assert_eq!(records[0].target(), page.read().body());
    assert_eq!(
        page.read()
            .query_all_in_roots(&gemini_projects_dom::Selector::id(PROJECTS_HOST_ID))
            .len(),
        1
    );
}

#[tokio::test]
async fn test_sidebar_appears_later() {
    let fx = FixtureBuilder::new().without_sidebar().build();
    let page = Page::new(fx.doc);
    let r = resolver(&page);
    let mut observer = page.observe();

    for kind in [AnchorKind::SidebarRoot, AnchorKind::ChatsSection, AnchorKind::ChatsList] {
        assert!(r.resolve(&page.read(), kind, &ResolveContext::default()).is_none());
    }

    // The host renders its sidebar; the observer wakes and resolution succeeds.
    let late = FixtureBuilder::new().with_default_chats().build();
    page.host(|doc| *doc = late.doc);
    // Replacing the whole document produces no records; nudge like a render would.
    page.host(|doc| {
        let body = doc.body();
        doc.set_attribute(body, "data-rendered", "1");
    });
    assert!(observer.changed().await.is_some());
    assert!(
        r.resolve(&page.read(), AnchorKind::SidebarRoot, &ResolveContext::default())
            .is_some()
    );
}

#[tokio::test]
async fn test_menu_open_and_close_seen_by_observer() {
    let fx = FixtureBuilder::new().with_default_chats().build();
    let kebab = fx.sidebar.as_ref().unwrap().rows[0].kebab;
    let page = Page::new(fx.doc);
    let r = resolver(&page);
    let mut observer = page.observe();

    let menu = page.host(|doc| open_menu(doc, kebab, &DEFAULT_MENU_ITEMS));
    let records = observer.changed().await.unwrap();
    assert!(records.iter().any(|rec| rec.added_nodes().contains(&menu.overlay)));
    assert_eq!(
        r.resolve(&page.read(), AnchorKind::KebabMenuRoot, &ResolveContext::with_target(kebab))
            .map(|a| a.node),
        Some(menu.root)
    );

    page.host(|doc| close_menu(doc, &menu));
    let records = observer.changed().await.unwrap();
    assert!(records.iter().any(|rec| rec.removed_nodes().contains(&menu.overlay)));
    assert!(r.find_best_menu_root(&page.read(), Some(kebab)).is_none());
}

#[tokio::test]
async fn test_sweep_through_page_is_extension_origin() {
    let fx = FixtureBuilder::new().with_default_chats().build();
    let page = Page::new(fx.doc);
    let mut observer = page.observe();

    page.extension(|doc| {
        let body = doc.body();
        let item = doc.create_element_with("div", &[(markers::ITEM_ATTR, markers::MOVE_TO_PROJECT)], "");
        doc.append_child(body, item)
    })
    .unwrap();
    let removed = page.mutate(MutationOrigin::Extension, |doc| markers::sweep(doc, &markers::move_item()));
    assert_eq!(removed, 1);

    page.host(|doc| {
        let body = doc.body();
        doc.set_attribute(body, "data-host", "1");
    });
    let records = observer.changed().await.unwrap();
    assert_eq!(records.len(), 1);
}
