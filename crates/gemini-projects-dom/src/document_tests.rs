use super::*;

fn doc() -> Document {
    Document::new(ViewportInfo::default(), "https://gemini.google.com/app")
}

fn boxed(doc: &mut Document, parent: NodeId, tag: &str, bbox: BoundingBox) -> NodeId {
    let id = doc.create_element(tag);
    doc.set_bounding_box(id, bbox);
    doc.append_child(parent, id).unwrap();
    id
}

#[test]
fn test_new_document_shape() {
    let d = doc();
    assert_eq!(d.node(d.document_element()).tag(), "html");
    assert_eq!(d.parent(d.body()), Some(d.document_element()));
    assert!(d.is_connected(d.body()));
    assert_eq!(d.bounding_box(d.body()).width, 1280.0);
}

#[test]
fn test_append_and_remove() {
    let mut d = doc();
    let body = d.body();
    let div = d.create_element("div");
    assert!(!d.is_connected(div));

    d.append_child(body, div).unwrap();
    assert!(d.is_connected(div));
    assert_eq!(d.children(body), vec![div]);

    d.remove(div);
    assert!(!d.is_connected(div));
    assert!(d.children(body).is_empty());
    // Removing twice is harmless.
    d.remove(div);
}

#[test]
fn test_insert_before_and_after() {
    let mut d = doc();
    let body = d.body();
    let a = d.create_element("a");
    let c = d.create_element("c");
    d.append_child(body, a).unwrap();
    d.append_child(body, c).unwrap();

    let b = d.create_element("b");
    d.insert_before(body, b, Some(c)).unwrap();
    let z = d.create_element("z");
    d.insert_after(c, z).unwrap();

    let tags: Vec<_> = d
        .children(body)
        .iter()
        .map(|n| d.node(*n).tag().to_string())
        .collect();
    assert_eq!(tags, vec!["a", "b", "c", "z"]);
    assert_eq!(d.next_element_sibling(a), Some(b));
    assert_eq!(d.previous_element_sibling(a), None);
    assert_eq!(d.following_siblings(b), vec![c, z]);
}

#[test]
fn test_insert_moves_existing_child() {
    let mut d = doc();
    let body = d.body();
    let first = d.create_element("div");
    let second = d.create_element("div");
    d.append_child(body, first).unwrap();
    d.append_child(body, second).unwrap();

    d.insert_before(body, second, Some(first)).unwrap();
    assert_eq!(d.children(body), vec![second, first]);
}

#[test]
fn test_hierarchy_errors() {
    let mut d = doc();
    let body = d.body();
    let outer = d.create_element("div");
    let inner = d.create_element("div");
    d.append_child(body, outer).unwrap();
    d.append_child(outer, inner).unwrap();

    assert!(matches!(
        d.append_child(inner, outer),
        Err(DomError::HierarchyRequest { .. })
    ));
    let stray = d.create_element("span");
    assert!(matches!(
        d.insert_before(body, stray, Some(inner)),
        Err(DomError::NotAChild { .. })
    ));
    let detached = d.create_element("p");
    assert!(matches!(
        d.insert_after(detached, stray),
        Err(DomError::Detached(_))
    ));
}

#[test]
fn test_text_content_concatenates_descendants() {
    let mut d = doc();
    let body = d.body();
    let nav = d.create_element_with("nav", &[], "");
    let gems = d.create_element_with("div", &[], "Gems");
    let chats = d.create_element_with("div", &[], "Chats");
    d.append_child(body, nav).unwrap();
    d.append_child(nav, gems).unwrap();
    d.append_child(nav, chats).unwrap();

    assert_eq!(d.text_content(nav), "GemsChats");
}

#[test]
fn test_text_content_does_not_pierce_shadow() {
    let mut d = doc();
    let body = d.body();
    let host = d.create_element("div");
    d.append_child(body, host).unwrap();
    let shadow = d.attach_shadow(host);
    let inner = d.create_element_with("span", &[], "hidden");
    d.append_child(shadow, inner).unwrap();

    assert_eq!(d.text_content(host), "");
    assert_eq!(d.text_content(shadow), "hidden");
}

#[test]
fn test_attach_shadow_is_idempotent() {
    let mut d = doc();
    let host = d.create_element("div");
    let first = d.attach_shadow(host);
    let second = d.attach_shadow(host);
    assert_eq!(first, second);
    assert_eq!(d.node(first).host(), Some(host));
}

#[test]
fn test_descendants_pierce_and_search_roots() {
    let mut d = doc();
    let body = d.body();
    let host = d.create_element("div");
    d.append_child(body, host).unwrap();
    let shadow = d.attach_shadow(host);
    let menu = d.create_element_with("div", &[("role", "menu"), ("id", "inner")], "");
    d.append_child(shadow, menu).unwrap();

    assert!(!d.descendants(body, false).contains(&menu));
    assert!(d.descendants(body, true).contains(&menu));
    assert!(d.search_roots().contains(&shadow));
    assert_eq!(d.element_by_id("inner"), Some(menu));
    assert_eq!(d.query_all_in_roots(&Selector::menu_role()), vec![menu]);
    assert!(d.is_connected(menu));
    assert!(d.contains_composed(host, menu));
    assert!(!d.contains(host, menu));
}

#[test]
fn test_closest_stops_at_shadow_boundary() {
    let mut d = doc();
    let body = d.body();
    let nav = d.create_element("nav");
    d.append_child(body, nav).unwrap();
    let shadow = d.attach_shadow(nav);
    let button = d.create_element("button");
    d.append_child(shadow, button).unwrap();

    assert_eq!(d.closest(button, &Selector::tag("button")), Some(button));
    assert_eq!(d.closest(button, &Selector::tag("nav")), None);
}

#[test]
fn test_records_only_for_connected_targets() {
    let mut d = doc();
    let detached = d.create_element("div");
    d.set_attribute(detached, "role", "menu");
    d.set_text(detached, "x");
    assert!(d.take_records().is_empty());

    let body = d.body();
    d.append_child(body, detached).unwrap();
    d.set_attribute(detached, "role", "listbox");
    let records = d.take_records();
    assert_eq!(records.len(), 2);
    assert!(records[0].is_child_list());
}

#[test]
fn test_unchanged_attribute_not_recorded() {
    let mut d = doc();
    let body = d.body();
    d.set_attribute(body, "class", "dark");
    d.take_records();
    d.set_attribute(body, "class", "dark");
    assert!(d.take_records().is_empty());
}

#[test]
fn test_class_toggle() {
    let mut d = doc();
    let body = d.body();
    d.add_class(body, "dark");
    d.add_class(body, "dark");
    assert_eq!(d.node(body).attr("class"), Some("dark"));
    d.toggle_class(body, "wide", true);
    assert!(d.node(body).has_class("wide"));
    d.remove_class(body, "dark");
    d.remove_class(body, "wide");
    assert_eq!(d.node(body).attr("class"), None);
}

#[test]
fn test_computed_style_precedence_and_inheritance() {
    let mut d = doc();
    let body = d.body();
    let outer = d.create_element("div");
    let inner = d.create_element("span");
    d.append_child(body, outer).unwrap();
    d.append_child(outer, inner).unwrap();

    assert_eq!(d.computed_style(inner, "display"), "block");
    assert_eq!(d.computed_style(inner, "z-index"), "auto");

    d.set_computed_style(outer, "pointer-events", "none");
    assert_eq!(d.computed_style(inner, "pointer-events"), "none");
    d.set_style(inner, "pointer-events", "auto");
    assert_eq!(d.computed_style(inner, "pointer-events"), "auto");

    d.set_computed_style(outer, "display", "flex");
    assert_eq!(d.computed_style(inner, "display"), "block");

    d.set_computed_style(inner, "display", "inline");
    d.set_style(inner, "display", "none");
    assert_eq!(d.computed_style(inner, "display"), "none");
    d.remove_style(inner, "display");
    assert_eq!(d.computed_style(inner, "display"), "inline");
}

#[test]
fn test_is_rendered() {
    let mut d = doc();
    let body = d.body();
    let outer = d.create_element("div");
    let inner = d.create_element("div");
    d.append_child(body, outer).unwrap();
    d.append_child(outer, inner).unwrap();
    assert!(d.is_rendered(inner));

    d.set_style(outer, "display", "none");
    assert!(!d.is_rendered(inner));

    let detached = d.create_element("div");
    assert!(!d.is_rendered(detached));
}

#[test]
fn test_element_from_point_prefers_z_then_area() {
    let mut d = doc();
    let body = d.body();
    let big = boxed(&mut d, body, "div", BoundingBox::new(0.0, 0.0, 600.0, 600.0));
    let small = boxed(&mut d, big, "div", BoundingBox::new(100.0, 100.0, 50.0, 50.0));
    assert_eq!(d.element_from_point(120.0, 120.0), Some(small));

    let overlay = boxed(&mut d, body, "div", BoundingBox::new(0.0, 0.0, 400.0, 400.0));
    d.set_style(overlay, "position", "fixed");
    d.set_computed_style(overlay, "z-index", "1000");
    assert_eq!(d.element_from_point(120.0, 120.0), Some(overlay));

    d.set_computed_style(overlay, "pointer-events", "none");
    assert_eq!(d.element_from_point(120.0, 120.0), Some(small));
    assert_eq!(d.effective_z_index(small), 0);
}

#[test]
fn test_layout_stacks_inserted_block() {
    let mut d = doc();
    let body = d.body();
    let menu = boxed(&mut d, body, "div", BoundingBox::new(300.0, 200.0, 200.0, 120.0));
    d.set_style(menu, "position", "fixed");
    let list = boxed(&mut d, menu, "div", BoundingBox::new(300.0, 200.0, 200.0, 120.0));
    let share = boxed(&mut d, list, "div", BoundingBox::new(300.0, 200.0, 200.0, 40.0));
    let delete = boxed(&mut d, list, "div", BoundingBox::new(300.0, 240.0, 200.0, 40.0));
    let pin = boxed(&mut d, list, "div", BoundingBox::new(300.0, 280.0, 200.0, 40.0));

    let item = d.create_element("div");
    d.set_style(item, "height", "32px");
    let label = d.create_element_with("span", &[], "Move to Project");
    d.append_child(item, label).unwrap();
    d.insert_after(delete, item).unwrap();

    assert_eq!(d.bounding_box(item), BoundingBox::new(300.0, 280.0, 200.0, 32.0));
    assert_eq!(d.bounding_box(label).y, 280.0);
    assert_eq!(d.bounding_box(pin).y, 312.0);
    assert_eq!(d.bounding_box(share).y, 200.0);
    assert_eq!(d.bounding_box(list).height, 152.0);
    assert_eq!(d.bounding_box(menu).height, 152.0);
    // body is viewport-sized and never grows
    assert_eq!(d.bounding_box(body).height, 720.0);

    d.remove(item);
    assert_eq!(d.bounding_box(pin).y, 280.0);
    assert_eq!(d.bounding_box(menu).height, 120.0);
}

#[test]
fn test_layout_fixed_height_container_does_not_grow() {
    let mut d = doc();
    let body = d.body();
    let toolbar = boxed(&mut d, body, "div", BoundingBox::new(0.0, 600.0, 400.0, 40.0));
    let button = boxed(&mut d, toolbar, "button", BoundingBox::new(0.0, 600.0, 40.0, 40.0));
    d.set_style(button, "height", "40px");
    let after = boxed(&mut d, toolbar, "button", BoundingBox::new(40.0, 600.0, 40.0, 40.0));

    let icon = d.create_element("span");
    d.set_style(icon, "height", "20px");
    d.append_child(button, icon).unwrap();

    assert_eq!(d.bounding_box(icon), BoundingBox::new(0.0, 600.0, 40.0, 20.0));
    assert_eq!(d.bounding_box(button).height, 40.0);
    assert_eq!(d.bounding_box(after).y, 600.0);
    assert_eq!(d.bounding_box(toolbar).height, 40.0);
}

#[test]
fn test_layout_skips_unplaced_parent() {
    let mut d = doc();
    let parent = d.create_element("div");
    let child = d.create_element("div");
    d.set_style(child, "height", "32px");
    d.append_child(parent, child).unwrap();
    assert!(d.bounding_box(child).is_empty());
}

#[test]
fn test_layout_inside_shadow_root_uses_host_box() {
    let mut d = doc();
    let body = d.body();
    let host = boxed(&mut d, body, "div", BoundingBox::new(0.0, 100.0, 260.0, 0.0));
    let shadow = d.attach_shadow(host);
    let panel = d.create_element("div");
    d.set_style(panel, "height", "48px");
    d.append_child(shadow, panel).unwrap();

    assert_eq!(d.bounding_box(panel), BoundingBox::new(0.0, 100.0, 260.0, 48.0));
    assert_eq!(d.bounding_box(host).height, 48.0);
}

#[test]
fn test_focus_cleared_on_removal() {
    let mut d = doc();
    let body = d.body();
    let editor = d.create_element("textarea");
    d.append_child(body, editor).unwrap();
    d.focus(editor);
    assert_eq!(d.active_element(), Some(editor));
    d.remove(editor);
    assert_eq!(d.active_element(), None);
}

#[test]
fn test_lang_and_languages() {
    let mut d = doc();
    assert_eq!(d.lang(), None);
    let html = d.document_element();
    d.set_attribute(html, "lang", "zh-CN");
    d.set_navigator_languages(vec!["en-US".into()]);
    assert_eq!(d.lang(), Some("zh-CN"));
    assert_eq!(d.navigator_languages(), ["en-US".to_string()]);
}
