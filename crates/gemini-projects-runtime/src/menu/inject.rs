//! The "Move to Project" item inside the host's conversation menu.

use gemini_projects_dom::markers::{keep_first, move_divider, move_item, sweep_outside, ITEM_ATTR, MOVE_TO_PROJECT};
use gemini_projects_dom::{parse_px, AnchorResolver, Document, DomError, NodeId};
use tracing::{debug, warn};

use crate::context::ContentContext;
use crate::menu::MenuTheme;

pub const MOVE_ITEM_LABEL: &str = "Move to Project";
const FALLBACK_ITEM_HEIGHT: &str = "48px";

/// Result of one injection attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InjectionOutcome {
    Injected {
        item: NodeId,
        menu_root: NodeId,
        overlap: f64,
    },
    /// The detected root narrowed down to the page itself.
    NoMenuRoot,
    /// The item landed outside the menu and was removed again.
    ValidationFailed { overlap: f64 },
}

/// An item that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InjectedItem {
    pub item: NodeId,
    pub menu_root: NodeId,
}

/// Insert the item after the menu's delete entry (or at the end of its list)
/// and check that it lies inside the menu.
///
/// Stale items elsewhere are swept first. An item already inside this menu
/// that still validates is kept, so repeated calls add nothing.
pub fn inject_move_item(
    doc: &mut Document,
    resolver: &AnchorResolver,
    detected_root: NodeId,
    theme: &MenuTheme,
    min_overlap: f64,
) -> Result<InjectionOutcome, DomError> {
    let Some(menu_root) = resolver.resolve_menu_root(doc, detected_root) else {
        return Ok(InjectionOutcome::NoMenuRoot);
    };

    let swept = sweep_outside(doc, &move_item(), menu_root) + sweep_outside(doc, &move_divider(), menu_root);
    if swept > 0 {
        debug!(swept, "removed stale menu items");
    }

    let found = doc.query_all(menu_root, &move_item());
    if let Some(existing) = keep_first(doc, found) {
        let overlap = overlap(doc, existing, menu_root);
        if overlap >= min_overlap {
            return Ok(InjectionOutcome::Injected {
                item: existing,
                menu_root,
                overlap,
            });
        }
        doc.remove(existing);
    }

    let list = resolver.find_menu_list_container(doc, menu_root);
    let item = build_move_item(doc, theme);
    match list.delete_item {
        Some(delete) => doc.insert_after(delete, item)?,
        None => doc.append_child(list.container, item)?,
    }

    let overlap = overlap(doc, item, menu_root);
    if !doc.contains(menu_root, item) || overlap < min_overlap {
        doc.remove(item);
        debug!(overlap, "injected item failed validation");
        return Ok(InjectionOutcome::ValidationFailed { overlap });
    }
    debug!(%item, %menu_root, overlap, "injected move item");
    Ok(InjectionOutcome::Injected {
        item,
        menu_root,
        overlap,
    })
}

fn overlap(doc: &Document, item: NodeId, menu_root: NodeId) -> f64 {
    doc.bounding_box(item).overlap_ratio(&doc.bounding_box(menu_root))
}

fn build_move_item(doc: &mut Document, theme: &MenuTheme) -> NodeId {
    let item = doc.create_element_with(
        "div",
        &[
            ("role", "menuitem"),
            (ITEM_ATTR, MOVE_TO_PROJECT),
            ("class", "gp-menu-item"),
            ("tabindex", "-1"),
            ("aria-haspopup", "menu"),
        ],
        "",
    );
    let height = if parse_px(&theme.item_height).is_some() {
        theme.item_height.as_str()
    } else {
        FALLBACK_ITEM_HEIGHT
    };
    doc.set_styles(
        item,
        &[
            ("display", "flex"),
            ("align-items", "center"),
            ("gap", "12px"),
            ("box-sizing", "border-box"),
            ("height", height),
            ("padding", &theme.item_padding),
            ("border-radius", &theme.item_radius),
            ("cursor", "pointer"),
            ("font-family", &theme.font_family),
            ("font-size", &theme.font_size),
            ("font-weight", &theme.font_weight),
            ("line-height", &theme.line_height),
            ("color", &theme.color),
        ],
    );

    let icon = doc.create_element_with("span", &[("class", "gp-menu-icon"), ("data-gp-icon", "folder")], "");
    let label = doc.create_element_with("span", &[("class", "gp-menu-label")], MOVE_ITEM_LABEL);
    doc.set_style(label, "flex", "1");
    let arrow = doc.create_element_with("span", &[("class", "gp-menu-arrow")], "›");
    for child in [icon, label, arrow] {
        // Fresh detached nodes; cannot fail.
        let _ = doc.append_child(item, child);
    }
    item
}

/// Theme for the injected UI. The first menu seen is measured and the
/// snapshot kept for the rest of the session.
pub fn menu_theme(ctx: &ContentContext, detected_root: NodeId) -> MenuTheme {
    let captured = ctx.session(|s| s.menu_theme.clone());
    let (theme, fresh) = {
        let doc = ctx.page().read();
        match captured {
            Some(snapshot) => (MenuTheme::effective(&doc, Some(&snapshot)), None),
            None => {
                let resolver = ctx.resolver();
                let root = resolver.resolve_menu_root(&doc, detected_root).unwrap_or(detected_root);
                let list = resolver.find_menu_list_container(&doc, root);
                let source = resolver.pick_menu_item_for_style(&doc, list.container);
                let snapshot = MenuTheme::capture(&doc, root, source);
                (MenuTheme::effective(&doc, Some(&snapshot)), Some(snapshot))
            }
        }
    };
    if let Some(snapshot) = fresh {
        debug!(background = %snapshot.background, "captured menu theme");
        ctx.session(|s| s.menu_theme = Some(snapshot));
    }
    theme
}

/// Inject with up to `inject_retries` extra attempts, re-resolving the menu
/// root one frame later after each failure.
pub async fn inject_with_retries(
    ctx: &ContentContext,
    detected_root: NodeId,
    trigger: Option<NodeId>,
) -> Option<InjectedItem> {
    let injection = &ctx.config().injection;
    let mut root = detected_root;
    for attempt in 0..=injection.inject_retries {
        if attempt > 0 {
            tokio::time::sleep(ctx.frame_interval()).await;
            let fresh = {
                let doc = ctx.page().read();
                ctx.resolver().find_best_menu_root(&doc, trigger)
            };
            match fresh {
                Some(fresh) => root = fresh,
                None => {
                    let doc = ctx.page().read();
                    if !doc.is_connected(root) {
                        debug!(attempt, "menu gone before retry");
                        return None;
                    }
                }
            }
        }

        let theme = menu_theme(ctx, root);
        let min_overlap = injection.min_overlap_ratio;
        let outcome = ctx
            .page()
            .extension(|doc| inject_move_item(doc, ctx.resolver(), root, &theme, min_overlap));
        match outcome {
            Ok(InjectionOutcome::Injected { item, menu_root, .. }) => {
                return Some(InjectedItem { item, menu_root });
            }
            Ok(InjectionOutcome::NoMenuRoot) => {
                debug!(attempt, "no usable menu root");
            }
            Ok(InjectionOutcome::ValidationFailed { overlap }) => {
                debug!(attempt, overlap, "injection attempt failed validation");
            }
            Err(e) => {
                warn!(error = %e, "menu item injection failed");
                return None;
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use gemini_projects_config::Config;
    use gemini_projects_dom::fixtures::{open_menu, FixtureBuilder, DEFAULT_MENU_ITEMS};
    use gemini_projects_dom::{BoundingBox, Matcher, Selector};

    fn resolver() -> AnchorResolver {
        AnchorResolver::new(&Config::default(), Matcher::default())
    }

    #[test]
    fn test_inserted_after_delete() {
        let mut fx = FixtureBuilder::new().with_default_chats().build();
        let kebab = fx.sidebar.as_ref().unwrap().rows[0].kebab;
        let menu = open_menu(&mut fx.doc, kebab, &DEFAULT_MENU_ITEMS);

        let outcome = inject_move_item(&mut fx.doc, &resolver(), menu.root, &MenuTheme::light(), 0.95).unwrap();
        let InjectionOutcome::Injected { item, menu_root, overlap } = outcome else {
            panic!("expected injection, got {outcome:?}");
        };
        assert_eq!(menu_root, menu.root);
        assert_eq!(overlap, 1.0);
        assert_eq!(fx.doc.previous_element_sibling(item), Some(menu.items[3]));
        assert_eq!(fx.doc.parent(item), Some(menu.list));
        assert!(fx.doc.text_content(item).contains(MOVE_ITEM_LABEL));
    }

    #[test]
    fn test_second_call_is_noop() {
        let mut fx = FixtureBuilder::new().with_default_chats().build();
        let kebab = fx.sidebar.as_ref().unwrap().rows[0].kebab;
        let menu = open_menu(&mut fx.doc, kebab, &DEFAULT_MENU_ITEMS);
        let r = resolver();
        let theme = MenuTheme::light();

        let first = inject_move_item(&mut fx.doc, &r, menu.root, &theme, 0.95).unwrap();
        fx.doc.take_records();
        let second = inject_move_item(&mut fx.doc, &r, menu.root, &theme, 0.95).unwrap();

        assert_eq!(first, second);
        assert_eq!(fx.doc.query_all_in_roots(&move_item()).len(), 1);
        assert!(fx.doc.take_records().is_empty());
    }

    #[test]
    fn test_duplicate_in_menu_is_removed() {
        let mut fx = FixtureBuilder::new().with_default_chats().build();
        let kebab = fx.sidebar.as_ref().unwrap().rows[0].kebab;
        let menu = open_menu(&mut fx.doc, kebab, &DEFAULT_MENU_ITEMS);
        let r = resolver();
        let theme = MenuTheme::light();

        let InjectionOutcome::Injected { item: first, .. } =
            inject_move_item(&mut fx.doc, &r, menu.root, &theme, 0.95).unwrap()
        else {
            panic!("expected injection");
        };
        // The host re-render cloned the item into the list.
        let clone = fx.doc.create_element_with("div", &[(ITEM_ATTR, MOVE_TO_PROJECT)], MOVE_ITEM_LABEL);
        fx.doc.append_child(menu.list, clone).unwrap();
        assert_eq!(fx.doc.query_all(menu.root, &move_item()).len(), 2);

        let outcome = inject_move_item(&mut fx.doc, &r, menu.root, &theme, 0.95).unwrap();
        assert!(matches!(outcome, InjectionOutcome::Injected { item, .. } if item == first));
        assert_eq!(fx.doc.query_all_in_roots(&move_item()), vec![first]);
    }

    #[test]
    fn test_stale_item_elsewhere_is_swept() {
        let mut fx = FixtureBuilder::new().with_default_chats().build();
        let rows = fx.sidebar.as_ref().unwrap().rows.clone();
        let r = resolver();
        let theme = MenuTheme::light();

        let old = open_menu(&mut fx.doc, rows[0].kebab, &DEFAULT_MENU_ITEMS);
        inject_move_item(&mut fx.doc, &r, old.root, &theme, 0.95).unwrap();
        // The host hides the old menu without removing it.
        fx.doc.set_computed_style(old.root, "display", "none");

        let menu = open_menu(&mut fx.doc, rows[1].kebab, &DEFAULT_MENU_ITEMS);
        inject_move_item(&mut fx.doc, &r, menu.root, &theme, 0.95).unwrap();

        let items = fx.doc.query_all_in_roots(&move_item());
        assert_eq!(items.len(), 1);
        assert!(fx.doc.contains(menu.root, items[0]));
    }

    #[test]
    fn test_appends_without_delete_entry() {
        let mut fx = FixtureBuilder::new().with_default_chats().build();
        let kebab = fx.sidebar.as_ref().unwrap().rows[0].kebab;
        let menu = open_menu(&mut fx.doc, kebab, &["Share conversation", "Pin", "Rename"]);

        let outcome = inject_move_item(&mut fx.doc, &resolver(), menu.root, &MenuTheme::light(), 0.95).unwrap();
        let InjectionOutcome::Injected { item, .. } = outcome else {
            panic!("expected injection, got {outcome:?}");
        };
        assert_eq!(fx.doc.children(menu.list).last().copied(), Some(item));
    }

    #[test]
    fn test_item_outside_menu_is_removed() {
        let mut fx = FixtureBuilder::new().with_default_chats().build();
        let kebab = fx.sidebar.as_ref().unwrap().rows[0].kebab;
        let menu = open_menu(&mut fx.doc, kebab, &DEFAULT_MENU_ITEMS);
        // The host pinned the root's box, so the new row overflows it.
        fx.doc.set_computed_style(menu.root, "position", "fixed");
        let root_box = fx.doc.bounding_box(menu.root);
        fx.doc.set_bounding_box(menu.list, BoundingBox::new(root_box.x, root_box.bottom() + 100.0, 200.0, 160.0));
        for (i, item) in menu.items.iter().enumerate() {
            let y = root_box.bottom() + 100.0 + 40.0 * i as f64;
            fx.doc.set_bounding_box(*item, BoundingBox::new(root_box.x, y, 200.0, 40.0));
        }

        let outcome = inject_move_item(&mut fx.doc, &resolver(), menu.root, &MenuTheme::light(), 0.95).unwrap();
        assert!(matches!(outcome, InjectionOutcome::ValidationFailed { overlap } if overlap < 0.95));
        assert!(fx.doc.query_all_in_roots(&move_item()).is_empty());
    }

    #[test]
    fn test_item_styled_from_theme() {
        let mut fx = FixtureBuilder::new().with_default_chats().build();
        let kebab = fx.sidebar.as_ref().unwrap().rows[0].kebab;
        let menu = open_menu(&mut fx.doc, kebab, &DEFAULT_MENU_ITEMS);
        let theme = MenuTheme::capture(&fx.doc, menu.root, Some(menu.items[0]));

        inject_move_item(&mut fx.doc, &resolver(), menu.root, &theme, 0.95).unwrap();
        let item = fx.doc.query(menu.root, &Selector::attr_eq(ITEM_ATTR, MOVE_TO_PROJECT)).unwrap();
        assert_eq!(fx.doc.node(item).inline_style("height"), Some("40px"));
        assert_eq!(fx.doc.bounding_box(item).height, 40.0);
        assert_eq!(fx.doc.node(item).inline_style("font-size"), Some("14px"));
    }
}
