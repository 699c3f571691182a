//! Anchor resolution.
//!
//! Every strategy returns `None` on a miss; callers retry later. Nothing in
//! here fails on unexpected markup.

use gemini_projects_config::Config;
use tracing::{debug, trace};

use crate::conversation::ConversationIds;
use crate::document::Document;
use crate::geometry::BoundingBox;
use crate::markers::is_extension_node;
use crate::matcher::{KEBAB_GLYPHS, LabelGroup, Locale, Matcher, contains_label, equals_label};
use crate::node::NodeId;
use crate::scorer::{self, VisibilityRules};
use crate::selector::Selector;

/// Menus with item counts in this range qualify by shape alone.
const MENU_ITEM_RANGE: std::ops::RangeInclusive<usize> = 3..=12;
/// Longest label a plain menu item carries.
const MENU_ITEM_MAX_TEXT: usize = 48;

/// Semantic targets the extension anchors to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnchorKind {
    SidebarRoot,
    GemsSection,
    ChatsSection,
    /// Container holding the native chat links.
    ChatsList,
    /// Row around the context target.
    ChatRow,
    /// Context menu opened from the context target.
    KebabMenuRoot,
    /// Composer toolbar button the prompt button is placed after.
    ComposerToolbarAnchor,
    Composer,
}

/// A resolved element tagged with its role. Valid for one pass only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub kind: AnchorKind,
    pub node: NodeId,
}

/// Inputs a strategy may need beyond the document.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveContext {
    /// Event target or trigger element.
    pub target: Option<NodeId>,
}

impl ResolveContext {
    pub fn with_target(target: NodeId) -> Self {
        Self {
            target: Some(target),
        }
    }
}

/// List container of a menu, with the "delete" entry when present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuList {
    pub container: NodeId,
    pub delete_item: Option<NodeId>,
}

/// Heuristic strategies, bound to locale and thresholds.
#[derive(Debug, Clone)]
pub struct AnchorResolver {
    matcher: Matcher,
    menu_rules: VisibilityRules,
    min_menu_hits: usize,
    composer_min: (f64, f64),
    ids: ConversationIds,
}

impl AnchorResolver {
    pub fn new(config: &Config, matcher: Matcher) -> Self {
        Self {
            matcher,
            menu_rules: VisibilityRules::menu(&config.visibility),
            min_menu_hits: config.injection.min_menu_token_hits,
            composer_min: (
                config.visibility.composer_min_width,
                config.visibility.composer_min_height,
            ),
            ids: ConversationIds::new(&config.host),
        }
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn menu_rules(&self) -> &VisibilityRules {
        &self.menu_rules
    }

    pub fn ids(&self) -> &ConversationIds {
        &self.ids
    }

    /// Single entry point dispatching to the kind's strategy.
    pub fn resolve(&self, doc: &Document, kind: AnchorKind, ctx: &ResolveContext) -> Option<Anchor> {
        let node = match kind {
            AnchorKind::SidebarRoot => self.find_sidebar_root(doc),
            AnchorKind::GemsSection => {
                let root = self.find_sidebar_root(doc)?;
                self.find_section_header(doc, root, LabelGroup::Gems)
            }
            AnchorKind::ChatsSection => {
                let root = self.find_sidebar_root(doc)?;
                self.find_section_header(doc, root, LabelGroup::Chats)
            }
            AnchorKind::ChatsList => {
                let root = self.find_sidebar_root(doc)?;
                let header = self.find_section_header(doc, root, LabelGroup::Chats)?;
                find_chats_list_container(doc, header)
            }
            AnchorKind::ChatRow => find_chat_row_from_target(doc, ctx.target?),
            AnchorKind::KebabMenuRoot => self.find_best_menu_root(doc, ctx.target),
            AnchorKind::ComposerToolbarAnchor => self.find_toolbar_anchor(doc),
            AnchorKind::Composer => self.find_composer(doc),
        };
        trace!(?kind, found = ?node, "anchor resolution");
        node.map(|node| Anchor { kind, node })
    }

    // ----- sidebar -----

    /// First navigation region whose text has both a Gems and a Chats label.
    pub fn find_sidebar_root(&self, doc: &Document) -> Option<NodeId> {
        let candidates = doc.query_all(doc.document_element(), &Selector::navigation_region());
        self.matcher.with_fallback(|locale| {
            candidates.iter().copied().find(|candidate| {
                let text = doc.text_content(*candidate);
                has_label(&text, LabelGroup::Gems, locale) && has_label(&text, LabelGroup::Chats, locale)
            })
        })
    }

    /// Heading-like element whose whole text equals a label of `group`.
    pub fn find_section_header(&self, doc: &Document, root: NodeId, group: LabelGroup) -> Option<NodeId> {
        let headings = Selector::tags(&["div", "span", "h2", "h3", "h4", "button", "p"]);
        let elements = doc.query_all(root, &headings);
        self.matcher.with_fallback(|locale| {
            let labels = group.labels(locale);
            let is_header = |el: &NodeId| {
                let text = doc.text_content(*el);
                labels.iter().any(|l| equals_label(&text, l))
            };
            let mut found = elements.iter().copied().find(is_header)?;
            // A wrapper whose only text is the label matches too; use the
            // innermost element.
            while let Some(inner) = doc.query_all(found, &headings).into_iter().find(is_header) {
                found = inner;
            }
            Some(found)
        })
    }

    // ----- menus -----

    /// Role menu that looks like the conversation menu: enough label hits,
    /// or a compact item count.
    pub fn is_chat_menu(&self, doc: &Document, root: NodeId) -> bool {
        if scorer::count_token_hits(doc, root, &self.matcher) >= self.min_menu_hits {
            return true;
        }
        let is_menu_role = doc.matches(root, &Selector::menu_role());
        is_menu_role && MENU_ITEM_RANGE.contains(&doc.query_all(root, &Selector::menu_entry()).len())
    }

    /// Menu root carried by a freshly added node: the node, an inner role
    /// menu, or the menu around its first menu item.
    pub fn find_menu_from_node(&self, doc: &Document, node: NodeId) -> Option<NodeId> {
        if !doc.node(node).is_element() || !doc.is_connected(node) {
            return None;
        }
        if self.is_chat_menu(doc, node) {
            return Some(node);
        }
        if let Some(inner) = doc.query(node, &Selector::menu_role()) {
            if self.is_chat_menu(doc, inner) {
                return Some(inner);
            }
        }
        let item = doc.query(node, &Selector::roles(&["menuitem"]))?;
        let root = doc
            .closest(item, &Selector::menu_role())
            .or_else(|| doc.parent_element(item))?;
        self.is_chat_menu(doc, root).then_some(root)
    }

    /// Best visible role menu across every search root.
    pub fn find_best_menu_root(&self, doc: &Document, trigger: Option<NodeId>) -> Option<NodeId> {
        let candidates = doc.query_all_in_roots(&Selector::menu_role());
        let trigger_box = trigger.map(|t| doc.bounding_box(t));
        scorer::best_menu_root(
            doc,
            &candidates,
            trigger_box.as_ref(),
            &self.matcher,
            &self.menu_rules,
            self.min_menu_hits,
        )
    }

    /// Narrow a detected root to the element that really holds the items.
    /// `None` when that would be the page itself.
    pub fn resolve_menu_root(&self, doc: &Document, root: NodeId) -> Option<NodeId> {
        let container = self.find_menu_container(doc, root);
        let actual = self.find_actual_menu_root(doc, container);
        if actual == doc.body() || actual == doc.document_element() {
            debug!(%root, "menu root resolved to page, skipping");
            return None;
        }
        Some(actual)
    }

    /// The root if it is a visible menu with enough hits, else the nearest
    /// such ancestor of a label-bearing entry.
    pub fn find_menu_container(&self, doc: &Document, root: NodeId) -> NodeId {
        let enough = |node: NodeId| {
            scorer::count_token_hits(doc, node, &self.matcher) >= self.min_menu_hits
                && self.menu_rules.is_visible(doc, node)
        };
        if enough(root) {
            return root;
        }
        let tokens = self.matcher.labels(LabelGroup::MenuAction);
        let body = doc.body();
        for entry in doc.query_all(root, &Selector::menu_entry()) {
            let text = doc.text_content(entry).to_lowercase();
            if !tokens.iter().any(|t| text.contains(t)) {
                continue;
            }
            let mut current = doc.parent_element(entry);
            while let Some(node) = current.filter(|n| *n != body) {
                if enough(node) {
                    return node;
                }
                current = doc.parent_element(node);
            }
        }
        root
    }

    /// Keep a role menu with enough hits; otherwise the visible inner menu
    /// with the most hits (at least one).
    pub fn find_actual_menu_root(&self, doc: &Document, root: NodeId) -> NodeId {
        let hits = scorer::count_token_hits(doc, root, &self.matcher);
        if doc.matches(root, &Selector::menu_role()) && hits >= self.min_menu_hits {
            return root;
        }
        let visible: Vec<NodeId> = doc
            .query_all(root, &Selector::menu_role())
            .into_iter()
            .filter(|m| self.menu_rules.is_visible(doc, *m))
            .collect();
        scorer::rank_by_hits(doc, &visible, &self.matcher)
            .first()
            .filter(|c| c.hits >= 1)
            .map_or(root, |c| c.node)
    }

    /// Where injected items go: the delete entry's parent, an inner menu, or
    /// the parent of the first plain-looking item.
    pub fn find_menu_list_container(&self, doc: &Document, menu_root: NodeId) -> MenuList {
        let items = doc.query_all(menu_root, &Selector::menu_entry());
        let delete_labels = self.matcher.labels(LabelGroup::Delete);
        let delete_hits: Vec<NodeId> = items
            .iter()
            .copied()
            .filter(|item| {
                let text = doc.text_content(*item);
                delete_labels.iter().any(|l| contains_label(&text, l))
            })
            .collect();
        // Wrappers contain the label too; take the entry itself.
        let delete_item = delete_hits
            .iter()
            .copied()
            .find(|hit| !delete_hits.iter().any(|o| o != hit && doc.contains(*hit, *o)));
        if let Some(delete) = delete_item {
            if let Some(parent) = doc.parent_element(delete).filter(|p| doc.contains(menu_root, *p)) {
                return MenuList {
                    container: parent,
                    delete_item: Some(delete),
                };
            }
        }

        if let Some(inner) = doc
            .query(menu_root, &Selector::menu_role())
            .filter(|m| self.menu_rules.is_visible(doc, *m))
        {
            return MenuList {
                container: inner,
                delete_item: None,
            };
        }

        let first_item = items.iter().copied().find(|item| {
            let text = doc.text_content(*item);
            let text = text.trim();
            let height = doc.bounding_box(*item).height;
            !text.is_empty() && text.chars().count() <= MENU_ITEM_MAX_TEXT && height > 20.0 && height < 80.0
        });
        let container = first_item
            .and_then(|item| doc.parent_element(item))
            .filter(|p| doc.contains(menu_root, *p))
            .unwrap_or(menu_root);
        MenuList {
            container,
            delete_item: None,
        }
    }

    /// First labelled entry of native item height, used as the style source.
    pub fn pick_menu_item_for_style(&self, doc: &Document, container: NodeId) -> Option<NodeId> {
        doc.query_all(container, &Selector::menu_entry())
            .into_iter()
            .filter(|n| !is_extension_node(doc, *n))
            .find(|item| {
                let height = doc.bounding_box(*item).height;
                !doc.text_content(*item).trim().is_empty() && (28.0..=60.0).contains(&height)
            })
    }

    /// Heuristic for the chat row "more options" trigger.
    pub fn is_kebab_button(&self, doc: &Document, target: NodeId) -> bool {
        let trigger = Selector::AnyOf(vec![
            Selector::button(),
            Selector::tag("div"),
            Selector::has_attr("aria-label"),
        ]);
        let Some(button) = doc.closest(target, &trigger) else {
            return false;
        };
        if is_extension_node(doc, button) {
            return false;
        }
        let n = doc.node(button);
        let label = n.aria_label().or_else(|| n.title()).unwrap_or_default().to_lowercase();
        let has_menu_attr = n.attr("aria-haspopup") == Some("menu") || n.attr("aria-expanded") == Some("true");
        let text = doc.text_content(button);
        let has_dots = KEBAB_GLYPHS.contains(&text.trim());
        let label_hit = self
            .matcher
            .labels(LabelGroup::KebabTrigger)
            .iter()
            .any(|t| label.contains(t));
        let in_sidebar = doc.closest(button, &Selector::navigation_region()).is_some();
        if label_hit && in_sidebar {
            return true;
        }
        let row_has_link = find_chat_row_from_target(doc, button)
            .is_some_and(|row| doc.query(row, &Selector::link()).is_some());
        (has_menu_attr || has_dots || label_hit) && (row_has_link || in_sidebar)
    }

    // ----- composer -----

    /// Tools button, then an upload button, in either language.
    pub fn find_toolbar_anchor(&self, doc: &Document) -> Option<NodeId> {
        let buttons: Vec<NodeId> = doc
            .query_all(doc.document_element(), &Selector::button())
            .into_iter()
            .filter(|b| !is_extension_node(doc, *b))
            .collect();
        let tools = self.matcher.labels(LabelGroup::ToolsButton);
        let by_tools = buttons.iter().copied().find(|b| {
            let label = doc.node(*b).aria_label().unwrap_or_default();
            let text = doc.text_content(*b);
            tools.iter().any(|t| label.contains(t) || text.trim() == *t)
        });
        if by_tools.is_some() {
            return by_tools;
        }
        let upload = self.matcher.labels(LabelGroup::UploadButton);
        buttons.into_iter().find(|b| {
            let label = doc.node(*b).aria_label().unwrap_or_default();
            upload.iter().any(|t| label.contains(t))
        })
    }

    /// Focused editor, then known editor shapes, then the lowest visible
    /// editable on screen.
    pub fn find_composer(&self, doc: &Document) -> Option<NodeId> {
        if let Some(active) = doc.active_element().filter(|a| self.is_usable_composer(doc, *a)) {
            return Some(active);
        }

        let all = doc.descendants(doc.document_element(), false);
        let editable = |n: NodeId| doc.node(n).attr("contenteditable") == Some("true");
        let attr_contains = |n: NodeId, attr: &str, needle: &str| {
            doc.node(n).attr(attr).is_some_and(|v| v.contains(needle))
        };
        let textarea = |n: NodeId| doc.node(n).tag() == "textarea";
        let shapes: [&dyn Fn(NodeId) -> bool; 6] = [
            &|n: NodeId| {
                editable(n)
                    && doc
                        .closest(n, &Selector::tag("rich-textarea"))
                        .is_some_and(|r| r != n)
            },
            &|n: NodeId| editable(n) && doc.node(n).tag() == "div" && doc.node(n).role() == Some("textbox"),
            &|n: NodeId| editable(n) && doc.node(n).tag() == "div" && doc.node(n).has_class("ql-editor"),
            &|n: NodeId| textarea(n) && attr_contains(n, "aria-label", "Message"),
            &|n: NodeId| textarea(n) && attr_contains(n, "placeholder", "message"),
            &|n: NodeId| textarea(n) && attr_contains(n, "placeholder", "Ask"),
        ];
        for shape in shapes {
            // First match per shape, like querySelector.
            if let Some(found) = all.iter().copied().find(|n| shape(*n)) {
                if self.is_usable_composer(doc, found) {
                    return Some(found);
                }
            }
        }

        all.into_iter()
            .filter(|n| textarea(*n) || editable(*n))
            .filter(|n| self.is_usable_composer(doc, *n))
            .max_by(|a, b| {
                let (a, b) = (doc.bounding_box(*a).bottom(), doc.bounding_box(*b).bottom());
                a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    /// Editable, large enough, shown, and not part of extension UI.
    pub fn is_usable_composer(&self, doc: &Document, node: NodeId) -> bool {
        let n = doc.node(node);
        let editable = n.attr("contenteditable") == Some("true") || n.tag() == "textarea";
        if !editable || is_extension_node(doc, node) {
            return false;
        }
        let BoundingBox { width, height, .. } = doc.bounding_box(node);
        let (min_w, min_h) = self.composer_min;
        width >= min_w
            && height >= min_h
            && doc.is_rendered(node)
            && doc.computed_style(node, "visibility") != "hidden"
    }
}

fn has_label(text: &str, group: LabelGroup, locale: Locale) -> bool {
    group.labels(locale).iter().any(|l| contains_label(text, l))
}

/// First following sibling holding a link; the header's parent otherwise.
pub fn find_chats_list_container(doc: &Document, header: NodeId) -> Option<NodeId> {
    doc.following_siblings(header)
        .into_iter()
        .find(|s| doc.query(*s, &Selector::link()).is_some())
        .or_else(|| doc.parent_element(header))
}

/// Row around a sidebar click target.
pub fn find_chat_row_from_target(doc: &Document, target: NodeId) -> Option<NodeId> {
    if let Some(link) = doc.closest(target, &Selector::link()) {
        return Some(doc.closest(link, &Selector::chat_row()).unwrap_or(link));
    }
    let body = doc.body();
    let mut current = Some(target);
    while let Some(node) = current.filter(|n| *n != body) {
        if doc.query(node, &Selector::link()).is_some() {
            return Some(node);
        }
        current = doc.parent_element(node);
    }
    doc.closest(target, &Selector::chat_row())
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
