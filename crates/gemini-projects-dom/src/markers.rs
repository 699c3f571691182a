//! Marker attributes that tag extension-owned nodes.

use tracing::debug;

use crate::document::Document;
use crate::node::NodeId;
use crate::selector::Selector;

pub const ITEM_ATTR: &str = "data-gp-item";
pub const DIVIDER_ATTR: &str = "data-gp-divider";
pub const MOVE_TO_PROJECT: &str = "move-to-project";
pub const PROJECT_ID_ATTR: &str = "data-gp-project-id";
pub const CHAT_ID_ATTR: &str = "data-gp-chat-id";
/// Submenu entries: `new`, `remove` or a project id.
pub const MOVE_ATTR: &str = "data-gp-move";
pub const ACTION_ATTR: &str = "data-gp-action";
pub const PROMPT_BUTTON_ATTR: &str = "data-gp-prompt-btn";
pub const PROMPT_BUTTON_ID: &str = "gp-prompt-btn";

pub const PROJECTS_HOST_ID: &str = "gemini-projects-host";
pub const OVERLAY_HOST_ID: &str = "gemini-projects-overlay";
pub const PANEL_ROOT_ID: &str = "gp-panel-root";
pub const OVERLAY_LAYER_ID: &str = "gp-overlay-layer";
pub const SUBMENU_ID: &str = "gp-move-menu";

/// The injected "Move to Project" menu item.
pub fn move_item() -> Selector {
    Selector::attr_eq(ITEM_ATTR, MOVE_TO_PROJECT)
}

pub fn move_divider() -> Selector {
    Selector::attr_eq(DIVIDER_ATTR, MOVE_TO_PROJECT)
}

pub fn prompt_button() -> Selector {
    Selector::has_attr(PROMPT_BUTTON_ATTR)
}

/// Inside one of the two isolated hosts, or itself marker-tagged.
pub fn is_extension_node(doc: &Document, node: NodeId) -> bool {
    let mut current = Some(node);
    while let Some(id) = current {
        let n = doc.node(id);
        if n.is_element()
            && (matches!(n.id(), Some(PROJECTS_HOST_ID | OVERLAY_HOST_ID))
                || n.has_attr(ITEM_ATTR)
                || n.has_attr(DIVIDER_ATTR)
                || n.has_attr(PROMPT_BUTTON_ATTR))
        {
            return true;
        }
        current = doc.composed_parent(id);
    }
    false
}

/// Remove every node matching `selector` in the document and all shadow
/// trees. Returns how many were removed.
pub fn sweep(doc: &mut Document, selector: &Selector) -> usize {
    let found = doc.query_all_in_roots(selector);
    for node in &found {
        doc.remove(*node);
    }
    found.len()
}

/// Keep the first of `found` and remove the others. Returns the survivor.
pub fn keep_first(doc: &mut Document, found: Vec<NodeId>) -> Option<NodeId> {
    let mut found = found.into_iter();
    let first = found.next()?;
    let mut removed = 0;
    for duplicate in found {
        doc.remove(duplicate);
        removed += 1;
    }
    if removed > 0 {
        debug!(%first, removed, "removed duplicate extension nodes");
    }
    Some(first)
}

/// Like [`sweep`], but keeps matches inside `keep`.
pub fn sweep_outside(doc: &mut Document, selector: &Selector, keep: NodeId) -> usize {
    let stale: Vec<NodeId> = doc
        .query_all_in_roots(selector)
        .into_iter()
        .filter(|n| !doc.contains_composed(keep, *n))
        .collect();
    for node in &stale {
        doc.remove(*node);
    }
    stale.len()
}
