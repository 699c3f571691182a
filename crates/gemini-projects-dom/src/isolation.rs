//! Isolated render boundaries for extension UI.
//!
//! Two hosts, each with an open shadow root and an `all: initial` reset:
//! the projects host sits inline in the sidebar flow, the overlay host hangs
//! off the document element and carries a fixed, always-on-top layer for
//! submenus and pickers.

use tracing::{debug, info};

use crate::document::Document;
use crate::error::DomError;
use crate::markers::{keep_first, OVERLAY_HOST_ID, OVERLAY_LAYER_ID, PANEL_ROOT_ID, PROJECTS_HOST_ID};
use crate::node::NodeId;
use crate::selector::Selector;

/// One below the 32-bit maximum.
pub const OVERLAY_Z_INDEX: &str = "2147483646";

/// Node handles for both render boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsolatedHosts {
    pub projects_host: NodeId,
    /// `#gp-panel-root` inside the projects shadow root.
    pub panel_root: NodeId,
    pub overlay_host: NodeId,
    /// `#gp-overlay-layer` inside the overlay shadow root.
    pub overlay_layer: NodeId,
}

/// Overlay host and its layer, created on first use.
pub fn ensure_overlay_host(doc: &mut Document) -> Result<(NodeId, NodeId), DomError> {
    let html = doc.document_element();
    let found = doc.query_all(html, &Selector::id(OVERLAY_HOST_ID));
    let host = match keep_first(doc, found) {
        Some(host) => host,
        None => {
            let host = doc.create_element_with("div", &[("id", OVERLAY_HOST_ID)], "");
            doc.set_style(host, "all", "initial");
            doc.append_child(html, host)?;
            debug!(%host, "created overlay host");
            host
        }
    };

    let shadow = doc.attach_shadow(host);
    let layer = match doc.query(shadow, &Selector::id(OVERLAY_LAYER_ID)) {
        Some(layer) => layer,
        None => {
            let viewport = doc.viewport().as_box();
            let overlay = doc.create_element_with("div", &[("class", "gp-overlay")], "");
            doc.set_styles(
                overlay,
                &[
                    ("position", "fixed"),
                    ("inset", "0"),
                    ("pointer-events", "none"),
                    ("z-index", OVERLAY_Z_INDEX),
                ],
            );
            doc.set_bounding_box(overlay, viewport);
            let layer = doc.create_element_with(
                "div",
                &[("class", "gp-layer"), ("id", OVERLAY_LAYER_ID)],
                "",
            );
            doc.set_styles(layer, &[("position", "absolute"), ("inset", "0")]);
            doc.set_bounding_box(layer, viewport);
            doc.append_child(overlay, layer)?;
            doc.append_child(shadow, overlay)?;
            layer
        }
    };
    Ok((host, layer))
}

/// Ensure the projects host sits directly before the chats header, with its
/// panel root, and that the overlay host exists.
///
/// Calling this again on an unchanged DOM makes no edits.
pub fn inject_projects_section(
    doc: &mut Document,
    sidebar_root: NodeId,
    gems_section: Option<NodeId>,
    chats_section: Option<NodeId>,
) -> Result<IsolatedHosts, DomError> {
    let (parent, reference) = match chats_section {
        Some(chats) => (doc.parent_element(chats).unwrap_or(sidebar_root), Some(chats)),
        None => match gems_section.and_then(|g| doc.parent_element(g).map(|p| (p, g))) {
            Some((parent, gems)) => (parent, doc.next_sibling(gems)),
            None => (sidebar_root, None),
        },
    };

    let found = doc.query_all(doc.document_element(), &Selector::id(PROJECTS_HOST_ID));
    let projects_host = match keep_first(doc, found) {
        Some(host) => {
            let misplaced = doc.parent(host) != Some(parent)
                || reference.is_some_and(|r| doc.next_sibling(host) != Some(r));
            if misplaced {
                debug!(%host, %parent, "re-parenting projects host");
                doc.insert_before(parent, host, reference)?;
            }
            host
        }
        None => {
            let host = doc.create_element_with("div", &[("id", PROJECTS_HOST_ID)], "");
            doc.set_style(host, "all", "initial");
            doc.insert_before(parent, host, reference)?;
            info!(%host, %parent, "projects section attached");
            host
        }
    };

    let shadow = doc.attach_shadow(projects_host);
    let panel_root = match doc.query(shadow, &Selector::id(PANEL_ROOT_ID)) {
        Some(root) => root,
        None => {
            let root = doc.create_element_with(
                "div",
                &[("class", "gp-panel"), ("id", PANEL_ROOT_ID)],
                "",
            );
            doc.append_child(shadow, root)?;
            root
        }
    };

    let (overlay_host, overlay_layer) = ensure_overlay_host(doc)?;
    Ok(IsolatedHosts {
        projects_host,
        panel_root,
        overlay_host,
        overlay_layer,
    })
}

/// Class tokens first, then the luminance of the first opaque background.
pub fn is_dark_theme(doc: &Document) -> bool {
    let roots = [doc.body(), doc.document_element()];
    let classes: Vec<&str> = roots
        .iter()
        .flat_map(|r| doc.node(*r).class_list())
        .collect();
    if classes.iter().any(|c| matches!(*c, "light" | "theme-light")) {
        return false;
    }
    if classes
        .iter()
        .any(|c| matches!(*c, "dark" | "theme-dark" | "dark-theme"))
    {
        return true;
    }

    roots
        .iter()
        .map(|r| doc.computed_style(*r, "background-color"))
        .find(|c| !c.is_empty() && c != "transparent")
        .and_then(|c| luminance(&c))
        .is_some_and(|l| l < 0.45)
}

/// Relative luminance of an `rgb()`/`rgba()` string, 0..=1.
fn luminance(color: &str) -> Option<f64> {
    let channels: Vec<f64> = color
        .split(|c: char| !(c.is_ascii_digit() || c == '.'))
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .take(3)
        .collect();
    match channels[..] {
        [r, g, b] => Some((0.2126 * r + 0.7152 * g + 0.0722 * b) / 255.0),
        _ => None,
    }
}

/// Mirror the host theme onto both isolated hosts.
pub fn sync_theme(doc: &mut Document, hosts: &IsolatedHosts) -> bool {
    let dark = is_dark_theme(doc);
    doc.toggle_class(hosts.projects_host, "dark", dark);
    doc.toggle_class(hosts.overlay_host, "dark", dark);
    dark
}
