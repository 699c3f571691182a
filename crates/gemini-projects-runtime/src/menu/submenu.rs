//! The "Move to Project" submenu.

use gemini_projects_dom::markers::{MOVE_ATTR, SUBMENU_ID};
use gemini_projects_dom::{BoundingBox, Document, DomError, NodeId};
use gemini_projects_protocols::Project;

use crate::menu::overlay::{build_overlay_menu, entry_value, OverlayEntry, OverlayMenuSpec};
use crate::menu::MenuTheme;

const NEW_PROJECT: &str = "new";
const REMOVE: &str = "remove";

/// What the user picked in the submenu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmenuChoice {
    NewProject,
    Remove,
    Project(String),
}

/// Open the submenu next to `anchor`: "New Project", the projects in display
/// order, and "Remove from Project" when the chat is assigned.
pub fn open_submenu(
    doc: &mut Document,
    layer: NodeId,
    anchor: &BoundingBox,
    projects: &[&Project],
    assigned: bool,
    theme: &MenuTheme,
    width: f64,
) -> Result<NodeId, DomError> {
    let mut entries = vec![
        OverlayEntry::item(
            "New Project",
            "gp-move-item secondary",
            vec![(MOVE_ATTR, NEW_PROJECT.to_string())],
        ),
        OverlayEntry::Divider,
    ];
    entries.extend(projects.iter().map(|p| {
        OverlayEntry::item(
            p.name.clone(),
            "gp-move-item",
            vec![
                (MOVE_ATTR, p.id.clone()),
                ("data-gp-icon", p.icon.as_str().to_string()),
            ],
        )
    }));
    if assigned {
        entries.push(OverlayEntry::Divider);
        entries.push(OverlayEntry::item(
            "Remove from Project",
            "gp-move-item secondary",
            vec![(MOVE_ATTR, REMOVE.to_string())],
        ));
    }

    let spec = OverlayMenuSpec {
        id: SUBMENU_ID,
        class: "gp-move-menu",
        divider_class: "gp-move-divider",
        width,
    };
    build_overlay_menu(doc, layer, spec, anchor, &entries, theme)
}

/// Map a click inside the submenu to a choice.
pub fn submenu_choice(doc: &Document, submenu: NodeId, target: NodeId) -> Option<SubmenuChoice> {
    if !doc.contains(submenu, target) {
        return None;
    }
    let (_, value) = entry_value(doc, submenu, target, MOVE_ATTR)?;
    Some(match value.as_str() {
        NEW_PROJECT => SubmenuChoice::NewProject,
        REMOVE => SubmenuChoice::Remove,
        _ => SubmenuChoice::Project(value),
    })
}
