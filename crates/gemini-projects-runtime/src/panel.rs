//! The projects panel inside the isolated projects host.
//!
//! The panel is rebuilt from the projection on every refresh. Clicks are
//! mapped back to [`PanelAction`]s through `data-gp-action` attributes, so
//! no per-node handlers need to survive a rebuild.

use std::collections::BTreeSet;

use gemini_projects_dom::markers::{is_extension_node, ACTION_ATTR, CHAT_ID_ATTR, PROJECT_ID_ATTR};
use gemini_projects_dom::{AnchorResolver, BoundingBox, Document, DomError, NodeId, Selector};
use gemini_projects_protocols::{ChatRef, Project, StoredState};

use crate::menu::{build_overlay_menu, MenuTheme, OverlayEntry, OverlayMenuSpec};

pub const PANEL_MENU_ID: &str = "gp-panel-menu";
const PANEL_MENU_WIDTH: f64 = 240.0;

/// A click on extension UI, decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelAction {
    ToggleSection,
    NewProject,
    ToggleProject(String),
    ProjectMenu(String),
    ChatMenu {
        conversation_id: String,
        project_id: String,
    },
    OpenChat {
        conversation_id: String,
        href: String,
    },
    RenameProject(String),
    ExportProject(String),
    DeleteProject(String),
    RemoveChat(String),
    MoveChat {
        conversation_id: String,
        project_id: String,
    },
}

/// How to open a chat from the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatNavigation {
    /// Click the host's own link so its router handles the transition.
    Native(NodeId),
    /// Fall back to a full navigation.
    Url(String),
}

fn element(doc: &mut Document, parent: NodeId, tag: &str, attrs: &[(&str, &str)], text: &str) -> Result<NodeId, DomError> {
    let node = doc.create_element_with(tag, attrs, text);
    doc.append_child(parent, node)?;
    Ok(node)
}

/// Rebuild the panel under `panel_root`.
pub fn render_panel(
    doc: &mut Document,
    panel_root: NodeId,
    state: &StoredState,
    expanded: &BTreeSet<String>,
    app_segment: &str,
) -> Result<(), DomError> {
    doc.clear_children(panel_root);
    let collapsed = state.ui_prefs.projects_collapsed;

    let title_class = if collapsed { "gp-title collapsed" } else { "gp-title" };
    let title = element(
        doc,
        panel_root,
        "div",
        &[("class", title_class), (ACTION_ATTR, "toggle-section"), ("role", "button")],
        "",
    )?;
    element(doc, title, "span", &[], "Projects")?;
    element(doc, title, "span", &[("class", "gp-chevron")], "")?;

    let list = element(doc, panel_root, "div", &[("class", "gp-list-container")], "")?;
    if collapsed {
        doc.add_class(list, "hidden");
        doc.set_style(list, "display", "none");
    }

    let new_row = element(doc, list, "div", &[("class", "gp-row gp-new"), (ACTION_ATTR, "new-project")], "")?;
    element(doc, new_row, "span", &[("class", "gp-icon")], "+")?;
    element(doc, new_row, "span", &[("class", "gp-label")], "New Project")?;

    for project in state.sorted_projects() {
        let is_expanded = expanded.contains(&project.id);
        let wrapper = render_project(doc, list, project, is_expanded)?;
        if is_expanded {
            render_project_chats(doc, wrapper, project, &state.chats_in_project(&project.id), app_segment)?;
        }
    }
    Ok(())
}

fn render_project(doc: &mut Document, list: NodeId, project: &Project, expanded: bool) -> Result<NodeId, DomError> {
    let wrapper = element(doc, list, "div", &[("class", "gp-project"), (PROJECT_ID_ATTR, &project.id)], "")?;
    let row_class = if expanded {
        "gp-row gp-project-row active"
    } else {
        "gp-row gp-project-row"
    };
    let row = element(doc, wrapper, "div", &[("class", row_class), (ACTION_ATTR, "toggle-project")], "")?;
    let icon = element(doc, row, "span", &[("class", "gp-icon"), ("data-gp-icon", project.icon.as_str())], "")?;
    if let Some(color) = &project.color {
        doc.set_style(icon, "color", color);
    }
    element(doc, row, "span", &[("class", "gp-label")], &project.name)?;
    element(
        doc,
        row,
        "button",
        &[("class", "gp-kebab"), (ACTION_ATTR, "project-menu"), ("aria-label", "Project menu")],
        "",
    )?;
    Ok(wrapper)
}

fn render_project_chats(
    doc: &mut Document,
    wrapper: NodeId,
    project: &Project,
    chats: &[&ChatRef],
    app_segment: &str,
) -> Result<(), DomError> {
    let container = element(doc, wrapper, "div", &[("class", "gp-project-chats")], "")?;
    if chats.is_empty() {
        element(doc, container, "div", &[("class", "gp-chat-empty")], "No chats yet")?;
        return Ok(());
    }
    for chat in chats {
        let row = element(
            doc,
            container,
            "div",
            &[
                ("class", "gp-chat-row"),
                (CHAT_ID_ATTR, &chat.conversation_id),
                (PROJECT_ID_ATTR, &project.id),
            ],
            "",
        )?;
        let href = chat
            .last_url
            .clone()
            .unwrap_or_else(|| format!("/{app_segment}/{}", chat.conversation_id));
        let link = element(doc, row, "a", &[("class", "gp-chat-link"), ("href", &href)], "")?;
        let title = if chat.title.is_empty() {
            "Untitled chat"
        } else {
            chat.title.as_str()
        };
        element(doc, link, "span", &[("class", "gp-chat-title")], title)?;
        element(
            doc,
            row,
            "button",
            &[("class", "gp-chat-kebab"), (ACTION_ATTR, "chat-menu"), ("aria-label", "Chat menu")],
            "",
        )?;
    }
    Ok(())
}

fn attr_up(doc: &Document, from: NodeId, attr: &str) -> Option<String> {
    let mut current = Some(from);
    while let Some(node) = current {
        if let Some(value) = doc.node(node).attr(attr) {
            return Some(value.to_string());
        }
        current = doc.parent_element(node);
    }
    None
}

/// Decode a click on extension UI. Host nodes never map to an action.
pub fn panel_action(doc: &Document, target: NodeId) -> Option<PanelAction> {
    if !is_extension_node(doc, target) {
        return None;
    }
    let project = |node| attr_up(doc, node, PROJECT_ID_ATTR);
    let chat = |node| attr_up(doc, node, CHAT_ID_ATTR);

    let mut current = Some(target);
    while let Some(node) = current {
        let n = doc.node(node);
        if n.has_class("gp-chat-link") {
            return Some(PanelAction::OpenChat {
                conversation_id: chat(node)?,
                href: n.href().unwrap_or_default().to_string(),
            });
        }
        if let Some(action) = n.attr(ACTION_ATTR) {
            return match action {
                "toggle-section" => Some(PanelAction::ToggleSection),
                "new-project" => Some(PanelAction::NewProject),
                "toggle-project" => project(node).map(PanelAction::ToggleProject),
                "project-menu" => project(node).map(PanelAction::ProjectMenu),
                "chat-menu" => Some(PanelAction::ChatMenu {
                    conversation_id: chat(node)?,
                    project_id: project(node)?,
                }),
                "rename-project" => project(node).map(PanelAction::RenameProject),
                "export-project" => project(node).map(PanelAction::ExportProject),
                "delete-project" => project(node).map(PanelAction::DeleteProject),
                "remove-chat" => chat(node).map(PanelAction::RemoveChat),
                "move-chat" => Some(PanelAction::MoveChat {
                    conversation_id: chat(node)?,
                    project_id: project(node)?,
                }),
                _ => None,
            };
        }
        current = doc.parent_element(node);
    }
    None
}

fn panel_menu_spec() -> OverlayMenuSpec {
    OverlayMenuSpec {
        id: PANEL_MENU_ID,
        class: "gp-menu",
        divider_class: "gp-menu-divider",
        width: PANEL_MENU_WIDTH,
    }
}

/// Rename, export and delete for one project.
pub fn open_project_menu(
    doc: &mut Document,
    layer: NodeId,
    anchor: &BoundingBox,
    project: &Project,
    theme: &MenuTheme,
) -> Result<NodeId, DomError> {
    let entry = |label: &str, action: &str| {
        OverlayEntry::item(
            label,
            "gp-menu-item",
            vec![(ACTION_ATTR, action.to_string()), (PROJECT_ID_ATTR, project.id.clone())],
        )
    };
    let entries = [
        entry("Rename", "rename-project"),
        entry("Export", "export-project"),
        OverlayEntry::Divider,
        entry("Delete", "delete-project"),
    ];
    build_overlay_menu(doc, layer, panel_menu_spec(), anchor, &entries, theme)
}

/// Remove the chat from `project`, or move it to one of `others`.
pub fn open_chat_menu(
    doc: &mut Document,
    layer: NodeId,
    anchor: &BoundingBox,
    conversation_id: &str,
    project: &Project,
    others: &[&Project],
    theme: &MenuTheme,
) -> Result<NodeId, DomError> {
    let mut entries = vec![OverlayEntry::item(
        format!("Remove from {}", project.name),
        "gp-menu-item",
        vec![
            (ACTION_ATTR, "remove-chat".to_string()),
            (CHAT_ID_ATTR, conversation_id.to_string()),
        ],
    )];
    if !others.is_empty() {
        entries.push(OverlayEntry::Divider);
        entries.extend(others.iter().map(|other| {
            OverlayEntry::item(
                format!("Move to {}", other.name),
                "gp-menu-item",
                vec![
                    (ACTION_ATTR, "move-chat".to_string()),
                    (CHAT_ID_ATTR, conversation_id.to_string()),
                    (PROJECT_ID_ATTR, other.id.clone()),
                ],
            )
        }));
    }
    build_overlay_menu(doc, layer, panel_menu_spec(), anchor, &entries, theme)
}

/// Remove the open panel menu, if any.
pub fn close_panel_menu(doc: &mut Document) -> bool {
    match doc.element_by_id(PANEL_MENU_ID) {
        Some(menu) => {
            doc.remove(menu);
            true
        }
        None => false,
    }
}

/// Prefer the host's own link to the conversation; fall back to `href`.
pub fn chat_navigation(
    doc: &Document,
    resolver: &AnchorResolver,
    sidebar: Option<NodeId>,
    conversation_id: &str,
    href: &str,
) -> ChatNavigation {
    let native = sidebar.and_then(|root| {
        doc.query_all(root, &Selector::link()).into_iter().find(|link| {
            !is_extension_node(doc, *link)
                && doc
                    .node(*link)
                    .href()
                    .and_then(|h| resolver.ids().from_url(h))
                    .is_some_and(|id| id == conversation_id)
        })
    });
    match native {
        Some(link) => ChatNavigation::Native(link),
        None => ChatNavigation::Url(href.to_string()),
    }
}
