//! Explicitly owned session state.
//!
//! One instance per activation. Everything here is transient: the
//! projection mirrors the persisted document, the rest are node handles that
//! are re-validated before use because the host may destroy them at any time.

use std::collections::BTreeSet;

use gemini_projects_dom::{IsolatedHosts, NodeId};
use gemini_projects_protocols::StoredState;
use tokio::time::Instant;

use crate::menu::MenuTheme;

/// Chat row captured on a kebab pointer-down, valid until `expires_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveRow {
    pub row: Option<NodeId>,
    pub conversation_id: Option<String>,
    pub expires_at: Instant,
}

/// The conversation menu currently carrying an injected item.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenMenu {
    pub root: NodeId,
    pub conversation_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Last authoritative state returned by the persistence collaborator.
    pub projection: StoredState,
    pub expanded_project_ids: BTreeSet<String>,

    // Cached anchors, dropped on navigation.
    pub sidebar_root: Option<NodeId>,
    pub chats_list: Option<NodeId>,
    pub hosts: Option<IsolatedHosts>,
    pub prompt_button: Option<NodeId>,

    // Menu interaction.
    pub active_row: Option<ActiveRow>,
    pub menu_theme: Option<MenuTheme>,
    pub menu: Option<OpenMenu>,
    pub submenu: Option<NodeId>,
    /// Project or chat menu opened from the panel.
    pub panel_menu: Option<NodeId>,
}

impl SessionState {
    pub fn new(projection: StoredState) -> Self {
        Self {
            projection,
            ..Default::default()
        }
    }

    /// Replace the projection with an authoritative state. Expanded ids of
    /// projects that no longer exist are dropped.
    pub fn replace_projection(&mut self, state: StoredState) {
        self.expanded_project_ids
            .retain(|id| state.projects.iter().any(|p| &p.id == id));
        self.projection = state;
    }

    pub fn capture_row(&mut self, row: Option<NodeId>, conversation_id: Option<String>, expires_at: Instant) {
        self.active_row = Some(ActiveRow {
            row,
            conversation_id,
            expires_at,
        });
    }

    /// The captured row, unless it expired.
    pub fn active_row(&self, now: Instant) -> Option<&ActiveRow> {
        self.active_row.as_ref().filter(|r| r.expires_at > now)
    }

    pub fn toggle_expanded(&mut self, project_id: &str) -> bool {
        if self.expanded_project_ids.remove(project_id) {
            false
        } else {
            self.expanded_project_ids.insert(project_id.to_string());
            true
        }
    }

    /// Forget the menu interaction. Node handles only; the caller removes
    /// the nodes.
    pub fn clear_menu(&mut self) {
        self.menu = None;
        self.submenu = None;
    }

    /// Forget every cached anchor, e.g. after the host navigated.
    pub fn clear_anchors(&mut self) {
        self.sidebar_root = None;
        self.chats_list = None;
        self.active_row = None;
        self.clear_menu();
        self.panel_menu = None;
    }
}
