//! Attaching the projects section to the host sidebar.
//!
//! [`tick`] runs on activation and after every host mutation batch. Anchors
//! are re-resolved each time; the session copy is only a convenience for the
//! other parts of the same pass.

use gemini_projects_dom::{
    find_chats_list_container, inject_projects_section, sync_theme, DomError, IsolatedHosts, LabelGroup,
    MutationRecord, NodeId,
};
use tracing::{debug, trace};

use crate::context::ContentContext;
use crate::error::SyncError;
use crate::sync::{refresh_views, sync_chats_from_dom};

/// Result of one attach pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidebarStatus {
    /// The sidebar or one of its section headers is not rendered yet.
    Waiting,
    Attached {
        hosts: IsolatedHosts,
        chats_list: Option<NodeId>,
        /// Whether the chats list was rescanned and the views refreshed.
        refreshed: bool,
    },
}

impl SidebarStatus {
    pub fn is_attached(&self) -> bool {
        matches!(self, Self::Attached { .. })
    }
}

struct Anchors {
    root: NodeId,
    gems: NodeId,
    chats: NodeId,
    list: Option<NodeId>,
}

fn resolve_anchors(ctx: &ContentContext) -> Option<Anchors> {
    let doc = ctx.page().read();
    let resolver = ctx.resolver();
    let root = resolver.find_sidebar_root(&doc)?;
    let gems = resolver.find_section_header(&doc, root, LabelGroup::Gems)?;
    let chats = resolver.find_section_header(&doc, root, LabelGroup::Chats)?;
    let list = find_chats_list_container(&doc, chats);
    Some(Anchors { root, gems, chats, list })
}

/// Whether `records` could have changed what the chats list shows. An empty
/// batch means the observer lagged and anything may have changed.
fn touches_list(ctx: &ContentContext, list: NodeId, records: &[MutationRecord]) -> bool {
    if records.is_empty() {
        return true;
    }
    let doc = ctx.page().read();
    records.iter().any(|r| {
        let target = r.target();
        target == list || doc.contains(list, target) || r.removed_nodes().contains(&list)
    })
}

/// Ensure the projects section is attached, then rescan and refresh when
/// the chats list changed.
pub async fn tick(ctx: &ContentContext, records: &[MutationRecord]) -> Result<SidebarStatus, SyncError> {
    let Some(anchors) = resolve_anchors(ctx) else {
        trace!("sidebar not ready");
        return Ok(SidebarStatus::Waiting);
    };

    let hosts = ctx.page().extension(|doc| {
        let hosts = inject_projects_section(doc, anchors.root, Some(anchors.gems), Some(anchors.chats))?;
        sync_theme(doc, &hosts);
        Ok::<_, DomError>(hosts)
    })?;

    let (previous_hosts, previous_list) = ctx.session(|s| {
        let previous = (s.hosts, s.chats_list);
        s.sidebar_root = Some(anchors.root);
        s.chats_list = anchors.list;
        s.hosts = Some(hosts);
        previous
    });
    let new_hosts = previous_hosts != Some(hosts);
    if new_hosts {
        debug!(host = %hosts.projects_host, "projects section attached");
    }

    let touched = match anchors.list {
        Some(list) => previous_list != Some(list) || touches_list(ctx, list, records),
        None => false,
    };
    if touched {
        // Failures are logged inside; the hide pass still runs on the
        // current projection.
        let _ = sync_chats_from_dom(ctx).await;
    }
    let refreshed = touched || new_hosts;
    if refreshed {
        refresh_views(ctx);
    }

    Ok(SidebarStatus::Attached {
        hosts,
        chats_list: anchors.list,
        refreshed,
    })
}
