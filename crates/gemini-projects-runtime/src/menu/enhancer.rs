//! One kebab interaction at a time: arm, detect, inject, watch, tear down.

use std::time::Duration;

use gemini_projects_dom::markers::{move_divider, move_item, sweep, SUBMENU_ID};
use gemini_projects_dom::{ensure_overlay_host, find_chat_row_from_target, Document, DomError, NodeId};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::context::ContentContext;
use crate::error::SyncError;
use crate::menu::detect::wait_for_menu_root;
use crate::menu::inject::{inject_move_item, inject_with_retries, menu_theme, InjectedItem, InjectionOutcome};
use crate::menu::submenu::{open_submenu, submenu_choice, SubmenuChoice};
use crate::menu::MenuTheme;
use crate::session::OpenMenu;

/// A state change the user asked for from the submenu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuCommand {
    /// Create a project, then move the chat into it.
    CreateProject { conversation_id: String },
    /// Assign the chat, or unassign it with `project_id: None`.
    Move {
        conversation_id: String,
        project_id: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    Command(MenuCommand),
    /// Handled here; nothing else should react.
    Consumed,
    Ignored,
}

struct Interaction {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Owns the current menu interaction and the submenu close timer.
pub struct MenuEnhancer {
    ctx: ContentContext,
    parent: CancellationToken,
    interaction: Option<Interaction>,
    close_timer: Option<CancellationToken>,
}

impl MenuEnhancer {
    /// Work spawned here stops when `parent` is cancelled.
    pub fn new(ctx: ContentContext, parent: CancellationToken) -> Self {
        Self {
            ctx,
            parent,
            interaction: None,
            close_timer: None,
        }
    }

    /// Arm on a kebab pointer-down; an outside pointer-down tears the
    /// current interaction down. Returns whether an interaction started.
    pub fn on_pointer_down(&mut self, target: NodeId) -> bool {
        let (menu, submenu) = self.ctx.session(|s| (s.menu.clone(), s.submenu));
        let (is_kebab, inside_ui) = {
            let doc = self.ctx.page().read();
            let inside_ui = menu.is_some_and(|m| doc.contains_composed(m.root, target))
                || submenu.is_some_and(|s| doc.contains_composed(s, target));
            (self.ctx.resolver().is_kebab_button(&doc, target), inside_ui)
        };

        if is_kebab {
            self.teardown("kebab pressed");
            self.arm(target);
            return true;
        }
        if !inside_ui && self.has_open_ui() {
            self.teardown("outside pointer-down");
        }
        false
    }

    fn arm(&mut self, trigger: NodeId) {
        let (row, conversation_id) = {
            let sidebar = self.ctx.session(|s| s.sidebar_root);
            let doc = self.ctx.page().read();
            resolve_trigger_row(&self.ctx, &doc, trigger, sidebar)
        };
        let ttl = Duration::from_millis(self.ctx.config().injection.active_row_ttl_ms);
        self.ctx
            .session(|s| s.capture_row(row, conversation_id.clone(), Instant::now() + ttl));
        debug!(%trigger, ?row, conversation = ?conversation_id, "menu interaction armed");

        let cancel = self.parent.child_token();
        let task = tokio::spawn(run_interaction(self.ctx.clone(), trigger, cancel.clone()));
        self.interaction = Some(Interaction { cancel, task });
    }

    /// Entering the injected item opens the submenu; entering either cancels
    /// a pending close.
    pub fn on_pointer_enter(&mut self, target: NodeId) {
        let (on_item, on_submenu) = self.locate(target);
        if on_item.is_some() || on_submenu {
            self.cancel_close_timer();
        }
        if let Some(item) = on_item {
            if self.ctx.session(|s| s.submenu.is_none()) {
                self.open_submenu_logged(item);
            }
        }
    }

    /// Leaving the item or the submenu closes the submenu after a grace
    /// period unless the pointer comes back.
    pub fn on_pointer_leave(&mut self, target: NodeId) {
        let (on_item, on_submenu) = self.locate(target);
        if on_item.is_none() && !on_submenu {
            return;
        }
        if self.ctx.session(|s| s.submenu.is_none()) {
            return;
        }
        self.cancel_close_timer();

        let token = self.parent.child_token();
        let ctx = self.ctx.clone();
        let grace = Duration::from_millis(ctx.config().injection.submenu_close_grace_ms);
        let timer = token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = timer.cancelled() => {}
                _ = tokio::time::sleep(grace) => close_submenu(&ctx),
            }
        });
        self.close_timer = Some(token);
    }

    /// Submenu choices become commands; clicks on the item open the submenu.
    pub fn on_click(&mut self, target: NodeId) -> ClickOutcome {
        if let Some(submenu) = self.ctx.session(|s| s.submenu) {
            let (choice, inside) = {
                let doc = self.ctx.page().read();
                (
                    submenu_choice(&doc, submenu, target),
                    doc.contains(submenu, target),
                )
            };
            if let Some(choice) = choice {
                let conversation_id = self.ctx.session(|s| s.menu.as_ref().map(|m| m.conversation_id.clone()));
                self.teardown("submenu choice");
                let Some(conversation_id) = conversation_id else {
                    return ClickOutcome::Consumed;
                };
                let command = match choice {
                    SubmenuChoice::NewProject => MenuCommand::CreateProject { conversation_id },
                    SubmenuChoice::Remove => MenuCommand::Move {
                        conversation_id,
                        project_id: None,
                    },
                    SubmenuChoice::Project(project_id) => MenuCommand::Move {
                        conversation_id,
                        project_id: Some(project_id),
                    },
                };
                debug!(?command, "submenu command");
                return ClickOutcome::Command(command);
            }
            if inside {
                return ClickOutcome::Consumed;
            }
        }

        if let (Some(item), _) = self.locate(target) {
            self.cancel_close_timer();
            if self.ctx.session(|s| s.submenu.is_none()) {
                self.open_submenu_logged(item);
            }
            return ClickOutcome::Consumed;
        }
        ClickOutcome::Ignored
    }

    /// Tear down when the host closed the menu behind our back. Returns
    /// whether a teardown happened.
    pub fn check_menu_closed(&mut self) -> bool {
        let Some(open) = self.ctx.session(|s| s.menu.clone()) else {
            return false;
        };
        let alive = {
            let doc = self.ctx.page().read();
            doc.is_connected(open.root) && doc.is_rendered(open.root)
        };
        if alive {
            return false;
        }
        self.teardown("menu closed");
        true
    }

    /// Stop the interaction and remove everything it injected.
    pub fn teardown(&mut self, reason: &'static str) {
        if let Some(interaction) = self.interaction.take() {
            interaction.cancel.cancel();
        }
        self.cancel_close_timer();
        cleanup_menu_artifacts(&self.ctx, reason);
    }

    pub fn has_open_ui(&self) -> bool {
        self.interaction.as_ref().is_some_and(|i| !i.task.is_finished())
            || self.ctx.session(|s| s.menu.is_some() || s.submenu.is_some())
    }

    /// Wait for the running interaction (detection, injection and the watch
    /// window) to finish.
    pub async fn join_interaction(&mut self) {
        if let Some(interaction) = self.interaction.as_mut() {
            let _ = (&mut interaction.task).await;
        }
    }

    fn cancel_close_timer(&mut self) {
        if let Some(timer) = self.close_timer.take() {
            timer.cancel();
        }
    }

    /// The injected item around `target`, and whether `target` is inside the
    /// submenu.
    fn locate(&self, target: NodeId) -> (Option<NodeId>, bool) {
        let (menu, submenu) = self.ctx.session(|s| (s.menu.clone(), s.submenu));
        let doc = self.ctx.page().read();
        let on_item = menu.and_then(|m| {
            doc.closest(target, &move_item())
                .filter(|item| doc.contains(m.root, *item))
        });
        let on_submenu = submenu.is_some_and(|s| doc.contains(s, target));
        (on_item, on_submenu)
    }

    fn open_submenu_logged(&mut self, item: NodeId) {
        match open_move_submenu(&self.ctx, item) {
            Ok(Some(submenu)) => debug!(%submenu, "submenu opened"),
            Ok(None) => debug!("no menu interaction to open a submenu for"),
            Err(e) => debug!(error = %e, "submenu could not be opened"),
        }
    }
}

impl Drop for MenuEnhancer {
    fn drop(&mut self) {
        if let Some(interaction) = self.interaction.take() {
            interaction.cancel.cancel();
        }
        self.cancel_close_timer();
    }
}

/// Row and conversation id for a kebab trigger, falling back to the page URL
/// for triggers outside the sidebar.
fn resolve_trigger_row(
    ctx: &ContentContext,
    doc: &Document,
    trigger: NodeId,
    sidebar: Option<NodeId>,
) -> (Option<NodeId>, Option<String>) {
    let row = find_chat_row_from_target(doc, trigger);
    let conversation_id = row
        .and_then(|r| ctx.resolver().ids().from_row(doc, r, sidebar))
        .or_else(|| ctx.resolver().ids().from_url(doc.url()));
    (row, conversation_id)
}

async fn run_interaction(ctx: ContentContext, trigger: NodeId, cancel: CancellationToken) {
    let Some(detected) = wait_for_menu_root(&ctx, trigger, &cancel).await else {
        return;
    };
    // Bounded by the retry budget; a cancel during it is settled in
    // `commit_menu`.
    let Some(injected) = inject_with_retries(&ctx, detected, Some(trigger)).await else {
        debug!("menu item not injected");
        return;
    };

    let captured = ctx.session(|s| {
        s.active_row(Instant::now())
            .and_then(|r| r.conversation_id.clone())
    });
    let conversation_id = captured.or_else(|| {
        let sidebar = ctx.session(|s| s.sidebar_root);
        let doc = ctx.page().read();
        resolve_trigger_row(&ctx, &doc, trigger, sidebar).1
    });
    let Some(conversation_id) = conversation_id else {
        debug!("no conversation id for menu, removing item");
        ctx.page().extension(|doc| doc.remove(injected.item));
        return;
    };
    if !commit_menu(&ctx, injected, conversation_id, &cancel) {
        return;
    }
    watch_menu(&ctx, injected, &cancel).await;
}

/// Record the open menu unless the interaction was cancelled meanwhile, in
/// which case the item is removed again. The check and the write happen
/// under one session lock, so a teardown either sees the menu or the item
/// is gone.
fn commit_menu(
    ctx: &ContentContext,
    injected: InjectedItem,
    conversation_id: String,
    cancel: &CancellationToken,
) -> bool {
    let committed = ctx.session(|s| {
        if cancel.is_cancelled() {
            return false;
        }
        s.menu = Some(OpenMenu {
            root: injected.menu_root,
            conversation_id: conversation_id.clone(),
        });
        true
    });
    if committed {
        info!(conversation = %conversation_id, "move item ready");
    } else {
        ctx.page().extension(|doc| doc.remove(injected.item));
        debug!(item = %injected.item, "interaction cancelled after injection, item removed");
    }
    committed
}

/// Keep the item in place for the watch window: reinject when the host
/// re-renders the menu body, clean up when the menu goes away.
async fn watch_menu(ctx: &ContentContext, injected: InjectedItem, cancel: &CancellationToken) {
    let injection = &ctx.config().injection;
    let root = injected.menu_root;
    let mut observer = ctx.page().observe_subtree(root);
    let window = tokio::time::sleep(Duration::from_millis(injection.watch_window_ms));
    tokio::pin!(window);
    let mut reinjected = 0;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            _ = &mut window => {
                debug!(reinjected, "menu watch window closed");
                return;
            }
            batch = observer.changed() => {
                if batch.is_none() {
                    return;
                }
                let (alive, present) = {
                    let doc = ctx.page().read();
                    (
                        doc.is_connected(root) && ctx.resolver().menu_rules().is_visible(&doc, root),
                        doc.query(root, &move_item()).is_some(),
                    )
                };
                if !alive {
                    cleanup_menu_artifacts(ctx, "menu root gone");
                    return;
                }
                if present {
                    continue;
                }
                if reinjected >= injection.reinject_limit {
                    debug!(reinjected, "reinject limit reached");
                    return;
                }
                reinjected += 1;
                let theme = menu_theme(ctx, root);
                let outcome = ctx.page().extension(|doc| {
                    inject_move_item(doc, ctx.resolver(), root, &theme, injection.min_overlap_ratio)
                });
                match outcome {
                    Ok(InjectionOutcome::Injected { .. }) => debug!(reinjected, "reinjected move item"),
                    Ok(other) => debug!(reinjected, ?other, "reinjection did not stick"),
                    Err(e) => debug!(error = %e, "reinjection failed"),
                }
            }
        }
    }
}

/// Open the submenu beside `item` for the current interaction.
fn open_move_submenu(ctx: &ContentContext, item: NodeId) -> Result<Option<NodeId>, SyncError> {
    let Some(open) = ctx.session(|s| s.menu.clone()) else {
        return Ok(None);
    };
    let projection = ctx.projection();
    let captured = ctx.session(|s| s.menu_theme.clone());
    let width = ctx.config().injection.submenu_width;

    let submenu = ctx.page().extension(|doc| -> Result<NodeId, DomError> {
        let (_, layer) = ensure_overlay_host(doc)?;
        let theme = MenuTheme::effective(doc, captured.as_ref());
        let anchor = doc.bounding_box(item);
        let projects = projection.sorted_projects();
        let assigned = projection.chat_project_id(&open.conversation_id).is_some();
        open_submenu(doc, layer, &anchor, &projects, assigned, &theme, width)
    })?;
    ctx.session(|s| s.submenu = Some(submenu));
    Ok(Some(submenu))
}

fn close_submenu(ctx: &ContentContext) {
    if let Some(submenu) = ctx.session(|s| s.submenu.take()) {
        ctx.page().extension(|doc| doc.remove(submenu));
        debug!("submenu closed after grace period");
    }
}

/// Remove injected items, dividers and the submenu across the document and
/// every shadow tree, and forget the interaction. Returns how many nodes
/// were removed.
pub fn cleanup_menu_artifacts(ctx: &ContentContext, reason: &'static str) -> usize {
    let removed = ctx.page().extension(|doc| {
        let mut removed = sweep(doc, &move_item()) + sweep(doc, &move_divider());
        if let Some(submenu) = doc.element_by_id(SUBMENU_ID) {
            doc.remove(submenu);
            removed += 1;
        }
        removed
    });
    ctx.session(|s| {
        s.clear_menu();
        s.active_row = None;
    });
    if removed > 0 {
        debug!(removed, reason, "menu artifacts cleaned up");
    }
    removed
}

#[cfg(test)]
#[path = "enhancer_tests.rs"]
mod tests;
