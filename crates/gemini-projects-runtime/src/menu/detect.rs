//! Menu root detection: frame polling raced against the mutation observer.

use std::sync::Arc;

use gemini_projects_dom::NodeId;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::context::ContentContext;

/// Single-resolution slot. The first `offer` stores its value and fires the
/// token; later offers are no-ops.
pub struct FirstWins<T> {
    done: CancellationToken,
    slot: Mutex<Option<T>>,
}

impl<T> Default for FirstWins<T> {
    fn default() -> Self {
        Self {
            done: CancellationToken::new(),
            slot: Mutex::new(None),
        }
    }
}

impl<T> FirstWins<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether this offer won.
    pub fn offer(&self, value: T) -> bool {
        let mut slot = self.slot.lock();
        if self.done.is_cancelled() {
            return false;
        }
        *slot = Some(value);
        self.done.cancel();
        true
    }

    /// Resolve without a value; pending offers become no-ops.
    pub fn close(&self) {
        let _slot = self.slot.lock();
        self.done.cancel();
    }

    pub fn is_done(&self) -> bool {
        self.done.is_cancelled()
    }

    /// Fires once the race is decided.
    pub fn token(&self) -> CancellationToken {
        self.done.clone()
    }

    /// Wait for the winner. `None` if the race was closed without one.
    pub async fn wait(&self) -> Option<T> {
        self.done.cancelled().await;
        self.slot.lock().take()
    }
}

/// Wait for the context menu opened from `trigger`.
///
/// Polls once per frame for at most `poll_max_frames` frames while an
/// observer inspects added nodes; whichever finds a root first wins. `None`
/// when polling runs out or `cancel` fires.
pub async fn wait_for_menu_root(ctx: &ContentContext, trigger: NodeId, cancel: &CancellationToken) -> Option<NodeId> {
    // Subscribe before the first look so nothing slips between the two.
    let mut observer = ctx.page().observe();

    let immediate = {
        let doc = ctx.page().read();
        ctx.resolver().find_best_menu_root(&doc, Some(trigger))
    };
    if immediate.is_some() {
        debug!(root = ?immediate, "menu already open");
        return immediate;
    }

    let race: Arc<FirstWins<Option<NodeId>>> = Arc::new(FirstWins::new());

    let poll = {
        let ctx = ctx.clone();
        let race = race.clone();
        tokio::spawn(async move {
            let done = race.token();
            let frames = ctx.config().injection.poll_max_frames;
            for frame in 1..=frames {
                tokio::select! {
                    _ = done.cancelled() => return,
                    _ = tokio::time::sleep(ctx.frame_interval()) => {}
                }
                let found = {
                    let doc = ctx.page().read();
                    ctx.resolver().find_best_menu_root(&doc, Some(trigger))
                };
                if let Some(root) = found {
                    if race.offer(Some(root)) {
                        debug!(%root, frame, "menu root found by polling");
                    }
                    return;
                }
            }
            if race.offer(None) {
                debug!(frames, "menu detection gave up");
            }
        })
    };

    let watch = {
        let ctx = ctx.clone();
        let race = race.clone();
        tokio::spawn(async move {
            let done = race.token();
            loop {
                let records = tokio::select! {
                    _ = done.cancelled() => return,
                    batch = observer.changed() => match batch {
                        Some(records) => records,
                        None => return,
                    },
                };
                let found = {
                    let doc = ctx.page().read();
                    if records.is_empty() {
                        ctx.resolver().find_best_menu_root(&doc, Some(trigger))
                    } else {
                        records
                            .iter()
                            .flat_map(|r| r.added_nodes())
                            .find_map(|node| ctx.resolver().find_menu_from_node(&doc, *node))
                    }
                };
                if let Some(root) = found {
                    if race.offer(Some(root)) {
                        debug!(%root, "menu root found by observer");
                    }
                    return;
                }
            }
        })
    };

    let result = tokio::select! {
        winner = race.wait() => winner.flatten(),
        _ = cancel.cancelled() => {
            race.close();
            None
        }
    };
    poll.abort();
    watch.abort();
    result
}
