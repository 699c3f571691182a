//! Shared page handle and mutation observers.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};
use tokio::sync::broadcast;
use tracing::trace;

use crate::document::Document;
use crate::mutation::MutationRecord;
use crate::node::NodeId;

const MUTATION_CHANNEL_CAPACITY: usize = 256;

/// Who made a batch of changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOrigin {
    /// The host application re-rendering.
    Host,
    /// Injected UI; observers skip these so re-renders never retrigger
    /// themselves.
    Extension,
}

/// Records produced by one [`Page::mutate`] call.
#[derive(Debug, Clone)]
pub struct MutationBatch {
    pub origin: MutationOrigin,
    pub records: Vec<MutationRecord>,
}

/// Cloneable handle to the live document.
///
/// Reads and writes go through a lock that is never held across an await;
/// every write drains its mutation records and broadcasts them.
#[derive(Clone)]
pub struct Page {
    document: Arc<RwLock<Document>>,
    tx: broadcast::Sender<Arc<MutationBatch>>,
}

impl Page {
    pub fn new(document: Document) -> Self {
        let (tx, _) = broadcast::channel(MUTATION_CHANNEL_CAPACITY);
        Self {
            document: Arc::new(RwLock::new(document)),
            tx,
        }
    }

    /// Read access. Drop the guard before awaiting.
    pub fn read(&self) -> RwLockReadGuard<'_, Document> {
        self.document.read()
    }

    /// Apply `f` and broadcast the records it produced.
    pub fn mutate<R>(&self, origin: MutationOrigin, f: impl FnOnce(&mut Document) -> R) -> R {
        let (result, records) = {
            let mut doc = self.document.write();
            let result = f(&mut doc);
            (result, doc.take_records())
        };
        if !records.is_empty() {
            trace!(?origin, count = records.len(), "mutation batch");
            // No receivers simply means nobody is observing yet.
            let _ = self.tx.send(Arc::new(MutationBatch { origin, records }));
        }
        result
    }

    /// Host-side edit (fixtures, simulated re-renders).
    pub fn host<R>(&self, f: impl FnOnce(&mut Document) -> R) -> R {
        self.mutate(MutationOrigin::Host, f)
    }

    /// Edit made by injected UI.
    pub fn extension<R>(&self, f: impl FnOnce(&mut Document) -> R) -> R {
        self.mutate(MutationOrigin::Extension, f)
    }

    /// Observe the whole document.
    pub fn observe(&self) -> MutationObserver {
        MutationObserver {
            rx: self.tx.subscribe(),
            page: self.clone(),
            scope: None,
            include_extension: false,
        }
    }

    /// Observe `scope` and its subtree (including its shadow trees).
    pub fn observe_subtree(&self, scope: NodeId) -> MutationObserver {
        MutationObserver {
            scope: Some(scope),
            ..self.observe()
        }
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("observers", &self.tx.receiver_count())
            .finish()
    }
}

/// Subscription to page mutations.
///
/// Dropping it disconnects.
pub struct MutationObserver {
    rx: broadcast::Receiver<Arc<MutationBatch>>,
    page: Page,
    scope: Option<NodeId>,
    include_extension: bool,
}

impl MutationObserver {
    /// Also deliver batches made by injected UI.
    pub fn include_extension_origin(mut self) -> Self {
        self.include_extension = true;
        self
    }

    pub fn scope(&self) -> Option<NodeId> {
        self.scope
    }

    /// Wait for the next relevant batch.
    ///
    /// Returns `None` once the page is gone. A lagged receiver yields an empty
    /// batch, which callers treat as "something changed".
    pub async fn changed(&mut self) -> Option<Vec<MutationRecord>> {
        loop {
            let batch = match self.rx.recv().await {
                Ok(batch) => batch,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    trace!(skipped, "mutation observer lagged");
                    return Some(Vec::new());
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            };
            if batch.origin == MutationOrigin::Extension && !self.include_extension {
                continue;
            }
            let records = self.filter(&batch.records);
            if !records.is_empty() {
                return Some(records);
            }
        }
    }

    fn filter(&self, records: &[MutationRecord]) -> Vec<MutationRecord> {
        let Some(scope) = self.scope else {
            return records.to_vec();
        };
        let doc = self.page.read();
        // A scope that left the document still wakes its observer once so the
        // owner can notice.
        if !doc.is_connected(scope) {
            return records.to_vec();
        }
        records
            .iter()
            .filter(|r| doc.contains_composed(scope, r.target()))
            .cloned()
            .collect()
    }
}
