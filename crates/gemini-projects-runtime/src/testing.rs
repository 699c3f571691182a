//! Shared setup for unit tests.

use std::sync::Arc;

use gemini_projects_config::Config;
use gemini_projects_dom::fixtures::{ComposerNodes, FixtureBuilder, SidebarNodes};
use gemini_projects_dom::Page;
use gemini_projects_store::{MemoryStateStore, StateService};

use crate::context::ContentContext;

pub(crate) struct Harness {
    pub ctx: ContentContext,
    pub store: Arc<MemoryStateStore>,
    pub sidebar: Option<SidebarNodes>,
    pub composer: Option<ComposerNodes>,
}

impl Harness {
    pub fn sidebar(&self) -> &SidebarNodes {
        self.sidebar.as_ref().expect("fixture has a sidebar")
    }

    pub fn page(&self) -> &Page {
        self.ctx.page()
    }
}

/// Context over a fixture page backed by an in-memory store.
pub(crate) fn harness(builder: FixtureBuilder) -> Harness {
    let fx = builder.build();
    let store = Arc::new(MemoryStateStore::new());
    let service = Arc::new(StateService::new(store.clone()));
    let ctx = ContentContext::new(Page::new(fx.doc), Config::default(), service);
    Harness {
        ctx,
        store,
        sidebar: fx.sidebar,
        composer: fx.composer,
    }
}
