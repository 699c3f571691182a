//! Synthetic host pages for tests.
//!
//! Boxes mimic the host's desktop layout at 1280x720: a 280px sidebar on the
//! left with 40px chat rows, context menus opening to the right of the
//! trigger, and the composer along the bottom.

use crate::document::Document;
use crate::geometry::{BoundingBox, ViewportInfo};
use crate::node::NodeId;

pub const SIDEBAR_WIDTH: f64 = 280.0;
pub const ROW_HEIGHT: f64 = 40.0;
pub const MENU_ITEM_HEIGHT: f64 = 40.0;
pub const MENU_WIDTH: f64 = 200.0;
/// Labels of the host conversation menu.
pub const DEFAULT_MENU_ITEMS: [&str; 4] = ["Share conversation", "Pin", "Rename", "Delete"];

/// One sidebar row.
#[derive(Debug, Clone)]
pub struct ChatRowNodes {
    pub conversation_id: String,
    pub row: NodeId,
    pub link: NodeId,
    pub kebab: NodeId,
}

#[derive(Debug, Clone)]
pub struct SidebarNodes {
    pub nav: NodeId,
    pub gems_header: NodeId,
    pub chats_section: NodeId,
    pub chats_header: NodeId,
    pub chats_list: NodeId,
    pub rows: Vec<ChatRowNodes>,
}

impl SidebarNodes {
    pub fn row(&self, conversation_id: &str) -> Option<&ChatRowNodes> {
        self.rows.iter().find(|r| r.conversation_id == conversation_id)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ComposerNodes {
    pub container: NodeId,
    pub editor: NodeId,
    pub toolbar: NodeId,
    pub upload_button: NodeId,
    pub tools_button: Option<NodeId>,
}

/// A host-rendered context menu.
#[derive(Debug, Clone)]
pub struct MenuNodes {
    /// Full-viewport overlay container the host renders menus into.
    pub overlay: NodeId,
    pub root: NodeId,
    pub list: NodeId,
    pub items: Vec<NodeId>,
}

#[derive(Debug)]
pub struct Fixture {
    pub doc: Document,
    pub sidebar: Option<SidebarNodes>,
    pub composer: Option<ComposerNodes>,
}

/// Builds a host page.
#[derive(Debug, Clone)]
pub struct FixtureBuilder {
    viewport: ViewportInfo,
    url: String,
    lang: Option<String>,
    gems_label: String,
    chats_label: String,
    chats: Vec<(String, String)>,
    sidebar: bool,
    composer: bool,
    tools_button: bool,
}

impl Default for FixtureBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FixtureBuilder {
    pub fn new() -> Self {
        Self {
            viewport: ViewportInfo::default(),
            url: "https://gemini.google.com/app".to_string(),
            lang: None,
            gems_label: "Gems".to_string(),
            chats_label: "Chats".to_string(),
            chats: Vec::new(),
            sidebar: true,
            composer: false,
            tools_button: true,
        }
    }

    /// Add a sidebar row linking to `/app/<id>`.
    pub fn chat(mut self, conversation_id: &str, title: &str) -> Self {
        self.chats.push((conversation_id.to_string(), title.to_string()));
        self
    }

    /// The three rows used by most scenarios.
    pub fn with_default_chats(self) -> Self {
        self.chat("aaa11111", "Trip planning")
            .chat("bbb22222", "Recipe ideas")
            .chat("ccc33333", "Rust lifetimes")
    }

    pub fn lang(mut self, tag: &str) -> Self {
        self.lang = Some(tag.to_string());
        self
    }

    /// Section header labels, for localised sidebars.
    pub fn section_labels(mut self, gems: &str, chats: &str) -> Self {
        self.gems_label = gems.to_string();
        self.chats_label = chats.to_string();
        self
    }

    pub fn url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }

    /// Page before the host rendered its sidebar.
    pub fn without_sidebar(mut self) -> Self {
        self.sidebar = false;
        self
    }

    pub fn with_composer(mut self) -> Self {
        self.composer = true;
        self
    }

    /// Composer toolbar with only the upload button.
    pub fn without_tools_button(mut self) -> Self {
        self.tools_button = false;
        self
    }

    pub fn build(self) -> Fixture {
        let mut doc = Document::new(self.viewport, self.url.clone());
        if let Some(lang) = &self.lang {
            let html = doc.document_element();
            doc.set_attribute(html, "lang", lang);
        }
        let sidebar = self.sidebar.then(|| self.build_sidebar(&mut doc));
        let composer = self.composer.then(|| self.build_composer(&mut doc));
        doc.take_records();
        Fixture {
            doc,
            sidebar,
            composer,
        }
    }

    fn build_sidebar(&self, doc: &mut Document) -> SidebarNodes {
        let body = doc.body();
        let height = f64::from(self.viewport.height);
        let nav = place(doc, body, "nav", &[], "", BoundingBox::new(0.0, 0.0, SIDEBAR_WIDTH, height));

        let mut y = 16.0;
        place(doc, nav, "button", &[("aria-label", "New chat")], "New chat", row_box(y, 40.0));
        y += 56.0;
        let gems_header = place(doc, nav, "div", &[("class", "title")], &self.gems_label, row_box(y, 32.0));
        y += 32.0;
        place(doc, nav, "div", &[("class", "gem-row")], "Gem manager", row_box(y, ROW_HEIGHT));
        y += ROW_HEIGHT + 16.0;

        let list_height = ROW_HEIGHT * self.chats.len() as f64;
        let chats_section = place(doc, nav, "div", &[("class", "chat-history")], "", row_box(y, 32.0 + list_height));
        let chats_header = place(doc, chats_section, "div", &[("class", "title")], &self.chats_label, row_box(y, 32.0));
        y += 32.0;
        let chats_list = place(doc, chats_section, "div", &[("class", "conversations")], "", row_box(y, list_height));

        let rows = self
            .chats
            .iter()
            .map(|(id, title)| {
                let row = place(doc, chats_list, "div", &[("role", "listitem")], "", row_box(y, ROW_HEIGHT));
                let href = format!("/app/{id}");
                let link = place(
                    doc,
                    row,
                    "a",
                    &[("href", href.as_str()), ("class", "conversation")],
                    title,
                    BoundingBox::new(0.0, y, SIDEBAR_WIDTH - 40.0, ROW_HEIGHT),
                );
                let kebab = place(
                    doc,
                    row,
                    "button",
                    &[
                        ("aria-label", "Open menu for conversation actions"),
                        ("aria-haspopup", "menu"),
                    ],
                    "",
                    BoundingBox::new(SIDEBAR_WIDTH - 36.0, y + 8.0, 24.0, 24.0),
                );
                y += ROW_HEIGHT;
                ChatRowNodes {
                    conversation_id: id.clone(),
                    row,
                    link,
                    kebab,
                }
            })
            .collect();

        SidebarNodes {
            nav,
            gems_header,
            chats_section,
            chats_header,
            chats_list,
            rows,
        }
    }

    fn build_composer(&self, doc: &mut Document) -> ComposerNodes {
        let body = doc.body();
        let container = place(doc, body, "div", &[("class", "input-area")], "", BoundingBox::new(320.0, 580.0, 760.0, 110.0));
        let rich = place(doc, container, "rich-textarea", &[], "", BoundingBox::new(332.0, 588.0, 736.0, 48.0));
        let editor = place(
            doc,
            rich,
            "div",
            &[("contenteditable", "true"), ("role", "textbox"), ("class", "ql-editor")],
            "",
            BoundingBox::new(332.0, 588.0, 736.0, 48.0),
        );
        let toolbar = place(doc, container, "div", &[("class", "leading-actions")], "", BoundingBox::new(332.0, 640.0, 736.0, 44.0));
        let upload_button = place(
            doc,
            toolbar,
            "button",
            &[("aria-label", "Upload image"), ("class", "icon-button")],
            "",
            BoundingBox::new(332.0, 642.0, 40.0, 40.0),
        );
        doc.set_computed_style(upload_button, "height", "40px");
        let tools_button = self.tools_button.then(|| {
            place(
                doc,
                toolbar,
                "button",
                &[("class", "toolbox-drawer-button")],
                "Tools",
                BoundingBox::new(380.0, 642.0, 80.0, 40.0),
            )
        });
        ComposerNodes {
            container,
            editor,
            toolbar,
            upload_button,
            tools_button,
        }
    }
}

fn row_box(y: f64, height: f64) -> BoundingBox {
    BoundingBox::new(0.0, y, SIDEBAR_WIDTH, height)
}

/// Create a host element with a box the host laid out.
pub fn place(
    doc: &mut Document,
    parent: NodeId,
    tag: &str,
    attrs: &[(&str, &str)],
    text: &str,
    bbox: BoundingBox,
) -> NodeId {
    let node = doc.create_element_with(tag, attrs, text);
    doc.set_bounding_box(node, bbox);
    // Fixture parents always exist.
    let _ = doc.append_child(parent, node);
    node
}

/// Render a host context menu to the right of `trigger`.
///
/// With an empty `items` list the menu shell appears unpopulated, the way the
/// host sometimes fills it a frame later (see [`populate_menu`]).
pub fn open_menu(doc: &mut Document, trigger: NodeId, items: &[&str]) -> MenuNodes {
    let body = doc.body();
    let viewport = doc.viewport().as_box();
    let overlay = place(doc, body, "div", &[("class", "cdk-overlay-container")], "", viewport);
    doc.set_computed_style(overlay, "position", "fixed");
    doc.set_computed_style(overlay, "pointer-events", "none");
    doc.set_computed_style(overlay, "z-index", "1000");

    let anchor = doc.bounding_box(trigger);
    let x = anchor.right() + 4.0;
    let y = anchor.y;
    let height = MENU_ITEM_HEIGHT * items.len().max(1) as f64;
    let root = place(
        doc,
        overlay,
        "div",
        &[("role", "menu"), ("class", "mat-mdc-menu-panel")],
        "",
        BoundingBox::new(x, y, MENU_WIDTH, height),
    );
    doc.set_computed_style(root, "pointer-events", "auto");
    doc.set_computed_style(root, "background-color", "rgb(240, 244, 249)");
    doc.set_computed_style(root, "border-radius", "16px");
    let list = place(
        doc,
        root,
        "div",
        &[("class", "mat-mdc-menu-content")],
        "",
        BoundingBox::new(x, y, MENU_WIDTH, height),
    );
    let mut menu = MenuNodes {
        overlay,
        root,
        list,
        items: Vec::new(),
    };
    populate_menu(doc, &mut menu, items);
    menu
}

/// Fill (or refill) a menu's list with host items.
pub fn populate_menu(doc: &mut Document, menu: &mut MenuNodes, items: &[&str]) {
    doc.clear_children(menu.list);
    let viewport = doc.viewport().as_box();
    doc.set_bounding_box(menu.overlay, viewport);
    let list_box = doc.bounding_box(menu.list);
    let height = MENU_ITEM_HEIGHT * items.len().max(1) as f64;
    doc.set_bounding_box(menu.list, BoundingBox { height, ..list_box });
    let root_box = doc.bounding_box(menu.root);
    doc.set_bounding_box(menu.root, BoundingBox { height, ..root_box });

    menu.items = items
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let y = list_box.y + MENU_ITEM_HEIGHT * i as f64;
            let item = place(
                doc,
                menu.list,
                "button",
                &[("role", "menuitem"), ("class", "mat-mdc-menu-item")],
                "",
                BoundingBox::new(list_box.x, y, MENU_WIDTH, MENU_ITEM_HEIGHT),
            );
            doc.set_computed_style(item, "font-size", "14px");
            doc.set_computed_style(item, "padding-left", "12px");
            place(
                doc,
                item,
                "span",
                &[("class", "mat-mdc-menu-item-text")],
                label,
                BoundingBox::new(list_box.x + 12.0, y + 10.0, 160.0, 20.0),
            );
            item
        })
        .collect();
}

/// Tear the menu down the way the host does on close.
pub fn close_menu(doc: &mut Document, menu: &MenuNodes) {
    doc.remove(menu.overlay);
}
