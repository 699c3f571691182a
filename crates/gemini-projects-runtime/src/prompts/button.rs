//! The prompt library button in the composer toolbar.

use std::sync::Arc;

use gemini_projects_dom::markers::{is_extension_node, keep_first, prompt_button, PROMPT_BUTTON_ATTR, PROMPT_BUTTON_ID};
use gemini_projects_dom::{parse_px, AnchorResolver, BoundingBox, Document, DomError, NodeId, Selector};
use tracing::debug;

const DEFAULT_SIZE: f64 = 40.0;
const MIN_SIZE: f64 = 36.0;
const MAX_SIZE: f64 = 44.0;
const GAP: f64 = 4.0;

/// Opens the embedder's prompt picker.
#[derive(Clone)]
pub struct PromptPickerHandle(Arc<dyn Fn() + Send + Sync>);

impl PromptPickerHandle {
    pub fn new(open: impl Fn() + Send + Sync + 'static) -> Self {
        Self(Arc::new(open))
    }

    pub fn open(&self) {
        (self.0)();
    }
}

impl std::fmt::Debug for PromptPickerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PromptPickerHandle")
    }
}

/// Icon button closest to the anchor, preferring `icon-button` classes.
fn pick_style_source(doc: &Document, container: NodeId, anchor: NodeId) -> NodeId {
    let candidates: Vec<NodeId> = doc
        .query_all(container, &Selector::button())
        .into_iter()
        .filter(|b| *b != anchor && !doc.node(*b).has_attr(PROMPT_BUTTON_ATTR))
        .collect();
    let icons: Vec<NodeId> = candidates
        .iter()
        .copied()
        .filter(|b| doc.node(*b).has_class("icon-button"))
        .collect();
    let pool = if icons.is_empty() { candidates } else { icons };
    let anchor_x = doc.bounding_box(anchor).x;
    pool.into_iter()
        .min_by(|a, b| {
            let da = (doc.bounding_box(*a).x - anchor_x).abs();
            let db = (doc.bounding_box(*b).x - anchor_x).abs();
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
        .unwrap_or(anchor)
}

fn button_size(doc: &Document, source: NodeId) -> f64 {
    parse_px(&doc.computed_style(source, "height"))
        .filter(|h| h.is_finite() && *h > 0.0)
        .map(|h| h.round().clamp(MIN_SIZE, MAX_SIZE))
        .unwrap_or(DEFAULT_SIZE)
}

/// Place the prompt button right after the toolbar anchor. Returns the
/// existing button when it is still connected (removing any duplicates),
/// `None` while the toolbar is not rendered.
pub fn ensure_prompt_button(doc: &mut Document, resolver: &AnchorResolver) -> Result<Option<NodeId>, DomError> {
    let found = doc.query_all_in_roots(&prompt_button());
    if let Some(existing) = keep_first(doc, found) {
        return Ok(Some(existing));
    }
    let Some(anchor) = resolver.find_toolbar_anchor(doc) else {
        return Ok(None);
    };
    let Some(container) = doc.parent_element(anchor) else {
        return Ok(None);
    };

    let source = pick_style_source(doc, container, anchor);
    let size = button_size(doc, source);
    let size_px = format!("{size}px");
    let anchor_box = doc.bounding_box(anchor);

    let button = doc.create_element_with(
        "button",
        &[
            ("id", PROMPT_BUTTON_ID),
            (PROMPT_BUTTON_ATTR, "true"),
            ("type", "button"),
            ("aria-label", "Prompts"),
            ("title", "Prompts"),
        ],
        "",
    );
    doc.set_styles(
        button,
        &[
            ("display", "flex"),
            ("align-items", "center"),
            ("justify-content", "center"),
            ("flex", "0 0 auto"),
            ("margin", "0"),
            ("padding", "0"),
            ("width", &size_px),
            ("height", &size_px),
            ("min-width", &size_px),
            ("min-height", &size_px),
            ("border", "none"),
            ("border-radius", "50%"),
            ("background-color", "transparent"),
            ("cursor", "pointer"),
        ],
    );
    // Children first; the box is set once the button is complete.
    let icon = doc.create_element_with("span", &[("class", "gp-prompt-icon")], "");
    doc.set_styles(icon, &[("display", "flex"), ("width", "20px"), ("height", "20px")]);
    doc.append_child(button, icon)?;
    doc.set_bounding_box(
        button,
        BoundingBox::new(
            anchor_box.right() + GAP,
            anchor_box.y + (anchor_box.height - size) / 2.0,
            size,
            size,
        ),
    );
    doc.insert_after(anchor, button)?;
    debug!(%button, %anchor, size, "prompt button injected");
    Ok(Some(button))
}

/// Whether `target` is the prompt button or inside it.
pub fn is_prompt_button(doc: &Document, target: NodeId) -> bool {
    is_extension_node(doc, target) && doc.closest(target, &prompt_button()).is_some()
}
