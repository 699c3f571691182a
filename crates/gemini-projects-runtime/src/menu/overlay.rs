//! Floating menus rendered into the overlay layer.
//!
//! Boxes are computed here rather than left to flow layout: the menu is
//! `position: fixed` and placed next to its trigger.

use gemini_projects_dom::{BoundingBox, Document, DomError, NodeId, ViewportInfo};

use crate::menu::MenuTheme;

/// Above the overlay layer itself.
pub const FLOATING_Z_INDEX: &str = "2147483647";
/// Gap kept between a floating menu and the viewport edge.
pub const VIEWPORT_PADDING: f64 = 8.0;

const MENU_PADDING: f64 = 6.0;
const ITEM_HEIGHT: f64 = 32.0;
/// 1px rule plus 4px margin above and below.
const DIVIDER_SPAN: f64 = 9.0;

/// One row of a floating menu.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayEntry {
    Item {
        label: String,
        class: &'static str,
        attrs: Vec<(&'static str, String)>,
    },
    Divider,
}

impl OverlayEntry {
    pub fn item(label: impl Into<String>, class: &'static str, attrs: Vec<(&'static str, String)>) -> Self {
        Self::Item {
            label: label.into(),
            class,
            attrs,
        }
    }

    fn height(&self) -> f64 {
        match self {
            Self::Item { .. } => ITEM_HEIGHT,
            Self::Divider => DIVIDER_SPAN,
        }
    }
}

/// Class names and id of one kind of floating menu.
#[derive(Debug, Clone, Copy)]
pub struct OverlayMenuSpec {
    pub id: &'static str,
    pub class: &'static str,
    pub divider_class: &'static str,
    pub width: f64,
}

/// Right of the anchor, flipped left when that overflows; vertically
/// top-aligned, pulled up to stay inside the viewport.
pub fn place_beside(anchor: &BoundingBox, width: f64, height: f64, viewport: ViewportInfo) -> (f64, f64) {
    let vw = f64::from(viewport.width);
    let vh = f64::from(viewport.height);
    let left = if anchor.right() + width > vw {
        anchor.x - width
    } else {
        anchor.right()
    };
    let mut top = anchor.y;
    if top + height + VIEWPORT_PADDING > vh {
        top = vh - height - VIEWPORT_PADDING;
    }
    (left.max(VIEWPORT_PADDING), top.max(VIEWPORT_PADDING))
}

/// Build the menu beside `anchor` inside `layer`, replacing any menu with
/// the same id.
pub fn build_overlay_menu(
    doc: &mut Document,
    layer: NodeId,
    spec: OverlayMenuSpec,
    anchor: &BoundingBox,
    entries: &[OverlayEntry],
    theme: &MenuTheme,
) -> Result<NodeId, DomError> {
    if let Some(stale) = doc.element_by_id(spec.id) {
        doc.remove(stale);
    }

    let height = MENU_PADDING * 2.0 + entries.iter().map(OverlayEntry::height).sum::<f64>();
    let (left, top) = place_beside(anchor, spec.width, height, doc.viewport());

    let menu = doc.create_element_with("div", &[("id", spec.id), ("class", spec.class)], "");
    let left_px = format!("{left}px");
    let top_px = format!("{top}px");
    doc.set_styles(
        menu,
        &[
            ("position", "fixed"),
            ("left", &left_px),
            ("top", &top_px),
            ("min-width", "220px"),
            ("padding", "6px"),
            ("pointer-events", "auto"),
            ("z-index", FLOATING_Z_INDEX),
            ("background", &theme.background),
            ("border-radius", &theme.border_radius),
            ("box-shadow", &theme.box_shadow),
            ("border", &theme.border),
            ("font-family", &theme.font_family),
            ("font-size", &theme.font_size),
            ("font-weight", &theme.font_weight),
            ("color", &theme.color),
        ],
    );
    doc.set_bounding_box(menu, BoundingBox::new(left, top, spec.width, height));

    let inner_x = left + MENU_PADDING;
    let inner_width = spec.width - MENU_PADDING * 2.0;
    let mut y = top + MENU_PADDING;
    for entry in entries {
        let node = match entry {
            OverlayEntry::Item { label, class, attrs } => {
                let attrs: Vec<(&str, &str)> = std::iter::once(("class", *class))
                    .chain(attrs.iter().map(|(k, v)| (*k, v.as_str())))
                    .collect();
                let item = doc.create_element_with("div", &attrs, label);
                doc.set_styles(
                    item,
                    &[
                        ("display", "flex"),
                        ("align-items", "center"),
                        ("gap", "12px"),
                        ("padding", &theme.item_padding),
                        ("min-height", "32px"),
                        ("border-radius", &theme.item_radius),
                        ("cursor", "pointer"),
                        ("font-size", &theme.font_size),
                        ("font-weight", &theme.font_weight),
                        ("color", &theme.color),
                        ("line-height", &theme.line_height),
                        ("font-family", &theme.font_family),
                    ],
                );
                doc.set_bounding_box(item, BoundingBox::new(inner_x, y, inner_width, ITEM_HEIGHT));
                item
            }
            OverlayEntry::Divider => {
                let divider = doc.create_element_with("div", &[("class", spec.divider_class)], "");
                doc.set_styles(
                    divider,
                    &[("height", "1px"), ("background", &theme.divider), ("margin", "4px 6px")],
                );
                doc.set_bounding_box(
                    divider,
                    BoundingBox::new(inner_x + 6.0, y + 4.0, inner_width - 12.0, 1.0),
                );
                divider
            }
        };
        doc.append_child(menu, node)?;
        y += entry.height();
    }

    doc.append_child(layer, menu)?;
    Ok(menu)
}

/// Nearest ancestor of `target` inside `menu` carrying `attr`, with its value.
pub fn entry_value(doc: &Document, menu: NodeId, target: NodeId, attr: &str) -> Option<(NodeId, String)> {
    let mut current = Some(target);
    while let Some(node) = current {
        if let Some(value) = doc.node(node).attr(attr) {
            return Some((node, value.to_string()));
        }
        if node == menu {
            return None;
        }
        current = doc.parent_element(node);
    }
    None
}
